//! Schema registry binding sheets to typed record kinds
//!
//! There is no runtime introspection: every binding and its row
//! converter is declared once at process start. Resolution needs both
//! the binding and a converter for its record kind; either missing is a
//! per-sheet error, never a whole-run abort.

use crate::error::{Error, Result};
use crate::sheet::{RowError, Sheet, SheetRow};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A typed record produced from exactly one sheet row
pub trait Record: Serialize + DeserializeOwned + Sized {
    /// Declared kind name, used to pair bindings with converters
    const KIND: &'static str;

    /// Build a record from a populated sheet row
    fn from_row(row: &SheetRow) -> std::result::Result<Self, RowError>;
}

/// Declared metadata binding a sheet to its record and table kinds.
/// Immutable once declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaBinding {
    /// Name of the sheet this binding applies to
    pub sheet_name: String,
    /// Kind name of the records produced from the sheet's rows
    pub record_kind: String,
    /// Kind name of the table asset holding those records
    pub table_kind: String,
}

impl SchemaBinding {
    pub fn new(
        sheet_name: impl Into<String>,
        record_kind: impl Into<String>,
        table_kind: impl Into<String>,
    ) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            record_kind: record_kind.into(),
            table_kind: table_kind.into(),
        }
    }
}

/// Result of converting one sheet: ordered records plus skipped rows
#[derive(Debug, Clone, Default)]
pub struct Conversion {
    /// Converted records in row order, serialized for table storage
    pub records: Vec<serde_json::Value>,
    /// Rows that failed type coercion, with their indexes
    pub skipped: Vec<RowError>,
}

type Converter = Box<dyn Fn(&Sheet) -> Conversion + Send + Sync>;

/// Registry of schema bindings and row converters, populated at startup
#[derive(Default)]
pub struct SchemaRegistry {
    bindings: BTreeMap<String, SchemaBinding>,
    converters: BTreeMap<String, Converter>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a binding without a converter.
    ///
    /// Resolution will fail with `ConversionMissing` until a converter
    /// for the bound record kind is registered.
    pub fn bind(&mut self, binding: SchemaBinding) {
        self.bindings.insert(binding.sheet_name.clone(), binding);
    }

    /// Declare a binding and install the converter for `R` in one step
    pub fn register<R: Record + 'static>(
        &mut self,
        sheet_name: impl Into<String>,
        table_kind: impl Into<String>,
    ) {
        let sheet_name = sheet_name.into();
        self.bind(SchemaBinding::new(&sheet_name, R::KIND, table_kind));
        self.converters
            .insert(R::KIND.to_string(), Box::new(convert_sheet::<R>));
    }

    /// All declared bindings, in sheet-name order
    pub fn bindings(&self) -> impl Iterator<Item = &SchemaBinding> {
        self.bindings.values()
    }

    /// Resolve the schema for a sheet name.
    ///
    /// Requires both the declared binding and a converter for its record
    /// kind; the error distinguishes which one is missing.
    pub fn resolve(&self, sheet_name: &str) -> Result<ResolvedSchema<'_>> {
        let binding = self
            .bindings
            .get(sheet_name)
            .ok_or_else(|| Error::SchemaNotFound(sheet_name.to_string()))?;

        let converter =
            self.converters
                .get(&binding.record_kind)
                .ok_or_else(|| Error::ConversionMissing {
                    sheet: sheet_name.to_string(),
                    record_kind: binding.record_kind.clone(),
                })?;

        Ok(ResolvedSchema { binding, converter })
    }
}

impl std::fmt::Debug for SchemaRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaRegistry")
            .field("bindings", &self.bindings)
            .field("converters", &self.converters.keys())
            .finish()
    }
}

/// A successfully resolved schema: binding plus its converter
pub struct ResolvedSchema<'a> {
    binding: &'a SchemaBinding,
    converter: &'a Converter,
}

impl ResolvedSchema<'_> {
    /// The declared binding
    pub fn binding(&self) -> &SchemaBinding {
        self.binding
    }

    /// Kind name of the table asset this sheet populates
    pub fn table_kind(&self) -> &str {
        &self.binding.table_kind
    }

    /// Convert a sheet's rows into ordered records, skipping malformed
    /// rows and reporting each with its index
    pub fn convert(&self, sheet: &Sheet) -> Conversion {
        (self.converter)(sheet)
    }
}

fn convert_sheet<R: Record>(sheet: &Sheet) -> Conversion {
    let mut out = Conversion::default();

    for row in &sheet.rows {
        match R::from_row(row) {
            Ok(record) => match serde_json::to_value(&record) {
                Ok(value) => out.records.push(value),
                Err(e) => out
                    .skipped
                    .push(RowError::new(row.index, format!("serialize failed: {}", e))),
            },
            Err(e) => out.skipped.push(e),
        }
    }

    out
}
