//! In-memory sheet representation built from raw pages

use crate::grid::RawGrid;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// A cell value with type detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// Integer value
    Integer(i64),
    /// Floating-point value
    Float(f64),
    /// String value
    String(String),
    /// Empty/null cell
    Empty,
}

impl CellValue {
    /// Parse a string into a CellValue, detecting the type
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();

        if trimmed.is_empty() {
            return CellValue::Empty;
        }

        if let Ok(i) = trimmed.parse::<i64>() {
            return CellValue::Integer(i);
        }

        if let Ok(f) = trimmed.parse::<f64>() {
            return CellValue::Float(f);
        }

        CellValue::String(trimmed.to_string())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Convert to a display string
    pub fn to_string_value(&self) -> String {
        match self {
            CellValue::Integer(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::String(s) => s.clone(),
            CellValue::Empty => String::new(),
        }
    }
}

impl std::fmt::Display for CellValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CellValue::Integer(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
            CellValue::Empty => write!(f, ""),
        }
    }
}

/// A diagnostic for one row that failed type coercion.
///
/// Row failures are recoverable: the row is skipped and reported, the
/// rest of the sheet still converts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    /// Zero-based row index within the sheet (data rows only)
    pub row: usize,
    /// What went wrong, including the offending column where known
    pub message: String,
}

impl RowError {
    pub fn new(row: usize, message: impl Into<String>) -> Self {
        Self {
            row,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for RowError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.message)
    }
}

/// One physical chunk of rows belonging to a sheet.
///
/// The first grid row is the header; the rest are data. A sheet split
/// across several files yields several pages sharing a name but with
/// distinct sub-names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    /// Sheet name this page belongs to
    pub sheet_name: String,
    /// Sub-name for split sheets, None for the base page
    pub sub_name: Option<String>,
    /// Raw cell data, header row included
    pub grid: RawGrid,
}

impl Page {
    /// Create a new empty page
    pub fn new(sheet_name: impl Into<String>, sub_name: Option<String>) -> Self {
        Self {
            sheet_name: sheet_name.into(),
            sub_name,
            grid: RawGrid::new(),
        }
    }

    /// Column names from the header row, in order
    pub fn header(&self) -> Vec<String> {
        match self.grid.rows().next() {
            Some(row) => row
                .iter()
                .map(|c| c.as_deref().unwrap_or("").trim().to_string())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Data rows (everything after the header)
    pub fn data_rows(&self) -> impl Iterator<Item = &[Option<String>]> {
        self.grid.rows().skip(1)
    }
}

/// A row of a populated sheet, mapping column name to cell value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SheetRow {
    /// Zero-based index within the sheet
    pub index: usize,
    /// Sub-name of the page this row came from
    pub sub_name: Option<String>,
    /// Cell values keyed by column name
    pub cells: BTreeMap<String, CellValue>,
}

impl SheetRow {
    /// Get a cell value by column name
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells.get(column)
    }

    /// Get a cell's text, empty string for absent/empty cells
    pub fn text(&self, column: &str) -> String {
        self.get(column)
            .map(|c| c.to_string_value())
            .unwrap_or_default()
    }

    /// Parse a required cell into a typed value
    pub fn parse<T: FromStr>(&self, column: &str) -> Result<T, RowError> {
        match self.get(column) {
            None | Some(CellValue::Empty) => Err(RowError::new(
                self.index,
                format!("missing value for column '{}'", column),
            )),
            Some(cell) => cell.to_string_value().parse::<T>().map_err(|_| {
                RowError::new(
                    self.index,
                    format!("cannot coerce '{}' in column '{}'", cell, column),
                )
            }),
        }
    }

    /// Parse an optional cell: absent or empty becomes None
    pub fn parse_opt<T: FromStr>(&self, column: &str) -> Result<Option<T>, RowError> {
        match self.get(column) {
            None | Some(CellValue::Empty) => Ok(None),
            Some(cell) => cell
                .to_string_value()
                .parse::<T>()
                .map(Some)
                .map_err(|_| {
                    RowError::new(
                        self.index,
                        format!("cannot coerce '{}' in column '{}'", cell, column),
                    )
                }),
        }
    }
}

/// A named, ordered sequence of rows populated from one or more pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet {
    /// Sheet name
    pub name: String,
    /// Column names, union of all page headers in first-seen order
    pub columns: Vec<String>,
    /// Data rows in page discovery order
    pub rows: Vec<SheetRow>,
}

impl Sheet {
    /// Build a sheet by concatenating pages in discovery order.
    ///
    /// Columns are the union of page headers; pages with differing
    /// headers contribute cells by column name, absent columns read
    /// as empty.
    pub fn from_pages(name: impl Into<String>, pages: &[Page]) -> Self {
        let name = name.into();
        let mut columns: Vec<String> = Vec::new();

        for page in pages {
            for col in page.header() {
                if !col.is_empty() && !columns.iter().any(|c| c == &col) {
                    columns.push(col);
                }
            }
        }

        let mut rows = Vec::new();
        for page in pages {
            let header = page.header();
            for raw in page.data_rows() {
                let mut cells = BTreeMap::new();
                for (i, col) in header.iter().enumerate() {
                    if col.is_empty() {
                        continue;
                    }
                    let value = raw
                        .get(i)
                        .and_then(|c| c.as_deref())
                        .map(CellValue::parse)
                        .unwrap_or(CellValue::Empty);
                    cells.insert(col.clone(), value);
                }
                rows.push(SheetRow {
                    index: rows.len(),
                    sub_name: page.sub_name.clone(),
                    cells,
                });
            }
        }

        Self {
            name,
            columns,
            rows,
        }
    }

    /// Get the number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}
