//! Persisted table and database assets
//!
//! Assets are JSON files in the export directory: one `<Kind>.table.json`
//! per table, plus one `<name>.db.json` database indexing them. Table
//! identity across rebuilds is the declared kind name, never the record
//! contents.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

/// A named, ordered collection of typed records of one declared kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableAsset {
    /// Declared kind name, also the lookup identity
    pub kind: String,
    /// Records in sheet row order
    pub records: Vec<serde_json::Value>,
}

impl TableAsset {
    /// Create a new empty table
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            records: Vec::new(),
        }
    }

    /// Path of the table asset for a kind inside a directory
    pub fn asset_path(dir: &Path, kind: &str) -> PathBuf {
        dir.join(format!("{}.table.json", kind))
    }

    /// Load a table from its JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Locate a table by kind in a directory, creating a new empty one
    /// if no asset exists yet. Returns the table and its path.
    pub fn load_or_create(dir: &Path, kind: &str) -> Result<(Self, PathBuf)> {
        let path = Self::asset_path(dir, kind);
        if path.exists() {
            Ok((Self::load(&path)?, path))
        } else {
            Ok((Self::new(kind), path))
        }
    }

    /// Save the table to its JSON file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path.as_ref(), content).map_err(|e| Error::FileWrite {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        Ok(())
    }

    /// Replace the full record collection, keeping the table's identity
    pub fn set_records(&mut self, records: Vec<serde_json::Value>) {
        self.records = records;
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the table holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A stable reference to a persisted table asset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRef {
    /// Declared kind name of the referenced table
    pub kind: String,
    /// Path of the table's JSON asset
    pub path: PathBuf,
}

impl TableRef {
    pub fn new(kind: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
        }
    }
}

/// The root registry of all tables for one export.
///
/// Every registered table appears in exactly one of {tables, redundant}:
/// tables revisited by the current run stay active, tables from earlier
/// runs that were not revisited move to redundant. Redundant tables are
/// never deleted here; physical cleanup is an external decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseAsset {
    /// Database name
    pub name: String,
    /// When the database was last exported
    pub exported_at: DateTime<Utc>,
    /// Active table references, in registration order
    pub tables: Vec<TableRef>,
    /// Tables from previous runs not recreated in the latest pass
    pub redundant: Vec<TableRef>,
}

impl DatabaseAsset {
    /// Create a new empty database
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            exported_at: Utc::now(),
            tables: Vec::new(),
            redundant: Vec::new(),
        }
    }

    /// Path of the database asset for a name inside a directory
    pub fn asset_path(dir: &Path, name: &str) -> PathBuf {
        dir.join(format!("{}.db.json", name))
    }

    /// Load a database from its JSON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| Error::FileRead {
            path: path.as_ref().to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&content).map_err(Error::Json)
    }

    /// Locate a database by name in a directory, creating a new empty
    /// one if no asset exists yet
    pub fn load_or_create(dir: &Path, name: &str) -> Result<Self> {
        let path = Self::asset_path(dir, name);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::new(name))
        }
    }

    /// Save the database to its JSON file in a directory
    pub fn save(&self, dir: &Path) -> Result<()> {
        let path = Self::asset_path(dir, &self.name);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(|e| Error::FileWrite {
            path,
            source: e,
        })?;
        Ok(())
    }

    /// All tracked references, active then redundant
    pub fn all_refs(&self) -> impl Iterator<Item = &TableRef> {
        self.tables.iter().chain(self.redundant.iter())
    }

    /// Find an active table reference by kind
    pub fn find(&self, kind: &str) -> Option<&TableRef> {
        self.tables.iter().find(|t| t.kind == kind)
    }

    /// Drop all bookkeeping; underlying table assets are untouched
    pub fn clear(&mut self) {
        self.tables.clear();
        self.redundant.clear();
    }

    /// Register an active table reference.
    ///
    /// Registering the same kind twice means the identity lookup was
    /// ambiguous, which is a bug, so it fails loudly.
    pub fn add(&mut self, table: TableRef) -> Result<()> {
        if self.tables.iter().any(|t| t.kind == table.kind) {
            return Err(Error::InvariantViolation(format!(
                "table kind '{}' registered twice",
                table.kind
            )));
        }
        self.tables.push(table);
        Ok(())
    }

    /// Replace both bookkeeping sets at once, verifying disjointness
    pub fn add_range(&mut self, active: Vec<TableRef>, redundant: Vec<TableRef>) -> Result<()> {
        for table in active {
            self.add(table)?;
        }

        let active_kinds: BTreeSet<&str> = self.tables.iter().map(|t| t.kind.as_str()).collect();
        for table in redundant {
            if active_kinds.contains(table.kind.as_str()) {
                return Err(Error::InvariantViolation(format!(
                    "table kind '{}' is both active and redundant",
                    table.kind
                )));
            }
            self.redundant.push(table);
        }

        Ok(())
    }
}
