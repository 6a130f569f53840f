//! Built-in sample schema declarations
//!
//! These mirror the kinds of record structs a project would declare and
//! register at startup. A real project replaces this module with its own
//! declarations (hand-written or generated) and builds its registry the
//! same way.

use serde::{Deserialize, Serialize};
use sheetbake_core::{Record, RowError, SchemaRegistry, SheetRow};

/// Combat stat block, one record per sheet row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatData {
    pub hp: i64,
    pub atk: i64,
}

impl Record for StatData {
    const KIND: &'static str = "StatData";

    fn from_row(row: &SheetRow) -> Result<Self, RowError> {
        Ok(Self {
            hp: row.parse("hp")?,
            atk: row.parse("atk")?,
        })
    }
}

/// Shop item definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub name: String,
    pub price: i64,
    /// Maximum stack size; empty cell means unstackable
    pub stack_limit: Option<i64>,
}

impl Record for ItemData {
    const KIND: &'static str = "ItemData";

    fn from_row(row: &SheetRow) -> Result<Self, RowError> {
        Ok(Self {
            name: row.parse("name")?,
            price: row.parse("price")?,
            stack_limit: row.parse_opt("stack_limit")?,
        })
    }
}

/// Build the registry of all sample schemas
pub fn build_registry() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();
    registry.register::<StatData>("Stat", "StatDataTable");
    registry.register::<ItemData>("Item", "ItemDataTable");
    registry
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_sample_sheets() {
        let registry = build_registry();
        assert!(registry.resolve("Stat").is_ok());
        assert!(registry.resolve("Item").is_ok());
        assert!(registry.resolve("Unknown").is_err());
    }
}
