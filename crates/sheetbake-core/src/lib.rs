//! sheetbake-core: sheet-to-typed-table conversion and database assembly
//!
//! This library provides functionality to:
//! - Discover CSV pages in a directory and assemble them into sheets
//! - Convert sheet rows into typed records via a declared schema registry
//! - Persist the records as table assets, one per declared kind
//! - Maintain a database asset indexing active and redundant tables
//!   across rebuilds

pub mod error;
pub mod grid;
pub mod pipeline;
pub mod reconcile;
pub mod schema;
pub mod sheet;
pub mod store;
pub mod table;

pub use error::{Error, Result};
pub use grid::RawGrid;
pub use pipeline::{ConvertReport, DatabaseExporter, RowSkip, SheetSkip, DEFAULT_DATABASE_NAME};
pub use reconcile::Reconciler;
pub use schema::{Conversion, Record, ResolvedSchema, SchemaBinding, SchemaRegistry};
pub use sheet::{CellValue, Page, RowError, Sheet, SheetRow};
pub use store::{CsvSheetSource, COMMENT_MARKER, SUB_NAME_DELIMITER};
pub use table::{DatabaseAsset, TableAsset, TableRef};
