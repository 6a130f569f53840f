//! Conversion driver: sheets in, database and table assets out
//!
//! One run is a full replace: every resolvable sheet is converted and
//! its table repopulated, the database's active set is rebuilt, and
//! whatever was tracked before but not revisited moves to the redundant
//! set. Sheet and row failures are logged and skipped; I/O failures
//! abort the run.

use crate::error::{Error, Result};
use crate::reconcile::Reconciler;
use crate::schema::SchemaRegistry;
use crate::store::CsvSheetSource;
use crate::table::{DatabaseAsset, TableAsset, TableRef};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{info, warn};

/// Default database asset name
pub const DEFAULT_DATABASE_NAME: &str = "_Database";

/// A sheet skipped during a run, with the cause
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetSkip {
    pub sheet: String,
    pub reason: String,
}

/// A row skipped during record conversion, with its location
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSkip {
    pub sheet: String,
    pub row: usize,
    pub reason: String,
}

/// Summary of one conversion run.
///
/// A successful run over well-formed input has zero skips.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertReport {
    /// Number of sheets converted into tables
    pub converted: usize,
    /// Sheets excluded by the caller's ignore list
    pub ignored: Vec<String>,
    /// Sheets skipped because schema resolution failed
    pub skipped_sheets: Vec<SheetSkip>,
    /// Rows skipped because type coercion failed
    pub skipped_rows: Vec<RowSkip>,
    /// Kinds of the active tables after the run, in registration order
    pub active_kinds: Vec<String>,
    /// Kinds flagged redundant after the run
    pub redundant_kinds: Vec<String>,
    /// When the run completed
    pub exported_at: DateTime<Utc>,
}

/// Top-level conversion driver.
///
/// Holds the export directory, the database name and the caller's
/// ignore list; `run` performs one full rebuild.
#[derive(Debug, Clone)]
pub struct DatabaseExporter {
    save_path: PathBuf,
    database_name: String,
    ignored: HashSet<String>,
}

impl DatabaseExporter {
    /// Create an exporter writing into `save_path` with the default
    /// database name
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            database_name: DEFAULT_DATABASE_NAME.to_string(),
            ignored: HashSet::new(),
        }
    }

    /// Use a custom database asset name
    pub fn with_database_name(mut self, name: impl Into<String>) -> Self {
        self.database_name = name.into();
        self
    }

    /// Exclude sheets by name from conversion
    pub fn with_ignored<I, S>(mut self, sheets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored = sheets.into_iter().map(Into::into).collect();
        self
    }

    /// Run one full conversion pass.
    ///
    /// Loads the source, rebuilds every resolvable sheet's table,
    /// reconciles the database's active and redundant sets, and saves
    /// all touched assets.
    pub fn run(
        &self,
        source: &mut CsvSheetSource,
        registry: &SchemaRegistry,
    ) -> Result<ConvertReport> {
        source.load()?;
        std::fs::create_dir_all(&self.save_path)?;

        let mut database = DatabaseAsset::load_or_create(&self.save_path, &self.database_name)?;
        let mut reconciler = Reconciler::begin(&mut database);

        let sheet_names: Vec<String> = source.sheet_names().iter().map(|s| s.to_string()).collect();

        let mut active: Vec<TableRef> = Vec::new();
        let mut report = ConvertReport {
            converted: 0,
            ignored: Vec::new(),
            skipped_sheets: Vec::new(),
            skipped_rows: Vec::new(),
            active_kinds: Vec::new(),
            redundant_kinds: Vec::new(),
            exported_at: Utc::now(),
        };

        for sheet_name in sheet_names {
            if self.ignored.contains(&sheet_name) {
                report.ignored.push(sheet_name);
                continue;
            }

            let resolved = match registry.resolve(&sheet_name) {
                Ok(resolved) => resolved,
                Err(e @ (Error::SchemaNotFound(_) | Error::ConversionMissing { .. })) => {
                    warn!(sheet = %sheet_name, "skipping sheet: {}", e);
                    report.skipped_sheets.push(SheetSkip {
                        sheet: sheet_name,
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let sheet = source
                .import(&sheet_name)
                .ok_or_else(|| Error::SheetNotFound(sheet_name.clone()))?;

            let conversion = resolved.convert(&sheet);
            for skip in conversion.skipped {
                warn!(sheet = %sheet_name, row = skip.row, "skipping row: {}", skip.message);
                report.skipped_rows.push(RowSkip {
                    sheet: sheet_name.clone(),
                    row: skip.row,
                    reason: skip.message,
                });
            }

            let kind = resolved.table_kind();
            let (mut table, path) = TableAsset::load_or_create(&self.save_path, kind)?;
            table.set_records(conversion.records);
            table.save(&path)?;

            let table_ref = TableRef::new(kind, path);
            reconciler.visit(&table_ref)?;
            active.push(table_ref);
            report.converted += 1;
        }

        let redundant = reconciler.finish();

        report.active_kinds = active.iter().map(|t| t.kind.clone()).collect();
        report.redundant_kinds = redundant.iter().map(|t| t.kind.clone()).collect();

        database.add_range(active, redundant)?;
        database.exported_at = report.exported_at;
        database.save(&self.save_path)?;

        info!(
            converted = report.converted,
            skipped_sheets = report.skipped_sheets.len(),
            skipped_rows = report.skipped_rows.len(),
            redundant = report.redundant_kinds.len(),
            "conversion run complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Record;
    use crate::sheet::{RowError, SheetRow};
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct StatData {
        hp: i64,
        atk: i64,
    }

    impl Record for StatData {
        const KIND: &'static str = "StatData";

        fn from_row(row: &SheetRow) -> std::result::Result<Self, RowError> {
            Ok(Self {
                hp: row.parse("hp")?,
                atk: row.parse("atk")?,
            })
        }
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct ItemData {
        name: String,
        price: i64,
    }

    impl Record for ItemData {
        const KIND: &'static str = "ItemData";

        fn from_row(row: &SheetRow) -> std::result::Result<Self, RowError> {
            Ok(Self {
                name: row.parse("name")?,
                price: row.parse("price")?,
            })
        }
    }

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry.register::<StatData>("Stat", "StatDataTable");
        registry.register::<ItemData>("Item", "ItemDataTable");
        registry
    }

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_concrete_stat_scenario() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n20,8\n");
        write_file(src.path(), "__comment_Stat.csv", "scratch notes\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let mut source = CsvSheetSource::new(src.path());

        let report = exporter.run(&mut source, &registry()).unwrap();

        assert_eq!(report.converted, 1);
        assert!(report.skipped_sheets.is_empty());
        assert!(report.skipped_rows.is_empty());
        assert_eq!(report.active_kinds, vec!["StatDataTable"]);
        assert!(report.redundant_kinds.is_empty());

        let (table, _) = TableAsset::load_or_create(out.path(), "StatDataTable").unwrap();
        assert_eq!(
            table.records,
            vec![json!({"hp": 10, "atk": 5}), json!({"hp": 20, "atk": 8})]
        );
    }

    #[test]
    fn test_idempotence_on_unchanged_input() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n");
        write_file(src.path(), "Item.csv", "name,price\nsword,100\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let registry = registry();

        let mut source = CsvSheetSource::new(src.path());
        let first = exporter.run(&mut source, &registry).unwrap();
        let db_first = DatabaseAsset::load_or_create(out.path(), DEFAULT_DATABASE_NAME).unwrap();

        let mut source = CsvSheetSource::new(src.path());
        let second = exporter.run(&mut source, &registry).unwrap();
        let db_second = DatabaseAsset::load_or_create(out.path(), DEFAULT_DATABASE_NAME).unwrap();

        assert_eq!(first.active_kinds, second.active_kinds);
        assert_eq!(db_first.tables, db_second.tables);
        assert!(db_second.redundant.is_empty());

        let (table, _) = TableAsset::load_or_create(out.path(), "ItemDataTable").unwrap();
        assert_eq!(table.records, vec![json!({"name": "sword", "price": 100})]);
    }

    #[test]
    fn test_removed_sheet_becomes_redundant_not_deleted() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n");
        write_file(src.path(), "Item.csv", "name,price\nsword,100\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let registry = registry();

        let mut source = CsvSheetSource::new(src.path());
        exporter.run(&mut source, &registry).unwrap();

        fs::remove_file(src.path().join("Item.csv")).unwrap();

        let mut source = CsvSheetSource::new(src.path());
        let report = exporter.run(&mut source, &registry).unwrap();

        assert_eq!(report.active_kinds, vec!["StatDataTable"]);
        assert_eq!(report.redundant_kinds, vec!["ItemDataTable"]);

        let db = DatabaseAsset::load_or_create(out.path(), DEFAULT_DATABASE_NAME).unwrap();
        assert_eq!(db.redundant.len(), 1);
        assert_eq!(db.redundant[0].kind, "ItemDataTable");
        // The asset stays on disk; cleanup is an external decision
        assert!(out.path().join("ItemDataTable.table.json").exists());
    }

    #[test]
    fn test_unresolvable_sheet_is_skipped_not_fatal() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n");
        write_file(src.path(), "Mystery.csv", "a,b\n1,2\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let mut source = CsvSheetSource::new(src.path());

        let report = exporter.run(&mut source, &registry()).unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.skipped_sheets.len(), 1);
        assert_eq!(report.skipped_sheets[0].sheet, "Mystery");
        assert_eq!(report.active_kinds, vec!["StatDataTable"]);
    }

    #[test]
    fn test_malformed_row_is_reported_and_skipped() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\nbroken,8\n20,8\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let mut source = CsvSheetSource::new(src.path());

        let report = exporter.run(&mut source, &registry()).unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.skipped_rows.len(), 1);
        assert_eq!(report.skipped_rows[0].row, 1);

        let (table, _) = TableAsset::load_or_create(out.path(), "StatDataTable").unwrap();
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_ignore_list_excludes_sheets() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n");
        write_file(src.path(), "Item.csv", "name,price\nsword,100\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path()).with_ignored(["Item"]);
        let mut source = CsvSheetSource::new(src.path());

        let report = exporter.run(&mut source, &registry()).unwrap();

        assert_eq!(report.converted, 1);
        assert_eq!(report.ignored, vec!["Item"]);
        assert_eq!(report.active_kinds, vec!["StatDataTable"]);
    }

    #[test]
    fn test_table_repopulated_on_rerun() {
        let src = tempfile::tempdir().unwrap();
        write_file(src.path(), "Stat.csv", "hp,atk\n10,5\n");

        let out = tempfile::tempdir().unwrap();
        let exporter = DatabaseExporter::new(out.path());
        let registry = registry();

        let mut source = CsvSheetSource::new(src.path());
        exporter.run(&mut source, &registry).unwrap();

        write_file(src.path(), "Stat.csv", "hp,atk\n99,1\n");

        let mut source = CsvSheetSource::new(src.path());
        exporter.run(&mut source, &registry).unwrap();

        let (table, _) = TableAsset::load_or_create(out.path(), "StatDataTable").unwrap();
        assert_eq!(table.records, vec![json!({"hp": 99, "atk": 1})]);
    }
}
