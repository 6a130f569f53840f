//! CSV-backed sheet source: page discovery, import and export
//!
//! File naming convention: `Name.csv` is the base page of sheet `Name`,
//! `Name.Sub.csv` is a sub-named page of the same sheet (split sheets
//! concatenate in file order). Files whose stem starts with the comment
//! marker are excluded from import.

use crate::error::{Error, Result};
use crate::sheet::{Page, Sheet};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File stems starting with this marker are skipped during import
pub const COMMENT_MARKER: &str = "__";

/// Delimiter between sheet name and sub-name in a file stem
pub const SUB_NAME_DELIMITER: char = '.';

/// A sheet source backed by a directory of CSV files.
///
/// `load` reads every page into memory; `import` assembles a sheet from
/// its pages; `export` replaces a sheet's pages from an in-memory sheet;
/// `save` writes all pages back to disk. Numbers and dates are read and
/// written through Rust's locale-independent formatting, so output is
/// identical across machines.
#[derive(Debug)]
pub struct CsvSheetSource {
    load_path: PathBuf,
    extension: String,
    pages: BTreeMap<String, Vec<Page>>,
}

impl CsvSheetSource {
    /// Create a source over a directory, with the default `csv` extension
    pub fn new(load_path: impl Into<PathBuf>) -> Self {
        Self::with_extension(load_path, "csv")
    }

    /// Create a source over a directory with a custom extension
    pub fn with_extension(load_path: impl Into<PathBuf>, extension: impl Into<String>) -> Self {
        Self {
            load_path: load_path.into(),
            extension: extension.into(),
            pages: BTreeMap::new(),
        }
    }

    /// The directory this source reads from and writes to
    pub fn load_path(&self) -> &Path {
        &self.load_path
    }

    /// Read all pages from disk, replacing any previously loaded state.
    ///
    /// Files are visited in sorted order so multi-page sheets concatenate
    /// deterministically. Any read failure aborts the load.
    pub fn load(&mut self) -> Result<()> {
        self.pages.clear();

        let mut files: Vec<PathBuf> = Vec::new();
        for entry in WalkDir::new(&self.load_path)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry?;
            let path = entry.path();
            if path
                .extension()
                .is_some_and(|ext| ext == self.extension.as_str())
            {
                files.push(path.to_path_buf());
            }
        }

        for path in files {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            if stem.starts_with(COMMENT_MARKER) {
                continue;
            }

            let (sheet_name, sub_name) = parse_page_name(stem);
            let page = read_page(&path, sheet_name.clone(), sub_name)?;
            self.pages.entry(sheet_name).or_default().push(page);
        }

        Ok(())
    }

    /// Distinct sheet names, in sorted order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.pages.keys().map(|k| k.as_str()).collect()
    }

    /// Pages belonging to one sheet, in discovery order
    pub fn pages(&self, sheet_name: &str) -> &[Page] {
        self.pages
            .get(sheet_name)
            .map(|p| p.as_slice())
            .unwrap_or(&[])
    }

    /// Assemble a sheet from its loaded pages
    pub fn import(&self, sheet_name: &str) -> Option<Sheet> {
        let pages = self.pages.get(sheet_name)?;
        Some(Sheet::from_pages(sheet_name, pages))
    }

    /// Replace a sheet's pages from an in-memory sheet.
    ///
    /// Rows are grouped by originating sub-name in first-seen order, one
    /// page per group, each page carrying the full column header.
    pub fn export(&mut self, sheet: &Sheet) {
        let mut groups: Vec<(Option<String>, Page)> = Vec::new();

        for row in &sheet.rows {
            let pos = match groups.iter().position(|(sub, _)| *sub == row.sub_name) {
                Some(pos) => pos,
                None => {
                    let mut page = Page::new(&sheet.name, row.sub_name.clone());
                    for (col, name) in sheet.columns.iter().enumerate() {
                        page.grid.set_cell(col, 0, name.clone());
                    }
                    groups.push((row.sub_name.clone(), page));
                    groups.len() - 1
                }
            };
            let page = &mut groups[pos].1;

            let target_row = page.grid.row_count();
            for (col, name) in sheet.columns.iter().enumerate() {
                let text = row.text(name);
                page.grid.set_cell(col, target_row, text);
            }
        }

        if groups.is_empty() {
            // A sheet with no rows still gets a header-only base page
            let mut page = Page::new(&sheet.name, None);
            for (col, name) in sheet.columns.iter().enumerate() {
                page.grid.set_cell(col, 0, name.clone());
            }
            groups.push((None, page));
        }

        self.pages.insert(
            sheet.name.clone(),
            groups.into_iter().map(|(_, page)| page).collect(),
        );
    }

    /// Write every page back to disk as `Name[.Sub].<ext>` files
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.load_path)?;

        for pages in self.pages.values() {
            for page in pages {
                let stem = match &page.sub_name {
                    Some(sub) => format!("{}{}{}", page.sheet_name, SUB_NAME_DELIMITER, sub),
                    None => page.sheet_name.clone(),
                };
                let path = self.load_path.join(format!("{}.{}", stem, self.extension));
                write_page(&path, page)?;
            }
        }

        Ok(())
    }
}

/// Split a file stem into sheet name and optional sub-name
fn parse_page_name(stem: &str) -> (String, Option<String>) {
    match stem.split_once(SUB_NAME_DELIMITER) {
        Some((name, sub)) if !name.is_empty() && !sub.is_empty() => {
            (name.to_string(), Some(sub.to_string()))
        }
        _ => (stem.to_string(), None),
    }
}

fn read_page(path: &Path, sheet_name: String, sub_name: Option<String>) -> Result<Page> {
    let file = File::open(path).map_err(|e| Error::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(BufReader::new(file));

    let mut page = Page::new(sheet_name, sub_name);
    for result in reader.records() {
        let record = result.map_err(|e| Error::Csv {
            path: path.to_path_buf(),
            source: e,
        })?;
        page.grid
            .push_row(record.iter().map(|c| Some(c.to_string())).collect());
    }

    Ok(page)
}

fn write_page(path: &Path, page: &Page) -> Result<()> {
    let file = File::create(path).map_err(|e| Error::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut writer = csv::Writer::from_writer(BufWriter::new(file));
    for row in page.grid.rows() {
        writer
            .write_record(row.iter().map(|c| c.as_deref().unwrap_or("")))
            .map_err(|e| Error::Csv {
                path: path.to_path_buf(),
                source: e,
            })?;
    }
    writer.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;
    use std::fs;

    fn write_file(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn test_parse_page_name() {
        assert_eq!(parse_page_name("Stat"), ("Stat".to_string(), None));
        assert_eq!(
            parse_page_name("Stat.dlc"),
            ("Stat".to_string(), Some("dlc".to_string()))
        );
    }

    #[test]
    fn test_load_skips_comment_files() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Stat.csv", "hp,atk\n10,5\n20,8\n");
        write_file(dir.path(), "__comment_Stat.csv", "notes\nignore me\n");

        let mut source = CsvSheetSource::new(dir.path());
        source.load().unwrap();

        assert_eq!(source.sheet_names(), vec!["Stat"]);
        let sheet = source.import("Stat").unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.rows[0].get("hp"), Some(&CellValue::Integer(10)));
        assert_eq!(sheet.rows[1].get("atk"), Some(&CellValue::Integer(8)));
    }

    #[test]
    fn test_load_concatenates_sub_named_pages() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Stat.csv", "hp,atk\n10,5\n");
        write_file(dir.path(), "Stat.dlc.csv", "hp,atk\n99,99\n");

        let mut source = CsvSheetSource::new(dir.path());
        source.load().unwrap();

        let sheet = source.import("Stat").unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.rows[1].sub_name, Some("dlc".to_string()));
        assert_eq!(sheet.rows[1].get("hp"), Some(&CellValue::Integer(99)));
    }

    #[test]
    fn test_round_trip_export_save_load_import() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Stat.csv", "hp,name\n10,slime\n20,\"a,b\"\n");

        let mut source = CsvSheetSource::new(dir.path());
        source.load().unwrap();
        let original = source.import("Stat").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let mut out = CsvSheetSource::new(out_dir.path());
        out.export(&original);
        out.save().unwrap();

        let mut reloaded = CsvSheetSource::new(out_dir.path());
        reloaded.load().unwrap();
        let round_tripped = reloaded.import("Stat").unwrap();

        assert_eq!(round_tripped.columns, original.columns);
        assert_eq!(round_tripped.rows, original.rows);
    }

    #[test]
    fn test_export_groups_rows_by_sub_name() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "Stat.csv", "hp\n1\n");
        write_file(dir.path(), "Stat.dlc.csv", "hp\n2\n");

        let mut source = CsvSheetSource::new(dir.path());
        source.load().unwrap();
        let sheet = source.import("Stat").unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let mut out = CsvSheetSource::new(out_dir.path());
        out.export(&sheet);
        out.save().unwrap();

        assert!(out_dir.path().join("Stat.csv").exists());
        assert!(out_dir.path().join("Stat.dlc.csv").exists());
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");

        let mut source = CsvSheetSource::new(&missing);
        assert!(source.load().is_err());
    }
}
