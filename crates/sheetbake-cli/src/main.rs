//! sheetbake CLI
//!
//! Command-line tool for converting authored data sheets into typed
//! table assets and inspecting the exported database.

mod samples;

use clap::{Parser, Subcommand};
use sheetbake_core::{
    CsvSheetSource, DatabaseAsset, DatabaseExporter, TableAsset, DEFAULT_DATABASE_NAME,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sheetbake")]
#[command(about = "Sheet-to-typed-table converter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert sheets from a source directory into table assets
    Convert {
        /// Directory containing the source CSV files
        #[arg(short, long)]
        root: PathBuf,

        /// Directory to write the database and table assets into
        #[arg(short, long)]
        out: PathBuf,

        /// Name of the database asset
        #[arg(short, long, default_value = DEFAULT_DATABASE_NAME)]
        database: String,

        /// Sheet names to exclude from conversion
        #[arg(short, long)]
        ignore: Vec<String>,

        /// Print the conversion report as JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// List sheets discovered in a source directory
    ListSheets {
        /// Directory containing the source CSV files
        #[arg(short, long)]
        root: PathBuf,

        /// Show the pages backing each sheet
        #[arg(short, long)]
        verbose: bool,
    },

    /// Import and display one sheet
    Show {
        /// Directory containing the source CSV files
        #[arg(short, long)]
        root: PathBuf,

        /// Sheet name to display
        #[arg(short, long)]
        sheet: String,

        /// Maximum number of rows to display
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show the active and redundant tables of an exported database
    Status {
        /// Directory holding the exported assets
        #[arg(short, long)]
        out: PathBuf,

        /// Name of the database asset
        #[arg(short, long, default_value = DEFAULT_DATABASE_NAME)]
        database: String,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run() -> sheetbake_core::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Convert {
            root,
            out,
            database,
            ignore,
            json,
        } => cmd_convert(&root, &out, &database, ignore, json),
        Commands::ListSheets { root, verbose } => cmd_list_sheets(&root, verbose),
        Commands::Show { root, sheet, limit } => cmd_show(&root, &sheet, limit),
        Commands::Status { out, database } => cmd_status(&out, &database),
    }
}

fn cmd_convert(
    root: &PathBuf,
    out: &PathBuf,
    database: &str,
    ignore: Vec<String>,
    json: bool,
) -> sheetbake_core::Result<()> {
    let registry = samples::build_registry();
    let exporter = DatabaseExporter::new(out)
        .with_database_name(database)
        .with_ignored(ignore);

    let mut source = CsvSheetSource::new(root);
    let report = exporter.run(&mut source, &registry)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Converted {} sheet(s) into {}", report.converted, out.display());

    if !report.ignored.is_empty() {
        println!("Ignored: {}", report.ignored.join(", "));
    }

    if !report.skipped_sheets.is_empty() {
        println!("\nSkipped sheets ({}):", report.skipped_sheets.len());
        for skip in &report.skipped_sheets {
            println!("  {}: {}", skip.sheet, skip.reason);
        }
    }

    if !report.skipped_rows.is_empty() {
        println!("\nSkipped rows ({}):", report.skipped_rows.len());
        for skip in &report.skipped_rows {
            println!("  {} row {}: {}", skip.sheet, skip.row, skip.reason);
        }
    }

    println!("\nActive tables ({}):", report.active_kinds.len());
    for kind in &report.active_kinds {
        println!("  {}", kind);
    }

    if !report.redundant_kinds.is_empty() {
        println!("\nRedundant tables ({}):", report.redundant_kinds.len());
        for kind in &report.redundant_kinds {
            println!("  {}", kind);
        }
    }

    Ok(())
}

fn cmd_list_sheets(root: &PathBuf, verbose: bool) -> sheetbake_core::Result<()> {
    let mut source = CsvSheetSource::new(root);
    source.load()?;

    let names = source.sheet_names();
    println!("Sheets ({}):", names.len());

    for name in names {
        let pages = source.pages(name);
        if verbose {
            println!("{} ({} page(s))", name, pages.len());
            for page in pages {
                let sub = match &page.sub_name {
                    Some(s) => format!(" [{}]", s),
                    None => " [base]".to_string(),
                };
                println!("  {} rows{}", page.grid.row_count().saturating_sub(1), sub);
            }
        } else {
            println!("  {} ({} page(s))", name, pages.len());
        }
    }

    Ok(())
}

fn cmd_show(root: &PathBuf, sheet_name: &str, limit: Option<usize>) -> sheetbake_core::Result<()> {
    let mut source = CsvSheetSource::new(root);
    source.load()?;

    let sheet = source
        .import(sheet_name)
        .ok_or_else(|| sheetbake_core::Error::SheetNotFound(sheet_name.to_string()))?;

    let header: Vec<&str> = sheet.columns.iter().map(|c| c.as_str()).collect();
    println!("{}", header.join("\t"));
    println!("{}", "-".repeat(header.len() * 12));

    let row_limit = limit.unwrap_or(sheet.rows.len());
    for row in sheet.rows.iter().take(row_limit) {
        let values: Vec<String> = sheet.columns.iter().map(|c| row.text(c)).collect();
        println!("{}", values.join("\t"));
    }

    if sheet.rows.len() > row_limit {
        println!("... ({} more rows)", sheet.rows.len() - row_limit);
    }

    Ok(())
}

fn cmd_status(out: &PathBuf, database: &str) -> sheetbake_core::Result<()> {
    let path = DatabaseAsset::asset_path(out, database);
    let db = DatabaseAsset::load(&path)?;

    println!("Database: {}", db.name);
    println!("Exported: {}", db.exported_at);
    println!();

    println!("Active tables ({}):", db.tables.len());
    for table in &db.tables {
        match TableAsset::load(&table.path) {
            Ok(asset) => println!("  {} ({} records)", table.kind, asset.len()),
            Err(_) => println!("  {} (asset missing: {})", table.kind, table.path.display()),
        }
    }

    println!();
    println!("Redundant tables ({}):", db.redundant.len());
    for table in &db.redundant {
        println!("  {} ({})", table.kind, table.path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_convert_report_renders_as_json() {
        let src = tempfile::tempdir().unwrap();
        fs::write(src.path().join("Stat.csv"), "hp,atk\n10,5\n20,8\n").unwrap();
        let out = tempfile::tempdir().unwrap();

        let registry = samples::build_registry();
        let exporter = DatabaseExporter::new(out.path());
        let mut source = CsvSheetSource::new(src.path());
        let report = exporter.run(&mut source, &registry).unwrap();

        let rendered = serde_json::to_string_pretty(&report).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["converted"], 1);
        assert_eq!(value["active_kinds"][0], "StatDataTable");
        assert_eq!(value["skipped_sheets"].as_array().unwrap().len(), 0);
        assert!(value["exported_at"].is_string());
    }
}
