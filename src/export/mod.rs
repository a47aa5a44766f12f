mod csv;
mod json;

use crate::sql::SqlDialect;
use crate::types::Schema;
use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

pub use csv::export_csv;
pub use json::export_json;

/// File name used when saving the migration script
pub const SCRIPT_FILE_NAME: &str = "database_schema.sql";

/// Export format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Sql,
    Json,
    Csv,
}

impl ExportFormat {
    pub fn default_file_name(self) -> &'static str {
        match self {
            ExportFormat::Sql => SCRIPT_FILE_NAME,
            ExportFormat::Json => "database_schema.json",
            ExportFormat::Csv => "database_schema.csv",
        }
    }
}

/// Write a generation result to a file
pub fn export(
    schema: &Schema,
    sql: &str,
    dialect: SqlDialect,
    format: ExportFormat,
    output_path: &Path,
) -> Result<()> {
    match format {
        ExportFormat::Sql => export_sql(sql, output_path),
        ExportFormat::Json => export_json(schema, output_path),
        ExportFormat::Csv => export_csv(schema, dialect, output_path),
    }
}

/// Write the script as-is
pub fn export_sql(sql: &str, output_path: &Path) -> Result<()> {
    if sql.trim().is_empty() {
        bail!("There is no SQL script to save yet");
    }
    fs::write(output_path, sql)
        .with_context(|| format!("Failed to write SQL file: {}", output_path.display()))
}

/// Save the script as `database_schema.sql` inside `dir`
pub fn save_script(dir: &Path, sql: &str) -> Result<PathBuf> {
    let path = dir.join(SCRIPT_FILE_NAME);
    export_sql(sql, &path)?;
    Ok(path)
}
