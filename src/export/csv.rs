use crate::sql::SqlDialect;
use crate::types::Schema;
use anyhow::{Context, Result};
use std::fs::File;
use std::path::Path;

const HEADER: [&str; 10] = [
    "table",
    "column",
    "type",
    "sql_type",
    "primary_key",
    "foreign_key",
    "references",
    "not_null",
    "unique",
    "description",
];

/// Export the schema as a data dictionary, one row per column
pub fn export_csv(schema: &Schema, dialect: SqlDialect, output_path: &Path) -> Result<()> {
    let file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

    let mut writer = csv::Writer::from_writer(file);
    writer
        .write_record(HEADER)
        .context("Failed to write CSV header")?;

    for table in &schema.tables {
        for field in &table.fields {
            writer
                .write_record([
                    table.label.as_str(),
                    field.name.as_str(),
                    field.field_type.as_str(),
                    dialect.column_type(&field.field_type),
                    bool_cell(field.is_primary),
                    bool_cell(field.is_foreign),
                    field.references.as_deref().unwrap_or(""),
                    bool_cell(field.not_null),
                    bool_cell(field.unique),
                    field.description.as_deref().unwrap_or(""),
                ])
                .context("Failed to write CSV row")?;
        }
    }

    writer.flush().context("Failed to flush CSV writer")?;
    Ok(())
}

fn bool_cell(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        ""
    }
}
