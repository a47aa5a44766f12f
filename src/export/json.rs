use crate::types::Schema;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Export the normalized schema as pretty JSON
pub fn export_json(schema: &Schema, output_path: &Path) -> Result<()> {
    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create output file: {}", output_path.display()))?;

    let output = serde_json::to_string_pretty(schema).context("Failed to serialize JSON")?;
    file.write_all(output.as_bytes())
        .context("Failed to write JSON file")?;
    file.flush().context("Failed to flush file")?;

    Ok(())
}
