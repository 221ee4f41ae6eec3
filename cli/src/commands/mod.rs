pub mod cluster;
pub mod tile;

use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use serde_json::Value;

/// Read a JSON options file into a string.
pub(crate) fn read_config(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read config {}", path.display()))
}

/// Pretty-print `value` to `output`, or to stdout when no path is given.
pub(crate) fn write_json(value: &Value, output: Option<&Path>) -> Result<()> {
    let text = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    match output {
        Some(path) => fs::write(path, text).with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{text}").context("Failed to write to stdout")
        }
    }
}
