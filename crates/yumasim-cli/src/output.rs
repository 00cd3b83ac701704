// crates/yumasim-cli/src/output.rs
//
// Output formatting utilities for the yumasim CLI.
// Supports table, JSON, and CSV file output.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tabled::builder::Builder;
use tabled::{Table, Tabled};

/// Output format for CLI commands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        }
    }
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format rows whose columns are only known at runtime.
pub fn format_records(header: Vec<String>, rows: Vec<Vec<String>>) -> String {
    let mut builder = Builder::default();
    builder.push_record(header);
    for row in rows {
        builder.push_record(row);
    }
    builder.build().to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Write `contents` to `dir/file_name`, creating `dir` if needed.
pub fn write_file(dir: &Path, file_name: &str, contents: &str) -> std::io::Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    fs::write(&path, contents)?;
    tracing::info!("Wrote {}", path.display());
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_records_includes_header() {
        let out = format_records(
            vec!["Validator".into(), "Total".into()],
            vec![vec!["A".into(), "1.0".into()]],
        );
        assert!(out.contains("Validator"));
        assert!(out.contains("1.0"));
    }

    #[test]
    fn test_write_file_creates_dir() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("results");
        let path = write_file(&nested, "out.csv", "a,b\n").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "a,b\n");
    }
}
