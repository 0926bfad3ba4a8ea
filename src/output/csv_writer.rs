//! CSV sink for captured lot numbers.
//!
//! Stands in for the shared spreadsheet: one string column, rows appended in
//! bulk, one open/write/flush per scan.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// CSV header row.
const CSV_HEADER: &str = "lot_number";

/// Destination for the lot values of one scan.
pub trait LotSink {
    /// Appends all rows in one operation. Zero rows is a no-op.
    fn append_rows(&mut self, rows: &[String]) -> Result<()>;
}

/// Appends lot numbers to a local CSV file.
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    /// Opens (and initialises if needed) the CSV file at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        init_csv(path)?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LotSink for CsvSink {
    fn append_rows(&mut self, rows: &[String]) -> Result<()> {
        if rows.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .context("Failed to open CSV for append")?;
        let mut writer = BufWriter::new(file);

        for row in rows {
            writeln!(writer, "{}", escape_field(row)).context("Failed to write CSV row")?;
        }
        writer.flush().context("Failed to flush CSV rows")?;

        crate::log(&format!(
            "Appended {} row(s) to {}",
            rows.len(),
            self.path.display()
        ));
        Ok(())
    }
}

/// Initializes CSV file with header if it doesn't exist or is empty.
///
/// If the file exists and has content, this does nothing (preserves existing data).
pub fn init_csv(path: &Path) -> Result<()> {
    if path.exists() {
        let file = File::open(path).context("Failed to open existing CSV")?;
        let reader = BufReader::new(file);
        if reader.lines().next().is_some() {
            return Ok(());
        }
    }

    let mut file = File::create(path).context("Failed to create CSV file")?;
    writeln!(file, "{}", CSV_HEADER).context("Failed to write CSV header")?;
    Ok(())
}

/// Quotes a field containing a separator, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn rows(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_init_csv_creates_header() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("lots.csv");

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "lot_number\n");
    }

    #[test]
    fn test_init_csv_preserves_existing() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("lots.csv");
        std::fs::write(&csv_path, "lot_number\nA-1\n").unwrap();

        init_csv(&csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content, "lot_number\nA-1\n");
    }

    #[test]
    fn test_append_rows_bulk() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("lots.csv");
        let mut sink = CsvSink::open(&csv_path).unwrap();

        sink.append_rows(&rows(&["L-001", "L-002"])).unwrap();
        sink.append_rows(&rows(&["3082504120078A"])).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines, ["lot_number", "L-001", "L-002", "3082504120078A"]);
    }

    #[test]
    fn test_append_zero_rows_is_noop() {
        let dir = tempdir().unwrap();
        let csv_path = dir.path().join("lots.csv");
        let mut sink = CsvSink::open(&csv_path).unwrap();

        sink.append_rows(&[]).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        assert_eq!(content.lines().count(), 1);
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("ABC123"), "ABC123");
        assert_eq!(escape_field("A,B"), "\"A,B\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }
}
