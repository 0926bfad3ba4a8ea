//! JSON export of a scan result.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::extract::{Annotation, Capture, ColumnRegion, ScanStatus};
use crate::scanner::ScanResult;

/// Serializable view of a scan, without the image.
#[derive(Debug, Serialize)]
pub struct ScanReport<'a> {
    pub source: &'a str,
    pub scanned_at: String,
    pub status: ScanStatus,
    pub message: &'static str,
    pub values: &'a [String],
    pub headers: &'a [ColumnRegion],
    pub captures: &'a [Capture],
    /// Boxes drawn on the debug image
    pub annotations: &'a [Annotation],
}

impl<'a> ScanReport<'a> {
    pub fn new(source: &'a str, result: &'a ScanResult) -> Self {
        Self {
            source,
            scanned_at: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            status: result.status,
            message: result.status.message(),
            values: &result.values,
            headers: &result.headers,
            captures: &result.captures,
            annotations: &result.annotations,
        }
    }
}

/// Export scan reports to a JSON file.
///
/// The output is pretty-printed for human readability.
pub fn export_to_json(reports: &[ScanReport], output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(reports).context("Failed to serialize scan report to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::classify::CaptureMethod;
    use image::RgbaImage;
    use tempfile::tempdir;

    fn sample_result() -> ScanResult {
        ScanResult {
            values: vec!["ABC123".to_string()],
            captures: vec![Capture {
                value: "ABC123".to_string(),
                source: 1,
                method: CaptureMethod::Column {
                    header: "Batch".to_string(),
                },
            }],
            debug_image: RgbaImage::new(1, 1),
            status: ScanStatus::Ok,
            headers: vec![ColumnRegion {
                source: 0,
                x_min: 50.0,
                x_max: 150.0,
                y_start: 20.0,
                label: "Batch".to_string(),
            }],
            annotations: Vec::new(),
        }
    }

    #[test]
    fn test_export_to_json() {
        let result = sample_result();
        let dir = tempdir().unwrap();
        let path = dir.path().join("report.json");

        export_to_json(&[ScanReport::new("note.jpg", &result)], &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        let report = &json[0];
        assert_eq!(report["source"], "note.jpg");
        assert_eq!(report["status"], "Ok");
        assert_eq!(report["values"][0], "ABC123");
        assert_eq!(report["headers"][0]["label"], "Batch");
        assert_eq!(report["captures"][0]["method"], "column");
        assert_eq!(report["captures"][0]["header"], "Batch");
        assert!(report["annotations"].as_array().unwrap().is_empty());
    }
}
