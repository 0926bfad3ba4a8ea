//! OCR detections: the input of the extraction engine.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::geometry::{Point, Quad};

/// One OCR-reported text box.
///
/// `confidence` is carried through but never used for filtering.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub quad: Quad,
    pub text: String,
    pub confidence: f32,
}

impl Detection {
    pub fn new(quad: Quad, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            quad,
            text: text.into(),
            confidence,
        }
    }
}

/// EasyOCR-style record: `[[[x,y],[x,y],[x,y],[x,y]], "text", conf]`.
#[derive(Deserialize)]
struct DetectionRecord(Vec<[f32; 2]>, String, f32);

impl TryFrom<DetectionRecord> for Detection {
    type Error = anyhow::Error;

    fn try_from(record: DetectionRecord) -> Result<Self> {
        let DetectionRecord(points, text, confidence) = record;
        let [tl, tr, br, bl]: [[f32; 2]; 4] = points
            .try_into()
            .map_err(|p: Vec<[f32; 2]>| anyhow!("Expected 4 corners for '{}', got {}", text, p.len()))?;
        let quad = Quad::new(
            Point::new(tl[0], tl[1]),
            Point::new(tr[0], tr[1]),
            Point::new(br[0], br[1]),
            Point::new(bl[0], bl[1]),
        );
        Ok(Detection::new(quad, text, confidence))
    }
}

/// Parses a JSON array of EasyOCR-style records.
pub fn parse_detections(json: &str) -> Result<Vec<Detection>> {
    let records: Vec<DetectionRecord> =
        serde_json::from_str(json).context("Failed to parse detections JSON")?;
    records.into_iter().map(Detection::try_from).collect()
}

/// Loads detections produced by an external OCR run.
pub fn load_detections(path: &Path) -> Result<Vec<Detection>> {
    let json = std::fs::read_to_string(path)
        .context(format!("Failed to read detections file: {}", path.display()))?;
    parse_detections(&json)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_easyocr_records() {
        let json = r#"[
            [[[100, 0], [200, 0], [200, 20], [100, 20]], "Lot No.", 0.98],
            [[[110.5, 30], [190, 30], [190, 45], [110.5, 45]], "ABC123", 0.71]
        ]"#;

        let detections = parse_detections(json).unwrap();
        assert_eq!(detections.len(), 2);
        assert_eq!(detections[0].text, "Lot No.");
        assert_eq!(detections[0].quad.right(), 200.0);
        assert_eq!(detections[1].quad.top_left, Point::new(110.5, 30.0));
        assert_eq!(detections[1].confidence, 0.71);
    }

    #[test]
    fn test_parse_rejects_wrong_corner_count() {
        let json = r#"[[[[0, 0], [1, 0], [1, 1]], "x", 0.5]]"#;
        assert!(parse_detections(json).is_err());
    }

    #[test]
    fn test_parse_empty_array() {
        assert!(parse_detections("[]").unwrap().is_empty());
    }
}
