//! Header locator.
//!
//! Finds detections whose text contains a header keyword and turns each one
//! into a column region: the header's horizontal span plus the y-coordinate
//! below which its values must start.

use serde::Serialize;

use super::classify::{Annotation, AnnotationKind};
use super::detection::Detection;

/// Capture zone below one header.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColumnRegion {
    /// Index of the header detection in the input sequence
    pub source: usize,
    pub x_min: f32,
    pub x_max: f32,
    /// Values must start strictly below this y
    pub y_start: f32,
    /// Original header text
    pub label: String,
}

impl ColumnRegion {
    pub fn from_detection(source: usize, detection: &Detection) -> Self {
        let quad = &detection.quad;
        Self {
            source,
            x_min: quad.left(),
            x_max: quad.right(),
            y_start: quad.bottom(),
            label: detection.text.clone(),
        }
    }

    /// Inclusive horizontal test against the span widened by `margin`.
    pub fn contains_x(&self, x: f32, margin: f32) -> bool {
        x >= self.x_min - margin && x <= self.x_max + margin
    }

    /// True if `y` lies strictly below the header.
    pub fn is_below(&self, y: f32) -> bool {
        y > self.y_start
    }
}

/// Case-insensitive substring match against any keyword.
pub fn is_header_text(text: &str, keywords: &[String]) -> bool {
    let clean = text.trim().to_lowercase();
    keywords
        .iter()
        .any(|k| !k.is_empty() && clean.contains(&k.to_lowercase()))
}

/// Scans all detections in order and returns one region per header, with a
/// header annotation for each.
pub fn locate_headers(
    detections: &[Detection],
    keywords: &[String],
) -> (Vec<ColumnRegion>, Vec<Annotation>) {
    let mut regions = Vec::new();
    let mut annotations = Vec::new();

    for (idx, detection) in detections.iter().enumerate() {
        if !is_header_text(&detection.text, keywords) {
            continue;
        }

        let region = ColumnRegion::from_detection(idx, detection);
        crate::log(&format!(
            "Header '{}' at x=[{:.0}, {:.0}], values below y={:.0}",
            region.label, region.x_min, region.x_max, region.y_start
        ));
        annotations.push(Annotation::new(detection, AnnotationKind::Header));
        regions.push(region);
    }

    (regions, annotations)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::geometry::{Point, Quad};

    fn keywords() -> Vec<String> {
        crate::config::ScannerConfig::default().header_keywords
    }

    fn det(text: &str, x0: f32, y0: f32, x1: f32, y1: f32) -> Detection {
        Detection::new(Quad::from_bounds(x0, y0, x1, y1), text, 0.9)
    }

    #[test]
    fn test_header_keyword_substring() {
        let kw = keywords();
        assert!(is_header_text("Lot No.", &kw));
        assert!(is_header_text("  BATCH NUMBER ", &kw));
        assert!(is_header_text("Roll ID", &kw));
        // Substring match, no tokenisation
        assert!(is_header_text("Width", &kw));
        assert!(!is_header_text("Weight", &kw));
        assert!(!is_header_text("TOTAL", &kw));
    }

    #[test]
    fn test_empty_input_yields_no_regions() {
        let (regions, annotations) = locate_headers(&[], &keywords());
        assert!(regions.is_empty());
        assert!(annotations.is_empty());
    }

    #[test]
    fn test_region_geometry_from_header() {
        let detections = vec![det("Lot No.", 100.0, 0.0, 200.0, 20.0)];
        let (regions, annotations) = locate_headers(&detections, &keywords());

        assert_eq!(regions.len(), 1);
        assert_eq!(annotations.len(), 1);
        let r = &regions[0];
        assert_eq!((r.x_min, r.x_max, r.y_start), (100.0, 200.0, 20.0));
        assert_eq!(r.label, "Lot No.");
        assert_eq!(r.source, 0);
    }

    #[test]
    fn test_rotated_header_uses_right_edge_bottom() {
        let quad = Quad::new(
            Point::new(100.0, 2.0),
            Point::new(200.0, 0.0),
            Point::new(200.0, 18.0),
            Point::new(98.0, 22.0),
        );
        let detections = vec![Detection::new(quad, "Batch", 0.9)];
        let (regions, _) = locate_headers(&detections, &keywords());

        assert_eq!(regions[0].x_min, 98.0);
        assert_eq!(regions[0].y_start, 18.0);
    }

    #[test]
    fn test_one_region_per_header_in_input_order() {
        let detections = vec![
            det("Qty", 0.0, 0.0, 40.0, 20.0),
            det("Roll No.", 300.0, 0.0, 380.0, 20.0),
            det("Lot", 100.0, 0.0, 150.0, 20.0),
        ];
        let (regions, _) = locate_headers(&detections, &keywords());

        // "Roll No." matches two keywords but yields one region
        let labels: Vec<&str> = regions.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(labels, ["Roll No.", "Lot"]);
        assert_eq!(regions[0].source, 1);
        assert_eq!(regions[1].source, 2);
    }

    #[test]
    fn test_margin_is_inclusive() {
        let region = ColumnRegion::from_detection(0, &det("Lot", 100.0, 0.0, 200.0, 20.0));
        assert!(region.contains_x(40.0, 60.0));
        assert!(region.contains_x(260.0, 60.0));
        assert!(!region.contains_x(39.0, 60.0));
        assert!(!region.contains_x(261.0, 60.0));
    }

    #[test]
    fn test_below_is_strict() {
        let region = ColumnRegion::from_detection(0, &det("Lot", 100.0, 0.0, 200.0, 20.0));
        assert!(!region.is_below(20.0));
        assert!(region.is_below(20.5));
    }
}
