//! Field classifier.
//!
//! Second pass over all detections. Each non-header detection is either
//! captured by the direct-pattern rule, captured because it sits in a header's
//! column, or discarded. The pattern rule is checked first and bypasses the
//! column filters entirely.

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;
use std::collections::HashSet;

use super::detection::Detection;
use super::geometry::PixelRect;
use super::header::ColumnRegion;
use crate::config::ScannerConfig;

/// Outcome signal of one classification run. Not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ScanStatus {
    Ok,
    NoHeaderFound,
    NoDataFound,
}

impl ScanStatus {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::NoHeaderFound => "No Lot/Roll/Batch header found to anchor a column",
            Self::NoDataFound => "No lot values found",
        }
    }
}

/// What a debug rectangle marks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum AnnotationKind {
    Header,
    ColumnValue,
    PatternValue,
}

/// A rectangle to draw on the debug image.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Annotation {
    pub rect: PixelRect,
    pub kind: AnnotationKind,
    pub text: String,
}

impl Annotation {
    pub fn new(detection: &Detection, kind: AnnotationKind) -> Self {
        Self {
            rect: detection.quad.pixel_rect(),
            kind,
            text: detection.text.clone(),
        }
    }
}

/// How a value was captured.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum CaptureMethod {
    Pattern,
    Column { header: String },
}

/// One accepted value before de-duplication.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Capture {
    pub value: String,
    /// Index of the detection in the input sequence
    pub source: usize,
    #[serde(flatten)]
    pub method: CaptureMethod,
}

/// Result of one classifier pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Classification {
    /// De-duplicated values in first-capture order
    pub values: Vec<String>,
    /// Every capture in detection order, duplicates included
    pub captures: Vec<Capture>,
    pub annotations: Vec<Annotation>,
    pub status: ScanStatus,
}

/// Applies the pattern and column rules with the configured tunables.
#[derive(Clone, Debug)]
pub struct FieldClassifier {
    margin: f32,
    min_value_len: usize,
    denylist: Vec<String>,
    pattern: Option<Regex>,
}

impl FieldClassifier {
    /// Compiles the direct-pattern regex. Fails only on an invalid pattern.
    pub fn new(config: &ScannerConfig) -> Result<Self> {
        let pattern = if config.pattern.enabled {
            let regex = Regex::new(&config.pattern.regex)
                .context(format!("Invalid lot pattern: {}", config.pattern.regex))?;
            Some(regex)
        } else {
            None
        };

        Ok(Self {
            margin: config.column_margin,
            min_value_len: config.min_value_len,
            denylist: config.denylist.iter().map(|d| d.to_uppercase()).collect(),
            pattern,
        })
    }

    pub fn pattern_enabled(&self) -> bool {
        self.pattern.is_some()
    }

    /// Searches the whitespace-stripped, upper-cased text for the lot pattern.
    /// Only the test is normalized; captures keep the detection text as read.
    pub fn matches_pattern(&self, text: &str) -> bool {
        let Some(pattern) = self.pattern.as_ref() else {
            return false;
        };
        let normalized: String = text
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect::<String>()
            .to_uppercase();
        pattern.is_match(&normalized)
    }

    /// Returns the first region whose column holds this detection, if the
    /// detection also passes the value filters.
    pub fn match_column<'a>(
        &self,
        detection: &Detection,
        regions: &'a [ColumnRegion],
    ) -> Option<&'a ColumnRegion> {
        let center_x = detection.quad.center_x();
        let top_y = detection.quad.top();

        let region = regions
            .iter()
            .find(|r| r.is_below(top_y) && r.contains_x(center_x, self.margin))?;

        if self.passes_filters(&detection.text, regions) {
            Some(region)
        } else {
            None
        }
    }

    /// Header self-exclusion, minimum length and denylist.
    fn passes_filters(&self, text: &str, regions: &[ColumnRegion]) -> bool {
        if regions.iter().any(|r| r.label == text) {
            return false;
        }
        if text.chars().count() <= self.min_value_len {
            return false;
        }
        let upper = text.to_uppercase();
        !self.denylist.iter().any(|d| upper.contains(d.as_str()))
    }

    /// Classifies every detection against the given regions.
    pub fn classify(&self, detections: &[Detection], regions: &[ColumnRegion]) -> Classification {
        if regions.is_empty() && !self.pattern_enabled() {
            crate::log("No header found and pattern rule disabled, skipping classification");
            return Classification {
                values: Vec::new(),
                captures: Vec::new(),
                annotations: Vec::new(),
                status: ScanStatus::NoHeaderFound,
            };
        }

        let headers: HashSet<usize> = regions.iter().map(|r| r.source).collect();
        let mut captures = Vec::new();
        let mut annotations = Vec::new();

        for (idx, detection) in detections.iter().enumerate() {
            if headers.contains(&idx) {
                continue;
            }

            if self.matches_pattern(&detection.text) {
                crate::log(&format!("Pattern capture: '{}'", detection.text));
                annotations.push(Annotation::new(detection, AnnotationKind::PatternValue));
                captures.push(Capture {
                    value: detection.text.clone(),
                    source: idx,
                    method: CaptureMethod::Pattern,
                });
                continue;
            }

            if let Some(region) = self.match_column(detection, regions) {
                crate::log(&format!(
                    "Column capture: '{}' under '{}'",
                    detection.text, region.label
                ));
                annotations.push(Annotation::new(detection, AnnotationKind::ColumnValue));
                captures.push(Capture {
                    value: detection.text.clone(),
                    source: idx,
                    method: CaptureMethod::Column {
                        header: region.label.clone(),
                    },
                });
            }
        }

        let values = dedup_preserving_order(captures.iter().map(|c| c.value.clone()));
        let status = if values.is_empty() {
            ScanStatus::NoDataFound
        } else {
            ScanStatus::Ok
        };

        Classification {
            values,
            captures,
            annotations,
            status,
        }
    }
}

/// Drops exact repeats, keeping the first occurrence of each value.
pub fn dedup_preserving_order(values: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .into_iter()
        .filter(|v| seen.insert(v.clone()))
        .collect()
}
