//! Spatial lot-field extraction.
//!
//! Two passes over the OCR detections: [`header::locate_headers`] finds column
//! anchors, then [`classify::FieldClassifier`] decides which remaining boxes
//! are lot values.

pub mod classify;
pub mod detection;
pub mod geometry;
pub mod header;

pub use classify::{Annotation, AnnotationKind, Capture, FieldClassifier, ScanStatus};
pub use detection::{load_detections, Detection};
pub use geometry::{PixelRect, Quad};
pub use header::{locate_headers, ColumnRegion};
