//! Scanner service: image → OCR → header locator → field classifier → debug image.
//!
//! One `LotScanner` is built per process and reused for every image. Each scan
//! is independent and works on its own copy of the image.

use anyhow::{Context, Result};
use image::RgbaImage;
use std::path::Path;

use crate::config::ScannerConfig;
use crate::extract::{
    locate_headers, Annotation, Capture, ColumnRegion, Detection, FieldClassifier, ScanStatus,
};
use crate::ocr::{downscale, to_grayscale, OcrEngine};
use crate::render::render_annotations;

/// Output of one scan.
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Lot values, de-duplicated, in first-capture order
    pub values: Vec<String>,
    pub captures: Vec<Capture>,
    /// Copy of the (possibly downscaled) input with header and value boxes drawn
    pub debug_image: RgbaImage,
    pub status: ScanStatus,
    pub headers: Vec<ColumnRegion>,
    pub annotations: Vec<Annotation>,
}

impl ScanResult {
    pub fn is_ok(&self) -> bool {
        self.status == ScanStatus::Ok
    }
}

pub struct LotScanner<E: OcrEngine> {
    config: ScannerConfig,
    engine: E,
    classifier: FieldClassifier,
}

impl<E: OcrEngine> LotScanner<E> {
    /// Fails only if the configured lot pattern does not compile.
    pub fn new(config: ScannerConfig, engine: E) -> Result<Self> {
        let classifier = FieldClassifier::new(&config)?;
        Ok(Self {
            config,
            engine,
            classifier,
        })
    }

    /// Loads an image file and scans it.
    pub fn scan_file(&self, path: &Path) -> Result<ScanResult> {
        let img = image::open(path)
            .context(format!("Failed to load image: {}", path.display()))?
            .to_rgba8();
        self.scan_image(&img)
    }

    /// Downscales, runs OCR and classifies the detections.
    pub fn scan_image(&self, img: &RgbaImage) -> Result<ScanResult> {
        let working = downscale(img, self.config.max_image_width);
        if working.dimensions() != img.dimensions() {
            crate::log(&format!(
                "Downscaled {}x{} -> {}x{}",
                img.width(),
                img.height(),
                working.width(),
                working.height()
            ));
        }

        let detections = self.engine.detect(&to_grayscale(&working))?;
        crate::log(&format!("OCR returned {} detections", detections.len()));

        Ok(self.scan_detections(working, &detections))
    }

    /// Runs both extraction passes on detections already in `img` coordinates.
    pub fn scan_detections(&self, img: RgbaImage, detections: &[Detection]) -> ScanResult {
        let (headers, mut annotations) = locate_headers(detections, &self.config.header_keywords);
        if headers.is_empty() {
            crate::log("No header keyword found");
        }

        let classification = self.classifier.classify(detections, &headers);
        annotations.extend(classification.annotations);

        let mut debug_image = img;
        render_annotations(&mut debug_image, &annotations);

        crate::log(&format!(
            "Scan finished: {:?}, {} value(s) from {} header(s)",
            classification.status,
            classification.values.len(),
            headers.len()
        ));

        ScanResult {
            values: classification.values,
            captures: classification.captures,
            debug_image,
            status: classification.status,
            headers,
            annotations,
        }
    }
}
