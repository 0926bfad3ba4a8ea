use anyhow::{anyhow, Context, Result};
use image::GrayImage;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::OnceLock;
use tempfile::NamedTempFile;

use super::setup::{locate_tesseract, TesseractPaths};
use crate::config::OcrConfig;
use crate::extract::{Detection, Quad};

/// Source of text detections for one image.
pub trait OcrEngine {
    fn detect(&self, img: &GrayImage) -> Result<Vec<Detection>>;
}

/// A single word box from Tesseract TSV output
#[derive(Debug, Clone, PartialEq)]
pub struct OcrWord {
    pub text: String,
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
    pub confidence: f32,
    /// (block, paragraph, line) this word belongs to
    pub line_key: (i32, i32, i32),
}

impl OcrWord {
    fn right(&self) -> f32 {
        self.left + self.width
    }

    fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

/// Tesseract CLI wrapper. The executable is located on first use and reused
/// for every later call on the same engine.
pub struct TesseractEngine {
    config: OcrConfig,
    paths: OnceLock<TesseractPaths>,
}

impl TesseractEngine {
    pub fn new(config: OcrConfig) -> Self {
        Self {
            config,
            paths: OnceLock::new(),
        }
    }

    fn paths(&self) -> Result<&TesseractPaths> {
        if let Some(paths) = self.paths.get() {
            return Ok(paths);
        }
        let located = locate_tesseract(&self.config)?;
        Ok(self.paths.get_or_init(|| located))
    }
}

impl OcrEngine for TesseractEngine {
    /// Runs Tesseract on a grayscale image and groups its words into detections.
    fn detect(&self, img: &GrayImage) -> Result<Vec<Detection>> {
        let paths = self.paths()?;

        // Save image to temporary file
        let temp_input = NamedTempFile::with_suffix(".png")?;
        img.save(temp_input.path())
            .context("Failed to write OCR input image")?;

        // Tesseract appends .tsv to the output base
        let temp_output = NamedTempFile::new()?;
        let output_base = temp_output.path().to_string_lossy().to_string();

        let mut command = Command::new(&paths.executable);
        command.arg(temp_input.path()).arg(&output_base);
        if let Some(tessdata) = &paths.tessdata {
            command.arg("--tessdata-dir").arg(tessdata);
        }
        let output = command
            .arg("-l")
            .arg(&self.config.language)
            .arg("--psm")
            .arg(self.config.page_seg_mode.to_string())
            .arg("tsv")
            .output()
            .context("Failed to run Tesseract")?;

        let tsv_path = PathBuf::from(format!("{}.tsv", output_base));
        let failure = (!output.status.success())
            .then(|| String::from_utf8_lossy(&output.stderr).to_string());
        let tsv_content = take_tsv_output(&tsv_path, failure)?;

        let words = parse_tsv_words(&tsv_content);
        let detections = group_words(&words, self.config.word_gap_ratio);
        crate::log(&format!(
            "OCR: {} words grouped into {} detections",
            words.len(),
            detections.len()
        ));
        Ok(detections)
    }
}

/// Parses word rows (level 5) from Tesseract TSV output.
/// Reads Tesseract's TSV output and removes the file.
///
/// `failure` carries stderr of a failed run; the file is removed then too,
/// since Tesseract may leave a partial TSV behind.
fn take_tsv_output(tsv_path: &Path, failure: Option<String>) -> Result<String> {
    let content = match failure {
        Some(stderr) => Err(anyhow!("Tesseract failed: {}", stderr)),
        None => std::fs::read_to_string(tsv_path)
            .map_err(|e| anyhow!("Failed to read Tesseract output: {}", e)),
    };
    let _ = std::fs::remove_file(tsv_path);
    content
}

pub fn parse_tsv_words(tsv: &str) -> Vec<OcrWord> {
    let mut words = Vec::new();

    for line in tsv.lines().skip(1) {
        // Skip header
        let fields: Vec<&str> = line.split('\t').collect();
        if fields.len() < 12 {
            continue;
        }

        // TSV fields: level, page_num, block_num, par_num, line_num, word_num,
        //             left, top, width, height, conf, text
        let level: i32 = fields[0].parse().unwrap_or(-1);
        if level != 5 {
            continue;
        }

        let text = fields[11].trim();
        let conf: f32 = fields[10].parse().unwrap_or(-1.0);
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let num = |i: usize| fields[i].parse::<f32>().ok();
        let (Some(left), Some(top), Some(width), Some(height)) = (num(6), num(7), num(8), num(9))
        else {
            continue;
        };

        words.push(OcrWord {
            text: text.to_string(),
            left,
            top,
            width,
            height,
            confidence: conf,
            line_key: (
                fields[2].parse().unwrap_or(-1),
                fields[3].parse().unwrap_or(-1),
                fields[4].parse().unwrap_or(-1),
            ),
        });
    }

    words
}

/// Joins neighbouring words of the same line into one detection.
///
/// Words stay together while the horizontal gap to the previous word is at
/// most `gap_ratio` times the taller word's height; a wider gap starts a new
/// detection, which keeps table cells on the same row apart.
pub fn group_words(words: &[OcrWord], gap_ratio: f32) -> Vec<Detection> {
    let mut detections = Vec::new();
    let mut segment: Vec<&OcrWord> = Vec::new();

    for word in words {
        if let Some(prev) = segment.last() {
            let gap = word.left - prev.right();
            let limit = gap_ratio * prev.height.max(word.height);
            if word.line_key != prev.line_key || gap > limit {
                detections.push(segment_to_detection(&segment));
                segment.clear();
            }
        }
        segment.push(word);
    }

    if !segment.is_empty() {
        detections.push(segment_to_detection(&segment));
    }

    detections
}

fn segment_to_detection(segment: &[&OcrWord]) -> Detection {
    let x_min = segment.iter().map(|w| w.left).fold(f32::INFINITY, f32::min);
    let y_min = segment.iter().map(|w| w.top).fold(f32::INFINITY, f32::min);
    let x_max = segment.iter().map(|w| w.right()).fold(f32::NEG_INFINITY, f32::max);
    let y_max = segment.iter().map(|w| w.bottom()).fold(f32::NEG_INFINITY, f32::max);

    let text = segment
        .iter()
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let avg_conf = segment.iter().map(|w| w.confidence).sum::<f32>() / segment.len() as f32;

    Detection::new(Quad::from_bounds(x_min, y_min, x_max, y_max), text, avg_conf / 100.0)
}
