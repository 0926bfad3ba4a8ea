//! Scanner configuration.
//!
//! Loads tunables from config.json: header keywords, column margin, value
//! filters, the direct-pattern rule and OCR settings. Missing fields fall back
//! to the defaults below, so a partial file is valid.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Direct-pattern rule settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PatternConfig {
    /// When false, only the column rule can capture values
    #[serde(default = "default_pattern_enabled")]
    pub enabled: bool,
    /// Regex searched in the whitespace-stripped, upper-cased text
    #[serde(default = "default_pattern_regex")]
    pub regex: String,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            enabled: default_pattern_enabled(),
            regex: default_pattern_regex(),
        }
    }
}

/// Settings for the Tesseract OCR collaborator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OcrConfig {
    /// Explicit path to the tesseract executable (PATH lookup if unset)
    #[serde(default)]
    pub tesseract_path: Option<PathBuf>,
    /// Explicit tessdata directory
    #[serde(default)]
    pub tessdata_dir: Option<PathBuf>,
    /// Tesseract language (`-l`)
    #[serde(default = "default_language")]
    pub language: String,
    /// Tesseract page segmentation mode (`--psm`)
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: u8,
    /// Words on one line are joined when the gap is at most this many line heights
    #[serde(default = "default_word_gap_ratio")]
    pub word_gap_ratio: f32,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            tesseract_path: None,
            tessdata_dir: None,
            language: default_language(),
            page_seg_mode: default_page_seg_mode(),
            word_gap_ratio: default_word_gap_ratio(),
        }
    }
}

/// Complete scanner configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Lower-case keywords; a detection containing any of them is a column header
    #[serde(default = "default_header_keywords")]
    pub header_keywords: Vec<String>,
    /// Horizontal tolerance in pixels on each side of a header's span
    #[serde(default = "default_column_margin")]
    pub column_margin: f32,
    /// Column captures must be strictly longer than this many characters
    #[serde(default = "default_min_value_len")]
    pub min_value_len: usize,
    /// Upper-case substrings that disqualify a column capture
    #[serde(default = "default_denylist")]
    pub denylist: Vec<String>,
    #[serde(default)]
    pub pattern: PatternConfig,
    /// Images wider than this are downscaled before OCR (0 disables)
    #[serde(default = "default_max_image_width")]
    pub max_image_width: u32,
    #[serde(default)]
    pub ocr: OcrConfig,
}

fn default_header_keywords() -> Vec<String> {
    ["lot", "roll", "batch", "no.", "number", "id", "code", "rolls"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_column_margin() -> f32 {
    60.0
}

fn default_min_value_len() -> usize {
    3
}

fn default_denylist() -> Vec<String> {
    [
        "TOTAL", "WEIGHT", "KG", "MM", "DATE", "QTY", "NET", "ROLLS", "MIC",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn default_pattern_enabled() -> bool {
    true
}

fn default_pattern_regex() -> String {
    r"\d{13}[A-Z]?".to_string()
}

fn default_max_image_width() -> u32 {
    1280
}

fn default_language() -> String {
    "eng".to_string()
}

fn default_page_seg_mode() -> u8 {
    11 // Sparse text: tables and scattered labels
}

fn default_word_gap_ratio() -> f32 {
    0.8
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self::extended()
    }
}

impl ScannerConfig {
    /// Later revision: tight margin, pattern fallback, wide denylist, downscaling.
    pub fn extended() -> Self {
        Self {
            header_keywords: default_header_keywords(),
            column_margin: default_column_margin(),
            min_value_len: default_min_value_len(),
            denylist: default_denylist(),
            pattern: PatternConfig::default(),
            max_image_width: default_max_image_width(),
            ocr: OcrConfig::default(),
        }
    }

    /// First revision: column rule only, 100px margin, short denylist.
    pub fn basic() -> Self {
        Self {
            column_margin: 100.0,
            denylist: ["TOTAL", "WEIGHT", "KG", "MM", "DATE", "QTY", "NET"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            pattern: PatternConfig {
                enabled: false,
                regex: default_pattern_regex(),
            },
            max_image_width: 0,
            ..Self::extended()
        }
    }
}

/// Loads configuration from `path`, or from config.json next to the
/// executable when no path is given. Falls back to defaults on any failure.
pub fn load_config(path: Option<&Path>) -> ScannerConfig {
    let config_path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(crate::paths::get_default_config_path);

    crate::log(&format!("Looking for config at: {}", config_path.display()));

    if config_path.exists() {
        match fs::read_to_string(&config_path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    crate::log("Config loaded");
                    return config;
                }
                Err(e) => {
                    crate::log(&format!(
                        "Failed to parse {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    ));
                }
            },
            Err(e) => {
                crate::log(&format!(
                    "Failed to read {}: {}. Using defaults.",
                    config_path.display(),
                    e
                ));
            }
        }
    } else {
        crate::log("Config file not found. Using default config.");
    }

    ScannerConfig::default()
}
