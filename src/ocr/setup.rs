use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::config::OcrConfig;
use crate::log;

#[derive(Debug, Clone)]
pub struct TesseractPaths {
    pub executable: PathBuf,
    /// None lets Tesseract use its built-in tessdata location
    pub tessdata: Option<PathBuf>,
}

/// Common install locations checked when `tesseract` is not on PATH.
const COMMON_PATHS: &[&str] = &[
    "/usr/bin/tesseract",
    "/usr/local/bin/tesseract",
    "/opt/homebrew/bin/tesseract",
    r"C:\Program Files\Tesseract-OCR\tesseract.exe",
    r"C:\Program Files (x86)\Tesseract-OCR\tesseract.exe",
];

/// Returns the optional user tessdata directory: `<data_local_dir>/lot-scanner/tessdata/`
pub fn get_user_tessdata_dir() -> PathBuf {
    crate::paths::get_data_dir().join("tessdata")
}

/// Finds the Tesseract executable and tessdata directory.
///
/// Order: configured path, `tesseract` on PATH, common install locations.
pub fn locate_tesseract(config: &OcrConfig) -> Result<TesseractPaths> {
    let tessdata = config.tessdata_dir.clone().or_else(|| {
        let user_dir = get_user_tessdata_dir();
        has_traineddata(&user_dir, &config.language).then_some(user_dir)
    });

    if let Some(path) = &config.tesseract_path {
        if path.exists() {
            log(&format!("Tesseract (configured): {}", path.display()));
            return Ok(TesseractPaths {
                executable: path.clone(),
                tessdata,
            });
        }
        log(&format!(
            "Configured Tesseract not found at {}, searching PATH",
            path.display()
        ));
    }

    if responds_to_version(Path::new("tesseract")) {
        log("Found Tesseract in system PATH");
        return Ok(TesseractPaths {
            executable: PathBuf::from("tesseract"),
            tessdata,
        });
    }

    for path in COMMON_PATHS {
        let candidate = PathBuf::from(path);
        if candidate.exists() {
            log(&format!("Found Tesseract at: {}", path));
            return Ok(TesseractPaths {
                executable: candidate,
                tessdata,
            });
        }
    }

    Err(anyhow!(
        "Tesseract not found. Install it, add it to PATH, or set ocr.tesseract_path in config.json"
    ))
}

fn responds_to_version(executable: &Path) -> bool {
    Command::new(executable)
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

fn has_traineddata(dir: &Path, language: &str) -> bool {
    dir.join(format!("{}.traineddata", language)).exists()
}
