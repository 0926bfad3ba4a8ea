//! Lot Scanner
//!
//! Reads lot/batch numbers from photographed delivery notes. OCR boxes are
//! anchored to "Lot"/"Batch"/"Roll" column headers, with a direct pattern
//! fallback for fixed-length numeric codes, and the values are appended to a
//! CSV sheet.

mod config;
mod extract;
mod ocr;
mod output;
mod paths;
mod render;
mod scanner;

use anyhow::{anyhow, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use image::RgbaImage;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use config::{load_config, ScannerConfig};
use extract::load_detections;
use ocr::TesseractEngine;
use output::{export_to_json, CsvSink, LotSink, ScanReport};
use scanner::{LotScanner, ScanResult};

/// Logs a message to both console and log file with timestamp.
pub fn log(msg: &str) {
    let timestamp = Local::now().format("%H:%M:%S%.3f");
    let line = format!("[{}] {}\n", timestamp, msg);
    print!("{}", line);
    let log_path = paths::get_logs_dir().join("lot_scanner.log");
    if let Ok(mut file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        let _ = file.write_all(line.as_bytes());
    }
}

#[derive(Parser)]
#[command(name = "lot-scanner")]
#[command(about = "Extract lot numbers from delivery note photos")]
#[command(version)]
struct Cli {
    /// Config file (defaults to config.json next to the executable)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use the first-revision rules: no pattern fallback, 100px margin
    #[arg(long, global = true)]
    basic: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// OCR one or more images and extract lot numbers
    Scan {
        images: Vec<PathBuf>,
        /// CSV file to append lot numbers to
        #[arg(long)]
        csv: Option<PathBuf>,
        /// Directory for annotated debug images (defaults to the data dir's debug/)
        #[arg(long)]
        debug_dir: Option<PathBuf>,
        /// Write a JSON report of every scan
        #[arg(long)]
        report: Option<PathBuf>,
        /// Extract only, do not append to the CSV
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify detections from an external OCR run (EasyOCR JSON format)
    Classify {
        detections: PathBuf,
        /// Image the detections belong to, for the debug overlay
        #[arg(long)]
        image: Option<PathBuf>,
        #[arg(long)]
        csv: Option<PathBuf>,
        #[arg(long)]
        debug_dir: Option<PathBuf>,
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print the effective configuration as JSON
    Config,
}

fn main() -> Result<()> {
    // Set up panic hook to log panics
    std::panic::set_hook(Box::new(|panic_info| {
        let msg = if let Some(s) = panic_info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = panic_info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        let location = if let Some(loc) = panic_info.location() {
            format!(" at {}:{}:{}", loc.file(), loc.line(), loc.column())
        } else {
            String::new()
        };
        log(&format!("[PANIC]{} {}", location, msg));
    }));

    let cli = Cli::parse();

    // Ensure output directories exist
    if let Err(e) = paths::ensure_directories() {
        eprintln!("Warning: could not create data directories: {}", e);
    }

    let config = if cli.basic {
        log("Using basic rules");
        ScannerConfig::basic()
    } else {
        load_config(cli.config.as_deref())
    };

    match cli.command {
        Commands::Scan {
            images,
            csv,
            debug_dir,
            report,
            dry_run,
        } => {
            if images.is_empty() {
                return Err(anyhow!("No images given"));
            }
            let engine = TesseractEngine::new(config.ocr.clone());
            let scanner = LotScanner::new(config, engine)?;
            let mut sink = if dry_run { None } else { open_sink(csv.as_deref())? };
            let debug_dir = resolve_debug_dir(debug_dir);

            let mut results = Vec::new();
            for image_path in &images {
                log(&format!("Scanning {}", image_path.display()));
                match scanner.scan_file(image_path) {
                    Ok(result) => {
                        handle_result(image_path, &result, &debug_dir, sink.as_mut());
                        results.push((image_path.display().to_string(), result));
                    }
                    // Skip this image, continue with next
                    Err(e) => log(&format!("Scan failed for {}: {:#}", image_path.display(), e)),
                }
            }

            if let Some(report_path) = report {
                write_report(&results, &report_path)?;
            }
            Ok(())
        }
        Commands::Classify {
            detections,
            image,
            csv,
            debug_dir,
            report,
        } => {
            let engine = TesseractEngine::new(config.ocr.clone());
            let scanner = LotScanner::new(config, engine)?;
            let mut sink = open_sink(csv.as_deref())?;
            let debug_dir = resolve_debug_dir(debug_dir);

            let dets = load_detections(&detections)?;
            log(&format!("Loaded {} detections", dets.len()));

            let img = match &image {
                Some(path) => image::open(path)
                    .context(format!("Failed to load image: {}", path.display()))?
                    .to_rgba8(),
                None => blank_canvas(&dets),
            };

            let result = scanner.scan_detections(img, &dets);
            handle_result(&detections, &result, &debug_dir, sink.as_mut());

            if let Some(report_path) = report {
                write_report(&[(detections.display().to_string(), result)], &report_path)?;
            }
            Ok(())
        }
        Commands::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}

fn open_sink(csv: Option<&Path>) -> Result<Option<CsvSink>> {
    csv.map(CsvSink::open).transpose()
}

fn resolve_debug_dir(debug_dir: Option<PathBuf>) -> PathBuf {
    debug_dir.unwrap_or_else(paths::get_debug_dir)
}

/// Prints the values, saves the debug image and forwards values to the sink.
///
/// Values are only forwarded when the scan status is `Ok`.
fn handle_result(
    source: &Path,
    result: &ScanResult,
    debug_dir: &Path,
    sink: Option<&mut CsvSink>,
) {
    if result.is_ok() {
        log(&format!("Found {} lot(s):", result.values.len()));
        for value in &result.values {
            println!("{}", value);
        }
    } else {
        log(&format!("Scan failed: {}", result.status.message()));
    }

    let debug_path = debug_image_path(debug_dir, source);
    let saved = std::fs::create_dir_all(debug_dir)
        .map_err(anyhow::Error::from)
        .and_then(|_| result.debug_image.save(&debug_path).map_err(anyhow::Error::from));
    match saved {
        Ok(()) => log(&format!("Debug image saved: {}", debug_path.display())),
        Err(e) => log(&format!("Failed to save debug image: {}", e)),
    }

    if let Some(sink) = sink {
        if result.is_ok() {
            if let Err(e) = sink.append_rows(&result.values) {
                log(&format!(
                    "Scan OK, but failed to write {}: {:#}",
                    sink.path().display(),
                    e
                ));
            }
        }
    }
}

/// `<dir>/<stem>_debug.png` for a scanned source file.
fn debug_image_path(dir: &Path, source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "scan".to_string());
    dir.join(format!("{}_debug.png", stem))
}

fn write_report(results: &[(String, ScanResult)], path: &Path) -> Result<()> {
    let reports: Vec<ScanReport> = results
        .iter()
        .map(|(source, result)| ScanReport::new(source, result))
        .collect();
    export_to_json(&reports, path)?;
    log(&format!("Report saved: {}", path.display()));
    Ok(())
}

/// Largest side of the placeholder canvas, in pixels.
const MAX_CANVAS_SIZE: u32 = 8192;

/// White canvas large enough to hold every detection, for when no source
/// image is available. Each side is capped at `MAX_CANVAS_SIZE`.
fn blank_canvas(detections: &[extract::Detection]) -> RgbaImage {
    let width = canvas_extent(detections.iter().map(|d| d.quad.right()));
    let height = canvas_extent(
        detections
            .iter()
            .map(|d| d.quad.bottom().max(d.quad.bottom_left.y)),
    );
    RgbaImage::from_pixel(width, height, image::Rgba([255, 255, 255, 255]))
}

/// Farthest finite edge plus a 10px border, capped.
fn canvas_extent(edges: impl Iterator<Item = f32>) -> u32 {
    let far = edges.filter(|v| v.is_finite()).fold(1.0_f32, f32::max);
    (far.ceil() as u32).saturating_add(10).min(MAX_CANVAS_SIZE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{Detection, Quad, ScanStatus};
    use tempfile::tempdir;

    fn det(x1: f32, y1: f32) -> Detection {
        Detection::new(Quad::from_bounds(0.0, 0.0, x1, y1), "x", 0.9)
    }

    #[test]
    fn test_blank_canvas_fits_detections() {
        let canvas = blank_canvas(&[det(100.0, 40.5), det(60.0, 80.0)]);
        assert_eq!(canvas.dimensions(), (110, 90));
        assert_eq!(blank_canvas(&[]).dimensions(), (11, 11));
    }

    #[test]
    fn test_canvas_extent_is_capped() {
        assert_eq!(canvas_extent([3.0e9_f32].into_iter()), MAX_CANVAS_SIZE);
        assert_eq!(canvas_extent([f32::INFINITY, 20.0].into_iter()), 30);
        assert_eq!(canvas_extent([f32::NAN, -500.0].into_iter()), 11);
        assert_eq!(canvas_extent([8181.5_f32].into_iter()), MAX_CANVAS_SIZE);
    }

    #[test]
    fn test_debug_dir_defaults_to_data_dir() {
        assert_eq!(resolve_debug_dir(None), paths::get_debug_dir());
        assert_eq!(
            resolve_debug_dir(Some(PathBuf::from("out"))),
            PathBuf::from("out")
        );
    }

    #[test]
    fn test_handle_result_saves_debug_image() {
        let dir = tempdir().unwrap();
        let debug_dir = dir.path().join("debug");
        let result = ScanResult {
            values: Vec::new(),
            captures: Vec::new(),
            debug_image: RgbaImage::new(4, 4),
            status: ScanStatus::NoDataFound,
            headers: Vec::new(),
            annotations: Vec::new(),
        };

        handle_result(Path::new("photos/note 1.jpg"), &result, &debug_dir, None);

        assert!(debug_dir.join("note 1_debug.png").exists());
    }
}
