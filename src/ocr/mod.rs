pub mod engine;
pub mod preprocess;
pub mod setup;

pub use engine::{OcrEngine, TesseractEngine};
pub use preprocess::{downscale, to_grayscale};
