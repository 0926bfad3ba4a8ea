//! Persistence of scan results: CSV rows for the lot list, JSON for reports.

pub mod csv_writer;
pub mod export;

pub use csv_writer::{CsvSink, LotSink};
pub use export::{export_to_json, ScanReport};
