use crate::error::Result;
use crate::processing::statistics::Summary;
use chrono::Local;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::{create_dir_all, OpenOptions};
use std::path::Path;

#[derive(Debug, Serialize)]
struct SummaryRow<'a> {
    timestamp: String,
    source: &'a str,
    series: &'a str,
    count: usize,
    mean_ms: f64,
    min_ms: f64,
    max_ms: f64,
    std_dev_ms: f64,
}

/// Appends one summary row to a CSV log, writing the header if the file is new
///
/// # Arguments
///
/// * `path` - The CSV log file, created along with its directory if missing
/// * `source` - The analyzed recording
/// * `series` - Which series was summarized, e.g. `intervals Arduino`
/// * `summary` - The statistics to record
pub fn log_summary_csv(path: &Path, source: &str, series: &str, summary: &Summary) -> Result<()> {
    if let Some(parent) = path.parent() {
        create_dir_all(parent)?;
    }
    let file_exists = path.metadata().map(|m| m.len() > 0).unwrap_or(false);

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(SummaryRow {
        timestamp: Local::now().to_rfc3339(),
        source,
        series,
        count: summary.count,
        mean_ms: summary.mean,
        min_ms: summary.min,
        max_ms: summary.max,
        std_dev_ms: summary.std_dev,
    })?;
    writer.flush()?;
    Ok(())
}
