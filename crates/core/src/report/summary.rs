//! Machine-readable job summaries packaged next to the documents.

use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::error::ReportError;
use super::types::FileReport;

/// Every file's full result, as pretty-printed JSON.
pub const RESULTS_JSON_NAME: &str = "results.json";

/// One row per file: `filename,status,correction_count,summary`.
pub const SUMMARY_CSV_NAME: &str = "summary.csv";

#[derive(Serialize)]
struct SummaryRow<'a> {
    filename: &'a str,
    status: &'a str,
    correction_count: usize,
    summary: &'a str,
}

impl<'a> From<&'a FileReport> for SummaryRow<'a> {
    fn from(report: &'a FileReport) -> Self {
        Self {
            filename: &report.file_name,
            status: if report.is_failure() { "error" } else { "proofread" },
            correction_count: report.result.corrections.len(),
            summary: &report.result.summary,
        }
    }
}

/// Writes `reports` as a JSON array. Returns the number of bytes written.
pub fn write_results_json(path: &Path, reports: &[FileReport]) -> Result<u64, ReportError> {
    let mut out = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut out, reports)
        .map_err(|e| ReportError::write_failed(path, e))?;
    out.flush()?;
    Ok(std::fs::metadata(path)?.len())
}

/// Writes the per-file summary table. Returns the number of bytes written.
pub fn write_summary_csv(path: &Path, reports: &[FileReport]) -> Result<u64, ReportError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| ReportError::write_failed(path, e))?;

    if reports.is_empty() {
        writer
            .write_record(["filename", "status", "correction_count", "summary"])
            .map_err(|e| ReportError::write_failed(path, e))?;
    }
    for report in reports {
        writer
            .serialize(SummaryRow::from(report))
            .map_err(|e| ReportError::write_failed(path, e))?;
    }

    writer.flush()?;
    Ok(std::fs::metadata(path)?.len())
}
