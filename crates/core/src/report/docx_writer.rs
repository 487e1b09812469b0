//! Word report writer built on docx-rs.

use docx_rs::{BreakType, Docx, Paragraph, Run, Table, TableCell, TableRow};
use std::fs::File;
use std::path::Path;

use super::error::ReportError;
use super::traits::ArtifactWriter;
use super::types::FileReport;
use crate::transformer::Correction;

const TITLE_SIZE: usize = 40;
const HEADING_SIZE: usize = 28;
const TABLE_HEADERS: [&str; 3] = ["Original", "Suggested", "Reason"];

/// Writes reports as `.docx` documents: a summary paragraph followed by an
/// Original / Suggested / Reason table of corrections.
#[derive(Debug, Clone)]
pub struct DocxReportWriter {
    title: String,
}

impl Default for DocxReportWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl DocxReportWriter {
    pub fn new() -> Self {
        Self {
            title: "Proofreading Report".to_string(),
        }
    }

    /// Sets the title of the aggregate report.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    fn save(path: &Path, docx: Docx) -> Result<u64, ReportError> {
        let file = File::create(path)?;
        docx.build()
            .pack(file)
            .map_err(|e| ReportError::write_failed(path, e))?;
        Ok(std::fs::metadata(path)?.len())
    }
}

fn heading(text: impl Into<String>, size: usize) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text.into()).bold().size(size))
}

fn text(text: impl Into<String>) -> Paragraph {
    Paragraph::new().add_run(Run::new().add_text(text.into()))
}

fn cell(content: &str, bold: bool) -> TableCell {
    let run = Run::new().add_text(content);
    let run = if bold { run.bold() } else { run };
    TableCell::new().add_paragraph(Paragraph::new().add_run(run))
}

fn corrections_table(corrections: &[Correction]) -> Table {
    let mut rows = Vec::with_capacity(corrections.len() + 1);
    rows.push(TableRow::new(
        TABLE_HEADERS.iter().map(|h| cell(h, true)).collect(),
    ));
    rows.extend(corrections.iter().map(|c| {
        TableRow::new(vec![
            cell(&c.original, false),
            cell(&c.suggested, false),
            cell(&c.reason, false),
        ])
    }));
    Table::new(rows)
}

impl ArtifactWriter for DocxReportWriter {
    fn name(&self) -> &str {
        "docx"
    }

    fn extension(&self) -> &str {
        "docx"
    }

    fn write_file_report(&self, path: &Path, report: &FileReport) -> Result<u64, ReportError> {
        let docx = Docx::new()
            .add_paragraph(heading(
                format!("Proofreading: {}", report.file_name),
                TITLE_SIZE,
            ))
            .add_paragraph(text(format!("Summary: {}", report.result.summary)))
            .add_table(corrections_table(&report.result.corrections));

        Self::save(path, docx)
    }

    fn write_aggregate_report(
        &self,
        path: &Path,
        reports: &[FileReport],
    ) -> Result<u64, ReportError> {
        let mut docx = Docx::new().add_paragraph(heading(self.title.clone(), TITLE_SIZE));

        for (i, report) in reports.iter().enumerate() {
            docx = docx.add_paragraph(heading(report.file_name.clone(), HEADING_SIZE));
            if let Some(count) = report.char_count {
                docx = docx.add_paragraph(text(format!("Characters: {}", count)));
            }
            if report.is_failure() {
                docx = docx.add_paragraph(text("Status: error"));
            }
            docx = docx
                .add_paragraph(text(format!("Summary: {}", report.result.summary)))
                .add_table(corrections_table(&report.result.corrections));

            if i + 1 < reports.len() {
                docx = docx
                    .add_paragraph(Paragraph::new().add_run(Run::new().add_break(BreakType::Page)));
            }
        }

        Self::save(path, docx)
    }
}
