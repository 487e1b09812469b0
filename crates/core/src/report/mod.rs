//! Proofreading report artifacts.

mod docx_writer;
mod error;
mod summary;
mod traits;
mod types;

pub use docx_writer::DocxReportWriter;
pub use error::ReportError;
pub use summary::{
    write_results_json, write_summary_csv, RESULTS_JSON_NAME, SUMMARY_CSV_NAME,
};
pub use traits::ArtifactWriter;
pub use types::FileReport;
