//! Archive packaging.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::job::ArtifactRef;
use crate::metrics;
use crate::report::{
    write_results_json, write_summary_csv, ArtifactWriter, FileReport, ReportError,
    RESULTS_JSON_NAME, SUMMARY_CSV_NAME,
};

use super::error::PackagingError;
use super::layout::{JobWorkspace, ARCHIVE_FILE_NAME};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Bundles a job's artifacts into one downloadable zip archive.
///
/// The archive holds every per-file artifact (fallbacks included), one
/// aggregate report, and the `results.json` and `summary.csv` summaries. It is written next to the job's outputs under a
/// temporary name and renamed into place, so packaging again replaces the
/// previous archive.
pub struct ArtifactPackager {
    writer: Arc<dyn ArtifactWriter>,
}

impl ArtifactPackager {
    pub fn new(writer: Arc<dyn ArtifactWriter>) -> Self {
        Self { writer }
    }

    /// Writes the aggregate report, the summaries and the archive. Runs on the
    /// blocking pool.
    pub async fn package(
        &self,
        workspace: &JobWorkspace,
        per_file: Vec<ArtifactRef>,
        reports: Vec<FileReport>,
    ) -> Result<ArtifactRef, PackagingError> {
        let started = Instant::now();
        let writer = Arc::clone(&self.writer);
        let workspace = workspace.clone();

        let result = tokio::task::spawn_blocking(move || {
            Self::package_blocking(writer.as_ref(), &workspace, &per_file, &reports)
        })
        .await
        .map_err(|e| PackagingError::TaskFailed(e.to_string()))
        .and_then(|r| r);

        let label = if result.is_ok() { "success" } else { "failed" };
        metrics::PACKAGING_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        result
    }

    fn package_blocking(
        writer: &dyn ArtifactWriter,
        workspace: &JobWorkspace,
        per_file: &[ArtifactRef],
        reports: &[FileReport],
    ) -> Result<ArtifactRef, PackagingError> {
        let aggregate_name = writer.aggregate_report_name();
        let aggregate_path = workspace.output_path(&aggregate_name);
        let aggregate_size = writer.write_aggregate_report(&aggregate_path, reports)?;

        let aggregate = ArtifactRef {
            file_name: aggregate_name,
            path: aggregate_path,
            size_bytes: aggregate_size,
            sha256: None,
        };
        let results = write_summary(workspace, RESULTS_JSON_NAME, reports, write_results_json)?;
        let summary = write_summary(workspace, SUMMARY_CSV_NAME, reports, write_summary_csv)?;

        let temp_path = workspace.archive_temp_path();
        let archive_path = workspace.archive_path();

        let entries: Vec<&ArtifactRef> = per_file
            .iter()
            .chain([&aggregate, &results, &summary])
            .collect();
        if let Err(e) = write_zip(&temp_path, &entries) {
            let _ = std::fs::remove_file(&temp_path);
            return Err(e);
        }

        std::fs::rename(&temp_path, &archive_path)
            .map_err(|e| PackagingError::io(&archive_path, e))?;

        let (size_bytes, sha256) = hash_file(&archive_path)?;
        debug!(
            archive = %archive_path.display(),
            entries = entries.len(),
            size_bytes,
            "Packaged archive"
        );

        Ok(ArtifactRef {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            path: archive_path,
            size_bytes,
            sha256: Some(sha256),
        })
    }
}

fn write_summary(
    workspace: &JobWorkspace,
    name: &str,
    reports: &[FileReport],
    write: fn(&Path, &[FileReport]) -> Result<u64, ReportError>,
) -> Result<ArtifactRef, PackagingError> {
    let path = workspace.output_path(name);
    let size_bytes = write(&path, reports)?;
    Ok(ArtifactRef {
        file_name: name.to_string(),
        path,
        size_bytes,
        sha256: None,
    })
}

fn write_zip(path: &Path, entries: &[&ArtifactRef]) -> Result<(), PackagingError> {
    let file = File::create(path).map_err(|e| PackagingError::io(path, e))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        zip.start_file(entry.file_name.as_str(), options)
            .map_err(|e| PackagingError::Zip(e.to_string()))?;
        let mut source =
            File::open(&entry.path).map_err(|e| PackagingError::io(&entry.path, e))?;
        std::io::copy(&mut source, &mut zip).map_err(|e| PackagingError::io(&entry.path, e))?;
    }

    zip.finish()
        .map_err(|e| PackagingError::Zip(e.to_string()))?;
    Ok(())
}

fn hash_file(path: &Path) -> Result<(u64, String), PackagingError> {
    let file = File::open(path).map_err(|e| PackagingError::io(path, e))?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_BUFFER_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader
            .read(&mut buffer)
            .map_err(|e| PackagingError::io(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buffer[..n]);
        total += n as u64;
    }

    Ok((total, format!("{:x}", hasher.finalize())))
}
