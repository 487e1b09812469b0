//! Per-job processing pipeline.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::extractor::Extractor;
use crate::job::{ArtifactRef, JobError, JobRegistry, JobStatus, TaskId};
use crate::metrics;
use crate::report::{ArtifactWriter, FileReport};
use crate::transformer::{RoleConfig, RolesConfig, Transformer};

use super::error::{FileError, PackagingError, PipelineError};
use super::layout::JobWorkspace;
use super::packager::ArtifactPackager;
use super::types::{PipelineOutcome, TaskInput};

/// Runs one job: every file in upload order, then packaging.
///
/// A failing file never stops the job. It gets a fallback report, ends in
/// `error`, and processing continues with the next file. The registry is
/// consulted before every write; once the job has been removed the run
/// stops without touching anything else.
pub struct ProcessingPipeline {
    registry: Arc<dyn JobRegistry>,
    extractor: Arc<dyn Extractor>,
    transformer: Arc<dyn Transformer>,
    writer: Arc<dyn ArtifactWriter>,
    packager: ArtifactPackager,
    roles: RolesConfig,
    work_dir: PathBuf,
}

/// Result of processing one file, before it is recorded.
struct FileOutcome {
    report: FileReport,
    /// Artifact to include in the archive (real or fallback), or why there is none.
    packaged: Result<ArtifactRef, PackagingError>,
    /// `Ok` with the artifact for a complete task, `Err` with the diagnostic otherwise.
    status: Result<ArtifactRef, String>,
}

impl ProcessingPipeline {
    pub fn new(
        registry: Arc<dyn JobRegistry>,
        extractor: Arc<dyn Extractor>,
        transformer: Arc<dyn Transformer>,
        writer: Arc<dyn ArtifactWriter>,
        roles: RolesConfig,
        work_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            packager: ArtifactPackager::new(Arc::clone(&writer)),
            registry,
            extractor,
            transformer,
            writer,
            roles,
            work_dir: work_dir.into(),
        }
    }

    pub fn registry(&self) -> &Arc<dyn JobRegistry> {
        &self.registry
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    /// Processes the job to a terminal status.
    ///
    /// Returns `Aborted` if the job disappears from the registry mid-run.
    pub async fn run(
        &self,
        job_id: &str,
        inputs: Vec<TaskInput>,
    ) -> Result<PipelineOutcome, PipelineError> {
        match self.run_inner(job_id, inputs).await {
            Err(PipelineError::Job(JobError::NotFound { .. })) => {
                info!(job_id = %job_id, "Job removed during processing, stopping");
                metrics::JOBS_FINISHED.with_label_values(&["aborted"]).inc();
                Ok(PipelineOutcome::Aborted)
            }
            other => other,
        }
    }

    async fn run_inner(
        &self,
        job_id: &str,
        inputs: Vec<TaskInput>,
    ) -> Result<PipelineOutcome, PipelineError> {
        let started = Instant::now();

        let mut role_name = String::new();
        self.registry.update_job(job_id, &mut |job| {
            job.start()?;
            role_name = job.role().to_string();
            Ok(())
        })?;

        let Some(role) = self.roles.resolve(Some(&role_name)) else {
            let message = format!("Unknown role: {}", role_name);
            error!(job_id = %job_id, role = %role_name, "Cannot process job with unknown role");
            self.registry.update_job(job_id, &mut |job| {
                let task_ids: Vec<TaskId> = job.tasks().iter().map(|t| t.id()).collect();
                for task_id in task_ids {
                    if let Some(task) = job.task_mut(task_id) {
                        task.start()?;
                        task.fail(message.clone())?;
                    }
                }
                job.fail(message.clone())
            })?;
            return Ok(self.finished(job_id, JobStatus::Failed, started));
        };

        let workspace = JobWorkspace::new(&self.work_dir, job_id)
            .ok_or_else(|| JobError::not_found(job_id))?;

        info!(
            job_id = %job_id,
            files = inputs.len(),
            role = %role.name,
            "Processing job"
        );

        let mut reports = Vec::with_capacity(inputs.len());
        let mut packaged = Vec::with_capacity(inputs.len());
        let mut missing = None;

        for input in &inputs {
            self.registry
                .update_task(job_id, input.task_id, &mut |task| task.start())?;
            debug!(job_id = %job_id, task_id = input.task_id, name = %input.name, "Task processing");

            let task_started = Instant::now();
            let outcome = self.process_file(&workspace, input, &role).await;
            let char_count = outcome.report.char_count;

            match &outcome.status {
                Ok(artifact) => {
                    self.registry.update_task(job_id, input.task_id, &mut |task| {
                        if let Some(count) = char_count {
                            task.record_char_count(count)?;
                        }
                        task.complete(artifact.clone())
                    })?;
                    record_task_metrics("complete", task_started);
                    debug!(job_id = %job_id, task_id = input.task_id, "Task complete");
                }
                Err(message) => {
                    self.mark_task_failed(job_id, input.task_id, char_count, message)?;
                    record_task_metrics("error", task_started);
                }
            }

            reports.push(outcome.report);
            match outcome.packaged {
                Ok(artifact) => packaged.push(artifact),
                Err(e) => {
                    missing.get_or_insert(e);
                }
            }
        }

        // The job may have been removed while the last file was processed.
        if self.registry.get(job_id).is_none() {
            return Err(JobError::not_found(job_id).into());
        }

        // Every file must be in the archive, so a missing report fails packaging.
        let packaged = match missing {
            Some(e) => Err(e),
            None => self.packager.package(&workspace, packaged, reports).await,
        };

        match packaged {
            Ok(archive) => {
                let mut status = JobStatus::Failed;
                self.registry.update_job(job_id, &mut |job| {
                    status = job.finish(archive.clone())?;
                    Ok(())
                })?;
                Ok(self.finished(job_id, status, started))
            }
            Err(e) => {
                let message = format!("Packaging failed: {}", e);
                error!(job_id = %job_id, error = %e, "Packaging failed");
                self.registry
                    .update_job(job_id, &mut |job| job.fail(message.clone()))?;
                Ok(self.finished(job_id, JobStatus::Failed, started))
            }
        }
    }

    /// Extracts, proofreads and writes the report for one file.
    ///
    /// On failure a fallback report is written in place of the real one.
    async fn process_file(
        &self,
        workspace: &JobWorkspace,
        input: &TaskInput,
        role: &RoleConfig,
    ) -> FileOutcome {
        let artifact_name = self.writer.file_report_name(input.task_id, &input.name);
        let artifact_path = workspace.output_path(&artifact_name);
        let mut char_count = None;

        match self
            .proofread_file(input, role, &artifact_name, &artifact_path, &mut char_count)
            .await
        {
            Ok((report, artifact)) => FileOutcome {
                report,
                packaged: Ok(artifact.clone()),
                status: Ok(artifact),
            },
            Err(e) => {
                let message = e.to_string();
                warn!(
                    task_id = input.task_id,
                    name = %input.name,
                    error = %message,
                    "File processing failed, writing fallback report"
                );

                let report = FileReport::failure(&input.name, char_count, &message);
                let packaged = self
                    .write_report(&artifact_name, &artifact_path, report.clone())
                    .await
                    .map_err(|write_err| {
                        error!(
                            task_id = input.task_id,
                            error = %write_err,
                            "Fallback report could not be written"
                        );
                        PackagingError::MissingArtifact {
                            file_name: artifact_name.clone(),
                            reason: write_err.to_string(),
                        }
                    });

                FileOutcome {
                    report,
                    packaged,
                    status: Err(message),
                }
            }
        }
    }

    async fn proofread_file(
        &self,
        input: &TaskInput,
        role: &RoleConfig,
        artifact_name: &str,
        artifact_path: &Path,
        char_count: &mut Option<usize>,
    ) -> Result<(FileReport, ArtifactRef), FileError> {
        let text = self.extractor.extract(&input.path).await?;
        let count = text.chars().count();
        *char_count = Some(count);

        let result = self.transformer.transform(&text, role).await?;
        let report = FileReport::success(&input.name, count, result);
        let artifact = self
            .write_report(artifact_name, artifact_path, report.clone())
            .await?;

        Ok((report, artifact))
    }

    async fn write_report(
        &self,
        artifact_name: &str,
        artifact_path: &Path,
        report: FileReport,
    ) -> Result<ArtifactRef, FileError> {
        let writer = Arc::clone(&self.writer);
        let path = artifact_path.to_path_buf();

        let size_bytes = tokio::task::spawn_blocking(move || writer.write_file_report(&path, &report))
            .await
            .map_err(|e| crate::report::ReportError::TaskFailed(e.to_string()))??;

        Ok(ArtifactRef {
            file_name: artifact_name.to_string(),
            path: artifact_path.to_path_buf(),
            size_bytes,
            sha256: None,
        })
    }

    fn mark_task_failed(
        &self,
        job_id: &str,
        task_id: TaskId,
        char_count: Option<usize>,
        message: &str,
    ) -> Result<(), JobError> {
        self.registry.update_task(job_id, task_id, &mut |task| {
            if let Some(count) = char_count {
                task.record_char_count(count)?;
            }
            task.fail(message)
        })?;
        self.registry.update_job(job_id, &mut |job| {
            job.record_error(message);
            Ok(())
        })
    }

    fn finished(&self, job_id: &str, status: JobStatus, started: Instant) -> PipelineOutcome {
        let elapsed = started.elapsed();
        metrics::JOBS_FINISHED
            .with_label_values(&[status.as_str()])
            .inc();
        metrics::JOB_DURATION
            .with_label_values(&[status.as_str()])
            .observe(elapsed.as_secs_f64());

        info!(
            job_id = %job_id,
            status = %status,
            duration_ms = elapsed.as_millis() as u64,
            "Job finished"
        );
        PipelineOutcome::Finished(status)
    }
}

fn record_task_metrics(result: &str, started: Instant) {
    metrics::TASKS_TOTAL.with_label_values(&[result]).inc();
    metrics::TASK_DURATION
        .with_label_values(&[result])
        .observe(started.elapsed().as_secs_f64());
}
