//! The caller-facing job service.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::Config;
use crate::extractor::{CompositeExtractor, Extractor};
use crate::job::{ArtifactRef, InMemoryJobRegistry, JobRecord, JobRegistry, TaskId, TaskStatus};
use crate::metrics;
use crate::processor::{
    sanitize_file_name, DispatchError, Dispatcher, JobCleaner, JobWorkspace, ProcessingPipeline,
    TaskInput,
};
use crate::report::{ArtifactWriter, DocxReportWriter};
use crate::transformer::{LlmTransformer, RolesConfig, Transformer, UnavailableTransformer};

use super::error::ServiceError;
use super::types::{RolesInfo, ServiceStatus, UploadedFile};

/// Submission, polling, download and deletion of proofreading jobs.
pub struct JobService {
    config: Config,
    registry: Arc<dyn JobRegistry>,
    transformer: Arc<dyn Transformer>,
    dispatcher: Dispatcher,
    cleaner: JobCleaner,
    work_dir: PathBuf,
}

impl JobService {
    /// Wires the service from explicit collaborators.
    pub fn new(
        config: Config,
        registry: Arc<dyn JobRegistry>,
        extractor: Arc<dyn Extractor>,
        transformer: Arc<dyn Transformer>,
        writer: Arc<dyn ArtifactWriter>,
    ) -> Self {
        let work_dir = config.processor.work_dir.clone();
        let pipeline = Arc::new(ProcessingPipeline::new(
            Arc::clone(&registry),
            extractor,
            Arc::clone(&transformer),
            writer,
            config.roles.clone(),
            &work_dir,
        ));

        Self {
            dispatcher: Dispatcher::new(pipeline, config.processor.max_concurrent_jobs),
            cleaner: JobCleaner::new(Arc::clone(&registry), &work_dir),
            config,
            registry,
            transformer,
            work_dir,
        }
    }

    /// Wires the production collaborators.
    ///
    /// Missing LLM credentials do not prevent startup: submissions are
    /// rejected as unavailable until the service is restarted with a key.
    pub fn from_config(config: Config) -> Self {
        let transformer: Arc<dyn Transformer> = match LlmTransformer::from_config(&config.llm) {
            Ok(transformer) => Arc::new(transformer),
            Err(e) => {
                warn!(error = %e, "Proofreading backend unavailable");
                Arc::new(UnavailableTransformer::new(e.to_string()))
            }
        };

        Self::new(
            config,
            Arc::new(InMemoryJobRegistry::new()),
            Arc::new(CompositeExtractor::default()),
            transformer,
            Arc::new(DocxReportWriter::new()),
        )
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Arc<dyn JobRegistry> {
        &self.registry
    }

    fn roles_config(&self) -> &RolesConfig {
        &self.config.roles
    }

    /// Creates a job for the accepted files and schedules it.
    ///
    /// Files whose extension is not allowed are skipped. The returned record
    /// is `queued`, or `failed` if the job could not be scheduled.
    pub async fn submit(
        &self,
        files: Vec<UploadedFile>,
        role: Option<&str>,
    ) -> Result<JobRecord, ServiceError> {
        let role = self
            .roles_config()
            .resolve(role)
            .ok_or_else(|| ServiceError::InvalidRole {
                role: role.unwrap_or_default().to_string(),
            })?;

        if let Some(reason) = self.transformer.unavailable_reason() {
            return Err(ServiceError::Unavailable {
                reason: reason.to_string(),
            });
        }

        let total = files.len();
        let accepted: Vec<UploadedFile> = files
            .into_iter()
            .filter(|f| {
                let ok = self.config.uploads.accepts(&f.name);
                if !ok {
                    warn!(name = %f.name, "Skipping file with unsupported extension");
                }
                ok
            })
            .collect();

        if accepted.is_empty() {
            return Err(ServiceError::NoAcceptedFiles {
                allowed: self.config.uploads.allowed_extensions.join(", "),
            });
        }

        let names = accepted
            .iter()
            .map(|f| sanitize_file_name(&f.name))
            .collect();
        let job = self.registry.create(names, role.name.clone())?;
        let job_id = job.id().to_string();

        let inputs = match self.store_uploads(&job, accepted).await {
            Ok(inputs) => inputs,
            Err(e) => {
                warn!(job_id = %job_id, error = %e, "Failed to store uploads");
                self.discard(&job_id).await;
                return Err(e);
            }
        };

        metrics::JOBS_SUBMITTED.inc();
        info!(
            job_id = %job_id,
            files = inputs.len(),
            skipped = total - inputs.len(),
            role = %role.name,
            "Job submitted"
        );

        match self.dispatcher.schedule(&job_id, inputs) {
            Ok(()) => {}
            Err(DispatchError::JobNotFound { .. }) => {
                // Deleted while its uploads were being stored.
                info!(job_id = %job_id, "Job removed before it was scheduled");
                self.discard(&job_id).await;
                return Err(ServiceError::job_not_found(&job_id));
            }
            Err(e) => warn!(job_id = %job_id, error = %e, "Job could not be scheduled"),
        }

        self.poll(&job_id)
    }

    /// Rolls back a submission: drops the registry entry if it is still
    /// there and deletes whatever was written for the job.
    async fn discard(&self, job_id: &str) {
        if let Err(e) = self.cleaner.cleanup(job_id).await {
            warn!(job_id = %job_id, error = %e, "Failed to clean up job");
        }
        if let Err(e) = self.cleaner.remove_files(job_id).await {
            warn!(job_id = %job_id, error = %e, "Failed to remove job files");
        }
    }

    async fn store_uploads(
        &self,
        job: &JobRecord,
        files: Vec<UploadedFile>,
    ) -> Result<Vec<TaskInput>, ServiceError> {
        let workspace = JobWorkspace::new(&self.work_dir, job.id())
            .ok_or_else(|| ServiceError::storage(format!("invalid job id {}", job.id())))?;
        workspace.create().await.map_err(ServiceError::storage)?;

        let mut inputs = Vec::with_capacity(files.len());
        for (task, file) in job.tasks().iter().zip(files) {
            let path = workspace.upload_path(task.id(), task.name());
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(ServiceError::storage)?;
            }
            tokio::fs::write(&path, &file.bytes)
                .await
                .map_err(ServiceError::storage)?;

            inputs.push(TaskInput {
                task_id: task.id(),
                name: task.name().to_string(),
                path,
            });
        }
        Ok(inputs)
    }

    /// Latest snapshot of the job.
    pub fn poll(&self, job_id: &str) -> Result<JobRecord, ServiceError> {
        self.registry
            .get(job_id)
            .ok_or_else(|| ServiceError::job_not_found(job_id))
    }

    /// The job's archive, once it is finished.
    pub fn archive(&self, job_id: &str) -> Result<ArtifactRef, ServiceError> {
        let job = self.poll(job_id)?;
        if !job.status().is_terminal() {
            return Err(ServiceError::NotReady {
                job_id: job_id.to_string(),
                status: job.status(),
            });
        }

        job.archive()
            .cloned()
            .ok_or_else(|| ServiceError::ArtifactUnavailable {
                reason: job
                    .last_error()
                    .unwrap_or("job finished without an archive")
                    .to_string(),
            })
    }

    /// The artifact of one task. Only `complete` tasks have one.
    pub fn task_artifact(&self, job_id: &str, task_id: TaskId) -> Result<ArtifactRef, ServiceError> {
        let job = self.poll(job_id)?;
        let task = job.task(task_id).ok_or_else(|| ServiceError::TaskNotFound {
            job_id: job_id.to_string(),
            task_id,
        })?;

        match task.status() {
            TaskStatus::Complete => task.artifact().cloned().ok_or_else(|| {
                ServiceError::ArtifactUnavailable {
                    reason: format!("task {} has no artifact", task_id),
                }
            }),
            TaskStatus::Error => Err(ServiceError::ArtifactUnavailable {
                reason: task.error().unwrap_or("task failed").to_string(),
            }),
            status => Err(ServiceError::TaskNotReady { task_id, status }),
        }
    }

    /// Removes the job and its files. Returns whether the job existed.
    pub async fn delete(&self, job_id: &str) -> Result<bool, ServiceError> {
        self.cleaner
            .cleanup(job_id)
            .await
            .map_err(ServiceError::storage)
    }

    /// All jobs, oldest first.
    pub fn list(&self) -> Vec<JobRecord> {
        self.registry.list()
    }

    pub fn roles(&self) -> RolesInfo {
        let roles = self.roles_config();
        RolesInfo {
            default: roles.default.clone(),
            available: roles.names().into_iter().map(String::from).collect(),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            jobs: self.registry.len(),
            transformer: self.transformer.name().to_string(),
            unavailable_reason: self.transformer.unavailable_reason().map(String::from),
            dispatcher: self.dispatcher.status(),
        }
    }

    /// Stops accepting new jobs.
    pub fn shutdown(&self) {
        self.dispatcher.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::{JobError, JobStatus};
    use crate::testing::{fixtures, MockExtractor, MockTransformer};
    use tempfile::TempDir;

    fn service(dir: &TempDir) -> (JobService, Arc<MockTransformer>) {
        let mut config = Config::default();
        config.processor.work_dir = dir.path().to_path_buf();
        let transformer = Arc::new(MockTransformer::new());
        let service = JobService::new(
            config,
            Arc::new(InMemoryJobRegistry::new()),
            Arc::new(MockExtractor::new()),
            transformer.clone(),
            Arc::new(DocxReportWriter::new()),
        );
        (service, transformer)
    }

    fn docx(name: &str) -> UploadedFile {
        UploadedFile::new(name, fixtures::docx_bytes(&[name]))
    }

    #[tokio::test]
    async fn test_submit_skips_unsupported_files() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir);

        let job = service
            .submit(
                vec![docx("a.docx"), UploadedFile::new("notes.pdf", "x"), docx("B.DOCX")],
                None,
            )
            .await
            .unwrap();

        assert_eq!(job.tasks().len(), 2);
        assert_eq!(job.tasks()[0].name(), "a.docx");
        assert_eq!(job.tasks()[1].name(), "B.DOCX");
        assert_eq!(job.role(), "academic");
        assert!(dir.path().join(job.id()).join("uploads/1/a.docx").exists());

        let job = fixtures::wait_for_terminal(service.registry().as_ref(), job.id()).await;
        assert_eq!(job.status(), JobStatus::Complete);
    }

    #[tokio::test]
    async fn test_submit_rejects_before_creating_job() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir);

        let err = service
            .submit(vec![UploadedFile::new("notes.pdf", "x")], None)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NoAcceptedFiles { .. }));

        let err = service
            .submit(vec![docx("a.docx")], Some("pirate"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole { ref role } if role == "pirate"));

        assert!(service.list().is_empty());
    }

    #[tokio::test]
    async fn test_submit_unavailable_without_backend() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.processor.work_dir = dir.path().to_path_buf();
        let service = JobService::new(
            config,
            Arc::new(InMemoryJobRegistry::new()),
            Arc::new(MockExtractor::new()),
            Arc::new(UnavailableTransformer::new("LLM API key not configured")),
            Arc::new(DocxReportWriter::new()),
        );

        let err = service.submit(vec![docx("a.docx")], None).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unavailable { .. }));
        assert!(service.list().is_empty());
        assert_eq!(
            service.status().unavailable_reason.as_deref(),
            Some("LLM API key not configured")
        );
    }

    #[tokio::test]
    async fn test_archive_and_artifact_readiness() {
        let dir = TempDir::new().unwrap();
        let (service, transformer) = service(&dir);
        transformer
            .set_delay(std::time::Duration::from_millis(100))
            .await;

        let job = service.submit(vec![docx("a.docx")], None).await.unwrap();
        assert!(matches!(
            service.archive(job.id()).unwrap_err(),
            ServiceError::NotReady { .. }
        ));
        assert!(matches!(
            service.task_artifact(job.id(), 1).unwrap_err(),
            ServiceError::TaskNotReady { .. }
        ));

        fixtures::wait_for_terminal(service.registry().as_ref(), job.id()).await;
        let archive = service.archive(job.id()).unwrap();
        assert!(archive.path.exists());
        let artifact = service.task_artifact(job.id(), 1).unwrap();
        assert_eq!(artifact.file_name, "01-a_PROOFREAD.docx");

        assert!(matches!(
            service.task_artifact(job.id(), 9).unwrap_err(),
            ServiceError::TaskNotFound { task_id: 9, .. }
        ));
    }

    #[tokio::test]
    async fn test_failed_task_artifact_unavailable() {
        let dir = TempDir::new().unwrap();
        let (service, transformer) = service(&dir);
        transformer
            .set_next_error(crate::transformer::TransformError::malformed("not JSON"))
            .await;

        let job = service.submit(vec![docx("a.docx")], None).await.unwrap();
        let job = fixtures::wait_for_terminal(service.registry().as_ref(), job.id()).await;
        assert_eq!(job.status(), JobStatus::Failed);

        assert!(matches!(
            service.task_artifact(job.id(), 1).unwrap_err(),
            ServiceError::ArtifactUnavailable { .. }
        ));
        // Failed jobs still get an archive with the fallback report.
        assert!(service.archive(job.id()).is_ok());
    }

    #[tokio::test]
    async fn test_delete_and_unknown_ids() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir);

        let job = service.submit(vec![docx("a.docx")], None).await.unwrap();
        fixtures::wait_for_terminal(service.registry().as_ref(), job.id()).await;

        assert!(service.delete(job.id()).await.unwrap());
        assert!(!service.delete(job.id()).await.unwrap());
        assert!(matches!(
            service.poll(job.id()).unwrap_err(),
            ServiceError::JobNotFound { .. }
        ));
        assert!(!dir.path().join(job.id()).exists());
    }

    #[test]
    fn test_roles() {
        let dir = TempDir::new().unwrap();
        let (service, _) = service(&dir);
        let roles = service.roles();
        assert_eq!(roles.default, "academic");
        assert_eq!(
            roles.available,
            vec!["academic", "business", "creative", "legal", "mentor"]
        );
    }

    /// Registry whose jobs disappear as soon as they are created, as if a
    /// delete request landed while the uploads were being stored.
    #[derive(Default)]
    struct VanishingRegistry(InMemoryJobRegistry);

    impl JobRegistry for VanishingRegistry {
        fn create(&self, task_names: Vec<String>, role: String) -> Result<JobRecord, JobError> {
            let job = self.0.create(task_names, role)?;
            self.0.remove(job.id());
            Ok(job)
        }

        fn get(&self, job_id: &str) -> Option<JobRecord> {
            self.0.get(job_id)
        }

        fn update_job(
            &self,
            job_id: &str,
            updater: &mut dyn FnMut(&mut JobRecord) -> Result<(), JobError>,
        ) -> Result<(), JobError> {
            self.0.update_job(job_id, updater)
        }

        fn remove(&self, job_id: &str) -> bool {
            self.0.remove(job_id)
        }

        fn list(&self) -> Vec<JobRecord> {
            self.0.list()
        }

        fn len(&self) -> usize {
            self.0.len()
        }
    }

    #[tokio::test]
    async fn test_submit_of_job_deleted_during_upload() {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.processor.work_dir = dir.path().to_path_buf();
        let transformer = Arc::new(MockTransformer::new());
        let service = JobService::new(
            config,
            Arc::new(VanishingRegistry::default()),
            Arc::new(MockExtractor::new()),
            transformer.clone(),
            Arc::new(DocxReportWriter::new()),
        );

        let err = service.submit(vec![docx("a.docx")], None).await.unwrap_err();

        assert!(matches!(err, ServiceError::JobNotFound { .. }));
        assert!(service.list().is_empty());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
        assert_eq!(transformer.call_count().await, 0);
    }
}
