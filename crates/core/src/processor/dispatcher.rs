//! Background job dispatch.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};

use crate::job::{JobRegistry, JobStatus};

use super::error::DispatchError;
use super::pipeline::ProcessingPipeline;
use super::types::{DispatcherStatus, PipelineOutcome, TaskInput};

/// Statistics for the worker pool.
#[derive(Debug, Default)]
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_completed: AtomicU64,
    total_failed: AtomicU64,
    total_aborted: AtomicU64,
}

impl PoolStats {
    fn record(&self, outcome: &Result<PipelineOutcome, super::error::PipelineError>) {
        let counter = match outcome {
            Ok(PipelineOutcome::Finished(JobStatus::Complete)) => &self.total_completed,
            Ok(PipelineOutcome::Aborted) => &self.total_aborted,
            _ => &self.total_failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Runs each scheduled job's pipeline on its own tokio task.
///
/// `schedule` never waits for processing. At most `max_concurrent` jobs run
/// at once; the rest wait for a slot in submission order.
pub struct Dispatcher {
    pipeline: Arc<ProcessingPipeline>,
    semaphore: Arc<Semaphore>,
    max_concurrent: usize,
    stats: Arc<PoolStats>,
    scheduled: Arc<Mutex<HashSet<String>>>,
    running: AtomicBool,
}

impl Dispatcher {
    pub fn new(pipeline: Arc<ProcessingPipeline>, max_concurrent: usize) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            pipeline,
            semaphore: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            stats: Arc::new(PoolStats::default()),
            scheduled: Arc::new(Mutex::new(HashSet::new())),
            running: AtomicBool::new(true),
        }
    }

    fn registry(&self) -> &Arc<dyn JobRegistry> {
        self.pipeline.registry()
    }

    /// Hands the job to a background task and returns immediately.
    ///
    /// Only a `queued` job that has not been scheduled before is accepted.
    /// If the job cannot be started (no runtime, dispatcher shut down) it is
    /// marked `failed` before the error is returned.
    pub fn schedule(&self, job_id: &str, inputs: Vec<TaskInput>) -> Result<(), DispatchError> {
        let job = self
            .registry()
            .get(job_id)
            .ok_or_else(|| DispatchError::JobNotFound {
                job_id: job_id.to_string(),
            })?;

        if job.status() != JobStatus::Queued {
            return Err(DispatchError::AlreadyScheduled {
                job_id: job_id.to_string(),
            });
        }

        if !self.running.load(Ordering::SeqCst) {
            return Err(self.reject(job_id, DispatchError::ShutDown));
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => return Err(self.reject(job_id, DispatchError::NoRuntime)),
        };

        {
            let mut scheduled = self
                .scheduled
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !scheduled.insert(job_id.to_string()) {
                return Err(DispatchError::AlreadyScheduled {
                    job_id: job_id.to_string(),
                });
            }
        }

        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        debug!(job_id = %job_id, files = inputs.len(), "Job scheduled");

        let pipeline = Arc::clone(&self.pipeline);
        let semaphore = Arc::clone(&self.semaphore);
        let stats = Arc::clone(&self.stats);
        let scheduled = Arc::clone(&self.scheduled);
        let job_id = job_id.to_string();

        handle.spawn(async move {
            let permit = semaphore.acquire_owned().await;
            stats.queued.fetch_sub(1, Ordering::Relaxed);

            match permit {
                Ok(_permit) => {
                    stats.active.fetch_add(1, Ordering::Relaxed);
                    let outcome = pipeline.run(&job_id, inputs).await;
                    stats.active.fetch_sub(1, Ordering::Relaxed);

                    if let Err(e) = &outcome {
                        error!(job_id = %job_id, error = %e, "Pipeline error");
                    }
                    stats.record(&outcome);
                }
                Err(_) => {
                    warn!(job_id = %job_id, "Dispatcher shut down before job started");
                    mark_failed(pipeline.registry().as_ref(), &job_id, &DispatchError::ShutDown);
                    stats.total_failed.fetch_add(1, Ordering::Relaxed);
                }
            }

            scheduled
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&job_id);
        });

        Ok(())
    }

    fn reject(&self, job_id: &str, err: DispatchError) -> DispatchError {
        error!(job_id = %job_id, error = %err, "Failed to schedule job");
        mark_failed(self.registry().as_ref(), job_id, &err);
        self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
        err
    }

    /// Current pool counters.
    pub fn status(&self) -> DispatcherStatus {
        DispatcherStatus {
            running: self.is_running(),
            active_jobs: self.stats.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.stats.queued.load(Ordering::Relaxed) as usize,
            max_concurrent: self.max_concurrent,
            total_completed: self.stats.total_completed.load(Ordering::Relaxed),
            total_failed: self.stats.total_failed.load(Ordering::Relaxed),
            total_aborted: self.stats.total_aborted.load(Ordering::Relaxed),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stops accepting work. Jobs already running finish; jobs still waiting
    /// for a slot are marked `failed`.
    pub fn shutdown(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.semaphore.close();
            info!("Dispatcher shut down");
        }
    }
}

fn mark_failed(registry: &dyn JobRegistry, job_id: &str, err: &DispatchError) {
    let message = format!("Scheduling failed: {}", err);
    // The job may already be gone; nothing to record then.
    let _ = registry.update_job(job_id, &mut |job| job.fail(message.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::InMemoryJobRegistry;
    use crate::report::DocxReportWriter;
    use crate::testing::{fixtures, MockExtractor, MockTransformer};
    use crate::transformer::RolesConfig;
    use std::time::Duration;
    use tempfile::TempDir;

    struct Harness {
        dir: TempDir,
        registry: Arc<InMemoryJobRegistry>,
        transformer: Arc<MockTransformer>,
        dispatcher: Dispatcher,
    }

    fn harness(max_concurrent: usize) -> Harness {
        let dir = TempDir::new().unwrap();
        let registry = Arc::new(InMemoryJobRegistry::new());
        let transformer = Arc::new(MockTransformer::new());
        let pipeline = Arc::new(ProcessingPipeline::new(
            registry.clone(),
            Arc::new(MockExtractor::new()),
            transformer.clone(),
            Arc::new(DocxReportWriter::new()),
            RolesConfig::default(),
            dir.path(),
        ));
        Harness {
            dir,
            registry,
            transformer,
            dispatcher: Dispatcher::new(pipeline, max_concurrent),
        }
    }

    async fn queued_job(h: &Harness, names: &[&str]) -> (String, Vec<TaskInput>) {
        let job = h
            .registry
            .create(names.iter().map(|n| n.to_string()).collect(), "academic".into())
            .unwrap();
        let ws = crate::processor::JobWorkspace::new(h.dir.path(), job.id()).unwrap();
        ws.create().await.unwrap();
        let inputs = fixtures::store_inputs(&ws, &job).await;
        (job.id().to_string(), inputs)
    }

    #[tokio::test]
    async fn test_schedule_returns_before_processing() {
        let h = harness(2);
        h.transformer.set_delay(Duration::from_millis(200)).await;
        let (job_id, inputs) = queued_job(&h, &["a.docx"]).await;

        h.dispatcher.schedule(&job_id, inputs).unwrap();
        assert!(!h.registry.get(&job_id).unwrap().status().is_terminal());

        let job = fixtures::wait_for_terminal(h.registry.as_ref(), &job_id).await;
        assert_eq!(job.status(), JobStatus::Complete);
        assert_eq!(h.dispatcher.status().total_completed, 1);
    }

    #[tokio::test]
    async fn test_duplicate_schedule_rejected() {
        let h = harness(1);
        h.transformer.set_delay(Duration::from_millis(100)).await;
        let (job_id, inputs) = queued_job(&h, &["a.docx"]).await;

        h.dispatcher.schedule(&job_id, inputs.clone()).unwrap();
        let err = h.dispatcher.schedule(&job_id, inputs.clone()).unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyScheduled { .. }));

        fixtures::wait_for_terminal(h.registry.as_ref(), &job_id).await;
        let err = h.dispatcher.schedule(&job_id, inputs).unwrap_err();
        assert!(matches!(err, DispatchError::AlreadyScheduled { .. }));
        assert_eq!(h.transformer.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_schedule_unknown_job() {
        let h = harness(1);
        let err = h.dispatcher.schedule("missing", vec![]).unwrap_err();
        assert!(matches!(err, DispatchError::JobNotFound { .. }));
    }

    #[test]
    fn test_schedule_without_runtime_fails_job() {
        let h = harness(1);
        let job = h
            .registry
            .create(vec!["a.docx".into()], "academic".into())
            .unwrap();

        let err = h.dispatcher.schedule(job.id(), vec![]).unwrap_err();
        assert!(matches!(err, DispatchError::NoRuntime));

        let job = h.registry.get(job.id()).unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(
            job.last_error(),
            Some("Scheduling failed: No async runtime available")
        );
        assert!(job.archive().is_none());
    }

    #[tokio::test]
    async fn test_schedule_after_shutdown_fails_job() {
        let h = harness(1);
        h.dispatcher.shutdown();
        let (job_id, inputs) = queued_job(&h, &["a.docx"]).await;

        let err = h.dispatcher.schedule(&job_id, inputs).unwrap_err();
        assert!(matches!(err, DispatchError::ShutDown));
        assert_eq!(h.registry.get(&job_id).unwrap().status(), JobStatus::Failed);
        assert!(!h.dispatcher.status().running);
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let h = harness(1);
        h.transformer.set_delay(Duration::from_millis(150)).await;
        let (first, first_inputs) = queued_job(&h, &["a.docx"]).await;
        let (second, second_inputs) = queued_job(&h, &["b.docx"]).await;

        h.dispatcher.schedule(&first, first_inputs).unwrap();
        h.dispatcher.schedule(&second, second_inputs).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let status = h.dispatcher.status();
        assert_eq!(status.max_concurrent, 1);
        assert_eq!(status.active_jobs, 1);
        assert_eq!(status.queued_jobs, 1);

        fixtures::wait_for_terminal(h.registry.as_ref(), &first).await;
        fixtures::wait_for_terminal(h.registry.as_ref(), &second).await;
        let status = h.dispatcher.status();
        assert_eq!(status.active_jobs, 0);
        assert_eq!(status.total_completed, 2);
    }

    #[tokio::test]
    async fn test_shutdown_fails_waiting_jobs() {
        let h = harness(1);
        h.transformer.set_delay(Duration::from_millis(150)).await;
        let (first, first_inputs) = queued_job(&h, &["a.docx"]).await;
        let (second, second_inputs) = queued_job(&h, &["b.docx"]).await;

        h.dispatcher.schedule(&first, first_inputs).unwrap();
        h.dispatcher.schedule(&second, second_inputs).unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        h.dispatcher.shutdown();

        let first = fixtures::wait_for_terminal(h.registry.as_ref(), &first).await;
        let second = fixtures::wait_for_terminal(h.registry.as_ref(), &second).await;
        assert_eq!(first.status(), JobStatus::Complete);
        assert_eq!(second.status(), JobStatus::Failed);
        assert_eq!(
            second.last_error(),
            Some("Scheduling failed: Dispatcher is shut down")
        );
    }
}
