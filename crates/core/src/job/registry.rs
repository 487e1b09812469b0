//! Job registry trait and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use uuid::Uuid;

use super::error::JobError;
use super::types::{JobRecord, TaskId, TaskState};

/// Attempts made to find an unused job id before giving up.
pub const MAX_ID_ATTEMPTS: u32 = 8;

/// Process-wide map from job id to job record.
///
/// Every mutation of a job runs under that job's own lock, so readers never
/// observe a half-applied update and different jobs never contend.
pub trait JobRegistry: Send + Sync {
    /// Allocates a fresh id and stores a queued job with one queued task per name.
    fn create(&self, task_names: Vec<String>, role: String) -> Result<JobRecord, JobError>;

    /// Returns a snapshot of the job, if it exists.
    fn get(&self, job_id: &str) -> Option<JobRecord>;

    /// Runs `updater` on the job under its lock.
    ///
    /// Fails with `NotFound` if the job was never created or has been removed,
    /// in which case the updater is not called.
    fn update_job(
        &self,
        job_id: &str,
        updater: &mut dyn FnMut(&mut JobRecord) -> Result<(), JobError>,
    ) -> Result<(), JobError>;

    /// Removes the job. Returns whether it was present.
    fn remove(&self, job_id: &str) -> bool;

    /// Snapshots of every job, oldest first.
    fn list(&self) -> Vec<JobRecord>;

    /// Number of jobs currently held.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `updater` on a single task of the job under the job's lock.
    fn update_task(
        &self,
        job_id: &str,
        task_id: TaskId,
        updater: &mut dyn FnMut(&mut TaskState) -> Result<(), JobError>,
    ) -> Result<(), JobError> {
        self.update_job(job_id, &mut |job| {
            let job_id = job.id().to_string();
            let task = job
                .task_mut(task_id)
                .ok_or(JobError::TaskNotFound { job_id, task_id })?;
            updater(task)
        })
    }
}

struct JobSlot {
    record: JobRecord,
    /// Set under the slot lock on removal. A worker still holding the slot
    /// must treat the job as gone.
    removed: bool,
}

type SharedSlot = Arc<Mutex<JobSlot>>;

/// Volatile registry backed by a hash map with one mutex per job.
#[derive(Default)]
pub struct InMemoryJobRegistry {
    jobs: RwLock<HashMap<String, SharedSlot>>,
}

impl InMemoryJobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, job_id: &str) -> Option<SharedSlot> {
        self.jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(job_id)
            .cloned()
    }

    fn insert_with_ids<F>(
        &self,
        task_names: Vec<String>,
        role: String,
        mut next_id: F,
    ) -> Result<JobRecord, JobError>
    where
        F: FnMut() -> String,
    {
        let mut jobs = self.jobs.write().unwrap_or_else(PoisonError::into_inner);

        for _ in 0..MAX_ID_ATTEMPTS {
            let id = next_id();
            if jobs.contains_key(&id) {
                continue;
            }

            let record = JobRecord::new(id.clone(), task_names, role);
            let snapshot = record.clone();
            jobs.insert(
                id,
                Arc::new(Mutex::new(JobSlot {
                    record,
                    removed: false,
                })),
            );
            return Ok(snapshot);
        }

        Err(JobError::IdExhausted {
            attempts: MAX_ID_ATTEMPTS,
        })
    }
}

impl JobRegistry for InMemoryJobRegistry {
    fn create(&self, task_names: Vec<String>, role: String) -> Result<JobRecord, JobError> {
        self.insert_with_ids(task_names, role, || Uuid::new_v4().to_string())
    }

    fn get(&self, job_id: &str) -> Option<JobRecord> {
        let slot = self.slot(job_id)?;
        let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.removed {
            return None;
        }
        Some(guard.record.clone())
    }

    fn update_job(
        &self,
        job_id: &str,
        updater: &mut dyn FnMut(&mut JobRecord) -> Result<(), JobError>,
    ) -> Result<(), JobError> {
        let slot = self.slot(job_id).ok_or_else(|| JobError::not_found(job_id))?;
        let mut guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if guard.removed {
            return Err(JobError::not_found(job_id));
        }

        updater(&mut guard.record)?;
        guard.record.touch();
        Ok(())
    }

    fn remove(&self, job_id: &str) -> bool {
        let slot = self
            .jobs
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(job_id);

        match slot {
            Some(slot) => {
                slot.lock().unwrap_or_else(PoisonError::into_inner).removed = true;
                true
            }
            None => false,
        }
    }

    fn list(&self) -> Vec<JobRecord> {
        let slots: Vec<SharedSlot> = self
            .jobs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();

        let mut records: Vec<JobRecord> = slots
            .iter()
            .filter_map(|slot| {
                let guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
                (!guard.removed).then(|| guard.record.clone())
            })
            .collect();
        records.sort_by_key(|r| r.created_at());
        records
    }

    fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}
