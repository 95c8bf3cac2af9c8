//! Job orchestrator: submission, status reads and cancellation.

use std::sync::Arc;

use tracing::info;
use validator::Validate;

use reclip_models::{Constraints, Job, JobId, MediaSource};
use reclip_store::{mutate_job, JobRepository};

use crate::error::{WorkerError, WorkerResult};
use crate::executor::JobExecutor;
use crate::metrics;

/// Owns the job lifecycle. The only writer of job records.
pub struct JobOrchestrator {
    repo: Arc<dyn JobRepository>,
    executor: Arc<JobExecutor>,
}

impl JobOrchestrator {
    pub fn new(repo: Arc<dyn JobRepository>, executor: Arc<JobExecutor>) -> Self {
        Self { repo, executor }
    }

    /// Validate, persist a queued record, schedule execution and return at once.
    ///
    /// Nothing is written when validation fails.
    pub async fn submit(
        &self,
        owner: &str,
        source: Option<MediaSource>,
        constraints: Option<Constraints>,
    ) -> WorkerResult<Job> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(WorkerError::validation("owner is required"));
        }
        let source = source.ok_or_else(|| WorkerError::validation("source is required"))?;
        source.validate()?;

        let constraints = constraints.unwrap_or_default();
        constraints
            .validate()
            .map_err(|e| WorkerError::validation(e.to_string()))?;

        let job = Job::new(owner, source, constraints);
        self.repo.put(&job).await?;

        // Detached: the handle is dropped, the run reports through the record.
        drop(self.executor.spawn(job.id.clone()));

        metrics::record_job_submitted();
        info!(job_id = %job.id, owner = %job.owner, "Job submitted");
        Ok(job)
    }

    /// Read the persisted record.
    pub async fn get_status(&self, job_id: &JobId) -> WorkerResult<Job> {
        self.repo
            .get(job_id)
            .await?
            .ok_or_else(|| WorkerError::not_found(job_id.as_str()))
    }

    /// Cancel a queued or processing job.
    ///
    /// In-flight oracle calls are not aborted; the run stops at its next checkpoint.
    pub async fn cancel(&self, job_id: &JobId) -> WorkerResult<Job> {
        let job = mutate_job(self.repo.as_ref(), job_id, |j| j.cancel())
            .await
            .map_err(|e| match WorkerError::from(e) {
                // A cancel refused on an already-cancelled record is still a terminal-state refusal.
                WorkerError::Cancelled(_) => {
                    WorkerError::invalid_state("cannot cancel a job that is cancelled")
                }
                other => other,
            })?;

        metrics::record_job_finished("cancelled");
        info!(job_id = %job_id, "Job cancelled");
        Ok(job)
    }

    pub fn executor(&self) -> &JobExecutor {
        &self.executor
    }

    pub fn repository(&self) -> &Arc<dyn JobRepository> {
        &self.repo
    }
}
