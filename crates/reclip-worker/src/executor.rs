//! Job executor.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use reclip_models::JobId;
use reclip_store::{mutate_job, StoreError};

use crate::config::WorkerConfig;
use crate::metrics;
use crate::processor::{process_job, ProcessingContext};

/// Runs jobs as detached tokio tasks, at most `max_concurrent_jobs` at a time.
///
/// Whatever happens inside a run (error or panic) ends up as a job-state
/// write, never as an unobserved task failure.
pub struct JobExecutor {
    config: WorkerConfig,
    ctx: Arc<ProcessingContext>,
    job_semaphore: Arc<Semaphore>,
    in_flight: Arc<AtomicUsize>,
    shutting_down: Arc<AtomicBool>,
}

impl JobExecutor {
    /// Create a new job executor.
    pub fn new(config: WorkerConfig, ctx: ProcessingContext) -> Self {
        let job_semaphore = Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1)));

        Self {
            config,
            ctx: Arc::new(ctx),
            job_semaphore,
            in_flight: Arc::new(AtomicUsize::new(0)),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Schedule a queued job. Returns immediately; dropping the handle detaches the run.
    pub fn spawn(&self, job_id: JobId) -> JoinHandle<()> {
        let ctx = Arc::clone(&self.ctx);
        let semaphore = Arc::clone(&self.job_semaphore);
        let in_flight = Arc::clone(&self.in_flight);
        let shutting_down = Arc::clone(&self.shutting_down);

        metrics::set_jobs_in_flight(in_flight.fetch_add(1, Ordering::SeqCst) + 1);

        tokio::spawn(async move {
            if shutting_down.load(Ordering::SeqCst) {
                Self::mark_failed(&ctx, &job_id, "Worker is shutting down").await;
            } else {
                match semaphore.acquire_owned().await {
                    Ok(permit) => {
                        let _permit = permit;
                        Self::execute_job(ctx, job_id).await;
                    }
                    Err(_) => {
                        Self::mark_failed(&ctx, &job_id, "Executor closed").await;
                    }
                }
            }

            metrics::set_jobs_in_flight(in_flight.fetch_sub(1, Ordering::SeqCst) - 1);
        })
    }

    /// Execute a single job, converting every failure into a `failed` record.
    async fn execute_job(ctx: Arc<ProcessingContext>, job_id: JobId) {
        info!(job_id = %job_id, "Executing job");

        // Inner task so a panic surfaces as a JoinError instead of unwinding here.
        let run = {
            let ctx = Arc::clone(&ctx);
            let job_id = job_id.clone();
            tokio::spawn(async move { process_job(&ctx, &job_id).await })
        };

        match run.await {
            Ok(Ok(())) => {
                info!(job_id = %job_id, "Job completed successfully");
                metrics::record_job_finished("completed");
            }
            Ok(Err(e)) if e.is_cancelled() => {
                info!(job_id = %job_id, "Job run stopped after cancellation");
            }
            Ok(Err(e)) => {
                error!(job_id = %job_id, "Job failed: {}", e);
                Self::mark_failed(&ctx, &job_id, &e.to_string()).await;
            }
            Err(join_error) => {
                let reason = format!("Internal error: {}", panic_message(join_error));
                error!(job_id = %job_id, "Job panicked: {}", reason);
                Self::mark_failed(&ctx, &job_id, &reason).await;
            }
        }
    }

    /// Write a `failed` record unless the job already reached a terminal state.
    async fn mark_failed(ctx: &ProcessingContext, job_id: &JobId, reason: &str) {
        match mutate_job(ctx.repo.as_ref(), job_id, |j| j.fail(reason)).await {
            Ok(_) => metrics::record_job_finished("failed"),
            Err(StoreError::Rejected(e)) => {
                debug!(job_id = %job_id, "Not marking job failed: {}", e);
            }
            Err(e) => {
                error!(job_id = %job_id, "Failed to record job failure: {}", e);
            }
        }
    }

    /// Jobs spawned but not yet finished.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Stop accepting work and wait for in-flight jobs, bounded by the
    /// configured shutdown timeout.
    pub async fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);

        info!("Waiting for {} in-flight jobs to complete...", self.in_flight());
        if tokio::time::timeout(self.config.shutdown_timeout, self.wait_for_jobs())
            .await
            .is_err()
        {
            warn!(
                "Shutdown timeout elapsed with {} jobs still running",
                self.in_flight()
            );
        }
        info!("Job executor stopped");
    }

    async fn wait_for_jobs(&self) {
        while self.in_flight() > 0 {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}

fn panic_message(err: JoinError) -> String {
    match err.try_into_panic() {
        Ok(payload) => payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "job panicked".to_string()),
        Err(err) => err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enrichment::MockClipEnricher;
    use crate::error::WorkerError;
    use crate::ingest::{IngestedMedia, MockMediaIngestor};
    use crate::scoring::{MockSegmentScorer, ScoringOutcome};
    use reclip_models::{Constraints, Job, JobState, MediaSource};
    use reclip_store::{InMemoryJobRepository, JobRepository};

    fn ingestor() -> MockMediaIngestor {
        let mut ingestor = MockMediaIngestor::new();
        ingestor.expect_ingest().returning(|_| {
            Ok(IngestedMedia {
                file_uri: "https://example.com/v.mp4".to_string(),
                mime_type: "video/mp4".to_string(),
            })
        });
        ingestor
    }

    fn executor(repo: &InMemoryJobRepository, scorer: MockSegmentScorer) -> JobExecutor {
        JobExecutor::new(
            WorkerConfig {
                max_concurrent_jobs: 2,
                shutdown_timeout: Duration::from_secs(5),
                ..WorkerConfig::default()
            },
            ProcessingContext::new(
                Arc::new(repo.clone()),
                Arc::new(ingestor()),
                Arc::new(scorer),
                Arc::new(MockClipEnricher::new()),
            ),
        )
    }

    async fn queued_job(repo: &InMemoryJobRepository) -> Job {
        let job = Job::new(
            "user-1",
            MediaSource::url("https://example.com/v.mp4"),
            Constraints::default(),
        );
        repo.put(&job).await.unwrap();
        job
    }

    #[tokio::test]
    async fn test_error_becomes_failed_record() {
        let repo = InMemoryJobRepository::new();
        let job = queued_job(&repo).await;
        let mut scorer = MockSegmentScorer::new();
        scorer
            .expect_score()
            .returning(|_, _| Err(WorkerError::scoring_failed("oracle unreachable")));

        let executor = executor(&repo, scorer);
        executor.spawn(job.id.clone()).await.unwrap();

        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Failed);
        assert_eq!(
            stored.failure_reason.as_deref(),
            Some("Scoring failed: oracle unreachable")
        );
        assert!(stored.result.is_none());
        assert_eq!(executor.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_record() {
        let repo = InMemoryJobRepository::new();
        let job = queued_job(&repo).await;
        let mut scorer = MockSegmentScorer::new();
        scorer
            .expect_score()
            .returning(|_, _| panic!("scorer exploded"));

        let executor = executor(&repo, scorer);
        executor.spawn(job.id.clone()).await.unwrap();

        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Failed);
        assert_eq!(
            stored.failure_reason.as_deref(),
            Some("Internal error: scorer exploded")
        );
    }

    #[tokio::test]
    async fn test_successful_run_completes() {
        let repo = InMemoryJobRepository::new();
        let job = queued_job(&repo).await;
        let mut scorer = MockSegmentScorer::new();
        scorer
            .expect_score()
            .returning(|_, _| Ok(ScoringOutcome::default()));

        let executor = executor(&repo, scorer);
        executor.spawn(job.id.clone()).await.unwrap();

        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Completed);
        assert_eq!(stored.progress, 100);
    }

    #[tokio::test]
    async fn test_cancelled_job_is_not_marked_failed() {
        let repo = InMemoryJobRepository::new();
        let mut job = queued_job(&repo).await;
        job.cancel().unwrap();
        repo.put(&job).await.unwrap();

        let executor = executor(&repo, MockSegmentScorer::new());
        executor.spawn(job.id.clone()).await.unwrap();

        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Cancelled);
        assert!(stored.failure_reason.is_none());
    }

    #[tokio::test]
    async fn test_spawn_after_shutdown_fails_job() {
        let repo = InMemoryJobRepository::new();
        let job = queued_job(&repo).await;

        let executor = executor(&repo, MockSegmentScorer::new());
        executor.shutdown().await;
        assert!(executor.is_shutting_down());

        executor.spawn(job.id.clone()).await.unwrap();

        let stored = repo.get(&job.id).await.unwrap().unwrap();
        assert_eq!(stored.state, JobState::Failed);
        assert_eq!(stored.failure_reason.as_deref(), Some("Worker is shutting down"));
    }

    #[tokio::test]
    async fn test_panic_message_extraction() {
        let handle = tokio::spawn(async { panic!("{}", String::from("owned message")) });
        let err = handle.await.unwrap_err();
        assert_eq!(panic_message(err), "owned message");
    }
}
