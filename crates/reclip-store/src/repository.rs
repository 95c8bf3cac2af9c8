//! Repository boundary and the optimistic update loop.

use async_trait::async_trait;
use tracing::debug;

use reclip_models::{Job, JobId, ModelResult};

use crate::error::{StoreError, StoreResult};

/// Upper bound on compare-and-set retries inside `mutate_job`.
pub const MAX_CAS_ATTEMPTS: u32 = 8;

/// Persistence for job records.
///
/// Each record is written by a single orchestrator task at a time; readers
/// never mutate.
#[async_trait]
pub trait JobRepository: Send + Sync {
    /// Read a record.
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>>;

    /// Write a record unconditionally.
    async fn put(&self, job: &Job) -> StoreResult<()>;

    /// Write `job` only if the stored record's revision equals `expected_revision`.
    ///
    /// Returns `Ok(false)` on a revision mismatch and `NotFound` if the record is missing.
    async fn compare_and_set(&self, expected_revision: u64, job: &Job) -> StoreResult<bool>;

    /// Reachability probe for readiness checks.
    async fn ping(&self) -> StoreResult<()>;
}

/// Apply `mutation` to the stored record with optimistic concurrency.
///
/// The closure may run more than once when a concurrent writer wins the race.
/// A `ModelError` from the closure aborts the update as `StoreError::Rejected`.
pub async fn mutate_job<F>(
    repo: &dyn JobRepository,
    id: &JobId,
    mut mutation: F,
) -> StoreResult<Job>
where
    F: FnMut(&mut Job) -> ModelResult<()> + Send,
{
    for attempt in 1..=MAX_CAS_ATTEMPTS {
        let current = repo
            .get(id)
            .await?
            .ok_or_else(|| StoreError::not_found(id.as_str()))?;

        let mut next = current.clone();
        mutation(&mut next)?;
        next.revision = current.revision + 1;

        if repo.compare_and_set(current.revision, &next).await? {
            return Ok(next);
        }

        debug!(job_id = %id, attempt, "Revision conflict, retrying update");
    }

    Err(StoreError::Conflict(id.to_string()))
}
