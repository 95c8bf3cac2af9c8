//! In-memory job repository.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use reclip_models::{Job, JobId};

use crate::error::{StoreError, StoreResult};
use crate::repository::JobRepository;

/// Job records held in a shared hash map.
#[derive(Clone, Default)]
pub struct InMemoryJobRepository {
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
}

impl InMemoryJobRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.jobs.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.jobs.read().await.is_empty()
    }
}

#[async_trait]
impl JobRepository for InMemoryJobRepository {
    async fn get(&self, id: &JobId) -> StoreResult<Option<Job>> {
        Ok(self.jobs.read().await.get(id).cloned())
    }

    async fn put(&self, job: &Job) -> StoreResult<()> {
        self.jobs.write().await.insert(job.id.clone(), job.clone());
        Ok(())
    }

    async fn compare_and_set(&self, expected_revision: u64, job: &Job) -> StoreResult<bool> {
        let mut jobs = self.jobs.write().await;
        let current = jobs
            .get(&job.id)
            .ok_or_else(|| StoreError::not_found(job.id.as_str()))?;

        if current.revision != expected_revision {
            return Ok(false);
        }

        jobs.insert(job.id.clone(), job.clone());
        Ok(true)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}
