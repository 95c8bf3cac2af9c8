//! Application state.

use std::sync::Arc;

use tracing::info;

use reclip_gemini::GeminiClient;
use reclip_storage::{InMemoryObjectStore, ObjectStore, R2Client};
use reclip_store::{InMemoryJobRepository, JobRepository, RedisJobRepository};
use reclip_worker::{
    GeminiEnricher, GeminiIngestor, GeminiScorer, JobExecutor, JobOrchestrator,
    ProcessingContext, WorkerConfig,
};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<JobOrchestrator>,
    pub storage: Arc<dyn ObjectStore>,
}

impl AppState {
    pub fn new(
        config: ApiConfig,
        orchestrator: Arc<JobOrchestrator>,
        storage: Arc<dyn ObjectStore>,
    ) -> Self {
        Self {
            config,
            orchestrator,
            storage,
        }
    }

    /// Wire the full pipeline from environment variables.
    ///
    /// `REDIS_URL` selects the Redis job repository and `R2_ENDPOINT_URL`
    /// the R2 object store; otherwise both stay in process memory.
    pub fn from_env(config: ApiConfig) -> anyhow::Result<Self> {
        let repo: Arc<dyn JobRepository> = if std::env::var("REDIS_URL").is_ok() {
            info!("Using Redis job repository");
            Arc::new(RedisJobRepository::from_env()?)
        } else {
            info!("REDIS_URL not set, using in-memory job repository");
            Arc::new(InMemoryJobRepository::new())
        };

        let storage: Arc<dyn ObjectStore> = if std::env::var("R2_ENDPOINT_URL").is_ok() {
            info!("Using R2 object store");
            Arc::new(R2Client::from_env()?)
        } else {
            info!("R2_ENDPOINT_URL not set, using in-memory object store");
            Arc::new(InMemoryObjectStore::new())
        };

        let gemini = Arc::new(GeminiClient::from_env()?);
        let worker_config = WorkerConfig::from_env();

        let ctx = ProcessingContext::new(
            Arc::clone(&repo),
            Arc::new(GeminiIngestor::new(
                Arc::clone(&gemini),
                Arc::clone(&storage),
                worker_config.ready_poll_interval,
                worker_config.ready_max_wait,
            )),
            Arc::new(GeminiScorer::new(Arc::clone(&gemini))),
            Arc::new(GeminiEnricher::new(gemini)),
        );
        let executor = Arc::new(JobExecutor::new(worker_config, ctx));
        let orchestrator = Arc::new(JobOrchestrator::new(repo, executor));

        Ok(Self::new(config, orchestrator, storage))
    }
}
