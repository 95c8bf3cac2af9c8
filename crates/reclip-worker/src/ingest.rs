//! Source media ingestion into the oracle.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use reclip_gemini::{FileState, GeminiClient};
use reclip_models::{Job, MediaSource};
use reclip_storage::ObjectStore;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::ready::{poll_until_ready, ProbeState, ReadyOutcome};

/// Media as the oracle can reference it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestedMedia {
    pub file_uri: String,
    pub mime_type: String,
}

/// Makes a job's source video available to the scoring oracle.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaIngestor: Send + Sync {
    async fn ingest(&self, job: &Job) -> WorkerResult<IngestedMedia>;
}

/// Uploads stored media to the Gemini Files API; URL sources pass through.
pub struct GeminiIngestor {
    gemini: Arc<GeminiClient>,
    store: Arc<dyn ObjectStore>,
    poll_interval: Duration,
    max_wait: Duration,
}

impl GeminiIngestor {
    pub fn new(
        gemini: Arc<GeminiClient>,
        store: Arc<dyn ObjectStore>,
        poll_interval: Duration,
        max_wait: Duration,
    ) -> Self {
        Self {
            gemini,
            store,
            poll_interval,
            max_wait,
        }
    }

    async fn wait_until_ready(&self, name: &str) -> WorkerResult<()> {
        let outcome = poll_until_ready(self.poll_interval, self.max_wait, || async {
            let file = self
                .gemini
                .get_file(name)
                .await
                .map_err(|e| WorkerError::ingest_failed(format!("file state lookup: {}", e)))?;
            Ok::<_, WorkerError>(match file.state {
                FileState::Active => ProbeState::Ready,
                FileState::Failed => ProbeState::Failed(format!("{} failed processing", name)),
                FileState::Processing | FileState::StateUnspecified => ProbeState::Pending,
            })
        })
        .await?;

        match outcome {
            ReadyOutcome::Ready => Ok(()),
            ReadyOutcome::Failed(reason) => Err(WorkerError::ingest_failed(reason)),
            ReadyOutcome::TimedOut => {
                warn!(
                    file = name,
                    max_wait_secs = self.max_wait.as_secs(),
                    "Uploaded media not ready before deadline, proceeding anyway"
                );
                metrics::record_ready_timeout();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl MediaIngestor for GeminiIngestor {
    async fn ingest(&self, job: &Job) -> WorkerResult<IngestedMedia> {
        let mime_type = job.source.mime_type().to_string();

        match &job.source {
            MediaSource::Url { url } => Ok(IngestedMedia {
                file_uri: url.clone(),
                mime_type,
            }),
            MediaSource::Stored { path } => {
                let bytes = self.store.download(&job.owner, path).await?;
                info!(job_id = %job.id, bytes = bytes.len(), "Downloaded source media");

                let file = self
                    .gemini
                    .upload_file(bytes, &mime_type)
                    .await
                    .map_err(|e| WorkerError::ingest_failed(format!("upload: {}", e)))?;

                if file.state != FileState::Active {
                    self.wait_until_ready(&file.name).await?;
                }

                Ok(IngestedMedia {
                    file_uri: file.uri,
                    mime_type: file.mime_type.unwrap_or(mime_type),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reclip_gemini::GeminiConfig;
    use reclip_models::Constraints;
    use reclip_storage::InMemoryObjectStore;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gemini_for(server: &MockServer) -> Arc<GeminiClient> {
        Arc::new(
            GeminiClient::new(GeminiConfig {
                api_key: "test-key".to_string(),
                base_url: server.uri(),
                retry_base_delay: Duration::from_millis(1),
                ..GeminiConfig::default()
            })
            .unwrap(),
        )
    }

    fn file_json(state: &str) -> serde_json::Value {
        json!({
            "name": "files/vid1",
            "uri": "https://files.example/vid1",
            "mimeType": "video/mp4",
            "state": state
        })
    }

    async fn stored_job(store: &InMemoryObjectStore) -> Job {
        store
            .upload("user-1", "uploads/talk.mp4", vec![1, 2, 3], "video/mp4")
            .await
            .unwrap();
        Job::new("user-1", MediaSource::stored("uploads/talk.mp4"), Constraints::default())
    }

    #[tokio::test]
    async fn test_url_source_passes_through() {
        let server = MockServer::start().await;
        let ingestor = GeminiIngestor::new(
            gemini_for(&server),
            Arc::new(InMemoryObjectStore::new()),
            Duration::from_millis(10),
            Duration::from_millis(50),
        );
        let job = Job::new(
            "user-1",
            MediaSource::url("https://youtube.com/watch?v=abc"),
            Constraints::default(),
        );

        let media = ingestor.ingest(&job).await.unwrap();
        assert_eq!(media.file_uri, "https://youtube.com/watch?v=abc");
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stored_source_is_uploaded_and_polled() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "file": file_json("PROCESSING") })),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/vid1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("ACTIVE")))
            .mount(&server)
            .await;

        let store = InMemoryObjectStore::new();
        let job = stored_job(&store).await;
        let ingestor = GeminiIngestor::new(
            gemini_for(&server),
            Arc::new(store),
            Duration::from_millis(10),
            Duration::from_secs(5),
        );

        let media = ingestor.ingest(&job).await.unwrap();
        assert_eq!(media.file_uri, "https://files.example/vid1");
        assert_eq!(media.mime_type, "video/mp4");
    }

    #[tokio::test]
    async fn test_failed_file_state_is_fatal() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "file": file_json("PROCESSING") })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/vid1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("FAILED")))
            .mount(&server)
            .await;

        let store = InMemoryObjectStore::new();
        let job = stored_job(&store).await;
        let ingestor = GeminiIngestor::new(
            gemini_for(&server),
            Arc::new(store),
            Duration::from_millis(10),
            Duration::from_secs(5),
        );

        let err = ingestor.ingest(&job).await.unwrap_err();
        assert!(matches!(err, WorkerError::IngestFailed(_)));
    }

    #[tokio::test]
    async fn test_ready_timeout_proceeds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/v1beta/files"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "file": file_json("PROCESSING") })),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1beta/files/vid1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(file_json("PROCESSING")))
            .mount(&server)
            .await;

        let store = InMemoryObjectStore::new();
        let job = stored_job(&store).await;
        let ingestor = GeminiIngestor::new(
            gemini_for(&server),
            Arc::new(store),
            Duration::from_millis(10),
            Duration::from_millis(40),
        );

        let media = ingestor.ingest(&job).await.unwrap();
        assert_eq!(media.file_uri, "https://files.example/vid1");
    }

    #[tokio::test]
    async fn test_missing_stored_object() {
        let server = MockServer::start().await;
        let ingestor = GeminiIngestor::new(
            gemini_for(&server),
            Arc::new(InMemoryObjectStore::new()),
            Duration::from_millis(10),
            Duration::from_millis(40),
        );
        let job = Job::new("user-1", MediaSource::stored("missing.mp4"), Constraints::default());

        let err = ingestor.ingest(&job).await.unwrap_err();
        assert!(matches!(err, WorkerError::Storage(_)));
    }
}
