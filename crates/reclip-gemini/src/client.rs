//! Gemini HTTP client.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::error::{GeminiError, GeminiResult};
use crate::types::{
    Content, FileResource, GenerateContentRequest, GenerateContentResponse, GenerationConfig,
    Part, UploadFileResponse,
};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.5-flash-lite", "gemini-2.5-pro"];

/// Configuration for the Gemini client.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// API key
    pub api_key: String,
    /// API root, overridable for tests
    pub base_url: String,
    /// Models tried in order until one succeeds
    pub models: Vec<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Retries per model for transient failures
    pub max_retries: u32,
    /// Base delay for exponential backoff
    pub retry_base_delay: Duration,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            timeout: Duration::from_secs(300), // video analysis is slow
            max_retries: 2,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl GeminiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY")
            .map_err(|_| GeminiError::config("GEMINI_API_KEY not set"))?;

        let models = std::env::var("GEMINI_MODELS")
            .ok()
            .map(|s| {
                s.split(',')
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODELS.iter().map(|m| m.to_string()).collect());

        Ok(Self {
            api_key,
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            models,
            timeout: Duration::from_secs(
                std::env::var("GEMINI_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            max_retries: std::env::var("GEMINI_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            retry_base_delay: Duration::from_millis(500),
        })
    }
}

/// Client for the Gemini Files and generateContent APIs.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new client.
    pub fn new(config: GeminiConfig) -> GeminiResult<Self> {
        if config.api_key.trim().is_empty() {
            return Err(GeminiError::config("Gemini API key is empty"));
        }
        if config.models.is_empty() {
            return Err(GeminiError::config("No Gemini models configured"));
        }

        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(GeminiError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> GeminiResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Upload media bytes using the raw upload protocol.
    pub async fn upload_file(&self, data: Vec<u8>, mime_type: &str) -> GeminiResult<FileResource> {
        let url = format!("{}/upload/v1beta/files", self.config.base_url);
        let size = data.len();

        debug!("Uploading {} bytes ({}) to Gemini Files API", size, mime_type);

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.config.api_key.as_str())])
            .header("X-Goog-Upload-Protocol", "raw")
            .header(reqwest::header::CONTENT_TYPE, mime_type)
            .body(data)
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let uploaded: UploadFileResponse = response.json().await?;

        info!(
            "Uploaded {} bytes as {} (state {:?})",
            size, uploaded.file.name, uploaded.file.state
        );
        Ok(uploaded.file)
    }

    /// Fetch the current metadata of an uploaded file by resource name.
    pub async fn get_file(&self, name: &str) -> GeminiResult<FileResource> {
        let url = format!("{}/v1beta/{}", self.config.base_url, name);

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .get(&url)
                    .query(&[("key", self.config.api_key.as_str())])
                    .send()
                    .await?;
                Self::check_status(response).await
            })
            .await?;

        Ok(response.json().await?)
    }

    /// Run a prompt and parse the JSON answer into `T`.
    ///
    /// Each configured model is tried in order; transient failures are retried
    /// against the same model before moving on.
    pub async fn generate_json<T: DeserializeOwned>(
        &self,
        parts: Vec<Part>,
        response_schema: Option<serde_json::Value>,
    ) -> GeminiResult<T> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema,
                temperature: None,
            },
        };

        let mut last_error = None;

        for model in &self.config.models {
            info!("Attempting Gemini API with model: {}", model);
            match self.generate_with_model(model, &request).await {
                Ok(data) => {
                    info!("Successfully got response from {}", model);
                    return Ok(data);
                }
                Err(e) => {
                    warn!("Failed with model {}: {}", model, e);
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or(GeminiError::EmptyResponse))
    }

    async fn generate_with_model<T: DeserializeOwned>(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> GeminiResult<T> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url, model
        );

        let response = self
            .with_retry(|| async {
                let response = self
                    .http
                    .post(&url)
                    .query(&[("key", self.config.api_key.as_str())])
                    .json(request)
                    .send()
                    .await?;
                Self::check_status(response).await
            })
            .await?;

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            GeminiError::invalid_response(format!("Failed to parse Gemini response: {}", e))
        })?;

        let text = body.first_text().ok_or(GeminiError::EmptyResponse)?;

        serde_json::from_str(strip_code_fences(&text)).map_err(|e| {
            GeminiError::invalid_response(format!("Model output is not the expected JSON: {}", e))
        })
    }

    async fn check_status(response: reqwest::Response) -> GeminiResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Err(GeminiError::Api { status, body })
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> GeminiResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = GeminiResult<T>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = self.config.retry_base_delay.saturating_mul(2u32.saturating_pow(attempt));
                    warn!(
                        "Gemini request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Remove a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let text = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"))
        .unwrap_or(text);
    let text = text.strip_suffix("```").unwrap_or(text);
    text.trim()
}
