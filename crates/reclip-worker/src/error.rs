//! Worker error types.

use thiserror::Error;

use reclip_models::{JobState, ModelError};
use reclip_store::StoreError;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Ingest failed: {0}")]
    IngestFailed(String),

    #[error("Scoring failed: {0}")]
    ScoringFailed(String),

    #[error("Enrichment failed: {0}")]
    EnrichmentFailed(String),

    #[error("Job not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The run observed a cancelled record and stopped.
    #[error("Job cancelled: {0}")]
    Cancelled(String),

    #[error("Storage error: {0}")]
    Storage(#[from] reclip_storage::StorageError),

    #[error("Store error: {0}")]
    Store(StoreError),
}

impl WorkerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn ingest_failed(msg: impl Into<String>) -> Self {
        Self::IngestFailed(msg.into())
    }

    pub fn scoring_failed(msg: impl Into<String>) -> Self {
        Self::ScoringFailed(msg.into())
    }

    pub fn enrichment_failed(msg: impl Into<String>) -> Self {
        Self::EnrichmentFailed(msg.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, WorkerError::Cancelled(_))
    }
}

impl From<StoreError> for WorkerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => WorkerError::NotFound(id),
            StoreError::Rejected(ModelError::InvalidTransition {
                from: JobState::Cancelled,
                action,
            }) => WorkerError::Cancelled(format!("{} refused on cancelled job", action)),
            StoreError::Rejected(ModelError::InvalidTransition { from, action }) => {
                WorkerError::InvalidState(format!("cannot {} a job that is {}", action, from))
            }
            StoreError::Rejected(e) => WorkerError::Validation(e.to_string()),
            other => WorkerError::Store(other),
        }
    }
}

impl From<ModelError> for WorkerError {
    fn from(err: ModelError) -> Self {
        WorkerError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_error_mapping() {
        let err: WorkerError = StoreError::not_found("abc").into();
        assert!(matches!(err, WorkerError::NotFound(id) if id == "abc"));

        let err: WorkerError =
            StoreError::Rejected(ModelError::invalid_transition(JobState::Cancelled, "advance_progress"))
                .into();
        assert!(err.is_cancelled());

        let err: WorkerError =
            StoreError::Rejected(ModelError::invalid_transition(JobState::Completed, "cancel")).into();
        assert!(matches!(err, WorkerError::InvalidState(_)));
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot cancel a job that is completed"
        );
    }
}
