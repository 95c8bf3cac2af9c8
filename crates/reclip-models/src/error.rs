//! Model error types.

use thiserror::Error;

use crate::JobState;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("Invalid transition from {from} via {action}")]
    InvalidTransition { from: JobState, action: &'static str },

    #[error("Invalid media source: {0}")]
    InvalidSource(String),
}

impl ModelError {
    pub fn invalid_transition(from: JobState, action: &'static str) -> Self {
        Self::InvalidTransition { from, action }
    }

    pub fn invalid_source(msg: impl Into<String>) -> Self {
        Self::InvalidSource(msg.into())
    }
}
