//! Client for the Gemini generative-AI API.
//!
//! This crate provides:
//! - Media upload to the Files API and file state lookup
//! - Schema-constrained JSON generation with model fallback and retry

pub mod client;
pub mod error;
pub mod types;

pub use client::{strip_code_fences, GeminiClient, GeminiConfig};
pub use error::{GeminiError, GeminiResult};
pub use types::{FileResource, FileState, Part};
