//! Shared data models for the Reclip pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Jobs, their lifecycle and result statistics
//! - Caller-supplied selection constraints
//! - Candidate segments produced by the scoring oracle
//! - Clips and their enrichment metadata
//! - Media source references

pub mod clip;
pub mod constraints;
pub mod error;
pub mod job;
pub mod progress;
pub mod segment;
pub mod source;

// Re-export common types
pub use clip::{Caption, Clip, ClipEnrichment};
pub use constraints::{Constraints, Platform, MAX_TARGET_CLIP_COUNT};
pub use error::{ModelError, ModelResult};
pub use job::{Job, JobId, JobResult, JobState, JobStatistics};
pub use progress::ProgressMilestone;
pub use segment::{CandidateSegment, Sentiment};
pub use source::MediaSource;
