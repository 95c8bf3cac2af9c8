//! Job records and their lifecycle.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::{ModelError, ModelResult};
use crate::{Clip, Constraints, MediaSource, ProgressMilestone};

/// Unique identifier for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Job lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Persisted, waiting for the executor
    #[default]
    Queued,
    /// Pipeline is running
    Processing,
    /// Result persisted
    Completed,
    /// Execution error captured in `failure_reason`
    Failed,
    /// Stopped on caller request
    Cancelled,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Queued => "queued",
            JobState::Processing => "processing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Cancelled => "cancelled",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Cancelled
        )
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Aggregate numbers over a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobStatistics {
    pub total_clips: u32,
    /// Mean clip virality, one decimal place
    pub average_virality_score: f64,
    pub processing_time_seconds: f64,
}

/// Output of a completed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobResult {
    /// Clips in selection order
    pub clips: Vec<Clip>,
    pub statistics: JobStatistics,
}

impl JobResult {
    /// Build a result and its statistics from the final clip list.
    pub fn new(clips: Vec<Clip>, processing_time_seconds: f64) -> Self {
        let total_clips = clips.len() as u32;
        let average_virality_score = if clips.is_empty() {
            0.0
        } else {
            let sum: f64 = clips.iter().map(|c| c.virality_score as f64).sum();
            (sum / clips.len() as f64 * 10.0).round() / 10.0
        };

        Self {
            clips,
            statistics: JobStatistics {
                total_clips,
                average_virality_score,
                processing_time_seconds: (processing_time_seconds * 100.0).round() / 100.0,
            },
        }
    }
}

/// A clip-generation job as persisted in the job store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Unique job ID
    pub id: JobId,

    /// Requesting principal
    pub owner: String,

    /// Input video
    pub source: MediaSource,

    /// Selection constraints
    pub constraints: Constraints,

    /// Lifecycle state
    #[serde(default)]
    pub state: JobState,

    /// Progress (0-100)
    #[serde(default)]
    pub progress: u8,

    /// Present only when completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<JobResult>,

    /// Present only when failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,

    /// Started at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    /// Completed/failed/cancelled at timestamp
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Write counter used for compare-and-set
    #[serde(default)]
    pub revision: u64,
}

impl Job {
    /// Create a new queued job.
    pub fn new(owner: impl Into<String>, source: MediaSource, constraints: Constraints) -> Self {
        let now = Utc::now();

        Self {
            id: JobId::new(),
            owner: owner.into(),
            source,
            constraints,
            state: JobState::Queued,
            progress: 0,
            result: None,
            failure_reason: None,
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
            revision: 0,
        }
    }

    /// Begin processing.
    pub fn start(&mut self) -> ModelResult<()> {
        if self.state != JobState::Queued {
            return Err(ModelError::invalid_transition(self.state, "start"));
        }
        let now = Utc::now();
        self.state = JobState::Processing;
        self.progress = ProgressMilestone::Started.percent();
        self.started_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Record a progress checkpoint.
    ///
    /// Progress never decreases and stays below 100 until completion.
    pub fn advance_progress(&mut self, progress: u8) -> ModelResult<()> {
        if self.state != JobState::Processing {
            return Err(ModelError::invalid_transition(self.state, "advance_progress"));
        }
        self.progress = self.progress.max(progress.min(99));
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Mark job as completed.
    pub fn complete(&mut self, result: JobResult) -> ModelResult<()> {
        if self.state != JobState::Processing {
            return Err(ModelError::invalid_transition(self.state, "complete"));
        }
        let now = Utc::now();
        self.state = JobState::Completed;
        self.progress = ProgressMilestone::Persisted.percent();
        self.result = Some(result);
        self.failure_reason = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Mark job as failed.
    pub fn fail(&mut self, reason: impl Into<String>) -> ModelResult<()> {
        if self.state.is_terminal() {
            return Err(ModelError::invalid_transition(self.state, "fail"));
        }
        let now = Utc::now();
        self.state = JobState::Failed;
        self.failure_reason = Some(reason.into());
        self.result = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Cancel a queued or processing job.
    pub fn cancel(&mut self) -> ModelResult<()> {
        if self.state.is_terminal() {
            return Err(ModelError::invalid_transition(self.state, "cancel"));
        }
        let now = Utc::now();
        self.state = JobState::Cancelled;
        self.result = None;
        self.failure_reason = None;
        self.completed_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.state.is_terminal()
    }

    /// Playable pointer for clips cut from this job's source.
    pub fn media_reference(&self) -> String {
        self.source.media_reference(&self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> Job {
        Job::new(
            "user123",
            MediaSource::url("https://youtube.com/watch?v=abc"),
            Constraints::default(),
        )
    }

    #[test]
    fn test_job_creation() {
        let job = job();
        assert_eq!(job.state, JobState::Queued);
        assert_eq!(job.progress, 0);
        assert!(job.result.is_none());
        assert!(job.failure_reason.is_none());
        assert_eq!(job.revision, 0);
    }

    #[test]
    fn test_job_state_transitions() {
        let mut job = job();

        job.start().unwrap();
        assert_eq!(job.state, JobState::Processing);
        assert!(job.started_at.is_some());

        job.advance_progress(50).unwrap();
        assert_eq!(job.progress, 50);

        job.complete(JobResult::new(Vec::new(), 1.0)).unwrap();
        assert_eq!(job.state, JobState::Completed);
        assert_eq!(job.progress, 100);
        assert!(job.result.is_some());
    }

    #[test]
    fn test_progress_is_monotonic_and_below_100() {
        let mut job = job();
        job.start().unwrap();

        job.advance_progress(60).unwrap();
        job.advance_progress(20).unwrap();
        assert_eq!(job.progress, 60);

        job.advance_progress(100).unwrap();
        assert_eq!(job.progress, 99);
    }

    #[test]
    fn test_fail_sets_reason_only() {
        let mut job = job();
        job.start().unwrap();
        job.fail("Scoring failed: oracle unreachable").unwrap();

        assert_eq!(job.state, JobState::Failed);
        assert!(job.result.is_none());
        assert_eq!(
            job.failure_reason.as_deref(),
            Some("Scoring failed: oracle unreachable")
        );
        assert!(job.progress < 100);
    }

    #[test]
    fn test_cancel_rejected_when_terminal() {
        let mut job = job();
        job.cancel().unwrap();
        assert_eq!(job.state, JobState::Cancelled);

        let err = job.cancel().unwrap_err();
        assert!(matches!(err, ModelError::InvalidTransition { .. }));
        assert!(job.advance_progress(10).is_err());
        assert!(job.fail("late").is_err());
    }

    #[test]
    fn test_statistics() {
        let result = JobResult::new(Vec::new(), 3.14159);
        assert_eq!(result.statistics.total_clips, 0);
        assert_eq!(result.statistics.average_virality_score, 0.0);
        assert_eq!(result.statistics.processing_time_seconds, 3.14);
    }

    #[test]
    fn test_record_serialization_is_camel_case() {
        let job = job();
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["state"], "queued");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("result").is_none());
        assert!(value.get("failureReason").is_none());
    }
}
