//! Pipeline metrics.
//!
//! Recorded through the `metrics` facade; the API binary installs the
//! Prometheus recorder that renders them.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const JOBS_SUBMITTED_TOTAL: &str = "reclip_jobs_submitted_total";
    pub const JOBS_FINISHED_TOTAL: &str = "reclip_jobs_finished_total";
    pub const JOBS_IN_FLIGHT: &str = "reclip_jobs_in_flight";
    pub const STAGE_DURATION_SECONDS: &str = "reclip_stage_duration_seconds";
    pub const JOB_DURATION_SECONDS: &str = "reclip_job_duration_seconds";
    pub const CLIPS_PRODUCED_TOTAL: &str = "reclip_clips_produced_total";
    pub const ENRICHMENT_FAILURES_TOTAL: &str = "reclip_enrichment_failures_total";
    pub const READY_TIMEOUTS_TOTAL: &str = "reclip_ready_timeouts_total";
}

pub fn record_job_submitted() {
    counter!(names::JOBS_SUBMITTED_TOTAL).increment(1);
}

/// Record a job reaching a terminal state (`completed`, `failed`, `cancelled`).
pub fn record_job_finished(state: &str) {
    let labels = [("state", state.to_string())];
    counter!(names::JOBS_FINISHED_TOTAL, &labels).increment(1);
}

pub fn set_jobs_in_flight(count: usize) {
    gauge!(names::JOBS_IN_FLIGHT).set(count as f64);
}

pub fn record_stage_duration(stage: &str, duration_secs: f64) {
    let labels = [("stage", stage.to_string())];
    histogram!(names::STAGE_DURATION_SECONDS, &labels).record(duration_secs);
}

pub fn record_job_duration(duration_secs: f64) {
    histogram!(names::JOB_DURATION_SECONDS).record(duration_secs);
}

pub fn record_clips_produced(count: usize) {
    counter!(names::CLIPS_PRODUCED_TOTAL).increment(count as u64);
}

pub fn record_enrichment_failures(count: usize) {
    counter!(names::ENRICHMENT_FAILURES_TOTAL).increment(count as u64);
}

pub fn record_ready_timeout() {
    counter!(names::READY_TIMEOUTS_TOTAL).increment(1);
}
