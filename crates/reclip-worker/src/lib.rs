//! Clip generation pipeline.
//!
//! This crate provides:
//! - Media ingestion into the oracle, with bounded ready-polling
//! - Segment scoring, selection, clip synthesis and enrichment
//! - A bounded job executor that converts every failure into a job-state write
//! - The job orchestrator (submit / status / cancel)

pub mod config;
pub mod enrichment;
pub mod error;
pub mod executor;
pub mod ingest;
pub mod logging;
pub mod metrics;
pub mod orchestrator;
pub mod processor;
pub mod ready;
pub mod scoring;
pub mod selector;
pub mod synthesizer;

pub use config::WorkerConfig;
pub use enrichment::{enrich_all, ClipEnricher, EnrichmentContext, EnrichmentOutcome, GeminiEnricher};
pub use error::{WorkerError, WorkerResult};
pub use executor::JobExecutor;
pub use ingest::{GeminiIngestor, IngestedMedia, MediaIngestor};
pub use logging::JobLogger;
pub use orchestrator::JobOrchestrator;
pub use processor::{process_job, ProcessingContext};
pub use ready::{poll_until_ready, ProbeState, ReadyOutcome};
pub use scoring::{GeminiScorer, ScoringOutcome, SegmentScorer};
pub use selector::select;
pub use synthesizer::synthesize;
