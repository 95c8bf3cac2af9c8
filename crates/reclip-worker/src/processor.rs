//! Sequential stage runner for a single job.

use std::sync::Arc;
use std::time::Instant;

use tracing::Instrument;

use reclip_models::{Job, JobId, JobResult, ProgressMilestone};
use reclip_store::{mutate_job, JobRepository};

use crate::enrichment::{enrich_all, ClipEnricher, EnrichmentContext};
use crate::error::WorkerResult;
use crate::ingest::MediaIngestor;
use crate::logging::JobLogger;
use crate::metrics;
use crate::scoring::SegmentScorer;
use crate::selector::select;
use crate::synthesizer::synthesize;

/// Collaborators shared by every job run.
#[derive(Clone)]
pub struct ProcessingContext {
    pub repo: Arc<dyn JobRepository>,
    pub ingestor: Arc<dyn MediaIngestor>,
    pub scorer: Arc<dyn SegmentScorer>,
    pub enricher: Arc<dyn ClipEnricher>,
}

impl ProcessingContext {
    pub fn new(
        repo: Arc<dyn JobRepository>,
        ingestor: Arc<dyn MediaIngestor>,
        scorer: Arc<dyn SegmentScorer>,
        enricher: Arc<dyn ClipEnricher>,
    ) -> Self {
        Self {
            repo,
            ingestor,
            scorer,
            enricher,
        }
    }
}

/// Write a progress checkpoint.
///
/// Fails with `Cancelled` when the stored record was cancelled in the meantime.
async fn checkpoint(
    ctx: &ProcessingContext,
    job_id: &JobId,
    milestone: ProgressMilestone,
    logger: &JobLogger,
    stage_started: Instant,
) -> WorkerResult<Job> {
    let job = mutate_job(ctx.repo.as_ref(), job_id, |j| {
        j.advance_progress(milestone.percent())
    })
    .await?;

    let elapsed = stage_started.elapsed().as_secs_f64();
    metrics::record_stage_duration(milestone.as_str(), elapsed);
    logger.log_milestone(milestone, elapsed);
    Ok(job)
}

/// Run every pipeline stage for `job_id` and persist the result.
///
/// Stages run strictly in order; only enrichment fans out. Returns
/// `Cancelled` if the record is cancelled at any checkpoint.
pub async fn process_job(ctx: &ProcessingContext, job_id: &JobId) -> WorkerResult<()> {
    let logger = JobLogger::new(job_id, "clip_generation");
    let span = logger.create_span();

    async {
        let started = Instant::now();

        let job = mutate_job(ctx.repo.as_ref(), job_id, |j| j.start()).await?;
        logger.log_start(&format!("source {}", job.media_reference()));

        // Ingest
        let stage = Instant::now();
        let media = ctx.ingestor.ingest(&job).await?;
        checkpoint(ctx, job_id, ProgressMilestone::Ingested, &logger, stage).await?;

        // Score
        let stage = Instant::now();
        let scoring = ctx.scorer.score(&media, &job.constraints).await?;
        logger.log_progress(&format!("{} candidate segments", scoring.segments.len()));
        checkpoint(ctx, job_id, ProgressMilestone::Scored, &logger, stage).await?;

        // Select + synthesize
        let stage = Instant::now();
        let selected = select(&scoring.segments, &job.constraints);
        let clips = synthesize(&selected, &job.media_reference());
        logger.log_progress(&format!(
            "selected {} of {} segments",
            selected.len(),
            scoring.segments.len()
        ));
        checkpoint(ctx, job_id, ProgressMilestone::Synthesized, &logger, stage).await?;

        // Enrich
        let stage = Instant::now();
        let context = EnrichmentContext {
            platforms: job.constraints.target_platforms.clone(),
            transcript: scoring.transcript,
        };
        let enriched = enrich_all(ctx.enricher.as_ref(), clips, &context).await;
        if enriched.failures > 0 {
            logger.log_warning(&format!(
                "{} of {} clips kept default metadata",
                enriched.failures,
                enriched.clips.len()
            ));
            metrics::record_enrichment_failures(enriched.failures);
        }
        checkpoint(ctx, job_id, ProgressMilestone::Enriched, &logger, stage).await?;

        // Persist
        let stage = Instant::now();
        let clip_count = enriched.clips.len();
        let result = JobResult::new(enriched.clips, started.elapsed().as_secs_f64());
        mutate_job(ctx.repo.as_ref(), job_id, |j| j.complete(result.clone())).await?;
        metrics::record_stage_duration(
            ProgressMilestone::Persisted.as_str(),
            stage.elapsed().as_secs_f64(),
        );
        metrics::record_clips_produced(clip_count);
        metrics::record_job_duration(started.elapsed().as_secs_f64());

        logger.log_completion(&format!(
            "{} clips in {:.2}s",
            clip_count,
            started.elapsed().as_secs_f64()
        ));
        Ok(())
    }
    .instrument(span)
    .await
}
