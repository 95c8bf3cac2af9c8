//! Segment scoring via the generative-AI oracle.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use reclip_gemini::{GeminiClient, Part};
use reclip_models::{CandidateSegment, Constraints, MAX_TARGET_CLIP_COUNT};

use crate::error::{WorkerError, WorkerResult};
use crate::ingest::IngestedMedia;

/// Scorer output for one video.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringOutcome {
    pub segments: Vec<CandidateSegment>,
    pub transcript: Option<String>,
}

/// Proposes scored candidate segments for a video.
///
/// Any failure is fatal to the job and surfaces as `ScoringFailed`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SegmentScorer: Send + Sync {
    async fn score(
        &self,
        media: &IngestedMedia,
        constraints: &Constraints,
    ) -> WorkerResult<ScoringOutcome>;
}

/// Oracle answer. A reply that does not match this shape fails the job.
#[derive(Debug, Deserialize)]
struct ScoringResponse {
    segments: Vec<CandidateSegment>,
    #[serde(default)]
    transcript: Option<String>,
}

pub struct GeminiScorer {
    gemini: Arc<GeminiClient>,
}

impl GeminiScorer {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }
}

#[async_trait]
impl SegmentScorer for GeminiScorer {
    async fn score(
        &self,
        media: &IngestedMedia,
        constraints: &Constraints,
    ) -> WorkerResult<ScoringOutcome> {
        let parts = vec![
            Part::file(&media.file_uri, &media.mime_type),
            Part::text(build_scoring_prompt(constraints)),
        ];

        let response: ScoringResponse = self
            .gemini
            .generate_json(parts, Some(scoring_schema()))
            .await
            .map_err(|e| WorkerError::scoring_failed(e.to_string()))?;

        Ok(into_outcome(response))
    }
}

/// Drop segments that parse but describe no usable time range.
fn into_outcome(response: ScoringResponse) -> ScoringOutcome {
    let total = response.segments.len();
    let segments: Vec<CandidateSegment> = response
        .segments
        .into_iter()
        .filter(|segment| {
            let keep = segment.is_well_formed();
            if !keep {
                warn!(
                    start = segment.start_time,
                    end = segment.end_time,
                    "Dropping malformed segment"
                );
            }
            keep
        })
        .collect();

    debug!(kept = segments.len(), total, "Parsed scorer response");

    ScoringOutcome {
        segments,
        transcript: response.transcript.filter(|t| !t.trim().is_empty()),
    }
}

/// Scoring instructions for one video.
pub fn build_scoring_prompt(constraints: &Constraints) -> String {
    let wanted = (constraints.effective_target_clip_count() * 2).min(MAX_TARGET_CLIP_COUNT as usize);

    format!(
        r#"You are an expert short-form video editor. Watch the attached video and find the moments most likely to perform well as standalone clips on {platforms}.

Return up to {wanted} candidate segments. For each segment provide:
- startTime and endTime in seconds from the start of the video
- score from 0 to 10 for viral potential
- type: a short category tag (e.g. educational, humor, story, controversial, emotional)
- rationale: one or two sentences on why it works
- hooks: up to 3 short opening lines, strongest first
- sentiment: positive, negative, neutral or mixed

Guidelines:
- Favour segments whose first 3 seconds grab attention on their own.
- Penalise long pauses, filler words, and slow setup.
- Each segment should last between {min:.0} and {max:.0} seconds.
- Segments must be self-contained and make sense without the rest of the video.

Also return a plain-text transcript of the video in the "transcript" field."#,
        platforms = constraints.platform_names(),
        wanted = wanted,
        min = constraints.min_duration_seconds,
        max = constraints.max_duration_seconds,
    )
}

/// Response schema bounding the answer to at most 50 segments.
pub fn scoring_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "segments": {
                "type": "ARRAY",
                "maxItems": MAX_TARGET_CLIP_COUNT,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "startTime": { "type": "NUMBER" },
                        "endTime": { "type": "NUMBER" },
                        "score": { "type": "NUMBER" },
                        "type": { "type": "STRING" },
                        "rationale": { "type": "STRING" },
                        "hooks": { "type": "ARRAY", "items": { "type": "STRING" } },
                        "sentiment": {
                            "type": "STRING",
                            "enum": ["positive", "negative", "neutral", "mixed"]
                        }
                    },
                    "required": ["startTime", "endTime", "score", "type", "rationale"]
                }
            },
            "transcript": { "type": "STRING" }
        },
        "required": ["segments"]
    })
}
