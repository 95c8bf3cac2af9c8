//! Best-effort per-clip metadata enrichment.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use serde_json::{json, Value};
use tracing::{debug, warn};

use reclip_gemini::{GeminiClient, Part};
use reclip_models::{Caption, Clip, ClipEnrichment, Platform};

use crate::error::{WorkerError, WorkerResult};

pub const MAX_TITLE_CHARS: usize = 60;
pub const MAX_CAPTIONS: usize = 5;
pub const MAX_HASHTAGS: usize = 10;

/// Transcript excerpts longer than this are cut before prompting.
const MAX_TRANSCRIPT_CHARS: usize = 20_000;

/// Job-wide inputs shared by every enrichment call.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentContext {
    pub platforms: Vec<Platform>,
    pub transcript: Option<String>,
}

/// Produces title, description, captions and hashtags for one clip.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClipEnricher: Send + Sync {
    async fn enrich(&self, clip: &Clip, context: &EnrichmentContext) -> WorkerResult<ClipEnrichment>;
}

/// Enriched clips plus the number of clips that kept their defaults.
#[derive(Debug, Clone)]
pub struct EnrichmentOutcome {
    pub clips: Vec<Clip>,
    pub failures: usize,
}

/// Enrich every clip concurrently.
///
/// A failed call leaves that clip unchanged. Output order matches input order.
pub async fn enrich_all(
    enricher: &dyn ClipEnricher,
    clips: Vec<Clip>,
    context: &EnrichmentContext,
) -> EnrichmentOutcome {
    let results: Vec<WorkerResult<ClipEnrichment>> =
        join_all(clips.iter().map(|clip| enricher.enrich(clip, context))).await;

    let mut failures = 0;
    let clips = clips
        .into_iter()
        .zip(results)
        .map(|(clip, result)| {
            match result.and_then(|e| normalize_enrichment(e, clip.span_seconds())) {
                Ok(enrichment) => clip.apply_enrichment(enrichment),
                Err(e) => {
                    failures += 1;
                    warn!(clip_id = %clip.id, "Enrichment failed, keeping defaults: {}", e);
                    clip
                }
            }
        })
        .collect();

    EnrichmentOutcome { clips, failures }
}

/// Bound oracle output to the clip record's limits.
pub fn normalize_enrichment(
    enrichment: ClipEnrichment,
    clip_span_seconds: f64,
) -> WorkerResult<ClipEnrichment> {
    let title: String = enrichment.title.trim().chars().take(MAX_TITLE_CHARS).collect();
    let title = title.trim_end().to_string();
    if title.is_empty() {
        return Err(WorkerError::enrichment_failed("empty title"));
    }

    let span = clip_span_seconds.max(0.0);
    let captions = enrichment
        .captions
        .into_iter()
        .filter(|c| !c.text.trim().is_empty())
        .take(MAX_CAPTIONS)
        .map(|c| Caption {
            offset_seconds: if c.offset_seconds.is_finite() {
                c.offset_seconds.clamp(0.0, span)
            } else {
                0.0
            },
            text: c.text.trim().to_string(),
        })
        .collect();

    let hashtags = enrichment
        .hashtags
        .iter()
        .map(|h| h.trim().trim_start_matches('#'))
        .filter(|h| !h.is_empty())
        .take(MAX_HASHTAGS)
        .map(|h| format!("#{}", h.replace(char::is_whitespace, "")))
        .collect();

    Ok(ClipEnrichment {
        title,
        description: enrichment.description.trim().to_string(),
        hook_text: enrichment.hook_text.trim().to_string(),
        captions,
        hashtags,
    })
}

pub struct GeminiEnricher {
    gemini: Arc<GeminiClient>,
}

impl GeminiEnricher {
    pub fn new(gemini: Arc<GeminiClient>) -> Self {
        Self { gemini }
    }
}

#[async_trait]
impl ClipEnricher for GeminiEnricher {
    async fn enrich(&self, clip: &Clip, context: &EnrichmentContext) -> WorkerResult<ClipEnrichment> {
        debug!(clip_id = %clip.id, "Requesting clip enrichment");

        self.gemini
            .generate_json(
                vec![Part::text(build_enrichment_prompt(clip, context))],
                Some(enrichment_schema()),
            )
            .await
            .map_err(|e| WorkerError::enrichment_failed(e.to_string()))
    }
}

pub fn build_enrichment_prompt(clip: &Clip, context: &EnrichmentContext) -> String {
    let platforms = if context.platforms.is_empty() {
        "short-form video platforms".to_string()
    } else {
        context
            .platforms
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    };

    let transcript = match &context.transcript {
        Some(t) => {
            let excerpt: String = t.chars().take(MAX_TRANSCRIPT_CHARS).collect();
            format!("\nFull video transcript (for context):\n{}\n", excerpt)
        }
        None => String::new(),
    };

    format!(
        r#"Write publishing metadata for a short clip cut from a longer video, for {platforms}.

Clip: {start:.1}s to {end:.1}s ({duration}s), category "{category}".
Why it was picked: {rationale}
Candidate hooks: {hooks}
{transcript}
Return:
- title: attention-grabbing, at most {max_title} characters
- description: one or two sentences with relevant hashtags embedded
- hookText: the line shown during the first 3 seconds
- captions: up to {max_captions} caption cues, each with offsetSeconds from the clip start and text
- hashtags: up to {max_hashtags} hashtags"#,
        platforms = platforms,
        start = clip.start_time,
        end = clip.end_time,
        duration = clip.duration,
        category = clip.segment_type,
        rationale = clip.description,
        hooks = if clip.hooks.is_empty() {
            "none".to_string()
        } else {
            clip.hooks.join(" | ")
        },
        transcript = transcript,
        max_title = MAX_TITLE_CHARS,
        max_captions = MAX_CAPTIONS,
        max_hashtags = MAX_HASHTAGS,
    )
}

pub fn enrichment_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "hookText": { "type": "STRING" },
            "captions": {
                "type": "ARRAY",
                "maxItems": MAX_CAPTIONS,
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "offsetSeconds": { "type": "NUMBER" },
                        "text": { "type": "STRING" }
                    },
                    "required": ["offsetSeconds", "text"]
                }
            },
            "hashtags": {
                "type": "ARRAY",
                "maxItems": MAX_HASHTAGS,
                "items": { "type": "STRING" }
            }
        },
        "required": ["title", "description", "hookText"]
    })
}
