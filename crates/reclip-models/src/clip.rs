//! Clip records and enrichment metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::Sentiment;

/// Timed caption cue relative to the clip start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Caption {
    pub offset_seconds: f64,
    pub text: String,
}

/// A finalized short-form clip, persisted inside the job result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,

    pub title: String,

    pub description: String,

    /// Whole seconds, rounded from `end_time - start_time`
    pub duration: u32,

    /// 0-100 engagement estimate
    pub virality_score: u8,

    pub start_time: f64,

    pub end_time: f64,

    pub segment_type: String,

    #[serde(default)]
    pub hooks: Vec<String>,

    #[serde(default)]
    pub sentiment: Sentiment,

    #[serde(default)]
    pub captions: Vec<Caption>,

    #[serde(default)]
    pub hashtags: Vec<String>,

    /// First-impression line for the opening seconds
    #[serde(default)]
    pub hook_text: String,

    /// Playable content pointer
    pub media_reference: String,
}

/// Metadata produced by the enrichment oracle for one clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipEnrichment {
    pub title: String,
    pub description: String,
    pub hook_text: String,
    #[serde(default)]
    pub captions: Vec<Caption>,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

impl Clip {
    /// Overwrite the synthesized defaults with oracle-provided metadata.
    pub fn apply_enrichment(mut self, enrichment: ClipEnrichment) -> Self {
        self.title = enrichment.title;
        self.description = enrichment.description;
        self.hook_text = enrichment.hook_text;
        self.captions = enrichment.captions;
        self.hashtags = enrichment.hashtags;
        self
    }

    /// Exact clip length in seconds.
    pub fn span_seconds(&self) -> f64 {
        self.end_time - self.start_time
    }
}
