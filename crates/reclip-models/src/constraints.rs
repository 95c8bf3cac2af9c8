//! Caller-supplied selection constraints.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

/// Hard upper bound on clips produced by a single job.
pub const MAX_TARGET_CLIP_COUNT: u32 = 50;

/// Target short-form platform. Only affects enrichment formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    YoutubeShorts,
    InstagramReels,
    X,
    Linkedin,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::YoutubeShorts => "youtube_shorts",
            Platform::InstagramReels => "instagram_reels",
            Platform::X => "x",
            Platform::Linkedin => "linkedin",
        }
    }

    /// Human-readable name used in oracle prompts.
    pub fn display_name(&self) -> &'static str {
        match self {
            Platform::Tiktok => "TikTok",
            Platform::YoutubeShorts => "YouTube Shorts",
            Platform::InstagramReels => "Instagram Reels",
            Platform::X => "X",
            Platform::Linkedin => "LinkedIn",
        }
    }
}

/// Configuration that drives segment selection.
///
/// Every field is optional on the wire and falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
#[serde(rename_all = "camelCase", default)]
#[validate(schema(function = "validate_duration_bounds"))]
pub struct Constraints {
    /// Number of clips to aim for (capped at 50)
    #[validate(range(min = 1))]
    pub target_clip_count: u32,

    /// Shortest acceptable clip, in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub min_duration_seconds: f64,

    /// Longest acceptable clip, in seconds
    #[validate(range(exclusive_min = 0.0))]
    pub max_duration_seconds: f64,

    /// Minimum virality on the 0-100 scale
    #[validate(range(min = 0.0, max = 100.0))]
    pub virality_threshold: f64,

    /// Reject clips that share video time with a better pick
    pub overlap_prevention: bool,

    /// Platforms the clips are formatted for
    pub target_platforms: Vec<Platform>,
}

impl Default for Constraints {
    fn default() -> Self {
        Self {
            target_clip_count: 10,
            min_duration_seconds: 15.0,
            max_duration_seconds: 60.0,
            virality_threshold: 70.0,
            overlap_prevention: true,
            target_platforms: vec![
                Platform::Tiktok,
                Platform::YoutubeShorts,
                Platform::InstagramReels,
            ],
        }
    }
}

impl Constraints {
    /// Target count with the hard cap applied.
    pub fn effective_target_clip_count(&self) -> usize {
        self.target_clip_count.min(MAX_TARGET_CLIP_COUNT) as usize
    }

    /// Threshold expressed on the oracle's 0-10 score scale.
    pub fn score_threshold(&self) -> f64 {
        self.virality_threshold / 10.0
    }

    /// Whether a duration lies inside the inclusive bounds.
    pub fn accepts_duration(&self, duration_seconds: f64) -> bool {
        duration_seconds >= self.min_duration_seconds && duration_seconds <= self.max_duration_seconds
    }

    /// Comma-separated platform names for prompts.
    pub fn platform_names(&self) -> String {
        self.target_platforms
            .iter()
            .map(|p| p.display_name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn validate_duration_bounds(constraints: &Constraints) -> Result<(), ValidationError> {
    if constraints.min_duration_seconds > constraints.max_duration_seconds {
        let mut err = ValidationError::new("duration_bounds");
        err.message = Some("minDurationSeconds must not exceed maxDurationSeconds".into());
        return Err(err);
    }
    Ok(())
}
