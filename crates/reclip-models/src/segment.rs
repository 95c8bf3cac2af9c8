//! Candidate segments proposed by the scoring oracle.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Overall tone of a segment.
///
/// Tags outside the known set are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
    Mixed,
    Other(String),
}

impl Sentiment {
    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Positive => "positive",
            Sentiment::Negative => "negative",
            Sentiment::Neutral => "neutral",
            Sentiment::Mixed => "mixed",
            Sentiment::Other(tag) => tag,
        }
    }
}

impl From<String> for Sentiment {
    fn from(tag: String) -> Self {
        match tag.trim().to_lowercase().as_str() {
            "positive" => Sentiment::Positive,
            "negative" => Sentiment::Negative,
            "neutral" => Sentiment::Neutral,
            "mixed" => Sentiment::Mixed,
            _ => Sentiment::Other(tag),
        }
    }
}

impl From<Sentiment> for String {
    fn from(sentiment: Sentiment) -> Self {
        match sentiment {
            Sentiment::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl JsonSchema for Sentiment {
    fn schema_name() -> String {
        "Sentiment".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// A proposed time range with its raw 0-10 virality score.
///
/// Lives only for the duration of a single job execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CandidateSegment {
    /// Start offset in seconds
    pub start_time: f64,

    /// End offset in seconds (exclusive)
    pub end_time: f64,

    /// Raw oracle score, 0-10
    pub score: f64,

    /// Free-form category tag (e.g. "educational", "humor")
    #[serde(rename = "type", default)]
    pub segment_type: String,

    /// Why the oracle picked this range
    #[serde(default)]
    pub rationale: String,

    /// Short opening lines, strongest first
    #[serde(default)]
    pub hooks: Vec<String>,

    #[serde(default)]
    pub sentiment: Sentiment,
}

impl CandidateSegment {
    /// Create a segment with empty auxiliary signals.
    pub fn new(start_time: f64, end_time: f64, score: f64) -> Self {
        Self {
            start_time,
            end_time,
            score,
            segment_type: String::new(),
            rationale: String::new(),
            hooks: Vec::new(),
            sentiment: Sentiment::default(),
        }
    }

    pub fn with_type(mut self, segment_type: impl Into<String>) -> Self {
        self.segment_type = segment_type.into();
        self
    }

    pub fn duration(&self) -> f64 {
        self.end_time - self.start_time
    }

    /// Duration as stored on a clip: whole seconds.
    pub fn rounded_duration(&self) -> f64 {
        self.duration().round()
    }

    /// Finite bounds with a positive length.
    pub fn is_well_formed(&self) -> bool {
        self.start_time.is_finite()
            && self.end_time.is_finite()
            && self.score.is_finite()
            && self.start_time >= 0.0
            && self.end_time > self.start_time
    }

    /// Half-open interval intersection: segments that only touch do not overlap.
    pub fn overlaps(&self, other: &CandidateSegment) -> bool {
        self.start_time < other.end_time && other.start_time < self.end_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_is_half_open() {
        let a = CandidateSegment::new(10.0, 40.0, 9.0);
        let b = CandidateSegment::new(20.0, 50.0, 8.0);
        let c = CandidateSegment::new(40.0, 70.0, 8.0);

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        assert!(!a.overlaps(&c));
        assert!(b.overlaps(&c));
    }

    #[test]
    fn test_well_formed() {
        assert!(CandidateSegment::new(0.0, 1.0, 5.0).is_well_formed());
        assert!(!CandidateSegment::new(5.0, 5.0, 5.0).is_well_formed());
        assert!(!CandidateSegment::new(5.0, 2.0, 5.0).is_well_formed());
        assert!(!CandidateSegment::new(f64::NAN, 2.0, 5.0).is_well_formed());
    }

    #[test]
    fn test_deserialize_oracle_shape() {
        let json = r#"{
            "startTime": 12.5,
            "endTime": 40.0,
            "score": 8.7,
            "type": "educational",
            "rationale": "Clear takeaway",
            "hooks": ["Nobody tells you this"],
            "sentiment": "excited"
        }"#;
        let seg: CandidateSegment = serde_json::from_str(json).unwrap();
        assert_eq!(seg.segment_type, "educational");
        assert_eq!(seg.sentiment, Sentiment::Other("excited".to_string()));
        assert_eq!(seg.duration(), 27.5);
    }

    #[test]
    fn test_unknown_sentiment_survives_serialization() {
        let seg: CandidateSegment = serde_json::from_str(
            r#"{"startTime": 0, "endTime": 20, "score": 7, "sentiment": "excited"}"#,
        )
        .unwrap();
        let json = serde_json::to_value(&seg).unwrap();
        assert_eq!(json["sentiment"], "excited");

        let known: Sentiment = serde_json::from_str(r#""Positive""#).unwrap();
        assert_eq!(known, Sentiment::Positive);
        assert_eq!(serde_json::to_string(&known).unwrap(), r#""positive""#);
    }
}
