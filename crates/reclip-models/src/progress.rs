//! Coarse progress checkpoints written as each pipeline stage completes.

use serde::{Deserialize, Serialize};

/// Fixed progress milestones, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressMilestone {
    /// Job picked up by the executor
    Started,
    /// Source media is available to the oracle
    Ingested,
    /// Candidate segments returned by the scorer
    Scored,
    /// Selection and clip synthesis finished
    Synthesized,
    /// All enrichment calls resolved
    Enriched,
    /// Result persisted, job completed
    Persisted,
}

impl ProgressMilestone {
    /// Progress percentage reported at this milestone.
    pub fn percent(&self) -> u8 {
        match self {
            ProgressMilestone::Started => 5,
            ProgressMilestone::Ingested => 20,
            ProgressMilestone::Scored => 50,
            ProgressMilestone::Synthesized => 60,
            ProgressMilestone::Enriched => 90,
            ProgressMilestone::Persisted => 100,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ProgressMilestone::Started => "started",
            ProgressMilestone::Ingested => "ingested",
            ProgressMilestone::Scored => "scored",
            ProgressMilestone::Synthesized => "synthesized",
            ProgressMilestone::Enriched => "enriched",
            ProgressMilestone::Persisted => "persisted",
        }
    }
}

impl std::fmt::Display for ProgressMilestone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_milestones_are_increasing() {
        let all = [
            ProgressMilestone::Started,
            ProgressMilestone::Ingested,
            ProgressMilestone::Scored,
            ProgressMilestone::Synthesized,
            ProgressMilestone::Enriched,
            ProgressMilestone::Persisted,
        ];
        for pair in all.windows(2) {
            assert!(pair[0].percent() < pair[1].percent());
        }
        assert_eq!(ProgressMilestone::Persisted.percent(), 100);
    }
}
