//! Candidate filtering, ranking and overlap resolution.

use std::cmp::Ordering;

use reclip_models::{CandidateSegment, Constraints};

fn by_score_desc(a: &CandidateSegment, b: &CandidateSegment) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Pick the segments to turn into clips.
///
/// Drops candidates below the score threshold or whose whole-second duration
/// falls outside the duration bounds, ranks by score, truncates to the target
/// count, then (when overlap prevention is on) keeps first-fit intervals in
/// start-time order. Output is ordered by score, highest first. Sorts are
/// stable, so ties keep scorer order.
pub fn select(candidates: &[CandidateSegment], constraints: &Constraints) -> Vec<CandidateSegment> {
    let threshold = constraints.score_threshold();

    let mut ranked: Vec<CandidateSegment> = candidates
        .iter()
        .filter(|c| c.is_well_formed())
        .filter(|c| c.score >= threshold)
        .filter(|c| constraints.accepts_duration(c.rounded_duration()))
        .cloned()
        .collect();

    ranked.sort_by(by_score_desc);
    ranked.truncate(constraints.effective_target_clip_count());

    if !constraints.overlap_prevention {
        return ranked;
    }

    // Greedy first-fit by start time; not guaranteed to maximise total score.
    ranked.sort_by(|a, b| a.start_time.total_cmp(&b.start_time));

    let mut kept: Vec<CandidateSegment> = Vec::with_capacity(ranked.len());
    for candidate in ranked {
        if kept.iter().all(|k| !k.overlaps(&candidate)) {
            kept.push(candidate);
        }
    }

    kept.sort_by(by_score_desc);
    kept
}
