//! Turns selected segments into clip records.

use uuid::Uuid;

use reclip_models::{CandidateSegment, Clip};

/// Build one unenriched clip per segment, preserving order.
///
/// Title and description are placeholders that enrichment overwrites.
pub fn synthesize(segments: &[CandidateSegment], media_reference: &str) -> Vec<Clip> {
    segments
        .iter()
        .enumerate()
        .map(|(index, segment)| {
            let segment_type = if segment.segment_type.trim().is_empty() {
                "highlight".to_string()
            } else {
                segment.segment_type.clone()
            };

            Clip {
                id: Uuid::new_v4().to_string(),
                title: format!("Clip {}: {}", index + 1, segment_type),
                description: segment.rationale.clone(),
                duration: segment.rounded_duration().max(0.0) as u32,
                virality_score: (segment.score * 10.0).round().clamp(0.0, 100.0) as u8,
                start_time: segment.start_time,
                end_time: segment.end_time,
                segment_type,
                hooks: segment.hooks.clone(),
                sentiment: segment.sentiment.clone(),
                captions: Vec::new(),
                hashtags: Vec::new(),
                hook_text: segment.hooks.first().cloned().unwrap_or_default(),
                media_reference: media_reference.to_string(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_fields() {
        let mut segment = CandidateSegment::new(10.0, 40.0, 9.2).with_type("educational");
        segment.rationale = "Clear takeaway".to_string();
        segment.hooks = vec!["Nobody tells you this".to_string(), "Second".to_string()];

        let clips = synthesize(&[segment], "https://example.com/v.mp4");
        let clip = &clips[0];

        assert_eq!(clip.duration, 30);
        assert_eq!(clip.virality_score, 92);
        assert_eq!(clip.title, "Clip 1: educational");
        assert_eq!(clip.description, "Clear takeaway");
        assert_eq!(clip.hook_text, "Nobody tells you this");
        assert_eq!(clip.media_reference, "https://example.com/v.mp4");
        assert!(clip.captions.is_empty());
    }

    #[test]
    fn test_rounding_and_clamping() {
        let clips = synthesize(
            &[
                CandidateSegment::new(0.0, 15.4, 10.7),
                CandidateSegment::new(0.0, 15.6, -0.3),
            ],
            "ref",
        );
        assert_eq!(clips[0].duration, 15);
        assert_eq!(clips[0].virality_score, 100);
        assert_eq!(clips[1].duration, 16);
        assert_eq!(clips[1].virality_score, 0);
        assert_eq!(clips[1].title, "Clip 2: highlight");
    }

    #[test]
    fn test_ids_are_unique() {
        let segments = vec![CandidateSegment::new(0.0, 20.0, 8.0); 3];
        let clips = synthesize(&segments, "ref");
        assert_ne!(clips[0].id, clips[1].id);
        assert_ne!(clips[1].id, clips[2].id);
    }
}
