//! Transcript completeness verification.
//!
//! Validates a fetched transcript against the authoritative video duration
//! (when known) and derives the quality metrics stored on the episode row:
//! coverage span, gap list, and the completeness flag.

use tracing::{info, warn};

use podshelf_core::defaults::{
    COMPLETE_MAX_GAP_RATIO, COMPLETE_MIN_CHARS, COMPLETE_MIN_SEGMENTS, GAP_TOLERANCE_SECS,
    MAX_STORED_GAPS,
};
use podshelf_core::{Error, Result, Transcript, TranscriptGap, TranscriptQualityReport};

/// Computes a [`TranscriptQualityReport`] for a fetched transcript.
#[derive(Debug, Clone, Default)]
pub struct TranscriptVerifier;

impl TranscriptVerifier {
    pub fn new() -> Self {
        Self
    }

    /// Verify a transcript, optionally against an external duration signal.
    ///
    /// A transcript with zero segments is a fetch failure, not a quality
    /// report; it returns `Error::TranscriptUnavailable`.
    pub fn verify(
        &self,
        transcript: &Transcript,
        video_duration_seconds: Option<u32>,
    ) -> Result<TranscriptQualityReport> {
        let segments = transcript.segments();
        if segments.is_empty() {
            return Err(Error::TranscriptUnavailable(
                "no transcript segments".into(),
            ));
        }

        let total_segments = segments.len();
        let first = &segments[0];
        let last = &segments[total_segments - 1];

        let start_time = first.start;
        let end_time = last.start + last.duration;
        let duration_covered = end_time - start_time;

        let character_count = transcript.char_count();
        let word_count = transcript.word_count();

        // A gap exists where the next segment starts more than the tolerance
        // after the previous one ends.
        let mut gaps = Vec::new();
        for (i, pair) in segments.windows(2).enumerate() {
            let current_end = pair[0].start + pair[0].duration;
            let gap = pair[1].start - current_end;
            if gap > GAP_TOLERANCE_SECS {
                gaps.push(TranscriptGap {
                    position: i,
                    gap_seconds: round2(gap),
                    time: round2(current_end),
                });
            }
        }
        let gaps_detected = gaps.len();

        // Never fabricate a duration: coverage percent is only computed when
        // the external source supplied one.
        let coverage_percent = video_duration_seconds
            .filter(|&d| d > 0)
            .map(|d| round1(duration_covered / d as f64 * 100.0));

        let is_complete = total_segments > COMPLETE_MIN_SEGMENTS
            && character_count > COMPLETE_MIN_CHARS
            && (gaps_detected as f64) < total_segments as f64 * COMPLETE_MAX_GAP_RATIO;

        info!(
            total_segments,
            character_count,
            word_count,
            gaps_detected,
            coverage_percent = ?coverage_percent,
            is_complete,
            "transcript verified"
        );
        if let Some(pct) = coverage_percent {
            if pct < 95.0 {
                warn!(coverage_percent = pct, "transcript covers <95% of video");
            }
        }
        if !is_complete {
            warn!("transcript may be incomplete");
        }

        gaps.truncate(MAX_STORED_GAPS);

        Ok(TranscriptQualityReport {
            total_segments,
            character_count,
            word_count,
            start_time: round2(start_time),
            end_time: round2(end_time),
            duration_covered_seconds: round2(duration_covered),
            video_duration_seconds,
            coverage_percent,
            gaps_detected,
            is_complete,
            gaps,
        })
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn round1(v: f64) -> f64 {
    (v * 10.0).round() / 10.0
}
