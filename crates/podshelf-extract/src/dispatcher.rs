//! Extraction dispatch: single-pass vs. chunked oracle invocation.
//!
//! Transcripts under the single-pass threshold go to the oracle in one call
//! (better context, cheaper). Longer transcripts are chunked and processed
//! with one sequential oracle call per chunk; no parallel fan-out, to
//! respect oracle rate limits and keep cost and ordering deterministic.

use std::collections::HashSet;

use tracing::{error, info, warn};

use podshelf_core::{
    ChunkSpan, ExtractedMention, ExtractionOracle, PipelineConfig, ProcessingMode, ProcessingRun,
    Result,
};

use crate::chunking::{Chunk, ChunkerConfig, TranscriptChunker};
use crate::parse::parse_oracle_response;
use crate::prompt::{system_prompt, user_prompt};

/// Dispatches a transcript to the extraction oracle and merges the results.
pub struct ExtractionDispatcher<'a> {
    oracle: &'a dyn ExtractionOracle,
    config: &'a PipelineConfig,
}

impl<'a> ExtractionDispatcher<'a> {
    pub fn new(oracle: &'a dyn ExtractionOracle, config: &'a PipelineConfig) -> Self {
        Self { oracle, config }
    }

    /// Extract recommendation mentions from a transcript.
    ///
    /// A failing oracle call never aborts the episode: its mention list is
    /// treated as empty and the remaining chunks still run. The caller
    /// decides from the returned counts whether to mark the episode failed.
    pub async fn extract(
        &self,
        transcript: &str,
        episode_title: &str,
        speaker_hint: &str,
    ) -> Result<(Vec<ExtractedMention>, ProcessingRun)> {
        let transcript_length = transcript.len();
        info!(
            chars = transcript_length,
            threshold = self.config.single_pass_threshold,
            "extraction dispatch"
        );

        if transcript_length < self.config.single_pass_threshold {
            return self
                .extract_single_pass(transcript, episode_title, speaker_hint)
                .await;
        }

        let chunker = TranscriptChunker::new(ChunkerConfig {
            chunk_size: self.config.chunk_size,
            overlap: self.config.chunk_overlap,
        })?;
        let chunks = chunker.chunk(transcript);
        info!(chunk_count = chunks.len(), "using chunked extraction");

        self.extract_chunked(transcript, &chunks, episode_title, speaker_hint)
            .await
    }

    async fn extract_single_pass(
        &self,
        transcript: &str,
        episode_title: &str,
        speaker_hint: &str,
    ) -> Result<(Vec<ExtractedMention>, ProcessingRun)> {
        let mentions = self
            .call_oracle(transcript, episode_title, speaker_hint)
            .await;
        let found = mentions.len();
        info!(mention_count = found, "single-pass extraction complete");

        let run = ProcessingRun {
            mode: ProcessingMode::SinglePass,
            total_chunks: 1,
            total_characters_sent: transcript.len(),
            first_chunk_position: 0,
            last_chunk_position: 0,
            chunks: vec![ChunkSpan {
                chunk: 1,
                start: 0,
                end: transcript.len(),
                length: transcript.len(),
            }],
            total_mentions_found: found,
            unique_mentions: found,
        };
        Ok((mentions, run))
    }

    async fn extract_chunked(
        &self,
        transcript: &str,
        chunks: &[Chunk],
        episode_title: &str,
        speaker_hint: &str,
    ) -> Result<(Vec<ExtractedMention>, ProcessingRun)> {
        let mut all_mentions = Vec::new();
        let mut spans = Vec::with_capacity(chunks.len());

        for (i, chunk) in chunks.iter().enumerate() {
            info!(
                chunk = i + 1,
                total = chunks.len(),
                start = chunk.start_offset,
                end = chunk.end_offset,
                chars = chunk.len(),
                "processing chunk"
            );

            // Same title and speaker hint on every chunk: the oracle has no
            // cross-chunk memory.
            let mentions = self
                .call_oracle(&chunk.text, episode_title, speaker_hint)
                .await;
            info!(chunk = i + 1, mention_count = mentions.len(), "chunk done");

            all_mentions.extend(mentions);
            spans.push(ChunkSpan {
                chunk: i + 1,
                start: chunk.start_offset,
                end: chunk.end_offset,
                length: chunk.len(),
            });
        }

        let total_found = all_mentions.len();
        let unique = dedup_by_title(all_mentions);

        let total_characters_sent: usize = spans.iter().map(|s| s.length).sum();
        let first_position = spans.first().map(|s| s.start).unwrap_or(0);
        let last_position = spans.last().map(|s| s.start).unwrap_or(0);
        let last_end = spans.last().map(|s| s.end).unwrap_or(0);

        // Coverage assertion: chunk spans must reconstruct the transcript.
        // Surfaced in metadata, never silently corrected.
        if first_position != 0 || last_end != transcript.len() {
            error!(
                first_position,
                last_end,
                transcript_len = transcript.len(),
                "chunk spans do not cover the transcript"
            );
        }

        info!(
            total_chunks = spans.len(),
            chars_sent = total_characters_sent,
            mention_count = total_found,
            unique_mentions = unique.len(),
            "chunked extraction complete"
        );

        let run = ProcessingRun {
            mode: ProcessingMode::Chunked,
            total_chunks: spans.len(),
            total_characters_sent,
            first_chunk_position: first_position,
            last_chunk_position: last_position,
            chunks: spans,
            total_mentions_found: total_found,
            unique_mentions: unique.len(),
        };
        Ok((unique, run))
    }

    /// One oracle call. Provider failures and unparseable responses both
    /// yield an empty mention list for this call, logged with context.
    async fn call_oracle(
        &self,
        chunk_text: &str,
        episode_title: &str,
        speaker_hint: &str,
    ) -> Vec<ExtractedMention> {
        let system = system_prompt();
        let prompt = user_prompt(
            chunk_text,
            episode_title,
            speaker_hint,
            self.config.host_name.as_deref(),
        );

        let response = match self.oracle.complete(&system, &prompt).await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "oracle call failed, treating as empty");
                return Vec::new();
            }
        };

        match parse_oracle_response(&response) {
            Ok(mentions) => mentions,
            Err(e) => {
                warn!(
                    error = %e,
                    raw_response = %response,
                    "oracle response was not valid JSON, treating as empty"
                );
                Vec::new()
            }
        }
    }
}

/// Deduplicate mentions by lower-cased, trimmed title; first occurrence
/// wins. Intentionally title-only (not title+author): the oracle spells
/// authors inconsistently across chunks, and downstream acceptance scoring
/// was tuned against this policy.
fn dedup_by_title(mentions: Vec<ExtractedMention>) -> Vec<ExtractedMention> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut unique = Vec::new();
    for mention in mentions {
        let key = mention.title.trim().to_lowercase();
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            unique.push(mention);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockOracle;
    use podshelf_core::RecommendationKind;

    fn mention_json(title: &str, author: &str) -> String {
        format!(
            r#"{{"recommendations":[{{"type":"book","title":"{title}","author_creator":"{author}","confidence":0.9,"recommended_by":"Jane Doe"}}]}}"#
        )
    }

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    #[tokio::test]
    async fn test_single_pass_under_threshold() {
        let oracle = MockOracle::new().with_default_response(mention_json("Deep Work", "Cal Newport"));
        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let transcript = "a".repeat(50_000);
        let (mentions, run) = dispatcher.extract(&transcript, "Ep", "Jane").await.unwrap();

        assert_eq!(run.mode, ProcessingMode::SinglePass);
        assert_eq!(run.total_chunks, 1);
        assert_eq!(run.total_characters_sent, 50_000);
        assert_eq!(mentions.len(), 1);
        assert_eq!(oracle.call_count(), 1);
    }

    #[tokio::test]
    async fn test_chunked_over_threshold() {
        let oracle = MockOracle::new();
        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let mut transcript = String::new();
        while transcript.len() < 250_000 {
            transcript.push_str("The guest recommended a wonderful book about habits. ");
        }
        transcript.truncate(250_000);

        let (_, run) = dispatcher.extract(&transcript, "Ep", "Jane").await.unwrap();

        assert_eq!(run.mode, ProcessingMode::Chunked);
        assert_eq!(run.total_chunks, 3);
        assert_eq!(oracle.call_count(), 3);
        assert_eq!(run.first_chunk_position, 0);
        assert_eq!(run.chunks.last().unwrap().end, 250_000);
        assert_eq!(
            run.total_characters_sent,
            run.chunks.iter().map(|c| c.length).sum::<usize>()
        );
    }

    #[tokio::test]
    async fn test_cross_chunk_dedup_title_only_first_wins() {
        let oracle = MockOracle::new();
        // Same title in two chunks, authors spelled differently; the first
        // occurrence wins.
        oracle.push_response(mention_json("Atomic Habits", "James Clear"));
        oracle.push_response(mention_json("atomic habits ", "J. Clear"));
        oracle.push_response(mention_json("The Lean Startup", "Eric Ries"));

        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let mut transcript = String::new();
        while transcript.len() < 250_000 {
            transcript.push_str("Filler sentence for the transcript body here. ");
        }
        transcript.truncate(250_000);

        let (mentions, run) = dispatcher.extract(&transcript, "Ep", "").await.unwrap();
        assert_eq!(run.total_mentions_found, 3);
        assert_eq!(run.unique_mentions, 2);
        assert_eq!(mentions.len(), 2);
        assert_eq!(mentions[0].author_creator.as_deref(), Some("James Clear"));
    }

    #[tokio::test]
    async fn test_failed_chunk_does_not_abort_remaining() {
        let oracle = MockOracle::new();
        oracle.push_failure("provider error");
        oracle.push_response(mention_json("Deep Work", "Cal Newport"));

        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let mut transcript = String::new();
        while transcript.len() < 150_000 {
            transcript.push_str("Plenty of sentences in this long transcript. ");
        }
        transcript.truncate(150_000);

        let (mentions, run) = dispatcher.extract(&transcript, "Ep", "").await.unwrap();
        assert_eq!(run.total_chunks, 2);
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].title, "Deep Work");
    }

    #[tokio::test]
    async fn test_single_pass_oracle_failure_yields_empty() {
        let oracle = MockOracle::new();
        oracle.push_failure("totally down");

        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let (mentions, run) = dispatcher.extract("short transcript", "Ep", "").await.unwrap();
        assert!(mentions.is_empty());
        assert_eq!(run.total_mentions_found, 0);
    }

    #[tokio::test]
    async fn test_garbage_response_yields_empty() {
        let oracle = MockOracle::new().with_default_response("Sorry, I can't help with that.");
        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let (mentions, _) = dispatcher.extract("short transcript", "Ep", "").await.unwrap();
        assert!(mentions.is_empty());
    }

    #[tokio::test]
    async fn test_code_fenced_response_tolerated() {
        let fenced = format!("```json\n{}\n```", mention_json("Deep Work", "Cal Newport"));
        let oracle = MockOracle::new().with_default_response(fenced);
        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let (mentions, _) = dispatcher.extract("short transcript", "Ep", "").await.unwrap();
        assert_eq!(mentions.len(), 1);
        assert_eq!(mentions[0].kind, RecommendationKind::Book);
    }

    #[tokio::test]
    async fn test_prompt_carries_title_and_hint_to_every_chunk() {
        let oracle = MockOracle::new();
        let config = config();
        let dispatcher = ExtractionDispatcher::new(&oracle, &config);

        let mut transcript = String::new();
        while transcript.len() < 150_000 {
            transcript.push_str("Some sentences. ");
        }
        transcript.truncate(150_000);

        dispatcher
            .extract(&transcript, "My Episode", "Jane Doe")
            .await
            .unwrap();

        for call in oracle.calls() {
            assert!(call.prompt.contains("My Episode"));
            assert!(call.prompt.contains("Jane Doe"));
        }
    }
}
