//! Sentence-boundary-aware transcript chunking.
//!
//! Long transcripts are split into overlapping chunks so each fits the
//! extraction oracle's bounded context. Cut points prefer the rightmost
//! sentence-terminal punctuation (`.`, `?`, `!`) at or before the nominal
//! cut, so recommendations are less likely to straddle a chunk boundary.

use podshelf_core::{Error, Result};

/// Configuration for the transcript chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum size of a chunk in characters.
    pub chunk_size: usize,
    /// Number of characters to overlap between adjacent chunks.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: podshelf_core::defaults::CHUNK_SIZE,
            overlap: podshelf_core::defaults::CHUNK_OVERLAP,
        }
    }
}

/// A text chunk with position information.
///
/// `text` is stored trimmed of surrounding whitespace; `start_offset` /
/// `end_offset` keep the untrimmed positions for coverage accounting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    /// Starting byte offset in the original transcript.
    pub start_offset: usize,
    /// Ending byte offset in the original transcript.
    pub end_offset: usize,
}

impl Chunk {
    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Splits transcripts into overlapping, sentence-boundary-aware chunks.
#[derive(Debug, Clone)]
pub struct TranscriptChunker {
    config: ChunkerConfig,
}

impl TranscriptChunker {
    /// Create a chunker, failing fast on contract violations: overlap must
    /// be strictly smaller than the chunk size to guarantee progress.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(Error::InvalidInput("chunk_size must be positive".into()));
        }
        if config.overlap >= config.chunk_size {
            return Err(Error::InvalidInput(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk the given text. Chunks collectively cover `[0, text.len())`;
    /// adjacent chunks overlap by up to `config.overlap` characters.
    pub fn chunk(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return vec![];
        }

        if text.len() <= self.config.chunk_size {
            return vec![Chunk {
                text: text.trim().to_string(),
                start_offset: 0,
                end_offset: text.len(),
            }];
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let nominal = (start + self.config.chunk_size).min(text.len());
            let mut end = find_char_boundary_before(text, nominal);

            if end < text.len() {
                // Search backward within [start, end) for the rightmost
                // sentence terminator; cut after it if strictly past start.
                if let Some(pos) = text[start..end].rfind(['.', '?', '!']) {
                    if pos > 0 {
                        end = start + pos + 1;
                    }
                }
            }

            chunks.push(Chunk {
                text: text[start..end].trim().to_string(),
                start_offset: start,
                end_offset: end,
            });

            start = if end >= text.len() {
                end
            } else {
                // Guard against zero progress when a boundary lands inside
                // the overlap window.
                end.saturating_sub(self.config.overlap).max(start + 1)
            };
            start = find_char_boundary_after(text, start);
        }

        chunks
    }
}

/// Find a UTF-8 safe boundary at or before the given position.
fn find_char_boundary_before(text: &str, mut pos: usize) -> usize {
    while pos > 0 && !text.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

/// Find a UTF-8 safe boundary at or after the given position.
fn find_char_boundary_after(text: &str, mut pos: usize) -> usize {
    while pos < text.len() && !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(chunk_size: usize, overlap: usize) -> TranscriptChunker {
        TranscriptChunker::new(ChunkerConfig {
            chunk_size,
            overlap,
        })
        .unwrap()
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunker(100, 10).chunk("A short transcript.");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks[0].end_offset, 19);
        assert_eq!(chunks[0].text, "A short transcript.");
    }

    #[test]
    fn test_empty_text_no_chunks() {
        assert!(chunker(100, 10).chunk("").is_empty());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let err = TranscriptChunker::new(ChunkerConfig {
            chunk_size: 100,
            overlap: 100,
        });
        assert!(err.is_err());

        let err = TranscriptChunker::new(ChunkerConfig {
            chunk_size: 100,
            overlap: 150,
        });
        assert!(err.is_err());
    }

    #[test]
    fn test_cuts_at_sentence_boundary() {
        // 40 chars of sentences; chunk size forces a split and the cut
        // should land just after a terminator.
        let text = "One sentence here. Another one follows! And a third?";
        let chunks = chunker(30, 5).chunk(text);
        assert!(chunks.len() > 1);
        assert!(chunks[0].text.ends_with('.'));
        assert_eq!(chunks[0].end_offset, text.find('.').unwrap() + 1);
    }

    #[test]
    fn test_cuts_at_nominal_end_without_punctuation() {
        let text = "a".repeat(250);
        let chunks = chunker(100, 10).chunk(&text);
        assert_eq!(chunks[0].end_offset, 100);
        assert_eq!(chunks[1].start_offset, 90);
    }

    #[test]
    fn test_coverage_no_gaps() {
        // Chunks must cover [0, len) with no gap: each chunk starts at or
        // before the previous chunk's end.
        let mut text = String::new();
        for i in 0..500 {
            text.push_str(&format!("Sentence number {} is right here. ", i));
        }
        let chunks = chunker(1000, 100).chunk(&text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks.last().unwrap().end_offset, text.len());
        for pair in chunks.windows(2) {
            assert!(
                pair[1].start_offset <= pair[0].end_offset,
                "gap between chunk ending at {} and chunk starting at {}",
                pair[0].end_offset,
                pair[1].start_offset
            );
            assert!(pair[1].start_offset > pair[0].start_offset, "no progress");
        }
    }

    #[test]
    fn test_coverage_scenario_250k() {
        // 250k characters with 100k/2k chunking yields 3 chunks whose spans
        // reconstruct the original coverage.
        let mut text = String::new();
        while text.len() < 250_000 {
            text.push_str("The guest strongly recommended a book about focus. ");
        }
        let text = &text[..250_000];
        let chunks = chunker(100_000, 2_000).chunk(text);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].start_offset, 0);
        assert_eq!(chunks.last().unwrap().end_offset, text.len());
    }

    #[test]
    fn test_offsets_account_for_trimming() {
        // Text is trimmed but offsets keep untrimmed positions.
        let text = format!("{}   {}", "x".repeat(98), "y".repeat(60));
        let chunks = chunker(100, 10).chunk(&text);
        assert_eq!(chunks[0].end_offset, 100);
        assert!(chunks[0].text.len() <= 100);
        assert!(!chunks[0].text.ends_with(' '));
    }

    #[test]
    fn test_utf8_boundary_safety() {
        let text = "é".repeat(120); // 2 bytes per char
        let chunks = chunker(101, 10).chunk(&text);
        for c in &chunks {
            assert!(!c.text.is_empty());
        }
        assert_eq!(chunks.last().unwrap().end_offset, text.len());
    }

    #[test]
    fn test_chunks_non_empty() {
        let mut text = String::new();
        for _ in 0..100 {
            text.push_str("Short. ");
        }
        for c in chunker(50, 10).chunk(&text) {
            assert!(!c.is_empty());
        }
    }
}
