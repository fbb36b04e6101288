//! Transcript verification and recommendation extraction.
//!
//! This crate takes a fetched transcript from quality verification through
//! oracle-based mention extraction: gap analysis, single-pass vs. chunked
//! dispatch, prompt construction, response parsing, and cross-chunk
//! deduplication.

pub mod chunking;
pub mod dispatcher;
pub mod guest;
pub mod mock;
pub mod oracle;
pub mod parse;
pub mod prompt;
pub mod verifier;

pub use chunking::{Chunk, ChunkerConfig, TranscriptChunker};
pub use dispatcher::ExtractionDispatcher;
pub use guest::guest_name_from_title;
pub use mock::MockOracle;
pub use oracle::AnthropicOracle;
pub use parse::parse_oracle_response;
pub use verifier::TranscriptVerifier;
