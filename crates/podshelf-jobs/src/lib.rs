//! Episode processing pipeline and polling worker for podshelf.
//!
//! [`pipeline::EpisodeProcessor`] runs one claimed episode through
//! fetch, verification, extraction, enrichment, and persistence;
//! [`worker::EpisodeWorker`] polls for pending episodes and drives the
//! processor one episode at a time.

pub mod pipeline;
pub mod testing;
pub mod transcripts;
pub mod worker;

pub use pipeline::{EpisodeProcessor, ProcessOutcome};
pub use transcripts::HttpTranscriptSource;
pub use worker::{EpisodeWorker, WorkerConfig, WorkerHandle};
