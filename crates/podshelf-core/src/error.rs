//! Error types for podshelf.

use thiserror::Error;

/// Result type alias using podshelf's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for podshelf operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Episode not found
    #[error("Episode not found: {0}")]
    EpisodeNotFound(uuid::Uuid),

    /// Transcript could not be fetched for an episode
    #[error("Transcript unavailable: {0}")]
    TranscriptUnavailable(String),

    /// The source reports transcripts are disabled for this episode
    #[error("Transcripts disabled: {0}")]
    TranscriptsDisabled(String),

    /// Extraction oracle call failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Enrichment provider call failed
    #[error("Enrichment error: {0}")]
    Enrichment(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
