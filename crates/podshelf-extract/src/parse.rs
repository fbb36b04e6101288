//! Oracle response parsing.
//!
//! The oracle is asked for bare JSON but in practice wraps responses in
//! markdown code fences often enough that parsing must tolerate them.

use serde::Deserialize;

use podshelf_core::{ExtractedMention, Result};

#[derive(Debug, Deserialize)]
struct OracleDocument {
    #[serde(default)]
    recommendations: Vec<ExtractedMention>,
}

/// Strip a wrapping markdown code fence (with or without a `json` language
/// tag) from a response, if present.
pub fn strip_code_fences(response: &str) -> &str {
    let mut text = response.trim();
    if let Some(rest) = text.strip_prefix("```json") {
        text = rest;
    } else if let Some(rest) = text.strip_prefix("```") {
        text = rest;
    }
    if let Some(rest) = text.strip_suffix("```") {
        text = rest;
    }
    text.trim()
}

/// Parse an oracle response into its mention list.
///
/// Returns `Error::Serialization` when the (fence-stripped) text is not the
/// expected JSON document; callers convert that into an empty mention list
/// for the failing call and log the raw response.
pub fn parse_oracle_response(response: &str) -> Result<Vec<ExtractedMention>> {
    let text = strip_code_fences(response);
    let doc: OracleDocument = serde_json::from_str(text)?;
    Ok(doc.recommendations)
}
