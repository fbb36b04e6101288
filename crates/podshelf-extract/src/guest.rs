//! Guest-name extraction from episode titles.
//!
//! Interview podcasts commonly title episodes as
//! `"Topic description | Guest Name (role, company)"`. The name after the
//! pipe, stripped of the trailing parenthetical, is used as the speaker hint
//! passed to the extraction oracle.

use regex::Regex;
use std::sync::OnceLock;

fn parenthetical_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\([^)]*\)\s*$").unwrap())
}

fn with_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:with|w/)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)").unwrap())
}

/// Extract a guest name from an episode title, or empty when none can be
/// determined.
pub fn guest_name_from_title(title: &str) -> String {
    // Pattern 1: everything after a pipe, minus trailing parenthetical.
    if let Some((_, after_pipe)) = title.split_once('|') {
        let name = parenthetical_re().replace(after_pipe.trim(), "");
        let name = name
            .replace("&amp;", "&")
            .replace("&#39;", "'")
            .replace("&quot;", "\"")
            .trim()
            .to_string();
        if name.len() < 100 && name.chars().any(|c| c.is_alphabetic()) {
            return name;
        }
    }

    // Pattern 2: "... with Name" / "... w/ Name".
    if let Some(caps) = with_name_re().captures(title) {
        return caps[1].trim().to_string();
    }

    String::new()
}
