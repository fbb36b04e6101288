//! Prompt construction for the extraction oracle.
//!
//! Every chunk of an episode gets the same episode title and speaker hint:
//! the oracle has no cross-chunk memory, so each call must carry full
//! context.

/// System instructions for the extraction oracle.
pub fn system_prompt() -> String {
    "You are an expert at analyzing podcast transcripts and extracting recommendations.\n\
Your task is to identify when a podcast guest or host explicitly recommends books, movies, \
TV shows, products, apps, or other resources.\n\
\n\
Focus on clear recommendations, not just casual mentions. Look for phrases like:\n\
- \"I highly recommend...\"\n\
- \"You should check out...\"\n\
- \"My favorite book is...\"\n\
- \"This changed my life...\"\n\
- \"I use [product] every day...\"\n\
\n\
CRITICAL: You MUST return ONLY valid JSON. Do NOT include any explanatory text, markdown, \
or commentary. Your entire response must be parseable JSON starting with { and ending with }."
        .to_string()
}

/// User prompt for one transcript chunk.
///
/// `speaker_hint` is the guest name when one could be determined from the
/// episode title; `host_name` attributes host recommendations when known.
pub fn user_prompt(
    transcript_chunk: &str,
    episode_title: &str,
    speaker_hint: &str,
    host_name: Option<&str>,
) -> String {
    let guest_line = if speaker_hint.is_empty() {
        "To be determined from transcript".to_string()
    } else {
        speaker_hint.to_string()
    };
    let host_instruction = match host_name {
        Some(name) => format!(
            "If the host recommended it, use '{}' (the host's name).",
            name
        ),
        None => "If the host recommended it, use the host's real name from the transcript."
            .to_string(),
    };

    format!(
        "Analyze the following podcast transcript and extract all recommendations.\n\
\n\
Episode Title: {episode_title}\n\
Guest Name (from title): {guest_line}\n\
\n\
Transcript:\n\
{transcript_chunk}\n\
\n\
CRITICAL INSTRUCTIONS FOR GUEST NAME EXTRACTION:\n\
1. The guest name is provided above from the episode title. USE IT for all recommendations.\n\
2. If the guest name above is empty, look at the beginning of the transcript for introductions \
(\"Hi, I'm [Full Name]\", \"My name is [Full Name]\", \"Today's guest is [Full Name]\").\n\
3. Extract the FULL NAME (first and last name), not just first name.\n\
4. NEVER use placeholder names like \"Guest 1\", \"Guest 2\", \"Host\", \"Guest\".\n\
5. If you cannot determine a real full name, use \"Unknown\" and mark confidence as low.\n\
\n\
For each recommendation found, return a JSON object with:\n\
{{\n\
  \"recommendations\": [\n\
    {{\n\
      \"type\": \"book|movie|tv_show|podcast|product|app|website|course|other\",\n\
      \"title\": \"exact title mentioned (not 'this book' or 'that movie')\",\n\
      \"author_creator\": \"author or creator if mentioned (not 'not mentioned')\",\n\
      \"context\": \"1-2 sentence summary of why it was recommended\",\n\
      \"quote\": \"direct quote from transcript showing the recommendation\",\n\
      \"confidence\": 0.0-1.0,\n\
      \"recommended_by\": \"Use the guest name from above. {host_instruction} NEVER use 'Guest 1', 'Host', etc.\"\n\
    }}\n\
  ]\n\
}}\n\
\n\
CRITICAL REQUIREMENTS FOR BOOKS:\n\
- title: Must be the actual book title, NOT \"this book\", \"that book\", \"Not specified\"\n\
- author_creator: Must be actual author name if mentioned, NOT \"Not mentioned\", \"Not specified\"\n\
- recommended_by: Must be a real name, NOT \"Guest 1\", \"Guest 2\", etc.\n\
- If a book title is unclear or not mentioned, DO NOT include it\n\
\n\
Guidelines:\n\
- Only include items that were EXPLICITLY recommended or highly praised\n\
- Exclude casual mentions or neutral references\n\
- For books, MUST include exact title and author if mentioned\n\
- For movies/TV, include director/creator if mentioned\n\
- Mark confidence as:\n\
  - High (0.9-1.0): Clear, enthusiastic recommendation with exact title\n\
  - Medium (0.6-0.9): Likely recommendation, title mostly clear\n\
  - Low (0.3-0.6): Uncertain mention or unclear title\n\
\n\
IMPORTANT: Return ONLY the JSON object. Do NOT include any explanatory text before or after \
the JSON. Your response must start with {{ and end with }}. Nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_prompt_includes_chunk_and_title() {
        let p = user_prompt("the transcript body", "Great Episode", "Jane Doe", None);
        assert!(p.contains("the transcript body"));
        assert!(p.contains("Episode Title: Great Episode"));
        assert!(p.contains("Guest Name (from title): Jane Doe"));
    }

    #[test]
    fn test_user_prompt_empty_hint() {
        let p = user_prompt("text", "Title", "", None);
        assert!(p.contains("To be determined from transcript"));
    }

    #[test]
    fn test_user_prompt_host_name() {
        let p = user_prompt("text", "Title", "Jane", Some("Alex Host"));
        assert!(p.contains("use 'Alex Host'"));
    }

    #[test]
    fn test_system_prompt_demands_json() {
        assert!(system_prompt().contains("ONLY valid JSON"));
    }
}
