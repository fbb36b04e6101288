//! Similarity scoring for catalog match acceptance.
//!
//! Scores are normalized edit-distance ratios on a 0-100 scale, computed
//! case-insensitively. `ratio` compares whole strings; `partial_ratio`
//! scores the best window of the longer string against the shorter, which
//! tolerates catalog author lists like "Cal Newport, Jane Doe" against an
//! extracted "Cal Newport".

use similar::TextDiff;

/// Whole-string similarity on a 0-100 scale.
pub fn ratio(a: &str, b: &str) -> u8 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() && b.is_empty() {
        return 100;
    }
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    scaled(&a, &b)
}

/// Best-window similarity of the shorter string against the longer, 0-100.
pub fn partial_ratio(a: &str, b: &str) -> u8 {
    let a = a.trim().to_lowercase();
    let b = b.trim().to_lowercase();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let (shorter, longer) = if a.chars().count() <= b.chars().count() {
        (a.as_str(), b.as_str())
    } else {
        (b.as_str(), a.as_str())
    };

    let short_len = shorter.chars().count();
    let long_chars: Vec<char> = longer.chars().collect();
    if long_chars.len() == short_len {
        return scaled(shorter, longer);
    }

    let mut best = 0u8;
    for start in 0..=(long_chars.len() - short_len) {
        let window: String = long_chars[start..start + short_len].iter().collect();
        best = best.max(scaled(shorter, &window));
        if best == 100 {
            break;
        }
    }
    best
}

fn scaled(a: &str, b: &str) -> u8 {
    (TextDiff::from_chars(a, b).ratio() * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match_scores_100() {
        assert_eq!(ratio("Deep Work", "Deep Work"), 100);
        assert_eq!(ratio("deep work", "DEEP WORK"), 100);
    }

    #[test]
    fn test_unrelated_titles_score_below_70() {
        assert!(ratio("Atomic Habits", "The Lean Startup") < 70);
    }

    #[test]
    fn test_minor_variation_scores_high() {
        assert!(ratio("Deep Work", "Deep Work: Rules for Focused Success") < 100);
        assert!(ratio("The Hard Thing About Hard Things", "Hard Thing About Hard Things") >= 70);
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(ratio("", "Deep Work"), 0);
        assert_eq!(ratio("", ""), 100);
        assert_eq!(partial_ratio("", "Cal Newport"), 0);
    }

    #[test]
    fn test_partial_ratio_substring_scores_100() {
        assert_eq!(partial_ratio("Cal Newport", "Cal Newport, Jane Doe"), 100);
    }

    #[test]
    fn test_partial_ratio_unrelated_authors_low() {
        assert!(partial_ratio("Cal Newport", "Haruki Murakami") < 60);
    }

    #[test]
    fn test_partial_ratio_symmetric_in_argument_order() {
        let a = partial_ratio("Newport", "Cal Newport");
        let b = partial_ratio("Cal Newport", "Newport");
        assert_eq!(a, b);
        assert_eq!(a, 100);
    }
}
