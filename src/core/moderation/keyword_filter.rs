// Local fallback classifier, used whenever the remote model is unavailable.

use super::moderation_models::{ModerationVerdict, SELF_HARM};

/// Substrings that mark a text as a self-harm disclosure.
///
/// Matching is plain substring search, so "die" also hits words like "diet".
pub const SELF_HARM_KEYWORDS: &[&str] = &["suicide", "kill myself", "die"];

pub fn classify_by_keywords(text: &str) -> ModerationVerdict {
    let lower = text.to_lowercase();
    if SELF_HARM_KEYWORDS.iter().any(|k| lower.contains(k)) {
        ModerationVerdict::flagged([SELF_HARM])
    } else {
        ModerationVerdict::clean()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_keyword_flags_self_harm() {
        for keyword in SELF_HARM_KEYWORDS {
            let text = format!("lately I think about {} a lot", keyword);
            let verdict = classify_by_keywords(&text);
            assert!(verdict.flagged, "{} should be flagged", keyword);
            assert!(verdict.is_self_harm());
            assert_eq!(verdict.categories.len(), 1);
        }
    }

    #[test]
    fn test_matching_ignores_case() {
        let verdict = classify_by_keywords("I want to KILL MYSELF");
        assert_eq!(verdict, ModerationVerdict::flagged(["self-harm"]));
    }

    #[test]
    fn test_text_without_keywords_is_clean() {
        let verdict = classify_by_keywords("this app is terrible");
        assert!(!verdict.flagged);
        assert!(verdict.categories.is_empty());
    }

    #[test]
    fn test_substring_match_inside_words() {
        assert!(classify_by_keywords("my new diet plan").flagged);
    }

    #[test]
    fn test_empty_text_is_clean() {
        assert_eq!(classify_by_keywords(""), ModerationVerdict::clean());
    }
}
