//! Mention and hashtag extraction plus content validation.

use crate::domain::{SocialError, SocialResult};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    // The leading group stops `a@b.com` and `x#y` from matching.
    static ref MENTION: Regex = Regex::new(r"(?:^|[^\w@])@([A-Za-z0-9_]{3,30})\b").unwrap();
    static ref HASHTAG: Regex = Regex::new(r"(?:^|[^\w#&])#([A-Za-z0-9_]{1,50})\b").unwrap();
    static ref HAS_LETTER: Regex = Regex::new(r"[A-Za-z]").unwrap();
}

/// Lower-cased `@username` handles in first-appearance order.
pub fn extract_mentions(text: &str) -> Vec<String> {
    collect_unique(MENTION.captures_iter(text).map(|c| c[1].to_lowercase()))
}

/// Lower-cased hashtags in first-appearance order. Pure numbers (`#1`) are not tags.
pub fn extract_hashtags(text: &str) -> Vec<String> {
    collect_unique(
        HASHTAG
            .captures_iter(text)
            .map(|c| c[1].to_lowercase())
            .filter(|tag| HAS_LETTER.is_match(tag)),
    )
}

fn collect_unique(tokens: impl Iterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens.filter(|t| seen.insert(t.clone())).collect()
}

/// Trim and bound user-written text.
pub fn normalize_content(text: &str, max_len: usize) -> SocialResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(SocialError::InvalidInput("content must not be empty".into()));
    }
    let len = trimmed.chars().count();
    if len > max_len {
        return Err(SocialError::InvalidInput(format!(
            "content is {len} characters, the limit is {max_len}"
        )));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mentions_dedup_and_order() {
        let mentions = extract_mentions("@Bob hi @alice and @bob again, ping @al");
        assert_eq!(mentions, vec!["bob", "alice"]);
    }

    #[test]
    fn test_mentions_skip_emails() {
        assert!(extract_mentions("mail me at jane@example.com").is_empty());
        assert_eq!(extract_mentions("(@jane_doe)"), vec!["jane_doe"]);
    }

    #[test]
    fn test_hashtags() {
        let tags = extract_hashtags("#Rust is fun #rust #100 #day_1 x#nope");
        assert_eq!(tags, vec!["rust", "day_1"]);
    }

    #[test]
    fn test_hashtag_at_start_of_line() {
        assert_eq!(extract_hashtags("line\n#Weekend"), vec!["weekend"]);
    }

    #[test]
    fn test_normalize_content() {
        assert_eq!(normalize_content("  hi  ", 10).unwrap(), "hi");
        assert!(normalize_content("   ", 10).is_err());
        assert!(normalize_content("héllo wörld", 5).is_err());
        assert!(normalize_content("héllo", 5).is_ok());
    }
}
