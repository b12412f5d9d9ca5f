//! Hashtag extraction
//!
//! Hashtags are derived from post content once, when the post is stored.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref HASHTAG_RE: Regex =
        Regex::new(r"#([\p{L}\p{N}_]+)").expect("hashtag pattern is valid");
}

/// Normalize a tag for storage and lookup.
///
/// Strips surrounding whitespace and a leading `#`, lowercases the rest.
/// Returns `None` when nothing is left.
pub fn normalize_tag(raw: &str) -> Option<String> {
    let tag = raw.trim().trim_start_matches('#').trim();
    if tag.is_empty() {
        return None;
    }
    Some(tag.to_lowercase())
}

/// Extract the distinct, normalized hashtags of `content`, in first-seen order.
pub fn extract_hashtags(content: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();

    for captures in HASHTAG_RE.captures_iter(content) {
        let Some(tag) = captures.get(1).and_then(|m| normalize_tag(m.as_str())) else {
            continue;
        };
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    tags
}
