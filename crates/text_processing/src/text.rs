//! Normalization and tokenization helpers

use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashSet};
use unicode_segmentation::UnicodeSegmentation;

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "about", "am", "an", "and", "any", "are", "at", "be", "been", "but", "by", "can",
        "could", "did", "do", "does", "for", "from", "get", "had", "has", "have", "hey", "hi",
        "how", "i", "i'm", "if", "im", "in", "is", "it", "it's", "its", "just", "me", "my", "of",
        "on", "or", "our", "please", "should", "so", "some", "that", "the", "there", "these",
        "this", "those", "to", "was", "we", "were", "what", "what's", "whats", "when", "where",
        "which", "who", "will", "with", "would", "you", "your",
    ]
    .into_iter()
    .collect()
});

/// Lowercase, unify apostrophes, and join Unicode words with single spaces
pub fn normalize(text: &str) -> String {
    words(text).join(" ")
}

/// Lowercased Unicode words
pub fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .replace(['\u{2019}', '\u{2018}'], "'")
        .unicode_words()
        .map(str::to_string)
        .collect()
}

/// Words that carry meaning for matching, stop words removed
pub fn content_words(text: &str) -> BTreeSet<String> {
    words(text)
        .into_iter()
        .filter(|w| !STOP_WORDS.contains(w.as_str()))
        .collect()
}

pub fn has_alphanumeric(text: &str) -> bool {
    text.chars().any(char::is_alphanumeric)
}
