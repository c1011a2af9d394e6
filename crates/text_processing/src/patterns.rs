//! Compiled phrase lists with per-phrase weights

use regex::Regex;

use crate::error::{Result, TextProcessingError};

/// One compiled phrase
#[derive(Debug, Clone)]
pub(crate) struct WeightedPattern {
    pub phrase: String,
    pub regex: Regex,
    pub weight: f32,
}

/// A hit of a phrase in a text
#[derive(Debug, Clone, Copy)]
pub(crate) struct PatternHit<'a> {
    pub phrase: &'a str,
    pub weight: f32,
    pub start: usize,
}

/// Phrases matched on word boundaries against lowercased text
#[derive(Debug, Clone, Default)]
pub(crate) struct PatternSet {
    patterns: Vec<WeightedPattern>,
}

impl PatternSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile a list of built-in phrases. Built-in phrases are escaped
    /// literals, so compilation cannot fail on them.
    pub fn from_phrases(phrases: &[(&str, f32)]) -> Self {
        let mut set = Self::new();
        for (phrase, weight) in phrases {
            if let Err(e) = set.push(phrase, *weight) {
                tracing::error!(error = %e, "Skipping built-in phrase");
            }
        }
        set
    }

    /// Add a literal phrase
    pub fn push(&mut self, phrase: &str, weight: f32) -> Result<()> {
        let source = format!(r"\b{}\b", regex::escape(&phrase.to_lowercase()));
        self.push_regex(phrase, &source, weight)
    }

    /// Add a raw regular expression
    pub fn push_regex(&mut self, label: &str, source: &str, weight: f32) -> Result<()> {
        let regex = Regex::new(source).map_err(|e| TextProcessingError::InvalidPattern {
            pattern: label.to_string(),
            message: e.to_string(),
        })?;
        self.patterns.push(WeightedPattern {
            phrase: label.to_string(),
            regex,
            weight: weight.clamp(0.0, 1.0),
        });
        Ok(())
    }

    /// All hits in `text` (expected lowercased)
    pub fn hits<'a>(&'a self, text: &str) -> Vec<PatternHit<'a>> {
        self.patterns
            .iter()
            .filter_map(|p| {
                p.regex.find(text).map(|m| PatternHit {
                    phrase: &p.phrase,
                    weight: p.weight,
                    start: m.start(),
                })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_boundaries() {
        let set = PatternSet::from_phrases(&[("now", 0.5)]);
        assert!(set.hits("i don't know").is_empty());
        assert_eq!(set.hits("i need it now").len(), 1);
    }

    #[test]
    fn test_invalid_regex_reported() {
        let mut set = PatternSet::new();
        let err = set.push_regex("broken", "(unclosed", 0.5).unwrap_err();
        assert!(matches!(err, TextProcessingError::InvalidPattern { .. }));
        assert_eq!(set.len(), 0);
    }
}
