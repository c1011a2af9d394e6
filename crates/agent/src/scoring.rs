//! Content scoring for candidate agents
//!
//! Scores combine phrase similarity against an agent's training utterances
//! with the affinity between detected topics and the agent's topic tags.

use std::collections::BTreeSet;

use dealer_agent_core::{AgentProfile, TopicalIntent};
use dealer_agent_text_processing::{content_words, normalize};

/// Text normalized once and reused across every comparison
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedText {
    normalized: String,
    content: BTreeSet<String>,
}

impl PreparedText {
    pub fn new(text: &str) -> Self {
        Self {
            normalized: normalize(text),
            content: content_words(text),
        }
    }

    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    pub fn content_words(&self) -> &BTreeSet<String> {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Whole-word phrase containment
    fn contains_phrase(&self, other: &PreparedText) -> bool {
        format!(" {} ", self.normalized).contains(&format!(" {} ", other.normalized))
    }
}

/// Per-agent score components
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentScore {
    pub similarity: f32,
    pub affinity: f32,
    pub score: f32,
}

/// Weighted combination of utterance similarity and topic affinity
#[derive(Debug, Clone, Copy)]
pub struct ContentScorer {
    similarity_weight: f32,
    tag_weight: f32,
}

impl ContentScorer {
    pub fn new(similarity_weight: f32, tag_weight: f32) -> Self {
        Self {
            similarity_weight,
            tag_weight,
        }
    }

    /// Similarity of a message to one utterance
    ///
    /// Exact match scores 1.0, whole-phrase containment 0.9, otherwise the
    /// share of the utterance's content words present in the message scaled
    /// by 0.8.
    pub fn similarity(message: &PreparedText, utterance: &PreparedText) -> f32 {
        if message.is_empty() || utterance.is_empty() {
            return 0.0;
        }
        if message.normalized == utterance.normalized {
            return 1.0;
        }
        if message.contains_phrase(utterance) {
            return 0.9;
        }
        if utterance.content.is_empty() {
            return 0.0;
        }

        let overlap = utterance.content.intersection(&message.content).count();
        overlap as f32 / utterance.content.len() as f32 * 0.8
    }

    /// Best similarity over all of an agent's utterances
    pub fn best_similarity(message: &PreparedText, utterances: &[PreparedText]) -> f32 {
        utterances
            .iter()
            .map(|u| Self::similarity(message, u))
            .fold(0.0, f32::max)
    }

    /// Summed confidence of detected topics the agent covers, capped at 1.0
    pub fn tag_affinity(profile: &AgentProfile, topics: &[TopicalIntent]) -> f32 {
        topics
            .iter()
            .filter(|t| profile.covers_topic(&t.topic))
            .map(|t| t.confidence)
            .sum::<f32>()
            .min(1.0)
    }

    /// Weighted, priority-adjusted score in [0, 1]. NaN propagates.
    pub fn score(
        &self,
        message: &PreparedText,
        profile: &AgentProfile,
        utterances: &[PreparedText],
        topics: &[TopicalIntent],
    ) -> AgentScore {
        let similarity = Self::best_similarity(message, utterances);
        let affinity = Self::tag_affinity(profile, topics);
        let raw = (self.similarity_weight * similarity + self.tag_weight * affinity)
            * profile.priority_weight;

        AgentScore {
            similarity,
            affinity,
            score: raw.clamp(0.0, 1.0),
        }
    }
}

impl Default for ContentScorer {
    fn default() -> Self {
        Self::new(0.7, 0.3)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealer_agent_core::AgentKind;

    fn prep(text: &str) -> PreparedText {
        PreparedText::new(text)
    }

    #[test]
    fn test_exact_match_scores_one() {
        let score = ContentScorer::similarity(
            &prep("Do you have any trucks?"),
            &prep("do you have any trucks"),
        );
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_containment_scores_point_nine() {
        let score = ContentScorer::similarity(
            &prep("Hi there, what are your hours today?"),
            &prep("what are your hours"),
        );
        assert_eq!(score, 0.9);
    }

    #[test]
    fn test_containment_respects_word_boundaries() {
        // "lease" is inside "release" but is not a whole word
        let score = ContentScorer::similarity(&prep("press release"), &prep("lease"));
        assert!(score < 0.9);
    }

    #[test]
    fn test_partial_overlap() {
        let score = ContentScorer::similarity(
            &prep("what's the msrp on that highlander"),
            &prep("What is the MSRP on the new Highlander"),
        );
        // utterance content words: msrp, new, highlander
        assert!((score - 2.0 / 3.0 * 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_empty_message_scores_zero() {
        assert_eq!(ContentScorer::similarity(&prep(""), &prep("hello")), 0.0);
    }

    #[test]
    fn test_tag_affinity_caps_at_one() {
        let profile = AgentProfile::new(AgentKind::Inventory).with_tags(["inventory", "pricing"]);
        let topics = vec![
            TopicalIntent::new("pricing", 0.9),
            TopicalIntent::new("inventory", 0.85),
            TopicalIntent::new("finance", 0.7),
        ];
        assert_eq!(ContentScorer::tag_affinity(&profile, &topics), 1.0);
    }

    #[test]
    fn test_agent_id_counts_as_topic() {
        let profile = AgentProfile::new(AgentKind::TradeIn);
        let topics = vec![TopicalIntent::new("trade_in", 0.6)];
        assert!((ContentScorer::tag_affinity(&profile, &topics) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_priority_weight_scales_and_clamps() {
        let scorer = ContentScorer::default();
        let profile = AgentProfile::new(AgentKind::Sales).with_priority_weight(2.0);
        let utterances = vec![prep("schedule a test drive")];
        let score = scorer.score(&prep("schedule a test drive"), &profile, &utterances, &[]);
        assert_eq!(score.similarity, 1.0);
        assert_eq!(score.score, 1.0);
    }

    #[test]
    fn test_nan_priority_propagates() {
        let scorer = ContentScorer::default();
        let profile = AgentProfile::new(AgentKind::Sales).with_priority_weight(f32::NAN);
        let score = scorer.score(&prep("hello"), &profile, &[prep("hello")], &[]);
        assert!(score.score.is_nan());
    }
}
