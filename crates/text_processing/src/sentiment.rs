//! Lexicon-based sentiment classification
//!
//! Detects the customer's emotion, how strongly it is expressed and how
//! urgently they need help:
//! - Emotion phrases with base intensities (one list per emotion)
//! - Modifiers that raise intensity: exclamation marks, shouted words,
//!   intensifiers, repetition markers ("third time", "again")
//! - A separate urgency phrase list
//! - Topical intent from [`TopicDetector`]
//!
//! Output is deterministic for identical input.

use async_trait::async_trait;
use dealer_agent_core::{ClassificationError, Emotion, SentimentClassifier, SentimentResult};
use std::collections::HashMap;

use crate::error::Result;
use crate::intent::TopicDetector;
use crate::patterns::PatternSet;
use crate::text::has_alphanumeric;

const MODEL_VERSION: &str = "lexicon-v1";

/// Confidence of a message with no emotional cue
const NEUTRAL_CONFIDENCE: f32 = 0.5;
const BASE_CONFIDENCE: f32 = 0.55;
const CONFIDENCE_PER_CUE: f32 = 0.1;
const MAX_CONFIDENCE: f32 = 0.95;

const ANGRY: &[(&str, f32)] = &[
    ("furious", 0.9),
    ("livid", 0.9),
    ("outraged", 0.9),
    ("pissed", 0.85),
    ("angry", 0.8),
    ("scam", 0.8),
    ("ripped off", 0.8),
    ("rip off", 0.8),
    ("lawyer", 0.75),
    ("unacceptable", 0.75),
    ("ridiculous", 0.7),
    ("worst", 0.7),
    ("sick of", 0.7),
];

const FRUSTRATED: &[(&str, f32)] = &[
    ("frustrated", 0.7),
    ("frustrating", 0.7),
    ("fed up", 0.7),
    ("waste of time", 0.65),
    ("annoyed", 0.6),
    ("annoying", 0.6),
    ("still waiting", 0.6),
    ("nobody called", 0.6),
    ("no one called", 0.6),
    ("never called", 0.6),
    ("not working", 0.5),
];

const DISAPPOINTED: &[(&str, f32)] = &[
    ("disappointed", 0.6),
    ("disappointing", 0.6),
    ("let down", 0.6),
    ("not happy", 0.55),
    ("unhappy", 0.55),
    ("expected better", 0.55),
];

const IMPATIENT: &[(&str, f32)] = &[
    ("taking forever", 0.6),
    ("come on", 0.5),
    ("hurry", 0.5),
    ("how long", 0.45),
    ("waiting", 0.4),
];

const ANXIOUS: &[(&str, f32)] = &[
    ("scared", 0.6),
    ("worried", 0.55),
    ("afraid", 0.55),
    ("nervous", 0.5),
    ("concerned", 0.45),
];

const CONFUSED: &[(&str, f32)] = &[
    ("makes no sense", 0.55),
    ("confused", 0.5),
    ("confusing", 0.5),
    ("don't understand", 0.5),
    ("what does that mean", 0.45),
    ("unclear", 0.45),
    ("not sure", 0.35),
];

const CURIOUS: &[(&str, f32)] = &[
    ("curious", 0.4),
    ("interested in", 0.4),
    ("wondering", 0.35),
    ("can you tell me", 0.3),
    ("do you have", 0.3),
    ("how much", 0.3),
    ("what's", 0.25),
    ("what is", 0.25),
    ("is there", 0.25),
];

const EXCITED: &[(&str, f32)] = &[
    ("can't wait", 0.7),
    ("dream car", 0.7),
    ("excited", 0.7),
    ("love it", 0.65),
    ("amazing", 0.6),
    ("awesome", 0.6),
];

const HAPPY: &[(&str, f32)] = &[
    ("perfect", 0.55),
    ("happy", 0.5),
    ("glad", 0.5),
    ("pleased", 0.5),
    ("great", 0.45),
    ("sounds good", 0.45),
    ("good", 0.3),
];

const GRATEFUL: &[(&str, f32)] = &[
    ("grateful", 0.6),
    ("thanks so much", 0.6),
    ("appreciate", 0.5),
    ("thank you", 0.45),
    ("thanks", 0.4),
];

const URGENCY: &[(&str, f32)] = &[
    ("emergency", 0.95),
    ("stranded", 0.9),
    ("need it now", 0.9),
    ("asap", 0.85),
    ("as soon as possible", 0.85),
    ("urgent", 0.85),
    ("urgently", 0.85),
    ("immediately", 0.85),
    ("broke down", 0.85),
    ("right now", 0.8),
    ("right away", 0.8),
    ("won't start", 0.8),
    ("today", 0.55),
    ("tonight", 0.55),
    ("this week", 0.35),
    ("soon", 0.35),
];

const INTENSIFIERS: &[(&str, f32)] = &[
    ("absolutely", 0.05),
    ("completely", 0.05),
    ("extremely", 0.05),
    ("really", 0.05),
    ("so", 0.05),
    ("totally", 0.05),
    ("very", 0.05),
];

const REPETITION: &[(&str, f32)] = &[
    ("again", 0.1),
    ("every time", 0.1),
    ("keep getting", 0.1),
    ("multiple times", 0.1),
    ("second time", 0.1),
    ("still", 0.1),
    ("third time", 0.1),
];

/// Upper-case tokens that are vehicle jargon, not shouting
const ACRONYMS: &[&str] = &["APR", "AWD", "CPO", "EV", "KBB", "MSRP", "SUV", "VIN", "XLE", "XSE"];

const NEGATIONS: &[&str] = &["not", "never", "no"];

/// Lexicon sentiment classifier
pub struct LexiconClassifier {
    emotions: Vec<(Emotion, PatternSet)>,
    urgency: PatternSet,
    intensifiers: PatternSet,
    repetition: PatternSet,
    topics: TopicDetector,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        let emotions = vec![
            (Emotion::Angry, PatternSet::from_phrases(ANGRY)),
            (Emotion::Frustrated, PatternSet::from_phrases(FRUSTRATED)),
            (Emotion::Disappointed, PatternSet::from_phrases(DISAPPOINTED)),
            (Emotion::Impatient, PatternSet::from_phrases(IMPATIENT)),
            (Emotion::Anxious, PatternSet::from_phrases(ANXIOUS)),
            (Emotion::Confused, PatternSet::from_phrases(CONFUSED)),
            (Emotion::Curious, PatternSet::from_phrases(CURIOUS)),
            (Emotion::Excited, PatternSet::from_phrases(EXCITED)),
            (Emotion::Happy, PatternSet::from_phrases(HAPPY)),
            (Emotion::Grateful, PatternSet::from_phrases(GRATEFUL)),
        ];

        Self {
            emotions,
            urgency: PatternSet::from_phrases(URGENCY),
            intensifiers: PatternSet::from_phrases(INTENSIFIERS),
            repetition: PatternSet::from_phrases(REPETITION),
            topics: TopicDetector::new(),
        }
    }

    /// Add a domain phrase for an emotion
    pub fn with_phrase(mut self, emotion: Emotion, phrase: &str, intensity: f32) -> Result<Self> {
        match self.emotions.iter_mut().find(|(e, _)| *e == emotion) {
            Some((_, set)) => set.push(phrase, intensity)?,
            None => {
                let mut set = PatternSet::new();
                set.push(phrase, intensity)?;
                self.emotions.push((emotion, set));
            }
        }
        Ok(self)
    }

    /// Add a domain urgency phrase
    pub fn with_urgency_phrase(mut self, phrase: &str, urgency: f32) -> Result<Self> {
        self.urgency.push(phrase, urgency)?;
        Ok(self)
    }

    pub fn topic_detector(&self) -> &TopicDetector {
        &self.topics
    }

    /// Synchronous classification
    pub fn analyze(&self, text: &str) -> std::result::Result<SentimentResult, ClassificationError> {
        if text.trim().is_empty() {
            return Err(ClassificationError::EmptyInput);
        }
        if !has_alphanumeric(text) {
            return Err(ClassificationError::Unparseable(
                "no alphanumeric content".to_string(),
            ));
        }

        let lower = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");
        let mut cues = 0u32;

        // Strongest phrase per emotion
        let mut best: HashMap<Emotion, f32> = HashMap::new();
        for (emotion, set) in &self.emotions {
            for hit in set.hits(&lower) {
                if !emotion.is_negative() && is_negated(&lower, hit.start) {
                    continue;
                }
                cues += 1;
                let entry = best.entry(*emotion).or_insert(0.0);
                *entry = entry.max(hit.weight);
            }
        }

        let primary = best.iter().max_by(|a, b| {
            a.1.partial_cmp(b.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.is_negative().cmp(&b.0.is_negative()))
                .then_with(|| a.0.cmp(b.0))
        });

        let exclamations = text.matches('!').count().min(3) as f32;
        let shouted = shouted_words(text);

        let urgency_hits = self.urgency.hits(&lower);
        let mut urgency = urgency_hits.iter().map(|h| h.weight).fold(0.0f32, f32::max);
        cues += urgency_hits.len() as u32;
        if urgency > 0.0 {
            urgency += 0.05 * exclamations.min(1.0);
        }

        let (emotion, intensity) = match primary {
            Some((emotion, base)) => {
                let mut intensity = *base;
                intensity += 0.05 * exclamations;
                if shouted > 0 {
                    intensity += 0.1;
                    cues += 1;
                }
                let boost = self
                    .intensifiers
                    .hits(&lower)
                    .iter()
                    .map(|h| h.weight)
                    .sum::<f32>()
                    .min(0.1);
                intensity += boost;
                if emotion.is_negative() && !self.repetition.hits(&lower).is_empty() {
                    intensity += 0.1;
                    cues += 1;
                }
                if exclamations > 0.0 {
                    cues += 1;
                }
                (*emotion, intensity)
            }
            None => (Emotion::Neutral, 0.0),
        };

        let confidence = if cues == 0 {
            NEUTRAL_CONFIDENCE
        } else {
            (BASE_CONFIDENCE + CONFIDENCE_PER_CUE * (cues - 1) as f32).min(MAX_CONFIDENCE)
        };

        let result = SentimentResult::new(emotion, intensity, urgency, confidence)
            .with_topics(self.topics.detect(text));

        tracing::trace!(
            emotion = %result.emotion,
            intensity = result.intensity,
            urgency = result.urgency,
            confidence = result.confidence,
            "Lexicon classification"
        );

        Ok(result)
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, text: &str) -> std::result::Result<SentimentResult, ClassificationError> {
        self.analyze(text)
    }

    fn model_version(&self) -> &str {
        MODEL_VERSION
    }
}

/// Whether the word right before `start` negates the phrase
fn is_negated(text: &str, start: usize) -> bool {
    let before = &text[..start];
    match before.split_whitespace().last() {
        Some(word) => {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
            NEGATIONS.contains(&word) || word.ends_with("n't")
        }
        None => false,
    }
}

/// Count of fully upper-case words of three or more letters, jargon excluded
fn shouted_words(text: &str) -> usize {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().filter(|c| c.is_alphabetic()).count() >= 3)
        .filter(|w| w.chars().all(|c| !c.is_lowercase()))
        .filter(|w| w.chars().any(char::is_alphabetic))
        .filter(|w| !ACRONYMS.contains(w))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str) -> SentimentResult {
        LexiconClassifier::new().analyze(text).unwrap()
    }

    #[test]
    fn test_angry_repeat_complaint() {
        let result = classify("I am furious, this is the third time!");
        assert_eq!(result.emotion, Emotion::Angry);
        assert!(result.intensity >= 0.9);
        assert!(result.confidence > 0.6);
    }

    #[test]
    fn test_inventory_question_is_not_negative() {
        let result = classify("What's the MSRP on the 2024 Highlander?");
        assert!(!result.emotion.is_negative());
        assert!(result.intensity < 0.9);
        assert_eq!(result.urgency, 0.0);
        assert!(result.topics.iter().any(|t| t.topic == "inventory"));
        assert!(result.topics.iter().any(|t| t.topic == "pricing"));
    }

    #[test]
    fn test_urgency_without_emotion() {
        let result = classify("My car broke down on the highway, I need a tow asap");
        assert!(result.urgency >= 0.8);
    }

    #[test]
    fn test_negated_positive_ignored() {
        let result = classify("I'm not happy with the offer");
        assert_eq!(result.emotion, Emotion::Disappointed);
    }

    #[test]
    fn test_shouting_raises_intensity() {
        let calm = classify("I am frustrated with the wait");
        let loud = classify("I am FRUSTRATED with the WAIT");
        assert!(loud.intensity > calm.intensity);
    }

    #[test]
    fn test_jargon_is_not_shouting() {
        assert_eq!(shouted_words("What is the MSRP and APR on the SUV"), 0);
        assert_eq!(shouted_words("WHY is nobody CALLING"), 2);
    }

    #[test]
    fn test_no_cue_is_neutral() {
        let result = classify("ok");
        assert_eq!(result.emotion, Emotion::Neutral);
        assert_eq!(result.confidence, NEUTRAL_CONFIDENCE);
    }

    #[test]
    fn test_empty_and_unparseable() {
        let classifier = LexiconClassifier::new();
        assert_eq!(
            classifier.analyze("   ").unwrap_err(),
            ClassificationError::EmptyInput
        );
        assert!(matches!(
            classifier.analyze("?!?!"),
            Err(ClassificationError::Unparseable(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let classifier = LexiconClassifier::new();
        let text = "Really worried my loan won't get approved today!";
        assert_eq!(
            classifier.analyze(text).unwrap(),
            classifier.analyze(text).unwrap()
        );
    }

    #[test]
    fn test_custom_phrase() {
        let classifier = LexiconClassifier::new()
            .with_phrase(Emotion::Angry, "bait and switch", 0.85)
            .unwrap();
        let result = classifier.analyze("This was a bait and switch").unwrap();
        assert_eq!(result.emotion, Emotion::Angry);
    }

    #[tokio::test]
    async fn test_trait_impl() {
        let classifier = LexiconClassifier::new();
        assert_eq!(classifier.model_version(), "lexicon-v1");
        let result = classifier.classify("Thanks so much!").await.unwrap();
        assert_eq!(result.emotion, Emotion::Grateful);
    }
}
