//! Topical intent detection
//!
//! Detects which dealership topics a message is about. Topics are plain tags
//! that the routing engine matches against agent `topic_tags`.
//!
//! # Example
//!
//! ```
//! use dealer_agent_text_processing::intent::TopicDetector;
//!
//! let detector = TopicDetector::new();
//! let topics = detector.detect("Can I lease a RAV4 with bad credit?");
//!
//! assert!(topics.iter().any(|t| t.topic == "lease"));
//! assert!(topics.iter().any(|t| t.topic == "credit"));
//! ```

use dealer_agent_core::TopicalIntent;

use crate::error::Result;
use crate::patterns::PatternSet;

/// Bonus per additional cue of the same topic
const EXTRA_CUE_BONUS: f32 = 0.05;

const INVENTORY: &[(&str, f32)] = &[
    ("in stock", 0.85),
    ("on the lot", 0.8),
    ("inventory", 0.8),
    ("4runner", 0.8),
    ("camry", 0.8),
    ("corolla", 0.8),
    ("highlander", 0.8),
    ("prius", 0.8),
    ("rav4", 0.8),
    ("sienna", 0.8),
    ("tacoma", 0.8),
    ("tundra", 0.8),
    ("available", 0.6),
    ("availability", 0.6),
    ("certified", 0.5),
    ("minivan", 0.5),
    ("sedan", 0.5),
    ("suv", 0.5),
    ("trim", 0.5),
    ("truck", 0.5),
    ("used", 0.5),
    ("color", 0.45),
    ("colors", 0.45),
];

const PRICING: &[(&str, f32)] = &[
    ("msrp", 0.9),
    ("out the door", 0.85),
    ("price", 0.8),
    ("pricing", 0.8),
    ("cost", 0.7),
    ("quote", 0.7),
    ("rebate", 0.7),
    ("discount", 0.6),
    ("how much", 0.6),
    ("incentives", 0.6),
];

const FINANCE: &[(&str, f32)] = &[
    ("apr", 0.9),
    ("financing", 0.9),
    ("finance", 0.85),
    ("interest rate", 0.85),
    ("loan", 0.8),
    ("monthly payment", 0.8),
    ("down payment", 0.8),
    ("payments", 0.6),
];

const CREDIT: &[(&str, f32)] = &[
    ("bad credit", 0.95),
    ("credit score", 0.9),
    ("pre-approved", 0.85),
    ("pre approved", 0.85),
    ("pre-approval", 0.85),
    ("preapproval", 0.85),
    ("credit", 0.8),
    ("approved", 0.5),
];

const LEASE: &[(&str, f32)] = &[
    ("lease", 0.9),
    ("leasing", 0.9),
    ("lease return", 0.9),
    ("money factor", 0.9),
    ("residual", 0.8),
];

const TRADE_IN: &[(&str, f32)] = &[
    ("trade in", 0.9),
    ("trade-in", 0.9),
    ("appraisal", 0.85),
    ("appraise", 0.85),
    ("kelley blue book", 0.85),
    ("kbb", 0.8),
    ("trade", 0.7),
    ("payoff", 0.6),
    ("worth", 0.5),
];

const SERVICE: &[(&str, f32)] = &[
    ("oil change", 0.95),
    ("check engine", 0.9),
    ("maintenance", 0.85),
    ("recall", 0.85),
    ("brake", 0.8),
    ("brakes", 0.8),
    ("broke down", 0.8),
    ("repair", 0.8),
    ("won't start", 0.8),
    ("service", 0.7),
    ("tires", 0.7),
    ("tow", 0.7),
    ("warranty", 0.6),
];

const SALES: &[(&str, f32)] = &[
    ("test drive", 0.85),
    ("purchase", 0.75),
    ("buy", 0.7),
    ("buying", 0.7),
    ("salesperson", 0.7),
    ("negotiate", 0.6),
    ("deal", 0.55),
    ("ready to", 0.4),
];

const APPOINTMENT: &[(&str, f32)] = &[
    ("appointment", 0.8),
    ("schedule", 0.7),
    ("book", 0.5),
    ("come in", 0.5),
    ("visit", 0.45),
];

const GENERAL: &[(&str, f32)] = &[
    ("real person", 0.9),
    ("talk to a person", 0.9),
    ("human", 0.8),
    ("directions", 0.7),
    ("hours", 0.7),
    ("manager", 0.7),
    ("address", 0.6),
    ("call me", 0.6),
    ("location", 0.6),
    ("open", 0.4),
];

/// Keyword/phrase topic detector
pub struct TopicDetector {
    topics: Vec<(String, PatternSet)>,
}

impl TopicDetector {
    pub fn new() -> Self {
        let table: [(&str, &[(&str, f32)]); 10] = [
            ("inventory", INVENTORY),
            ("pricing", PRICING),
            ("finance", FINANCE),
            ("credit", CREDIT),
            ("lease", LEASE),
            ("trade_in", TRADE_IN),
            ("service", SERVICE),
            ("sales", SALES),
            ("appointment", APPOINTMENT),
            ("general", GENERAL),
        ];

        let mut topics: Vec<(String, PatternSet)> = table
            .iter()
            .map(|(topic, phrases)| (topic.to_string(), PatternSet::from_phrases(phrases)))
            .collect();

        // Model years count as an inventory cue
        if let Some((_, set)) = topics.iter_mut().find(|(t, _)| t == "inventory") {
            if let Err(e) = set.push_regex("model year", r"\b(19[89]\d|20[0-4]\d)\b", 0.6) {
                tracing::error!(error = %e, "Model year pattern rejected");
            }
        }

        Self { topics }
    }

    /// Add a phrase for a topic, creating the topic if needed
    pub fn with_phrase(mut self, topic: &str, phrase: &str, weight: f32) -> Result<Self> {
        match self.topics.iter_mut().find(|(t, _)| t == topic) {
            Some((_, set)) => set.push(phrase, weight)?,
            None => {
                let mut set = PatternSet::new();
                set.push(phrase, weight)?;
                self.topics.push((topic.to_string(), set));
            }
        }
        Ok(self)
    }

    /// Known topic tags
    pub fn topics(&self) -> impl Iterator<Item = &str> {
        self.topics.iter().map(|(t, _)| t.as_str())
    }

    /// Detect topics, highest confidence first
    pub fn detect(&self, text: &str) -> Vec<TopicalIntent> {
        let lower = text.to_lowercase().replace(['\u{2019}', '\u{2018}'], "'");

        let mut detected: Vec<TopicalIntent> = self
            .topics
            .iter()
            .filter_map(|(topic, set)| {
                let hits = set.hits(&lower);
                let best = hits.iter().map(|h| h.weight).fold(0.0f32, f32::max);
                if hits.is_empty() {
                    return None;
                }
                let bonus = EXTRA_CUE_BONUS * (hits.len() - 1) as f32;
                Some(TopicalIntent::new(topic.clone(), best + bonus))
            })
            .collect();

        detected.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.topic.cmp(&b.topic))
        });
        detected
    }
}

impl Default for TopicDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic_of(detected: &[TopicalIntent], topic: &str) -> Option<f32> {
        detected
            .iter()
            .find(|t| t.topic == topic)
            .map(|t| t.confidence)
    }

    #[test]
    fn test_inventory_and_pricing() {
        let detected = TopicDetector::new().detect("What's the MSRP on the 2024 Highlander?");
        let inventory = topic_of(&detected, "inventory").unwrap();
        assert!(inventory >= 0.8);
        assert_eq!(topic_of(&detected, "pricing"), Some(0.9));
    }

    #[test]
    fn test_service_request() {
        let detected = TopicDetector::new().detect("I need an oil change and my brakes are squeaking");
        assert_eq!(detected[0].topic, "service");
    }

    #[test]
    fn test_no_topics() {
        assert!(TopicDetector::new().detect("ok").is_empty());
    }

    #[test]
    fn test_year_regex_does_not_match_prices() {
        let detected = TopicDetector::new().detect("my budget is 20000");
        assert!(topic_of(&detected, "inventory").is_none());
    }

    #[test]
    fn test_custom_topic() {
        let detector = TopicDetector::new()
            .with_phrase("accessories", "roof rack", 0.8)
            .unwrap();
        assert!(detector.topics().any(|t| t == "accessories"));
        let detected = detector.detect("Can you add a roof rack?");
        assert_eq!(topic_of(&detected, "accessories"), Some(0.8));
    }
}
