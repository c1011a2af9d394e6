//! Sentiment and topical intent types

use serde::{Deserialize, Serialize};

/// Closed set of emotions the classifier can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Neutral,
    Happy,
    Excited,
    Grateful,
    Curious,
    Confused,
    Anxious,
    Impatient,
    Disappointed,
    Frustrated,
    Angry,
}

impl Emotion {
    /// All emotions, in declaration order
    pub const ALL: [Emotion; 11] = [
        Emotion::Neutral,
        Emotion::Happy,
        Emotion::Excited,
        Emotion::Grateful,
        Emotion::Curious,
        Emotion::Confused,
        Emotion::Anxious,
        Emotion::Impatient,
        Emotion::Disappointed,
        Emotion::Frustrated,
        Emotion::Angry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Neutral => "neutral",
            Emotion::Happy => "happy",
            Emotion::Excited => "excited",
            Emotion::Grateful => "grateful",
            Emotion::Curious => "curious",
            Emotion::Confused => "confused",
            Emotion::Anxious => "anxious",
            Emotion::Impatient => "impatient",
            Emotion::Disappointed => "disappointed",
            Emotion::Frustrated => "frustrated",
            Emotion::Angry => "angry",
        }
    }

    /// Negative emotions
    pub fn is_negative(&self) -> bool {
        matches!(
            self,
            Emotion::Anxious
                | Emotion::Impatient
                | Emotion::Disappointed
                | Emotion::Frustrated
                | Emotion::Angry
        )
    }

    /// Emotions that count toward repeat-negative escalation
    pub fn is_hostile(&self) -> bool {
        matches!(self, Emotion::Frustrated | Emotion::Angry)
    }
}

impl std::fmt::Display for Emotion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A topic tag detected in a message, with confidence in [0, 1]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopicalIntent {
    pub topic: String,
    pub confidence: f32,
}

impl TopicalIntent {
    pub fn new(topic: impl Into<String>, confidence: f32) -> Self {
        Self {
            topic: topic.into(),
            confidence: confidence.clamp(0.0, 1.0),
        }
    }
}

/// Classifier output attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentResult {
    pub emotion: Emotion,
    pub intensity: f32,
    pub urgency: f32,
    pub confidence: f32,
    /// Detected topics, highest confidence first
    #[serde(default)]
    pub topics: Vec<TopicalIntent>,
}

impl SentimentResult {
    /// Build a result with scores clamped to [0, 1]
    pub fn new(emotion: Emotion, intensity: f32, urgency: f32, confidence: f32) -> Self {
        Self {
            emotion,
            intensity: intensity.clamp(0.0, 1.0),
            urgency: urgency.clamp(0.0, 1.0),
            confidence: confidence.clamp(0.0, 1.0),
            topics: Vec::new(),
        }
    }

    /// Substitute used when classification fails or times out
    pub fn neutral() -> Self {
        Self::new(Emotion::Neutral, 0.0, 0.0, 0.0)
    }

    /// Attach topics, ordered by confidence desc then tag asc
    pub fn with_topics(mut self, mut topics: Vec<TopicalIntent>) -> Self {
        topics.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.topic.cmp(&b.topic))
        });
        self.topics = topics;
        self
    }

    /// Reset emotion signals while keeping topics
    pub fn neutralized(mut self) -> Self {
        self.emotion = Emotion::Neutral;
        self.intensity = 0.0;
        self.urgency = 0.0;
        self
    }

    pub fn top_topic(&self) -> Option<&TopicalIntent> {
        self.topics.first()
    }
}

impl Default for SentimentResult {
    fn default() -> Self {
        Self::neutral()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eleven_emotions() {
        assert_eq!(Emotion::ALL.len(), 11);
        let json = serde_json::to_string(&Emotion::Frustrated).unwrap();
        assert_eq!(json, "\"frustrated\"");
    }

    #[test]
    fn test_hostile_subset_of_negative() {
        for emotion in Emotion::ALL {
            if emotion.is_hostile() {
                assert!(emotion.is_negative());
            }
        }
    }

    #[test]
    fn test_scores_are_clamped() {
        let result = SentimentResult::new(Emotion::Angry, 1.4, -0.2, 0.5);
        assert_eq!(result.intensity, 1.0);
        assert_eq!(result.urgency, 0.0);
    }

    #[test]
    fn test_topics_sorted() {
        let result = SentimentResult::neutral().with_topics(vec![
            TopicalIntent::new("pricing", 0.5),
            TopicalIntent::new("inventory", 0.9),
            TopicalIntent::new("finance", 0.5),
        ]);
        let order: Vec<_> = result.topics.iter().map(|t| t.topic.as_str()).collect();
        assert_eq!(order, vec!["inventory", "finance", "pricing"]);
    }
}
