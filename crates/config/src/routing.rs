//! Routing, escalation, classifier and notifier settings

use serde::{Deserialize, Serialize};

use crate::constants::{classifier, escalation, notifier, routing};
use crate::ConfigError;

fn check_unit(field: &str, value: f32) -> Result<(), ConfigError> {
    if !(0.0..=1.0).contains(&value) {
        return Err(ConfigError::invalid(
            field,
            format!("Must be between 0.0 and 1.0, got {}", value),
        ));
    }
    Ok(())
}

/// Thresholds used by the routing phases
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    #[serde(default = "default_repeat_negative_intensity")]
    pub repeat_negative_intensity: f32,

    #[serde(default = "default_acute_urgency")]
    pub acute_urgency: f32,

    #[serde(default = "default_acute_intensity")]
    pub acute_intensity: f32,

    #[serde(default = "default_similarity_weight")]
    pub similarity_weight: f32,

    #[serde(default = "default_tag_weight")]
    pub tag_weight: f32,

    #[serde(default = "default_latency_budget_ms")]
    pub latency_budget_ms: u64,

    #[serde(default = "default_dedup_window")]
    pub dedup_window: usize,
}

fn default_min_confidence() -> f32 {
    routing::MIN_CONFIDENCE
}
fn default_repeat_negative_intensity() -> f32 {
    routing::REPEAT_NEGATIVE_INTENSITY
}
fn default_acute_urgency() -> f32 {
    routing::ACUTE_URGENCY
}
fn default_acute_intensity() -> f32 {
    routing::ACUTE_INTENSITY
}
fn default_similarity_weight() -> f32 {
    routing::SIMILARITY_WEIGHT
}
fn default_tag_weight() -> f32 {
    routing::TAG_WEIGHT
}
fn default_latency_budget_ms() -> u64 {
    routing::LATENCY_BUDGET_MS
}
fn default_dedup_window() -> usize {
    routing::DEDUP_WINDOW
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            min_confidence: default_min_confidence(),
            repeat_negative_intensity: default_repeat_negative_intensity(),
            acute_urgency: default_acute_urgency(),
            acute_intensity: default_acute_intensity(),
            similarity_weight: default_similarity_weight(),
            tag_weight: default_tag_weight(),
            latency_budget_ms: default_latency_budget_ms(),
            dedup_window: default_dedup_window(),
        }
    }
}

impl RoutingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("routing.min_confidence", self.min_confidence)?;
        check_unit(
            "routing.repeat_negative_intensity",
            self.repeat_negative_intensity,
        )?;
        check_unit("routing.acute_urgency", self.acute_urgency)?;
        check_unit("routing.acute_intensity", self.acute_intensity)?;
        check_unit("routing.similarity_weight", self.similarity_weight)?;
        check_unit("routing.tag_weight", self.tag_weight)?;

        if self.similarity_weight + self.tag_weight <= 0.0 {
            return Err(ConfigError::invalid(
                "routing.similarity_weight",
                "similarity_weight and tag_weight cannot both be zero",
            ));
        }
        if self.latency_budget_ms == 0 {
            return Err(ConfigError::invalid(
                "routing.latency_budget_ms",
                "Must be greater than zero",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EscalationConfig {
    /// Second-signal window for watch -> escalated
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_window_secs() -> u64 {
    escalation::WINDOW_SECS
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
        }
    }
}

impl EscalationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_secs == 0 || self.window_secs > escalation::MAX_WINDOW_SECS {
            return Err(ConfigError::invalid(
                "escalation.window_secs",
                format!(
                    "Must be between 1 and {}, got {}",
                    escalation::MAX_WINDOW_SECS,
                    self.window_secs
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClassifierBackend {
    /// In-process lexicon classifier
    #[default]
    Lexicon,
    /// Remote model over HTTP
    Http,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    #[serde(default)]
    pub backend: ClassifierBackend,

    /// Required for the HTTP backend
    #[serde(default)]
    pub endpoint: Option<String>,

    #[serde(default = "default_classifier_timeout_ms")]
    pub timeout_ms: u64,

    #[serde(default = "default_classifier_min_confidence")]
    pub min_confidence: f32,
}

fn default_classifier_timeout_ms() -> u64 {
    classifier::TIMEOUT_MS
}
fn default_classifier_min_confidence() -> f32 {
    classifier::MIN_CONFIDENCE
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            backend: ClassifierBackend::Lexicon,
            endpoint: None,
            timeout_ms: default_classifier_timeout_ms(),
            min_confidence: default_classifier_min_confidence(),
        }
    }
}

impl ClassifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_unit("classifier.min_confidence", self.min_confidence)?;
        if self.timeout_ms == 0 || self.timeout_ms > 10_000 {
            return Err(ConfigError::invalid(
                "classifier.timeout_ms",
                format!("Must be between 1 and 10000, got {}", self.timeout_ms),
            ));
        }
        if self.backend == ClassifierBackend::Http
            && self.endpoint.as_deref().map(str::is_empty).unwrap_or(true)
        {
            return Err(ConfigError::MissingField("classifier.endpoint".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Structured log line only
    #[default]
    Log,
    /// HTTP POST to `webhook_url`
    Webhook,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    #[serde(default)]
    pub kind: NotifierKind,

    #[serde(default)]
    pub webhook_url: Option<String>,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    notifier::MAX_RETRIES
}
fn default_backoff_ms() -> u64 {
    notifier::BACKOFF_MS
}
fn default_notifier_timeout_secs() -> u64 {
    notifier::TIMEOUT_SECS
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            kind: NotifierKind::Log,
            webhook_url: None,
            max_retries: default_max_retries(),
            backoff_ms: default_backoff_ms(),
            timeout_secs: default_notifier_timeout_secs(),
        }
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.kind == NotifierKind::Webhook
            && self.webhook_url.as_deref().map(str::is_empty).unwrap_or(true)
        {
            return Err(ConfigError::MissingField("notifier.webhook_url".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::invalid(
                "notifier.timeout_secs",
                "Must be greater than zero",
            ));
        }
        Ok(())
    }
}
