//! Per-customer interaction history

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agent::AgentKind;
use crate::sentiment::SentimentResult;

/// Rolling interaction history used to bias routing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerContext {
    pub customer_id: String,
    #[serde(default)]
    pub prior_escalation_count: u32,
    #[serde(default)]
    pub last_sentiment: Option<SentimentResult>,
    #[serde(default)]
    pub last_agent: Option<AgentKind>,
    /// Monotonically non-decreasing
    #[serde(default)]
    pub message_count: u64,
    #[serde(default)]
    pub last_interaction_at: Option<DateTime<Utc>>,
}

impl CustomerContext {
    /// Fresh context for a customer seen for the first time
    pub fn new(customer_id: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            prior_escalation_count: 0,
            last_sentiment: None,
            last_agent: None,
            message_count: 0,
            last_interaction_at: None,
        }
    }

    pub fn with_prior_escalations(mut self, count: u32) -> Self {
        self.prior_escalation_count = count;
        self
    }

    /// Fold one routed message into the history
    ///
    /// `escalated` is true only when this message moved the conversation
    /// into `escalated`; a first signal that stops at `watch` is not counted.
    pub fn record(
        &mut self,
        sentiment: SentimentResult,
        agent: AgentKind,
        escalated: bool,
        at: DateTime<Utc>,
    ) {
        self.message_count += 1;
        self.last_sentiment = Some(sentiment);
        self.last_agent = Some(agent);
        if escalated {
            self.prior_escalation_count += 1;
        }
        self.last_interaction_at = Some(at);
    }

    pub fn has_prior_escalation(&self) -> bool {
        self.prior_escalation_count > 0
    }
}
