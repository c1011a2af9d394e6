//! Per-conversation escalation lifecycle types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Why a message asked for human attention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EscalationReason {
    RepeatNegativeSentiment,
    AcuteSentiment,
}

impl EscalationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationReason::RepeatNegativeSentiment => "repeat-negative-sentiment",
            EscalationReason::AcuteSentiment => "acute-sentiment",
        }
    }
}

impl std::fmt::Display for EscalationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EscalationStatus {
    #[default]
    Normal,
    Watch,
    Escalated,
    Resolved,
}

impl EscalationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EscalationStatus::Normal => "normal",
            EscalationStatus::Watch => "watch",
            EscalationStatus::Escalated => "escalated",
            EscalationStatus::Resolved => "resolved",
        }
    }

    /// Statuses reachable in one legal step
    pub fn valid_transitions(&self) -> &'static [EscalationStatus] {
        match self {
            EscalationStatus::Normal => &[EscalationStatus::Watch],
            EscalationStatus::Watch => &[EscalationStatus::Escalated],
            EscalationStatus::Escalated => &[EscalationStatus::Resolved],
            EscalationStatus::Resolved => &[EscalationStatus::Normal],
        }
    }

    pub fn can_transition_to(&self, target: EscalationStatus) -> bool {
        self.valid_transitions().contains(&target)
    }
}

impl std::fmt::Display for EscalationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Escalation state of one conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationState {
    pub conversation_id: String,
    pub status: EscalationStatus,
    pub triggered_at: Option<DateTime<Utc>>,
    pub trigger_reason: Option<EscalationReason>,
    /// Time of the most recent escalate signal
    pub last_signal_at: Option<DateTime<Utc>>,
    pub signal_count: u32,
}

impl EscalationState {
    pub fn new(conversation_id: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            status: EscalationStatus::Normal,
            triggered_at: None,
            trigger_reason: None,
            last_signal_at: None,
            signal_count: 0,
        }
    }

    pub fn is_escalated(&self) -> bool {
        self.status == EscalationStatus::Escalated
    }
}

/// Event handed to the notification layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationEvent {
    pub conversation_id: String,
    pub reason: EscalationReason,
    pub occurred_at: DateTime<Utc>,
}

impl EscalationEvent {
    pub fn new(
        conversation_id: impl Into<String>,
        reason: EscalationReason,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            reason,
            occurred_at,
        }
    }

    /// Deduplication key for at-least-once delivery
    pub fn idempotency_key(&self) -> String {
        format!(
            "{}:{}:{}",
            self.conversation_id,
            self.reason,
            self.occurred_at.timestamp_millis()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_wire_format() {
        let json = serde_json::to_string(&EscalationReason::RepeatNegativeSentiment).unwrap();
        assert_eq!(json, "\"repeat-negative-sentiment\"");
    }

    #[test]
    fn test_transition_table_is_a_cycle() {
        let mut status = EscalationStatus::Normal;
        for _ in 0..4 {
            let next = status.valid_transitions()[0];
            assert!(status.can_transition_to(next));
            status = next;
        }
        assert_eq!(status, EscalationStatus::Normal);
        assert!(!EscalationStatus::Normal.can_transition_to(EscalationStatus::Escalated));
        assert!(!EscalationStatus::Watch.can_transition_to(EscalationStatus::Resolved));
    }

    #[test]
    fn test_idempotency_key_is_stable() {
        let at = Utc::now();
        let a = EscalationEvent::new("c1", EscalationReason::AcuteSentiment, at);
        let b = a.clone();
        assert_eq!(a.idempotency_key(), b.idempotency_key());
        assert!(a.idempotency_key().starts_with("c1:acute-sentiment:"));
    }
}
