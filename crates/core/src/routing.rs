//! Routing decision produced once per message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::agent::AgentKind;
use crate::escalation::EscalationReason;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingDecision {
    pub message_id: String,
    pub conversation_id: String,
    pub selected_agent_id: AgentKind,
    pub confidence: f32,
    pub escalate: bool,
    /// Present exactly when `escalate` is true
    pub escalation_reason: Option<EscalationReason>,
    #[serde(default)]
    pub scoring_breakdown: BTreeMap<AgentKind, f32>,
    /// Set only when routing failed internally and fell back to the handoff agent
    #[serde(default)]
    pub degraded: bool,
    #[serde(default = "Utc::now")]
    pub decided_at: DateTime<Utc>,
}

impl RoutingDecision {
    /// Handoff decision returned when routing fails internally
    pub fn degraded(message_id: impl Into<String>, conversation_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            conversation_id: conversation_id.into(),
            selected_agent_id: AgentKind::General,
            confidence: 0.0,
            escalate: false,
            escalation_reason: None,
            scoring_breakdown: BTreeMap::new(),
            degraded: true,
            decided_at: Utc::now(),
        }
    }

    /// `escalate` and `escalation_reason` agree and confidence is in range
    pub fn is_consistent(&self) -> bool {
        self.escalate == self.escalation_reason.is_some()
            && (0.0..=1.0).contains(&self.confidence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degraded_decision_shape() {
        let decision = RoutingDecision::degraded("m1", "c1");
        assert_eq!(decision.selected_agent_id, AgentKind::General);
        assert_eq!(decision.confidence, 0.0);
        assert!(!decision.escalate);
        assert!(decision.degraded);
        assert!(decision.is_consistent());
    }

    #[test]
    fn test_breakdown_serializes_with_agent_keys() {
        let mut decision = RoutingDecision::degraded("m1", "c1");
        decision.scoring_breakdown.insert(AgentKind::TradeIn, 0.5);
        let json = serde_json::to_value(&decision).unwrap();
        assert_eq!(json["scoring_breakdown"]["trade_in"], 0.5);
        assert_eq!(json["selected_agent_id"], "general");
    }
}
