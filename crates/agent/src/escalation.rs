//! Per-conversation escalation state machine
//!
//! ```text
//! normal --signal--> watch --second signal in window--> escalated
//!                          --repeat-negative----------> escalated
//! escalated --acknowledge--> resolved --next message--> normal
//! ```
//!
//! A repeat-negative signal arriving in `normal` passes through `watch` and
//! escalates in the same step. Illegal requests never change state; they are
//! logged as [`EscalationTransitionError`] and otherwise ignored.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use dealer_agent_config::constants::escalation::MAX_WINDOW_SECS;
use dealer_agent_config::EscalationConfig;
use dealer_agent_core::{
    EscalationReason, EscalationState, EscalationStatus, EscalationTransitionError,
};
use serde::{Deserialize, Serialize};

const MAX_HISTORY: usize = 32;

/// One applied state change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationTransition {
    pub from: EscalationStatus,
    pub to: EscalationStatus,
    pub reason: Option<EscalationReason>,
    pub at: DateTime<Utc>,
}

/// Result of an operator acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcknowledgeOutcome {
    /// Whether the conversation moved to `resolved`
    pub applied: bool,
    pub state: EscalationState,
}

#[derive(Debug, Clone)]
struct Entry {
    state: EscalationState,
    history: Vec<EscalationTransition>,
}

impl Entry {
    fn new(conversation_id: &str) -> Self {
        Self {
            state: EscalationState::new(conversation_id),
            history: Vec::new(),
        }
    }

    fn apply(
        &mut self,
        to: EscalationStatus,
        reason: Option<EscalationReason>,
        at: DateTime<Utc>,
    ) -> Result<EscalationTransition, EscalationTransitionError> {
        let from = self.state.status;
        if !from.can_transition_to(to) {
            return Err(EscalationTransitionError {
                conversation_id: self.state.conversation_id.clone(),
                from,
                request: format!("transition to {}", to),
            });
        }

        // History never runs backwards, whichever clock supplied `at`
        let at = self.history.last().map_or(at, |last| at.max(last.at));

        self.state.status = to;
        match to {
            EscalationStatus::Normal => {
                self.state.triggered_at = None;
                self.state.trigger_reason = None;
                self.state.last_signal_at = None;
                self.state.signal_count = 0;
            }
            EscalationStatus::Watch | EscalationStatus::Escalated => {
                self.state.triggered_at = Some(at);
                self.state.trigger_reason = reason;
            }
            EscalationStatus::Resolved => {}
        }

        let transition = EscalationTransition {
            from,
            to,
            reason,
            at,
        };
        self.history.push(transition.clone());
        if self.history.len() > MAX_HISTORY {
            let excess = self.history.len() - MAX_HISTORY;
            self.history.drain(..excess);
        }

        tracing::info!(
            conversation_id = %self.state.conversation_id,
            from = %from,
            to = %to,
            reason = reason.map(|r| r.as_str()).unwrap_or("none"),
            "Escalation state changed"
        );
        Ok(transition)
    }
}

/// Escalation states keyed by conversation id
pub struct EscalationStateMachine {
    states: DashMap<String, Entry>,
    window: Duration,
}

impl EscalationStateMachine {
    pub fn new(config: &EscalationConfig) -> Self {
        Self {
            states: DashMap::new(),
            window: Duration::seconds(config.window_secs.min(MAX_WINDOW_SECS) as i64),
        }
    }

    /// Current state, `normal` for unseen conversations
    pub fn get(&self, conversation_id: &str) -> EscalationState {
        self.states
            .get(conversation_id)
            .map(|e| e.state.clone())
            .unwrap_or_else(|| EscalationState::new(conversation_id))
    }

    /// Applied transitions, oldest first
    pub fn history(&self, conversation_id: &str) -> Vec<EscalationTransition> {
        self.states
            .get(conversation_id)
            .map(|e| e.history.clone())
            .unwrap_or_default()
    }

    /// A new message arrived: a resolved conversation returns to normal
    ///
    /// Conversations that never signalled are not stored.
    pub fn on_new_message(&self, conversation_id: &str, at: DateTime<Utc>) -> EscalationState {
        let Some(mut entry) = self.states.get_mut(conversation_id) else {
            return EscalationState::new(conversation_id);
        };

        if entry.state.status == EscalationStatus::Resolved {
            if let Err(e) = entry.apply(EscalationStatus::Normal, None, at) {
                tracing::warn!(error = %e, "Rejected escalation transition");
            }
        }
        entry.state.clone()
    }

    /// Record an escalate signal from a routing decision
    pub fn signal(
        &self,
        conversation_id: &str,
        reason: EscalationReason,
        at: DateTime<Utc>,
    ) -> EscalationState {
        let mut entry = self
            .states
            .entry(conversation_id.to_string())
            .or_insert_with(|| Entry::new(conversation_id));

        let result = match entry.state.status {
            EscalationStatus::Normal => {
                let watched = entry.apply(EscalationStatus::Watch, Some(reason), at);
                if watched.is_ok() && reason == EscalationReason::RepeatNegativeSentiment {
                    entry.apply(EscalationStatus::Escalated, Some(reason), at)
                } else {
                    watched
                }
            }
            EscalationStatus::Watch => {
                let within_window = entry
                    .state
                    .last_signal_at
                    .map(|last| at - last <= self.window)
                    .unwrap_or(false);
                if reason == EscalationReason::RepeatNegativeSentiment || within_window {
                    entry.apply(EscalationStatus::Escalated, Some(reason), at)
                } else {
                    tracing::debug!(
                        conversation_id,
                        "Escalate signal outside window, staying in watch"
                    );
                    entry.state.triggered_at = Some(at);
                    entry.state.trigger_reason = Some(reason);
                    entry.state.last_signal_at = Some(at);
                    entry.state.signal_count += 1;
                    return entry.state.clone();
                }
            }
            EscalationStatus::Escalated => {
                tracing::debug!(conversation_id, "Already escalated, signal ignored");
                return entry.state.clone();
            }
            EscalationStatus::Resolved => Err(EscalationTransitionError {
                conversation_id: conversation_id.to_string(),
                from: EscalationStatus::Resolved,
                request: format!("signal {}", reason),
            }),
        };

        match result {
            Ok(_) => {
                entry.state.last_signal_at = Some(at);
                entry.state.signal_count += 1;
            }
            Err(e) => tracing::warn!(error = %e, "Rejected escalation transition"),
        }
        entry.state.clone()
    }

    /// Operator acknowledgement. Only legal from `escalated`.
    pub fn acknowledge(&self, conversation_id: &str, at: DateTime<Utc>) -> AcknowledgeOutcome {
        let Some(mut entry) = self.states.get_mut(conversation_id) else {
            tracing::warn!(conversation_id, "Acknowledge for a conversation that never escalated");
            return AcknowledgeOutcome {
                applied: false,
                state: EscalationState::new(conversation_id),
            };
        };

        let applied = match entry.apply(EscalationStatus::Resolved, None, at) {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected escalation acknowledgement");
                false
            }
        };

        AcknowledgeOutcome {
            applied,
            state: entry.state.clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

impl Default for EscalationStateMachine {
    fn default() -> Self {
        Self::new(&EscalationConfig::default())
    }
}
