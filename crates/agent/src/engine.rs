//! Routing engine
//!
//! Decides which specialist agent handles a message in three phases:
//!
//! 1. **History**: a hostile message from a customer with prior escalations
//!    goes straight to the general agent and escalates.
//! 2. **Sentiment**: acute urgency or intensity flags escalation but routing
//!    continues.
//! 3. **Content**: every agent is scored; the best score wins unless it falls
//!    below the confidence floor, in which case the general agent takes over.
//!
//! The engine is pure: it reads the registry and its inputs and never touches
//! storage. Internal failures degrade to a general-agent handoff.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use dealer_agent_config::RoutingConfig;
use dealer_agent_core::{
    AgentKind, CustomerContext, EscalationReason, EscalationState, Message, RoutingDecision,
    RoutingDegradationError, SentimentResult,
};

use crate::registry::AgentRegistry;
use crate::scoring::{ContentScorer, PreparedText};

pub struct RoutingEngine {
    registry: Arc<AgentRegistry>,
    config: RoutingConfig,
    scorer: ContentScorer,
}

impl RoutingEngine {
    pub fn new(registry: Arc<AgentRegistry>, config: RoutingConfig) -> Self {
        let scorer = ContentScorer::new(config.similarity_weight, config.tag_weight);
        Self {
            registry,
            config,
            scorer,
        }
    }

    pub fn registry(&self) -> &Arc<AgentRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    /// Route a message, handing off to the general agent on internal failure
    pub fn route(
        &self,
        message: &Message,
        sentiment: &SentimentResult,
        context: &CustomerContext,
        escalation: &EscalationState,
    ) -> RoutingDecision {
        match self.try_route(message, sentiment, context, escalation) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(
                    message_id = %message.id,
                    conversation_id = %message.conversation_id,
                    error = %e,
                    "Routing degraded, handing off to general agent"
                );
                metrics::counter!("routing_degradations_total").increment(1);
                RoutingDecision::degraded(&message.id, &message.conversation_id)
            }
        }
    }

    /// Route a message, surfacing internal failures
    pub fn try_route(
        &self,
        message: &Message,
        sentiment: &SentimentResult,
        context: &CustomerContext,
        escalation: &EscalationState,
    ) -> Result<RoutingDecision, RoutingDegradationError> {
        if self.registry.is_empty() {
            return Err(RoutingDegradationError::EmptyRegistry);
        }
        if self.registry.handoff().is_none() {
            return Err(RoutingDegradationError::MissingHandoffAgent);
        }
        Self::check_sentiment(sentiment)?;

        // Phase 1: history
        if context.has_prior_escalation()
            && sentiment.emotion.is_hostile()
            && sentiment.intensity >= self.config.repeat_negative_intensity
        {
            tracing::debug!(
                message_id = %message.id,
                prior_escalations = context.prior_escalation_count,
                emotion = %sentiment.emotion,
                "Repeat negative sentiment, routing to general agent"
            );
            return Ok(self.decision(
                message,
                AgentKind::General,
                sentiment.confidence,
                Some(EscalationReason::RepeatNegativeSentiment),
                BTreeMap::new(),
            ));
        }

        // Phase 2: sentiment
        let acute = sentiment.urgency >= self.config.acute_urgency
            || sentiment.intensity >= self.config.acute_intensity;

        // Phase 3: content
        let prepared = PreparedText::new(&message.text);
        let mut breakdown = BTreeMap::new();
        for agent in self.registry.agents() {
            let score = self
                .scorer
                .score(&prepared, &agent.profile, &agent.utterances, &sentiment.topics);
            if !score.score.is_finite() {
                return Err(RoutingDegradationError::NonFiniteScore {
                    agent: agent.kind().to_string(),
                });
            }
            breakdown.insert(agent.kind(), score.score);
        }

        // Strict comparison over id order keeps the lowest id on ties
        let (top_agent, top_score) = breakdown.iter().fold(
            (AgentKind::General, f32::NEG_INFINITY),
            |(best_kind, best_score), (&kind, &score)| {
                if score > best_score {
                    (kind, score)
                } else {
                    (best_kind, best_score)
                }
            },
        );
        let general_score = breakdown.get(&AgentKind::General).copied().unwrap_or(0.0);

        let (selected, confidence) = if escalation.is_escalated() {
            (AgentKind::General, general_score)
        } else if top_score < self.config.min_confidence {
            (AgentKind::General, general_score)
        } else {
            (top_agent, top_score)
        };

        tracing::debug!(
            message_id = %message.id,
            selected = %selected,
            confidence,
            top_agent = %top_agent,
            top_score,
            acute,
            "Routed message"
        );

        Ok(self.decision(
            message,
            selected,
            confidence,
            acute.then_some(EscalationReason::AcuteSentiment),
            breakdown,
        ))
    }

    fn check_sentiment(sentiment: &SentimentResult) -> Result<(), RoutingDegradationError> {
        let fields = [
            ("intensity", sentiment.intensity),
            ("urgency", sentiment.urgency),
            ("confidence", sentiment.confidence),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(RoutingDegradationError::InvalidSentiment(format!(
                    "{} is {}",
                    name, value
                )));
            }
        }
        if let Some(topic) = sentiment.topics.iter().find(|t| !t.confidence.is_finite()) {
            return Err(RoutingDegradationError::InvalidSentiment(format!(
                "topic {} confidence is {}",
                topic.topic, topic.confidence
            )));
        }
        Ok(())
    }

    fn decision(
        &self,
        message: &Message,
        selected: AgentKind,
        confidence: f32,
        reason: Option<EscalationReason>,
        scoring_breakdown: BTreeMap<AgentKind, f32>,
    ) -> RoutingDecision {
        RoutingDecision {
            message_id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            selected_agent_id: selected,
            confidence: confidence.clamp(0.0, 1.0),
            escalate: reason.is_some(),
            escalation_reason: reason,
            scoring_breakdown,
            degraded: false,
            decided_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dealer_agent_config::AgentRegistryConfig;
    use dealer_agent_core::{AgentProfile, Emotion, TopicalIntent};

    const SHIPPED: &str = include_str!("../../../config/agents.yaml");

    fn engine() -> RoutingEngine {
        let registry =
            AgentRegistry::from_config(AgentRegistryConfig::from_yaml(SHIPPED).unwrap()).unwrap();
        RoutingEngine::new(Arc::new(registry), RoutingConfig::default())
    }

    fn message(text: &str) -> Message {
        Message::new("conv-1", "cust-1", text)
    }

    fn normal() -> EscalationState {
        EscalationState::new("conv-1")
    }

    #[test]
    fn test_history_phase_escalates_repeat_negative() {
        let engine = engine();
        let sentiment = SentimentResult::new(Emotion::Angry, 0.9, 0.3, 0.75);
        let context = CustomerContext::new("cust-1").with_prior_escalations(1);

        let decision = engine.route(&message("This is ridiculous"), &sentiment, &context, &normal());
        assert_eq!(decision.selected_agent_id, AgentKind::General);
        assert!(decision.escalate);
        assert_eq!(
            decision.escalation_reason,
            Some(EscalationReason::RepeatNegativeSentiment)
        );
        assert_eq!(decision.confidence, 0.75);
        assert!(decision.scoring_breakdown.is_empty());
    }

    #[test]
    fn test_history_phase_needs_hostile_emotion() {
        let engine = engine();
        let sentiment = SentimentResult::new(Emotion::Disappointed, 0.9, 0.0, 0.8);
        let context = CustomerContext::new("cust-1").with_prior_escalations(2);

        let decision = engine.route(&message("ok"), &sentiment, &context, &normal());
        assert_ne!(
            decision.escalation_reason,
            Some(EscalationReason::RepeatNegativeSentiment)
        );
    }

    #[test]
    fn test_acute_sentiment_escalates_but_keeps_scoring() {
        let engine = engine();
        let sentiment = SentimentResult::new(Emotion::Anxious, 0.5, 0.85, 0.7)
            .with_topics(vec![TopicalIntent::new("service", 0.9)]);
        let context = CustomerContext::new("cust-1");

        let decision = engine.route(
            &message("I need my car serviced right now"),
            &sentiment,
            &context,
            &normal(),
        );
        assert!(decision.escalate);
        assert_eq!(decision.escalation_reason, Some(EscalationReason::AcuteSentiment));
        assert_eq!(decision.selected_agent_id, AgentKind::Service);
        assert_eq!(decision.scoring_breakdown.len(), AgentKind::ALL.len());
    }

    #[test]
    fn test_content_routes_to_inventory() {
        let engine = engine();
        let sentiment = SentimentResult::new(Emotion::Curious, 0.25, 0.0, 0.55).with_topics(vec![
            TopicalIntent::new("pricing", 0.9),
            TopicalIntent::new("inventory", 0.85),
        ]);

        let decision = engine.route(
            &message("What's the MSRP on the 2024 Highlander?"),
            &sentiment,
            &CustomerContext::new("cust-1"),
            &normal(),
        );
        assert_eq!(decision.selected_agent_id, AgentKind::Inventory);
        assert!(decision.confidence >= 0.35);
        assert!(!decision.escalate);
        assert!(decision.is_consistent());
    }

    #[test]
    fn test_low_confidence_falls_back_to_general() {
        let engine = engine();
        let decision = engine.route(
            &message("ok"),
            &SentimentResult::neutral(),
            &CustomerContext::new("cust-1"),
            &normal(),
        );
        assert_eq!(decision.selected_agent_id, AgentKind::General);
        assert_eq!(decision.confidence, decision.scoring_breakdown[&AgentKind::General]);
    }

    #[test]
    fn test_escalated_conversation_is_pinned_to_general() {
        let engine = engine();
        let sentiment = SentimentResult::new(Emotion::Curious, 0.25, 0.0, 0.55)
            .with_topics(vec![TopicalIntent::new("inventory", 0.85)]);
        let mut state = normal();
        state.status = dealer_agent_core::EscalationStatus::Escalated;

        let decision = engine.route(
            &message("Do you have any trucks in stock?"),
            &sentiment,
            &CustomerContext::new("cust-1"),
            &state,
        );
        assert_eq!(decision.selected_agent_id, AgentKind::General);
    }

    #[test]
    fn test_ties_prefer_lowest_agent_id() {
        let registry = AgentRegistry::from_profiles([
            AgentProfile::new(AgentKind::Service).with_utterances(["oil change"]),
            AgentProfile::new(AgentKind::Finance).with_utterances(["oil change"]),
            AgentProfile::new(AgentKind::General).with_utterances(["hello"]),
        ]);
        let engine = RoutingEngine::new(Arc::new(registry), RoutingConfig::default());

        let decision = engine.route(
            &message("oil change"),
            &SentimentResult::neutral(),
            &CustomerContext::new("cust-1"),
            &normal(),
        );
        assert_eq!(decision.selected_agent_id, AgentKind::Finance);
    }

    #[test]
    fn test_non_finite_score_degrades() {
        let registry = AgentRegistry::from_profiles([
            AgentProfile::new(AgentKind::Sales)
                .with_utterances(["hello"])
                .with_priority_weight(f32::NAN),
            AgentProfile::new(AgentKind::General).with_utterances(["hi"]),
        ]);
        let engine = RoutingEngine::new(Arc::new(registry), RoutingConfig::default());

        let msg = message("hello");
        let err = engine
            .try_route(&msg, &SentimentResult::neutral(), &CustomerContext::new("c"), &normal())
            .unwrap_err();
        assert!(matches!(err, RoutingDegradationError::NonFiniteScore { .. }));

        let decision =
            engine.route(&msg, &SentimentResult::neutral(), &CustomerContext::new("c"), &normal());
        assert!(decision.degraded);
        assert_eq!(decision.selected_agent_id, AgentKind::General);
        assert_eq!(decision.confidence, 0.0);
        assert!(!decision.escalate);
    }

    #[test]
    fn test_missing_handoff_agent_degrades() {
        let registry = AgentRegistry::from_profiles([
            AgentProfile::new(AgentKind::Sales).with_utterances(["hello"])
        ]);
        let engine = RoutingEngine::new(Arc::new(registry), RoutingConfig::default());
        let err = engine
            .try_route(
                &message("hello"),
                &SentimentResult::neutral(),
                &CustomerContext::new("c"),
                &normal(),
            )
            .unwrap_err();
        assert_eq!(err, RoutingDegradationError::MissingHandoffAgent);
    }

    #[test]
    fn test_nan_sentiment_degrades() {
        let engine = engine();
        let mut sentiment = SentimentResult::neutral();
        sentiment.urgency = f32::NAN;
        let decision = engine.route(
            &message("hello"),
            &sentiment,
            &CustomerContext::new("c"),
            &normal(),
        );
        assert!(decision.degraded);
    }
}
