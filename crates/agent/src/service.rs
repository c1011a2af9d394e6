//! Routing service
//!
//! Orchestrates one message end to end:
//!
//! ```text
//! acquire customer slot -> dedup -> reset resolved escalation
//!   -> classify (timeout, neutral fallback) -> load context
//!   -> route -> escalation signal -> notify -> save context
//! ```
//!
//! Every collaborator failure is recovered locally, so `route_message`
//! always returns a decision. A context that could not be read is never
//! written back.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use dealer_agent_config::{ClassifierConfig, EscalationConfig, RoutingConfig, Settings};
use dealer_agent_core::{
    AgentProfile, ClassificationError, ContextStore, CustomerContext, EscalationEvent,
    EscalationNotifier, EscalationState, EscalationStatus, Message, RenderedTemplate,
    RoutingDecision, SentimentClassifier, SentimentResult, TemplateCatalog, TemplateType,
};

use crate::context::InMemoryContextStore;
use crate::engine::RoutingEngine;
use crate::escalation::{AcknowledgeOutcome, EscalationStateMachine, EscalationTransition};
use crate::notifier::LogNotifier;
use crate::registry::AgentRegistry;
use crate::slots::CustomerSlots;
use crate::templates::TemplateSelector;
use crate::{AgentError, Result};

pub struct RoutingService {
    engine: RoutingEngine,
    classifier: Arc<dyn SentimentClassifier>,
    contexts: Arc<dyn ContextStore>,
    notifier: Arc<dyn EscalationNotifier>,
    escalations: EscalationStateMachine,
    selector: TemplateSelector,
    slots: CustomerSlots,
    classifier_config: ClassifierConfig,
}

impl RoutingService {
    /// Service with default thresholds, an in-memory context store and a
    /// log notifier
    pub fn new(
        registry: Arc<AgentRegistry>,
        catalog: Arc<dyn TemplateCatalog>,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Self {
        let routing = RoutingConfig::default();
        Self {
            slots: CustomerSlots::new(routing.dedup_window),
            engine: RoutingEngine::new(registry.clone(), routing),
            classifier,
            contexts: Arc::new(InMemoryContextStore::new()),
            notifier: Arc::new(LogNotifier::new()),
            escalations: EscalationStateMachine::default(),
            selector: TemplateSelector::new(catalog, registry),
            classifier_config: ClassifierConfig::default(),
        }
    }

    /// Apply the routing, escalation and classifier sections of settings
    pub fn from_settings(
        settings: &Settings,
        registry: Arc<AgentRegistry>,
        catalog: Arc<dyn TemplateCatalog>,
        classifier: Arc<dyn SentimentClassifier>,
    ) -> Self {
        Self::new(registry, catalog, classifier)
            .with_routing_config(settings.routing.clone())
            .with_escalation_config(&settings.escalation)
            .with_classifier_config(settings.classifier.clone())
    }

    pub fn with_routing_config(mut self, config: RoutingConfig) -> Self {
        self.slots = CustomerSlots::new(config.dedup_window);
        self.engine = RoutingEngine::new(self.engine.registry().clone(), config);
        self
    }

    pub fn with_escalation_config(mut self, config: &EscalationConfig) -> Self {
        self.escalations = EscalationStateMachine::new(config);
        self
    }

    pub fn with_classifier_config(mut self, config: ClassifierConfig) -> Self {
        self.classifier_config = config;
        self
    }

    pub fn with_context_store(mut self, store: Arc<dyn ContextStore>) -> Self {
        self.contexts = store;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn EscalationNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Route one inbound message
    pub async fn route_message(&self, message: Message) -> RoutingDecision {
        let started = Instant::now();
        let mut slot = self.slots.acquire(&message.customer_id).await;

        if let Some(previous) = slot.lookup(&message.id) {
            tracing::debug!(
                message_id = %message.id,
                customer_id = %message.customer_id,
                "Duplicate delivery, returning previous decision"
            );
            metrics::counter!("routing_duplicates_total").increment(1);
            return previous.clone();
        }

        let now = message.received_at;
        let escalation = self.escalations.on_new_message(&message.conversation_id, now);
        let sentiment = self.classify(&message).await;
        let (context, read_ok) = self.load_context(&message.customer_id).await;

        let decision = self.engine.route(&message, &sentiment, &context, &escalation);

        let mut entered_escalation = false;
        if let Some(reason) = decision.escalation_reason {
            let after = self
                .escalations
                .signal(&message.conversation_id, reason, now);
            entered_escalation = escalation.status != EscalationStatus::Escalated
                && after.status == EscalationStatus::Escalated;
            metrics::counter!("routing_escalations_total", "reason" => reason.as_str())
                .increment(1);
            self.notify(EscalationEvent::new(&message.conversation_id, reason, now));
        }

        if read_ok {
            let mut updated = context;
            updated.record(sentiment, decision.selected_agent_id, entered_escalation, now);
            if let Err(e) = self.contexts.save(&updated).await {
                self.context_write_failed(&message, &e.to_string());
            }
        } else {
            // The stored row was not seen, so writing would overwrite it
            self.context_write_failed(&message, "skipped after failed read");
        }

        slot.remember(message.id.clone(), decision.clone());
        drop(slot);

        let elapsed = started.elapsed();
        metrics::counter!(
            "routing_decisions_total",
            "agent" => decision.selected_agent_id.as_str()
        )
        .increment(1);
        metrics::histogram!("routing_latency_ms").record(elapsed.as_secs_f64() * 1000.0);

        let budget = Duration::from_millis(self.engine.config().latency_budget_ms);
        if elapsed > budget {
            tracing::warn!(
                message_id = %message.id,
                elapsed_ms = elapsed.as_millis() as u64,
                budget_ms = budget.as_millis() as u64,
                "Routing exceeded latency budget"
            );
        }

        tracing::info!(
            message_id = %message.id,
            conversation_id = %message.conversation_id,
            agent = %decision.selected_agent_id,
            confidence = decision.confidence,
            escalate = decision.escalate,
            degraded = decision.degraded,
            "Message routed"
        );
        decision
    }

    async fn classify(&self, message: &Message) -> SentimentResult {
        let timeout = Duration::from_millis(self.classifier_config.timeout_ms);
        let outcome = tokio::time::timeout(timeout, self.classifier.classify(&message.text))
            .await
            .unwrap_or(Err(ClassificationError::Timeout(self.classifier_config.timeout_ms)));

        match outcome {
            Ok(result) if result.confidence < self.classifier_config.min_confidence => {
                tracing::debug!(
                    message_id = %message.id,
                    confidence = result.confidence,
                    "Low classifier confidence, neutralizing sentiment"
                );
                result.neutralized()
            }
            Ok(result) => result,
            Err(e) => {
                let cause = match e {
                    ClassificationError::EmptyInput => "empty_input",
                    ClassificationError::Unparseable(_) => "unparseable",
                    ClassificationError::Timeout(_) => "timeout",
                    ClassificationError::Backend(_) => "backend",
                };
                tracing::warn!(
                    message_id = %message.id,
                    model_version = %self.classifier.model_version(),
                    error = %e,
                    "Classification failed, using neutral sentiment"
                );
                metrics::counter!("classifier_fallbacks_total", "cause" => cause).increment(1);
                SentimentResult::neutral()
            }
        }
    }

    /// Stored context, or a fresh one. The flag is false when the read
    /// failed and the fresh context must not be written back.
    async fn load_context(&self, customer_id: &str) -> (CustomerContext, bool) {
        match self.contexts.load(customer_id).await {
            Ok(Some(context)) => (context, true),
            Ok(None) => (CustomerContext::new(customer_id), true),
            Err(e) => {
                tracing::error!(
                    customer_id,
                    stage = "context_read",
                    error = %e,
                    "Pipeline error"
                );
                metrics::counter!("pipeline_errors_total", "stage" => "context_read").increment(1);
                (CustomerContext::new(customer_id), false)
            }
        }
    }

    fn context_write_failed(&self, message: &Message, error: &str) {
        tracing::error!(
            customer_id = %message.customer_id,
            message_id = %message.id,
            stage = "context_write",
            error,
            "Pipeline error"
        );
        metrics::counter!("pipeline_errors_total", "stage" => "context_write").increment(1);
    }

    fn notify(&self, event: EscalationEvent) {
        let notifier = self.notifier.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&event).await {
                tracing::error!(
                    conversation_id = %event.conversation_id,
                    notifier = notifier.name(),
                    stage = "notify",
                    error = %e,
                    "Pipeline error"
                );
                metrics::counter!("pipeline_errors_total", "stage" => "notify").increment(1);
            }
        });
    }

    /// Render a reply for a decision. Always returns usable text.
    pub fn render_reply(
        &self,
        decision: &RoutingDecision,
        lead_source_tags: &BTreeSet<String>,
        template_type: TemplateType,
        variables: &HashMap<String, String>,
    ) -> String {
        self.select_template(decision, lead_source_tags, template_type, variables)
            .text
    }

    /// Like [`render_reply`](Self::render_reply) but keeps template metadata
    pub fn select_template(
        &self,
        decision: &RoutingDecision,
        lead_source_tags: &BTreeSet<String>,
        template_type: TemplateType,
        variables: &HashMap<String, String>,
    ) -> RenderedTemplate {
        self.selector
            .select(decision, lead_source_tags, template_type, variables)
    }

    pub fn get_escalation_state(&self, conversation_id: &str) -> EscalationState {
        self.escalations.get(conversation_id)
    }

    pub fn get_escalation_history(&self, conversation_id: &str) -> Vec<EscalationTransition> {
        self.escalations.history(conversation_id)
    }

    pub fn acknowledge_escalation(&self, conversation_id: &str) -> AcknowledgeOutcome {
        self.escalations.acknowledge(conversation_id, Utc::now())
    }

    pub fn get_agent_registry_snapshot(&self) -> Vec<AgentProfile> {
        self.engine.registry().snapshot()
    }

    pub async fn get_customer_context(&self, customer_id: &str) -> Result<Option<CustomerContext>> {
        self.contexts
            .load(customer_id)
            .await
            .map_err(|e| AgentError::Context(e.to_string()))
    }

    pub fn classifier_model_version(&self) -> &str {
        self.classifier.model_version()
    }
}
