//! Escalation notifiers
//!
//! Delivery is at-least-once. The webhook notifier retries transient
//! failures with exponential backoff and sends the event's idempotency key so
//! receivers can drop duplicates.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dealer_agent_config::{NotifierConfig, NotifierKind};
use dealer_agent_core::{Error, EscalationEvent, EscalationNotifier, Result};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::AgentError;

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

/// Writes escalation events to the structured log
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EscalationNotifier for LogNotifier {
    async fn notify(&self, event: &EscalationEvent) -> Result<()> {
        tracing::warn!(
            conversation_id = %event.conversation_id,
            reason = %event.reason,
            occurred_at = %event.occurred_at,
            idempotency_key = %event.idempotency_key(),
            "Conversation escalated"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Forwards events to an in-process consumer
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    sender: mpsc::UnboundedSender<EscalationEvent>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<EscalationEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

#[async_trait]
impl EscalationNotifier for ChannelNotifier {
    async fn notify(&self, event: &EscalationEvent) -> Result<()> {
        self.sender
            .send(event.clone())
            .map_err(|_| Error::Notification("escalation channel closed".to_string()))
    }

    fn name(&self) -> &str {
        "channel"
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    #[serde(flatten)]
    event: &'a EscalationEvent,
    idempotency_key: String,
}

enum DeliveryError {
    Retryable(String),
    Fatal(String),
}

/// POSTs events to an HTTP endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    max_retries: u32,
    initial_backoff: Duration,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> std::result::Result<Self, AgentError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AgentError::Initialization(format!("webhook client: {}", e)))?;

        Ok(Self {
            client,
            url: url.into(),
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
        })
    }

    pub fn with_retries(mut self, max_retries: u32, initial_backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.initial_backoff = initial_backoff;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn deliver(&self, event: &EscalationEvent) -> std::result::Result<(), DeliveryError> {
        let key = event.idempotency_key();
        let payload = WebhookPayload {
            event,
            idempotency_key: key.clone(),
        };

        let response = self
            .client
            .post(&self.url)
            .header(IDEMPOTENCY_HEADER, key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DeliveryError::Retryable(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        // 5xx and 429 are retryable, other 4xx are not
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            Err(DeliveryError::Retryable(format!("{}: {}", status, body)))
        } else {
            Err(DeliveryError::Fatal(format!("{}: {}", status, body)))
        }
    }
}

#[async_trait]
impl EscalationNotifier for WebhookNotifier {
    async fn notify(&self, event: &EscalationEvent) -> Result<()> {
        let mut last_error = None;
        let mut backoff = self.initial_backoff;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                tracing::warn!(
                    conversation_id = %event.conversation_id,
                    "Escalation webhook failed, retrying in {:?} (attempt {}/{})",
                    backoff,
                    attempt,
                    self.max_retries
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }

            match self.deliver(event).await {
                Ok(()) => {
                    tracing::info!(
                        conversation_id = %event.conversation_id,
                        reason = %event.reason,
                        attempts = attempt + 1,
                        "Escalation webhook delivered"
                    );
                    return Ok(());
                }
                Err(DeliveryError::Retryable(e)) => last_error = Some(e),
                Err(DeliveryError::Fatal(e)) => {
                    return Err(Error::Notification(format!("webhook rejected event: {}", e)));
                }
            }
        }

        Err(Error::Notification(format!(
            "webhook delivery failed after {} attempts: {}",
            self.max_retries + 1,
            last_error.unwrap_or_else(|| "unknown error".to_string())
        )))
    }

    fn name(&self) -> &str {
        "webhook"
    }
}

/// Build the notifier selected by configuration
pub fn build_notifier(
    config: &NotifierConfig,
) -> std::result::Result<Arc<dyn EscalationNotifier>, AgentError> {
    config.validate()?;
    match config.kind {
        NotifierKind::Log => Ok(Arc::new(LogNotifier::new())),
        NotifierKind::Webhook => {
            let url = config.webhook_url.clone().ok_or_else(|| {
                AgentError::Initialization("notifier.webhook_url is required".to_string())
            })?;
            let notifier = WebhookNotifier::new(url, Duration::from_secs(config.timeout_secs))?
                .with_retries(config.max_retries, Duration::from_millis(config.backoff_ms));
            Ok(Arc::new(notifier))
        }
    }
}
