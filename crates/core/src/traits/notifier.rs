use async_trait::async_trait;

use crate::error::Result;
use crate::escalation::EscalationEvent;

/// Receiver of escalation events
///
/// Delivery is at-least-once; receivers deduplicate on
/// [`EscalationEvent::idempotency_key`].
#[async_trait]
pub trait EscalationNotifier: Send + Sync {
    async fn notify(&self, event: &EscalationEvent) -> Result<()>;

    fn name(&self) -> &str;
}
