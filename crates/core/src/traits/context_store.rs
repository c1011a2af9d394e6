use async_trait::async_trait;

use crate::customer::CustomerContext;
use crate::error::Result;

/// Keyed storage of customer interaction history
///
/// Callers serialize access per customer; implementations only need to make
/// each single read or write atomic.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn load(&self, customer_id: &str) -> Result<Option<CustomerContext>>;

    /// Persist a context. Must reject writes that lower `message_count`.
    async fn save(&self, context: &CustomerContext) -> Result<()>;
}
