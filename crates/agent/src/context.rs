//! In-process customer context store

use std::collections::HashMap;

use async_trait::async_trait;
use dealer_agent_core::{ContextStore, CustomerContext, Error, Result};
use parking_lot::RwLock;

/// Customer contexts held in memory, keyed by customer id
#[derive(Default)]
pub struct InMemoryContextStore {
    contexts: RwLock<HashMap<String, CustomerContext>>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a context, replacing any existing one
    pub fn with_context(self, context: CustomerContext) -> Self {
        self.contexts
            .write()
            .insert(context.customer_id.clone(), context);
        self
    }

    pub fn len(&self) -> usize {
        self.contexts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.read().is_empty()
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn load(&self, customer_id: &str) -> Result<Option<CustomerContext>> {
        Ok(self.contexts.read().get(customer_id).cloned())
    }

    async fn save(&self, context: &CustomerContext) -> Result<()> {
        let mut contexts = self.contexts.write();
        if let Some(existing) = contexts.get(&context.customer_id) {
            if existing.message_count > context.message_count {
                return Err(Error::Storage(format!(
                    "stale write for customer {}: message_count {} < stored {}",
                    context.customer_id, context.message_count, existing.message_count
                )));
            }
        }
        contexts.insert(context.customer_id.clone(), context.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dealer_agent_core::{AgentKind, SentimentResult};

    #[tokio::test]
    async fn test_load_missing_is_none() {
        let store = InMemoryContextStore::new();
        assert!(store.load("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = InMemoryContextStore::new();
        let mut ctx = CustomerContext::new("cust-1");
        ctx.record(SentimentResult::neutral(), AgentKind::Sales, false, Utc::now());
        store.save(&ctx).await.unwrap();

        let loaded = store.load("cust-1").await.unwrap().unwrap();
        assert_eq!(loaded, ctx);
    }

    #[tokio::test]
    async fn test_rejects_regressing_message_count() {
        let mut ctx = CustomerContext::new("cust-1");
        ctx.message_count = 5;
        let store = InMemoryContextStore::new().with_context(ctx);

        let stale = CustomerContext::new("cust-1");
        let err = store.save(&stale).await.unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
        assert_eq!(store.load("cust-1").await.unwrap().unwrap().message_count, 5);
    }
}
