//! Inbound customer message

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single inbound customer message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id. Retries of the same message reuse it.
    pub id: String,
    pub conversation_id: String,
    pub customer_id: String,
    pub text: String,
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a generated id, received now
    pub fn new(
        conversation_id: impl Into<String>,
        customer_id: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.into(),
            customer_id: customer_id.into(),
            text: text.into(),
            received_at: Utc::now(),
        }
    }

    /// Override the generated id
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Override the receive time
    pub fn received_at(mut self, at: DateTime<Utc>) -> Self {
        self.received_at = at;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_unique() {
        let a = Message::new("conv", "cust", "hi");
        let b = Message::new("conv", "cust", "hi");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_received_at_defaults_when_missing() {
        let json = r#"{"id":"m1","conversation_id":"c","customer_id":"u","text":"hello"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        assert_eq!(msg.id, "m1");
        assert!(msg.received_at <= Utc::now());
    }
}
