//! Remote classifier backend
//!
//! Posts the message text to a hosted model and decodes a `SentimentResult`.
//! Timeouts and fallback to neutral are handled by the caller; this client
//! only reports what went wrong.

use async_trait::async_trait;
use dealer_agent_core::{ClassificationError, SentimentClassifier, SentimentResult};
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::error::{Result, TextProcessingError};
use crate::text::has_alphanumeric;

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    text: &'a str,
    model_version: &'a str,
}

/// HTTP classifier client
#[derive(Clone)]
pub struct HttpClassifier {
    client: Client,
    endpoint: String,
    model_version: String,
}

impl HttpClassifier {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TextProcessingError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model_version: "remote".to_string(),
        })
    }

    /// Model version requested from the remote service
    pub fn with_model_version(mut self, version: impl Into<String>) -> Self {
        self.model_version = version.into();
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SentimentClassifier for HttpClassifier {
    async fn classify(&self, text: &str) -> std::result::Result<SentimentResult, ClassificationError> {
        if text.trim().is_empty() {
            return Err(ClassificationError::EmptyInput);
        }
        if !has_alphanumeric(text) {
            return Err(ClassificationError::Unparseable(
                "no alphanumeric content".to_string(),
            ));
        }

        let request = ClassifyRequest {
            text,
            model_version: &self.model_version,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ClassificationError::Backend(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Backend(format!(
                "status {}: {}",
                status, body
            )));
        }

        let result: SentimentResult = response
            .json()
            .await
            .map_err(|e| ClassificationError::Backend(format!("invalid response: {}", e)))?;

        // Re-clamp scores from the wire
        let SentimentResult {
            emotion,
            intensity,
            urgency,
            confidence,
            topics,
        } = result;
        Ok(SentimentResult::new(emotion, intensity, urgency, confidence).with_topics(topics))
    }

    fn model_version(&self) -> &str {
        &self.model_version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_empty_input_short_circuits() {
        let classifier =
            HttpClassifier::new("http://127.0.0.1:9/classify", Duration::from_millis(200)).unwrap();
        assert_eq!(
            classifier.classify("").await.unwrap_err(),
            ClassificationError::EmptyInput
        );
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_backend_error() {
        // Reserve a port, then free it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let classifier = HttpClassifier::new(
            format!("http://127.0.0.1:{}/classify", port),
            Duration::from_millis(500),
        )
        .unwrap()
        .with_model_version("sentiment-2024-06");

        assert_eq!(classifier.model_version(), "sentiment-2024-06");
        let err = classifier.classify("is the camry in stock").await.unwrap_err();
        assert!(matches!(err, ClassificationError::Backend(_)));
    }
}
