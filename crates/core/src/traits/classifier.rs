use async_trait::async_trait;

use crate::error::ClassificationError;
use crate::sentiment::SentimentResult;

/// Sentiment and topical intent classifier
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify one message. Empty or unparseable text is an error.
    async fn classify(&self, text: &str) -> Result<SentimentResult, ClassificationError>;

    /// Identifier of the model or lexicon version in use
    fn model_version(&self) -> &str;
}
