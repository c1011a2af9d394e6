//! Text classification for dealer conversations
//!
//! This crate provides:
//! - **Sentiment**: lexicon classifier producing emotion, intensity, urgency
//! - **Intent**: topical intent detection (inventory, finance, service, ...)
//! - **HTTP backend**: client for a remotely hosted classification model
//! - **Text utilities**: normalization and content-word extraction shared with
//!   the routing engine
//!
//! # Example
//!
//! ```ignore
//! use dealer_agent_core::SentimentClassifier;
//! use dealer_agent_text_processing::LexiconClassifier;
//!
//! let classifier = LexiconClassifier::new();
//! let result = classifier.classify("I am furious, this is the third time!").await?;
//! assert_eq!(result.emotion.as_str(), "angry");
//! ```

pub mod http;
pub mod intent;
pub mod sentiment;
pub mod text;

mod error;
mod patterns;

pub use error::{Result, TextProcessingError};
pub use http::HttpClassifier;
pub use intent::TopicDetector;
pub use sentiment::LexiconClassifier;
pub use text::{content_words, has_alphanumeric, normalize, words};
