use thiserror::Error;

#[derive(Error, Debug)]
pub enum TextProcessingError {
    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, TextProcessingError>;
