//! Error types for catat

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Input text is empty")]
    EmptyInput,

    #[error("Invalid media: {0}")]
    InvalidMedia(String),

    #[error("Invalid transaction type: {0}")]
    InvalidType(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(f64),

    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("Malformed extraction response: {0}")]
    MalformedResponse(String),

    #[error("Request exceeded time limit")]
    Timeout,

    #[error("Configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Helper for field-tagged validation errors
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Error::Validation {
            field,
            message: message.into(),
        }
    }

    /// Whether retrying the same call could plausibly succeed
    ///
    /// Validation and malformed-response errors indicate the extraction output
    /// itself is unusable and are never retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::Http(_) | Error::Io(_) | Error::Timeout)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_helper_carries_field() {
        let err = Error::validation("amount", "must be positive");
        match err {
            Error::Validation { field, .. } => assert_eq!(field, "amount"),
            _ => panic!("expected validation error"),
        }
    }

    #[test]
    fn test_transient_classification() {
        assert!(Error::Timeout.is_transient());
        assert!(!Error::EmptyInput.is_transient());
        assert!(!Error::MalformedResponse("no json".into()).is_transient());
        assert!(!Error::validation("type", "bad").is_transient());
    }
}
