// src/error.rs

//! Unified error handling for the syndication services.

use std::fmt;

use thiserror::Error;

use crate::models::ResultCode;

/// Result type alias for syndication operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// A lookup matched zero entries
    #[error("Not found: {0}")]
    NotFound(String),

    /// A lookup expected to be unique matched several entries
    #[error("Expected {expected} result for {context}, got {found}")]
    Ambiguous {
        context: String,
        expected: usize,
        found: usize,
    },

    /// The storage service answered with a non-OK result
    #[error("Upstream error from {service}: {message}")]
    Upstream { service: String, message: String },

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed or timed out
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Syndicated feed could not be parsed
    #[error("Feed parse error for {url}: {message}")]
    FeedParse { url: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Identifier is already present in the search index
    #[error("Document already exists with id {0}")]
    AlreadyExists(i64),

    /// A stored row could not be turned into a view object
    #[error("Conversion error: {0}")]
    Conversion(String),
}

impl AppError {
    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create an error for a lookup that matched more than one entry.
    pub fn ambiguous(context: impl Into<String>, found: usize) -> Self {
        Self::Ambiguous {
            context: context.into(),
            expected: 1,
            found,
        }
    }

    /// Create an upstream RPC error.
    pub fn upstream(service: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.to_string(),
        }
    }

    /// Create a feed parse error.
    pub fn feed_parse(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::FeedParse {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Self::Conversion(message.into())
    }

    /// Machine-checkable result code reported to RPC callers.
    pub fn result_code(&self) -> ResultCode {
        match self {
            Self::NotFound(_) => ResultCode::NotFound,
            Self::AlreadyExists(_) => ResultCode::AlreadyExists,
            _ => ResultCode::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message() {
        let err = AppError::ambiguous("user id 4", 2);
        assert_eq!(err.to_string(), "Expected 1 result for user id 4, got 2");
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(AppError::not_found("x").result_code(), ResultCode::NotFound);
        assert_eq!(
            AppError::AlreadyExists(3).result_code(),
            ResultCode::AlreadyExists
        );
        assert_eq!(AppError::ambiguous("x", 2).result_code(), ResultCode::Error);
        assert_eq!(
            AppError::upstream("storage", "boom").result_code(),
            ResultCode::Error
        );
    }
}
