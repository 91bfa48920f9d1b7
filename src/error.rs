// src/error.rs

//! Unified error handling for the listing pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
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

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// A single field of a scraped candidate could not be parsed
    #[error("Malformed field '{field}': {value:?}")]
    MalformedField { field: String, value: String },

    /// A categorical token has no entry in the fixed lookup tables
    #[error("Unknown {field} token: {token:?}")]
    UnknownCategory { field: String, token: String },

    /// Transient page fetch failed past its retry budget
    #[error("Fetch error for {context}: {message}")]
    Fetch { context: String, message: String },

    /// A delivery tick found no subscription for the subscriber
    #[error("No subscription for subscriber {0}")]
    SubscriptionMissing(i64),

    /// Delivering one record to a subscriber failed
    #[error("Delivery to subscriber {subscriber_id} failed: {message}")]
    Delivery {
        subscriber_id: i64,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a malformed-field error.
    pub fn malformed(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::MalformedField {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Create an unknown-category error.
    pub fn unknown_category(field: impl Into<String>, token: impl Into<String>) -> Self {
        Self::UnknownCategory {
            field: field.into(),
            token: token.into(),
        }
    }

    /// Create a fetch error with context.
    pub fn fetch(context: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fetch {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a delivery error.
    pub fn delivery(subscriber_id: i64, message: impl fmt::Display) -> Self {
        Self::Delivery {
            subscriber_id,
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
}
