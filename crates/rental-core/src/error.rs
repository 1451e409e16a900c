//! # Rental Error Types
//!
//! Typed error handling for the rental storefront.
//! All fallible operations return `Result<T, RentalError>`.

use serde::Serialize;
use thiserror::Error;

/// A single form field that failed validation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum RentalError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Form validation failed on one or more fields
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// Document missing from the store
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// Document store rejected or failed a request
    #[error("Document store error: {0}")]
    Store(String),

    /// Payment gateway API error
    #[error("Gateway error [{provider}]: {message}")]
    Gateway { provider: String, message: String },

    /// Network/HTTP error communicating with an upstream service
    #[error("Network error: {0}")]
    Network(String),

    /// Webhook signature verification failed
    #[error("Webhook verification failed: {0}")]
    WebhookVerificationFailed(String),

    /// Webhook payload parsing error
    #[error("Webhook parse error: {0}")]
    WebhookParse(String),

    /// Email delivery failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl RentalError {
    /// Shorthand for a not-found error
    pub fn not_found(kind: &'static str, id: impl Into<String>) -> Self {
        RentalError::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Returns true if an upstream call failed and could be retried by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RentalError::Network(_) | RentalError::Store(_) | RentalError::Gateway { .. }
        )
    }

    /// Returns true if this error came from an external service
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            RentalError::Store(_)
                | RentalError::Gateway { .. }
                | RentalError::Network(_)
                | RentalError::Notification(_)
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RentalError::InvalidRequest(_)
            | RentalError::Validation(_)
            | RentalError::WebhookVerificationFailed(_)
            | RentalError::WebhookParse(_) => 400,
            RentalError::NotFound { .. } => 404,
            RentalError::Configuration(_)
            | RentalError::Store(_)
            | RentalError::Gateway { .. }
            | RentalError::Network(_)
            | RentalError::Notification(_)
            | RentalError::Serialization(_)
            | RentalError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for RentalError {
    fn from(e: serde_json::Error) -> Self {
        RentalError::Serialization(e.to_string())
    }
}

/// Result type alias for storefront operations
pub type RentalResult<T> = Result<T, RentalError>;
