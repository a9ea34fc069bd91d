//! Error types for subscription-core
//!
//! The taxonomy mirrors what callers of the subscription layer can act on:
//!
//! - **InvalidIdentifier**: an id does not have the `U_…` / `D_…` shape, or a
//!   component would embed the reserved separator
//! - **NotFound**: no matching subscription, dialog or message
//! - **InvalidField**: an unknown field name was requested
//! - **Timeout**: the owning dialog agent did not answer within the bound
//!
//! Inside the crate the precise error is kept. At the public API boundary
//! [`SubscriptionError::at_boundary`] folds identifier faults into `NotFound`
//! so callers only ever see plain result values.

use std::time::Duration;

use thiserror::Error;

/// Result type for subscription-core operations
pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Errors that can occur while resolving or reading subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    /// Malformed or ambiguous identifier
    #[error("Invalid identifier '{id}': {reason}")]
    InvalidIdentifier {
        id: String,
        reason: String,
    },

    /// No matching subscription, dialog or message
    #[error("Not found: {what}")]
    NotFound {
        what: String,
    },

    /// Unknown field name
    #[error("Invalid field: {field}")]
    InvalidField {
        field: String,
    },

    /// Owner agent did not reply in time
    #[error("Timeout after {timeout:?} during {operation}")]
    Timeout {
        operation: String,
        timeout: Duration,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
    },
}

impl SubscriptionError {
    /// Create an invalid identifier error
    pub fn invalid_identifier(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Create a not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create an invalid field error
    pub fn invalid_field(field: impl Into<String>) -> Self {
        Self::InvalidField { field: field.into() }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Check if this is the not-found sentinel
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Convert into the form returned across the public API.
    ///
    /// Parsing faults never leak to callers: an identifier that cannot be
    /// decoded simply names nothing, so it becomes `NotFound`.
    pub fn at_boundary(self) -> Self {
        match self {
            Self::InvalidIdentifier { id, .. } => Self::NotFound {
                what: format!("subscription {}", id),
            },
            other => other,
        }
    }
}
