//! Request-level planning errors
//!
//! These are user-facing and non-retryable: the query must be reformulated.
//! Both variants surface before any transport call is attempted.

use thiserror::Error;

/// Result type for plan compilation
pub type PlanResult<T> = Result<T, PlanError>;

/// Errors raised while compiling qualifiers into an upstream request
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PlanError {
    /// A supplied value could not be normalized to a UTC instant
    #[error("malformed timestamp for column '{field}': {value}")]
    MalformedTimestamp { field: String, value: String },

    /// The compiled request would be rejected by the upstream because a
    /// mandatory identifying parameter is absent
    #[error("table '{table}' requires a selector: {message}")]
    MissingRequiredSelector { table: String, message: String },
}

impl PlanError {
    pub fn malformed_timestamp(field: impl Into<String>, value: impl Into<String>) -> Self {
        PlanError::MalformedTimestamp {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn missing_selector(table: impl Into<String>, message: impl Into<String>) -> Self {
        PlanError::MissingRequiredSelector {
            table: table.into(),
            message: message.into(),
        }
    }
}
