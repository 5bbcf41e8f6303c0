//! `QueuePulse` Core Error System
//!
//! Error types for the aggregation pipeline and the components that drive it.
//! Remote collaborators report failures as [`SourceError`]; everything the core
//! itself can fail with is a [`CoreError`].

use std::time::Duration;
use thiserror::Error;

/// Core result type for all operations
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type returned by remote metrics, interactions and analysis sources
pub type SourceResult<T> = Result<T, SourceError>;

/// Failures reported by the external collaborators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Queue name (or other looked-up entity) does not resolve
    #[error("Not found: {what}")]
    NotFound {
        /// What was looked up
        what: String,
    },

    /// Network failure, timeout or unexpected server response
    #[error("Transport error: {message}")]
    Transport {
        /// Error message
        message: String,
    },

    /// Credential or session failure
    #[error("Authentication failed: {message}")]
    Auth {
        /// Error message
        message: String,
    },

    /// Remote service is throttling requests
    #[error("Rate limited: {message}")]
    RateLimit {
        /// Error message
        message: String,
        /// Suggested wait before the next attempt
        retry_after: Option<Duration>,
    },
}

impl SourceError {
    /// Create not-found error
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create authentication error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Create rate limit error
    pub fn rate_limit(message: impl Into<String>, retry_after: Option<Duration>) -> Self {
        Self::RateLimit {
            message: message.into(),
            retry_after,
        }
    }

    /// Short machine-friendly kind, used as a metrics label
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Transport { .. } => "transport",
            Self::Auth { .. } => "auth",
            Self::RateLimit { .. } => "rate_limit",
        }
    }

    /// Message suitable for showing to an operator
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotFound { what } => format!("{what} was not found"),
            Self::Transport { message } => {
                format!("Could not reach the remote service: {message}")
            }
            Self::Auth { message } => {
                format!("The remote service rejected our credentials: {message}")
            }
            Self::RateLimit { retry_after, .. } => retry_after.map_or_else(
                || "The remote service is busy, try again shortly".to_string(),
                |wait| {
                    format!(
                        "The remote service is busy, try again in {}s",
                        wait.as_secs().max(1)
                    )
                },
            ),
        }
    }
}

/// Main error type for core operations
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// Failure reported by a remote source
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// Validation errors
    #[error("Validation failed for field '{field}': {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Reason for validation failure
        reason: String,
    },

    /// An operation needs an active session
    #[error("No active queue: connect to a queue first")]
    NotConnected,

    /// A forensic analysis request is already pending
    #[error("An analysis request is already in progress")]
    AnalysisInProgress,
}

// Convenience constructors for common errors
impl CoreError {
    /// Create validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Message suitable for showing to an operator
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Source(err) => err.user_message(),
            other => other.to_string(),
        }
    }
}

impl From<garde::Report> for CoreError {
    fn from(report: garde::Report) -> Self {
        Self::validation("config", report.to_string())
    }
}
