//! `QueuePulse` Network Error System
//!
//! Errors raised while talking to the reporting platform and the analysis
//! service. They stay inside this crate; the client edge converts them into
//! the core [`SourceError`] taxonomy.

use queuepulse_core::error::SourceError;
use std::time::Duration;
use thiserror::Error;

/// Network result type for all operations
pub type NetworkResult<T> = Result<T, NetworkError>;

/// Main error type for network operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Non-success HTTP response
    #[error("HTTP error: {status_code} - {message}")]
    Http {
        /// HTTP status code
        status_code: u16,
        /// Error message or response excerpt
        message: String,
        /// Request URL
        url: Option<String>,
        /// Server-provided `Retry-After`
        retry_after: Option<Duration>,
    },

    /// Connection errors
    #[error("Connection failed to {endpoint}: {reason}")]
    Connection {
        /// Endpoint URL
        endpoint: String,
        /// Failure reason
        reason: String,
    },

    /// Timeout errors
    #[error("Operation timed out after {duration:?}: {operation}")]
    Timeout {
        /// Operation that timed out
        operation: String,
        /// Duration before timeout
        duration: Duration,
        /// Endpoint involved
        endpoint: Option<String>,
    },

    /// Circuit breaker rejected the call
    #[error("Circuit breaker {state} for {component}")]
    CircuitBreaker {
        /// Circuit breaker state
        state: String,
        /// Component name
        component: String,
        /// Failure count
        failure_count: u32,
    },

    /// Retry policy errors
    #[error("Retry policy exhausted: {attempts} attempts for {operation}: {last_error}")]
    RetryExhausted {
        /// Number of attempts made
        attempts: u32,
        /// Operation that failed
        operation: String,
        /// Last error encountered
        last_error: Box<NetworkError>,
    },

    /// Configuration errors
    #[error("Configuration error: {field} - {message}")]
    Configuration {
        /// Configuration field
        field: String,
        /// Error message
        message: String,
    },

    /// Validation errors
    #[error("Validation failed for {field}: {reason}")]
    Validation {
        /// Field that failed validation
        field: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Serialization/Deserialization errors
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        /// Data format
        format: String,
        /// Error message
        message: String,
    },

    /// URL parsing errors
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Generic internal error (use sparingly)
    #[error("Internal network error: {message}")]
    Internal {
        /// Error message
        message: String,
    },
}

// Convenience constructors for common errors
impl NetworkError {
    /// Create HTTP error
    pub fn http(status_code: u16, message: impl Into<String>, url: Option<String>) -> Self {
        Self::Http {
            status_code,
            message: message.into(),
            url,
            retry_after: None,
        }
    }

    /// Create connection error
    pub fn connection(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }

    /// Create timeout error
    pub fn timeout(
        operation: impl Into<String>,
        duration: Duration,
        endpoint: Option<String>,
    ) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
            endpoint,
        }
    }

    /// Create configuration error
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create validation error
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create JSON (de)serialization error
    pub fn json(message: impl Into<String>) -> Self {
        Self::Serialization {
            format: "json".to_string(),
            message: message.into(),
        }
    }

    /// Create internal error (use sparingly)
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status code, if the error came from a response
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Http { status_code, .. } => Some(*status_code),
            _ => None,
        }
    }

    /// Error kind used as a metrics label
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Connection { .. } => "connection",
            Self::Timeout { .. } => "timeout",
            Self::CircuitBreaker { .. } => "circuit_breaker",
            Self::RetryExhausted { .. } => "retry_exhausted",
            Self::Configuration { .. } => "configuration",
            Self::Validation { .. } => "validation",
            Self::Serialization { .. } => "serialization",
            Self::UrlParse(_) => "url",
            Self::Internal { .. } => "internal",
        }
    }

    /// Innermost error, unwrapping retry exhaustion
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::RetryExhausted { last_error, .. } => last_error.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(err: serde_json::Error) -> Self {
        Self::json(err.to_string())
    }
}

impl From<NetworkError> for SourceError {
    fn from(err: NetworkError) -> Self {
        match err.root() {
            NetworkError::Http {
                status_code: 401 | 403,
                message,
                ..
            } => Self::auth(message.clone()),
            NetworkError::Http {
                status_code: 404,
                url,
                ..
            } => Self::not_found(url.clone().unwrap_or_else(|| "resource".to_string())),
            NetworkError::Http {
                status_code: 429,
                message,
                retry_after,
                ..
            } => Self::rate_limit(message.clone(), *retry_after),
            other => Self::transport(other.to_string()),
        }
    }
}
