//! `QueuePulse` Network Types
//!
//! Transport-neutral request and response values passed through the HTTP
//! stack, so retry and circuit-breaking never touch reqwest types.

use crate::error::{NetworkError, NetworkResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Header carrying the per-request correlation id
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest response excerpt kept in an error message
const ERROR_EXCERPT_LEN: usize = 256;

/// Correlation id attached to every outgoing request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub Uuid);

impl RequestId {
    /// Generate new request ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// HTTP request method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HttpMethod {
    /// GET method
    Get,
    /// POST method
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
        }
    }
}

/// HTTP headers type
pub type HttpHeaders = HashMap<String, String>;

/// Outgoing HTTP request
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Correlation id, sent as [`REQUEST_ID_HEADER`]
    pub id: RequestId,
    /// HTTP method
    pub method: HttpMethod,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: HttpHeaders,
    /// Request body
    pub body: Option<Vec<u8>>,
    /// Per-request timeout overriding the client default
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    /// Create new HTTP request
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            id: RequestId::new(),
            method,
            url: url.into(),
            headers: HashMap::new(),
            body: None,
            timeout: None,
        }
    }

    /// Create GET request
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Create POST request
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    /// Add header
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add `Authorization: Bearer` unless the token is empty
    #[must_use]
    pub fn bearer(self, token: &str) -> Self {
        if token.is_empty() {
            self
        } else {
            self.header("Authorization", format!("Bearer {token}"))
        }
    }

    /// Set JSON body
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if JSON serialization fails
    pub fn json_body<T: Serialize>(mut self, data: &T) -> NetworkResult<Self> {
        let json_bytes = serde_json::to_vec(data)?;
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(json_bytes);
        Ok(self)
    }

    /// Set timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Response status code
    pub status_code: u16,
    /// Response headers, names lowercased
    pub headers: HttpHeaders,
    /// Response body
    pub body: Vec<u8>,
    /// Response latency
    pub latency: Duration,
}

impl HttpResponse {
    /// Parse JSON response body
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if JSON deserialization fails
    pub fn json<T: DeserializeOwned>(&self) -> NetworkResult<T> {
        serde_json::from_slice(&self.body).map_err(NetworkError::from)
    }

    /// Get response body as string
    ///
    /// # Errors
    ///
    /// Returns `NetworkError` if UTF-8 conversion fails
    pub fn text(&self) -> NetworkResult<String> {
        String::from_utf8(self.body.clone()).map_err(|e| {
            NetworkError::internal(format!("Invalid UTF-8 in response: {e}"))
        })
    }

    /// Check if response is successful (2xx status code)
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status_code >= 200 && self.status_code < 300
    }

    /// Status class label: `2xx`, `4xx`, ...
    #[must_use]
    pub fn status_class(&self) -> String {
        format!("{}xx", self.status_code / 100)
    }

    /// `Retry-After` in seconds, if present and numeric
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        self.headers
            .get("retry-after")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .map(Duration::from_secs)
    }

    /// Turn a non-2xx response into [`NetworkError::Http`]
    ///
    /// # Errors
    ///
    /// Returns the HTTP error when the status is not 2xx
    pub fn error_for_status(self, url: &str) -> NetworkResult<Self> {
        if self.is_success() {
            return Ok(self);
        }
        let body = String::from_utf8_lossy(&self.body);
        let message = if body.trim().is_empty() {
            format!("status {}", self.status_code)
        } else {
            body.chars().take(ERROR_EXCERPT_LEN).collect()
        };
        Err(NetworkError::Http {
            status_code: self.status_code,
            message,
            url: Some(url.to_string()),
            retry_after: self.retry_after(),
        })
    }
}
