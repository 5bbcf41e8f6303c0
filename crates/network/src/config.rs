//! `QueuePulse` Network Configuration System
//!
//! Settings for the HTTP stack and the two remote services, validated with
//! garde plus a few cross-field checks.

use crate::error::{NetworkError, NetworkResult};
use garde::Validate;
use serde::{Deserialize, Serialize};
use url::Url;

/// Network configuration for `QueuePulse`
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NetworkConfig {
    /// HTTP client configuration
    #[garde(dive)]
    pub http: HttpConfig,

    /// Reporting platform endpoint and credentials
    #[garde(dive)]
    pub platform: PlatformConfig,

    /// Text analysis service
    #[garde(dive)]
    pub analysis: AnalysisConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum number of idle connections kept per host
    #[garde(range(min = 1, max = 1000))]
    pub max_connections_per_host: u32,

    /// Connection timeout (seconds)
    #[garde(range(min = 1, max = 300))]
    pub connection_timeout_s: u64,

    /// Request timeout (seconds)
    #[garde(range(min = 1, max = 300))]
    pub request_timeout_s: u64,

    /// Keep-alive timeout (seconds)
    #[garde(range(min = 1, max = 3600))]
    pub keep_alive_timeout_s: u64,

    /// Speak HTTP/2 without negotiation
    #[garde(skip)]
    pub enable_http2: bool,

    /// Accept gzip and brotli responses
    #[garde(skip)]
    pub enable_compression: bool,

    /// User agent string
    #[garde(length(min = 1, max = 200))]
    pub user_agent: String,

    /// Retry configuration
    #[garde(dive)]
    pub retry: RetryConfig,

    /// Circuit breaker configuration
    #[garde(dive)]
    pub circuit_breaker: CircuitBreakerConfig,
}

/// Retry configuration for one-shot calls
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[garde(range(min = 1, max = 10))]
    pub max_attempts: u32,

    /// Initial retry delay (milliseconds)
    #[garde(range(min = 10, max = 10000))]
    pub initial_delay_ms: u64,

    /// Maximum retry delay (milliseconds)
    #[garde(range(min = 100, max = 60000))]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[garde(range(min = 1.0_f64, max = 10.0_f64))]
    pub backoff_multiplier: f64,

    /// Enable jitter
    #[garde(skip)]
    pub enable_jitter: bool,

    /// HTTP status codes that trigger a retry
    #[garde(skip)]
    pub retry_on_status_codes: Vec<u16>,
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that open the circuit
    #[garde(range(min = 1, max = 100))]
    pub failure_threshold: u32,

    /// Successes in half-open state that close it again
    #[garde(range(min = 1, max = 100))]
    pub success_threshold: u32,

    /// Time the circuit stays open (seconds)
    #[garde(range(min = 1, max = 300))]
    pub timeout_s: u64,

    /// Trial calls allowed while half-open
    #[garde(range(min = 1, max = 100))]
    pub half_open_max_calls: u32,
}

/// Reporting platform endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PlatformConfig {
    /// Base URL, e.g. `https://api.platform.example`
    #[garde(length(min = 1, max = 2048))]
    pub base_url: String,

    /// Bearer token
    #[garde(skip)]
    pub api_token: String,
}

/// Text analysis service
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Chat-completions endpoint
    #[garde(length(min = 1, max = 2048))]
    pub endpoint: String,

    /// API key sent as a bearer token
    #[garde(skip)]
    pub api_key: String,

    /// Model name
    #[garde(length(min = 1, max = 128))]
    pub model: String,

    /// Upper bound on the reply length
    #[garde(range(min = 64, max = 8192))]
    pub max_tokens: u32,

    /// Sampling temperature
    #[garde(range(min = 0.0_f64, max = 2.0_f64))]
    pub temperature: f64,

    /// Replaces the built-in system prompt
    #[garde(length(min = 1, max = 8192))]
    pub system_prompt: Option<String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_connections_per_host: 16,
            connection_timeout_s: 10,
            request_timeout_s: 20,
            keep_alive_timeout_s: 90,
            enable_http2: false,
            enable_compression: true,
            user_agent: format!("QueuePulse/{}", env!("CARGO_PKG_VERSION")),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 200,
            max_delay_ms: 5000,
            backoff_multiplier: 2.0_f64,
            enable_jitter: true,
            retry_on_status_codes: vec![500, 502, 503, 504],
        }
    }
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 2,
            timeout_s: 30,
            half_open_max_calls: 3,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            api_token: String::new(),
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1/chat/completions".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 800,
            temperature: 0.2_f64,
            system_prompt: None,
        }
    }
}

impl NetworkConfig {
    /// Validate field ranges and URLs
    ///
    /// # Errors
    /// Returns error if a value is out of range or a URL does not parse
    pub fn validate(&self) -> NetworkResult<()> {
        Validate::validate(self, &()).map_err(|e| {
            NetworkError::validation("network_config", format!("Validation failed: {e}"))
        })?;

        Url::parse(&self.platform.base_url)?;
        Url::parse(&self.analysis.endpoint)?;

        if self.http.retry.max_delay_ms < self.http.retry.initial_delay_ms {
            return Err(NetworkError::config(
                "http.retry.max_delay_ms",
                "must not be below initial_delay_ms",
            ));
        }

        Ok(())
    }

    /// Stricter check for a deployed dashboard: HTTPS endpoints and a
    /// platform token
    ///
    /// # Errors
    /// Returns error if configuration is invalid for production use
    pub fn validate_production(&self) -> NetworkResult<()> {
        self.validate()?;

        for (field, raw) in [
            ("platform.base_url", &self.platform.base_url),
            ("analysis.endpoint", &self.analysis.endpoint),
        ] {
            if Url::parse(raw)?.scheme() != "https" {
                return Err(NetworkError::config(field, "HTTPS is required in production"));
            }
        }

        if self.platform.api_token.trim().is_empty() {
            return Err(NetworkError::config(
                "platform.api_token",
                "An API token must be configured",
            ));
        }

        Ok(())
    }
}
