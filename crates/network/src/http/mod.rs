//! HTTP Client Module
//!
//! Pooled HTTP client with retry and circuit breaking, behind a trait so the
//! platform and analysis clients can be tested without a socket.

pub mod circuit_breaker;
pub mod client;
pub mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerState};
pub use client::HttpClient;
pub use retry::RetryPolicy;

use crate::error::NetworkResult;
use crate::types::{HttpRequest, HttpResponse};
use async_trait::async_trait;
use std::collections::BTreeMap;

/// HTTP client trait for testability and flexibility
#[async_trait]
pub trait HttpClientTrait: Send + Sync {
    /// Send HTTP request once
    ///
    /// # Errors
    /// Returns error on transport failure, timeout, 5xx or an open circuit
    async fn send(&self, request: HttpRequest) -> NetworkResult<HttpResponse>;

    /// Send HTTP request with custom retry policy
    ///
    /// # Errors
    /// Returns error if all retry attempts fail
    async fn send_with_retry(
        &self,
        request: HttpRequest,
        retry_policy: RetryPolicy,
    ) -> NetworkResult<HttpResponse>;

    /// Get client statistics
    fn stats(&self) -> HttpClientStats;

    /// Check if client is healthy
    fn is_healthy(&self) -> bool;
}

/// HTTP client statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientStats {
    /// Total requests sent
    pub total_requests: u64,
    /// Total 2xx responses
    pub successful_responses: u64,
    /// Everything that did not end in 2xx
    pub failed_requests: u64,
    /// Average response time (microseconds)
    pub avg_response_time_us: u64,
    /// 95th percentile response time (microseconds)
    pub p95_response_time_us: u64,
    /// Failures by kind (`timeout`, `connection`, `server`, ...)
    pub errors: BTreeMap<String, u64>,
    /// Requests currently awaiting a response
    pub active_requests: u64,
    /// Circuit breaker state
    pub circuit_breaker_state: CircuitBreakerState,
}

impl Default for HttpClientStats {
    fn default() -> Self {
        Self {
            total_requests: 0,
            successful_responses: 0,
            failed_requests: 0,
            avg_response_time_us: 0,
            p95_response_time_us: 0,
            errors: BTreeMap::new(),
            active_requests: 0,
            circuit_breaker_state: CircuitBreakerState::Closed,
        }
    }
}
