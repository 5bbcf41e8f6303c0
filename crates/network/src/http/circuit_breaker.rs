//! Circuit Breaker Implementation
//!
//! Fails fast after repeated transport failures so a dead platform does not
//! hold every poll cycle until its timeout. Three states: Closed, Open and
//! Half-Open.

use crate::config::CircuitBreakerConfig as CircuitBreakerSettings;
use crate::error::{NetworkError, NetworkResult};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitBreakerState {
    /// Requests flow normally
    Closed,
    /// Requests are rejected immediately
    Open,
    /// A limited number of trial requests is let through
    HalfOpen,
}

impl std::fmt::Display for CircuitBreakerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Open => write!(f, "Open"),
            Self::HalfOpen => write!(f, "HalfOpen"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures required to open the circuit
    pub failure_threshold: u32,
    /// Successes required to close the circuit from half-open
    pub success_threshold: u32,
    /// Time to wait before transitioning from open to half-open
    pub timeout: Duration,
    /// Trial requests allowed in half-open state
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::from(&CircuitBreakerSettings::default())
    }
}

impl From<&CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: &CircuitBreakerSettings) -> Self {
        Self {
            failure_threshold: settings.failure_threshold,
            success_threshold: settings.success_threshold,
            timeout: Duration::from_secs(settings.timeout_s),
            half_open_max_requests: settings.half_open_max_calls,
        }
    }
}

/// Circuit breaker statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerStats {
    /// Current state
    pub state: CircuitBreakerState,
    /// Requests let through
    pub total_requests: u64,
    /// Successful requests
    pub successful_requests: u64,
    /// Failed requests
    pub failed_requests: u64,
    /// Requests rejected while open
    pub rejected_requests: u64,
    /// Consecutive failures while closed
    pub current_failures: u32,
}

#[derive(Debug)]
struct Breaker {
    state: CircuitBreakerState,
    failures: u32,
    successes: u32,
    half_open_in_flight: u32,
    /// Bumped on every move to half-open; trial slots belong to one trial round
    trial_round: u64,
    opened_at: Option<Instant>,
}

/// Admission ticket for one request
///
/// A trial slot taken in half-open state is handed back when the permit is
/// dropped without an outcome, e.g. when the caller's future is cancelled.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    trial: Option<u64>,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, failed: bool) {
        self.settled = true;
        if failed {
            self.breaker.record_failure();
        } else {
            self.breaker.record_success(self.trial);
        }
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.release_trial(self.trial);
        }
    }
}

/// Circuit breaker implementation
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    component: String,
    inner: Mutex<Breaker>,
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    rejected_requests: AtomicU64,
}

impl CircuitBreaker {
    /// Create new circuit breaker for `component`
    #[must_use]
    pub fn new(component: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            component: component.into(),
            inner: Mutex::new(Breaker {
                state: CircuitBreakerState::Closed,
                failures: 0,
                successes: 0,
                half_open_in_flight: 0,
                trial_round: 0,
                opened_at: None,
            }),
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            rejected_requests: AtomicU64::new(0),
        }
    }

    /// Admit a request, moving Open to HalfOpen once the timeout elapsed
    fn try_acquire(&self) -> Option<Permit<'_>> {
        let mut breaker = self.inner.lock();
        let trial = match breaker.state {
            CircuitBreakerState::Closed => None,
            CircuitBreakerState::Open => {
                let elapsed = breaker
                    .opened_at
                    .is_some_and(|at| at.elapsed() >= self.config.timeout);
                if !elapsed {
                    return None;
                }
                info!(component = %self.component, "Circuit half-open, admitting trial requests");
                breaker.state = CircuitBreakerState::HalfOpen;
                breaker.successes = 0;
                breaker.half_open_in_flight = 1;
                breaker.trial_round += 1;
                Some(breaker.trial_round)
            }
            CircuitBreakerState::HalfOpen => {
                if breaker.half_open_in_flight >= self.config.half_open_max_requests {
                    return None;
                }
                breaker.half_open_in_flight += 1;
                Some(breaker.trial_round)
            }
        };
        Some(Permit {
            breaker: self,
            trial,
            settled: false,
        })
    }

    /// Execute operation with circuit breaker protection
    ///
    /// Only transport-level failures (connection, timeout, 5xx) count
    /// against the circuit; a 404 or 401 proves the server is alive.
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::CircuitBreaker` if the circuit is open, or the
    /// operation's own error
    pub async fn execute<F, Fut, T>(&self, operation: F) -> NetworkResult<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = NetworkResult<T>>,
    {
        let Some(permit) = self.try_acquire() else {
            self.rejected_requests.fetch_add(1, Ordering::Relaxed);
            let breaker = self.inner.lock();
            return Err(NetworkError::CircuitBreaker {
                state: breaker.state.to_string(),
                component: self.component.clone(),
                failure_count: breaker.failures,
            });
        };

        self.total_requests.fetch_add(1, Ordering::Relaxed);
        let result = operation().await;
        permit.settle(matches!(&result, Err(error) if Self::is_trip_worthy(error)));

        result
    }

    const fn is_trip_worthy(error: &NetworkError) -> bool {
        match error {
            NetworkError::Connection { .. } | NetworkError::Timeout { .. } => true,
            NetworkError::Http { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }

    fn record_success(&self, trial: Option<u64>) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
        let mut breaker = self.inner.lock();
        match breaker.state {
            CircuitBreakerState::Closed => breaker.failures = 0,
            CircuitBreakerState::HalfOpen if trial == Some(breaker.trial_round) => {
                breaker.half_open_in_flight = breaker.half_open_in_flight.saturating_sub(1);
                breaker.successes += 1;
                if breaker.successes >= self.config.success_threshold {
                    info!(component = %self.component, "Circuit closed");
                    breaker.state = CircuitBreakerState::Closed;
                    breaker.failures = 0;
                    breaker.successes = 0;
                    breaker.half_open_in_flight = 0;
                    breaker.opened_at = None;
                }
            }
            CircuitBreakerState::HalfOpen | CircuitBreakerState::Open => {}
        }
    }

    fn release_trial(&self, trial: Option<u64>) {
        let mut breaker = self.inner.lock();
        if breaker.state == CircuitBreakerState::HalfOpen && trial == Some(breaker.trial_round) {
            breaker.half_open_in_flight = breaker.half_open_in_flight.saturating_sub(1);
        }
    }

    fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
        let mut breaker = self.inner.lock();
        let open = match breaker.state {
            CircuitBreakerState::Closed => {
                breaker.failures += 1;
                breaker.failures >= self.config.failure_threshold
            }
            CircuitBreakerState::HalfOpen => true,
            CircuitBreakerState::Open => false,
        };
        if open {
            warn!(
                component = %self.component,
                failures = breaker.failures,
                "Circuit opened"
            );
            breaker.state = CircuitBreakerState::Open;
            breaker.opened_at = Some(Instant::now());
            breaker.successes = 0;
            breaker.half_open_in_flight = 0;
            metrics::counter!("queuepulse_circuit_opened_total", "component" => self.component.clone())
                .increment(1);
        }
    }

    /// Get current circuit breaker state
    pub fn state(&self) -> CircuitBreakerState {
        self.inner.lock().state
    }

    /// Get circuit breaker statistics
    pub fn stats(&self) -> CircuitBreakerStats {
        let breaker = self.inner.lock();
        CircuitBreakerStats {
            state: breaker.state,
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            rejected_requests: self.rejected_requests.load(Ordering::Relaxed),
            current_failures: breaker.failures,
        }
    }
}
