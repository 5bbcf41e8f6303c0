//! Retry Policy Implementation
//!
//! Exponential backoff with optional jitter for the one-shot calls (queue
//! lookup, analysis). Scheduled polls are never retried here; the next tick
//! is their retry.

use crate::config::RetryConfig;
use crate::error::{NetworkError, NetworkResult};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, warn};

/// Throttling is surfaced to the caller instead of being retried
const TOO_MANY_REQUESTS: u16 = 429;

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one
    pub max_attempts: u32,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Backoff multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Randomize delays by +-50%
    pub enable_jitter: bool,
    /// HTTP status codes that should trigger a retry
    pub retry_on_status_codes: Vec<u16>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build policy from configuration
    #[must_use]
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            backoff_multiplier: config.backoff_multiplier,
            enable_jitter: config.enable_jitter,
            retry_on_status_codes: config.retry_on_status_codes.clone(),
        }
    }

    /// Create exponential backoff retry policy
    #[must_use]
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay,
            backoff_multiplier: 2.0_f64,
            ..Self::default()
        }
    }

    /// Create fixed delay retry policy
    #[must_use]
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            initial_delay: delay,
            max_delay: delay,
            backoff_multiplier: 1.0_f64,
            enable_jitter: false,
            ..Self::default()
        }
    }

    /// Create no-retry policy
    #[must_use]
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Whether `error` after `attempts_made` attempts warrants another one
    #[must_use]
    pub fn should_retry(&self, error: &NetworkError, attempts_made: u32) -> bool {
        if attempts_made >= self.max_attempts {
            return false;
        }

        match error {
            NetworkError::Http { status_code, .. } => {
                *status_code != TOO_MANY_REQUESTS
                    && self.retry_on_status_codes.contains(status_code)
            }
            NetworkError::Connection { .. } | NetworkError::Timeout { .. } => true,
            _ => false,
        }
    }

    /// Delay before retry number `retry` (1-based)
    #[must_use]
    pub fn calculate_delay(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }

        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let scaled = self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(exponent);
        let delay = if scaled.is_finite() {
            Duration::from_secs_f64(scaled.min(self.max_delay.as_secs_f64()))
        } else {
            self.max_delay
        };

        if self.enable_jitter {
            let factor = rand::thread_rng().gen_range(0.5_f64..1.5_f64);
            delay.mul_f64(factor)
        } else {
            delay
        }
    }
}

/// Retry executor for async operations
pub struct RetryExecutor<F> {
    operation: F,
    policy: RetryPolicy,
    name: String,
    attempts: u32,
}

impl<F, Fut, T> RetryExecutor<F>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = NetworkResult<T>>,
{
    /// Create new retry executor
    pub fn new(name: impl Into<String>, operation: F, policy: RetryPolicy) -> Self {
        Self {
            operation,
            policy,
            name: name.into(),
            attempts: 0,
        }
    }

    /// Execute operation with retry logic
    ///
    /// # Errors
    ///
    /// Returns the error itself when it is not retryable, or
    /// [`NetworkError::RetryExhausted`] once the attempts are used up
    pub async fn execute(mut self) -> NetworkResult<T> {
        loop {
            self.attempts += 1;
            match (self.operation)().await {
                Ok(result) => {
                    if self.attempts > 1 {
                        debug!(operation = %self.name, attempts = self.attempts, "Succeeded after retry");
                    }
                    return Ok(result);
                }
                Err(error) if self.policy.should_retry(&error, self.attempts) => {
                    let delay = self.policy.calculate_delay(self.attempts);
                    warn!(
                        operation = %self.name,
                        attempt = self.attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "Retrying request"
                    );
                    metrics::counter!("queuepulse_http_retries_total", "operation" => self.name.clone())
                        .increment(1);
                    tokio::time::sleep(delay).await;
                }
                Err(error) if self.attempts > 1 => {
                    return Err(NetworkError::RetryExhausted {
                        attempts: self.attempts,
                        operation: self.name,
                        last_error: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Convenience function to execute operation with retry
///
/// # Errors
///
/// See [`RetryExecutor::execute`]
pub async fn retry_async<F, Fut, T>(
    name: &str,
    operation: F,
    policy: RetryPolicy,
) -> NetworkResult<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = NetworkResult<T>>,
{
    RetryExecutor::new(name, operation, policy).execute().await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_policy_from_config() {
        let policy = RetryPolicy::from_config(&RetryConfig {
            max_attempts: 4,
            initial_delay_ms: 50,
            max_delay_ms: 400,
            ..RetryConfig::default()
        });
        assert_eq!(policy.max_attempts, 4);
        assert_eq!(policy.initial_delay, Duration::from_millis(50));
        assert_eq!(policy.max_delay, Duration::from_millis(400));
        assert_eq!(RetryPolicy::none().max_attempts, 1);
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::default();

        assert!(policy.should_retry(&NetworkError::http(503, "down", None), 1));
        assert!(policy.should_retry(&NetworkError::connection("h", "reset"), 1));
        assert!(!policy.should_retry(&NetworkError::http(404, "Not Found", None), 1));
        assert!(!policy.should_retry(&NetworkError::http(429, "slow down", None), 1));
        assert!(!policy.should_retry(&NetworkError::http(503, "down", None), 3));

        let eager = RetryPolicy {
            retry_on_status_codes: vec![429, 503],
            ..RetryPolicy::default()
        };
        assert!(!eager.should_retry(&NetworkError::http(429, "slow down", None), 1));
    }

    #[test]
    fn test_delay_calculation() {
        let policy = RetryPolicy {
            enable_jitter: false,
            ..RetryPolicy::exponential(5, Duration::from_millis(100))
        };

        assert_eq!(policy.calculate_delay(0), Duration::ZERO);
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(100));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(200));
        assert_eq!(policy.calculate_delay(30), policy.max_delay);

        let jittered = RetryPolicy::exponential(5, Duration::from_millis(100));
        let delay = jittered.calculate_delay(1);
        assert!(delay >= Duration::from_millis(50) && delay <= Duration::from_millis(150));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_executor_recovers() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let operation = move || {
            let counter = counter_clone.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(NetworkError::http(500, "Server Error", None))
                } else {
                    Ok("Success".to_string())
                }
            }
        };

        let policy = RetryPolicy::fixed(5, Duration::from_millis(10));
        let result = retry_async("test", operation, policy).await;

        assert_eq!(result.unwrap(), "Success");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_max_attempts_counts_total_calls() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let operation = move || {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(NetworkError::http(500, "Server Error", None)) }
        };

        let result = retry_async("test", operation, RetryPolicy::fixed(2, Duration::from_millis(1))).await;

        assert_eq!(counter.load(Ordering::SeqCst), 2);
        match result {
            Err(NetworkError::RetryExhausted { attempts, last_error, .. }) => {
                assert_eq!(attempts, 2);
                assert_eq!(last_error.status_code(), Some(500));
            }
            other => {
                #[allow(clippy::panic)]
                {
                    panic!("Expected RetryExhausted error, got {other:?}");
                }
            }
        }
    }

    #[tokio::test]
    async fn test_non_retryable_error_returned_as_is() {
        let result = retry_async(
            "test",
            || async { Err::<(), _>(NetworkError::http(429, "slow down", None)) },
            RetryPolicy::default(),
        )
        .await;
        assert_eq!(result.unwrap_err().status_code(), Some(429));
    }

    proptest::proptest! {
        #[test]
        fn prop_delay_stays_within_jittered_cap(
            initial_ms in 1_u64..2_000,
            max_ms in 1_u64..10_000,
            retry in 0_u32..64,
        ) {
            let policy = RetryPolicy {
                max_attempts: 10,
                initial_delay: Duration::from_millis(initial_ms),
                max_delay: Duration::from_millis(max_ms),
                backoff_multiplier: 2.0,
                enable_jitter: true,
                ..RetryPolicy::default()
            };
            let delay = policy.calculate_delay(retry);
            proptest::prop_assert!(delay <= Duration::from_millis(max_ms).mul_f64(1.5));
            if retry == 0 {
                proptest::prop_assert_eq!(delay, Duration::ZERO);
            }
        }
    }
}
