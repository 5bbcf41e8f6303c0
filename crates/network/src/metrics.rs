//! API Metrics
//!
//! In-process view of the HTTP traffic to the platform and the analysis
//! service: request counts by status class, latency percentiles and error
//! counts by kind. The same events are also emitted through the `metrics`
//! facade by the client for whatever exporter the binary installs.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Latency samples kept for percentile estimates
const LATENCY_WINDOW: usize = 1024;

/// Request and error counters shared by every call of one client
#[derive(Debug)]
pub struct ApiMetrics {
    total_requests: AtomicU64,
    successful_responses: AtomicU64,
    client_errors: AtomicU64,
    server_errors: AtomicU64,
    transport_errors: AtomicU64,
    bytes_received: AtomicU64,
    latencies_us: parking_lot::Mutex<VecDeque<u64>>,
    error_counts: DashMap<String, AtomicU64>,
    start_time: Instant,
}

impl ApiMetrics {
    /// Create an empty collector
    #[must_use]
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_responses: AtomicU64::new(0),
            client_errors: AtomicU64::new(0),
            server_errors: AtomicU64::new(0),
            transport_errors: AtomicU64::new(0),
            bytes_received: AtomicU64::new(0),
            latencies_us: parking_lot::Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
            error_counts: DashMap::new(),
            start_time: Instant::now(),
        }
    }

    /// Record a completed HTTP exchange
    pub fn record_response(&self, status_code: u16, latency: Duration, bytes_received: u64) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.bytes_received.fetch_add(bytes_received, Ordering::Relaxed);

        let counter = match status_code {
            200..=299 => Some(&self.successful_responses),
            400..=499 => Some(&self.client_errors),
            500..=599 => Some(&self.server_errors),
            _ => None,
        };
        if let Some(counter) = counter {
            counter.fetch_add(1, Ordering::Relaxed);
        }

        self.record_latency(latency);
    }

    /// Record a request that never produced a response
    pub fn record_transport_failure(&self, kind: &str, latency: Duration) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.transport_errors.fetch_add(1, Ordering::Relaxed);
        self.record_error(kind);
        self.record_latency(latency);
    }

    /// Count an error by kind
    pub fn record_error(&self, kind: &str) {
        self.error_counts
            .entry(kind.to_string())
            .or_default()
            .fetch_add(1, Ordering::Relaxed);
    }

    fn record_latency(&self, latency: Duration) {
        let micros = u64::try_from(latency.as_micros()).unwrap_or(u64::MAX);
        let mut window = self.latencies_us.lock();
        if window.len() == LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(micros);
    }

    /// Get metrics snapshot
    pub fn snapshot(&self) -> ApiMetricsSnapshot {
        let latencies: Vec<u64> = self.latencies_us.lock().iter().copied().collect();
        let (avg, p50, p95, p99) = latency_percentiles(latencies);

        ApiMetricsSnapshot {
            uptime: self.start_time.elapsed(),
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            client_errors: self.client_errors.load(Ordering::Relaxed),
            server_errors: self.server_errors.load(Ordering::Relaxed),
            transport_errors: self.transport_errors.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            avg_latency_us: avg,
            p50_latency_us: p50,
            p95_latency_us: p95,
            p99_latency_us: p99,
            error_counts: self
                .error_counts
                .iter()
                .map(|entry| (entry.key().clone(), entry.value().load(Ordering::Relaxed)))
                .collect(),
        }
    }
}

impl Default for ApiMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Average and nearest-rank p50/p95/p99 of `latencies`
fn latency_percentiles(mut latencies: Vec<u64>) -> (u64, u64, u64, u64) {
    if latencies.is_empty() {
        return (0, 0, 0, 0);
    }
    latencies.sort_unstable();

    let len = latencies.len();
    let sum: u128 = latencies.iter().map(|&v| u128::from(v)).sum();
    let avg = u64::try_from(sum / len as u128).unwrap_or(u64::MAX);
    let rank = |pct: usize| {
        let index = (len * pct).div_ceil(100).saturating_sub(1);
        latencies.get(index).copied().unwrap_or(0)
    };

    (avg, rank(50), rank(95), rank(99))
}

/// Point-in-time copy of [`ApiMetrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMetricsSnapshot {
    /// Time since the collector was created
    pub uptime: Duration,
    /// Requests sent, including those without a response
    pub total_requests: u64,
    /// 2xx responses
    pub successful_responses: u64,
    /// 4xx responses
    pub client_errors: u64,
    /// 5xx responses
    pub server_errors: u64,
    /// Requests that failed before a response arrived
    pub transport_errors: u64,
    /// Response body bytes
    pub bytes_received: u64,
    /// Mean latency (microseconds)
    pub avg_latency_us: u64,
    /// Median latency (microseconds)
    pub p50_latency_us: u64,
    /// 95th percentile latency (microseconds)
    pub p95_latency_us: u64,
    /// 99th percentile latency (microseconds)
    pub p99_latency_us: u64,
    /// Errors by kind
    pub error_counts: BTreeMap<String, u64>,
}

impl ApiMetricsSnapshot {
    /// Share of requests that did not end in a 2xx response
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn error_rate(&self) -> f64 {
        if self.total_requests == 0 {
            0.0_f64
        } else {
            let failed = self.total_requests.saturating_sub(self.successful_responses);
            failed as f64 / self.total_requests as f64
        }
    }
}
