//! `QueuePulse` Network Module
//!
//! Clients for the two remote collaborators of the dashboard: the
//! contact-center reporting platform and the text analysis service. Both sit
//! on a pooled HTTP client with retry, circuit breaking and request metrics,
//! and implement the source traits of `queuepulse-core`.

#![deny(clippy::all)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::perf)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(clippy::redundant_allocation)]
#![warn(clippy::needless_collect)]
#![allow(clippy::missing_docs_in_private_items)]
#![allow(clippy::module_name_repetitions)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::large_stack_arrays)]
#![deny(clippy::cast_possible_truncation)]
#![deny(clippy::cast_sign_loss)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::let_underscore_future)]
#![deny(clippy::unreachable)]
#![deny(clippy::redundant_pattern_matching)]
#![deny(clippy::manual_let_else)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::redundant_closure_for_method_calls)]

// Core modules
pub mod config;
pub mod error;
pub mod types;

// Transport
pub mod http;
pub mod metrics;

// Remote service bindings
pub mod analysis;
pub mod platform;
pub mod services;

// Re-export commonly used types and traits
pub use analysis::AnalysisClient;
pub use config::NetworkConfig;
pub use error::{NetworkError, NetworkResult};
pub use platform::PlatformClient;
pub use services::RemoteServices;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::analysis::AnalysisClient;
    pub use crate::config::{
        AnalysisConfig, CircuitBreakerConfig, HttpConfig, NetworkConfig, PlatformConfig,
        RetryConfig,
    };
    pub use crate::error::{NetworkError, NetworkResult};
    pub use crate::http::{
        CircuitBreaker, CircuitBreakerState, HttpClient, HttpClientTrait, RetryPolicy,
    };
    pub use crate::metrics::{ApiMetrics, ApiMetricsSnapshot};
    pub use crate::platform::PlatformClient;
    pub use crate::services::RemoteServices;
    pub use crate::types::{HttpMethod, HttpRequest, HttpResponse, RequestId};

    pub use async_trait::async_trait;
}
