//! `QueuePulse` Core Prelude
//!
//! Common imports for `QueuePulse` core functionality.
//! Import this module to get access to the most commonly used types and traits.

// Re-export core types
pub use crate::aggregation::{classify, summarize, KpiKind, KpiReport, MetricsSummary, RagStatus, RagThresholds};
pub use crate::config::{DashboardConfig, PollingConfig};
pub use crate::engine::{AnalysisState, CycleOutcome, ForensicAnalyzer, PollHandle, PollingController};
pub use crate::error::{CoreError, CoreResult, SourceError, SourceResult};
pub use crate::sources::{AnalysisSource, InteractionsSource, MetricsSource, QueueMetrics};
pub use crate::state::{DashboardSnapshot, DashboardState, Session, SessionKey};
pub use crate::types::{AgentRecord, InteractionRecord, IntervalRecord, MosSample, QueueId, ReportDate};

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use serde::{Deserialize, Serialize};
pub use std::sync::Arc;
pub use std::time::{Duration, SystemTime};

/// Common result type alias
pub type Result<T> = CoreResult<T>;

/// Common trait for components that can be started and stopped
#[async_trait]
pub trait Lifecycle: Send + Sync {
    /// Start the component
    ///
    /// # Errors
    /// Returns error if component fails to start
    async fn start(&self) -> CoreResult<()>;

    /// Stop the component
    ///
    /// # Errors
    /// Returns error if component fails to stop gracefully
    async fn stop(&self) -> CoreResult<()>;

    /// Check if component is running
    fn is_running(&self) -> bool;

    /// Get component status
    fn status(&self) -> ComponentStatus;
}

/// Component status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComponentStatus {
    /// Component is starting up
    Starting,
    /// Component is running normally
    Running,
    /// Component is running but its last operation failed
    Degraded,
    /// Component is stopped
    Stopped,
}

impl ComponentStatus {
    /// Check if component is operational
    #[must_use]
    pub const fn is_operational(&self) -> bool {
        matches!(self, Self::Running | Self::Degraded)
    }
}

/// Common trait for components that provide health checks
pub trait HealthCheck: Send + Sync {
    /// Perform health check
    ///
    /// # Errors
    /// Returns error if health check fails
    fn health_check(&self) -> CoreResult<HealthStatus>;
}

/// Health status information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Component name
    pub component: String,
    /// Overall health status
    pub status: HealthLevel,
    /// Health check timestamp
    pub timestamp: SystemTime,
    /// Additional details
    pub details: Option<String>,
    /// Request metrics
    pub metrics: Option<HealthMetrics>,
}

/// Health level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthLevel {
    /// Component is healthy
    Healthy,
    /// Component is degraded but functional
    Degraded,
    /// Component is unhealthy
    Unhealthy,
    /// Component status is unknown
    Unknown,
}

/// Health metrics
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HealthMetrics {
    /// Requests or cycles started
    pub request_count: u64,
    /// Requests or cycles that failed
    pub error_count: u64,
    /// Results dropped as stale
    pub discarded_count: u64,
    /// Failed share of started (0-1)
    pub error_rate: f64,
    /// Average response time in milliseconds
    pub avg_response_time_ms: u64,
}
