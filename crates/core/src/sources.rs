//! Remote collaborators
//!
//! The pipeline only sees these traits. Implementations live in the network
//! crate; tests substitute scripted or mocked sources.

use crate::error::SourceResult;
use crate::types::{AgentRecord, InteractionRecord, IntervalRecord, MosSample, QueueId, ReportDate};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Interval history and agent list for one (queue, date)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueueMetrics {
    /// Interval history
    #[serde(default)]
    pub history: Vec<IntervalRecord>,
    /// Agents staffed on the queue
    #[serde(default)]
    pub agents: Vec<AgentRecord>,
}

/// Queue lookup and metrics reporting
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Resolve a queue name to its platform id
    ///
    /// # Errors
    /// `NotFound` when no queue has this name, `Transport` or `Auth` on
    /// network or credential failure.
    async fn resolve_queue(&self, name: &str) -> SourceResult<QueueId>;

    /// Fetch interval history and agent records for `queue_id` on `date`
    ///
    /// # Errors
    /// `Transport` or `Auth`.
    async fn fetch_metrics(&self, queue_id: &QueueId, date: ReportDate) -> SourceResult<QueueMetrics>;
}

/// Recent interaction listing
#[async_trait]
pub trait InteractionsSource: Send + Sync {
    /// Fetch recent interactions on `queue_id`
    ///
    /// # Errors
    /// `Transport`.
    async fn fetch_recent(&self, queue_id: &QueueId) -> SourceResult<Vec<InteractionRecord>>;
}

/// Narrative analysis of a voice-quality series
#[async_trait]
pub trait AnalysisSource: Send + Sync {
    /// Produce free-text analysis of `series`
    ///
    /// # Errors
    /// `Transport` or `RateLimit`.
    async fn analyze(&self, series: &[MosSample]) -> SourceResult<String>;
}
