//! `QueuePulse` Core - Contact-Center Dashboard Pipeline
//!
//! This crate turns the per-interval reports of a contact-center queue into
//! KPI summaries with RAG (red/amber/green) status, and triggers narrative
//! analysis of voice quality on request.
//!
//! # Architecture
//!
//! - [`types`] - Records received from the platform
//! - [`aggregation`] - `summarize` and the RAG classifier (pure)
//! - [`state`] - Session and snapshot store read by the presentation layer
//! - [`engine`] - Polling controller and forensic analysis trigger
//! - [`sources`] - Traits implemented by the remote clients
//!
//! # Example
//!
//! ```rust
//! use queuepulse_core::aggregation::{summarize, KpiReport, RagStatus, RagThresholds};
//! use queuepulse_core::types::IntervalRecord;
//!
//! let history = vec![IntervalRecord::new(chrono::Utc::now())
//!     .with_counts(100, 94, 6)
//!     .with_service_level(91.0)
//!     .with_mos(4.8)];
//!
//! let report = KpiReport::new(summarize(&history, 5), &RagThresholds::default());
//! assert_eq!(report.mos, RagStatus::Normal);
//! assert_eq!(report.abandonment, RagStatus::Warning);
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::large_stack_arrays,
    missing_docs
)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::correctness,
    clippy::suspicious,
    clippy::perf,
    clippy::style,
    clippy::complexity,
    clippy::let_underscore_future,
    clippy::unreachable,
    clippy::redundant_pattern_matching,
    clippy::manual_let_else,
    clippy::unnecessary_wraps,
    clippy::missing_errors_doc,
    clippy::cast_possible_truncation,
    clippy::float_cmp
)]
#![allow(clippy::multiple_crate_versions, clippy::module_name_repetitions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Public modules
pub mod aggregation;
pub mod config;
pub mod engine;
pub mod error;
pub mod prelude;
pub mod sources;
pub mod state;
pub mod types;

// Re-exports for convenience
pub use aggregation::{classify, summarize, KpiKind, KpiReport, MetricsSummary, RagStatus, RagThresholds};
pub use config::{DashboardConfig, PollingConfig};
pub use engine::{AnalysisState, CycleOutcome, ForensicAnalyzer, PollHandle, PollingController};
pub use error::{CoreError, CoreResult, SourceError, SourceResult};
pub use sources::{AnalysisSource, InteractionsSource, MetricsSource, QueueMetrics};
pub use state::{DashboardSnapshot, DashboardState};
pub use types::{QueueId, ReportDate};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
