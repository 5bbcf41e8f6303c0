//! Forensic MOS analysis trigger
//!
//! One-shot, operator-triggered requests to the analysis service. At most one
//! request is outstanding; its result lives in its own state and never touches
//! the polled metrics.

use crate::error::{CoreError, CoreResult};
use crate::sources::AnalysisSource;
use crate::state::DashboardState;
use crate::types::MosSample;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// State of the analysis panel
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AnalysisState {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Request in flight
    Pending {
        /// When the request was issued
        requested_at: DateTime<Utc>,
        /// Points in the submitted series
        samples: usize,
    },
    /// Last request succeeded
    Completed {
        /// Narrative returned by the service
        text: String,
        /// When the reply arrived
        completed_at: DateTime<Utc>,
    },
    /// Last request failed
    Failed {
        /// Operator-facing message
        message: String,
        /// When the failure was recorded
        failed_at: DateTime<Utc>,
    },
}

impl AnalysisState {
    /// Whether a request is in flight
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self, Self::Pending { .. })
    }
}

/// Clears the in-flight flag when the request ends, including on cancellation
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Issues analysis requests and tracks their outcome
pub struct ForensicAnalyzer {
    source: Arc<dyn AnalysisSource>,
    in_flight: AtomicBool,
    state: Mutex<AnalysisState>,
}

impl std::fmt::Debug for ForensicAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForensicAnalyzer")
            .field("in_flight", &self.in_flight.load(Ordering::Relaxed))
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

impl ForensicAnalyzer {
    /// Create analyzer
    #[must_use]
    pub fn new(source: Arc<dyn AnalysisSource>) -> Self {
        Self {
            source,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(AnalysisState::Idle),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> AnalysisState {
        self.state.lock().clone()
    }

    /// Whether a request is in flight
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Request narrative analysis of `series`
    ///
    /// # Errors
    ///
    /// [`CoreError::AnalysisInProgress`] if another request is pending (the
    /// service is not called), a validation error for an empty series, or the
    /// service failure.
    #[instrument(skip(self, series), fields(samples = series.len()))]
    pub async fn request_analysis(&self, series: Vec<MosSample>) -> CoreResult<String> {
        if series.is_empty() {
            return Err(CoreError::validation(
                "series",
                "no intervals with a MOS score to analyze",
            ));
        }

        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            metrics::counter!("queuepulse_analysis_requests_total", "outcome" => "rejected")
                .increment(1);
            return Err(CoreError::AnalysisInProgress);
        }
        let _guard = InFlight(&self.in_flight);

        *self.state.lock() = AnalysisState::Pending {
            requested_at: Utc::now(),
            samples: series.len(),
        };

        match self.source.analyze(&series).await {
            Ok(text) => {
                info!(chars = text.len(), "Analysis completed");
                metrics::counter!("queuepulse_analysis_requests_total", "outcome" => "ok")
                    .increment(1);
                *self.state.lock() = AnalysisState::Completed {
                    text: text.clone(),
                    completed_at: Utc::now(),
                };
                Ok(text)
            }
            Err(e) => {
                warn!(error = %e, "Analysis failed");
                metrics::counter!("queuepulse_analysis_requests_total", "outcome" => e.kind())
                    .increment(1);
                *self.state.lock() = AnalysisState::Failed {
                    message: e.user_message(),
                    failed_at: Utc::now(),
                };
                Err(e.into())
            }
        }
    }

    /// Analyze the MOS series of the dashboard's current snapshot
    ///
    /// # Errors
    ///
    /// [`CoreError::NotConnected`] without an active session, a validation
    /// error when no interval carries a MOS score, otherwise as
    /// [`ForensicAnalyzer::request_analysis`].
    pub async fn analyze_current(&self, dashboard: &DashboardState) -> CoreResult<String> {
        if dashboard.session().is_none() {
            return Err(CoreError::NotConnected);
        }
        self.request_analysis(dashboard.mos_series()).await
    }
}
