//! Dashboard State
//!
//! Single-writer, multi-reader store for the active session and the records of
//! its last successful fetch cycle.
//!
//! One lock guards the session, the snapshot and the error together. History
//! and agent list are swapped in the same write, so a summary is never derived
//! from lists of different cycles. Writers must present the [`SessionKey`] the
//! data was fetched for; anything tagged with an older key is discarded.

pub mod session;

pub use session::{Session, SessionKey};

use crate::aggregation::{summarize, KpiReport, MetricsSummary, RagThresholds};
use crate::types::{mos_series, AgentRecord, InteractionRecord, IntervalRecord, MosSample, QueueId, ReportDate};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, trace};

/// Records produced by one successful fetch cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    /// Interval history, ascending by timestamp
    pub history: Vec<IntervalRecord>,
    /// Agents staffed on the queue
    pub agents: Vec<AgentRecord>,
    /// Recent interactions
    pub interactions: Vec<InteractionRecord>,
    /// When the cycle completed
    pub fetched_at: DateTime<Utc>,
}

impl DashboardSnapshot {
    /// Create snapshot stamped with the current time
    #[must_use]
    pub fn new(
        history: Vec<IntervalRecord>,
        agents: Vec<AgentRecord>,
        interactions: Vec<InteractionRecord>,
    ) -> Self {
        Self {
            history,
            agents,
            interactions,
            fetched_at: Utc::now(),
        }
    }

    /// Number of agents staffed on the queue
    #[must_use]
    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    /// Derive the KPI summary of this snapshot
    #[must_use]
    pub fn summary(&self) -> MetricsSummary {
        summarize(&self.history, self.agent_count())
    }
}

/// Failure of the most recent fetch cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleError {
    /// Operator-facing message
    pub message: String,
    /// Error kind label
    pub kind: String,
    /// When the failure was recorded
    pub at: DateTime<Utc>,
}

/// Counters describing how fetch results were handled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateStats {
    /// Snapshots applied
    pub applied: u64,
    /// Results dropped because their session was no longer active
    pub discarded: u64,
    /// Cycle failures recorded
    pub failures: u64,
    /// Session changes
    pub generation: u64,
}

#[derive(Debug, Default)]
struct Inner {
    session: Option<Session>,
    snapshot: Option<Arc<DashboardSnapshot>>,
    last_error: Option<CycleError>,
    generation: u64,
}

impl Inner {
    fn is_current(&self, key: &SessionKey) -> bool {
        self.session.as_ref().is_some_and(|s| &s.key == key)
    }
}

/// Shared dashboard state
#[derive(Debug)]
pub struct DashboardState {
    inner: RwLock<Inner>,
    revision: watch::Sender<u64>,
    applied: AtomicU64,
    discarded: AtomicU64,
    failures: AtomicU64,
}

impl Default for DashboardState {
    fn default() -> Self {
        Self::new()
    }
}

impl DashboardState {
    /// Create empty state
    #[must_use]
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: RwLock::new(Inner::default()),
            revision,
            applied: AtomicU64::new(0),
            discarded: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    /// Open a new session, dropping the data of the previous one
    pub fn activate(&self, queue_name: &str, queue_id: QueueId, date: ReportDate) -> SessionKey {
        let key = {
            let mut inner = self.inner.write();
            inner.generation += 1;
            let key = SessionKey {
                queue_id,
                date,
                generation: inner.generation,
            };
            inner.session = Some(Session {
                queue_name: queue_name.to_string(),
                key: key.clone(),
            });
            inner.snapshot = None;
            inner.last_error = None;
            key
        };
        debug!(session = %key, "Session activated");
        self.bump_revision();
        key
    }

    /// Drop the session and all data
    pub fn clear(&self) {
        {
            let mut inner = self.inner.write();
            inner.generation += 1;
            inner.session = None;
            inner.snapshot = None;
            inner.last_error = None;
        }
        debug!("Session cleared");
        self.bump_revision();
    }

    /// Apply the result of a successful cycle
    ///
    /// Returns `false` (and keeps the current data) when `key` is not the
    /// active session.
    pub fn apply(&self, key: &SessionKey, snapshot: DashboardSnapshot) -> bool {
        {
            let mut inner = self.inner.write();
            if !inner.is_current(key) {
                drop(inner);
                self.discarded.fetch_add(1, Ordering::Relaxed);
                debug!(session = %key, "Discarded stale snapshot");
                return false;
            }
            inner.snapshot = Some(Arc::new(snapshot));
            inner.last_error = None;
        }
        self.applied.fetch_add(1, Ordering::Relaxed);
        trace!(session = %key, "Snapshot applied");
        self.bump_revision();
        true
    }

    /// Record a failed cycle, leaving the last good snapshot in place
    ///
    /// Returns `false` when `key` is not the active session.
    pub fn record_error(&self, key: &SessionKey, kind: &str, message: impl Into<String>) -> bool {
        {
            let mut inner = self.inner.write();
            if !inner.is_current(key) {
                drop(inner);
                self.discarded.fetch_add(1, Ordering::Relaxed);
                debug!(session = %key, "Discarded stale error");
                return false;
            }
            inner.last_error = Some(CycleError {
                message: message.into(),
                kind: kind.to_string(),
                at: Utc::now(),
            });
        }
        self.failures.fetch_add(1, Ordering::Relaxed);
        self.bump_revision();
        true
    }

    /// Active session, if connected
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.inner.read().session.clone()
    }

    /// Key of the active session, if connected
    #[must_use]
    pub fn current_key(&self) -> Option<SessionKey> {
        self.inner.read().session.as_ref().map(|s| s.key.clone())
    }

    /// Whether `key` is the active session
    #[must_use]
    pub fn is_current(&self, key: &SessionKey) -> bool {
        self.inner.read().is_current(key)
    }

    /// Last applied snapshot
    #[must_use]
    pub fn snapshot(&self) -> Option<Arc<DashboardSnapshot>> {
        self.inner.read().snapshot.clone()
    }

    /// KPI summary of the last applied snapshot
    #[must_use]
    pub fn summary(&self) -> Option<MetricsSummary> {
        self.inner.read().snapshot.as_ref().map(|s| s.summary())
    }

    /// Classified KPIs of the last applied snapshot
    #[must_use]
    pub fn report(&self, thresholds: &RagThresholds) -> Option<KpiReport> {
        self.summary()
            .map(|summary| KpiReport::new(summary, thresholds))
    }

    /// MOS series of the last applied snapshot (empty when none)
    #[must_use]
    pub fn mos_series(&self) -> Vec<MosSample> {
        self.inner
            .read()
            .snapshot
            .as_ref()
            .map(|s| mos_series(&s.history))
            .unwrap_or_default()
    }

    /// Error of the most recent failed cycle, cleared by the next success
    #[must_use]
    pub fn last_error(&self) -> Option<CycleError> {
        self.inner.read().last_error.clone()
    }

    /// Subscribe to state changes
    ///
    /// The value is a revision counter bumped after every change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> StateStats {
        StateStats {
            applied: self.applied.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            generation: self.inner.read().generation,
        }
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }
}
