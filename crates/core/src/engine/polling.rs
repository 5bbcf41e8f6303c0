//! Polling Controller
//!
//! Owns the active session and the recurring fetch cycle.
//!
//! A fetch cycle requests metrics and recent interactions concurrently. Both
//! must succeed for the cycle to apply; the three record lists are then
//! swapped into [`DashboardState`] in one write, tagged with the session key
//! the requests were issued for. A failed cycle records an error and keeps the
//! previous snapshot.
//!
//! The schedule runs in one task with a fixed period. Ticks are processed
//! sequentially and missed ticks are skipped, so cycles of one schedule never
//! overlap. Changing queue or date cancels the schedule, runs an immediate
//! cycle for the new session and starts a fresh schedule.

use crate::config::PollingConfig;
use crate::engine::handle::PollHandle;
use crate::error::{CoreError, CoreResult, SourceError};
use crate::prelude::{ComponentStatus, HealthCheck, HealthLevel, HealthMetrics, HealthStatus, Lifecycle};
use crate::sources::{InteractionsSource, MetricsSource, QueueMetrics};
use crate::state::{DashboardSnapshot, DashboardState, SessionKey};
use crate::types::{QueueId, ReportDate};
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Instant, SystemTime};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Outcome of a single fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Snapshot applied to the active session
    Applied,
    /// Session changed while the cycle was in flight; result dropped
    Discarded,
}

/// Cycle counters
#[derive(Debug, Default)]
struct CycleStats {
    started: AtomicU64,
    applied: AtomicU64,
    failed: AtomicU64,
    discarded: AtomicU64,
    total_latency_ms: AtomicU64,
}

/// Drives fetch cycles for the active session
pub struct PollingController {
    metrics: Arc<dyn MetricsSource>,
    interactions: Arc<dyn InteractionsSource>,
    state: Arc<DashboardState>,
    config: PollingConfig,
    schedule: Mutex<Option<PollHandle>>,
    status: RwLock<ComponentStatus>,
    stats: CycleStats,
    this: Weak<Self>,
}

impl std::fmt::Debug for PollingController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingController")
            .field("config", &self.config)
            .field("status", &*self.status.read())
            .field("session", &self.state.current_key())
            .finish_non_exhaustive()
    }
}

impl PollingController {
    /// Create controller
    ///
    /// # Errors
    ///
    /// Returns error if the polling configuration is invalid.
    pub fn new(
        metrics: Arc<dyn MetricsSource>,
        interactions: Arc<dyn InteractionsSource>,
        state: Arc<DashboardState>,
        config: PollingConfig,
    ) -> CoreResult<Arc<Self>> {
        garde::Validate::validate(&config, &())?;

        Ok(Arc::new_cyclic(|this| Self {
            metrics,
            interactions,
            state,
            config,
            schedule: Mutex::new(None),
            status: RwLock::new(ComponentStatus::Stopped),
            stats: CycleStats::default(),
            this: this.clone(),
        }))
    }

    /// Shared dashboard state
    #[must_use]
    pub fn state(&self) -> &Arc<DashboardState> {
        &self.state
    }

    /// Polling configuration
    #[must_use]
    pub const fn config(&self) -> &PollingConfig {
        &self.config
    }

    /// Connect to the queue called `queue_name`
    ///
    /// Resolves the name, makes the queue the active session, runs one cycle
    /// immediately and starts the schedule. The report date carries over from
    /// the previous session, or comes from configuration. A failing first cycle
    /// does not fail the connect; its error is recorded in the state.
    ///
    /// # Errors
    ///
    /// Returns the resolution failure (`NotFound`, `Transport`, `Auth`). The
    /// previous session, if any, stays active in that case.
    #[instrument(skip(self), fields(queue = %queue_name))]
    pub async fn connect(&self, queue_name: &str) -> CoreResult<QueueId> {
        let queue_name = queue_name.trim();
        if queue_name.is_empty() {
            return Err(CoreError::validation("queue_name", "queue name is empty"));
        }

        let queue_id = self.metrics.resolve_queue(queue_name).await.map_err(|e| {
            warn!(error = %e, "Queue resolution failed");
            metrics::counter!("queuepulse_queue_resolutions_total", "outcome" => e.kind())
                .increment(1);
            CoreError::from(e)
        })?;
        metrics::counter!("queuepulse_queue_resolutions_total", "outcome" => "ok").increment(1);

        let date = self
            .state
            .session()
            .map_or_else(|| self.config.date_or_today(), |s| s.date());

        info!(queue_id = %queue_id, %date, "Connected to queue");
        self.switch_session(queue_name, queue_id.clone(), date).await;
        Ok(queue_id)
    }

    /// Change the report date of the active session
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotConnected`] without an active session.
    #[instrument(skip(self), fields(%date))]
    pub async fn select_date(&self, date: ReportDate) -> CoreResult<()> {
        let session = self.state.session().ok_or(CoreError::NotConnected)?;
        if session.date() == date {
            debug!("Date unchanged");
            return Ok(());
        }
        info!(queue_id = %session.queue_id(), "Switching report date");
        self.switch_session(&session.queue_name, session.key.queue_id, date)
            .await;
        Ok(())
    }

    /// Run one cycle now for the active session
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotConnected`] without an active session, or the
    /// cycle's failure (which is also recorded in the state).
    pub async fn refresh(&self) -> CoreResult<CycleOutcome> {
        let key = self.state.current_key().ok_or(CoreError::NotConnected)?;
        self.run_cycle(&key).await
    }

    /// Fetch metrics for (queue, date) without touching state
    ///
    /// # Errors
    ///
    /// Returns the source failure.
    #[instrument(skip(self), fields(queue_id = %queue_id, %date))]
    pub async fn poll(&self, queue_id: &QueueId, date: ReportDate) -> CoreResult<QueueMetrics> {
        Ok(self.metrics.fetch_metrics(queue_id, date).await?)
    }

    /// Stop polling and drop the session and its data
    ///
    /// A connect or date change still running its first cycle will not
    /// start a schedule afterwards.
    pub async fn disconnect(&self) {
        let handle = {
            let mut schedule = self.schedule.lock();
            self.state.clear();
            *self.status.write() = ComponentStatus::Stopped;
            schedule.take()
        };
        if let Some(handle) = handle {
            handle.stop().await;
        }
        info!("Disconnected");
    }

    /// Restart the schedule for the active session and return its handle
    ///
    /// Any schedule already running is cancelled first. The first scheduled
    /// cycle runs one period from now.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotConnected`] without an active session.
    pub fn start_polling(&self) -> CoreResult<PollHandle> {
        let key = self.state.current_key().ok_or(CoreError::NotConnected)?;
        self.install_schedule(key).ok_or(CoreError::NotConnected)
    }

    /// Handle of the running schedule, if any
    #[must_use]
    pub fn schedule(&self) -> Option<PollHandle> {
        self.schedule
            .lock()
            .as_ref()
            .filter(|h| h.is_active())
            .cloned()
    }

    async fn switch_session(
        &self,
        queue_name: &str,
        queue_id: QueueId,
        date: ReportDate,
    ) {
        let key = {
            let mut schedule = self.schedule.lock();
            if let Some(handle) = schedule.take() {
                debug!(session = %handle.key(), "Cancelling schedule");
                handle.cancel();
            }
            *self.status.write() = ComponentStatus::Starting;
            self.state.activate(queue_name, queue_id, date)
        };

        if let Err(e) = self.run_cycle(&key).await {
            warn!(session = %key, error = %e, "Initial cycle failed, schedule continues");
        }

        if self.install_schedule(key.clone()).is_none() {
            debug!(session = %key, "Session replaced during first cycle, no schedule started");
        }
    }

    /// Start the schedule for `key` unless another session has replaced it
    ///
    /// Checked under the schedule lock, which session changes and
    /// `disconnect` also hold.
    fn install_schedule(&self, key: SessionKey) -> Option<PollHandle> {
        let mut schedule = self.schedule.lock();
        if !self.state.is_current(&key) {
            return None;
        }

        let handle = self.spawn_schedule(key);
        if let Some(previous) = schedule.replace(handle.clone()) {
            previous.cancel();
        }
        *self.status.write() = ComponentStatus::Running;
        Some(handle)
    }

    fn spawn_schedule(&self, key: SessionKey) -> PollHandle {
        let token = CancellationToken::new();
        let (finished_tx, finished_rx) = watch::channel(());
        let handle = PollHandle::new(key.clone(), token.clone(), finished_rx);

        let controller = self.this.clone();
        let period = self.config.interval();
        tokio::spawn(async move {
            // Dropped on exit so `PollHandle::stop` observes completion.
            let _finished = finished_tx;
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            debug!(session = %key, ?period, "Schedule started");

            loop {
                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let Some(controller) = controller.upgrade() else {
                    break;
                };
                if !controller.state.is_current(&key) {
                    debug!(session = %key, "Session replaced, schedule exits");
                    break;
                }

                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    result = controller.run_cycle_unless_cancelled(&key, &token) => {
                        if let Err(e) = result {
                            debug!(session = %key, error = %e, "Scheduled cycle failed");
                        }
                    }
                }
            }
            debug!(session = %key, "Schedule stopped");
        });

        handle
    }

    async fn run_cycle_unless_cancelled(
        &self,
        key: &SessionKey,
        token: &CancellationToken,
    ) -> CoreResult<CycleOutcome> {
        let fetched = self.fetch(key).await;
        if token.is_cancelled() {
            return Ok(CycleOutcome::Discarded);
        }
        self.apply(key, fetched)
    }

    /// Run one fetch cycle for `key` and apply its result
    async fn run_cycle(&self, key: &SessionKey) -> CoreResult<CycleOutcome> {
        let fetched = self.fetch(key).await;
        self.apply(key, fetched)
    }

    #[instrument(skip(self), fields(session = %key))]
    async fn fetch(&self, key: &SessionKey) -> Result<DashboardSnapshot, SourceError> {
        self.stats.started.fetch_add(1, Ordering::Relaxed);
        let started = Instant::now();

        let cycle = async {
            tokio::try_join!(
                self.metrics.fetch_metrics(&key.queue_id, key.date),
                self.interactions.fetch_recent(&key.queue_id),
            )
        };
        let timeout = self.config.cycle_timeout();
        let result = match tokio::time::timeout(timeout, cycle).await {
            Ok(result) => result,
            Err(_) => Err(SourceError::transport(format!(
                "fetch cycle timed out after {}s",
                timeout.as_secs()
            ))),
        };

        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        self.stats
            .total_latency_ms
            .fetch_add(elapsed_ms, Ordering::Relaxed);
        metrics::histogram!("queuepulse_poll_cycle_seconds").record(elapsed.as_secs_f64());

        result.map(|(metrics, interactions)| {
            debug!(
                intervals = metrics.history.len(),
                agents = metrics.agents.len(),
                interactions = interactions.len(),
                "Fetch cycle completed"
            );
            DashboardSnapshot::new(metrics.history, metrics.agents, interactions)
        })
    }

    fn apply(
        &self,
        key: &SessionKey,
        fetched: Result<DashboardSnapshot, SourceError>,
    ) -> CoreResult<CycleOutcome> {
        match fetched {
            Ok(snapshot) => {
                if self.state.apply(key, snapshot) {
                    self.stats.applied.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("queuepulse_poll_cycles_total", "outcome" => "applied")
                        .increment(1);
                    Ok(CycleOutcome::Applied)
                } else {
                    self.stats.discarded.fetch_add(1, Ordering::Relaxed);
                    metrics::counter!("queuepulse_poll_cycles_total", "outcome" => "discarded")
                        .increment(1);
                    Ok(CycleOutcome::Discarded)
                }
            }
            Err(e) => {
                self.stats.failed.fetch_add(1, Ordering::Relaxed);
                metrics::counter!("queuepulse_poll_cycles_total", "outcome" => e.kind())
                    .increment(1);
                if self.state.record_error(key, e.kind(), e.user_message()) {
                    warn!(session = %key, error = %e, "Fetch cycle failed, keeping last snapshot");
                }
                Err(e.into())
            }
        }
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        if let Some(handle) = self.schedule.get_mut().take() {
            handle.cancel();
        }
    }
}

#[async_trait]
impl Lifecycle for PollingController {
    async fn start(&self) -> CoreResult<()> {
        let queue = self.config.default_queue.clone();
        self.connect(&queue).await.map(|_| ())
    }

    async fn stop(&self) -> CoreResult<()> {
        self.disconnect().await;
        Ok(())
    }

    fn is_running(&self) -> bool {
        self.schedule().is_some()
    }

    fn status(&self) -> ComponentStatus {
        let status = *self.status.read();
        if status == ComponentStatus::Running && self.state.last_error().is_some() {
            return ComponentStatus::Degraded;
        }
        status
    }
}

impl HealthCheck for PollingController {
    fn health_check(&self) -> CoreResult<HealthStatus> {
        let started = self.stats.started.load(Ordering::Relaxed);
        let failed = self.stats.failed.load(Ordering::Relaxed);
        let latency = self.stats.total_latency_ms.load(Ordering::Relaxed);

        #[allow(clippy::cast_precision_loss)]
        let error_rate = if started == 0 {
            0.0_f64
        } else {
            failed as f64 / started as f64
        };

        let (status, details) = match (self.state.session(), self.state.last_error()) {
            (None, _) => (HealthLevel::Unknown, "not connected".to_string()),
            (Some(session), Some(error)) => (
                HealthLevel::Degraded,
                format!("{}: {}", session.queue_name, error.message),
            ),
            (Some(session), None) => (
                HealthLevel::Healthy,
                format!("polling {} for {}", session.queue_name, session.date()),
            ),
        };

        Ok(HealthStatus {
            component: "polling".to_string(),
            status,
            timestamp: SystemTime::now(),
            details: Some(details),
            metrics: Some(HealthMetrics {
                request_count: started,
                error_count: failed,
                discarded_count: self.stats.discarded.load(Ordering::Relaxed),
                error_rate,
                avg_response_time_ms: latency.checked_div(started).unwrap_or(0),
            }),
        })
    }
}
