//! Scripted platform used by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Datelike, TimeZone, Utc};
use parking_lot::Mutex;
use queuepulse_core::error::{SourceError, SourceResult};
use queuepulse_core::sources::{InteractionsSource, MetricsSource, QueueMetrics};
use queuepulse_core::types::{AgentRecord, InteractionRecord, IntervalRecord, QueueId, ReportDate};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Fake platform: one queue per name, history derived from the date
///
/// Each interval reports `offered = day of month` so tests can tell which
/// date's data was applied.
#[derive(Default)]
pub struct ScriptedPlatform {
    queues: HashMap<String, QueueId>,
    metrics_calls: AtomicUsize,
    interaction_calls: AtomicUsize,
    metrics_failures: Mutex<VecDeque<SourceError>>,
    interaction_failures: Mutex<VecDeque<SourceError>>,
    delays: Mutex<HashMap<ReportDate, Duration>>,
}

impl ScriptedPlatform {
    pub fn with_queue(mut self, name: &str, id: &str) -> Self {
        self.queues.insert(name.to_string(), QueueId::new(id));
        self
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_calls.load(Ordering::SeqCst)
    }

    pub fn interaction_calls(&self) -> usize {
        self.interaction_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_metrics(&self, error: SourceError) {
        self.metrics_failures.lock().push_back(error);
    }

    pub fn fail_next_interactions(&self, error: SourceError) {
        self.interaction_failures.lock().push_back(error);
    }

    pub fn delay(&self, date: ReportDate, delay: Duration) {
        self.delays.lock().insert(date, delay);
    }
}

pub fn history_for(date: ReportDate) -> Vec<IntervalRecord> {
    let day = u64::from(date.date().day());
    let start = Utc
        .with_ymd_and_hms(date.date().year(), date.date().month(), date.date().day(), 8, 0, 0)
        .single()
        .unwrap_or_default();
    vec![
        IntervalRecord::new(start)
            .with_counts(day, day, 0)
            .with_service_level(92.0)
            .with_mos(4.6)
            .with_conversations(day),
        IntervalRecord::new(start + chrono::Duration::minutes(30))
            .with_counts(day, day, 0)
            .with_service_level(88.0)
            .with_conversations(day),
    ]
}

/// Result of a spawned task; a panic in the task fails the test
#[allow(clippy::panic)]
pub async fn joined<T>(task: tokio::task::JoinHandle<T>) -> T {
    task.await.unwrap_or_else(|e| panic!("task failed: {e}"))
}

pub fn date(day: u32) -> ReportDate {
    ReportDate::new(chrono::NaiveDate::from_ymd_opt(2026, 10, day).unwrap_or_default())
}

#[async_trait]
impl MetricsSource for ScriptedPlatform {
    async fn resolve_queue(&self, name: &str) -> SourceResult<QueueId> {
        self.queues
            .get(name)
            .cloned()
            .ok_or_else(|| SourceError::not_found(format!("queue '{name}'")))
    }

    async fn fetch_metrics(&self, _queue_id: &QueueId, date: ReportDate) -> SourceResult<QueueMetrics> {
        self.metrics_calls.fetch_add(1, Ordering::SeqCst);
        let delay = self.delays.lock().get(&date).copied();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(error) = self.metrics_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(QueueMetrics {
            history: history_for(date),
            agents: vec![
                AgentRecord::new("u1", "Dana").with_answered(3),
                AgentRecord::new("u2", "Kai").with_status("ON_QUEUE"),
            ],
        })
    }
}

#[async_trait]
impl InteractionsSource for ScriptedPlatform {
    async fn fetch_recent(&self, _queue_id: &QueueId) -> SourceResult<Vec<InteractionRecord>> {
        self.interaction_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.interaction_failures.lock().pop_front() {
            return Err(error);
        }
        Ok(Vec::new())
    }
}
