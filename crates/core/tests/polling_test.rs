//! Polling Controller Integration Tests
//!
//! Scheduling is tested on a paused clock so intervals elapse instantly.

mod common;

use async_trait::async_trait;
use common::{date, joined, ScriptedPlatform};
use mockall::mock;
use queuepulse_core::config::PollingConfig;
use queuepulse_core::engine::{CycleOutcome, PollingController};
use queuepulse_core::error::{CoreError, SourceError, SourceResult};
use queuepulse_core::prelude::{ComponentStatus, HealthCheck, HealthLevel, Lifecycle};
use queuepulse_core::sources::{InteractionsSource, MetricsSource, QueueMetrics};
use queuepulse_core::state::DashboardState;
use queuepulse_core::types::{InteractionRecord, QueueId, ReportDate};
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(30);

fn polling_config() -> PollingConfig {
    PollingConfig {
        interval_s: INTERVAL.as_secs(),
        cycle_timeout_s: 20,
        default_queue: "Support".to_string(),
        default_date: Some(date(18)),
    }
}

#[allow(clippy::unwrap_used)]
fn controller(platform: &Arc<ScriptedPlatform>) -> Arc<PollingController> {
    PollingController::new(
        platform.clone(),
        platform.clone(),
        Arc::new(DashboardState::new()),
        polling_config(),
    )
    .unwrap()
}

fn platform() -> Arc<ScriptedPlatform> {
    Arc::new(
        ScriptedPlatform::default()
            .with_queue("Support", "q-support")
            .with_queue("Sales", "q-sales"),
    )
}

#[tokio::test(start_paused = true)]
async fn test_connect_polls_immediately_and_on_schedule() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);

    let queue_id = controller.connect("Support").await?;
    assert_eq!(queue_id, QueueId::new("q-support"));
    assert_eq!(platform.metrics_calls(), 1);
    assert_eq!(platform.interaction_calls(), 1);

    let summary = controller.state().summary();
    assert_eq!(summary.map(|s| s.total_offered), Some(36));
    assert_eq!(summary.map(|s| s.agent_count), Some(2));

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(platform.metrics_calls(), 2);

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(platform.metrics_calls(), 4);
    assert!(controller.is_running());
    assert_eq!(controller.status(), ComponentStatus::Running);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_polling_and_clears_data() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);

    controller.connect("Support").await?;
    controller.disconnect().await;

    tokio::time::sleep(INTERVAL * 5).await;
    assert_eq!(platform.metrics_calls(), 1);
    assert!(controller.state().session().is_none());
    assert!(controller.state().summary().is_none());
    assert!(!controller.is_running());
    assert!(matches!(controller.refresh().await, Err(CoreError::NotConnected)));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_keeps_previous_snapshot() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;

    platform.fail_next_metrics(SourceError::transport("connection reset"));
    let result = controller.refresh().await;
    assert!(matches!(
        result,
        Err(CoreError::Source(SourceError::Transport { .. }))
    ));

    let state = controller.state();
    assert_eq!(state.summary().map(|s| s.total_offered), Some(36));
    let error = state.last_error();
    assert!(error
        .as_ref()
        .is_some_and(|e| e.message.contains("connection reset")));
    assert_eq!(error.map(|e| e.kind), Some("transport".to_string()));
    assert_eq!(controller.status(), ComponentStatus::Degraded);

    let health = controller.health_check()?;
    assert_eq!(health.status, HealthLevel::Degraded);

    // The next tick is the retry.
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert!(state.last_error().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_interactions_failure_fails_whole_cycle() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;
    let applied_before = controller.state().stats().applied;

    platform.fail_next_interactions(SourceError::transport("502 Bad Gateway"));
    assert!(controller.refresh().await.is_err());
    assert_eq!(controller.state().stats().applied, applied_before);
    assert!(controller.state().last_error().is_some());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_first_cycle_failure_does_not_fail_connect() -> Result<(), CoreError> {
    let platform = platform();
    platform.fail_next_metrics(SourceError::auth("token expired"));
    let controller = controller(&platform);

    controller.connect("Support").await?;
    let state = controller.state();
    assert!(state.summary().is_none());
    assert_eq!(state.last_error().map(|e| e.kind), Some("auth".to_string()));
    assert!(controller.is_running());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_select_date_restarts_schedule() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;

    tokio::time::sleep(Duration::from_secs(20)).await;
    controller.select_date(date(17)).await?;
    assert_eq!(platform.metrics_calls(), 2);
    assert_eq!(controller.state().summary().map(|s| s.total_offered), Some(34));

    // The old schedule would have fired 10s from here.
    tokio::time::sleep(Duration::from_secs(15)).await;
    assert_eq!(platform.metrics_calls(), 2);

    tokio::time::sleep(Duration::from_secs(16)).await;
    assert_eq!(platform.metrics_calls(), 3);

    // Same date is a no-op.
    controller.select_date(date(17)).await?;
    assert_eq!(platform.metrics_calls(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_stale_response_is_discarded() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;

    platform.delay(date(18), Duration::from_secs(10));
    let slow = tokio::spawn({
        let controller = controller.clone();
        async move { controller.refresh().await }
    });
    tokio::task::yield_now().await;

    controller.select_date(date(17)).await?;
    let outcome = joined(slow).await?;
    assert_eq!(outcome, CycleOutcome::Discarded);

    let state = controller.state();
    assert_eq!(state.session().map(|s| s.date()), Some(date(17)));
    assert_eq!(state.summary().map(|s| s.total_offered), Some(34));
    assert_eq!(state.stats().discarded, 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_date_change_during_first_cycle_keeps_schedule() -> Result<(), CoreError> {
    let platform = platform();
    platform.delay(date(18), Duration::from_secs(10));
    let controller = controller(&platform);

    let connecting = tokio::spawn({
        let controller = controller.clone();
        async move { controller.connect("Support").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    controller.select_date(date(17)).await?;
    joined(connecting).await?;

    let state = controller.state();
    assert_eq!(state.session().map(|s| s.date()), Some(date(17)));
    assert_eq!(state.summary().map(|s| s.total_offered), Some(34));
    assert_eq!(state.stats().discarded, 1);
    assert_eq!(
        controller.schedule().map(|h| h.key().date),
        Some(date(17))
    );
    assert_eq!(platform.metrics_calls(), 2);

    // The date-17 schedule started at t=1s and keeps ticking.
    tokio::time::sleep(INTERVAL * 4).await;
    assert_eq!(platform.metrics_calls(), 6);
    assert!(controller.is_running());
    assert_eq!(controller.status(), ComponentStatus::Running);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_first_cycle_starts_nothing() -> Result<(), CoreError> {
    let platform = platform();
    platform.delay(date(18), Duration::from_secs(10));
    let controller = controller(&platform);

    let connecting = tokio::spawn({
        let controller = controller.clone();
        async move { controller.connect("Support").await }
    });
    tokio::time::sleep(Duration::from_secs(1)).await;

    controller.disconnect().await;
    joined(connecting).await?;

    assert!(controller.state().session().is_none());
    assert!(controller.state().summary().is_none());
    assert!(!controller.is_running());
    assert_eq!(controller.status(), ComponentStatus::Stopped);

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(platform.metrics_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_during_scheduled_cycle_discards_it() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;

    platform.delay(date(18), Duration::from_secs(10));
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(platform.metrics_calls(), 2);

    controller.disconnect().await;
    assert!(!controller.is_running());

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(platform.metrics_calls(), 2);
    assert!(controller.state().session().is_none());
    assert!(controller.state().summary().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_scheduled_fetch_drops_result() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;
    let applied_before = controller.state().stats().applied;
    let handle = controller.schedule().ok_or(CoreError::NotConnected)?;

    platform.delay(date(18), Duration::from_secs(10));
    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    assert_eq!(platform.metrics_calls(), 2);

    handle.cancel();
    tokio::time::sleep(Duration::from_secs(20)).await;
    assert!(!handle.is_active());
    assert_eq!(controller.state().stats().applied, applied_before);
    assert!(controller.state().session().is_some());

    tokio::time::sleep(INTERVAL * 2).await;
    assert_eq!(platform.metrics_calls(), 2);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_connect_to_other_queue_replaces_session() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;
    let first = controller.state().current_key();

    controller.connect("Sales").await?;
    let second = controller.state().current_key();
    assert_ne!(first, second);
    assert_eq!(second.map(|k| k.queue_id), Some(QueueId::new("q-sales")));

    tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
    // Two connects plus one tick of the surviving schedule.
    assert_eq!(platform.metrics_calls(), 3);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_unknown_queue_keeps_current_session() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    controller.connect("Support").await?;

    let result = controller.connect("Billing").await;
    assert!(matches!(
        result,
        Err(CoreError::Source(SourceError::NotFound { .. }))
    ));
    assert_eq!(
        controller.state().session().map(|s| s.queue_name),
        Some("Support".to_string())
    );
    assert!(controller.is_running());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_handle_cancellation() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);
    assert!(matches!(controller.start_polling(), Err(CoreError::NotConnected)));

    controller.connect("Support").await?;
    let handle = controller.start_polling()?;
    assert!(handle.is_active());

    handle.stop().await;
    assert!(!handle.is_active());
    assert!(!controller.is_running());

    tokio::time::sleep(INTERVAL * 3).await;
    assert_eq!(platform.metrics_calls(), 1);
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_poll_does_not_touch_state() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);

    let metrics = controller.poll(&QueueId::new("q-support"), date(5)).await?;
    assert_eq!(metrics.history.len(), 2);
    assert!(controller.state().session().is_none());
    assert!(controller.state().summary().is_none());
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_lifecycle_start_uses_default_queue() -> Result<(), CoreError> {
    let platform = platform();
    let controller = controller(&platform);

    controller.start().await?;
    assert_eq!(
        controller.state().session().map(|s| (s.date(), s.queue_name)),
        Some((date(18), "Support".to_string()))
    );
    controller.stop().await?;
    assert_eq!(controller.status(), ComponentStatus::Stopped);
    assert_eq!(controller.health_check()?.status, HealthLevel::Unknown);
    Ok(())
}

mock! {
    pub Metrics {}

    #[async_trait]
    impl MetricsSource for Metrics {
        async fn resolve_queue(&self, name: &str) -> SourceResult<QueueId>;
        async fn fetch_metrics(&self, queue_id: &QueueId, date: ReportDate) -> SourceResult<QueueMetrics>;
    }
}

mock! {
    pub Interactions {}

    #[async_trait]
    impl InteractionsSource for Interactions {
        async fn fetch_recent(&self, queue_id: &QueueId) -> SourceResult<Vec<InteractionRecord>>;
    }
}

#[tokio::test]
async fn test_not_found_skips_fetching() {
    let mut metrics = MockMetrics::new();
    metrics
        .expect_resolve_queue()
        .withf(|name| name == "Nowhere")
        .times(1)
        .returning(|name| Err(SourceError::not_found(format!("queue '{name}'"))));
    metrics.expect_fetch_metrics().never();

    let mut interactions = MockInteractions::new();
    interactions.expect_fetch_recent().never();

    let state = Arc::new(DashboardState::new());
    let created = PollingController::new(
        Arc::new(metrics),
        Arc::new(interactions),
        state.clone(),
        polling_config(),
    );
    #[allow(clippy::unwrap_used)]
    let controller = created.unwrap();

    let result = controller.connect("  Nowhere ").await;
    match result {
        Err(CoreError::Source(err)) => {
            assert_eq!(err.user_message(), "queue 'Nowhere' was not found");
        }
        other => {
            #[allow(clippy::panic)]
            {
                panic!("expected NotFound, got {other:?}");
            }
        }
    }
    assert!(state.session().is_none());
}

#[tokio::test]
async fn test_fetch_uses_session_date() -> Result<(), CoreError> {
    let mut metrics = MockMetrics::new();
    metrics
        .expect_resolve_queue()
        .returning(|_| Ok(QueueId::new("q-1")));
    metrics
        .expect_fetch_metrics()
        .withf(|queue_id, date| queue_id.as_str() == "q-1" && date.to_iso() == "2026-10-18")
        .times(1)
        .returning(|_, _| Ok(QueueMetrics::default()));

    let mut interactions = MockInteractions::new();
    interactions
        .expect_fetch_recent()
        .times(1)
        .returning(|_| Ok(Vec::new()));

    let created = PollingController::new(
        Arc::new(metrics),
        Arc::new(interactions),
        Arc::new(DashboardState::new()),
        polling_config(),
    );
    #[allow(clippy::unwrap_used)]
    let controller = created.unwrap();

    controller.connect("Support").await?;
    let summary = controller.state().summary();
    assert_eq!(summary.map(|s| s.total_offered), Some(0));
    controller.disconnect().await;
    Ok(())
}

#[tokio::test]
async fn test_invalid_config_rejected() {
    let platform = platform();
    let config = PollingConfig {
        interval_s: 0,
        ..polling_config()
    };
    let created = PollingController::new(
        platform.clone(),
        platform,
        Arc::new(DashboardState::new()),
        config,
    );
    assert!(matches!(created, Err(CoreError::Validation { .. })));
}

#[test]
fn test_report_date_roundtrip_for_sessions() {
    let parsed: Result<ReportDate, _> = "2026-10-18".parse();
    assert_eq!(parsed.ok(), Some(date(18)));
}
