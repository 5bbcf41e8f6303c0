//! Command implementations

use crate::config::AppConfig;
use crate::render;
use anyhow::{anyhow, bail, Context, Result};
use queuepulse_core::prelude::*;
use queuepulse_network::RemoteServices;
use tracing::{info, instrument, warn};

/// Wired-up dashboard pipeline
pub struct Dashboard {
    services: RemoteServices,
    controller: Arc<PollingController>,
    analyzer: ForensicAnalyzer,
    thresholds: RagThresholds,
    default_queue: String,
}

impl Dashboard {
    /// Build remote clients, state and controller from configuration
    pub fn build(config: AppConfig) -> Result<Self> {
        let AppConfig { dashboard, network } = config;
        let services = RemoteServices::new(network).context("building remote clients")?;
        let controller = PollingController::new(
            services.platform().clone(),
            services.platform().clone(),
            Arc::new(DashboardState::new()),
            dashboard.polling.clone(),
        )?;
        let analyzer = ForensicAnalyzer::new(services.analysis().clone());

        Ok(Self {
            services,
            controller,
            analyzer,
            thresholds: dashboard.thresholds,
            default_queue: dashboard.polling.default_queue,
        })
    }

    fn state(&self) -> &Arc<DashboardState> {
        self.controller.state()
    }

    async fn connect(&self) -> Result<()> {
        self.controller
            .connect(&self.default_queue)
            .await
            .map_err(|e| anyhow!(e.user_message()))
            .with_context(|| format!("connecting to queue '{}'", self.default_queue))?;
        Ok(())
    }

    /// KPI block for the current snapshot plus the last cycle error, if any
    fn render_current(&self) -> Option<String> {
        let session = self.state().session()?;
        let mut out = String::new();
        if let (Some(snapshot), Some(report)) =
            (self.state().snapshot(), self.state().report(&self.thresholds))
        {
            out.push_str(&render::kpi_block(&session, &snapshot, &report));
        }
        if let Some(error) = self.state().last_error() {
            out.push_str(&render::error_line(&error));
            out.push('\n');
        }
        (!out.is_empty()).then_some(out)
    }

    fn log_health(&self) {
        match self.services.health_check() {
            Ok(health) => info!(
                status = ?health.status,
                details = health.details.as_deref().unwrap_or(""),
                "Remote services health"
            ),
            Err(e) => warn!(error = %e, "Health check failed"),
        }
        let stats = self.services.stats();
        info!(
            platform_requests = stats.platform.total_requests,
            platform_p95_us = stats.platform.p95_response_time_us,
            platform_errors = ?stats.platform.errors,
            analysis_errors = ?stats.analysis.errors,
            "Remote request statistics"
        );
        if let Ok(health) = self.controller.health_check() {
            info!(status = ?health.status, metrics = ?health.metrics, "Polling health");
        }
        let status = self.controller.status();
        if !status.is_operational() {
            warn!(?status, "Polling was not running at shutdown");
        }
    }
}

/// Print a KPI block after every state change until Ctrl-C
#[instrument(skip_all)]
pub async fn watch(config: AppConfig) -> Result<()> {
    let dashboard = Dashboard::build(config)?;
    let mut revisions = dashboard.state().subscribe();
    dashboard.connect().await?;

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal.context("listening for Ctrl-C")?;
                info!("Interrupted");
                break;
            }
            changed = revisions.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(block) = dashboard.render_current() {
                    println!("{block}");
                }
            }
        }
    }

    dashboard.log_health();
    dashboard.controller.disconnect().await;
    Ok(())
}

/// Run one cycle and print KPIs, agents and interactions
#[instrument(skip_all)]
pub async fn snapshot(config: AppConfig) -> Result<()> {
    let dashboard = Dashboard::build(config)?;
    dashboard.connect().await?;
    let result = print_snapshot(&dashboard);
    dashboard.controller.disconnect().await;
    result
}

fn print_snapshot(dashboard: &Dashboard) -> Result<()> {
    if let Some(error) = dashboard.state().last_error() {
        bail!("{}", error.message);
    }
    let snapshot = dashboard
        .state()
        .snapshot()
        .ok_or_else(|| anyhow!("no data received for the queue"))?;

    if let Some(block) = dashboard.render_current() {
        println!("{block}");
    }
    println!("{}", render::agents(&snapshot.agents));
    println!("{}", render::interactions(&snapshot.interactions));
    Ok(())
}

/// Run one cycle and print the forensic analysis of its MOS series
#[instrument(skip_all)]
pub async fn analyze(config: AppConfig) -> Result<()> {
    let dashboard = Dashboard::build(config)?;
    dashboard.connect().await?;
    let result = dashboard.analyzer.analyze_current(dashboard.state()).await;
    let block = dashboard.render_current();
    dashboard.controller.disconnect().await;

    let text = result.map_err(|e| anyhow!(e.user_message()))?;
    if let Some(block) = block {
        println!("{block}");
    }
    println!("{text}");
    Ok(())
}

/// Print the effective configuration with secrets masked
///
/// With `strict`, fail unless the configuration is fit for deployment.
pub fn show_config(config: &AppConfig, strict: bool) -> Result<()> {
    if strict {
        config.validate_strict()?;
    }
    print!("{}", config.to_redacted_toml()?);
    Ok(())
}
