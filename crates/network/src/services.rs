//! Remote Services
//!
//! Builds the platform and analysis clients from one [`NetworkConfig`] and
//! reports their combined health.

use crate::analysis::AnalysisClient;
use crate::config::NetworkConfig;
use crate::error::NetworkResult;
use crate::http::{CircuitBreakerState, HttpClientStats};
use crate::platform::PlatformClient;
use queuepulse_core::prelude::*;
use tracing::{error, info, instrument};

/// The two remote collaborators of the dashboard
pub struct RemoteServices {
    config: NetworkConfig,
    platform: Arc<PlatformClient>,
    analysis: Arc<AnalysisClient>,
}

impl RemoteServices {
    /// Validate configuration and build both clients
    ///
    /// # Errors
    /// Returns error if configuration is invalid or a client cannot be built
    #[instrument(skip(config), fields(platform = %config.platform.base_url))]
    pub fn new(config: NetworkConfig) -> NetworkResult<Self> {
        config.validate().map_err(|e| {
            error!("Network configuration validation failed: {}", e);
            e
        })?;

        let platform = Arc::new(PlatformClient::new(&config)?);
        let analysis = Arc::new(AnalysisClient::new(&config)?);
        info!(analysis = %config.analysis.endpoint, "Remote clients initialized");

        Ok(Self {
            config,
            platform,
            analysis,
        })
    }

    /// Reporting platform client
    pub const fn platform(&self) -> &Arc<PlatformClient> {
        &self.platform
    }

    /// Text analysis client
    pub const fn analysis(&self) -> &Arc<AnalysisClient> {
        &self.analysis
    }

    /// Get configuration
    pub const fn config(&self) -> &NetworkConfig {
        &self.config
    }

    /// Per-client HTTP statistics
    pub fn stats(&self) -> ServiceStats {
        ServiceStats {
            platform: self.platform.http().stats(),
            analysis: self.analysis.http().stats(),
        }
    }
}

impl HealthCheck for RemoteServices {
    fn health_check(&self) -> CoreResult<HealthStatus> {
        let stats = self.stats();

        let (status, details) = if stats.platform.circuit_breaker_state == CircuitBreakerState::Open {
            (HealthLevel::Unhealthy, "Platform circuit open")
        } else if stats.analysis.circuit_breaker_state == CircuitBreakerState::Open {
            (HealthLevel::Degraded, "Analysis circuit open")
        } else {
            (HealthLevel::Healthy, "Remote services reachable")
        };

        let request_count = stats.platform.total_requests + stats.analysis.total_requests;
        let error_count = stats.platform.failed_requests + stats.analysis.failed_requests;
        #[allow(clippy::cast_precision_loss)]
        let error_rate = if request_count == 0 {
            0.0_f64
        } else {
            error_count as f64 / request_count as f64
        };

        Ok(HealthStatus {
            component: "remote_services".to_string(),
            status,
            timestamp: SystemTime::now(),
            details: Some(details.to_string()),
            metrics: Some(HealthMetrics {
                request_count,
                error_count,
                discarded_count: 0,
                error_rate,
                avg_response_time_ms: stats.platform.avg_response_time_us / 1000,
            }),
        })
    }
}

/// HTTP statistics of both clients
#[derive(Debug, Clone)]
pub struct ServiceStats {
    /// Reporting platform
    pub platform: HttpClientStats,
    /// Text analysis service
    pub analysis: HttpClientStats,
}
