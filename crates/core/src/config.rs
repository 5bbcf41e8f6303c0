//! `QueuePulse` Core Configuration
//!
//! Polling schedule, default session parameters and KPI thresholds.
//! All structs are serde-deserializable with defaults so that a partial file
//! or environment override is enough; `validate()` must pass before use.

use crate::aggregation::RagThresholds;
use crate::error::{CoreError, CoreResult};
use crate::types::ReportDate;
use garde::Validate;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Core configuration for the dashboard pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DashboardConfig {
    /// Polling configuration
    #[garde(dive)]
    pub polling: PollingConfig,

    /// RAG classification thresholds
    #[garde(dive)]
    pub thresholds: RagThresholds,
}

/// Polling configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct PollingConfig {
    /// Seconds between scheduled fetch cycles
    #[garde(range(min = 1, max = 3600))]
    pub interval_s: u64,

    /// Upper bound on one fetch cycle (seconds)
    #[garde(range(min = 1, max = 600))]
    pub cycle_timeout_s: u64,

    /// Queue connected to when none is given
    #[garde(length(min = 1, max = 256))]
    pub default_queue: String,

    /// Report date used when none is given (today when absent)
    #[garde(skip)]
    pub default_date: Option<ReportDate>,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_s: 30,
            cycle_timeout_s: 25,
            default_queue: "Support".to_string(),
            default_date: None,
        }
    }
}

impl PollingConfig {
    /// Polling period
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_s)
    }

    /// Fetch cycle timeout
    #[must_use]
    pub const fn cycle_timeout(&self) -> Duration {
        Duration::from_secs(self.cycle_timeout_s)
    }

    /// Configured default date, falling back to today
    #[must_use]
    pub fn date_or_today(&self) -> ReportDate {
        self.default_date.unwrap_or_else(ReportDate::today)
    }
}

impl DashboardConfig {
    /// Validate configuration
    ///
    /// # Errors
    ///
    /// Returns error if a value is out of range or the thresholds overlap.
    pub fn validate(&self) -> CoreResult<()> {
        garde::Validate::validate(self, &())
            .map_err(|e| CoreError::validation("config", format!("Validation failed: {e}")))?;

        if !self.thresholds.is_ordered() {
            return Err(CoreError::validation(
                "thresholds",
                "warning bands must lie between critical and normal",
            ));
        }

        if self.polling.cycle_timeout_s > self.polling.interval_s.max(1) * 10 {
            return Err(CoreError::validation(
                "cycle_timeout_s",
                "cycle timeout must not exceed ten polling intervals",
            ));
        }

        Ok(())
    }
}
