//! RAG (red/amber/green) classification of headline KPIs

use garde::Validate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// KPI being classified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KpiKind {
    /// Mean opinion score, higher is better
    Mos,
    /// Service level percent, higher is better
    ServiceLevel,
    /// Abandoned interactions, classified as a share of offered
    AbandonmentRate,
}

/// Severity of a KPI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RagStatus {
    /// Within target
    Normal,
    /// Approaching the limit
    Warning,
    /// Outside the limit
    Critical,
    /// No value to classify
    Unknown,
}

impl RagStatus {
    /// Ordering used to pick the worst of several statuses
    #[must_use]
    pub const fn severity(&self) -> u8 {
        match self {
            Self::Unknown => 0,
            Self::Normal => 1,
            Self::Warning => 2,
            Self::Critical => 3,
        }
    }

    /// Traffic-light name
    #[must_use]
    pub const fn color(&self) -> &'static str {
        match self {
            Self::Normal => "green",
            Self::Warning => "amber",
            Self::Critical => "red",
            Self::Unknown => "grey",
        }
    }
}

impl fmt::Display for RagStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Normal => "normal",
            Self::Warning => "warning",
            Self::Critical => "critical",
            Self::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Classification boundaries
///
/// MOS and service level are critical below `*_critical` and warning below
/// `*_warning`. Abandonment percent is critical above `abandonment_critical`
/// and warning above `abandonment_warning`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct RagThresholds {
    /// MOS below this is critical
    #[garde(range(min = 1.0_f64, max = 5.0_f64))]
    pub mos_critical: f64,
    /// MOS below this is a warning
    #[garde(range(min = 1.0_f64, max = 5.0_f64))]
    pub mos_warning: f64,
    /// Service level percent below this is critical
    #[garde(range(min = 0.0_f64, max = 100.0_f64))]
    pub service_level_critical: f64,
    /// Service level percent below this is a warning
    #[garde(range(min = 0.0_f64, max = 100.0_f64))]
    pub service_level_warning: f64,
    /// Abandonment percent above this is critical
    #[garde(range(min = 0.0_f64, max = 100.0_f64))]
    pub abandonment_critical: f64,
    /// Abandonment percent above this is a warning
    #[garde(range(min = 0.0_f64, max = 100.0_f64))]
    pub abandonment_warning: f64,
}

impl Default for RagThresholds {
    fn default() -> Self {
        Self {
            mos_critical: 4.3_f64,
            mos_warning: 4.7_f64,
            service_level_critical: 80.0_f64,
            service_level_warning: 90.0_f64,
            abandonment_critical: 10.0_f64,
            abandonment_warning: 5.0_f64,
        }
    }
}

impl RagThresholds {
    /// Check that warning bands sit on the right side of critical ones
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        self.mos_critical <= self.mos_warning
            && self.service_level_critical <= self.service_level_warning
            && self.abandonment_warning <= self.abandonment_critical
    }

    /// Classify a KPI value against these thresholds
    ///
    /// For [`KpiKind::AbandonmentRate`] the value is the abandoned count and
    /// `offered_total` converts it to a percentage; with nothing offered the
    /// rate is 0. `None` always classifies as [`RagStatus::Unknown`].
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn classify(&self, kind: KpiKind, value: Option<f64>, offered_total: u64) -> RagStatus {
        let Some(value) = value else {
            return RagStatus::Unknown;
        };

        match kind {
            KpiKind::Mos => {
                lower_is_worse(value, self.mos_critical, self.mos_warning)
            }
            KpiKind::ServiceLevel => lower_is_worse(
                value,
                self.service_level_critical,
                self.service_level_warning,
            ),
            KpiKind::AbandonmentRate => {
                let percent = if offered_total > 0 {
                    value / offered_total as f64 * 100.0_f64
                } else {
                    0.0_f64
                };
                if percent > self.abandonment_critical {
                    RagStatus::Critical
                } else if percent > self.abandonment_warning {
                    RagStatus::Warning
                } else {
                    RagStatus::Normal
                }
            }
        }
    }
}

fn lower_is_worse(value: f64, critical: f64, warning: f64) -> RagStatus {
    if value < critical {
        RagStatus::Critical
    } else if value < warning {
        RagStatus::Warning
    } else {
        RagStatus::Normal
    }
}

/// Classify with the default thresholds
#[must_use]
pub fn classify(kind: KpiKind, value: Option<f64>, offered_total: u64) -> RagStatus {
    RagThresholds::default().classify(kind, value, offered_total)
}
