//! Interval Records
//!
//! One reporting bucket (typically 30 minutes) of queue activity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Queue activity for one reporting interval
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntervalRecord {
    /// Interval start
    pub timestamp: DateTime<Utc>,
    /// Interactions offered to the queue
    #[serde(default)]
    pub offered: u64,
    /// Interactions answered by an agent
    #[serde(default)]
    pub answered: u64,
    /// Interactions abandoned before answer
    #[serde(default)]
    pub abandoned: u64,
    /// Service level percent (0-100)
    #[serde(default)]
    pub service_level: Option<f64>,
    /// Mean opinion score (1.0-5.0)
    #[serde(default)]
    pub mos: Option<f64>,
    /// Average handle time in seconds
    #[serde(default, alias = "aht")]
    pub average_handle_time: Option<f64>,
    /// Conversations observed in the interval
    #[serde(default)]
    pub conversations_count: u64,
}

impl IntervalRecord {
    /// Create an empty interval starting at `timestamp`
    #[must_use]
    pub const fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            offered: 0,
            answered: 0,
            abandoned: 0,
            service_level: None,
            mos: None,
            average_handle_time: None,
            conversations_count: 0,
        }
    }

    /// Set offered/answered/abandoned counts
    #[must_use]
    pub const fn with_counts(mut self, offered: u64, answered: u64, abandoned: u64) -> Self {
        self.offered = offered;
        self.answered = answered;
        self.abandoned = abandoned;
        self
    }

    /// Set service level percent
    #[must_use]
    pub const fn with_service_level(mut self, service_level: f64) -> Self {
        self.service_level = Some(service_level);
        self
    }

    /// Set mean opinion score
    #[must_use]
    pub const fn with_mos(mut self, mos: f64) -> Self {
        self.mos = Some(mos);
        self
    }

    /// Set average handle time (seconds)
    #[must_use]
    pub const fn with_handle_time(mut self, seconds: f64) -> Self {
        self.average_handle_time = Some(seconds);
        self
    }

    /// Set conversation count
    #[must_use]
    pub const fn with_conversations(mut self, count: u64) -> Self {
        self.conversations_count = count;
        self
    }
}

/// One point of the voice-quality series sent for forensic analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MosSample {
    /// Interval start
    pub timestamp: DateTime<Utc>,
    /// Mean opinion score of the interval
    pub mos: f64,
    /// Conversations the score was measured over
    pub conversations_count: u64,
}

/// Build the MOS series for `history`, skipping intervals without a score
#[must_use]
pub fn mos_series(history: &[IntervalRecord]) -> Vec<MosSample> {
    let mut series: Vec<MosSample> = history
        .iter()
        .filter_map(|record| {
            record.mos.map(|mos| MosSample {
                timestamp: record.timestamp,
                mos,
                conversations_count: record.conversations_count,
            })
        })
        .collect();
    series.sort_by_key(|sample| sample.timestamp);
    series
}
