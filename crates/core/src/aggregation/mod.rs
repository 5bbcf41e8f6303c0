//! `QueuePulse` Aggregation Engine
//!
//! Derives KPI summaries from the interval history of the active queue.
//!
//! # Averaging policy
//!
//! The three averages use different divisors and gates:
//!
//! - service level divides by the full record count (absent values count as 0),
//!   gated on `total_offered > 0`
//! - MOS divides by the number of records carrying a score,
//!   gated on `total_offered > 0`
//! - handle time divides by the number of records carrying a value,
//!   gated on `total_answered > 0`
//!
//! The service level divisor is kept literal so that figures match the
//! platform's own reports; see `DESIGN.md`.

pub mod rag;

pub use rag::{classify, KpiKind, RagStatus, RagThresholds};

use crate::types::IntervalRecord;
use serde::{Deserialize, Serialize};

/// Derived KPIs for one history snapshot
///
/// Never stored: recompute with [`summarize`] whenever the history or agent
/// list changes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSummary {
    /// Average mean opinion score
    pub average_mos: f64,
    /// Average service level percent
    pub average_service_level: f64,
    /// Sum of offered interactions
    pub total_offered: u64,
    /// Sum of answered interactions
    pub total_answered: u64,
    /// Sum of abandoned interactions
    pub total_abandoned: u64,
    /// Agents staffed on the queue
    pub agent_count: usize,
    /// Average handle time in seconds
    pub average_handle_time: f64,
    /// Records that carried a MOS value
    pub mos_sample_count: usize,
}

impl MetricsSummary {
    /// Abandoned share of offered interactions, in percent
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn abandonment_rate(&self) -> f64 {
        if self.total_offered == 0 {
            return 0.0_f64;
        }
        self.total_abandoned as f64 / self.total_offered as f64 * 100.0_f64
    }

    /// Answered share of offered interactions, in percent
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn answer_rate(&self) -> f64 {
        if self.total_offered == 0 {
            return 0.0_f64;
        }
        self.total_answered as f64 / self.total_offered as f64 * 100.0_f64
    }

    /// MOS value for classification, `None` when no interval carried a score
    #[must_use]
    pub fn mos(&self) -> Option<f64> {
        (self.total_offered > 0 && self.mos_sample_count > 0).then_some(self.average_mos)
    }
}

/// Summarize an interval history
///
/// Pure and deterministic: the same inputs always give a bit-identical result.
/// An empty history yields all-zero totals and averages.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn summarize(history: &[IntervalRecord], agent_count: usize) -> MetricsSummary {
    let mut total_offered = 0_u64;
    let mut total_answered = 0_u64;
    let mut total_abandoned = 0_u64;
    let mut service_level_sum = 0.0_f64;
    let mut mos_sum = 0.0_f64;
    let mut mos_count = 0_usize;
    let mut handle_time_sum = 0.0_f64;
    let mut handle_time_count = 0_usize;

    for record in history {
        total_offered = total_offered.saturating_add(record.offered);
        total_answered = total_answered.saturating_add(record.answered);
        total_abandoned = total_abandoned.saturating_add(record.abandoned);
        service_level_sum += record.service_level.unwrap_or(0.0_f64);
        if let Some(mos) = record.mos {
            mos_sum += mos;
            mos_count += 1;
        }
        if let Some(aht) = record.average_handle_time {
            handle_time_sum += aht;
            handle_time_count += 1;
        }
    }

    let average_service_level = if total_offered > 0 {
        service_level_sum / history.len() as f64
    } else {
        0.0_f64
    };
    let average_mos = if total_offered > 0 {
        mos_sum / mos_count.max(1) as f64
    } else {
        0.0_f64
    };
    let average_handle_time = if total_answered > 0 {
        handle_time_sum / handle_time_count.max(1) as f64
    } else {
        0.0_f64
    };

    MetricsSummary {
        average_mos,
        average_service_level,
        total_offered,
        total_answered,
        total_abandoned,
        agent_count,
        average_handle_time,
        mos_sample_count: mos_count,
    }
}

/// A summary together with the RAG status of each headline KPI
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KpiReport {
    /// Underlying summary
    pub summary: MetricsSummary,
    /// MOS status
    pub mos: RagStatus,
    /// Service level status
    pub service_level: RagStatus,
    /// Abandonment rate status
    pub abandonment: RagStatus,
}

impl KpiReport {
    /// Classify `summary` against `thresholds`
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn new(summary: MetricsSummary, thresholds: &RagThresholds) -> Self {
        let offered = summary.total_offered;
        Self {
            summary,
            mos: thresholds.classify(KpiKind::Mos, summary.mos(), offered),
            service_level: thresholds.classify(
                KpiKind::ServiceLevel,
                Some(summary.average_service_level),
                offered,
            ),
            abandonment: thresholds.classify(
                KpiKind::AbandonmentRate,
                Some(summary.total_abandoned as f64),
                offered,
            ),
        }
    }

    /// Worst status across the three KPIs
    #[must_use]
    pub fn worst(&self) -> RagStatus {
        [self.mos, self.service_level, self.abandonment]
            .into_iter()
            .max_by_key(|status| status.severity())
            .unwrap_or(RagStatus::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(offered: u64, answered: u64, abandoned: u64) -> IntervalRecord {
        let ts = Utc
            .with_ymd_and_hms(2026, 10, 18, 8, 0, 0)
            .single()
            .unwrap_or_default();
        IntervalRecord::new(ts).with_counts(offered, answered, abandoned)
    }

    #[test]
    fn test_empty_history() {
        let summary = summarize(&[], 0);
        assert_eq!(summary, MetricsSummary::default());
        assert_eq!(summary.abandonment_rate(), 0.0_f64);
        assert_eq!(summary.mos(), None);
    }

    #[test]
    fn test_agent_count_passthrough() {
        let summary = summarize(&[record(3, 3, 0)], 12);
        assert_eq!(summary.agent_count, 12);
    }

    #[test]
    fn test_offered_gate() {
        let history = vec![record(0, 0, 0).with_mos(4.9).with_service_level(95.0)];
        let summary = summarize(&history, 1);
        assert_eq!(summary.average_mos, 0.0_f64);
        assert_eq!(summary.average_service_level, 0.0_f64);
        assert_eq!(summary.mos_sample_count, 1);
        assert_eq!(summary.mos(), None);
    }

    #[test]
    fn test_handle_time_gated_on_answered() {
        let history = vec![record(5, 0, 5).with_handle_time(200.0)];
        assert_eq!(summarize(&history, 0).average_handle_time, 0.0_f64);

        let history = vec![
            record(5, 4, 1).with_handle_time(200.0),
            record(5, 5, 0).with_handle_time(300.0),
            record(5, 5, 0),
        ];
        assert_eq!(summarize(&history, 0).average_handle_time, 250.0_f64);
    }

    #[test]
    fn test_rates() {
        let summary = summarize(&[record(200, 180, 20)], 4);
        assert_eq!(summary.abandonment_rate(), 10.0_f64);
        assert_eq!(summary.answer_rate(), 90.0_f64);
    }

    #[test]
    fn test_report_classification() {
        let history = vec![
            record(100, 88, 12).with_mos(4.2).with_service_level(92.0),
        ];
        let report = KpiReport::new(summarize(&history, 3), &RagThresholds::default());
        assert_eq!(report.mos, RagStatus::Critical);
        assert_eq!(report.service_level, RagStatus::Normal);
        assert_eq!(report.abandonment, RagStatus::Critical);
        assert_eq!(report.worst(), RagStatus::Critical);
    }

    #[test]
    fn test_report_without_mos_is_unknown() {
        let history = vec![record(10, 10, 0).with_service_level(85.0)];
        let report = KpiReport::new(summarize(&history, 1), &RagThresholds::default());
        assert_eq!(report.mos, RagStatus::Unknown);
        assert_eq!(report.service_level, RagStatus::Warning);
        assert_eq!(report.abandonment, RagStatus::Normal);
        assert_eq!(report.worst(), RagStatus::Warning);
    }
}
