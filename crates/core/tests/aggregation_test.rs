//! Aggregation Integration Tests
//!
//! Pins the averaging policy and RAG bands of the KPI pipeline.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;
use queuepulse_core::aggregation::{classify, summarize, KpiKind, KpiReport, RagStatus, RagThresholds};
use queuepulse_core::types::IntervalRecord;

fn ts(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 0, 0, 0)
        .single()
        .unwrap_or_default()
        + Duration::minutes(minutes)
}

#[test]
fn test_empty_history_is_all_zero() {
    let summary = summarize(&[], 0);
    assert_eq!(summary.total_offered, 0);
    assert_eq!(summary.total_answered, 0);
    assert_eq!(summary.total_abandoned, 0);
    assert_eq!(summary.average_mos, 0.0_f64);
    assert_eq!(summary.average_service_level, 0.0_f64);
    assert_eq!(summary.average_handle_time, 0.0_f64);
    assert_eq!(summary.agent_count, 0);
}

#[test]
fn test_mos_divisor_ignores_absent_scores() {
    let history = vec![
        IntervalRecord::new(ts(0)).with_counts(1, 1, 0).with_mos(4.5),
        IntervalRecord::new(ts(30)).with_counts(1, 1, 0),
    ];
    let summary = summarize(&history, 0);
    assert_eq!(summary.average_mos, 4.5_f64);
    assert_eq!(summary.mos_sample_count, 1);
}

#[test]
fn test_service_level_divides_by_record_count() {
    // Absent service level counts as 0 in the sum and 1 in the divisor.
    let history = vec![
        IntervalRecord::new(ts(0)).with_counts(10, 9, 1).with_service_level(90.0),
        IntervalRecord::new(ts(30)).with_counts(10, 10, 0),
    ];
    let summary = summarize(&history, 0);
    assert_eq!(summary.average_service_level, 45.0_f64);
}

#[test]
fn test_mos_without_samples_is_zero_and_unknown() {
    let history = vec![IntervalRecord::new(ts(0)).with_counts(5, 5, 0)];
    let summary = summarize(&history, 1);
    assert_eq!(summary.average_mos, 0.0_f64);

    let report = KpiReport::new(summary, &RagThresholds::default());
    assert_eq!(report.mos, RagStatus::Unknown);
}

#[test]
fn test_classify_reference_values() {
    assert_eq!(classify(KpiKind::Mos, Some(4.2), 0), RagStatus::Critical);
    assert_eq!(classify(KpiKind::Mos, Some(4.5), 0), RagStatus::Warning);
    assert_eq!(classify(KpiKind::Mos, Some(4.8), 0), RagStatus::Normal);
    assert_eq!(classify(KpiKind::Mos, None, 0), RagStatus::Unknown);

    assert_eq!(classify(KpiKind::AbandonmentRate, Some(12.0), 100), RagStatus::Critical);
    assert_eq!(classify(KpiKind::AbandonmentRate, Some(6.0), 100), RagStatus::Warning);
    assert_eq!(classify(KpiKind::AbandonmentRate, Some(3.0), 100), RagStatus::Normal);
    assert_eq!(classify(KpiKind::AbandonmentRate, Some(5.0), 0), RagStatus::Normal);
}

#[test]
fn test_summarize_is_idempotent() {
    let history = vec![
        IntervalRecord::new(ts(0))
            .with_counts(17, 15, 2)
            .with_service_level(83.3)
            .with_mos(4.31)
            .with_handle_time(271.4),
        IntervalRecord::new(ts(30))
            .with_counts(23, 22, 1)
            .with_service_level(91.7)
            .with_mos(4.62),
    ];
    let first = summarize(&history, 4);
    let second = summarize(&history, 4);
    assert_eq!(first.average_mos.to_bits(), second.average_mos.to_bits());
    assert_eq!(
        first.average_service_level.to_bits(),
        second.average_service_level.to_bits()
    );
    assert_eq!(
        first.average_handle_time.to_bits(),
        second.average_handle_time.to_bits()
    );
    assert_eq!(first, second);
}

fn arb_record() -> impl Strategy<Value = IntervalRecord> {
    (
        0_u64..500,
        0_u64..500,
        0_u64..500,
        proptest::option::of(0.0_f64..=100.0),
        proptest::option::of(1.0_f64..=5.0),
        proptest::option::of(0.0_f64..=3_600.0),
        0_i64..96,
    )
        .prop_map(|(offered, answered, abandoned, sl, mos, aht, slot)| {
            let mut record = IntervalRecord::new(ts(slot * 15)).with_counts(offered, answered, abandoned);
            record.service_level = sl;
            record.mos = mos;
            record.average_handle_time = aht;
            record
        })
}

proptest! {
    #[test]
    fn prop_totals_are_exact_sums(history in proptest::collection::vec(arb_record(), 0..64), agents in 0_usize..50) {
        let summary = summarize(&history, agents);
        prop_assert_eq!(summary.total_offered, history.iter().map(|r| r.offered).sum::<u64>());
        prop_assert_eq!(summary.total_answered, history.iter().map(|r| r.answered).sum::<u64>());
        prop_assert_eq!(summary.total_abandoned, history.iter().map(|r| r.abandoned).sum::<u64>());
        prop_assert_eq!(summary.agent_count, agents);
    }

    #[test]
    fn prop_averages_stay_in_range(history in proptest::collection::vec(arb_record(), 0..64)) {
        let summary = summarize(&history, 0);
        let eps = 1e-9;
        prop_assert!(summary.average_mos == 0.0 || (1.0 - eps..=5.0 + eps).contains(&summary.average_mos));
        prop_assert!((0.0..=100.0 + eps).contains(&summary.average_service_level));
        prop_assert!(summary.average_handle_time >= 0.0);
        if summary.total_offered == 0 {
            prop_assert_eq!(summary.average_mos, 0.0);
            prop_assert_eq!(summary.average_service_level, 0.0);
        }
        if summary.total_answered == 0 {
            prop_assert_eq!(summary.average_handle_time, 0.0);
        }
    }

    #[test]
    fn prop_classify_is_total(value in proptest::option::of(-1_000.0_f64..1_000.0), offered in 0_u64..10_000) {
        for kind in [KpiKind::Mos, KpiKind::ServiceLevel, KpiKind::AbandonmentRate] {
            let status = classify(kind, value, offered);
            prop_assert_eq!(status == RagStatus::Unknown, value.is_none());
        }
    }
}
