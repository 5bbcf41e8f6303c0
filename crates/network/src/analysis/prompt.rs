//! Prompt construction for forensic MOS analysis

use crate::error::NetworkResult;
use queuepulse_core::types::MosSample;
use std::fmt::Write as _;

/// Instructions used when the configuration provides none
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a voice-quality forensics analyst for a contact center. \
You receive a time series of mean opinion scores (MOS, 1.0 to 5.0) per reporting interval, \
each with the number of conversations it was measured over. Identify degradations, \
when they started and ended, whether they correlate with call volume, and the most likely \
network or carrier causes. Be concise and use plain text.";

/// Score below which an interval is called out in the prompt
const DEGRADED_MOS: f64 = 4.0;

/// User message: a short numeric summary followed by the series as JSON
///
/// # Errors
/// Returns error if the series cannot be serialized
pub fn user_prompt(series: &[MosSample]) -> NetworkResult<String> {
    let json = serde_json::to_string_pretty(series)?;
    let mut prompt = String::new();

    let _ = writeln!(prompt, "Intervals: {}", series.len());
    if let Some(stats) = SeriesStats::of(series) {
        let _ = writeln!(
            prompt,
            "MOS min {:.2}, max {:.2}, conversation-weighted mean {:.2}",
            stats.min, stats.max, stats.weighted_mean
        );
        let _ = writeln!(
            prompt,
            "Intervals below {DEGRADED_MOS:.1}: {}",
            stats.degraded
        );
    }
    let _ = writeln!(prompt, "\nSeries:\n{json}");
    Ok(prompt)
}

#[derive(Debug, PartialEq)]
struct SeriesStats {
    min: f64,
    max: f64,
    weighted_mean: f64,
    degraded: usize,
}

impl SeriesStats {
    #[allow(clippy::cast_precision_loss)]
    fn of(series: &[MosSample]) -> Option<Self> {
        let first = series.first()?;
        let (mut min, mut max) = (first.mos, first.mos);
        let (mut weighted, mut weight, mut plain) = (0.0_f64, 0_u64, 0.0_f64);
        for sample in series {
            min = min.min(sample.mos);
            max = max.max(sample.mos);
            weighted += sample.mos * sample.conversations_count as f64;
            weight = weight.saturating_add(sample.conversations_count);
            plain += sample.mos;
        }
        let weighted_mean = if weight == 0 {
            plain / series.len() as f64
        } else {
            weighted / weight as f64
        };
        Some(Self {
            min,
            max,
            weighted_mean,
            degraded: series.iter().filter(|s| s.mos < DEGRADED_MOS).count(),
        })
    }
}
