//! Summary Statistics
//!
//! Memory summaries cover every sample (peaks are the signal); timing
//! summaries describe the repeated warm runs of one tool.

use crate::percentiles::compute_percentile;
use liftbench_core::MemorySample;
use serde::{Deserialize, Serialize};

/// Peak/average/min/max RSS over a memory series
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MemorySummary {
    /// Highest RSS observed (MB)
    pub peak_rss_mb: f64,
    /// Mean RSS (MB)
    pub avg_rss_mb: f64,
    /// Lowest RSS observed (MB)
    pub min_rss_mb: f64,
    /// Highest RSS observed (MB); equal to `peak_rss_mb`
    pub max_rss_mb: f64,
    /// Number of samples summarized
    pub sample_count: usize,
}

/// Central tendency and spread of repeated run times
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSummary {
    /// Arithmetic mean (seconds)
    pub mean: f64,
    /// Median (seconds)
    pub median: f64,
    /// Sample standard deviation (seconds), 0 for fewer than two runs
    pub std_dev: f64,
    /// Fastest run (seconds)
    pub min: f64,
    /// Slowest run (seconds)
    pub max: f64,
    /// Number of runs
    pub count: usize,
}

/// Summarize an RSS series. An empty series yields all zeros.
pub fn summarize_memory(samples: &[MemorySample]) -> MemorySummary {
    if samples.is_empty() {
        return MemorySummary::default();
    }

    let (min, max, sum) = samples.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), s| (min.min(s.rss_mb), max.max(s.rss_mb), sum + s.rss_mb),
    );

    MemorySummary {
        peak_rss_mb: max,
        avg_rss_mb: round2(sum / samples.len() as f64),
        min_rss_mb: min,
        max_rss_mb: max,
        sample_count: samples.len(),
    }
}

/// Summarize run times. An empty slice yields all zeros.
pub fn summarize_times(times: &[f64]) -> TimeSummary {
    if times.is_empty() {
        return TimeSummary::default();
    }

    let count = times.len();
    let mean = times.iter().sum::<f64>() / count as f64;
    let std_dev = if count < 2 {
        0.0
    } else {
        let variance = times.iter().map(|t| (t - mean).powi(2)).sum::<f64>() / (count - 1) as f64;
        variance.sqrt()
    };
    let min = times.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    TimeSummary {
        mean,
        median: compute_percentile(times, 50.0),
        std_dev,
        min,
        max,
        count,
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
