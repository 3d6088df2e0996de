//! Memory Stability Analysis
//!
//! Fits a least-squares line through `(timestamp, rss_mb)` after discarding the
//! start-up ramp and classifies the series:
//!
//! ```text
//! samples ──► drop first max(1, n/10) ──► slope ──► leak?   (slope > 1 MB/s)
//!                                          └──────► stable? (range < 0.5 * mean, no leak)
//! ```

use crate::{
    LEAK_THRESHOLD_MB_PER_SEC, MIN_RETAINED_SAMPLES, MIN_STABILITY_SAMPLES, STABLE_RANGE_FRACTION,
};
use liftbench_core::MemorySample;
use serde::{Deserialize, Serialize};

/// Verdict over one memory series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StabilityAnalysis {
    /// RSS stayed within bounds and did not trend upward
    pub is_stable: bool,
    /// Least-squares RSS slope in MB/s, rounded to 4 decimals
    pub leak_rate_mb_per_sec: f64,
    /// Slope exceeded the leak threshold
    pub leak_detected: bool,
}

impl StabilityAnalysis {
    /// Result used whenever a series is too short or degenerate to judge.
    pub const INCONCLUSIVE: StabilityAnalysis = StabilityAnalysis {
        is_stable: true,
        leak_rate_mb_per_sec: 0.0,
        leak_detected: false,
    };
}

impl Default for StabilityAnalysis {
    fn default() -> Self {
        Self::INCONCLUSIVE
    }
}

/// Analyze a memory series for leaks and instability.
///
/// Never fails: short or degenerate series (all timestamps equal) yield
/// [`StabilityAnalysis::INCONCLUSIVE`].
pub fn analyze_stability(samples: &[MemorySample]) -> StabilityAnalysis {
    if samples.len() < MIN_STABILITY_SAMPLES {
        return StabilityAnalysis::INCONCLUSIVE;
    }

    let skip = (samples.len() / 10).max(1);
    let retained = &samples[skip..];
    if retained.len() < MIN_RETAINED_SAMPLES {
        return StabilityAnalysis::INCONCLUSIVE;
    }

    let Some(slope) = regression_slope(retained.iter().map(|s| (s.timestamp, s.rss_mb))) else {
        return StabilityAnalysis::INCONCLUSIVE;
    };

    let (min, max, sum) = retained.iter().fold(
        (f64::INFINITY, f64::NEG_INFINITY, 0.0),
        |(min, max, sum), s| (min.min(s.rss_mb), max.max(s.rss_mb), sum + s.rss_mb),
    );
    let mean = sum / retained.len() as f64;

    let leak_detected = slope > LEAK_THRESHOLD_MB_PER_SEC;
    let is_stable = (max - min) < STABLE_RANGE_FRACTION * mean && !leak_detected;

    StabilityAnalysis {
        is_stable,
        leak_rate_mb_per_sec: (slope * 10_000.0).round() / 10_000.0,
        leak_detected,
    }
}

/// Ordinary least-squares slope of `y` over `x`.
///
/// Returns `None` for fewer than two points or when the x values have no
/// spread (|denominator| < 1e-10).
pub fn regression_slope(points: impl Iterator<Item = (f64, f64)> + Clone) -> Option<f64> {
    let (n, sum_x, sum_y, sum_xy, sum_xx) = points.clone().fold(
        (0usize, 0.0, 0.0, 0.0, 0.0),
        |(n, sx, sy, sxy, sxx), (x, y)| (n + 1, sx + x, sy + y, sxy + x * y, sxx + x * x),
    );
    if n < 2 {
        return None;
    }
    let n = n as f64;
    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator.abs() < 1e-10 {
        return None;
    }
    Some((n * sum_xy - sum_x * sum_y) / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize, rss: impl Fn(f64) -> f64) -> Vec<MemorySample> {
        (0..n)
            .map(|i| {
                let t = i as f64;
                MemorySample {
                    timestamp: t,
                    rss_mb: rss(t),
                    vms_mb: rss(t) * 2.0,
                }
            })
            .collect()
    }

    #[test]
    fn test_short_series_is_inconclusive() {
        let samples = series(9, |t| 100.0 + 50.0 * t);
        assert_eq!(analyze_stability(&samples), StabilityAnalysis::INCONCLUSIVE);
    }

    #[test]
    fn test_constant_rss_is_stable() {
        let samples = series(20, |_| 250.0);
        let analysis = analyze_stability(&samples);
        assert!(analysis.is_stable);
        assert!(!analysis.leak_detected);
        assert!(analysis.leak_rate_mb_per_sec.abs() < 1e-9);
    }

    #[test]
    fn test_linear_growth_is_leak() {
        let samples = series(30, |t| 100.0 + 5.0 * t);
        let analysis = analyze_stability(&samples);
        assert!(analysis.leak_detected);
        assert!(!analysis.is_stable);
        assert!((analysis.leak_rate_mb_per_sec - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_slow_growth_below_threshold() {
        let samples = series(40, |t| 500.0 + 0.5 * t);
        let analysis = analyze_stability(&samples);
        assert!(!analysis.leak_detected);
        assert!(analysis.is_stable);
        assert!((analysis.leak_rate_mb_per_sec - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_wide_range_is_unstable_without_leak() {
        // Oscillates between 10 and 100 MB with no trend.
        let samples = series(40, |t| if (t as usize) % 2 == 0 { 10.0 } else { 100.0 });
        let analysis = analyze_stability(&samples);
        assert!(!analysis.leak_detected);
        assert!(!analysis.is_stable);
    }

    #[test]
    fn test_identical_timestamps_are_inconclusive() {
        let samples: Vec<MemorySample> = (0..20)
            .map(|i| MemorySample {
                timestamp: 1.0,
                rss_mb: i as f64,
                vms_mb: 0.0,
            })
            .collect();
        assert_eq!(analyze_stability(&samples), StabilityAnalysis::INCONCLUSIVE);
    }

    #[test]
    fn test_startup_ramp_is_discarded() {
        // First sample is a start-up spike; the rest is flat.
        let mut samples = series(10, |_| 200.0);
        samples[0].rss_mb = 5.0;
        let analysis = analyze_stability(&samples);
        assert!(analysis.is_stable);
        assert!(analysis.leak_rate_mb_per_sec.abs() < 1e-9);
    }

    #[test]
    fn test_leak_rate_rounded() {
        let samples = series(20, |t| 1.0 + 1.234567 * t);
        let analysis = analyze_stability(&samples);
        assert_eq!(analysis.leak_rate_mb_per_sec, 1.2346);
    }

    #[test]
    fn test_regression_slope() {
        let points = [(0.0, 1.0), (1.0, 3.0), (2.0, 5.0)];
        let slope = regression_slope(points.iter().copied()).expect("slope");
        assert!((slope - 2.0).abs() < 1e-12);
        assert!(regression_slope([(1.0, 1.0)].iter().copied()).is_none());
    }
}
