#![warn(missing_docs)]
//! liftbench Statistics
//!
//! Turns raw measurements into judgements:
//! - Memory stability and leak detection via least-squares slope over the
//!   settled part of an RSS series
//! - Peak/average/min/max memory summaries
//! - Timing summaries over repeated runs (mean, median, standard deviation)

mod percentiles;
mod profile;
mod stability;
mod summary;

pub use percentiles::compute_percentile;
pub use profile::MemoryProfile;
pub use stability::{StabilityAnalysis, analyze_stability, regression_slope};
pub use summary::{MemorySummary, TimeSummary, summarize_memory, summarize_times};

/// Series shorter than this are reported stable without analysis
pub const MIN_STABILITY_SAMPLES: usize = 10;

/// Samples that must remain after discarding the warm-up prefix
pub const MIN_RETAINED_SAMPLES: usize = 5;

/// RSS growth above this rate (MB/s) counts as a leak
pub const LEAK_THRESHOLD_MB_PER_SEC: f64 = 1.0;

/// A series is stable when its RSS range stays below this fraction of its mean
pub const STABLE_RANGE_FRACTION: f64 = 0.5;
