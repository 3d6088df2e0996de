//! Background memory sampler
//!
//! One dedicated thread per profiled invocation. The thread owns the probe and
//! pushes samples through a channel; the stop signal is a second channel whose
//! `recv_timeout` doubles as the interval wait, so stopping never has to wait
//! out a full tick.

use crate::BYTES_PER_MB;
use crate::probe::{MemoryProbe, SysinfoProbe};
use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Default bound on how long `stop()` waits for the sampler thread.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(5);

/// A single memory observation of a process tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MemorySample {
    /// Seconds since the process was spawned, millisecond resolution
    pub timestamp: f64,
    /// Resident set size in MB
    pub rss_mb: f64,
    /// Virtual memory size in MB
    pub vms_mb: f64,
}

/// Handle to a running sampler thread.
pub struct MemorySampler {
    stop_tx: Option<Sender<()>>,
    samples_rx: Receiver<MemorySample>,
    done_rx: Receiver<()>,
    handle: Option<JoinHandle<()>>,
    grace: Duration,
}

impl MemorySampler {
    /// Start sampling `pid` with the `sysinfo` probe, timestamps relative to now.
    pub fn start(pid: u32, interval: Duration) -> Self {
        Self::start_with(pid, interval, Instant::now(), SysinfoProbe::new())
    }

    /// Start sampling `pid` with a custom probe and time origin.
    ///
    /// `origin` should be the instant the process was spawned so that sample
    /// timestamps line up with the measured elapsed time.
    pub fn start_with<P>(pid: u32, interval: Duration, origin: Instant, mut probe: P) -> Self
    where
        P: MemoryProbe + 'static,
    {
        let (stop_tx, stop_rx) = mpsc::channel::<()>();
        let (samples_tx, samples_rx) = mpsc::channel::<MemorySample>();
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let spawned = std::thread::Builder::new()
            .name("liftbench-sampler".to_string())
            .spawn(move || {
                let mut last_timestamp = 0.0_f64;
                loop {
                    let Some(reading) = probe.read_tree(pid) else {
                        debug!(pid, "sampling target gone");
                        break;
                    };
                    let timestamp = round_to(origin.elapsed().as_secs_f64(), 3).max(last_timestamp);
                    last_timestamp = timestamp;

                    let sample = MemorySample {
                        timestamp,
                        rss_mb: round_to(reading.rss_bytes as f64 / BYTES_PER_MB, 2),
                        vms_mb: round_to(reading.vms_bytes as f64 / BYTES_PER_MB, 2),
                    };
                    if samples_tx.send(sample).is_err() {
                        break;
                    }

                    match stop_rx.recv_timeout(interval) {
                        Err(RecvTimeoutError::Timeout) => continue,
                        Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                let _ = done_tx.send(());
            });

        let handle = match spawned {
            Ok(handle) => Some(handle),
            Err(e) => {
                warn!("failed to start memory sampler for pid {}: {}", pid, e);
                None
            }
        };

        Self {
            stop_tx: Some(stop_tx),
            samples_rx,
            done_rx,
            handle,
            grace: DEFAULT_STOP_GRACE,
        }
    }

    /// Override the bound `stop()` waits for the thread to finish.
    pub fn with_grace(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Signal the thread, wait up to the grace period, and return the series.
    ///
    /// If the thread does not finish in time it is detached and the samples
    /// already sent are returned.
    pub fn stop(mut self) -> Vec<MemorySample> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.handle.take() {
            match self.done_rx.recv_timeout(self.grace) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                    if handle.join().is_err() {
                        warn!("memory sampler thread panicked");
                    }
                }
                Err(RecvTimeoutError::Timeout) => {
                    warn!(
                        "memory sampler did not stop within {:?}, returning partial series",
                        self.grace
                    );
                }
            }
        }

        self.samples_rx.try_iter().collect()
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryReading;

    /// Probe returning a fixed reading for a limited number of ticks.
    struct CountdownProbe {
        remaining: usize,
        rss_bytes: u64,
    }

    impl MemoryProbe for CountdownProbe {
        fn read_tree(&mut self, _pid: u32) -> Option<MemoryReading> {
            if self.remaining == 0 {
                return None;
            }
            self.remaining -= 1;
            Some(MemoryReading {
                rss_bytes: self.rss_bytes,
                vms_bytes: self.rss_bytes * 2,
            })
        }
    }

    /// Probe that blocks far longer than any grace period.
    struct StuckProbe {
        first: bool,
    }

    impl MemoryProbe for StuckProbe {
        fn read_tree(&mut self, _pid: u32) -> Option<MemoryReading> {
            if self.first {
                self.first = false;
                return Some(MemoryReading::default());
            }
            std::thread::sleep(Duration::from_secs(2));
            None
        }
    }

    #[test]
    fn test_sampler_stops_when_target_gone() {
        let probe = CountdownProbe {
            remaining: 3,
            rss_bytes: 10 * 1024 * 1024,
        };
        let sampler = MemorySampler::start_with(1, Duration::from_millis(1), Instant::now(), probe);
        std::thread::sleep(Duration::from_millis(100));
        let samples = sampler.stop();

        assert_eq!(samples.len(), 3);
        for sample in &samples {
            assert!((sample.rss_mb - 10.0).abs() < 1e-9);
            assert!((sample.vms_mb - 20.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_sampler_timestamps_non_decreasing() {
        let probe = CountdownProbe {
            remaining: 20,
            rss_bytes: 1024,
        };
        let sampler = MemorySampler::start_with(1, Duration::from_millis(2), Instant::now(), probe);
        std::thread::sleep(Duration::from_millis(80));
        let samples = sampler.stop();

        assert!(!samples.is_empty());
        for pair in samples.windows(2) {
            assert!(pair[1].timestamp >= pair[0].timestamp);
        }
    }

    #[test]
    fn test_stop_interrupts_interval_wait() {
        let probe = CountdownProbe {
            remaining: usize::MAX,
            rss_bytes: 1024,
        };
        let sampler = MemorySampler::start_with(1, Duration::from_secs(60), Instant::now(), probe);
        let started = Instant::now();
        let samples = sampler.stop();

        assert!(started.elapsed() < Duration::from_secs(5));
        assert!(samples.len() <= 1);
    }

    #[test]
    fn test_stop_is_bounded_by_grace() {
        let probe = StuckProbe { first: true };
        let sampler = MemorySampler::start_with(1, Duration::from_millis(1), Instant::now(), probe)
            .with_grace(Duration::from_millis(100));
        std::thread::sleep(Duration::from_millis(20));
        let started = Instant::now();
        let samples = sampler.stop();

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(samples.len(), 1);
    }

    #[test]
    fn test_round_to() {
        assert!((round_to(1.23456, 3) - 1.235).abs() < 1e-12);
        assert!((round_to(99.999, 2) - 100.0).abs() < 1e-12);
    }
}
