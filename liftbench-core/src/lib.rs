#![warn(missing_docs)]
//! liftbench Core - Process Runtime
//!
//! Drives external liftover tools as child processes and watches their memory.
//!
//! ```text
//! ProcessRunner::run_profiled
//!     │
//!     ├── spawn (own process group, stdout/stderr -> temp files)
//!     ├── MemorySampler::start(pid)  ──► sampler thread ──► MemoryProbe
//!     ├── poll until exit or deadline (SIGTERM -> grace -> SIGKILL)
//!     └── MemorySampler::stop() -> Vec<MemorySample>
//! ```

mod probe;
mod runner;
mod sampler;

pub use probe::{MemoryProbe, MemoryReading, SysinfoProbe};
pub use runner::{
    EXIT_NOT_FOUND, EXIT_PERMISSION_DENIED, EXIT_SPAWN_FAILED, EXIT_TIMED_OUT, ExecutionResult,
    ProcessRunner, format_seconds, truncate_chars,
};
pub use sampler::{DEFAULT_STOP_GRACE, MemorySample, MemorySampler};

/// Bytes per megabyte used for every RSS/VMS conversion.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;
