//! System Metadata Collection
//!
//! Report metadata: git commit, OS, CPU, memory and the versions of the
//! tools under test.
//!
//! Hardware details come from `sysinfo`; anything it cannot determine is
//! reported as "Unknown".

use chrono::Utc;
use liftbench_report::{ReportMeta, SCHEMA_VERSION, SystemInfo};
use std::collections::BTreeMap;
use sysinfo::{CpuRefreshKind, MemoryRefreshKind, RefreshKind, System};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Build report metadata for a run over tools with `tool_versions`
pub fn build_report_meta(tool_versions: BTreeMap<String, String>) -> ReportMeta {
    let git_commit = std::process::Command::new("git")
        .args(["rev-parse", "HEAD"])
        .output()
        .ok()
        .filter(|o| o.status.success())
        .and_then(|o| String::from_utf8(o.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    ReportMeta {
        schema_version: SCHEMA_VERSION,
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        git_commit,
        system: probe_system(),
        tool_versions,
    }
}

fn probe_system() -> SystemInfo {
    let system = System::new_with_specifics(
        RefreshKind::nothing()
            .with_cpu(CpuRefreshKind::nothing())
            .with_memory(MemoryRefreshKind::nothing().with_ram()),
    );
    let cpu = system
        .cpus()
        .first()
        .map(|cpu| cpu.brand().trim().to_string())
        .filter(|brand| !brand.is_empty());

    SystemInfo {
        os: std::env::consts::OS.to_string(),
        os_version: System::kernel_version().unwrap_or_else(|| "Unknown".to_string()),
        arch: std::env::consts::ARCH.to_string(),
        cpu: cpu.unwrap_or_else(|| "Unknown".to_string()),
        cpu_cores: std::thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1),
        memory_gb: system.total_memory() as f64 / BYTES_PER_GB,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_carries_tool_versions() {
        let mut versions = BTreeMap::new();
        versions.insert("crossmap".to_string(), "0.7.0".to_string());

        let meta = build_report_meta(versions);
        assert_eq!(meta.schema_version, SCHEMA_VERSION);
        assert_eq!(meta.tool_versions["crossmap"], "0.7.0");
        assert!(meta.system.cpu_cores >= 1);
        assert_eq!(meta.system.arch, std::env::consts::ARCH);
    }
}
