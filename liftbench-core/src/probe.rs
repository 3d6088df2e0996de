//! Memory probes
//!
//! A probe reports the combined resident and virtual size of a process and all
//! of its live descendants. Liftover wrappers (CrossMap's Python entry point,
//! shell launchers) frequently fork, so the root process alone under-reports.

use std::collections::HashMap;
use sysinfo::{Pid, ProcessRefreshKind, ProcessStatus, ProcessesToUpdate, System};

/// Raw memory reading of a process tree, in bytes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemoryReading {
    /// Resident set size summed over the tree
    pub rss_bytes: u64,
    /// Virtual memory size summed over the tree
    pub vms_bytes: u64,
}

/// Source of memory readings for the sampler thread.
pub trait MemoryProbe: Send {
    /// Read the memory of `pid` and its descendants.
    ///
    /// Returns `None` once the target no longer exists or cannot be inspected;
    /// the sampler treats that as the end of the series.
    fn read_tree(&mut self, pid: u32) -> Option<MemoryReading>;
}

/// Probe backed by the `sysinfo` process table.
pub struct SysinfoProbe {
    system: System,
}

impl SysinfoProbe {
    /// Create a probe with an empty process table.
    pub fn new() -> Self {
        Self {
            system: System::new(),
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for SysinfoProbe {
    fn read_tree(&mut self, pid: u32) -> Option<MemoryReading> {
        let root = Pid::from_u32(pid);
        self.system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_memory(),
        );

        // An exited but not yet reaped child still has a table entry.
        let root_process = self.system.process(root)?;
        if matches!(root_process.status(), ProcessStatus::Zombie | ProcessStatus::Dead) {
            return None;
        }

        let mut children_map: HashMap<Pid, Vec<Pid>> = HashMap::new();
        for (child, process) in self.system.processes() {
            if let Some(parent) = process.parent() {
                children_map.entry(parent).or_default().push(*child);
            }
        }

        let mut tree = Vec::new();
        collect_process_tree(root, &children_map, &mut tree);

        let mut reading = MemoryReading::default();
        for pid in tree {
            if let Some(process) = self.system.process(pid) {
                reading.rss_bytes += process.memory();
                reading.vms_bytes += process.virtual_memory();
            }
        }
        Some(reading)
    }
}

fn collect_process_tree(pid: Pid, children_map: &HashMap<Pid, Vec<Pid>>, out: &mut Vec<Pid>) {
    out.push(pid);
    if let Some(children) = children_map.get(&pid) {
        for child in children {
            // Guard against a pid being reused as its own ancestor between refreshes.
            if !out.contains(child) {
                collect_process_tree(*child, children_map, out);
            }
        }
    }
}
