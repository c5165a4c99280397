//! Snapshot and summary sources.
//!
//! The core only depends on the traits; the `sysinfo` implementations are the
//! ones the binary wires up.

use chrono::{DateTime, Local};
use sysinfo::{
    MemoryRefreshKind, ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, ThreadKind,
    UpdateKind,
};

use super::metrics::{format_elapsed, ProcessRecord, SystemSummary};

/// Supplies a flat list of processes for one point in time.
///
/// Implementations never fail: unreadable entries are dropped and a source
/// that is unavailable returns an empty list.
pub trait SnapshotSource {
    fn collect(&mut self) -> Vec<ProcessRecord>;
}

/// Supplies system-wide memory figures for the header
pub trait SummarySource {
    fn collect(&mut self) -> SystemSummary;
}

fn process_refresh_kind() -> ProcessRefreshKind {
    ProcessRefreshKind::nothing()
        .with_memory()
        .with_cmd(UpdateKind::OnlyIfNotSet)
}

/// Process snapshots backed by `sysinfo::System`
pub struct SysinfoSnapshotSource {
    system: System,
}

impl SysinfoSnapshotSource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_processes(process_refresh_kind());
        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for SysinfoSnapshotSource {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotSource for SysinfoSnapshotSource {
    fn collect(&mut self) -> Vec<ProcessRecord> {
        self.system
            .refresh_processes_specifics(ProcessesToUpdate::All, true, process_refresh_kind());

        let records: Vec<ProcessRecord> = self
            .system
            .processes()
            .values()
            // Userland threads show up as processes on Linux
            .filter(|p| p.thread_kind() != Some(ThreadKind::Userland))
            .map(|p| {
                let cmd = p
                    .cmd()
                    .iter()
                    .map(|part| part.to_string_lossy())
                    .collect::<Vec<_>>()
                    .join(" ");
                let command = if cmd.trim().is_empty() {
                    format!("[{}]", p.name().to_string_lossy())
                } else {
                    cmd
                };

                ProcessRecord {
                    pid: p.pid().as_u32(),
                    ppid: p.parent().map(|pp| pp.as_u32()).unwrap_or(0),
                    rss_kb: p.memory() / 1024,
                    vsz_kb: p.virtual_memory() / 1024,
                    command,
                    elapsed: format_elapsed(p.run_time()),
                    started: format_start_time(p.start_time()),
                }
            })
            .collect();

        log::trace!("collected {} process records", records.len());
        records
    }
}

fn format_start_time(unix_secs: u64) -> String {
    DateTime::from_timestamp(unix_secs as i64, 0)
        .map(|utc| {
            utc.with_timezone(&Local)
                .format("%a %b %e %H:%M:%S %Y")
                .to_string()
        })
        .unwrap_or_default()
}

/// System memory summary backed by `sysinfo::System`
pub struct SysinfoSummarySource {
    system: System,
}

impl SysinfoSummarySource {
    pub fn new() -> Self {
        let refresh_kind = RefreshKind::nothing().with_memory(MemoryRefreshKind::everything());
        Self {
            system: System::new_with_specifics(refresh_kind),
        }
    }
}

impl Default for SysinfoSummarySource {
    fn default() -> Self {
        Self::new()
    }
}

impl SummarySource for SysinfoSummarySource {
    fn collect(&mut self) -> SystemSummary {
        self.system
            .refresh_memory_specifics(MemoryRefreshKind::everything());

        SystemSummary::from_counts(
            self.system.total_memory(),
            self.system.used_memory(),
            self.system.available_memory(),
            self.system.total_swap(),
            self.system.used_swap(),
        )
    }
}
