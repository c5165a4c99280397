//! Point-in-time JSON export of the visible rows.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use super::flatten::VisibleRow;
use super::metrics::{age_human, SystemSummary};
use super::process_tree::Forest;
use crate::error::{RamtreeError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub timestamp: String,
    pub system: Option<SystemSummary>,
    pub processes: Vec<ExportedProcess>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportedProcess {
    pub pid: u32,
    pub ppid: u32,
    pub name: String,
    pub command: String,
    pub rss_kb: u64,
    pub vsz_kb: u64,
    pub dirty_bytes: u64,
    pub swap_bytes: u64,
    pub age: String,
    pub started: String,
    pub depth: usize,
}

impl SnapshotDocument {
    pub fn new(
        at: DateTime<Local>,
        rows: &[VisibleRow],
        forest: &Forest,
        system: Option<&SystemSummary>,
    ) -> Self {
        let processes = rows
            .iter()
            .filter_map(|row| {
                let node = forest.get(row.node)?;
                Some(ExportedProcess {
                    pid: node.pid,
                    ppid: node.ppid,
                    name: node.name.clone(),
                    command: node.command.clone(),
                    rss_kb: node.rss_kb,
                    vsz_kb: node.vsz_kb,
                    dirty_bytes: node.detail.dirty_bytes,
                    swap_bytes: node.detail.swap_bytes,
                    age: age_human(node.age_seconds()),
                    started: node.started.clone(),
                    depth: row.depth,
                })
            })
            .collect();

        Self {
            timestamp: at.to_rfc3339(),
            system: system.cloned(),
            processes,
        }
    }
}

/// File name used for an export taken at `at`
pub fn snapshot_file_name(at: DateTime<Local>) -> String {
    format!("ram-snapshot-{}.json", at.format("%Y-%m-%d-%H%M%S"))
}

/// Write the rows to `dir/ram-snapshot-<timestamp>.json` and return the path
pub fn write_snapshot(
    dir: &Path,
    rows: &[VisibleRow],
    forest: &Forest,
    system: Option<&SystemSummary>,
) -> Result<PathBuf> {
    let now = Local::now();
    let document = SnapshotDocument::new(now, rows, forest, system);

    if !dir.is_dir() {
        return Err(RamtreeError::export(format!(
            "{} is not a directory",
            dir.display()
        )));
    }

    let path = dir.join(snapshot_file_name(now));
    let json = serde_json::to_string_pretty(&document)?;
    fs::write(&path, json)?;

    log::info!("exported {} rows to {}", document.processes.len(), path.display());
    Ok(path)
}
