//! Per-process memory detail - platform-specific, expensive figures.
//!
//! Dirty and swapped bytes are not part of the cheap process table, so they
//! are fetched one pid at a time by the enrichment task.

use super::metrics::MemoryDetail;

#[cfg(target_os = "macos")]
use once_cell::sync::Lazy;
#[cfg(target_os = "macos")]
use regex::Regex;

/// Fetches detail metrics for a single process.
///
/// Implementations must not fail: unknown pids, permission errors and tool
/// failures all report zeros.
pub trait DetailSource: Send + Sync {
    fn collect_for(&self, pid: u32) -> MemoryDetail;
}

/// Get the platform-specific detail source.
///
/// - Linux: `/proc/<pid>/smaps_rollup`
/// - macOS: `footprint <pid>`
/// - Others: zeros
pub fn detail_source() -> Box<dyn DetailSource> {
    #[cfg(target_os = "linux")]
    {
        Box::new(SmapsDetailSource)
    }

    #[cfg(target_os = "macos")]
    {
        Box::new(FootprintDetailSource)
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        Box::new(FallbackDetailSource)
    }
}

// ============================================================================
// Linux Implementation
// ============================================================================

#[cfg(target_os = "linux")]
pub struct SmapsDetailSource;

#[cfg(target_os = "linux")]
impl DetailSource for SmapsDetailSource {
    fn collect_for(&self, pid: u32) -> MemoryDetail {
        let path = format!("/proc/{}/smaps_rollup", pid);
        match std::fs::read_to_string(&path) {
            Ok(contents) => parse_smaps_rollup(&contents),
            Err(e) => {
                log::trace!("no smaps_rollup for pid {}: {}", pid, e);
                MemoryDetail::default()
            }
        }
    }
}

/// Parse `smaps_rollup`: dirty is private + shared dirty, swap is `Swap:`.
/// Values are reported in kB.
pub fn parse_smaps_rollup(contents: &str) -> MemoryDetail {
    let mut detail = MemoryDetail::default();

    for line in contents.lines() {
        let mut parts = line.split_whitespace();
        let (Some(key), Some(value)) = (parts.next(), parts.next()) else {
            continue;
        };
        let Ok(kb) = value.parse::<u64>() else {
            continue;
        };

        match key {
            "Private_Dirty:" | "Shared_Dirty:" => detail.dirty_bytes += kb * 1024,
            "Swap:" => detail.swap_bytes += kb * 1024,
            _ => {}
        }
    }

    detail
}

// ============================================================================
// macOS Implementation
// ============================================================================

#[cfg(target_os = "macos")]
static COMPRESSED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(KB|MB|GB)\s+compressed").unwrap());
#[cfg(target_os = "macos")]
static SWAPPED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+(?:\.\d+)?)\s*(KB|MB|GB)\s+swapped").unwrap());

#[cfg(target_os = "macos")]
pub struct FootprintDetailSource;

#[cfg(target_os = "macos")]
impl DetailSource for FootprintDetailSource {
    fn collect_for(&self, pid: u32) -> MemoryDetail {
        match std::process::Command::new("footprint")
            .arg(pid.to_string())
            .stderr(std::process::Stdio::null())
            .output()
        {
            Ok(output) => parse_footprint(&String::from_utf8_lossy(&output.stdout)),
            Err(e) => {
                log::debug!("footprint failed for pid {}: {}", pid, e);
                MemoryDetail::default()
            }
        }
    }
}

/// Parse `footprint` output. The compressor figure fills the dirty slot:
/// on macOS dirty pages are compressed in RAM before they are swapped.
#[cfg(target_os = "macos")]
pub fn parse_footprint(output: &str) -> MemoryDetail {
    let mut detail = MemoryDetail::default();

    for line in output.lines() {
        if let Some(c) = COMPRESSED.captures(line) {
            detail.dirty_bytes = parse_size(&c[1], &c[2]);
        }
        if let Some(c) = SWAPPED.captures(line) {
            detail.swap_bytes = parse_size(&c[1], &c[2]);
        }
    }

    detail
}

#[cfg(target_os = "macos")]
fn parse_size(value: &str, unit: &str) -> u64 {
    let value: f64 = value.parse().unwrap_or(0.0);
    let multiplier = match unit.to_ascii_uppercase().as_str() {
        "KB" => 1024.0,
        "MB" => 1024.0 * 1024.0,
        "GB" => 1024.0 * 1024.0 * 1024.0,
        _ => 1.0,
    };
    (value * multiplier) as u64
}

// ============================================================================
// Fallback Implementation
// ============================================================================

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
pub struct FallbackDetailSource;

#[cfg(not(any(target_os = "linux", target_os = "macos")))]
impl DetailSource for FallbackDetailSource {
    fn collect_for(&self, _pid: u32) -> MemoryDetail {
        MemoryDetail::default()
    }
}

// ============================================================================
// Tests
// ============================================================================
