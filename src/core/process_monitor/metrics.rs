use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of raw process data for a single snapshot instant
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRecord {
    pub pid: u32,
    pub ppid: u32,
    pub rss_kb: u64,
    pub vsz_kb: u64,
    pub command: String,
    /// etime token: `[[dd-]hh:]mm:ss`
    pub elapsed: String,
    /// Start timestamp token as reported by the source
    pub started: String,
}

/// Expensive per-process memory figures filled in by enrichment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryDetail {
    pub dirty_bytes: u64,
    pub swap_bytes: u64,
}

/// System-wide memory figures shown in the header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,
    pub swap_total_bytes: u64,
    pub swap_used_bytes: u64,
    pub pressure_level: PressureLevel,
    pub pressure_percent: u8,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PressureLevel {
    #[default]
    Normal,
    Warn,
    Critical,
}

impl PressureLevel {
    pub fn from_percent(percent: u8) -> Self {
        match percent {
            p if p > 80 => PressureLevel::Critical,
            p if p > 60 => PressureLevel::Warn,
            _ => PressureLevel::Normal,
        }
    }
}

impl SystemSummary {
    /// Derive the summary from raw byte counts, computing pressure from used/total
    pub fn from_counts(
        total_bytes: u64,
        used_bytes: u64,
        free_bytes: u64,
        swap_total_bytes: u64,
        swap_used_bytes: u64,
    ) -> Self {
        let pressure_percent = if total_bytes == 0 {
            0
        } else {
            ((used_bytes.min(total_bytes) as f64 / total_bytes as f64) * 100.0).round() as u8
        };

        Self {
            total_bytes,
            used_bytes,
            free_bytes,
            swap_total_bytes,
            swap_used_bytes,
            pressure_level: PressureLevel::from_percent(pressure_percent),
            pressure_percent,
        }
    }
}

/// Metric used to order siblings in the flattened view
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKey {
    #[default]
    Rss,
    #[serde(alias = "virt")]
    Virtual,
    Dirty,
    Swap,
    Age,
}

impl MetricKey {
    pub const ALL: [MetricKey; 5] = [
        MetricKey::Rss,
        MetricKey::Virtual,
        MetricKey::Dirty,
        MetricKey::Swap,
        MetricKey::Age,
    ];

    /// Column label used in the table header
    pub fn label(self) -> &'static str {
        match self {
            MetricKey::Rss => "RSS",
            MetricKey::Virtual => "VIRT",
            MetricKey::Dirty => "DIRTY",
            MetricKey::Swap => "SWAP",
            MetricKey::Age => "AGE",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            MetricKey::Rss => {
                "RSS: Physical memory actively used by this process (Resident Set Size)"
            }
            MetricKey::Virtual => {
                "VIRT: Total virtual address space including shared libs and memory-mapped files"
            }
            MetricKey::Dirty => {
                "DIRTY: Modified pages that must be written back or compressed before reuse"
            }
            MetricKey::Swap => "SWAP: Memory paged out to disk when RAM is full",
            MetricKey::Age => "AGE: Time since the process was launched",
        }
    }

    /// Next key in the sort cycle
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|k| *k == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Whether the metric is only known after enrichment
    pub fn is_detail(self) -> bool {
        matches!(self, MetricKey::Dirty | MetricKey::Swap)
    }
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for MetricKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Ok(MetricKey::Rss),
            "virt" | "virtual" | "vsz" => Ok(MetricKey::Virtual),
            "dirty" => Ok(MetricKey::Dirty),
            "swap" => Ok(MetricKey::Swap),
            "age" => Ok(MetricKey::Age),
            other => Err(format!(
                "unknown sort key '{}' (expected rss, virt, dirty, swap or age)",
                other
            )),
        }
    }
}

static APP_BUNDLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/([^/]+)\.app/").unwrap());
static HELPER_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+Helper.*").unwrap());
static HELPER_TYPE: Lazy<Regex> = Lazy::new(|| Regex::new(r"--type=(\S+)").unwrap());
static UTILITY_SUB_TYPE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"--utility-sub-type=(\S+)").unwrap());

/// Derive a short display name from a raw command line.
///
/// Chromium/Electron helper processes all share one executable, so they are
/// labelled by app bundle and helper type instead (`Slack: renderer`).
pub fn display_name(command: &str) -> String {
    let command = command.trim();
    if command.is_empty() {
        return "[unknown]".to_string();
    }

    if command.contains("--type=") {
        return chromium_helper_name(command);
    }

    let first = command.split_whitespace().next().unwrap_or(command);
    let basename = first.rsplit('/').next().unwrap_or(first);
    if basename.is_empty() {
        command.to_string()
    } else {
        basename.to_string()
    }
}

fn chromium_helper_name(command: &str) -> String {
    let app_name = APP_BUNDLE
        .captures(command)
        .map(|c| HELPER_SUFFIX.replace(&c[1], "").into_owned())
        .unwrap_or_else(|| "Chromium".to_string());

    let helper_type = HELPER_TYPE
        .captures(command)
        .map(|c| c[1].to_string())
        .unwrap_or_else(|| "unknown".to_string());

    let label = match helper_type.as_str() {
        "renderer" if command.contains("--extension-process") => "extension".to_string(),
        "renderer" => "renderer".to_string(),
        "gpu-process" => "gpu".to_string(),
        "utility" => {
            let sub = UTILITY_SUB_TYPE
                .captures(command)
                .map(|c| c[1].to_string())
                .unwrap_or_default();
            sub.split('.')
                .find(|part| *part != "mojom" && part.chars().any(|c| c.is_ascii_uppercase()))
                .map(|part| part.trim_end_matches("Service").to_lowercase())
                .unwrap_or_else(|| "utility".to_string())
        }
        other => other.to_string(),
    };

    format!("{}: {}", app_name, label)
}

/// Parse an etime token (`mm:ss`, `hh:mm:ss`, `dd-hh:mm:ss`) into seconds.
/// Malformed tokens count as zero.
pub fn parse_elapsed(token: &str) -> u64 {
    let parts: Vec<u64> = token
        .trim()
        .split(['-', ':'])
        .map(|p| p.parse::<u64>().unwrap_or(0))
        .collect();

    match parts.as_slice() {
        [m, s] => m * 60 + s,
        [h, m, s] => h * 3600 + m * 60 + s,
        [d, h, m, s] => d * 86400 + h * 3600 + m * 60 + s,
        _ => 0,
    }
}

/// Format a number of seconds as an etime token
pub fn format_elapsed(secs: u64) -> String {
    let days = secs / 86400;
    let hours = (secs % 86400) / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    if days > 0 {
        format!("{}-{:02}:{:02}:{:02}", days, hours, minutes, seconds)
    } else if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, seconds)
    } else {
        format!("{:02}:{:02}", minutes, seconds)
    }
}

/// Human readable age (`30s`, `5m`, `2h 30m`, `3d 4h`)
pub fn age_human(secs: u64) -> String {
    if secs < 60 {
        return format!("{}s", secs);
    }
    let mins = secs / 60;
    if mins < 60 {
        return format!("{}m", mins);
    }
    let hours = mins / 60;
    if hours < 24 {
        return format!("{}h {}m", hours, mins % 60);
    }
    let days = hours / 24;
    format!("{}d {}h", days, hours % 24)
}
