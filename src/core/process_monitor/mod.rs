//! Process hierarchy engine and live-refresh coordination.
//!
//! Turns flat process snapshots into an expandable tree, flattens it for
//! display and keeps user view state stable across refreshes.

mod collector;
mod detail;
mod enrichment;
pub mod export;
mod flatten;
mod history;
mod metrics;
pub mod process_tree;
mod refresh;

pub use collector::{SnapshotSource, SummarySource, SysinfoSnapshotSource, SysinfoSummarySource};
pub use detail::{detail_source, parse_smaps_rollup, DetailSource};
pub use enrichment::{EnrichTarget, EnrichmentConfig, EnrichmentScheduler, EnrichmentUpdate};
pub use export::{write_snapshot, ExportedProcess, SnapshotDocument};
pub use flatten::{flatten, VisibleRow};
pub use history::{Sample, TimelineLedger, DEFAULT_TIMELINE_CAPACITY};
pub use metrics::{
    age_human, display_name, format_elapsed, parse_elapsed, MemoryDetail, MetricKey,
    PressureLevel, ProcessRecord, SystemSummary,
};
pub use process_tree::{Forest, NodeId, ProcessNode};
pub use refresh::{RefreshConfig, RefreshCoordinator, RefreshOutcome, RefreshPhase, ViewState};
