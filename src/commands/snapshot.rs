//! One-shot export of the process tree, without the TUI.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::process_monitor::{
    export, MetricKey, RefreshConfig, RefreshCoordinator, RefreshOutcome, SnapshotSource,
    SummarySource, SysinfoSnapshotSource, SysinfoSummarySource, SystemSummary,
};

#[derive(Debug, Clone)]
pub struct SnapshotOptions {
    pub output_dir: PathBuf,
    pub sort_key: MetricKey,
    pub filter: Option<String>,
    pub expand_all: bool,
}

pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load_config();

    let options = SnapshotOptions {
        output_dir: matches
            .get_one::<PathBuf>("output")
            .cloned()
            .unwrap_or_else(|| config.export_dir()),
        sort_key: super::sort_key(matches, &config)?,
        filter: matches.get_one::<String>("filter").cloned(),
        expand_all: matches.get_flag("expand-all"),
    };

    let summary = SysinfoSummarySource::new().collect();
    let path = take_snapshot(Box::new(SysinfoSnapshotSource::new()), Some(summary), &options)?;

    println!("{}", path.display());
    Ok(())
}

/// Collect once from `source` and write the visible rows to
/// `options.output_dir`. Returns the written file.
pub fn take_snapshot(
    source: Box<dyn SnapshotSource>,
    summary: Option<SystemSummary>,
    options: &SnapshotOptions,
) -> Result<PathBuf> {
    let refresh = RefreshConfig {
        enrich_enabled: false,
        ..RefreshConfig::default()
    };
    let mut coordinator =
        RefreshCoordinator::new(source, None, refresh).context("Failed to set up collector")?;
    coordinator.set_sort_key(options.sort_key);
    if let Some(filter) = &options.filter {
        coordinator.set_filter(filter.as_str());
    }

    if let RefreshOutcome::Rebuilt { processes, .. } = coordinator.refresh_now() {
        log::info!("snapshot collected {} processes", processes);
    }
    if options.expand_all {
        coordinator.expand_all();
    }

    export::write_snapshot(
        &options.output_dir,
        coordinator.rows(),
        coordinator.forest(),
        summary.as_ref(),
    )
    .with_context(|| format!("Failed to write snapshot to {}", options.output_dir.display()))
}
