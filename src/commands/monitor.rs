//! Process tree monitor command handler.
//!
//! Starts the live TUI dashboard.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::ArgMatches;

use crate::core::process_monitor::RefreshConfig;
use crate::ui::monitor_tui::{run_monitor_app, MonitorAppConfig};

/// Execute the monitor command
pub fn execute(matches: &ArgMatches) -> Result<()> {
    let config = super::load_config();

    let mut refresh = RefreshConfig::from(&config);
    if let Some(interval) = matches.get_one::<u64>("interval") {
        refresh.interval = Duration::from_millis((*interval).max(100));
    }
    if matches.get_flag("no-enrich") {
        refresh.enrich_enabled = false;
    }

    let app_config = MonitorAppConfig {
        refresh,
        sort_key: super::sort_key(matches, &config)?,
        filter: matches.get_one::<String>("filter").cloned(),
        export_dir: config.export_dir(),
    };

    log::info!(
        "starting monitor: interval {:?}, sort {}, enrichment {}",
        app_config.refresh.interval,
        app_config.sort_key,
        app_config.refresh.enrich_enabled
    );

    run_monitor_app(app_config).context("Failed to run process monitor")
}
