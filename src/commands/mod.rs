// Command handlers module
pub mod monitor;
pub mod snapshot;

use clap::ArgMatches;

use crate::core::config::Config;
use crate::core::process_monitor::MetricKey;

// Re-exports for cleaner imports
pub use monitor::execute as monitor;
pub use snapshot::execute as snapshot;

/// User config, or defaults when the config directory is unavailable
pub(crate) fn load_config() -> Config {
    Config::load().unwrap_or_else(|e| {
        log::warn!("Using default configuration: {}", e);
        Config::default()
    })
}

/// `--sort` if given, otherwise the configured default
pub(crate) fn sort_key(matches: &ArgMatches, config: &Config) -> anyhow::Result<MetricKey> {
    match matches.get_one::<String>("sort") {
        Some(raw) => raw.parse::<MetricKey>().map_err(anyhow::Error::msg),
        None => Ok(config.default_sort),
    }
}
