// ramtree Library - Public API

use std::fs::OpenOptions;
use std::path::Path;

use env_logger::Target;
use log::LevelFilter;

// Re-export error types
pub mod error;
pub use error::{RamtreeError, Result};

// Module declarations
pub mod commands;
pub mod core;
pub mod ui;

// Re-export commonly used types
pub use core::config::Config;
pub use core::process_monitor::{Forest, RefreshCoordinator};

/// Initialize logging.
///
/// With a log file, records at Info and above are appended to it so they
/// never reach the alternate screen. Without one, logging stays off unless
/// `RUST_LOG` asks for it.
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let mut builder = env_logger::Builder::new();

    match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .filter_level(LevelFilter::Info)
                .parse_default_env()
                .target(Target::Pipe(Box::new(file)));
        }
        None => {
            builder.filter_level(LevelFilter::Off).parse_default_env();
        }
    }

    builder
        .try_init()
        .map_err(|e| RamtreeError::other(format!("Failed to initialize logging: {}", e)))
}
