// UI and formatting module

pub mod formatters;
pub mod monitor_tui;

// Re-export commonly used items for cleaner imports
pub use formatters::{bytes_human, format_timestamp, kb_human, pressure_bar, truncate_to_width};
