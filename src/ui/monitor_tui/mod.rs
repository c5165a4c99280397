//! Terminal User Interface for the process tree.
//!
//! Provides a live dashboard using ratatui.

mod app;
mod event_handler;
mod render;
mod widgets;

pub use app::{run_monitor_app, MonitorApp, MonitorAppConfig};
pub use event_handler::{map_key, MonitorEvent};
