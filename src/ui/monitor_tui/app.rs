use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};

use crate::core::process_monitor::{
    detail_source, export, DetailSource, MetricKey, RefreshConfig, RefreshCoordinator,
    RefreshOutcome, SnapshotSource, SummarySource, SysinfoSnapshotSource, SysinfoSummarySource,
    SystemSummary,
};

use super::event_handler::{map_key, MonitorEvent};
use super::render::{list_height, render_ui};

const FLASH_DURATION: Duration = Duration::from_secs(2);
/// Input poll timeout, bounds how late a refresh or enrichment result shows up
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Monitor application state
pub struct MonitorApp {
    pub coordinator: RefreshCoordinator,
    pub summary: SystemSummary,
    pub should_quit: bool,
    pub show_help: bool,
    pub export_dir: PathBuf,
    /// Wall-clock time of the last rebuild, shown in the header
    pub last_updated: Option<DateTime<Local>>,
    summary_source: Box<dyn SummarySource>,
    flash: Option<(String, Instant)>,
}

/// Configuration for the monitor app
#[derive(Debug, Clone)]
pub struct MonitorAppConfig {
    pub refresh: RefreshConfig,
    pub sort_key: MetricKey,
    pub filter: Option<String>,
    pub export_dir: PathBuf,
}

impl Default for MonitorAppConfig {
    fn default() -> Self {
        Self {
            refresh: RefreshConfig::default(),
            sort_key: MetricKey::Rss,
            filter: None,
            export_dir: PathBuf::from("."),
        }
    }
}

impl MonitorApp {
    pub fn new(
        config: MonitorAppConfig,
        snapshot: Box<dyn SnapshotSource>,
        detail: Option<Arc<dyn DetailSource>>,
        summary_source: Box<dyn SummarySource>,
    ) -> crate::error::Result<Self> {
        let mut coordinator = RefreshCoordinator::new(snapshot, detail, config.refresh)?;
        coordinator.set_sort_key(config.sort_key);
        if let Some(filter) = config.filter {
            coordinator.set_filter(filter);
        }

        Ok(Self {
            coordinator,
            summary: SystemSummary::default(),
            should_quit: false,
            show_help: false,
            export_dir: config.export_dir,
            last_updated: None,
            summary_source,
            flash: None,
        })
    }

    /// App wired to the live system sources
    pub fn with_system(config: MonitorAppConfig) -> crate::error::Result<Self> {
        let detail: Arc<dyn DetailSource> = Arc::from(detail_source());
        Self::new(
            config,
            Box::new(SysinfoSnapshotSource::new()),
            Some(detail),
            Box::new(SysinfoSummarySource::new()),
        )
    }

    /// Apply finished enrichment and run a refresh when one is due
    pub fn tick(&mut self, now: Instant) {
        self.coordinator.drain_enrichment();
        if let Some(RefreshOutcome::Rebuilt { .. }) = self.coordinator.tick(now) {
            self.update_summary();
        }
    }

    pub fn update_summary(&mut self) {
        self.summary = self.summary_source.collect();
        self.last_updated = Some(Local::now());
    }

    pub fn set_flash(&mut self, message: impl Into<String>) {
        self.flash = Some((message.into(), Instant::now() + FLASH_DURATION));
    }

    /// Current flash message, if it has not expired
    pub fn flash_message(&self) -> Option<&str> {
        match &self.flash {
            Some((message, until)) if Instant::now() < *until => Some(message.as_str()),
            _ => None,
        }
    }

    /// Handle keyboard events
    pub fn handle_event(&mut self, event: MonitorEvent) {
        if self.show_help && event != MonitorEvent::None {
            self.show_help = false;
            self.should_quit = event == MonitorEvent::Quit;
            return;
        }

        let c = &mut self.coordinator;
        match event {
            MonitorEvent::Quit => self.should_quit = true,
            MonitorEvent::ToggleHelp => self.show_help = true,
            MonitorEvent::CursorUp => c.move_cursor(-1),
            MonitorEvent::CursorDown => c.move_cursor(1),
            MonitorEvent::PageUp => c.page_up(),
            MonitorEvent::PageDown => c.page_down(),
            MonitorEvent::Home => c.cursor_home(),
            MonitorEvent::End => c.cursor_end(),
            MonitorEvent::Expand => {
                c.expand_selected();
            }
            MonitorEvent::Collapse => {
                c.collapse_selected();
            }
            MonitorEvent::ExpandAll => {
                c.expand_all();
                self.set_flash("Expanded all processes");
            }
            MonitorEvent::ToggleFreeze => {
                let message = if c.toggle_frozen() {
                    "View frozen"
                } else {
                    "Live refresh resumed"
                };
                self.set_flash(message);
            }
            MonitorEvent::CycleSort => {
                let key = c.cycle_sort();
                self.set_flash(format!("Sorted by {}", key));
            }
            MonitorEvent::Refresh => {
                if let RefreshOutcome::Rebuilt { .. } = c.refresh_now() {
                    self.update_summary();
                }
            }
            MonitorEvent::Export => self.export(),
            MonitorEvent::StartSearch => c.begin_search(),
            MonitorEvent::SearchInput(ch) => c.push_search_char(ch),
            MonitorEvent::SearchBackspace => c.pop_search_char(),
            MonitorEvent::SearchCommit => c.commit_search(),
            MonitorEvent::SearchCancel => c.cancel_search(),
            MonitorEvent::None => {}
        }
    }

    fn export(&mut self) {
        let result = export::write_snapshot(
            &self.export_dir,
            self.coordinator.rows(),
            self.coordinator.forest(),
            Some(&self.summary),
        );
        match result {
            Ok(path) => self.set_flash(format!("Exported to {}", path.display())),
            Err(e) => {
                log::warn!("export failed: {}", e);
                self.set_flash(format!("Export failed: {}", e));
            }
        }
    }
}

/// Run the monitor TUI application
pub fn run_monitor_app(config: MonitorAppConfig) -> Result<()> {
    let mut app = MonitorApp::with_system(config).context("Failed to start process monitor")?;

    // Setup terminal
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;

    let result = event_loop(&mut terminal, &mut app);

    // Restore terminal even when the loop failed
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;

    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut MonitorApp,
) -> Result<()> {
    loop {
        let size = terminal.size().context("Failed to read terminal size")?;
        app.coordinator.set_viewport_height(list_height(size.height));
        app.tick(Instant::now());

        terminal
            .draw(|frame| render_ui(frame, app))
            .context("Failed to draw frame")?;

        if event::poll(POLL_INTERVAL).context("Event poll failed")? {
            if let Event::Key(key) = event::read().context("Event read failed")? {
                if key.kind == KeyEventKind::Press {
                    let search_mode = app.coordinator.view().search_mode;
                    app.handle_event(map_key(key, search_mode));
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::process_monitor::ProcessRecord;

    struct FixedSource(Vec<ProcessRecord>);

    impl SnapshotSource for FixedSource {
        fn collect(&mut self) -> Vec<ProcessRecord> {
            self.0.clone()
        }
    }

    struct FixedSummary;

    impl SummarySource for FixedSummary {
        fn collect(&mut self) -> SystemSummary {
            SystemSummary::from_counts(1000, 700, 300, 0, 0)
        }
    }

    fn record(pid: u32, ppid: u32, rss_kb: u64) -> ProcessRecord {
        ProcessRecord {
            pid,
            ppid,
            rss_kb,
            vsz_kb: rss_kb * 2,
            command: format!("/usr/bin/app{}", pid),
            elapsed: "05:00".to_string(),
            started: "Wed Jan 28 17:21:44 2026".to_string(),
        }
    }

    fn app(export_dir: PathBuf) -> MonitorApp {
        let config = MonitorAppConfig {
            export_dir,
            ..MonitorAppConfig::default()
        };
        let source = FixedSource(vec![record(1, 0, 100), record(2, 1, 50), record(3, 1, 20)]);
        let mut app = MonitorApp::new(config, Box::new(source), None, Box::new(FixedSummary))
            .unwrap();
        app.coordinator.set_viewport_height(10);
        app.tick(Instant::now());
        app
    }

    #[test]
    fn test_tick_refreshes_summary() {
        let app = app(PathBuf::from("."));
        assert_eq!(app.coordinator.forest().len(), 3);
        assert_eq!(app.summary.total_bytes, 1000);
        assert_eq!(app.summary.pressure_percent, 70);
        assert!(app.last_updated.is_some());
    }

    #[test]
    fn test_expand_and_navigate() {
        let mut app = app(PathBuf::from("."));
        assert_eq!(app.coordinator.rows().len(), 1);

        app.handle_event(MonitorEvent::Expand);
        assert_eq!(app.coordinator.rows().len(), 3);

        app.handle_event(MonitorEvent::End);
        assert_eq!(app.coordinator.selected_node().unwrap().pid, 3);

        app.handle_event(MonitorEvent::Collapse);
        assert_eq!(app.coordinator.rows().len(), 1);
        assert_eq!(app.coordinator.selected_node().unwrap().pid, 1);
    }

    #[test]
    fn test_freeze_sets_flash() {
        let mut app = app(PathBuf::from("."));
        app.handle_event(MonitorEvent::ToggleFreeze);
        assert!(app.coordinator.view().frozen);
        assert_eq!(app.flash_message(), Some("View frozen"));

        app.handle_event(MonitorEvent::CycleSort);
        assert_eq!(app.flash_message(), Some("Sorted by VIRT"));
    }

    #[test]
    fn test_help_closes_on_any_key() {
        let mut app = app(PathBuf::from("."));
        app.handle_event(MonitorEvent::ToggleHelp);
        assert!(app.show_help);

        app.handle_event(MonitorEvent::CursorDown);
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }

    #[test]
    fn test_search_flow() {
        let mut app = app(PathBuf::from("."));
        app.handle_event(MonitorEvent::ExpandAll);
        app.handle_event(MonitorEvent::StartSearch);
        for ch in "app2".chars() {
            app.handle_event(MonitorEvent::SearchInput(ch));
        }
        assert_eq!(app.coordinator.rows().len(), 1);

        app.handle_event(MonitorEvent::SearchCancel);
        assert!(!app.coordinator.view().search_mode);
        assert_eq!(app.coordinator.rows().len(), 3);
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app(dir.path().to_path_buf());
        app.handle_event(MonitorEvent::Export);

        let message = app.flash_message().unwrap();
        assert!(message.starts_with("Exported to"));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_export_failure_is_flashed() {
        let mut app = app(PathBuf::from("/nonexistent/ramtree-export"));
        app.handle_event(MonitorEvent::Export);
        assert!(app.flash_message().unwrap().starts_with("Export failed"));
    }
}
