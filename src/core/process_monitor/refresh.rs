//! Refresh coordination.
//!
//! Owns the snapshot-and-rebuild cycle, carries expansion over from one
//! forest to the next, keeps the timeline ledger current and schedules
//! enrichment for the rows in view.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::collector::SnapshotSource;
use super::detail::DetailSource;
use super::enrichment::{EnrichTarget, EnrichmentConfig, EnrichmentScheduler};
use super::flatten::{flatten, VisibleRow};
use super::history::{TimelineLedger, DEFAULT_TIMELINE_CAPACITY};
use super::metrics::MetricKey;
use super::process_tree::{Forest, ProcessNode};
use crate::core::config::Config;
use crate::error::Result;

/// Settings for the refresh cycle
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    pub interval: Duration,
    pub timeline_capacity: usize,
    pub enrichment: EnrichmentConfig,
    pub enrich_enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            timeline_capacity: DEFAULT_TIMELINE_CAPACITY,
            enrichment: EnrichmentConfig::default(),
            enrich_enabled: true,
        }
    }
}

impl From<&Config> for RefreshConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: Duration::from_millis(config.refresh_interval_ms.max(100)),
            timeline_capacity: config.timeline_capacity,
            enrichment: EnrichmentConfig {
                cooldown: Duration::from_secs(config.enrich_cooldown_secs),
                batch_size: config.enrich_batch_size,
                pacing: Duration::from_millis(config.enrich_pacing_ms),
            },
            enrich_enabled: config.enrich_enabled,
        }
    }
}

/// View state driven by user input
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub sort_key: MetricKey,
    pub filter: String,
    pub cursor: usize,
    pub scroll_offset: usize,
    /// Number of list rows on screen, set by the renderer
    pub viewport_height: usize,
    /// Suspends automatic refresh
    pub frozen: bool,
    pub search_mode: bool,
    pub last_enrich: Option<Instant>,
    pub last_refresh: Option<Instant>,
}

impl ViewState {
    fn page(&self) -> usize {
        self.viewport_height.max(1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshPhase {
    Idle,
    Refreshing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// A new forest replaced the previous one
    Rebuilt { processes: usize, enrichment_started: bool },
    /// The source returned nothing; the previous view was kept
    Retained,
}

pub struct RefreshCoordinator {
    source: Box<dyn SnapshotSource>,
    enrichment: Option<EnrichmentScheduler>,
    config: RefreshConfig,
    forest: Forest,
    rows: Vec<VisibleRow>,
    ledger: TimelineLedger,
    view: ViewState,
    phase: RefreshPhase,
}

impl RefreshCoordinator {
    /// Create a coordinator. Enrichment is disabled when `detail` is `None`
    /// or the config turns it off.
    pub fn new(
        source: Box<dyn SnapshotSource>,
        detail: Option<Arc<dyn DetailSource>>,
        config: RefreshConfig,
    ) -> Result<Self> {
        let enrichment = match detail {
            Some(detail) if config.enrich_enabled => Some(EnrichmentScheduler::new(
                detail,
                config.enrichment.clone(),
            )?),
            _ => None,
        };

        Ok(Self {
            source,
            enrichment,
            ledger: TimelineLedger::with_capacity(config.timeline_capacity),
            config,
            forest: Forest::default(),
            rows: Vec::new(),
            view: ViewState::default(),
            phase: RefreshPhase::Idle,
        })
    }

    pub fn forest(&self) -> &Forest {
        &self.forest
    }

    pub fn rows(&self) -> &[VisibleRow] {
        &self.rows
    }

    pub fn ledger(&self) -> &TimelineLedger {
        &self.ledger
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn phase(&self) -> RefreshPhase {
        self.phase
    }

    pub fn config(&self) -> &RefreshConfig {
        &self.config
    }

    pub fn enrichment(&self) -> Option<&EnrichmentScheduler> {
        self.enrichment.as_ref()
    }

    /// Refresh if live and the interval has elapsed
    pub fn tick(&mut self, now: Instant) -> Option<RefreshOutcome> {
        if self.view.frozen {
            return None;
        }
        let due = match self.view.last_refresh {
            Some(last) => now.saturating_duration_since(last) >= self.config.interval,
            None => true,
        };
        due.then(|| self.refresh(now))
    }

    /// Refresh on demand, even when frozen
    pub fn refresh_now(&mut self) -> RefreshOutcome {
        self.refresh(Instant::now())
    }

    /// Run one full cycle: snapshot, rebuild, reconcile, record, flatten,
    /// then maybe schedule enrichment. The new rows only replace the old ones
    /// once they are fully built.
    pub fn refresh(&mut self, now: Instant) -> RefreshOutcome {
        self.phase = RefreshPhase::Refreshing;
        self.view.last_refresh = Some(now);

        let expanded = self.forest.expanded_pids();
        let records = self.source.collect();

        if records.is_empty() && !self.forest.is_empty() {
            log::warn!("snapshot source returned no processes, keeping previous view");
            self.phase = RefreshPhase::Idle;
            return RefreshOutcome::Retained;
        }

        let mut forest = Forest::build(records);
        forest.restore_expanded(&expanded);

        let timestamp_ms = chrono::Utc::now().timestamp_millis();
        let mut live = HashSet::with_capacity(forest.len());
        for node in forest.nodes() {
            self.ledger.record(node.pid, timestamp_ms, node.rss_kb);
            live.insert(node.pid);
        }
        self.ledger.evict(&live);

        let rows = flatten(&forest, self.view.sort_key, Some(self.view.filter.as_str()));
        self.forest = forest;
        self.rows = rows;
        self.clamp_view();

        let enrichment_started = self.schedule_enrichment(now);
        let processes = self.forest.len();
        log::debug!(
            "refresh: {} processes, {} visible rows, enrichment started: {}",
            processes,
            self.rows.len(),
            enrichment_started
        );

        self.phase = RefreshPhase::Idle;
        RefreshOutcome::Rebuilt {
            processes,
            enrichment_started,
        }
    }

    fn schedule_enrichment(&mut self, now: Instant) -> bool {
        let Some(scheduler) = self.enrichment.as_mut() else {
            return false;
        };
        if self.rows.is_empty() || !scheduler.is_ready(now) {
            return false;
        }

        let batch = scheduler.config().batch_size;
        let start = self.view.scroll_offset.min(self.rows.len());
        let end = (start + self.view.viewport_height).min(self.rows.len());
        let targets: Vec<EnrichTarget> = self.rows[start..end]
            .iter()
            .take(batch)
            .map(|row| EnrichTarget {
                pid: row.pid,
                started: self.forest.node(row.node).started.clone(),
            })
            .collect();

        let started = scheduler.try_schedule(now, targets);
        if started {
            self.view.last_enrich = Some(now);
        }
        started
    }

    /// Apply enrichment results posted since the last call.
    ///
    /// An update only lands on a live node with the same pid and start
    /// token; anything else refers to a process that is gone and is dropped.
    pub fn drain_enrichment(&mut self) -> usize {
        let Some(scheduler) = self.enrichment.as_mut() else {
            return 0;
        };

        let mut applied = 0;
        for update in scheduler.drain() {
            match self.forest.find_node_mut(update.pid) {
                Some(node) if node.started == update.started => {
                    node.detail = update.detail;
                    applied += 1;
                }
                _ => log::trace!("dropping stale enrichment for pid {}", update.pid),
            }
        }

        if applied > 0 && self.view.sort_key.is_detail() {
            self.rebuild_rows();
        }
        applied
    }

    /// Re-flatten the current forest with the current sort and filter
    pub fn rebuild_rows(&mut self) {
        self.rows = flatten(&self.forest, self.view.sort_key, Some(self.view.filter.as_str()));
        self.clamp_view();
    }

    fn clamp_view(&mut self) {
        let len = self.rows.len();
        self.view.cursor = self.view.cursor.min(len.saturating_sub(1));
        self.view.scroll_offset = self.view.scroll_offset.min(len.saturating_sub(1));
        self.ensure_cursor_visible();
    }

    fn ensure_cursor_visible(&mut self) {
        let page = self.view.page();
        if self.view.cursor < self.view.scroll_offset {
            self.view.scroll_offset = self.view.cursor;
        } else if self.view.cursor >= self.view.scroll_offset + page {
            self.view.scroll_offset = self.view.cursor + 1 - page;
        }
    }

    pub fn set_viewport_height(&mut self, height: usize) {
        if self.view.viewport_height != height {
            self.view.viewport_height = height;
            self.ensure_cursor_visible();
        }
    }

    // Cursor movement

    pub fn move_cursor(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let max = self.rows.len() - 1;
        let target = self.view.cursor as isize + delta;
        self.view.cursor = target.clamp(0, max as isize) as usize;
        self.ensure_cursor_visible();
    }

    pub fn page_down(&mut self) {
        self.move_cursor(self.view.page() as isize);
    }

    pub fn page_up(&mut self) {
        self.move_cursor(-(self.view.page() as isize));
    }

    pub fn cursor_home(&mut self) {
        self.move_cursor(isize::MIN / 2);
    }

    pub fn cursor_end(&mut self) {
        self.move_cursor(isize::MAX / 2);
    }

    // Selection

    pub fn selected_row(&self) -> Option<&VisibleRow> {
        self.rows.get(self.view.cursor)
    }

    pub fn selected_node(&self) -> Option<&ProcessNode> {
        self.selected_row().map(|row| self.forest.node(row.node))
    }

    /// Ancestor names of the selected process, root first
    pub fn selected_breadcrumb(&self) -> Option<String> {
        let row = self.selected_row()?;
        Some(self.forest.breadcrumb(row.node).join(" > "))
    }

    // Expand / collapse

    pub fn expand_selected(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        let id = row.node;
        if self.forest.node(id).is_leaf() || self.forest.node(id).expanded {
            return false;
        }
        self.forest.node_mut(id).expanded = true;
        self.rebuild_rows();
        true
    }

    /// Collapse the selected node, or if it has nothing to collapse, its
    /// parent, moving the cursor onto the parent row
    pub fn collapse_selected(&mut self) -> bool {
        let Some(row) = self.selected_row() else {
            return false;
        };
        let id = row.node;
        let node = self.forest.node(id);

        if node.expanded && !node.is_leaf() {
            self.forest.node_mut(id).expanded = false;
            self.rebuild_rows();
            return true;
        }

        let Some(parent) = node.parent() else {
            return false;
        };
        self.forest.node_mut(parent).expanded = false;
        self.rebuild_rows();
        if let Some(idx) = self.rows.iter().position(|r| r.node == parent) {
            self.view.cursor = idx;
            self.ensure_cursor_visible();
        }
        true
    }

    pub fn expand_all(&mut self) {
        self.forest.expand_all();
        self.rebuild_rows();
    }

    // Sort, search, freeze

    pub fn set_sort_key(&mut self, key: MetricKey) {
        self.view.sort_key = key;
        self.rebuild_rows();
    }

    pub fn cycle_sort(&mut self) -> MetricKey {
        let next = self.view.sort_key.next();
        self.set_sort_key(next);
        next
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.view.filter = filter.into();
        self.rebuild_rows();
    }

    pub fn begin_search(&mut self) {
        self.view.search_mode = true;
        self.set_filter(String::new());
    }

    pub fn push_search_char(&mut self, c: char) {
        self.view.filter.push(c);
        self.rebuild_rows();
    }

    pub fn pop_search_char(&mut self) {
        self.view.filter.pop();
        self.rebuild_rows();
    }

    /// Leave search mode keeping the filter
    pub fn commit_search(&mut self) {
        self.view.search_mode = false;
    }

    /// Leave search mode and clear the filter
    pub fn cancel_search(&mut self) {
        self.view.search_mode = false;
        self.set_filter(String::new());
    }

    pub fn toggle_frozen(&mut self) -> bool {
        self.view.frozen = !self.view.frozen;
        self.view.frozen
    }
}
