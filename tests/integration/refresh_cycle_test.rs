use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use ramtree::core::process_monitor::{
    DetailSource, EnrichmentConfig, MemoryDetail, MetricKey, ProcessRecord, RefreshConfig,
    RefreshCoordinator, RefreshOutcome, SnapshotSource,
};

/// Snapshot source whose process list the test can swap between refreshes
#[derive(Clone, Default)]
struct SharedSource(Arc<Mutex<Vec<ProcessRecord>>>);

impl SharedSource {
    fn set(&self, records: Vec<ProcessRecord>) {
        *self.0.lock().unwrap() = records;
    }
}

impl SnapshotSource for SharedSource {
    fn collect(&mut self) -> Vec<ProcessRecord> {
        self.0.lock().unwrap().clone()
    }
}

struct SwapDetail;

impl DetailSource for SwapDetail {
    fn collect_for(&self, pid: u32) -> MemoryDetail {
        MemoryDetail {
            dirty_bytes: 0,
            swap_bytes: pid as u64 * 4096,
        }
    }
}

fn proc(pid: u32, ppid: u32, rss_kb: u64, command: &str) -> ProcessRecord {
    ProcessRecord {
        pid,
        ppid,
        rss_kb,
        vsz_kb: rss_kb * 4,
        command: command.to_string(),
        elapsed: "10:00".to_string(),
        started: format!("start-{}", pid),
    }
}

fn desktop() -> Vec<ProcessRecord> {
    vec![
        proc(1, 0, 10_000, "/sbin/launchd"),
        proc(100, 1, 300_000, "/Applications/Safari.app/Contents/MacOS/Safari"),
        proc(200, 1, 150_000, "/usr/bin/zsh"),
        proc(201, 200, 80_000, "/usr/local/bin/node server.js"),
    ]
}

fn coordinator(source: &SharedSource) -> RefreshCoordinator {
    let config = RefreshConfig {
        enrich_enabled: false,
        ..RefreshConfig::default()
    };
    let mut coordinator = RefreshCoordinator::new(Box::new(source.clone()), None, config).unwrap();
    coordinator.set_viewport_height(20);
    coordinator
}

fn pids(coordinator: &RefreshCoordinator) -> Vec<u32> {
    coordinator.rows().iter().map(|row| row.pid).collect()
}

#[test]
fn test_expansion_survives_refresh() {
    let source = SharedSource::default();
    source.set(desktop());
    let mut coordinator = coordinator(&source);
    coordinator.refresh_now();

    assert_eq!(pids(&coordinator), vec![1]);
    coordinator.expand_selected();
    assert_eq!(pids(&coordinator), vec![1, 100, 200]);

    // A new child appears and an old one leaves
    let mut next = desktop();
    next.retain(|r| r.pid != 100);
    next.push(proc(300, 1, 400_000, "/usr/bin/python3 train.py"));
    source.set(next);
    coordinator.refresh_now();

    assert_eq!(pids(&coordinator), vec![1, 300, 200]);
    assert!(coordinator.ledger().contains(300));
    assert!(!coordinator.ledger().contains(100));
}

#[test]
fn test_sort_key_reorders_children() {
    let source = SharedSource::default();
    source.set(desktop());
    let mut coordinator = coordinator(&source);
    coordinator.refresh_now();
    coordinator.expand_all();

    assert_eq!(pids(&coordinator), vec![1, 100, 200, 201]);

    coordinator.set_sort_key(MetricKey::Virtual);
    assert_eq!(pids(&coordinator)[0], 1);
    assert_eq!(coordinator.view().sort_key, MetricKey::Virtual);
}

#[test]
fn test_corrupt_parent_links_terminate() {
    let source = SharedSource::default();
    source.set(vec![
        proc(10, 20, 100, "/bin/a"),
        proc(20, 10, 100, "/bin/b"),
        proc(30, 30, 100, "/bin/c"),
    ]);
    let mut coordinator = coordinator(&source);
    coordinator.refresh_now();
    coordinator.expand_all();

    assert_eq!(coordinator.forest().len(), 3);
    assert_eq!(coordinator.rows().len(), 3);
}

#[test]
fn test_empty_snapshot_keeps_view() {
    let source = SharedSource::default();
    source.set(desktop());
    let mut coordinator = coordinator(&source);
    coordinator.refresh_now();
    coordinator.expand_selected();

    source.set(Vec::new());
    assert_eq!(coordinator.refresh_now(), RefreshOutcome::Retained);
    assert_eq!(pids(&coordinator), vec![1, 100, 200]);
}

#[test]
fn test_frozen_tick_does_not_refresh() {
    let source = SharedSource::default();
    source.set(desktop());
    let mut coordinator = coordinator(&source);
    let start = Instant::now();
    assert!(coordinator.tick(start).is_some());

    coordinator.toggle_frozen();
    source.set(vec![proc(1, 0, 10, "/sbin/launchd")]);
    assert!(coordinator.tick(start + Duration::from_secs(60)).is_none());
    assert_eq!(coordinator.forest().len(), 4);
}

#[test]
fn test_filter_matches_command_text() {
    let source = SharedSource::default();
    source.set(desktop());
    let mut coordinator = coordinator(&source);
    coordinator.refresh_now();
    coordinator.expand_all();

    coordinator.begin_search();
    for c in "SERVER".chars() {
        coordinator.push_search_char(c);
    }
    coordinator.commit_search();

    assert_eq!(pids(&coordinator), vec![201]);
    assert_eq!(coordinator.view().filter, "SERVER");
}

#[test]
fn test_enrichment_lands_on_visible_rows() {
    let source = SharedSource::default();
    source.set(desktop());
    let config = RefreshConfig {
        enrichment: EnrichmentConfig {
            cooldown: Duration::from_secs(10),
            batch_size: 5,
            pacing: Duration::from_millis(1),
        },
        ..RefreshConfig::default()
    };
    let detail: Arc<dyn DetailSource> = Arc::new(SwapDetail);
    let mut coordinator =
        RefreshCoordinator::new(Box::new(source.clone()), Some(detail), config).unwrap();
    coordinator.set_viewport_height(20);
    coordinator.refresh_now();
    coordinator.expand_all();

    let deadline = Instant::now() + Duration::from_secs(5);
    while coordinator.enrichment().is_some_and(|e| e.is_running()) && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(5));
    }
    coordinator.drain_enrichment();

    // Only the row on screen at refresh time was in the batch
    let root = coordinator.forest().find_node(1).unwrap();
    assert_eq!(root.detail.swap_bytes, 4096);
    let child = coordinator.forest().find_node(100).unwrap();
    assert_eq!(child.detail.swap_bytes, 0);
}
