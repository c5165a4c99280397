use ramtree::commands::snapshot::{take_snapshot, SnapshotOptions};
use ramtree::core::process_monitor::{MetricKey, ProcessRecord, SnapshotSource, SystemSummary};
use serde_json::Value;
use tempfile::TempDir;

struct FixedSource(Vec<ProcessRecord>);

impl SnapshotSource for FixedSource {
    fn collect(&mut self) -> Vec<ProcessRecord> {
        self.0.clone()
    }
}

fn source() -> Box<FixedSource> {
    let record = |pid: u32, ppid: u32, rss_kb: u64, command: &str| ProcessRecord {
        pid,
        ppid,
        rss_kb,
        vsz_kb: rss_kb * 3,
        command: command.to_string(),
        elapsed: "1-02:03:04".to_string(),
        started: "Mon Feb  2 09:00:00 2026".to_string(),
    };
    Box::new(FixedSource(vec![
        record(1, 0, 1_000, "/sbin/init"),
        record(50, 1, 600_000, "/usr/lib/postgresql/bin/postgres -D /var/lib/pg"),
        record(51, 50, 20_000, "postgres: checkpointer"),
    ]))
}

fn options(dir: &TempDir, expand_all: bool) -> SnapshotOptions {
    SnapshotOptions {
        output_dir: dir.path().to_path_buf(),
        sort_key: MetricKey::Rss,
        filter: None,
        expand_all,
    }
}

fn read(path: &std::path::Path) -> Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_snapshot_writes_named_file() {
    let dir = TempDir::new().unwrap();
    let path = take_snapshot(source(), None, &options(&dir, false)).unwrap();

    let name = path.file_name().unwrap().to_str().unwrap();
    assert!(name.starts_with("ram-snapshot-"));
    assert!(name.ends_with(".json"));

    // Collapsed: only the root is visible
    let doc = read(&path);
    assert_eq!(doc["processes"].as_array().unwrap().len(), 1);
    assert!(doc["system"].is_null());
}

#[test]
fn test_snapshot_expand_all_includes_descendants() {
    let dir = TempDir::new().unwrap();
    let summary = SystemSummary::from_counts(8 << 30, 6 << 30, 2 << 30, 1 << 30, 0);
    let path = take_snapshot(source(), Some(summary), &options(&dir, true)).unwrap();

    let doc = read(&path);
    let processes = doc["processes"].as_array().unwrap();
    assert_eq!(processes.len(), 3);

    let checkpointer = &processes[2];
    assert_eq!(checkpointer["pid"], 51);
    assert_eq!(checkpointer["ppid"], 50);
    assert_eq!(checkpointer["depth"], 2);
    assert_eq!(checkpointer["age"], "1d 2h");
    assert_eq!(doc["system"]["pressure_percent"], 75);
    assert!(doc["timestamp"].as_str().unwrap().contains('T'));
}

#[test]
fn test_snapshot_filter_limits_rows() {
    let dir = TempDir::new().unwrap();
    let mut options = options(&dir, true);
    options.filter = Some("checkpointer".to_string());

    let path = take_snapshot(source(), None, &options).unwrap();
    let doc = read(&path);
    assert_eq!(doc["processes"].as_array().unwrap().len(), 1);
    assert_eq!(doc["processes"][0]["pid"], 51);
}

#[test]
fn test_snapshot_into_missing_directory_fails() {
    let dir = TempDir::new().unwrap();
    let mut options = options(&dir, false);
    options.output_dir = dir.path().join("missing");

    assert!(take_snapshot(source(), None, &options).is_err());
}
