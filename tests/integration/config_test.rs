use std::time::Duration;

use ramtree::core::config::Config;
use ramtree::core::process_monitor::{MetricKey, RefreshConfig};
use tempfile::TempDir;

#[test]
fn test_config_default() {
    let config = Config::default();
    assert_eq!(config.refresh_interval_ms, 2000);
    assert_eq!(config.enrich_batch_size, 5);
    assert!(config.enrich_enabled);
    assert_eq!(config.default_sort, MetricKey::Rss);
    assert!(config.export_dir.is_none());
}

#[test]
fn test_config_roundtrip() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested").join("config.json");

    let config = Config {
        refresh_interval_ms: 750,
        default_sort: MetricKey::Swap,
        export_dir: Some("/tmp/snapshots".to_string()),
        ..Default::default()
    };
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.refresh_interval_ms, 750);
    assert_eq!(loaded.default_sort, MetricKey::Swap);
    assert_eq!(loaded.export_dir(), std::path::PathBuf::from("/tmp/snapshots"));
}

#[test]
fn test_config_partial_file_fills_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, r#"{ "enrich_enabled": false, "default_sort": "age" }"#).unwrap();

    let config = Config::load_from(&path).unwrap();
    assert!(!config.enrich_enabled);
    assert_eq!(config.default_sort, MetricKey::Age);
    assert_eq!(config.timeline_capacity, 60);
}

#[test]
fn test_config_corrupt_file_returns_default() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let config = Config::load_from(&path).unwrap();
    assert_eq!(config.refresh_interval_ms, 2000);
}

#[test]
fn test_refresh_config_from_config() {
    let config = Config {
        refresh_interval_ms: 5000,
        enrich_cooldown_secs: 30,
        enrich_pacing_ms: 0,
        ..Default::default()
    };

    let refresh = RefreshConfig::from(&config);
    assert_eq!(refresh.interval, Duration::from_secs(5));
    assert_eq!(refresh.enrichment.cooldown, Duration::from_secs(30));
    assert_eq!(refresh.enrichment.pacing, Duration::ZERO);
}
