//! File output end to end
//!
//! Installs the global subscriber, so this binary holds exactly one test.

use courier_logging::{CourierSubscriberBuilder, FileConfig, LogConfig};

#[test]
fn test_events_reach_log_file_as_jsonl() {
    let dir = tempfile::tempdir().unwrap();
    let config = LogConfig {
        default_level: "info".to_string(),
        file: Some(FileConfig::in_directory(dir.path())),
        ..LogConfig::default()
    };

    let guard = CourierSubscriberBuilder::new()
        .with_config(config)
        .with_console(false)
        .try_init()
        .unwrap();
    assert!(guard.is_some());

    let span = tracing::info_span!("sender", address = "a");
    span.in_scope(|| {
        tracing::warn!(peer = "b", id = 7, "Message failed to reach destination");
    });

    // Dropping the guard flushes the background writer.
    drop(guard);

    let contents = std::fs::read_to_string(dir.path().join("courier.log")).unwrap();
    let line = contents
        .lines()
        .find(|line| line.contains("Message failed to reach destination"))
        .unwrap();
    let event: serde_json::Value = serde_json::from_str(line).unwrap();
    assert_eq!(event["level"], "WARN");
    assert_eq!(event["peer"], "b");
    assert_eq!(event["id"], 7);
    assert_eq!(event["span"]["name"], "sender");
}
