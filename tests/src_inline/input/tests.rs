use super::*;

use std::io::Write;

use flate2::Compression;
use flate2::write::GzEncoder;
use serde_json::json;

use crate::capability::testing::{MemoryStore, flagged_report};

fn gzip(bytes: &[u8]) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(bytes).unwrap();
    encoder.finish().unwrap()
}

#[tokio::test]
async fn test_loads_plain_report() {
    let config = EngineConfig::default();
    let store = MemoryStore::new();
    store.insert_json("reports", &config.report_key("r1"), &flagged_report());
    let doc = load_report(&store, &config, "r1").await.unwrap();
    assert!(doc.get("report_general_stats_data").is_some());
}

#[tokio::test]
async fn test_falls_back_to_gzipped_sibling() {
    let config = EngineConfig::default();
    let store = MemoryStore::new();
    let body = serde_json::to_vec(&flagged_report()).unwrap();
    store.insert(
        "reports",
        &format!("{}{GZIP_SUFFIX}", config.report_key("r1")),
        gzip(&body),
    );
    let doc = load_report(&store, &config, "r1").await.unwrap();
    assert_eq!(doc, flagged_report());
}

#[tokio::test]
async fn test_missing_report() {
    let config = EngineConfig::default();
    let store = MemoryStore::new();
    let err = load_report(&store, &config, "nope").await.unwrap_err();
    match err {
        ReportError::Missing { bucket, key } => {
            assert_eq!(bucket, "reports");
            assert_eq!(key, config.report_key("nope"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_decode_rejects_blank_and_empty_object() {
    assert!(matches!(
        decode_report("k", b"  \n"),
        Err(ReportError::Empty { .. })
    ));
    assert!(matches!(
        decode_report("k", b"{}"),
        Err(ReportError::NotObject { .. })
    ));
    assert!(matches!(
        decode_report("k", b"[1, 2]"),
        Err(ReportError::NotObject { .. })
    ));
    assert!(matches!(
        decode_report("k", b"{\"a\":"),
        Err(ReportError::Json { .. })
    ));
    let doc = decode_report("k", br#"{"config_title": "run"}"#).unwrap();
    assert_eq!(doc, json!({"config_title": "run"}));
}

#[test]
fn test_gunzip_garbage() {
    assert!(matches!(
        gunzip("k.gz", b"not gzip"),
        Err(ReportError::Gzip { .. })
    ));
}
