use super::*;

use serde_json::json;

use crate::capability::testing::{FailingIndexer, gc_report};
use crate::capability::tfidf::TfIdfIndexer;
use crate::error::StageError;
use crate::panels::{GENERAL_STATS_MODULE, RAW_MODULE, STATUS_MODULE};
use crate::pipeline::stage1_parse::parse_report;

fn parse(doc: &Value) -> ParsedReport {
    parse_report(doc, &["multiqc_fastqc".to_string()])
}

#[tokio::test]
async fn test_one_panel_per_sample_and_section() {
    let doc = gc_report();
    let out = run_index_stage(&doc, &parse(&doc), &TfIdfIndexer, Duration::from_secs(5))
        .await
        .unwrap();
    let general = out
        .panels
        .iter()
        .filter(|p| p.module == GENERAL_STATS_MODULE)
        .count();
    let status = out.panels.iter().filter(|p| p.module == STATUS_MODULE).count();
    assert_eq!(general, 2);
    assert_eq!(status, 2);
    assert_eq!(out.index.unwrap().len(), 4);
}

#[tokio::test]
async fn test_report_without_sections_still_indexes_fallback() {
    let doc = json!({"config_title": "run", "report_plot_data": {}});
    let out = run_index_stage(&doc, &parse(&doc), &TfIdfIndexer, Duration::from_secs(5))
        .await
        .unwrap();
    assert_eq!(out.panels.len(), 1);
    assert_eq!(out.panels[0].module, RAW_MODULE);
    assert!(out.index.is_some());
}

#[tokio::test]
async fn test_no_panels_means_no_index_and_no_capability_call() {
    let doc = json!({});
    let out = run_index_stage(&doc, &parse(&doc), &FailingIndexer, Duration::from_secs(5))
        .await
        .unwrap();
    assert!(out.panels.is_empty());
    assert!(out.index.is_none());
}

#[tokio::test]
async fn test_indexer_failure_is_capability_error() {
    let doc = gc_report();
    let err = run_index_stage(&doc, &parse(&doc), &FailingIndexer, Duration::from_secs(5))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StageError::Capability { stage: "index", .. }));
}
