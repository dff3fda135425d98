use super::*;

use std::collections::BTreeMap;

use serde_json::json;

use crate::model::metrics::{MetricInfo, MetricMeta, MetricTable, ModuleStatus, ModuleStatusTable};
use crate::panels::builder::{
    build_fallback_panel, build_general_stats_panels, build_panels, build_status_panels,
    format_value, humanize_module,
};

fn metrics() -> MetricTable {
    let mut table = MetricTable::new();
    let mut s1 = BTreeMap::new();
    s1.insert("fastqc.percent_gc".to_string(), 41.0);
    s1.insert("fastqc.percent_duplicates".to_string(), 12.5);
    table.insert("S1".to_string(), s1);
    table
}

#[test]
fn test_general_stats_panel_lines_sorted_and_labelled() {
    let mut meta = MetricMeta::new();
    meta.insert(
        "fastqc.percent_gc".to_string(),
        MetricInfo {
            title: Some("% GC".to_string()),
            namespace: Some("FastQC".to_string()),
            ..MetricInfo::default()
        },
    );
    let panels = build_general_stats_panels(&metrics(), &meta);
    assert_eq!(panels.len(), 1);
    let panel = &panels[0];
    assert_eq!(panel.module, GENERAL_STATS_MODULE);
    assert_eq!(panel.sample.as_deref(), Some("S1"));
    assert_eq!(
        panel.content,
        "Sample: S1\nfastqc.percent_duplicates: 12.5\n[FastQC] % GC: 41"
    );
}

#[test]
fn test_status_panel_lists_failures_before_warnings() {
    let mut statuses = ModuleStatusTable::new();
    let mut modules = BTreeMap::new();
    modules.insert("adapter_content".to_string(), ModuleStatus::Warn);
    modules.insert("per_base_sequence_quality".to_string(), ModuleStatus::Fail);
    modules.insert("basic_statistics".to_string(), ModuleStatus::Pass);
    statuses.insert("S2".to_string(), modules);

    let panels = build_status_panels(&statuses);
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].module, STATUS_MODULE);
    let content = &panels[0].content;
    assert!(content.contains(
        "FastQC Status Summary: FAILED modules: Per Base Sequence Quality | WARNING modules: Adapter Content"
    ));
    assert!(content.contains("Basic Statistics: pass"));
}

#[test]
fn test_status_panel_all_passed() {
    let mut statuses = ModuleStatusTable::new();
    let mut modules = BTreeMap::new();
    modules.insert("basic_statistics".to_string(), ModuleStatus::Pass);
    statuses.insert("S1".to_string(), modules);
    let panels = build_status_panels(&statuses);
    assert!(panels[0].content.contains("All modules passed"));
}

#[test]
fn test_fallback_panel_only_when_nothing_else() {
    let raw = json!({"report_plot_data": {"x": [1, 2, 3]}});
    let panels = build_panels(
        &raw,
        &MetricTable::new(),
        &MetricMeta::new(),
        &ModuleStatusTable::new(),
    );
    assert_eq!(panels.len(), 1);
    assert_eq!(panels[0].module, RAW_MODULE);
    assert!(panels[0].sample.is_none());

    let panels = build_panels(&raw, &metrics(), &MetricMeta::new(), &ModuleStatusTable::new());
    assert!(panels.iter().all(|p| p.module != RAW_MODULE));
}

#[test]
fn test_fallback_panel_truncated_and_skipped_for_empty() {
    let big = "x".repeat(RAW_DUMP_MAX_CHARS * 2);
    let panel = build_fallback_panel(&json!({ "blob": big })).unwrap();
    assert_eq!(panel.content.chars().count(), RAW_DUMP_MAX_CHARS);
    assert!(build_fallback_panel(&json!({})).is_none());
    assert!(build_fallback_panel(&json!(null)).is_none());
}

#[test]
fn test_humanize_and_format() {
    assert_eq!(humanize_module("per_sequence_gc_content"), "Per Sequence Gc Content");
    assert_eq!(humanize_module("Total Sequences"), "Total sequences");
    assert_eq!(format_value(2000000.0), "2000000");
    assert_eq!(format_value(0.125), "0.125");
}
