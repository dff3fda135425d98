use super::*;

use std::collections::BTreeMap;

use crate::capability::testing::gc_report;
use crate::pipeline::stage1_parse::parse_report;

fn table(values: &[(&str, &str, f64)]) -> MetricTable {
    let mut table = MetricTable::new();
    for (sample, key, value) in values {
        table
            .entry(sample.to_string())
            .or_insert_with(BTreeMap::new)
            .insert(key.to_string(), *value);
    }
    table
}

fn values(pairs: &[(&str, f64)]) -> Vec<SampleValue> {
    pairs
        .iter()
        .map(|(s, v)| SampleValue {
            sample: s.to_string(),
            metric: "m".to_string(),
            value: *v,
        })
        .collect()
}

#[test]
fn test_gc_question_two_samples() {
    let report = parse_report(&gc_report(), &[]);
    let out = run_metric_engine(
        "what is the gc content",
        None,
        &report.metrics,
        &StatsThresholds::default(),
    );
    let key = out.metric_key.unwrap();
    assert!(key.contains("gc"));
    let stats = out.analysis.unwrap().stats.unwrap();
    assert_eq!(stats.count, 2);
    assert_eq!(stats.mean, 60.0);
    assert!((stats.stdev - 28.284).abs() < 0.01);
    assert!(stats.outliers.is_empty());
    assert_eq!(out.rows.len(), 2);
    assert!(out.rows.iter().all(|r| !r.contains_key("outlier")));
}

#[test]
fn test_single_observation_has_no_statistics() {
    let t = table(&[("S1", "percent_gc", 41.0)]);
    let out = run_metric_engine("gc?", None, &t, &StatsThresholds::default());
    assert_eq!(out.metric_key.as_deref(), Some("percent_gc"));
    let analysis = out.analysis.unwrap();
    assert!(analysis.stats.is_none());
    assert!(analysis.summary.is_none());
    assert!(out.notes.is_empty());
    assert_eq!(out.rows.len(), 1);
}

#[test]
fn test_outlier_flagged_with_direction_and_insight() {
    let mut rows = vec![("S0", 10.0)];
    let names = ["S1", "S2", "S3", "S4", "S5", "S6", "S7", "S8", "S9"];
    for name in names {
        rows.push((name, 10.0));
    }
    rows.push(("SX", 100.0));
    let data: Vec<(&str, &str, f64)> = rows.iter().map(|(s, v)| (*s, "umi_counts", *v)).collect();
    let t = table(&data);

    let out = run_metric_engine("umi counts", None, &t, &StatsThresholds::default());
    let stats = out.analysis.as_ref().unwrap().stats.as_ref().unwrap();
    assert_eq!(stats.outliers.len(), 1);
    let outlier = &stats.outliers[0];
    assert_eq!(outlier.sample, "SX");
    assert_eq!(outlier.direction, Direction::High);
    assert!(outlier.z_score > 2.0);

    assert!(out.notes[0].starts_with("SX is "));
    assert!(out.notes[0].ends_with("SD higher than average"));
    assert_eq!(out.notes[1], "SX has 10.0x higher umi_counts than S9");

    let flagged: Vec<_> = out.rows.iter().filter(|r| r.contains_key("outlier")).collect();
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0]["sample"], Cell::Text("SX".to_string()));
}

#[test]
fn test_statistics_require_two_values() {
    let th = StatsThresholds::default();
    assert!(sample_statistics("m", &[], &th).is_none());
    assert!(sample_statistics("m", &values(&[("a", 1.0)]), &th).is_none());
    let stats = sample_statistics("m", &values(&[("a", 5.0), ("b", 5.0)]), &th).unwrap();
    assert_eq!(stats.stdev, 0.0);
    assert!(stats.outliers.is_empty());
}

#[test]
fn test_comparison_ignores_non_positive() {
    assert!(compare_samples(&values(&[("a", 3.0), ("b", 0.0), ("c", -1.0)])).is_none());
    let c = compare_samples(&values(&[("a", 2.0), ("b", 8.0), ("c", 0.0), ("d", 4.0)])).unwrap();
    assert_eq!(c.higher_sample, "b");
    assert_eq!(c.lower_sample, "a");
    assert_eq!(c.ratio, 4.0);
    assert_eq!(c.difference, 6.0);
}

#[test]
fn test_inference_token_order_and_fallback() {
    let t = table(&[
        ("S1", "fastqc.percent_duplicates", 0.2),
        ("S1", "fastqc.percent_gc", 40.0),
        ("S2", "star.uniquely_mapped", 9.0),
    ]);
    // "dup" is checked before "gc".
    assert_eq!(
        infer_metric_key("gc and dup levels", &t).as_deref(),
        Some("fastqc.percent_duplicates")
    );
    assert_eq!(
        infer_metric_key("how many were MAPPED", &t).as_deref(),
        Some("star.uniquely_mapped")
    );
    assert_eq!(
        infer_metric_key("library complexity", &t).as_deref(),
        Some("fastqc.percent_duplicates")
    );
    assert_eq!(infer_metric_key("anything", &MetricTable::new()), None);
}

#[test]
fn test_requested_metric_wins_case_insensitively() {
    let t = table(&[
        ("S1", "FastQC.percent_gc", 40.0),
        ("S1", "fastqc.percent_duplicates", 0.2),
        ("S2", "FastQC.percent_gc", 50.0),
    ]);
    let out = run_metric_engine(
        "duplication levels",
        Some("fastqc.PERCENT_GC"),
        &t,
        &StatsThresholds::default(),
    );
    assert_eq!(out.metric_key.as_deref(), Some("FastQC.percent_gc"));
    assert_eq!(out.rows.len(), 2);
}

#[test]
fn test_unknown_requested_metric_falls_back_to_inference() {
    let t = table(&[("S1", "percent_gc", 40.0), ("S2", "percent_gc", 42.0)]);
    let out = run_metric_engine("gc", Some("nope"), &t, &StatsThresholds::default());
    assert_eq!(out.metric_key.as_deref(), Some("percent_gc"));
}

#[test]
fn test_empty_table_yields_no_metric() {
    let out = run_metric_engine("gc", None, &MetricTable::new(), &StatsThresholds::default());
    assert_eq!(out, MetricOutput::default());
}

#[test]
fn test_summary_line() {
    let stats = sample_statistics(
        "percent_gc",
        &values(&[("a", 40.0), ("b", 80.0)]),
        &StatsThresholds::default(),
    )
    .unwrap();
    assert_eq!(
        summarize(&stats),
        "percent_gc: mean 60 (±28.284), range 40 - 80, 0 of 2 samples are outliers"
    );
}
