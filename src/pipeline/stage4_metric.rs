use crate::model::metrics::{MetricTable, find_metric, resolve_metric_key};
use crate::model::state::{Cell, MetricAnalysis, Row};
use crate::model::stats::{Comparison, Direction, MetricStats, Outlier, round_to};
use crate::model::thresholds::StatsThresholds;
use crate::panels::builder::format_value;

/// Checked in order; the first token found in the question wins.
pub const METRIC_TOKENS: &[&str] = &["dup", "umi", "gc", "mapped", "counts", "n_content", "align"];

#[derive(Debug, Clone, PartialEq)]
pub struct SampleValue {
    pub sample: String,
    pub metric: String,
    pub value: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricOutput {
    pub metric_key: Option<String>,
    pub rows: Vec<Row>,
    pub notes: Vec<String>,
    pub analysis: Option<MetricAnalysis>,
}

pub fn infer_metric_key(question: &str, table: &MetricTable) -> Option<String> {
    let q = question.to_lowercase();
    if let Some(token) = METRIC_TOKENS.iter().copied().find(|t| q.contains(t)) {
        let hit = table
            .values()
            .flat_map(|metrics| metrics.keys())
            .find(|key| key.to_lowercase().contains(token));
        if let Some(key) = hit {
            return Some(key.clone());
        }
    }
    table
        .values()
        .flat_map(|metrics| metrics.keys())
        .next()
        .cloned()
}

pub fn extract_values(table: &MetricTable, metric_key: &str) -> Vec<SampleValue> {
    table
        .iter()
        .filter_map(|(sample, metrics)| {
            find_metric(metrics, metric_key).map(|(key, value)| SampleValue {
                sample: sample.clone(),
                metric: key.to_string(),
                value,
            })
        })
        .collect()
}

/// Descriptive statistics with sample standard deviation. `None` below two
/// observations.
pub fn sample_statistics(
    metric_key: &str,
    values: &[SampleValue],
    thresholds: &StatsThresholds,
) -> Option<MetricStats> {
    if values.len() < 2 {
        return None;
    }
    let n = values.len() as f64;
    let mean = values.iter().map(|v| v.value).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|v| (v.value - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0);
    let stdev = variance.sqrt();
    let min = values.iter().map(|v| v.value).fold(f64::INFINITY, f64::min);
    let max = values.iter().map(|v| v.value).fold(f64::NEG_INFINITY, f64::max);

    let mut outliers = Vec::new();
    if stdev > 0.0 {
        for v in values {
            let z = (v.value - mean).abs() / stdev;
            if z > thresholds.outlier_z {
                outliers.push(Outlier {
                    sample: v.sample.clone(),
                    value: v.value,
                    z_score: round_to(z, 2),
                    direction: if v.value > mean {
                        Direction::High
                    } else {
                        Direction::Low
                    },
                });
            }
        }
    }

    Some(MetricStats {
        metric_key: metric_key.to_string(),
        mean: round_to(mean, 3),
        stdev: round_to(stdev, 3),
        min: round_to(min, 3),
        max: round_to(max, 3),
        count: values.len(),
        outliers,
    })
}

/// Highest against lowest among strictly positive values.
pub fn compare_samples(values: &[SampleValue]) -> Option<Comparison> {
    let mut positive: Vec<&SampleValue> = values.iter().filter(|v| v.value > 0.0).collect();
    if positive.len() < 2 {
        return None;
    }
    positive.sort_by(|a, b| b.value.total_cmp(&a.value));
    let higher = positive.first()?;
    let lower = positive.last()?;
    let ratio = if lower.value > 0.0 {
        round_to(higher.value / lower.value, 2)
    } else {
        f64::INFINITY
    };
    Some(Comparison {
        higher_sample: higher.sample.clone(),
        higher_value: round_to(higher.value, 3),
        lower_sample: lower.sample.clone(),
        lower_value: round_to(lower.value, 3),
        ratio,
        difference: round_to(higher.value - lower.value, 3),
    })
}

pub fn insights(
    metric_key: &str,
    stats: &MetricStats,
    comparison: Option<&Comparison>,
    thresholds: &StatsThresholds,
) -> Vec<String> {
    let mut lines: Vec<String> = stats
        .outliers
        .iter()
        .map(|o| {
            format!(
                "{} is {:.2}SD {} than average",
                o.sample,
                o.z_score,
                o.direction.comparative()
            )
        })
        .collect();
    if let Some(c) = comparison
        && c.ratio > thresholds.notable_ratio
    {
        lines.push(format!(
            "{} has {:.1}x higher {metric_key} than {}",
            c.higher_sample, c.ratio, c.lower_sample
        ));
    }
    lines
}

pub fn summarize(stats: &MetricStats) -> String {
    format!(
        "{}: mean {} (±{}), range {} - {}, {} of {} samples are outliers",
        stats.metric_key,
        format_value(stats.mean),
        format_value(stats.stdev),
        format_value(stats.min),
        format_value(stats.max),
        stats.outliers.len(),
        stats.count
    )
}

fn value_rows(values: &[SampleValue], stats: Option<&MetricStats>) -> Vec<Row> {
    values
        .iter()
        .map(|v| {
            let mut row = Row::new();
            row.insert("sample".to_string(), Cell::Text(v.sample.clone()));
            row.insert("metric".to_string(), Cell::Text(v.metric.clone()));
            row.insert("value".to_string(), Cell::Float(v.value));
            let is_outlier =
                stats.is_some_and(|s| s.outliers.iter().any(|o| o.sample == v.sample));
            if is_outlier {
                row.insert("outlier".to_string(), Cell::Bool(true));
            }
            row
        })
        .collect()
}

/// Chooses the metric (a requested key present in the table wins over
/// inference), then extracts values, statistics and insight notes.
pub fn run_metric_engine(
    question: &str,
    requested: Option<&str>,
    table: &MetricTable,
    thresholds: &StatsThresholds,
) -> MetricOutput {
    let metric_key = requested
        .and_then(|key| resolve_metric_key(table, key))
        .or_else(|| infer_metric_key(question, table));
    let Some(metric_key) = metric_key else {
        return MetricOutput::default();
    };

    let values = extract_values(table, &metric_key);
    let stats = sample_statistics(&metric_key, &values, thresholds);
    let comparison = compare_samples(&values);
    let rows = value_rows(&values, stats.as_ref());

    let (notes, analysis) = match stats {
        Some(stats) => {
            let notes = insights(&metric_key, &stats, comparison.as_ref(), thresholds);
            let summary = summarize(&stats);
            (
                notes,
                Some(MetricAnalysis {
                    stats: Some(stats),
                    comparison,
                    summary: Some(summary),
                }),
            )
        }
        None => (
            Vec::new(),
            Some(MetricAnalysis {
                stats: None,
                comparison,
                summary: None,
            }),
        ),
    };

    MetricOutput {
        metric_key: Some(metric_key),
        rows,
        notes,
        analysis,
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_metric.rs"]
mod tests;
