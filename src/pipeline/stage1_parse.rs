use serde_json::{Map, Value};

use crate::model::metrics::{MetricInfo, MetricMeta, MetricTable, ModuleStatus, ModuleStatusTable};
use crate::model::state::ParsedReport;

pub const GENERAL_STATS_DATA: &str = "report_general_stats_data";
pub const GENERAL_STATS_HEADERS: &str = "report_general_stats_headers";
pub const SAVED_RAW_DATA: &str = "report_saved_raw_data";

const AGGREGATE_SAMPLE: &str = "multiqc";

/// Turns a raw MultiQC document into metric, metadata and status tables.
///
/// Never fails: missing or malformed sections simply contribute nothing.
pub fn parse_report(doc: &Value, status_sections: &[String]) -> ParsedReport {
    let data_blocks = blocks(doc, GENERAL_STATS_DATA);
    let header_blocks = blocks(doc, GENERAL_STATS_HEADERS);

    let mut metrics = MetricTable::new();
    let mut meta = MetricMeta::new();

    for (idx, block) in data_blocks.iter().enumerate() {
        // Header block i describes data block i.
        let headers = header_blocks.get(idx).copied();
        for (sample, fields) in *block {
            if is_aggregate(sample) {
                continue;
            }
            let Some(fields) = fields.as_object() else {
                continue;
            };
            for (raw_name, value) in fields {
                let Some(value) = numeric(value) else {
                    continue;
                };
                let header = headers.and_then(|h| h.get(raw_name)).and_then(Value::as_object);
                let namespace = header.and_then(namespace_of);
                let key = qualified_key(namespace.as_deref(), raw_name);
                if let Some(header) = header {
                    meta.entry(key.clone())
                        .or_insert_with(|| metric_info(header, namespace.clone()));
                }
                metrics
                    .entry(sample.clone())
                    .or_default()
                    .insert(key, value);
            }
        }
    }

    metrics.retain(|_, values| !values.is_empty());

    ParsedReport {
        metrics,
        meta,
        statuses: parse_statuses(doc, status_sections),
    }
}

/// Reads pass/warn/fail module checks from the saved raw-data sections.
pub fn parse_statuses(doc: &Value, sections: &[String]) -> ModuleStatusTable {
    let mut statuses = ModuleStatusTable::new();
    let Some(raw) = doc.get(SAVED_RAW_DATA).and_then(Value::as_object) else {
        return statuses;
    };
    for section in sections {
        let Some(samples) = raw.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (sample, fields) in samples {
            if is_aggregate(sample) {
                continue;
            }
            let Some(fields) = fields.as_object() else {
                continue;
            };
            for (module, value) in fields {
                let Some(status) = value.as_str().and_then(ModuleStatus::parse) else {
                    continue;
                };
                statuses
                    .entry(sample.clone())
                    .or_default()
                    .insert(module.clone(), status);
            }
        }
    }
    statuses
}

fn blocks<'a>(doc: &'a Value, section: &str) -> Vec<&'a Map<String, Value>> {
    match doc.get(section) {
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_object).collect(),
        // Older reports store a single block instead of a list.
        Some(Value::Object(block)) => vec![block],
        _ => Vec::new(),
    }
}

fn is_aggregate(sample: &str) -> bool {
    sample.eq_ignore_ascii_case(AGGREGATE_SAMPLE)
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn namespace_of(header: &Map<String, Value>) -> Option<String> {
    header
        .get("namespace")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|ns| !ns.is_empty())
        .map(|ns| ns.to_string())
}

pub fn qualified_key(namespace: Option<&str>, raw_name: &str) -> String {
    match namespace {
        Some(ns) => format!("{}.{raw_name}", ns.to_lowercase()),
        None => raw_name.to_string(),
    }
}

fn metric_info(header: &Map<String, Value>, namespace: Option<String>) -> MetricInfo {
    let text = |field: &str| {
        header
            .get(field)
            .and_then(Value::as_str)
            .map(|s| s.to_string())
    };
    MetricInfo {
        title: text("title"),
        namespace,
        description: text("description"),
        raw: header.clone(),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage1_parse.rs"]
mod tests;
