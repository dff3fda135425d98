use serde_json::Value;

use crate::model::metrics::{MetricMeta, MetricTable, ModuleStatus, ModuleStatusTable};
use crate::panels::{
    GENERAL_STATS_MODULE, Panel, RAW_DUMP_MAX_CHARS, RAW_MODULE, STATUS_MODULE,
};

pub fn build_general_stats_panels(metrics: &MetricTable, meta: &MetricMeta) -> Vec<Panel> {
    let mut panels = Vec::with_capacity(metrics.len());
    for (sample, values) in metrics {
        if values.is_empty() {
            continue;
        }
        let mut content = format!("Sample: {sample}");
        for (key, value) in values {
            let label = meta
                .get(key)
                .map(|info| info.label(key))
                .unwrap_or_else(|| key.clone());
            content.push('\n');
            content.push_str(&format!("{label}: {}", format_value(*value)));
        }
        panels.push(Panel::new(GENERAL_STATS_MODULE, Some(sample), content));
    }
    panels
}

pub fn build_status_panels(statuses: &ModuleStatusTable) -> Vec<Panel> {
    let mut panels = Vec::with_capacity(statuses.len());
    for (sample, modules) in statuses {
        if modules.is_empty() {
            continue;
        }
        let mut details = Vec::with_capacity(modules.len());
        let mut failed = Vec::new();
        let mut warned = Vec::new();
        for (module, status) in modules {
            let readable = humanize_module(module);
            details.push(format!("{readable}: {}", status.as_str()));
            match status {
                ModuleStatus::Fail => failed.push(readable),
                ModuleStatus::Warn => warned.push(readable),
                ModuleStatus::Pass => {}
            }
        }

        let mut summary = Vec::new();
        if !failed.is_empty() {
            summary.push(format!("FAILED modules: {}", failed.join(", ")));
        }
        if !warned.is_empty() {
            summary.push(format!("WARNING modules: {}", warned.join(", ")));
        }
        let summary = if summary.is_empty() {
            "All modules passed".to_string()
        } else {
            summary.join(" | ")
        };

        let content = format!(
            "Sample: {sample}\nFastQC Status Summary: {summary}\n\nModule Details:\n{}",
            details.join("\n")
        );
        panels.push(Panel::new(STATUS_MODULE, Some(sample), content));
    }
    panels
}

pub fn build_fallback_panel(raw: &Value) -> Option<Panel> {
    let non_empty = match raw {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Null => false,
        _ => true,
    };
    if !non_empty {
        return None;
    }
    let dump = raw.to_string();
    let truncated: String = dump.chars().take(RAW_DUMP_MAX_CHARS).collect();
    Some(Panel::new(RAW_MODULE, None, truncated))
}

pub fn build_panels(
    raw: &Value,
    metrics: &MetricTable,
    meta: &MetricMeta,
    statuses: &ModuleStatusTable,
) -> Vec<Panel> {
    let mut panels = build_general_stats_panels(metrics, meta);
    panels.extend(build_status_panels(statuses));
    if panels.is_empty() {
        panels.extend(build_fallback_panel(raw));
    }
    panels
}

pub fn humanize_module(name: &str) -> String {
    name.split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
