use std::collections::BTreeMap;

use serde::Serialize;

/// Sample name -> metric key -> value. Only numeric values are stored.
pub type SampleMetrics = BTreeMap<String, f64>;
pub type MetricTable = BTreeMap<String, SampleMetrics>;

/// Header metadata for one metric key, used only for labelling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricInfo {
    pub title: Option<String>,
    pub namespace: Option<String>,
    pub description: Option<String>,
    pub raw: serde_json::Map<String, serde_json::Value>,
}

impl MetricInfo {
    pub fn label(&self, key: &str) -> String {
        let title = self.title.as_deref().filter(|t| !t.is_empty()).unwrap_or(key);
        match self.namespace.as_deref().filter(|n| !n.is_empty()) {
            Some(ns) => format!("[{ns}] {title}"),
            None => title.to_string(),
        }
    }
}

pub type MetricMeta = BTreeMap<String, MetricInfo>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleStatus {
    Pass,
    Warn,
    Fail,
}

impl ModuleStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pass" => Some(ModuleStatus::Pass),
            "warn" => Some(ModuleStatus::Warn),
            "fail" => Some(ModuleStatus::Fail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleStatus::Pass => "pass",
            ModuleStatus::Warn => "warn",
            ModuleStatus::Fail => "fail",
        }
    }
}

pub type ModuleStatusTable = BTreeMap<String, BTreeMap<String, ModuleStatus>>;

pub fn modules_with_status(
    statuses: Option<&BTreeMap<String, ModuleStatus>>,
    wanted: ModuleStatus,
) -> Vec<String> {
    statuses
        .map(|m| {
            m.iter()
                .filter(|(_, s)| **s == wanted)
                .map(|(name, _)| name.clone())
                .collect()
        })
        .unwrap_or_default()
}

/// Case-insensitive lookup of a metric key within one sample.
pub fn find_metric<'a>(metrics: &'a SampleMetrics, key: &str) -> Option<(&'a str, f64)> {
    if let Some((k, v)) = metrics.get_key_value(key) {
        return Some((k.as_str(), *v));
    }
    metrics
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(k, v)| (k.as_str(), *v))
}

/// Resolves a caller-supplied key to the spelling used in the table.
pub fn resolve_metric_key(table: &MetricTable, key: &str) -> Option<String> {
    table
        .values()
        .find_map(|metrics| find_metric(metrics, key).map(|(k, _)| k.to_string()))
}

pub fn metric_key_count(table: &MetricTable) -> usize {
    let mut keys = std::collections::BTreeSet::new();
    for metrics in table.values() {
        keys.extend(metrics.keys().map(|k| k.as_str()));
    }
    keys.len()
}
