//! Rendering of engine output for the command line.

pub mod json;
pub mod text;

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::metrics::{ModuleStatus, metric_key_count};
use crate::model::state::ParsedReport;
use crate::panels::Panel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub pass: usize,
    pub warn: usize,
    pub fail: usize,
}

/// Overview of a parsed report, used by `inspect`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub run_id: String,
    pub samples: Vec<String>,
    pub metric_keys: Vec<String>,
    pub metric_count: usize,
    pub status_counts: BTreeMap<String, StatusCounts>,
    pub panel_count: usize,
}

impl ReportSummary {
    pub fn from_report(run_id: &str, report: &ParsedReport, panels: &[Panel]) -> Self {
        let mut samples: Vec<String> = report
            .metrics
            .keys()
            .chain(report.statuses.keys())
            .cloned()
            .collect();
        samples.sort();
        samples.dedup();

        let mut metric_keys: Vec<String> = report
            .metrics
            .values()
            .flat_map(|m| m.keys().cloned())
            .collect();
        metric_keys.sort();
        metric_keys.dedup();

        let status_counts = report
            .statuses
            .iter()
            .map(|(sample, modules)| {
                let mut counts = StatusCounts::default();
                for status in modules.values() {
                    match status {
                        ModuleStatus::Pass => counts.pass += 1,
                        ModuleStatus::Warn => counts.warn += 1,
                        ModuleStatus::Fail => counts.fail += 1,
                    }
                }
                (sample.clone(), counts)
            })
            .collect();

        Self {
            run_id: run_id.to_string(),
            samples,
            metric_keys,
            metric_count: metric_key_count(&report.metrics),
            status_counts,
            panel_count: panels.len(),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/report/mod.rs"]
mod tests;
