use tracing::debug;

use crate::model::flags::{SampleFlag, flag_order};
use crate::model::metrics::{ModuleStatus, SampleMetrics, modules_with_status};
use crate::model::state::{Cell, ParsedReport, Row};
use crate::model::stats::round_to;
use crate::model::thresholds::FlagThresholds;
use crate::panels::builder::format_value;
use crate::pipeline::stage3_route::mentions_sample_triage;

pub const MODULE_FAILURE_NOTE: &str = "Also flagging samples with failed QC modules";

#[derive(Debug, Clone, PartialEq)]
pub struct SampleAssessment {
    pub sample: String,
    pub duplication: f64,
    pub coverage: f64,
    pub failed_modules: Vec<String>,
    pub warned_modules: Vec<String>,
    pub flags: Vec<SampleFlag>,
}

impl SampleAssessment {
    pub fn is_flagged(&self) -> bool {
        !self.flags.is_empty()
    }

    fn to_row(&self) -> Row {
        let mut row = Row::new();
        row.insert("sample".to_string(), Cell::Text(self.sample.clone()));
        row.insert(
            "duplication".to_string(),
            Cell::Float(round_to(self.duplication, 3)),
        );
        row.insert("mapped".to_string(), Cell::Int(self.coverage as i64));
        row.insert("flag".to_string(), Cell::Bool(true));
        if !self.failed_modules.is_empty() {
            row.insert(
                "failed_modules".to_string(),
                Cell::Text(self.failed_modules.join(", ")),
            );
        }
        if !self.warned_modules.is_empty() {
            row.insert(
                "warned_modules".to_string(),
                Cell::Text(self.warned_modules.join(", ")),
            );
        }
        row
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FlagOutput {
    pub rows: Vec<Row>,
    pub notes: Vec<String>,
}

/// Largest value among metrics whose key contains one of `tokens`, else 0.
fn max_matching(metrics: Option<&SampleMetrics>, tokens: &[String]) -> f64 {
    let Some(metrics) = metrics else {
        return 0.0;
    };
    metrics
        .iter()
        .filter(|(key, _)| {
            let key = key.to_lowercase();
            tokens.iter().any(|t| key.contains(t.as_str()))
        })
        .map(|(_, v)| *v)
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
        .unwrap_or(0.0)
}

pub fn assess_sample(
    sample: &str,
    report: &ParsedReport,
    thresholds: &FlagThresholds,
) -> SampleAssessment {
    let metrics = report.metrics.get(sample);
    let modules = report.statuses.get(sample);
    let duplication = max_matching(metrics, &thresholds.duplication_tokens);
    let coverage = max_matching(metrics, &thresholds.coverage_tokens);
    let failed_modules = modules_with_status(modules, ModuleStatus::Fail);
    let warned_modules = modules_with_status(modules, ModuleStatus::Warn);

    let flags = flag_order()
        .iter()
        .copied()
        .filter(|flag| match flag {
            SampleFlag::HighDuplication => duplication > thresholds.max_duplication,
            SampleFlag::LowCoverage => coverage < thresholds.min_coverage,
            SampleFlag::FailedModules => {
                thresholds.flag_failed_modules && !failed_modules.is_empty()
            }
        })
        .collect();

    SampleAssessment {
        sample: sample.to_string(),
        duplication,
        coverage,
        failed_modules,
        warned_modules,
        flags,
    }
}

pub fn threshold_note(thresholds: &FlagThresholds) -> String {
    format!(
        "Heuristics: dup>{} OR mapped<{}",
        format_value(thresholds.max_duplication),
        format_value(thresholds.min_coverage)
    )
}

pub fn run_flag_engine(
    question: &str,
    report: &ParsedReport,
    thresholds: &FlagThresholds,
) -> FlagOutput {
    // Statuses only annotate samples that have metrics.
    let assessments: Vec<SampleAssessment> = report
        .metrics
        .keys()
        .map(|s| assess_sample(s, report, thresholds))
        .collect();

    for assessment in assessments.iter().filter(|a| a.is_flagged()) {
        let flags: Vec<&str> = assessment.flags.iter().map(|f| f.as_str()).collect();
        debug!(sample = %assessment.sample, flags = ?flags, "sample flagged");
    }

    let rows = if mentions_sample_triage(question) {
        assessments
            .iter()
            .filter(|a| a.is_flagged())
            .map(SampleAssessment::to_row)
            .collect()
    } else {
        Vec::new()
    };

    let mut notes = vec![threshold_note(thresholds)];
    let module_failures = thresholds.flag_failed_modules
        && assessments.iter().any(|a| !a.failed_modules.is_empty());
    if module_failures {
        notes.push(MODULE_FAILURE_NOTE.to_string());
    }

    FlagOutput { rows, notes }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_flags.rs"]
mod tests;
