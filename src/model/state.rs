use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::capability::SimilarityIndex;
use crate::model::artifacts::ArtifactSelection;
use crate::model::intent::Intent;
use crate::model::metrics::{MetricMeta, MetricTable, ModuleStatusTable};
use crate::model::stats::{Comparison, MetricStats};
use crate::panels::Panel;
use crate::pipeline::stage7_confidence::Confidence;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Cell {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Bool(v) => write!(f, "{v}"),
            Cell::Int(v) => write!(f, "{v}"),
            Cell::Float(v) => write!(f, "{v}"),
            Cell::Text(v) => f.write_str(v),
        }
    }
}

/// One result row. Rows are heterogeneous: keys differ between rows.
pub type Row = BTreeMap<String, Cell>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: String,
    pub content: String,
}

impl HistoryEntry {
    pub fn new(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub run_id: String,
    pub question: String,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub metric_key: Option<String>,
}

impl ChatRequest {
    pub fn new(run_id: &str, question: &str) -> Self {
        Self {
            run_id: run_id.to_string(),
            question: question.to_string(),
            history: Vec::new(),
            metric_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatResult {
    pub answer: String,
    pub citations: Vec<String>,
    pub metric_key: Option<String>,
    pub confidence: u8,
    pub confidence_explanation: String,
    pub notes: Vec<String>,
}

/// Parsed form of the QC report, written by the parse stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReport {
    pub metrics: MetricTable,
    pub meta: MetricMeta,
    pub statuses: ModuleStatusTable,
}

/// Output of the metric statistics branch.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricAnalysis {
    pub stats: Option<MetricStats>,
    pub comparison: Option<Comparison>,
    pub summary: Option<String>,
}

/// State threaded through every stage of one invocation.
///
/// Each stage owns the fields it writes; later stages read but never clear
/// them. `notes` only grows.
pub struct PipelineState {
    pub run_id: String,
    pub question: String,
    pub history: Vec<HistoryEntry>,
    pub requested_metric: Option<String>,

    pub raw_report: Option<serde_json::Value>,
    pub report: Option<ParsedReport>,

    pub panels: Option<Vec<Panel>>,
    pub index: Option<Box<dyn SimilarityIndex>>,

    pub intent: Option<Intent>,
    pub tabular: Option<Vec<Row>>,
    pub retrieved: Option<Vec<Panel>>,
    pub metric_key: Option<String>,
    pub metric_analysis: Option<MetricAnalysis>,

    pub artifacts: Option<ArtifactSelection>,

    pub answer: Option<String>,
    pub citations: Option<Vec<String>>,
    pub confidence: Option<Confidence>,

    pub notes: Vec<String>,
}

impl PipelineState {
    pub fn new(request: ChatRequest, history_limit: usize) -> Self {
        let ChatRequest {
            run_id,
            question,
            mut history,
            metric_key,
        } = request;
        if history.len() > history_limit {
            history.drain(..history.len() - history_limit);
        }
        Self {
            run_id,
            question,
            history,
            requested_metric: metric_key.filter(|k| !k.trim().is_empty()),
            raw_report: None,
            report: None,
            panels: None,
            index: None,
            intent: None,
            tabular: None,
            retrieved: None,
            metric_key: None,
            metric_analysis: None,
            artifacts: None,
            answer: None,
            citations: None,
            confidence: None,
            notes: Vec::new(),
        }
    }

    pub fn rows(&self) -> &[Row] {
        self.tabular.as_deref().unwrap_or_default()
    }

    pub fn retrieved_panels(&self) -> &[Panel] {
        self.retrieved.as_deref().unwrap_or_default()
    }

    pub fn has_samples(&self) -> bool {
        self.report
            .as_ref()
            .is_some_and(|r| !r.metrics.is_empty() || !r.statuses.is_empty())
    }

    /// Metric reported back to the caller: the analysed one, else the requested one.
    pub fn effective_metric(&self) -> Option<&str> {
        self.metric_key
            .as_deref()
            .or(self.requested_metric.as_deref())
    }

    pub fn into_result(self) -> Option<ChatResult> {
        let metric_key = self.effective_metric().map(|k| k.to_string());
        let answer = self.answer?;
        let confidence = self.confidence?;
        Some(ChatResult {
            answer,
            citations: self.citations.unwrap_or_default(),
            metric_key,
            confidence: confidence.score,
            confidence_explanation: confidence.explanation,
            notes: self.notes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/model/state.rs"]
mod tests;
