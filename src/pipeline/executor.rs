//! Stage sequencing for one question.
//!
//! The graph is fixed: parse, index, one analysis branch chosen by the
//! router, artifact selection, synthesis and confidence scoring. `run`
//! drives it to completion; `stream` drives the same stages from a spawned
//! task and reports each completed stage on a channel.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::capability::{CompletionService, EmbeddingIndexer, ObjectStore};
use crate::config::EngineConfig;
use crate::error::{FailureKind, InsightError, StageError};
use crate::input::load_report;
use crate::model::artifacts::ArtifactSelection;
use crate::model::intent::Intent;
use crate::model::metrics::metric_key_count;
use crate::model::state::{ChatRequest, ChatResult, ParsedReport, PipelineState};
use crate::model::thresholds::StatsThresholds;
use crate::panels::Panel;
use crate::panels::builder::build_panels;
use crate::pipeline::stage1_parse::parse_report;
use crate::pipeline::stage2_index::run_index_stage;
use crate::pipeline::stage3_route::route_intent;
use crate::pipeline::stage4_flags::run_flag_engine;
use crate::pipeline::stage4_metric::run_metric_engine;
use crate::pipeline::stage4_retrieve::retrieve_panels;
use crate::pipeline::stage5_artifacts::{ArtifactRequest, run_artifact_stage};
use crate::pipeline::stage6_synthesize::{SynthesisContext, synthesize};
use crate::pipeline::stage7_confidence::{ConfidenceInputs, LOW_CONFIDENCE_NOTE, score_confidence};
use crate::report::ReportSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Parse,
    Index,
    Analyze,
    SelectArtifacts,
    Synthesize,
    ScoreConfidence,
}

impl Stage {
    pub const ORDER: [Stage; 6] = [
        Stage::Parse,
        Stage::Index,
        Stage::Analyze,
        Stage::SelectArtifacts,
        Stage::Synthesize,
        Stage::ScoreConfidence,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Parse => "parse",
            Stage::Index => "index",
            Stage::Analyze => "analyze",
            Stage::SelectArtifacts => "select_artifacts",
            Stage::Synthesize => "synthesize",
            Stage::ScoreConfidence => "score_confidence",
        }
    }

    /// Confidence scoring is reported through the answer event instead.
    pub fn emits_status(&self) -> bool {
        !matches!(self, Stage::ScoreConfidence)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status { step: String, message: String },
    Answer { content: ChatResult },
    Error { message: String, kind: FailureKind },
    Done,
}

#[derive(Clone)]
pub struct InsightEngine {
    config: Arc<EngineConfig>,
    store: Arc<dyn ObjectStore>,
    indexer: Arc<dyn EmbeddingIndexer>,
    completion: Arc<dyn CompletionService>,
}

impl InsightEngine {
    pub fn new(
        config: EngineConfig,
        store: Arc<dyn ObjectStore>,
        indexer: Arc<dyn EmbeddingIndexer>,
        completion: Arc<dyn CompletionService>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            store,
            indexer,
            completion,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs every stage and returns the extracted result.
    pub async fn run(&self, request: ChatRequest) -> Result<ChatResult, InsightError> {
        let run_id = request.run_id.clone();
        self.execute(request, None).await.map_err(|err| {
            let err = InsightError::from(err);
            warn!(
                run_id = %run_id,
                kind = err.kind.as_str(),
                error = %err.message,
                "insight run failed"
            );
            err
        })
    }

    /// Loads and parses a run's report without calling any model.
    pub async fn inspect(&self, run_id: &str) -> Result<ReportSummary, InsightError> {
        let raw = load_report(self.store.as_ref(), &self.config, run_id)
            .await
            .map_err(|e| InsightError::from(StageError::from(e)))?;
        let report = parse_report(&raw, &self.config.status_sections);
        let panels = build_panels(&raw, &report.metrics, &report.meta, &report.statuses);
        Ok(ReportSummary::from_report(run_id, &report, &panels))
    }

    /// Runs the stages on a spawned task. The receiver yields one status
    /// event per completed stage, then an answer or an error, then `Done`.
    /// Dropping the receiver stops the run at the next stage boundary.
    pub fn stream(&self, request: ChatRequest) -> mpsc::Receiver<StreamEvent> {
        let (tx, rx) = mpsc::channel(self.config.stream_buffer.max(1));
        let engine = self.clone();
        tokio::spawn(async move {
            let run_id = request.run_id.clone();
            let progress = tx.clone();
            let worker =
                tokio::spawn(async move { engine.execute(request, Some(&progress)).await });
            let outcome = match worker.await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(StageError::Cancelled)) => {
                    debug!(run_id = %run_id, "stream receiver dropped, run abandoned");
                    return;
                }
                Ok(Err(err)) => Err(InsightError::from(err)),
                Err(join) => Err(InsightError::unexpected(format!(
                    "pipeline task aborted: {join}"
                ))),
            };
            let event = match outcome {
                Ok(content) => StreamEvent::Answer { content },
                Err(err) => {
                    warn!(
                        run_id = %run_id,
                        kind = err.kind.as_str(),
                        error = %err.message,
                        "insight stream failed"
                    );
                    StreamEvent::Error {
                        message: err.message,
                        kind: err.kind,
                    }
                }
            };
            if tx.send(event).await.is_ok() {
                let _ = tx.send(StreamEvent::Done).await;
            }
        });
        rx
    }

    async fn execute(
        &self,
        request: ChatRequest,
        progress: Option<&mpsc::Sender<StreamEvent>>,
    ) -> Result<ChatResult, StageError> {
        let mut state = PipelineState::new(request, self.config.history_limit);
        for stage in Stage::ORDER {
            let started = Instant::now();
            let message = self.advance(stage, &mut state).await?;
            info!(
                run_id = %state.run_id,
                stage = stage.name(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "{message}"
            );
            if let Some(tx) = progress
                && stage.emits_status()
            {
                let event = StreamEvent::Status {
                    step: stage.name().to_string(),
                    message,
                };
                if tx.send(event).await.is_err() {
                    return Err(StageError::Cancelled);
                }
            }
        }
        state
            .into_result()
            .ok_or_else(|| StageError::Unexpected("pipeline finished without an answer".into()))
    }

    /// Executes one stage and returns its status message.
    async fn advance(&self, stage: Stage, state: &mut PipelineState) -> Result<String, StageError> {
        match stage {
            Stage::Parse => self.parse(state).await,
            Stage::Index => self.index(state).await,
            Stage::Analyze => self.analyze(state).await,
            Stage::SelectArtifacts => self.select_artifacts(state).await,
            Stage::Synthesize => self.synthesize(state).await,
            Stage::ScoreConfidence => Ok(self.score(state)),
        }
    }

    async fn parse(&self, state: &mut PipelineState) -> Result<String, StageError> {
        let raw = load_report(self.store.as_ref(), &self.config, &state.run_id).await?;
        let report = parse_report(&raw, &self.config.status_sections);
        let message = format!(
            "Loaded QC report: {} samples, {} metrics",
            report.metrics.len().max(report.statuses.len()),
            metric_key_count(&report.metrics)
        );
        state.raw_report = Some(raw);
        state.report = Some(report);
        Ok(message)
    }

    async fn index(&self, state: &mut PipelineState) -> Result<String, StageError> {
        let raw = state
            .raw_report
            .as_ref()
            .ok_or_else(|| StageError::Unexpected("index stage ran before parse".into()))?;
        let report = parsed(state)?;
        let out = run_index_stage(
            raw,
            report,
            self.indexer.as_ref(),
            self.config.request_timeout(),
        )
        .await?;
        let message = format!("Indexed {} panels", out.panels.len());
        state.panels = Some(out.panels);
        state.index = out.index;
        Ok(message)
    }

    async fn analyze(&self, state: &mut PipelineState) -> Result<String, StageError> {
        let intent = route_intent(&state.question);
        state.intent = Some(intent);

        let message = match intent {
            Intent::LookupSamples => {
                let out = run_flag_engine(&state.question, parsed(state)?, &self.config.thresholds);
                let message = format!("Flagged {} samples", out.rows.len());
                state.tabular = Some(out.rows);
                state.notes.extend(out.notes);
                message
            }
            Intent::LookupMetric => {
                let out = run_metric_engine(
                    &state.question,
                    state.requested_metric.as_deref(),
                    &parsed(state)?.metrics,
                    &StatsThresholds::default_v1(),
                );
                let message = match &out.metric_key {
                    Some(key) => format!("Analysed {key} across {} samples", out.rows.len()),
                    None => "No metric available for analysis".to_string(),
                };
                state.metric_key = out.metric_key;
                state.tabular = Some(out.rows);
                state.metric_analysis = out.analysis;
                state.notes.extend(out.notes);
                message
            }
            Intent::Rag => {
                let panels = self.retrieve(state).await?;
                let message = format!("Retrieved {} relevant panels", panels.len());
                state.retrieved = Some(panels);
                message
            }
        };

        if intent != Intent::Rag && self.config.retrieve_for_all_intents {
            let panels = self.retrieve(state).await?;
            state.retrieved = Some(panels);
        }
        Ok(format!("Routed to {intent}. {message}"))
    }

    async fn retrieve(&self, state: &PipelineState) -> Result<Vec<Panel>, StageError> {
        retrieve_panels(
            state.index.as_deref(),
            &state.question,
            self.config.retrieval_k,
            self.config.request_timeout(),
        )
        .await
    }

    async fn select_artifacts(&self, state: &mut PipelineState) -> Result<String, StageError> {
        let request = ArtifactRequest {
            run_id: &state.run_id,
            question: &state.question,
            metric_key: state.effective_metric(),
            rows: state.rows(),
        };
        let selection = run_artifact_stage(
            request,
            &self.config,
            self.store.as_ref(),
            self.completion.as_ref(),
        )
        .await?;
        let message = format!(
            "Selected {} plots and {} tables",
            selection.plots.len(),
            selection.tables.len()
        );
        state.artifacts = Some(selection);
        Ok(message)
    }

    async fn synthesize(&self, state: &mut PipelineState) -> Result<String, StageError> {
        let ctx = SynthesisContext {
            question: &state.question,
            history: &state.history,
            history_limit: self.config.history_in_prompt,
            rows: state.rows(),
            stats_summary: state
                .metric_analysis
                .as_ref()
                .and_then(|a| a.summary.as_deref()),
            panels: state.retrieved_panels(),
        };
        let empty = ArtifactSelection::default();
        let artifacts = state.artifacts.as_ref().unwrap_or(&empty);
        let out = synthesize(
            &ctx,
            artifacts,
            self.completion.as_ref(),
            self.config.request_timeout(),
        )
        .await?;
        let message = format!("Generated answer ({} chars)", out.answer.chars().count());
        state.answer = Some(out.answer);
        state.citations = Some(out.citations);
        Ok(message)
    }

    fn score(&self, state: &mut PipelineState) -> String {
        let confidence = score_confidence(&ConfidenceInputs {
            retrieved: state.retrieved_panels().len(),
            has_rows: !state.rows().is_empty(),
            has_samples: state.has_samples(),
            has_metric: state.effective_metric().is_some(),
            question: &state.question,
        });
        if confidence.is_low() {
            state.notes.push(LOW_CONFIDENCE_NOTE.to_string());
        }
        let message = format!("Confidence {}", confidence.score);
        state.confidence = Some(confidence);
        message
    }
}

fn parsed(state: &PipelineState) -> Result<&ParsedReport, StageError> {
    state
        .report
        .as_ref()
        .ok_or_else(|| StageError::Unexpected("analysis ran before the report was parsed".into()))
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/executor.rs"]
mod tests;
