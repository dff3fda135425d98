use std::time::Duration;

use serde_json::Value;

use crate::capability::{EmbeddingIndexer, SimilarityIndex, with_timeout};
use crate::error::StageError;
use crate::model::state::ParsedReport;
use crate::panels::Panel;
use crate::panels::builder::build_panels;

pub struct IndexOutput {
    pub panels: Vec<Panel>,
    pub index: Option<Box<dyn SimilarityIndex>>,
}

pub async fn run_index_stage(
    raw: &Value,
    report: &ParsedReport,
    indexer: &dyn EmbeddingIndexer,
    timeout: Duration,
) -> Result<IndexOutput, StageError> {
    let panels = build_panels(raw, &report.metrics, &report.meta, &report.statuses);
    if panels.is_empty() {
        return Ok(IndexOutput {
            panels,
            index: None,
        });
    }
    let index = with_timeout("index build", timeout, indexer.build(&panels))
        .await
        .map_err(|e| StageError::capability("index", e))?;
    Ok(IndexOutput {
        panels,
        index: Some(index),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage2_index.rs"]
mod tests;
