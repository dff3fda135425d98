use std::time::Duration;

use crate::capability::{SimilarityIndex, with_timeout};
use crate::error::StageError;
use crate::panels::Panel;

pub async fn retrieve_panels(
    index: Option<&dyn SimilarityIndex>,
    question: &str,
    k: usize,
    timeout: Duration,
) -> Result<Vec<Panel>, StageError> {
    let Some(index) = index else {
        return Ok(Vec::new());
    };
    if index.is_empty() || k == 0 {
        return Ok(Vec::new());
    }
    let mut panels = with_timeout("similarity search", timeout, index.top_k(question, k))
        .await
        .map_err(|e| StageError::capability("retrieve", e))?;
    panels.truncate(k);
    Ok(panels)
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage4_retrieve.rs"]
mod tests;
