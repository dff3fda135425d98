use std::collections::BTreeSet;
use std::time::Duration;

use crate::capability::{CompletionService, with_timeout};
use crate::error::StageError;
use crate::model::artifacts::ArtifactSelection;
use crate::model::state::{HistoryEntry, Row};
use crate::panels::Panel;

pub const MAX_PREVIEW_ROWS: usize = 10;
pub const MAX_CONTEXT_PANELS: usize = 4;
pub const PANEL_SNIPPET_CHARS: usize = 800;
pub const HISTORY_CONTENT_CHARS: usize = 200;

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// `None` when there are no rows. Columns are the sorted union of keys
/// across the previewed rows.
pub fn render_table_preview(rows: &[Row]) -> Option<String> {
    let rows = &rows[..rows.len().min(MAX_PREVIEW_ROWS)];
    if rows.is_empty() {
        return None;
    }
    let header: BTreeSet<&str> = rows
        .iter()
        .flat_map(|r| r.keys().map(|k| k.as_str()))
        .collect();
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(header.iter().copied().collect::<Vec<_>>().join(","));
    for row in rows {
        let cells: Vec<String> = header
            .iter()
            .map(|h| row.get(*h).map(|c| c.to_string()).unwrap_or_default())
            .collect();
        lines.push(cells.join(","));
    }
    Some(format!("TABLE_PREVIEW\n{}", lines.join("\n")))
}

pub fn render_panels(panels: &[Panel]) -> Vec<String> {
    panels
        .iter()
        .take(MAX_CONTEXT_PANELS)
        .map(|p| {
            format!(
                "[{}] {}",
                p.module,
                truncate_chars(&p.content, PANEL_SNIPPET_CHARS)
            )
        })
        .collect()
}

/// Oldest first, limited to the most recent `limit` entries.
pub fn render_history(history: &[HistoryEntry], limit: usize) -> Option<String> {
    let start = history.len().saturating_sub(limit);
    let lines: Vec<String> = history[start..]
        .iter()
        .map(|h| {
            format!(
                "{}: {}",
                h.role.to_uppercase(),
                truncate_chars(&h.content, HISTORY_CONTENT_CHARS)
            )
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

pub struct SynthesisContext<'a> {
    pub question: &'a str,
    pub history: &'a [HistoryEntry],
    pub history_limit: usize,
    pub rows: &'a [Row],
    pub stats_summary: Option<&'a str>,
    pub panels: &'a [Panel],
}

pub fn build_prompt(ctx: &SynthesisContext<'_>) -> String {
    let mut blocks = Vec::new();
    blocks.extend(render_table_preview(ctx.rows));
    if let Some(summary) = ctx.stats_summary {
        blocks.push(format!("STATISTICS\n{summary}"));
    }
    blocks.extend(render_panels(ctx.panels));

    let history = render_history(ctx.history, ctx.history_limit);
    let context = if blocks.is_empty() {
        "None".to_string()
    } else {
        blocks.join("\n")
    };

    format!(
        "You are a genomics QC assistant for MultiQC sequencing reports.\n\n\
Conversation History:\n{history}\n\n\
Current Question: {question}\n\n\
Context (table preview, statistics and module snippets):\n{context}\n\n\
Instructions:\n\
- Answer concisely and concretely using markdown formatting.\n\
- If the question is unrelated to the run, answer from general knowledge.\n\
- Do not mention the context you were given or how it was retrieved.\n\
- Cite QC modules inline (fastqc, picard, umi_tools) where relevant.\n\
- Make recommendations specific (trim adapters, increase sequencing depth).\n\
- Do not include links or image references; supporting artifacts are attached separately.",
        history = history.as_deref().unwrap_or("None"),
        question = ctx.question,
    )
}

/// Appends the artifact sections after the model's reply. Empty sections
/// are omitted.
pub fn append_artifacts(answer: &str, artifacts: &ArtifactSelection) -> String {
    let mut out = answer.trim_end().to_string();
    if !artifacts.plots.is_empty() {
        out.push_str("\n\n---\n\n**Visualizations**\n");
        for plot in &artifacts.plots {
            out.push_str(&format!("\n**{}**\n\n![{}]({})\n", plot.label, plot.label, plot.url));
        }
    }
    if !artifacts.tables.is_empty() {
        out.push_str("\n\n---\n\n**Download Data**\n\n");
        for table in &artifacts.tables {
            out.push_str(&format!("- [{}]({})\n", table.label, table.url));
        }
    }
    out
}

/// Sorted, de-duplicated module tags of the retrieved panels.
pub fn collect_citations(panels: &[Panel]) -> Vec<String> {
    panels
        .iter()
        .map(|p| p.module.clone())
        .filter(|m| !m.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

pub struct Synthesis {
    pub answer: String,
    pub citations: Vec<String>,
}

pub async fn synthesize(
    ctx: &SynthesisContext<'_>,
    artifacts: &ArtifactSelection,
    completion: &dyn CompletionService,
    timeout: Duration,
) -> Result<Synthesis, StageError> {
    let prompt = build_prompt(ctx);
    let limit = completion.call_budget(timeout);
    let reply = with_timeout("answer completion", limit, completion.complete(&prompt))
        .await
        .map_err(|e| StageError::capability("synthesize", e))?;
    Ok(Synthesis {
        answer: append_artifacts(&reply, artifacts),
        citations: collect_citations(ctx.panels),
    })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage6_synthesize.rs"]
mod tests;
