//! Supporting plots and tables for an answer.
//!
//! Two selectors pick catalog entries: a static keyword table and a
//! completion-assisted one that asks the model for catalog indices. Either
//! way every entry is handed to the caller as a signed link, never as a
//! storage path.

use std::collections::BTreeSet;

use tracing::{debug, warn};
use uuid::Uuid;

use crate::capability::{CompletionService, ObjectStore, with_timeout};
use crate::config::{EngineConfig, SelectorMode};
use crate::error::StageError;
use crate::model::artifacts::{
    ArtifactChoice, ArtifactDef, ArtifactKind, ArtifactLink, ArtifactSelection,
    GENERAL_STATS_TABLE, PLOT_CATALOG, RESULT_TABLE_LABEL, TABLE_CATALOG, catalog,
};
use crate::model::state::Row;

const STAGE: &str = "select_artifacts";

pub const FALLBACK_PLOTS: &[usize] = &[0, 1, 2];
pub const FALLBACK_TABLES: &[usize] = &[0, 1];

struct KeywordRule {
    keywords: &'static [&'static str],
    plots: &'static [usize],
    tables: &'static [usize],
    general_table: bool,
}

// More specific rules first: "base_quality" must win over "quality".
const KEYWORD_RULES: &[KeywordRule] = &[
    KeywordRule {
        keywords: &["duplication", "duplicate", "dup"],
        plots: &[0],
        tables: &[0],
        general_table: false,
    },
    KeywordRule {
        keywords: &["per_base_sequence_quality", "base_quality", "base quality"],
        plots: &[1],
        tables: &[1],
        general_table: false,
    },
    KeywordRule {
        keywords: &["sequence_quality", "quality_scores", "quality scores"],
        plots: &[2],
        tables: &[2],
        general_table: false,
    },
    KeywordRule {
        keywords: &["quality"],
        plots: &[1],
        tables: &[1],
        general_table: false,
    },
    KeywordRule {
        keywords: &["gc"],
        plots: &[3],
        tables: &[3],
        general_table: false,
    },
    KeywordRule {
        keywords: &["n_content", "n content"],
        plots: &[4],
        tables: &[5],
        general_table: false,
    },
    KeywordRule {
        keywords: &["read_count", "total_sequences", "counts", "reads"],
        plots: &[5],
        tables: &[6],
        general_table: false,
    },
    KeywordRule {
        keywords: &["adapter"],
        plots: &[6],
        tables: &[],
        general_table: true,
    },
    KeywordRule {
        keywords: &["length"],
        plots: &[8],
        tables: &[],
        general_table: true,
    },
];

fn rule_choice(rule: &KeywordRule) -> ArtifactChoice {
    let mut choice = ArtifactChoice::from_indices(rule.plots, rule.tables);
    if rule.general_table {
        choice.tables.push(GENERAL_STATS_TABLE);
    }
    choice
}

/// Static selection: the metric key is checked before the question; no
/// match yields only the general statistics table.
pub fn select_by_keyword(question: &str, metric_key: Option<&str>) -> ArtifactChoice {
    let candidates = metric_key
        .map(|m| m.to_lowercase())
        .into_iter()
        .chain(std::iter::once(question.to_lowercase()));
    for text in candidates {
        if let Some(rule) = KEYWORD_RULES
            .iter()
            .find(|r| r.keywords.iter().any(|k| text.contains(k)))
        {
            return rule_choice(rule);
        }
    }
    ArtifactChoice {
        plots: Vec::new(),
        tables: vec![GENERAL_STATS_TABLE],
    }
}

fn numbered(kind: ArtifactKind) -> String {
    catalog(kind)
        .iter()
        .enumerate()
        .map(|(i, def)| format!("{i}: {}", def.label))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn selection_prompt(question: &str, metric_key: Option<&str>) -> String {
    let context = match metric_key {
        Some(key) => format!("Metric: {key}"),
        None => "No specific metric".to_string(),
    };
    format!(
        "You are selecting MultiQC visualizations and data tables that help answer a question \
about a sequencing QC report.\n\n\
User Question: \"{question}\"\n\
Context: {context}\n\n\
Available Plots:\n{plots}\n\n\
Available Data Tables:\n{tables}\n\n\
Select only the items relevant to the question. General or overview questions may use \
several items; questions that are not about QC metrics need none.\n\n\
Respond in exactly this format:\n\
PLOTS: <comma-separated indices, may be empty>\n\
TABLES: <comma-separated indices, may be empty>\n\
REASONING: <one sentence>",
        plots = numbered(ArtifactKind::Plot),
        tables = numbered(ArtifactKind::Table),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSelection {
    pub plots: Vec<usize>,
    pub tables: Vec<usize>,
}

fn parse_indices(list: &str, limit: usize) -> Option<Vec<usize>> {
    let list = list.trim().trim_start_matches('[').trim_end_matches(']');
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let idx: i64 = part.parse().ok()?;
        // Out-of-range indices are dropped, not treated as a parse failure.
        if idx < 0 || idx as usize >= limit {
            continue;
        }
        let idx = idx as usize;
        if seen.insert(idx) {
            out.push(idx);
        }
    }
    Some(out)
}

/// Reads `PLOTS:` / `TABLES:` lines. `None` when neither line is present
/// or an index list does not parse.
pub fn parse_selection_reply(reply: &str) -> Option<IndexSelection> {
    let mut plots = None;
    let mut tables = None;
    for line in reply.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("PLOTS:") {
            plots = Some(parse_indices(rest, PLOT_CATALOG.len())?);
        } else if let Some(rest) = line.strip_prefix("TABLES:") {
            tables = Some(parse_indices(rest, TABLE_CATALOG.len())?);
        }
    }
    if plots.is_none() && tables.is_none() {
        return None;
    }
    Some(IndexSelection {
        plots: plots.unwrap_or_default(),
        tables: tables.unwrap_or_default(),
    })
}

pub async fn select_with_completion(
    question: &str,
    metric_key: Option<&str>,
    completion: &dyn CompletionService,
    config: &EngineConfig,
) -> ArtifactChoice {
    let prompt = selection_prompt(question, metric_key);
    let reply = with_timeout(
        "artifact selection",
        completion.call_budget(config.request_timeout()),
        completion.complete(&prompt),
    )
    .await;
    let selection = match reply {
        Ok(reply) => {
            debug!(reply = %reply, "artifact selector reply");
            let parsed = parse_selection_reply(&reply);
            if parsed.is_none() {
                warn!("artifact selector reply unparsable, using default artifacts");
            }
            parsed
        }
        Err(err) => {
            warn!(error = %err, "artifact selector call failed, using default artifacts");
            None
        }
    };
    match selection {
        Some(sel) => ArtifactChoice::from_indices(&sel.plots, &sel.tables),
        None => ArtifactChoice::from_indices(FALLBACK_PLOTS, FALLBACK_TABLES),
    }
}

fn artifact_key(config: &EngineConfig, run_id: &str, def: &ArtifactDef) -> String {
    match def.kind {
        ArtifactKind::Plot => config.plot_key(run_id, def.file),
        ArtifactKind::Table => config.table_key(run_id, def.file),
    }
}

pub async fn resolve_links(
    defs: &[ArtifactDef],
    run_id: &str,
    store: &dyn ObjectStore,
    config: &EngineConfig,
) -> Result<Vec<ArtifactLink>, StageError> {
    let mut links = Vec::with_capacity(defs.len());
    for def in defs {
        let key = artifact_key(config, run_id, def);
        let url = with_timeout(
            "artifact signing",
            config.request_timeout(),
            store.sign(&config.reports_bucket, &key, config.presign_ttl()),
        )
        .await
        .map_err(|e| StageError::capability(STAGE, e))?;
        links.push(ArtifactLink {
            label: def.label.to_string(),
            url: url.to_string(),
        });
    }
    Ok(links)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Header is the sorted union of all row keys; missing cells stay empty.
pub fn render_csv(rows: &[Row]) -> String {
    let columns: BTreeSet<&str> = rows
        .iter()
        .flat_map(|row| row.keys().map(|k| k.as_str()))
        .collect();
    let mut out = String::new();
    out.push_str(
        &columns
            .iter()
            .map(|c| csv_field(c))
            .collect::<Vec<_>>()
            .join(","),
    );
    out.push('\n');
    for row in rows {
        let line = columns
            .iter()
            .map(|c| row.get(*c).map(|v| csv_field(&v.to_string())).unwrap_or_default())
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out
}

pub async fn export_rows_csv(
    rows: &[Row],
    run_id: &str,
    store: &dyn ObjectStore,
    config: &EngineConfig,
) -> Result<ArtifactLink, StageError> {
    let key = config.export_key(run_id, &Uuid::new_v4().to_string());
    let body = render_csv(rows).into_bytes();
    let limit = config.request_timeout();
    with_timeout(
        "result export",
        limit,
        store.put(&config.artifact_bucket, &key, body, "text/csv"),
    )
    .await
    .map_err(|e| StageError::capability(STAGE, e))?;
    let url = with_timeout(
        "artifact signing",
        limit,
        store.sign(&config.artifact_bucket, &key, config.presign_ttl()),
    )
    .await
    .map_err(|e| StageError::capability(STAGE, e))?;
    debug!(key = %key, rows = rows.len(), "exported result table");
    Ok(ArtifactLink {
        label: RESULT_TABLE_LABEL.to_string(),
        url: url.to_string(),
    })
}

pub struct ArtifactRequest<'a> {
    pub run_id: &'a str,
    pub question: &'a str,
    pub metric_key: Option<&'a str>,
    pub rows: &'a [Row],
}

pub async fn run_artifact_stage(
    request: ArtifactRequest<'_>,
    config: &EngineConfig,
    store: &dyn ObjectStore,
    completion: &dyn CompletionService,
) -> Result<ArtifactSelection, StageError> {
    let choice = match config.artifact_selection {
        SelectorMode::Keyword => select_by_keyword(request.question, request.metric_key),
        SelectorMode::Completion => {
            select_with_completion(request.question, request.metric_key, completion, config)
                .await
        }
    };

    let plots = resolve_links(&choice.plots, request.run_id, store, config).await?;
    let mut tables = resolve_links(&choice.tables, request.run_id, store, config).await?;
    if config.export_result_table && !request.rows.is_empty() {
        tables.push(export_rows_csv(request.rows, request.run_id, store, config).await?);
    }
    Ok(ArtifactSelection { plots, tables })
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage5_artifacts.rs"]
mod tests;
