use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Plot,
    Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArtifactDef {
    pub kind: ArtifactKind,
    pub file: &'static str,
    pub label: &'static str,
}

const fn plot(file: &'static str, label: &'static str) -> ArtifactDef {
    ArtifactDef {
        kind: ArtifactKind::Plot,
        file,
        label,
    }
}

const fn table(file: &'static str, label: &'static str) -> ArtifactDef {
    ArtifactDef {
        kind: ArtifactKind::Table,
        file,
        label,
    }
}

// Indices are stable: the completion-assisted selector refers to entries by position.
pub const PLOT_CATALOG: &[ArtifactDef] = &[
    plot(
        "mqc_fastqc_sequence_duplication_levels_plot_1.png",
        "Sequence Duplication Levels",
    ),
    plot(
        "mqc_fastqc_per_base_sequence_quality_plot_1.png",
        "Per Base Sequence Quality",
    ),
    plot(
        "mqc_fastqc_per_sequence_quality_scores_plot_1.png",
        "Per Sequence Quality Scores",
    ),
    plot(
        "mqc_fastqc_per_sequence_gc_content_plot_Percentages.png",
        "Per Sequence GC Content",
    ),
    plot("mqc_fastqc_per_base_n_content_plot_1.png", "Per Base N Content"),
    plot("mqc_fastqc_sequence_counts_plot_1.png", "Sequence Counts"),
    plot("mqc_fastqc_adapter_content_plot_1.png", "Adapter Content"),
    plot(
        "mqc_fastqc_per_base_sequence_content_plot_1.png",
        "Per Base Sequence Content (heatmap)",
    ),
    plot(
        "mqc_fastqc_sequence_length_distribution_plot_1.png",
        "Sequence Length Distribution",
    ),
];

pub const TABLE_CATALOG: &[ArtifactDef] = &[
    table(
        "mqc_fastqc_sequence_duplication_levels_plot_1.txt",
        "Sequence Duplication Levels Data",
    ),
    table(
        "mqc_fastqc_per_base_sequence_quality_plot_1.txt",
        "Per Base Sequence Quality Data",
    ),
    table(
        "mqc_fastqc_per_sequence_quality_scores_plot_1.txt",
        "Per Sequence Quality Scores Data",
    ),
    table(
        "mqc_fastqc_per_sequence_gc_content_plot_Percentages.txt",
        "Per Sequence GC Content Data (Percentages)",
    ),
    table(
        "mqc_fastqc_per_sequence_gc_content_plot_Counts.txt",
        "Per Sequence GC Content Data (Counts)",
    ),
    table(
        "mqc_fastqc_per_base_n_content_plot_1.txt",
        "Per Base N Content Data",
    ),
    table(
        "mqc_fastqc_sequence_counts_plot_1.txt",
        "Sequence Counts Data",
    ),
];

pub const GENERAL_STATS_TABLE: ArtifactDef =
    table("multiqc_general_stats.txt", "General Statistics (all samples)");

pub const RESULT_TABLE_LABEL: &str = "Analysis Results (CSV)";

pub fn catalog(kind: ArtifactKind) -> &'static [ArtifactDef] {
    match kind {
        ArtifactKind::Plot => PLOT_CATALOG,
        ArtifactKind::Table => TABLE_CATALOG,
    }
}

/// Catalog entries picked for a run, before reference resolution.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArtifactChoice {
    pub plots: Vec<ArtifactDef>,
    pub tables: Vec<ArtifactDef>,
}

impl ArtifactChoice {
    pub fn from_indices(plot_indices: &[usize], table_indices: &[usize]) -> Self {
        Self {
            plots: plot_indices
                .iter()
                .filter_map(|&i| PLOT_CATALOG.get(i).copied())
                .collect(),
            tables: table_indices
                .iter()
                .filter_map(|&i| TABLE_CATALOG.get(i).copied())
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ArtifactSelection {
    pub plots: Vec<ArtifactLink>,
    pub tables: Vec<ArtifactLink>,
}

impl ArtifactSelection {
    pub fn is_empty(&self) -> bool {
        self.plots.is_empty() && self.tables.is_empty()
    }
}
