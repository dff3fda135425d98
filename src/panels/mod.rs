pub mod builder;

use serde::Serialize;

pub const GENERAL_STATS_MODULE: &str = "general_stats";
pub const STATUS_MODULE: &str = "fastqc_status";
pub const RAW_MODULE: &str = "multiqc_raw";
pub const RAW_DUMP_MAX_CHARS: usize = 10_000;

/// Text document used only for semantic retrieval. Built once per run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel {
    pub module: String,
    pub sample: Option<String>,
    pub content: String,
}

impl Panel {
    pub fn new(module: &str, sample: Option<&str>, content: String) -> Self {
        Self {
            module: module.to_string(),
            sample: sample.map(|s| s.to_string()),
            content,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/panels/tests.rs"]
mod tests;
