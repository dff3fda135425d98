use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::thresholds::FlagThresholds;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SelectorMode {
    /// Static keyword table.
    Keyword,
    /// Catalog indices chosen by the completion service.
    #[default]
    Completion,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub reports_bucket: String,
    pub artifact_bucket: String,
    pub report_prefix: String,
    pub presign_ttl_secs: u64,
    pub request_timeout_secs: u64,
    pub history_limit: usize,
    pub history_in_prompt: usize,
    pub retrieval_k: usize,
    pub retrieve_for_all_intents: bool,
    pub artifact_selection: SelectorMode,
    pub export_result_table: bool,
    pub status_sections: Vec<String>,
    pub stream_buffer: usize,
    pub thresholds: FlagThresholds,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reports_bucket: "reports".to_string(),
            artifact_bucket: "artifacts".to_string(),
            report_prefix: "pubdir/multiqc".to_string(),
            presign_ttl_secs: 3600,
            request_timeout_secs: 60,
            history_limit: 10,
            history_in_prompt: 6,
            retrieval_k: 4,
            retrieve_for_all_intents: false,
            artifact_selection: SelectorMode::Completion,
            export_result_table: true,
            status_sections: vec!["multiqc_fastqc".to_string()],
            stream_buffer: 16,
            thresholds: FlagThresholds::default_v1(),
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn presign_ttl(&self) -> Duration {
        Duration::from_secs(self.presign_ttl_secs)
    }

    fn run_prefix(&self, run_id: &str) -> String {
        let prefix = self.report_prefix.trim_matches('/');
        if prefix.is_empty() {
            run_id.to_string()
        } else {
            format!("{run_id}/{prefix}")
        }
    }

    pub fn report_key(&self, run_id: &str) -> String {
        format!("{}/multiqc_data/multiqc_data.json", self.run_prefix(run_id))
    }

    pub fn plot_key(&self, run_id: &str, file: &str) -> String {
        format!("{}/multiqc_plots/png/{file}", self.run_prefix(run_id))
    }

    pub fn table_key(&self, run_id: &str, file: &str) -> String {
        format!("{}/multiqc_data/{file}", self.run_prefix(run_id))
    }

    pub fn export_key(&self, run_id: &str, name: &str) -> String {
        format!("{run_id}/artifacts/{name}.csv")
    }
}

#[cfg(test)]
#[path = "../tests/src_inline/config.rs"]
mod tests;
