use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlagThresholds {
    pub max_duplication: f64,
    pub min_coverage: f64,
    pub flag_failed_modules: bool,
    pub duplication_tokens: Vec<String>,
    pub coverage_tokens: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsThresholds {
    pub outlier_z: f64,
    pub notable_ratio: f64,
}

impl FlagThresholds {
    pub fn default_v1() -> Self {
        Self {
            max_duplication: 0.7,
            min_coverage: 1_000_000.0,
            flag_failed_modules: true,
            duplication_tokens: vec!["dup".to_string()],
            coverage_tokens: [
                "mapped",
                "align",
                "total_sequences",
                "read_count",
                "unique_reads",
            ]
            .iter()
            .map(|t| t.to_string())
            .collect(),
        }
    }
}

impl Default for FlagThresholds {
    fn default() -> Self {
        Self::default_v1()
    }
}

impl StatsThresholds {
    // z > 2 is applied to every cohort size, including n < 5.
    pub fn default_v1() -> Self {
        Self {
            outlier_z: 2.0,
            notable_ratio: 2.0,
        }
    }
}

impl Default for StatsThresholds {
    fn default() -> Self {
        Self::default_v1()
    }
}
