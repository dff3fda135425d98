use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    High,
    Low,
}

impl Direction {
    pub fn comparative(&self) -> &'static str {
        match self {
            Direction::High => "higher",
            Direction::Low => "lower",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outlier {
    pub sample: String,
    pub value: f64,
    pub z_score: f64,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricStats {
    pub metric_key: String,
    pub mean: f64,
    pub stdev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
    pub outliers: Vec<Outlier>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub higher_sample: String,
    pub higher_value: f64,
    pub lower_sample: String,
    pub lower_value: f64,
    pub ratio: f64,
    pub difference: f64,
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
