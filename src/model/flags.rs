#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFlag {
    HighDuplication,
    LowCoverage,
    FailedModules,
}

impl SampleFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            SampleFlag::HighDuplication => "high_duplication",
            SampleFlag::LowCoverage => "low_coverage",
            SampleFlag::FailedModules => "failed_modules",
        }
    }
}

pub fn flag_order() -> &'static [SampleFlag] {
    &[
        SampleFlag::HighDuplication,
        SampleFlag::LowCoverage,
        SampleFlag::FailedModules,
    ]
}
