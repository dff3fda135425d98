use serde::Serialize;

/// Analysis branch chosen once per invocation by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    LookupSamples,
    LookupMetric,
    Rag,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::LookupSamples => "lookup_samples",
            Intent::LookupMetric => "lookup_metric",
            Intent::Rag => "rag",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
