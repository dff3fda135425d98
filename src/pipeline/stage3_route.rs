use crate::model::intent::Intent;

pub const SAMPLE_KEYWORDS: &[&str] = &[
    "which sample",
    "failed",
    "flag",
    "low quality",
    "bad",
    "outlier",
];

pub const METRIC_KEYWORDS: &[&str] = &[
    "duplication",
    "duplicate",
    "umi",
    "complexity",
    "gc",
    "mapped",
    "align",
    "counts",
    "depth",
];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

/// True when the question asks to identify problematic samples.
pub fn mentions_sample_triage(question: &str) -> bool {
    contains_any(&question.to_lowercase(), SAMPLE_KEYWORDS)
}

/// Sample triage beats metric lookup; everything else, including "why" and
/// "explain" questions, goes to retrieval.
pub fn route_intent(question: &str) -> Intent {
    let q = question.to_lowercase();
    if contains_any(&q, SAMPLE_KEYWORDS) {
        Intent::LookupSamples
    } else if contains_any(&q, METRIC_KEYWORDS) {
        Intent::LookupMetric
    } else {
        Intent::Rag
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/pipeline/stage3_route.rs"]
mod tests;
