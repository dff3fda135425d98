use super::*;

#[test]
fn test_sample_tier() {
    for q in [
        "Which sample looks worst?",
        "Did anything fail? which ones FAILED",
        "flag problematic libraries",
        "any low quality runs",
        "is S3 bad",
        "show outliers",
    ] {
        assert_eq!(route_intent(q), Intent::LookupSamples, "{q}");
    }
}

#[test]
fn test_failed_beats_metric_keywords() {
    for q in [
        "which samples failed duplication checks",
        "failed gc content and mapped reads",
        "UMI counts failed?",
    ] {
        assert_eq!(route_intent(q), Intent::LookupSamples, "{q}");
    }
}

#[test]
fn test_metric_tier() {
    for q in [
        "what is the gc content",
        "Duplication rate per library",
        "how many reads mapped",
        "library complexity",
        "sequencing depth",
    ] {
        assert_eq!(route_intent(q), Intent::LookupMetric, "{q}");
    }
}

#[test]
fn test_default_is_rag() {
    for q in ["why is this run slow?", "explain the report", "recommend next steps", ""] {
        assert_eq!(route_intent(q), Intent::Rag, "{q}");
    }
}

#[test]
fn test_triage_detection_is_case_insensitive() {
    assert!(mentions_sample_triage("WHICH SAMPLE"));
    assert!(!mentions_sample_triage("what is the gc content"));
}
