use super::*;

#[test]
fn test_missing_report_is_data_unavailable() {
    let err = InsightError::from(StageError::from(ReportError::Missing {
        bucket: "reports".to_string(),
        key: "r/x.json".to_string(),
    }));
    assert_eq!(err.kind, FailureKind::DataUnavailable);
    assert!(err.message.contains("r/x.json"));
}

#[test]
fn test_store_outage_while_loading_is_capability_failure() {
    let err = InsightError::from(StageError::from(ReportError::Capability(
        CapabilityError::Storage("disk offline".to_string()),
    )));
    assert_eq!(err.kind, FailureKind::ExternalCapabilityFailure);
}

#[test]
fn test_stage_capability_failure() {
    let err = InsightError::from(StageError::capability(
        "synthesize",
        CapabilityError::Timeout {
            operation: "answer completion",
            secs: 60,
        },
    ));
    assert_eq!(err.kind, FailureKind::ExternalCapabilityFailure);
    assert!(err.message.starts_with("synthesize failed"));
}

#[test]
fn test_unexpected_and_cancelled() {
    let err = InsightError::from(StageError::Unexpected("boom".to_string()));
    assert_eq!(err.kind, FailureKind::UnexpectedFailure);
    assert_eq!(err.to_string(), "unexpected_failure: boom");
    let err = InsightError::from(StageError::Cancelled);
    assert_eq!(err.kind, FailureKind::UnexpectedFailure);
}

#[test]
fn test_failure_kind_serializes_snake_case() {
    let json = serde_json::to_string(&FailureKind::ExternalCapabilityFailure).unwrap();
    assert_eq!(json, "\"external_capability_failure\"");
}
