use super::*;

use crate::capability::testing::{MemoryStore, StalledCompletion};

#[test]
fn test_retryable_classification() {
    assert!(
        CapabilityError::Http {
            status: 429,
            message: String::new()
        }
        .is_retryable()
    );
    assert!(
        CapabilityError::Http {
            status: 502,
            message: String::new()
        }
        .is_retryable()
    );
    assert!(
        !CapabilityError::Http {
            status: 401,
            message: String::new()
        }
        .is_retryable()
    );
    assert!(
        !CapabilityError::NotFound {
            bucket: "b".to_string(),
            key: "k".to_string()
        }
        .is_retryable()
    );
}

#[tokio::test]
async fn test_with_timeout_passes_result_through() {
    let store = MemoryStore::new();
    store.insert("b", "k", b"hello".to_vec());
    let bytes = with_timeout("get", Duration::from_secs(1), store.get("b", "k"))
        .await
        .unwrap();
    assert_eq!(bytes, b"hello");

    let err = with_timeout("get", Duration::from_secs(1), store.get("b", "missing"))
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_with_timeout_expires() {
    let err = with_timeout(
        "completion",
        Duration::from_millis(20),
        StalledCompletion.complete("hi"),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        CapabilityError::Timeout {
            operation: "completion",
            ..
        }
    ));
}

#[test]
fn test_default_call_budget_is_request_timeout() {
    let completion = StalledCompletion;
    assert_eq!(
        completion.call_budget(Duration::from_secs(7)),
        Duration::from_secs(7)
    );
}
