use super::*;

use async_trait::async_trait;

use crate::capability::CapabilityError;
use crate::capability::tfidf::TfIdfIndex;

struct BrokenIndex;

#[async_trait]
impl SimilarityIndex for BrokenIndex {
    async fn top_k(&self, _query: &str, _k: usize) -> Result<Vec<Panel>, CapabilityError> {
        Err(CapabilityError::Embedding("index corrupted".to_string()))
    }

    fn len(&self) -> usize {
        1
    }
}

fn panels(n: usize) -> Vec<Panel> {
    (0..n)
        .map(|i| {
            Panel::new(
                "general_stats",
                Some(&format!("S{i}")),
                format!("Sample: S{i}\npercent_gc: {}", 40 + i),
            )
        })
        .collect()
}

#[tokio::test]
async fn test_no_index_returns_empty() {
    let got = retrieve_panels(None, "why", 4, Duration::from_secs(1))
        .await
        .unwrap();
    assert!(got.is_empty());
}

#[tokio::test]
async fn test_top_k_is_bounded() {
    let index = TfIdfIndex::build(&panels(6));
    let index: &dyn SimilarityIndex = &index;
    let got = retrieve_panels(Some(index), "percent gc of S2", 4, Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(got.len(), 4);
    assert_eq!(got[0].sample.as_deref(), Some("S2"));
}

#[tokio::test]
async fn test_search_failure_is_capability_error() {
    let index: &dyn SimilarityIndex = &BrokenIndex;
    let err = retrieve_panels(Some(index), "why", 4, Duration::from_secs(1))
        .await
        .unwrap_err();
    assert!(matches!(err, StageError::Capability { stage: "retrieve", .. }));
}
