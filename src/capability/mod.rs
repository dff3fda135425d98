//! Narrow contracts for the external collaborators the engine depends on:
//! an object store, an embedding-backed similarity index and a text
//! completion service. Shipped implementations live in the submodules.

pub mod local_store;
pub mod openai;
pub mod tfidf;


use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::panels::Panel;

#[derive(Debug, Error)]
pub enum CapabilityError {
    #[error("object {bucket}/{key} not found")]
    NotFound { bucket: String, key: String },

    #[error("storage error: {0}")]
    Storage(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("completion service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },
}

impl CapabilityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, CapabilityError::NotFound { .. })
    }

    pub fn is_retryable(&self) -> bool {
        match self {
            CapabilityError::Timeout { .. } => true,
            CapabilityError::Http { status, .. } => *status == 429 || *status >= 500,
            CapabilityError::Completion(_) => true,
            _ => false,
        }
    }
}

#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CapabilityError>;

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CapabilityError>;

    /// Time-limited reference to an object. The object does not need to exist.
    async fn sign(&self, bucket: &str, key: &str, ttl: Duration) -> Result<Url, CapabilityError>;
}

#[async_trait]
pub trait EmbeddingIndexer: Send + Sync {
    async fn build(&self, panels: &[Panel]) -> Result<Box<dyn SimilarityIndex>, CapabilityError>;
}

#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    async fn top_k(&self, query: &str, k: usize) -> Result<Vec<Panel>, CapabilityError>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, CapabilityError>;

    /// Time one `complete` call may take, retries included, when each
    /// request is limited to `request_timeout`.
    fn call_budget(&self, request_timeout: Duration) -> Duration {
        request_timeout
    }
}

pub async fn with_timeout<T, F>(
    operation: &'static str,
    limit: Duration,
    call: F,
) -> Result<T, CapabilityError>
where
    F: Future<Output = Result<T, CapabilityError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(CapabilityError::Timeout {
            operation,
            secs: limit.as_secs(),
        }),
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/capability/tests.rs"]
mod tests;
