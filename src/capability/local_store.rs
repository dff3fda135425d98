use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use url::Url;

use crate::capability::{CapabilityError, ObjectStore};

/// Object store backed by a directory tree: `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, CapabilityError> {
        let mut path = self.root.clone();
        for part in [bucket, key] {
            let rel = Path::new(part);
            if rel
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                return Err(CapabilityError::Storage(format!(
                    "invalid object path {bucket}/{key}"
                )));
            }
            path.push(rel);
        }
        Ok(path)
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn get(&self, bucket: &str, key: &str) -> Result<Vec<u8>, CapabilityError> {
        let path = self.object_path(bucket, key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CapabilityError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            }),
            Err(e) => Err(CapabilityError::Storage(format!(
                "read {}: {e}",
                path.display()
            ))),
        }
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), CapabilityError> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| CapabilityError::Storage(format!("mkdir {}: {e}", parent.display())))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| CapabilityError::Storage(format!("write {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), content_type, "stored object");
        Ok(())
    }

    async fn sign(&self, bucket: &str, key: &str, ttl: Duration) -> Result<Url, CapabilityError> {
        let path = self.object_path(bucket, key)?;
        let absolute = std::path::absolute(&path)
            .map_err(|e| CapabilityError::Storage(format!("resolve {}: {e}", path.display())))?;
        let mut url = Url::from_file_path(&absolute).map_err(|_| {
            CapabilityError::Storage(format!("cannot express {} as a URL", absolute.display()))
        })?;
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let expires = (now + ttl).as_secs();
        url.query_pairs_mut()
            .append_pair("expires", &expires.to_string());
        Ok(url)
    }
}

#[cfg(test)]
#[path = "../../tests/src_inline/capability/local_store.rs"]
mod tests;
