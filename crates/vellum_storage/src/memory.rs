//! In-memory blob storage implementation.

use crate::{BlobInfo, BlobStore, RemoveReport, StoredBlob, join_url, validate_key};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use vellum_error::{StorageError, StorageErrorKind, StorageResult};

#[derive(Debug, Clone)]
struct MemoryBlob {
    data: Vec<u8>,
    last_modified: DateTime<Utc>,
}

/// Blob store kept entirely in process memory.
///
/// Useful for tests and for wiring the CLI without touching disk.
/// Content is lost when the store is dropped.
pub struct MemoryBlobStore {
    blobs: RwLock<BTreeMap<String, MemoryBlob>>,
    public_base_url: String,
}

impl MemoryBlobStore {
    /// Create an empty store serving URLs under `public_base_url`.
    pub fn new(public_base_url: impl Into<String>) -> Self {
        Self {
            blobs: RwLock::new(BTreeMap::new()),
            public_base_url: public_base_url.into(),
        }
    }

    /// Number of blobs currently stored.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Whether the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait::async_trait]
impl BlobStore for MemoryBlobStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<StoredBlob> {
        validate_key(key)?;

        self.blobs.write().await.insert(
            key.to_string(),
            MemoryBlob {
                data: data.to_vec(),
                last_modified: Utc::now(),
            },
        );

        tracing::debug!(key, "Stored blob in memory");
        Ok(StoredBlob::new(
            key,
            self.public_url(key),
            data.len() as u64,
            content_type,
        ))
    }

    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        validate_key(key)?;
        self.blobs
            .read()
            .await
            .get(key)
            .map(|blob| blob.data.clone())
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(key.to_string())))
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        validate_key(key)?;
        Ok(self.blobs.read().await.contains_key(key))
    }

    async fn remove(&self, keys: &[String]) -> RemoveReport {
        let mut report = RemoveReport::default();
        let mut blobs = self.blobs.write().await;

        for key in keys {
            if validate_key(key).is_err() {
                tracing::warn!(key = %key, "Refusing to remove invalid key");
                report.failed_keys.push(key.clone());
                continue;
            }
            blobs.remove(key);
            report.removed.push(key.clone());
        }

        report
    }

    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobInfo>> {
        Ok(self
            .blobs
            .read()
            .await
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, blob)| BlobInfo::new(key.clone(), blob.data.len() as u64, blob.last_modified))
            .collect())
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
