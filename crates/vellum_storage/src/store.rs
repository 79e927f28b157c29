//! Blob store trait definition.

use crate::{BlobInfo, RemoveReport, StoredBlob};
use vellum_error::StorageResult;

/// Trait for pluggable blob storage backends.
///
/// A blob store is an opaque key/value store with publicly readable
/// content. It offers no transactions and knows nothing about who
/// references a blob; consistency with metadata is the caller's job.
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend name for logs (e.g. "filesystem", "memory").
    fn backend_name(&self) -> &'static str;

    /// Store content under `key`, overwriting any existing blob.
    ///
    /// # Arguments
    ///
    /// * `key` - Destination key
    /// * `data` - Raw content
    /// * `content_type` - Declared MIME type
    ///
    /// # Returns
    ///
    /// The stored key together with its public URL
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<StoredBlob>;

    /// Read the content stored under `key`.
    ///
    /// Returns `StorageErrorKind::NotFound` when no blob exists.
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Check whether a blob exists.
    async fn exists(&self, key: &str) -> StorageResult<bool>;

    /// Remove a batch of blobs.
    ///
    /// Never fails as a whole; per-key failures are reported in the
    /// returned [`RemoveReport`]. Missing keys count as removed.
    async fn remove(&self, keys: &[String]) -> RemoveReport;

    /// List every blob whose key starts with `prefix`.
    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobInfo>>;

    /// Public URL for `key`. Pure derivation, no I/O.
    fn public_url(&self, key: &str) -> String;
}
