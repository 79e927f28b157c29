//! Asset references.

use serde::{Deserialize, Serialize};
use vellum_storage::StoredBlob;

/// Pointer from a record to one stored blob.
///
/// `key` is authoritative; `url` is a cached accessor derived from it.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, derive_getters::Getters,
)]
pub struct AssetReference {
    /// Blob store key
    key: String,
    /// Public URL of the blob
    url: String,
}

impl AssetReference {
    /// Create a reference from its parts.
    pub fn new(key: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
        }
    }
}

impl From<StoredBlob> for AssetReference {
    fn from(blob: StoredBlob) -> Self {
        let (key, url) = (blob.key().clone(), blob.url().clone());
        Self { key, url }
    }
}
