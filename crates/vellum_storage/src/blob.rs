//! Values returned by blob stores.

use chrono::{DateTime, Utc};

/// A blob that was just written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct StoredBlob {
    /// Key the content is stored under
    key: String,
    /// Public URL derived from the key
    url: String,
    /// Size of the content in bytes
    size_bytes: u64,
    /// Declared MIME type
    content_type: String,
}

impl StoredBlob {
    /// Create a new stored blob description.
    pub fn new(
        key: impl Into<String>,
        url: impl Into<String>,
        size_bytes: u64,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            url: url.into(),
            size_bytes,
            content_type: content_type.into(),
        }
    }
}

/// A blob found while listing a namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_getters::Getters)]
pub struct BlobInfo {
    /// Key of the blob
    key: String,
    /// Size of the content in bytes
    size_bytes: u64,
    /// Last write time
    last_modified: DateTime<Utc>,
}

impl BlobInfo {
    /// Create a new listing entry.
    pub fn new(key: impl Into<String>, size_bytes: u64, last_modified: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            size_bytes,
            last_modified,
        }
    }
}

/// Outcome of a batch removal.
///
/// Removal never fails as a whole. Keys that did not exist count as
/// removed, so removing the same key twice is harmless.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoveReport {
    /// Keys that no longer exist in the store
    pub removed: Vec<String>,
    /// Keys that could not be removed
    pub failed_keys: Vec<String>,
}

impl RemoveReport {
    /// True when every requested key is gone.
    pub fn is_complete(&self) -> bool {
        self.failed_keys.is_empty()
    }
}
