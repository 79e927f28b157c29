//! Filesystem-based blob storage implementation.
//!
//! Keys map directly onto relative paths under a base directory, so the
//! tenant namespace of a key is also a directory on disk.

use crate::{BlobInfo, BlobStore, RemoveReport, StoredBlob, join_url, validate_key};
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vellum_error::{StorageError, StorageErrorKind, StorageResult};

const TEMP_SUFFIX: &str = ".tmp";

/// Whether `name` is an in-flight write of this store: `.{name}.{uuid}.tmp`.
fn is_temp_file(name: &str) -> bool {
    let Some(stem) = name
        .strip_prefix('.')
        .and_then(|n| n.strip_suffix(TEMP_SUFFIX))
    else {
        return false;
    };
    stem.rsplit_once('.')
        .is_some_and(|(_, id)| Uuid::parse_str(id).is_ok())
}

/// Filesystem blob store.
///
/// Stores blobs at `{base_path}/{key}`:
///
/// ```text
/// /var/vellum/blobs/
/// └── acme/
///     └── site-1/
///         ├── logo.png
///         ├── 1735689600000-front.jpg
///         └── 1735689600001-back.jpg
/// ```
///
/// # Features
///
/// - **Atomic writes**: content is written to a temp file and renamed into place
/// - **Tidy removal**: empty key directories are pruned after deletes
pub struct FileSystemBlobStore {
    base_path: PathBuf,
    public_base_url: String,
}

impl FileSystemBlobStore {
    /// Create a new filesystem blob store.
    ///
    /// Creates the base directory if it doesn't exist.
    ///
    /// # Arguments
    ///
    /// * `base_path` - Root directory for blob storage
    /// * `public_base_url` - URL prefix under which the base directory is served
    ///
    /// # Errors
    ///
    /// Returns error if the directory cannot be created.
    #[tracing::instrument(skip(base_path, public_base_url))]
    pub fn new(
        base_path: impl Into<PathBuf>,
        public_base_url: impl Into<String>,
    ) -> StorageResult<Self> {
        let base_path = base_path.into();

        std::fs::create_dir_all(&base_path).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                base_path.display(),
                e
            )))
        })?;

        tracing::info!(path = %base_path.display(), "Created filesystem blob store");
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into(),
        })
    }

    /// Root directory of the store.
    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn path_for(&self, key: &str) -> StorageResult<PathBuf> {
        validate_key(key)?;
        Ok(key
            .split('/')
            .fold(self.base_path.clone(), |path, segment| path.join(segment)))
    }

    fn key_for(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.base_path).ok()?;
        let segments: Vec<_> = relative
            .components()
            .map(|c| c.as_os_str().to_str().map(str::to_string))
            .collect::<Option<_>>()?;
        Some(segments.join("/"))
    }

    async fn remove_one(&self, key: &str) -> StorageResult<()> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(key, "Blob already absent");
                return Ok(());
            }
            Err(e) => {
                return Err(StorageError::new(StorageErrorKind::Delete(format!(
                    "{}: {}",
                    path.display(),
                    e
                ))));
            }
        }

        self.prune_empty_parents(&path).await;
        Ok(())
    }

    /// Remove now-empty directories between `path` and the base directory.
    async fn prune_empty_parents(&self, path: &Path) {
        let mut dir = path.parent();
        while let Some(current) = dir {
            if current == self.base_path || !current.starts_with(&self.base_path) {
                break;
            }
            // remove_dir refuses non-empty directories
            if tokio::fs::remove_dir(current).await.is_err() {
                break;
            }
            dir = current.parent();
        }
    }
}

#[async_trait::async_trait]
impl BlobStore for FileSystemBlobStore {
    fn backend_name(&self) -> &'static str {
        "filesystem"
    }

    #[tracing::instrument(skip(self, data), fields(size = data.len()))]
    async fn put(&self, key: &str, data: &[u8], content_type: &str) -> StorageResult<StoredBlob> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }

        // Write to temp file first, then rename for atomicity
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("blob");
        let temp_path = path.with_file_name(format!(".{}.{}{}", file_name, Uuid::new_v4(), TEMP_SUFFIX));

        tokio::fs::write(&temp_path, data).await.map_err(|e| {
            StorageError::new(StorageErrorKind::Write(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;

        if let Err(e) = tokio::fs::rename(&temp_path, &path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StorageError::new(StorageErrorKind::Write(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            ))));
        }

        tracing::info!(key, size = data.len(), content_type, "Stored blob");

        Ok(StoredBlob::new(
            key,
            self.public_url(key),
            data.len() as u64,
            content_type,
        ))
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, key: &str) -> StorageResult<Vec<u8>> {
        let path = self.path_for(key)?;

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(key.to_string()))
            } else {
                StorageError::new(StorageErrorKind::Read(format!(
                    "{}: {}",
                    path.display(),
                    e
                )))
            }
        })?;

        tracing::debug!(key, size = data.len(), "Read blob");
        Ok(data)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.path_for(key)?;
        Ok(tokio::fs::try_exists(&path).await.unwrap_or(false))
    }

    #[tracing::instrument(skip(self), fields(count = keys.len()))]
    async fn remove(&self, keys: &[String]) -> RemoveReport {
        let mut report = RemoveReport::default();

        for key in keys {
            match self.remove_one(key).await {
                Ok(()) => {
                    tracing::info!(key = %key, "Removed blob");
                    report.removed.push(key.clone());
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Failed to remove blob");
                    report.failed_keys.push(key.clone());
                }
            }
        }

        report
    }

    #[tracing::instrument(skip(self))]
    async fn list(&self, prefix: &str) -> StorageResult<Vec<BlobInfo>> {
        // Start at the deepest directory the prefix pins down
        let dir_part = match prefix.rfind('/') {
            Some(idx) => &prefix[..idx],
            None => "",
        };
        let start = if dir_part.is_empty() {
            self.base_path.clone()
        } else {
            self.path_for(dir_part)?
        };

        let mut blobs = Vec::new();
        let mut pending = vec![start];

        while let Some(dir) = pending.pop() {
            let mut entries = match tokio::fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(StorageError::new(StorageErrorKind::Read(format!(
                        "{}: {}",
                        dir.display(),
                        e
                    ))));
                }
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                StorageError::new(StorageErrorKind::Read(format!("{}: {}", dir.display(), e)))
            })? {
                let path = entry.path();
                let metadata = entry.metadata().await.map_err(|e| {
                    StorageError::new(StorageErrorKind::Read(format!(
                        "{}: {}",
                        path.display(),
                        e
                    )))
                })?;

                if metadata.is_dir() {
                    pending.push(path);
                    continue;
                }
                if path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(is_temp_file)
                {
                    continue;
                }

                let Some(key) = self.key_for(&path) else {
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let last_modified = metadata
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| Utc::now());
                blobs.push(BlobInfo::new(key, metadata.len(), last_modified));
            }
        }

        blobs.sort_by(|a, b| a.key().cmp(b.key()));
        tracing::debug!(prefix, count = blobs.len(), "Listed blobs");
        Ok(blobs)
    }

    fn public_url(&self, key: &str) -> String {
        join_url(&self.public_base_url, key)
    }
}
