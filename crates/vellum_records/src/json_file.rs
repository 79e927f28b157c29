//! JSON-file metadata store.
//!
//! One pretty-printed JSON document per record at `{dir}/{id}.json`.
//! Writes go through a temp file and a rename, and a process-wide lock
//! serializes read-modify-write cycles so updates stay atomic per record.

use crate::{Entity, Fields, MetadataStore};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use vellum_error::{MetadataError, MetadataErrorKind, MetadataResult};

/// Metadata store persisting each record as a JSON file.
pub struct JsonFileMetadataStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileMetadataStore {
    /// Open (and create if needed) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    #[tracing::instrument(skip(dir))]
    pub fn new(dir: impl Into<PathBuf>) -> MetadataResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            MetadataError::new(MetadataErrorKind::Io(format!("{}: {}", dir.display(), e)))
        })?;

        tracing::info!(path = %dir.display(), "Opened JSON metadata store");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Directory holding the record files.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, id: &str) -> MetadataResult<PathBuf> {
        let valid = !id.is_empty()
            && !id.starts_with('.')
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(MetadataError::new(MetadataErrorKind::InvalidId(
                id.to_string(),
            )));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }

    async fn read(&self, id: &str) -> MetadataResult<Entity> {
        let path = self.path_for(id)?;
        let raw = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                MetadataError::new(MetadataErrorKind::NotFound(id.to_string()))
            } else {
                MetadataError::new(MetadataErrorKind::Io(format!("{}: {}", path.display(), e)))
            }
        })?;

        serde_json::from_slice(&raw).map_err(|e| {
            MetadataError::new(MetadataErrorKind::Serialization(format!(
                "{}: {}",
                path.display(),
                e
            )))
        })
    }

    async fn write(&self, entity: &Entity) -> MetadataResult<()> {
        let path = self.path_for(entity.id())?;
        let raw = serde_json::to_vec_pretty(entity).map_err(|e| {
            MetadataError::new(MetadataErrorKind::Serialization(e.to_string()))
        })?;

        let temp_path = path.with_extension("json.tmp");
        tokio::fs::write(&temp_path, &raw).await.map_err(|e| {
            MetadataError::new(MetadataErrorKind::Io(format!(
                "{}: {}",
                temp_path.display(),
                e
            )))
        })?;
        tokio::fs::rename(&temp_path, &path).await.map_err(|e| {
            MetadataError::new(MetadataErrorKind::Io(format!(
                "rename {} to {}: {}",
                temp_path.display(),
                path.display(),
                e
            )))
        })
    }
}

#[async_trait::async_trait]
impl MetadataStore for JsonFileMetadataStore {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    #[tracing::instrument(skip(self, fields))]
    async fn create_entity(
        &self,
        id: &str,
        owner_id: &str,
        fields: Fields,
    ) -> MetadataResult<Entity> {
        let _guard = self.write_lock.lock().await;

        let path = self.path_for(id)?;
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(MetadataError::new(MetadataErrorKind::AlreadyExists(
                id.to_string(),
            )));
        }

        let entity = Entity::new(id, owner_id, fields);
        self.write(&entity).await?;
        tracing::info!(id, owner_id, "Created record");
        Ok(entity)
    }

    async fn get_entity(&self, id: &str) -> MetadataResult<Entity> {
        self.read(id).await
    }

    #[tracing::instrument(skip(self, patch), fields(fields = patch.len()))]
    async fn update_entity(
        &self,
        id: &str,
        patch: Fields,
        expected_version: Option<u64>,
    ) -> MetadataResult<Entity> {
        let _guard = self.write_lock.lock().await;

        let mut entity = self.read(id).await?;
        entity.apply(patch, expected_version)?;
        self.write(&entity).await?;

        tracing::debug!(id, version = *entity.version(), "Updated record");
        Ok(entity)
    }

    #[tracing::instrument(skip(self))]
    async fn list_entities(&self, owner_id: &str) -> MetadataResult<Vec<Entity>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            MetadataError::new(MetadataErrorKind::Io(format!(
                "{}: {}",
                self.dir.display(),
                e
            )))
        })?;

        let mut entities = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| MetadataError::new(MetadataErrorKind::Io(e.to_string())))?
        {
            let file_name = entry.file_name();
            let Some(id) = file_name.to_str().and_then(|n| n.strip_suffix(".json")) else {
                continue;
            };
            let entity = match self.read(id).await {
                Ok(entity) => entity,
                Err(e) => {
                    tracing::warn!(file = %entry.path().display(), error = %e, "Skipping unreadable record file");
                    continue;
                }
            };
            if entity.owner_id() == owner_id {
                entities.push(entity);
            }
        }

        entities.sort_by(|a, b| a.id().cmp(b.id()));
        Ok(entities)
    }
}
