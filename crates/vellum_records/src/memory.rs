//! In-memory metadata store.

use crate::{Entity, Fields, MetadataStore};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use vellum_error::{MetadataError, MetadataErrorKind, MetadataResult};

/// Metadata store kept in process memory.
#[derive(Default)]
pub struct MemoryMetadataStore {
    entities: RwLock<BTreeMap<String, Entity>>,
}

impl MemoryMetadataStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl MetadataStore for MemoryMetadataStore {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create_entity(
        &self,
        id: &str,
        owner_id: &str,
        fields: Fields,
    ) -> MetadataResult<Entity> {
        let mut entities = self.entities.write().await;
        if entities.contains_key(id) {
            return Err(MetadataError::new(MetadataErrorKind::AlreadyExists(
                id.to_string(),
            )));
        }

        let entity = Entity::new(id, owner_id, fields);
        entities.insert(id.to_string(), entity.clone());
        Ok(entity)
    }

    async fn get_entity(&self, id: &str) -> MetadataResult<Entity> {
        self.entities
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| MetadataError::new(MetadataErrorKind::NotFound(id.to_string())))
    }

    #[tracing::instrument(skip(self, patch), fields(fields = patch.len()))]
    async fn update_entity(
        &self,
        id: &str,
        patch: Fields,
        expected_version: Option<u64>,
    ) -> MetadataResult<Entity> {
        let mut entities = self.entities.write().await;
        let entity = entities
            .get_mut(id)
            .ok_or_else(|| MetadataError::new(MetadataErrorKind::NotFound(id.to_string())))?;

        entity.apply(patch, expected_version)?;
        tracing::debug!(id, version = *entity.version(), "Updated record");
        Ok(entity.clone())
    }

    async fn list_entities(&self, owner_id: &str) -> MetadataResult<Vec<Entity>> {
        Ok(self
            .entities
            .read()
            .await
            .values()
            .filter(|e| e.owner_id() == owner_id)
            .cloned()
            .collect())
    }
}
