//! Metadata store trait definition.

use crate::{Entity, Fields};
use vellum_error::MetadataResult;

/// Trait for record metadata backends.
///
/// Updates are atomic per record (no torn writes within one row) but there
/// is no transaction spanning the blob store.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Short backend name for logs (e.g. "memory", "json", "postgres").
    fn backend_name(&self) -> &'static str;

    /// Insert a new record at version 1.
    ///
    /// Returns `MetadataErrorKind::AlreadyExists` if the id is taken.
    async fn create_entity(&self, id: &str, owner_id: &str, fields: Fields)
    -> MetadataResult<Entity>;

    /// Read one record by id.
    async fn get_entity(&self, id: &str) -> MetadataResult<Entity>;

    /// Atomically apply a partial update to one record.
    ///
    /// # Arguments
    ///
    /// * `id` - Record id
    /// * `patch` - Fields to overwrite; `null` values remove the field
    /// * `expected_version` - When set, fail with `Conflict` unless the
    ///   stored version matches
    ///
    /// # Returns
    ///
    /// The record as stored after the update
    async fn update_entity(
        &self,
        id: &str,
        patch: Fields,
        expected_version: Option<u64>,
    ) -> MetadataResult<Entity>;

    /// Every record owned by `owner_id`, ordered by id.
    async fn list_entities(&self, owner_id: &str) -> MetadataResult<Vec<Entity>>;
}
