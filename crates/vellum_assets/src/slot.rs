//! Single-reference asset slots.
//!
//! A slot is a `<name>_key` / `<name>_url` field pair on a record holding at
//! most one live reference (a logo, a cover photo, an avatar).

use crate::cleanup::remove_detached;
use crate::owner::owned_entity;
use crate::{
    AssetReference, KeyDeriver, LegacyKeyParser, SlotOutcome, SlotRemoveOutcome, UploadPolicy,
    slot_fields, slot_reference,
};
use serde_json::Value;
use std::sync::Arc;
use vellum_error::{AssetError, AssetErrorKind, AssetResult, MetadataResult};
use vellum_records::{Fields, MetadataStore};
use vellum_storage::BlobStore;

/// Owns the replace/remove lifecycle of named slots.
///
/// Store clients are passed in explicitly; a manager holds no other shared
/// state and can be cloned cheaply.
#[derive(Clone)]
pub struct SlotManager {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn MetadataStore>,
    policy: UploadPolicy,
    legacy: LegacyKeyParser,
}

impl SlotManager {
    /// Create a manager with the default upload policy.
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            records,
            policy: UploadPolicy::default(),
            legacy: LegacyKeyParser::default(),
        }
    }

    /// Replace the upload policy.
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the parser used for URL-only legacy slots.
    pub fn with_legacy_parser(mut self, legacy: LegacyKeyParser) -> Self {
        self.legacy = legacy;
        self
    }

    /// Read the live reference of a slot from the metadata store.
    pub async fn current(&self, record_id: &str, slot: &str) -> MetadataResult<Option<AssetReference>> {
        let entity = self.records.get_entity(record_id).await?;
        let blobs = &self.blobs;
        Ok(slot_reference(
            entity.fields(),
            slot,
            &self.legacy,
            &|key: &str| blobs.public_url(key),
        ))
    }

    /// Upload new content into a slot and retire the previous blob.
    ///
    /// Steps run strictly in order: validate, upload, commit the new
    /// reference, then delete `current` if its key differs from the new one.
    ///
    /// # Errors
    ///
    /// - `Validation` before any blob I/O, including a record that does not
    ///   exist or is owned by someone other than `owner_id`
    /// - `Upload` if the blob write fails; the record is untouched
    /// - `Commit` if the metadata update fails; the new blob is orphaned
    ///   unless it overwrote the live key in place
    ///
    /// A failed delete of the old blob is not an error; it is reported in
    /// [`SlotOutcome::warning`].
    #[tracing::instrument(
        skip(self, data, current),
        fields(size = data.len(), current = current.map(|r| r.key().as_str()))
    )]
    pub async fn replace(
        &self,
        owner_id: &str,
        record_id: &str,
        slot: &str,
        data: &[u8],
        content_type: &str,
        current: Option<&AssetReference>,
    ) -> AssetResult<SlotOutcome> {
        self.policy.check(slot, data, content_type)?;
        let key = KeyDeriver::slot_key(owner_id, record_id, slot, content_type)?;
        owned_entity(self.records.as_ref(), owner_id, record_id).await?;

        let stored = self.blobs.put(&key, data, content_type).await.map_err(|e| {
            AssetError::new(AssetErrorKind::Upload {
                key: key.clone(),
                reason: e.to_string(),
            })
        })?;
        let reference = AssetReference::from(stored);

        let (key_field, url_field) = slot_fields(slot);
        let mut patch = Fields::new();
        patch.insert(key_field, Value::String(reference.key().clone()));
        patch.insert(url_field, Value::String(reference.url().clone()));

        let overwrote_live = current.is_some_and(|c| c.key() == reference.key());

        if let Err(e) = self.records.update_entity(record_id, patch, None).await {
            let orphaned_keys = if overwrote_live {
                Vec::new()
            } else {
                tracing::warn!(key = %reference.key(), record_id, error = %e, "Orphaned blob: slot commit failed");
                vec![reference.key().clone()]
            };
            return Err(AssetError::new(AssetErrorKind::Commit {
                record_id: record_id.to_string(),
                orphaned_keys,
                reason: e.to_string(),
            }));
        }

        tracing::info!(key = %reference.key(), record_id, slot, "Committed slot reference");

        let detached = current
            .filter(|c| c.key() != reference.key())
            .map(|c| vec![c.key().clone()])
            .unwrap_or_default();
        let warning = remove_detached(self.blobs.as_ref(), owner_id, record_id, detached).await;

        Ok(SlotOutcome { reference, warning })
    }

    /// Clear a slot and delete the blob it referenced.
    ///
    /// Both fields are cleared in one metadata update; the blob is deleted
    /// only after that update succeeds. With `current = None` the fields are
    /// still cleared and no blob is touched.
    ///
    /// # Errors
    ///
    /// Returns `Validation` if `owner_id` does not own the record, and
    /// `Commit` if the metadata update fails; nothing is deleted.
    #[tracing::instrument(skip(self, current), fields(current = current.map(|r| r.key().as_str())))]
    pub async fn remove(
        &self,
        owner_id: &str,
        record_id: &str,
        slot: &str,
        current: Option<&AssetReference>,
    ) -> AssetResult<SlotRemoveOutcome> {
        KeyDeriver::record_prefix(owner_id, record_id)?;
        KeyDeriver::validate_segment("slot name", slot)?;
        owned_entity(self.records.as_ref(), owner_id, record_id).await?;

        let (key_field, url_field) = slot_fields(slot);
        let mut patch = Fields::new();
        patch.insert(key_field, Value::Null);
        patch.insert(url_field, Value::Null);

        self.records
            .update_entity(record_id, patch, None)
            .await
            .map_err(|e| {
                AssetError::new(AssetErrorKind::Commit {
                    record_id: record_id.to_string(),
                    orphaned_keys: Vec::new(),
                    reason: e.to_string(),
                })
            })?;

        tracing::info!(record_id, slot, "Cleared slot");

        let detached = current.map(|c| vec![c.key().clone()]).unwrap_or_default();
        let warning = remove_detached(self.blobs.as_ref(), owner_id, record_id, detached).await;

        Ok(SlotRemoveOutcome { warning })
    }
}
