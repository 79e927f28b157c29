//! Ordered multi-reference asset collections.
//!
//! A collection is one array field on a record holding `{key, url}` entries,
//! unique by key, in insertion order unless explicitly reordered. The
//! metadata layer has no array-append primitive, so every change is a
//! whole-list write.

use crate::cleanup::remove_detached;
use crate::owner::owned_entity;
use crate::{
    AssetFile, AssetReference, CollectionAddOutcome, CollectionEntries, CollectionRemoveOutcome,
    FailedUpload, KeyDeriver, LegacyKeyParser, UploadPolicy, collection_entries,
};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use vellum_error::{AssetError, AssetErrorKind, AssetResult, MetadataResult};
use vellum_records::{Entity, Fields, MetadataStore};
use vellum_storage::BlobStore;

/// How whole-list commits deal with concurrent writers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, derive_more::Display,
)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// Write the caller's list plus the change, unconditionally.
    ///
    /// Two concurrent calls on one record race and the later write
    /// silently drops the earlier change. Nothing is corrupted.
    #[default]
    #[display("last_write_wins")]
    LastWriteWins,
    /// Re-read the stored list, apply the change to it and write
    /// conditioned on the version read, retrying on conflict.
    #[display("optimistic")]
    Optimistic,
}

/// Change applied to a collection at commit time.
///
/// Returns `None` when the list is already in the requested state.
type ListChange<'a> =
    dyn Fn(Vec<AssetReference>) -> AssetResult<Option<Vec<AssetReference>>> + Send + Sync + 'a;

/// Owns the add/remove/reorder lifecycle of collection fields.
#[derive(Clone)]
pub struct CollectionManager {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn MetadataStore>,
    keys: Arc<KeyDeriver>,
    policy: UploadPolicy,
    legacy: LegacyKeyParser,
    mode: ConcurrencyMode,
    max_attempts: u32,
}

impl CollectionManager {
    /// Create a manager in `LastWriteWins` mode with the default policy.
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            records,
            keys: Arc::new(KeyDeriver::new()),
            policy: UploadPolicy::default(),
            legacy: LegacyKeyParser::default(),
            mode: ConcurrencyMode::default(),
            max_attempts: 3,
        }
    }

    /// Replace the upload policy.
    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the parser used for legacy URL-only entries.
    pub fn with_legacy_parser(mut self, legacy: LegacyKeyParser) -> Self {
        self.legacy = legacy;
        self
    }

    /// Set the concurrency mode and the attempt budget for `Optimistic`.
    pub fn with_concurrency(mut self, mode: ConcurrencyMode, max_attempts: u32) -> Self {
        self.mode = mode;
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Read the stored references of a collection.
    pub async fn current(
        &self,
        record_id: &str,
        collection: &str,
    ) -> MetadataResult<Vec<AssetReference>> {
        let entity = self.records.get_entity(record_id).await?;
        Ok(self.parse(entity.fields(), collection).references)
    }

    fn parse(&self, fields: &Fields, collection: &str) -> CollectionEntries {
        let blobs = &self.blobs;
        collection_entries(fields, collection, &self.legacy, &|key: &str| {
            blobs.public_url(key)
        })
    }

    /// Upload files and append them to a collection.
    ///
    /// Every file is validated first and one bad file rejects the batch.
    /// Uploads then run concurrently. Files whose upload failed are reported
    /// in [`CollectionAddOutcome::failed`]; the rest are appended to
    /// `current` and committed with a single whole-list write.
    ///
    /// # Errors
    ///
    /// - `Validation` before any blob I/O, including a record that does not
    ///   exist or is owned by someone other than `owner_id`
    /// - `Upload` (the first failure) when no file uploaded at all
    /// - `Commit` when the list write fails; every uploaded key is orphaned
    ///   and a retry uploads fresh copies under new keys
    #[tracing::instrument(skip(self, files, current), fields(files = files.len(), current = current.len()))]
    pub async fn add(
        &self,
        owner_id: &str,
        record_id: &str,
        collection: &str,
        files: Vec<AssetFile>,
        current: &[AssetReference],
    ) -> AssetResult<CollectionAddOutcome> {
        KeyDeriver::record_prefix(owner_id, record_id)?;
        KeyDeriver::validate_segment("collection name", collection)?;
        if files.is_empty() {
            return Err(AssetError::validation("no files to add"));
        }
        for file in &files {
            self.policy
                .check(file.filename(), file.data(), file.content_type())?;
        }
        let loaded = owned_entity(self.records.as_ref(), owner_id, record_id).await?;

        let mut planned = Vec::with_capacity(files.len());
        for file in files {
            let key = self.keys.collection_key(
                owner_id,
                record_id,
                file.filename(),
                file.content_type(),
            )?;
            planned.push((key, file));
        }

        let results = join_all(planned.iter().map(|(key, file)| async move {
            self.blobs
                .put(key, file.data(), file.content_type())
                .await
                .map(AssetReference::from)
                .map_err(|e| {
                    AssetError::new(AssetErrorKind::Upload {
                        key: key.clone(),
                        reason: e.to_string(),
                    })
                })
        }))
        .await;

        let mut added = Vec::new();
        let mut failed = Vec::new();
        for ((key, file), result) in planned.into_iter().zip(results) {
            match result {
                Ok(reference) => added.push(reference),
                Err(error) => {
                    tracing::warn!(key = %key, filename = %file.filename(), error = %error, "Upload failed");
                    failed.push(FailedUpload {
                        filename: file.filename().clone(),
                        error,
                    });
                }
            }
        }

        if added.is_empty() {
            // Nothing to reference, leave the record alone
            return Err(match failed.into_iter().next() {
                Some(first) => first.error,
                None => AssetError::validation("no files uploaded"),
            });
        }

        let uploaded_keys: Vec<String> = added.iter().map(|r| r.key().clone()).collect();
        let additions = added.clone();
        let change = move |mut list: Vec<AssetReference>| -> AssetResult<Option<Vec<AssetReference>>> {
            let mut present: BTreeSet<String> = list.iter().map(|r| r.key().clone()).collect();
            for reference in &additions {
                if present.insert(reference.key().clone()) {
                    list.push(reference.clone());
                }
            }
            Ok(Some(list))
        };

        let list = self
            .commit(loaded, collection, current, &uploaded_keys, &change)
            .await?;

        tracing::info!(
            record_id,
            collection,
            added = added.len(),
            failed = failed.len(),
            "Committed collection additions"
        );

        Ok(CollectionAddOutcome {
            list,
            added,
            failed,
        })
    }

    /// Detach one reference from a collection and delete its blob.
    ///
    /// A target that is not in the list is a successful no-op: nothing is
    /// written and nothing is deleted.
    ///
    /// # Errors
    ///
    /// Returns `Commit` if the list write fails; nothing is deleted.
    #[tracing::instrument(skip(self, target, current), fields(target = %target.key(), current = current.len()))]
    pub async fn remove(
        &self,
        owner_id: &str,
        record_id: &str,
        collection: &str,
        target: &AssetReference,
        current: &[AssetReference],
    ) -> AssetResult<CollectionRemoveOutcome> {
        KeyDeriver::record_prefix(owner_id, record_id)?;
        KeyDeriver::validate_segment("collection name", collection)?;
        let loaded = owned_entity(self.records.as_ref(), owner_id, record_id).await?;

        let target_key = target.key().clone();
        let change = |list: Vec<AssetReference>| -> AssetResult<Option<Vec<AssetReference>>> {
            if !list.iter().any(|r| r.key() == &target_key) {
                return Ok(None);
            }
            Ok(Some(
                list.into_iter()
                    .filter(|r| r.key() != &target_key)
                    .collect(),
            ))
        };

        let before = current.len();
        let (list, changed) = self
            .commit_tracked(loaded, collection, current, &[], &change)
            .await?;

        if !changed {
            tracing::debug!(record_id, collection, key = %target_key, "Target not in collection, nothing to remove");
            return Ok(CollectionRemoveOutcome {
                list,
                removed: None,
                warning: None,
            });
        }

        tracing::info!(record_id, collection, key = %target_key, before, after = list.len(), "Detached collection entry");

        let warning =
            remove_detached(self.blobs.as_ref(), owner_id, record_id, vec![target_key]).await;

        Ok(CollectionRemoveOutcome {
            list,
            removed: Some(target.clone()),
            warning,
        })
    }

    /// Reorder a collection without touching any blob.
    ///
    /// # Errors
    ///
    /// - `Validation` unless `ordered_keys` is a permutation of the list's keys
    /// - `Commit` if the list write fails
    #[tracing::instrument(skip(self, ordered_keys, current), fields(keys = ordered_keys.len()))]
    pub async fn reorder(
        &self,
        owner_id: &str,
        record_id: &str,
        collection: &str,
        ordered_keys: &[String],
        current: &[AssetReference],
    ) -> AssetResult<Vec<AssetReference>> {
        KeyDeriver::record_prefix(owner_id, record_id)?;
        KeyDeriver::validate_segment("collection name", collection)?;
        let loaded = owned_entity(self.records.as_ref(), owner_id, record_id).await?;

        let change = |list: Vec<AssetReference>| -> AssetResult<Option<Vec<AssetReference>>> {
            let wanted: BTreeSet<&String> = ordered_keys.iter().collect();
            let have: BTreeSet<&String> = list.iter().map(|r| r.key()).collect();
            if wanted.len() != ordered_keys.len() || wanted != have {
                return Err(AssetError::validation(format!(
                    "reorder of {} must list each of its {} keys exactly once",
                    collection,
                    list.len()
                )));
            }
            if list.iter().map(|r| r.key()).eq(ordered_keys.iter()) {
                return Ok(None);
            }

            let mut reordered = Vec::with_capacity(list.len());
            for key in ordered_keys {
                if let Some(reference) = list.iter().find(|r| r.key() == key) {
                    reordered.push(reference.clone());
                }
            }
            Ok(Some(reordered))
        };

        let (list, _) = self
            .commit_tracked(loaded, collection, current, &[], &change)
            .await?;
        Ok(list)
    }

    async fn commit(
        &self,
        loaded: Entity,
        collection: &str,
        current: &[AssetReference],
        orphans_on_failure: &[String],
        change: &ListChange<'_>,
    ) -> AssetResult<Vec<AssetReference>> {
        self.commit_tracked(loaded, collection, current, orphans_on_failure, change)
            .await
            .map(|(list, _)| list)
    }

    /// Apply `change` and write the list; returns the list and whether a
    /// write happened.
    ///
    /// `loaded` is the record as read at the start of the operation.
    /// Entries without a readable key are written back where they were.
    async fn commit_tracked(
        &self,
        loaded: Entity,
        collection: &str,
        current: &[AssetReference],
        orphans_on_failure: &[String],
        change: &ListChange<'_>,
    ) -> AssetResult<(Vec<AssetReference>, bool)> {
        let record_id = loaded.id().clone();
        let commit_error = |reason: String| {
            for key in orphans_on_failure {
                tracing::warn!(key = %key, record_id = %record_id, "Orphaned blob: collection commit failed");
            }
            AssetError::new(AssetErrorKind::Commit {
                record_id: record_id.clone(),
                orphaned_keys: orphans_on_failure.to_vec(),
                reason,
            })
        };

        let write = |entries: &CollectionEntries, list: &[AssetReference]| {
            let mut patch = Fields::new();
            patch.insert(collection.to_string(), entries.value_with(list));
            patch
        };

        match self.mode {
            ConcurrencyMode::LastWriteWins => {
                let Some(list) = change(current.to_vec())? else {
                    return Ok((current.to_vec(), false));
                };
                let entries = self.parse(loaded.fields(), collection);
                self.records
                    .update_entity(&record_id, write(&entries, &list), None)
                    .await
                    .map_err(|e| commit_error(e.to_string()))?;
                Ok((list, true))
            }
            ConcurrencyMode::Optimistic => {
                let mut entity = loaded;
                for attempt in 1..=self.max_attempts {
                    if attempt > 1 {
                        entity = self
                            .records
                            .get_entity(&record_id)
                            .await
                            .map_err(|e| commit_error(e.to_string()))?;
                    }
                    let entries = self.parse(entity.fields(), collection);

                    let Some(list) = change(entries.references.clone())? else {
                        return Ok((entries.references, false));
                    };

                    match self
                        .records
                        .update_entity(&record_id, write(&entries, &list), Some(*entity.version()))
                        .await
                    {
                        Ok(_) => return Ok((list, true)),
                        Err(e) if e.is_conflict() => {
                            tracing::debug!(record_id = %record_id, attempt, "Collection write lost a race, retrying");
                        }
                        Err(e) => return Err(commit_error(e.to_string())),
                    }
                }
                Err(commit_error(format!(
                    "gave up after {} conflicting attempts",
                    self.max_attempts
                )))
            }
        }
    }
}
