//! Orphan sweeping.
//!
//! Every failure mode of the asset managers leaves at worst a blob nothing
//! references. The reconciler finds those blobs inside one owner's
//! namespace and deletes the ones old enough not to belong to an upload
//! whose commit is still in flight.

use crate::{AssetSchema, KeyDeriver, LegacyKeyParser, ReconcilerConfig};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use vellum_error::VellumResult;
use vellum_records::MetadataStore;
use vellum_storage::BlobStore;

/// Outcome of one reconciliation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, derive_getters::Getters)]
pub struct ReconcileReport {
    /// Owner whose namespace was scanned
    owner_id: String,
    /// Blobs found under the owner prefix
    scanned: usize,
    /// Distinct keys referenced by the owner's records
    referenced: usize,
    /// Unreferenced blobs older than the grace window
    orphans: Vec<String>,
    /// Orphans deleted by this pass
    deleted: Vec<String>,
    /// Orphans whose delete failed
    failed: Vec<String>,
    /// Unreferenced blobs still inside the grace window
    skipped_recent: Vec<String>,
    /// Whether deletes were suppressed
    dry_run: bool,
    /// Records holding a reference whose key could not be read
    blocked_by: Vec<String>,
}

impl ReconcileReport {
    /// True when unreadable references prevented any delete.
    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }
}

/// Deletes blobs no record references.
///
/// Assumes no record references a blob in another owner's namespace.
#[derive(Clone)]
pub struct Reconciler {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn MetadataStore>,
    schema: AssetSchema,
    legacy: LegacyKeyParser,
    grace: Duration,
    dry_run: bool,
}

impl Reconciler {
    /// Create a reconciler with the default schema and a one day grace window.
    pub fn new(blobs: Arc<dyn BlobStore>, records: Arc<dyn MetadataStore>) -> Self {
        Self {
            blobs,
            records,
            schema: AssetSchema::default(),
            legacy: LegacyKeyParser::default(),
            grace: Duration::days(1),
            dry_run: false,
        }
    }

    /// Which record fields hold references.
    pub fn with_schema(mut self, schema: AssetSchema) -> Self {
        self.schema = schema;
        self
    }

    /// Parser for URL-only references.
    pub fn with_legacy_parser(mut self, legacy: LegacyKeyParser) -> Self {
        self.legacy = legacy;
        self
    }

    /// Minimum age before an unreferenced blob may be deleted.
    pub fn with_grace_period(mut self, grace: Duration) -> Self {
        self.grace = grace;
        self
    }

    /// Report candidates without deleting them.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Apply the `[reconciler]` section.
    pub fn with_config(self, config: &ReconcilerConfig) -> Self {
        let secs = i64::try_from(*config.grace_period_secs()).unwrap_or(i64::MAX);
        self.with_grace_period(Duration::seconds(secs))
            .with_dry_run(*config.dry_run())
    }

    /// Sweep one owner's namespace.
    ///
    /// # Errors
    ///
    /// Fails if the owner id is not a valid key segment or either store
    /// cannot be listed. Individual delete failures are reported, not
    /// returned.
    ///
    /// When any of the owner's records holds a reference whose key cannot
    /// be recovered, orphans are reported but nothing is deleted; see
    /// [`ReconcileReport::blocked_by`].
    #[tracing::instrument(skip(self), fields(dry_run = self.dry_run))]
    pub async fn reconcile_owner(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> VellumResult<ReconcileReport> {
        let prefix = KeyDeriver::owner_prefix(owner_id)?;
        let blobs = self.blobs.list(&prefix).await?;
        let entities = self.records.list_entities(owner_id).await?;

        let mut referenced = BTreeSet::new();
        let mut blocked_by = Vec::new();
        for entity in &entities {
            let scan = self.schema.scan(entity.fields(), &self.legacy);
            if !scan.is_complete() {
                tracing::warn!(
                    record_id = %entity.id(),
                    unreadable = ?scan.unreadable,
                    "Record references blobs by unreadable URL, deletes suppressed for this owner"
                );
                blocked_by.push(entity.id().clone());
            }
            referenced.extend(scan.keys);
        }

        let cutoff = now - self.grace;
        let mut orphans = Vec::new();
        let mut skipped_recent = Vec::new();
        for blob in &blobs {
            if referenced.contains(blob.key()) {
                continue;
            }
            if *blob.last_modified() > cutoff {
                tracing::debug!(key = %blob.key(), "Unreferenced blob inside grace window");
                skipped_recent.push(blob.key().clone());
            } else {
                orphans.push(blob.key().clone());
            }
        }

        // Any orphan may be the blob behind an unreadable reference
        let (deleted, failed) = if self.dry_run || !blocked_by.is_empty() || orphans.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            let report = self.blobs.remove(&orphans).await;
            for key in &report.removed {
                tracing::info!(key = %key, owner_id, "Deleted orphaned blob");
            }
            for key in &report.failed_keys {
                tracing::warn!(key = %key, owner_id, "Failed to delete orphaned blob");
            }
            (report.removed, report.failed_keys)
        };

        tracing::info!(
            owner_id,
            scanned = blobs.len(),
            referenced = referenced.len(),
            orphans = orphans.len(),
            deleted = deleted.len(),
            skipped_recent = skipped_recent.len(),
            blocked = !blocked_by.is_empty(),
            "Reconciliation pass complete"
        );

        Ok(ReconcileReport {
            owner_id: owner_id.to_string(),
            scanned: blobs.len(),
            referenced: referenced.len(),
            orphans,
            deleted,
            failed,
            skipped_recent,
            dry_run: self.dry_run,
            blocked_by,
        })
    }
}
