//! Best-effort deletion of detached blobs.
//!
//! Only ever called after the metadata commit that detached the keys.

use crate::{CleanupWarning, KeyDeriver};
use vellum_storage::{BlobStore, RemoveReport};

/// Delete blobs that a just-committed update stopped referencing.
///
/// Keys outside the record's own namespace are never deleted. Failures are
/// logged and returned as a warning instead of an error.
pub(crate) async fn remove_detached(
    blobs: &dyn BlobStore,
    owner_id: &str,
    record_id: &str,
    keys: Vec<String>,
) -> Option<CleanupWarning> {
    if keys.is_empty() {
        return None;
    }

    let (owned, foreign): (Vec<_>, Vec<_>) = keys
        .into_iter()
        .partition(|key| KeyDeriver::owns(owner_id, record_id, key));

    for key in &foreign {
        tracing::warn!(
            key = %key,
            owner_id,
            record_id,
            "Detached blob is outside the record namespace, leaving it in place"
        );
    }

    let report = if owned.is_empty() {
        RemoveReport::default()
    } else {
        blobs.remove(&owned).await
    };

    for key in &report.failed_keys {
        tracing::warn!(key = %key, record_id, "Orphaned blob: delete after commit failed");
    }

    let mut reasons = Vec::new();
    if !report.failed_keys.is_empty() {
        reasons.push(format!("{} delete(s) failed", report.failed_keys.len()));
    }
    if !foreign.is_empty() {
        reasons.push(format!("{} key(s) outside the record namespace", foreign.len()));
    }
    if reasons.is_empty() {
        return None;
    }

    let mut left_behind = report.failed_keys;
    left_behind.extend(foreign);
    Some(CleanupWarning {
        record_id: record_id.to_string(),
        keys: left_behind,
        reason: reasons.join(", "),
    })
}
