//! Record ownership checks.

use vellum_error::{AssetError, AssetErrorKind, AssetResult};
use vellum_records::{Entity, MetadataStore};

/// Read a record and check that `owner_id` owns it.
///
/// Keys are namespaced by the owner the caller names, while the reconciler
/// collects references by the owner the record names; the two must agree.
pub(crate) async fn owned_entity(
    records: &dyn MetadataStore,
    owner_id: &str,
    record_id: &str,
) -> AssetResult<Entity> {
    let entity = match records.get_entity(record_id).await {
        Ok(entity) => entity,
        Err(e) if e.is_not_found() => {
            return Err(AssetError::validation(format!(
                "record {} does not exist",
                record_id
            )));
        }
        Err(e) => {
            return Err(AssetError::new(AssetErrorKind::Commit {
                record_id: record_id.to_string(),
                orphaned_keys: Vec::new(),
                reason: e.to_string(),
            }));
        }
    };

    if entity.owner_id() != owner_id {
        tracing::warn!(record_id, owner_id, "Record belongs to another owner");
        return Err(AssetError::validation(format!(
            "record {} is not owned by {}",
            record_id, owner_id
        )));
    }
    Ok(entity)
}
