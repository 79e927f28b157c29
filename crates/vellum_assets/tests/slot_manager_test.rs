//! Slot replace/remove lifecycle against fault-injecting stores.

mod common;

use common::{BASE_URL, Harness, OWNER, RECORD, position};
use serde_json::json;
use vellum_assets::{AssetErrorKind, AssetReference, LegacyKeyParser, SlotManager, UploadPolicy};
use vellum_records::{MetadataStore, fields};
use vellum_storage::BlobStore;

fn manager(h: &Harness) -> SlotManager {
    SlotManager::new(h.blobs.clone(), h.records.clone())
}

#[tokio::test]
async fn replace_uploads_commits_and_returns_reference() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let outcome = slots
        .replace(OWNER, RECORD, "logo", b"png-bytes", "image/png", None)
        .await
        .unwrap();

    assert_eq!(outcome.reference.key(), "acme/site-1/logo.png");
    assert_eq!(outcome.reference.url(), "https://cdn.test/acme/site-1/logo.png");
    assert!(outcome.warning.is_none());

    let entity = h.entity().await;
    assert_eq!(entity.field("logo_key"), Some(&json!("acme/site-1/logo.png")));
    assert_eq!(
        entity.field("logo_url"),
        Some(&json!("https://cdn.test/acme/site-1/logo.png"))
    );
    assert_eq!(entity.field("name"), Some(&json!("Acme")));
}

#[tokio::test]
async fn replace_with_new_format_deletes_old_blob_after_commit() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let first = slots
        .replace(OWNER, RECORD, "logo", b"jpeg", "image/jpeg", None)
        .await
        .unwrap();
    h.clear_log();

    let second = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&first.reference))
        .await
        .unwrap();

    assert_eq!(second.reference.key(), "acme/site-1/logo.png");
    assert!(!h.blobs.exists("acme/site-1/logo.jpg").await.unwrap());
    assert!(h.blobs.exists("acme/site-1/logo.png").await.unwrap());

    let put = position(&h.log, "put:acme/site-1/logo.png");
    let update = position(&h.log, "update:site-1");
    let remove = position(&h.log, "remove:acme/site-1/logo.jpg");
    assert!(put < update && update < remove);
}

#[tokio::test]
async fn same_format_replace_overwrites_in_place() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let first = slots
        .replace(OWNER, RECORD, "logo", b"v1", "image/png", None)
        .await
        .unwrap();
    h.clear_log();
    slots
        .replace(OWNER, RECORD, "logo", b"v2", "image/png", Some(&first.reference))
        .await
        .unwrap();

    assert_eq!(h.blobs.get("acme/site-1/logo.png").await.unwrap(), b"v2");
    assert!(!common::ops(&h.log).iter().any(|op| op.starts_with("remove:")));
}

#[tokio::test]
async fn commit_failure_leaves_record_pointing_at_old_blob() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let old = slots
        .replace(OWNER, RECORD, "logo", b"jpeg", "image/jpeg", None)
        .await
        .unwrap();

    h.records.fail_updates(true);
    let err = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&old.reference))
        .await
        .unwrap_err();

    match &err.kind {
        AssetErrorKind::Commit { orphaned_keys, .. } => {
            assert_eq!(orphaned_keys, &vec!["acme/site-1/logo.png".to_string()]);
        }
        other => panic!("expected commit error, got {other:?}"),
    }
    assert!(err.kind.is_retryable());

    // Old reference still resolves
    let entity = h.entity().await;
    assert_eq!(entity.field("logo_key"), Some(&json!("acme/site-1/logo.jpg")));
    assert!(h.blobs.exists("acme/site-1/logo.jpg").await.unwrap());
}

#[tokio::test]
async fn commit_failure_over_live_key_reports_no_orphan() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let old = slots
        .replace(OWNER, RECORD, "logo", b"v1", "image/png", None)
        .await
        .unwrap();
    h.records.fail_updates(true);

    let err = slots
        .replace(OWNER, RECORD, "logo", b"v2", "image/png", Some(&old.reference))
        .await
        .unwrap_err();
    assert!(err.kind.orphaned_keys().is_empty());
    assert!(h.blobs.exists("acme/site-1/logo.png").await.unwrap());
}

#[tokio::test]
async fn upload_failure_touches_nothing() {
    let h = Harness::new().await;
    let slots = manager(&h);
    h.blobs.fail_all_puts(true);
    let before = h.entity().await;

    let err = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", None)
        .await
        .unwrap_err();

    assert!(matches!(err.kind, AssetErrorKind::Upload { .. }));
    assert_eq!(h.entity().await, before);
}

#[tokio::test]
async fn validation_failures_happen_before_io() {
    let h = Harness::new().await;
    let slots = manager(&h).with_policy(UploadPolicy::default().with_max_bytes(4));

    let too_big = slots
        .replace(OWNER, RECORD, "logo", b"12345", "image/png", None)
        .await
        .unwrap_err();
    let wrong_type = slots
        .replace(OWNER, RECORD, "logo", b"<p>", "text/html", None)
        .await
        .unwrap_err();
    let empty = slots
        .replace(OWNER, RECORD, "logo", b"", "image/png", None)
        .await
        .unwrap_err();
    let traversal = slots
        .replace(OWNER, "../other", "logo", b"ok", "image/png", None)
        .await
        .unwrap_err();

    for err in [too_big, wrong_type, empty, traversal] {
        assert!(matches!(err.kind, AssetErrorKind::Validation(_)), "{err}");
        assert!(!err.kind.is_retryable());
    }
    assert!(common::ops(&h.log).is_empty());
}

#[tokio::test]
async fn cleanup_failure_is_a_warning_not_an_error() {
    let h = Harness::new().await;
    let slots = manager(&h);

    let old = slots
        .replace(OWNER, RECORD, "logo", b"jpeg", "image/jpeg", None)
        .await
        .unwrap();
    h.blobs.fail_removes(true);

    let outcome = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&old.reference))
        .await
        .unwrap();

    let warning = outcome.warning.expect("cleanup warning");
    assert_eq!(warning.keys, vec!["acme/site-1/logo.jpg".to_string()]);
    assert_eq!(warning.record_id, RECORD);
    assert_eq!(
        h.entity().await.field("logo_key"),
        Some(&json!("acme/site-1/logo.png"))
    );
}

#[tokio::test]
async fn foreign_current_key_is_never_deleted() {
    let h = Harness::new().await;
    h.blobs
        .put("other/site-9/logo.png", b"theirs", "image/png")
        .await
        .unwrap();
    let slots = manager(&h);
    let foreign = AssetReference::new("other/site-9/logo.png", format!("{BASE_URL}/other/site-9/logo.png"));

    let outcome = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&foreign))
        .await
        .unwrap();

    assert!(outcome.warning.is_some());
    assert!(h.blobs.exists("other/site-9/logo.png").await.unwrap());
}

#[tokio::test]
async fn remove_clears_fields_then_deletes() {
    let h = Harness::new().await;
    let slots = manager(&h);
    let current = slots
        .replace(OWNER, RECORD, "avatar", b"png", "image/png", None)
        .await
        .unwrap()
        .reference;
    h.clear_log();

    let outcome = slots
        .remove(OWNER, RECORD, "avatar", Some(&current))
        .await
        .unwrap();

    assert!(outcome.warning.is_none());
    let entity = h.entity().await;
    assert!(entity.field("avatar_key").is_none());
    assert!(entity.field("avatar_url").is_none());
    assert!(!h.blobs.exists("acme/site-1/avatar.png").await.unwrap());
    assert!(position(&h.log, "update:site-1") < position(&h.log, "remove:acme/site-1/avatar.png"));
}

#[tokio::test]
async fn remove_commit_failure_keeps_blob() {
    let h = Harness::new().await;
    let slots = manager(&h);
    let current = slots
        .replace(OWNER, RECORD, "avatar", b"png", "image/png", None)
        .await
        .unwrap()
        .reference;
    h.records.fail_updates(true);

    let err = slots
        .remove(OWNER, RECORD, "avatar", Some(&current))
        .await
        .unwrap_err();

    assert!(matches!(err.kind, AssetErrorKind::Commit { .. }));
    assert!(h.blobs.exists("acme/site-1/avatar.png").await.unwrap());
}

#[tokio::test]
async fn current_reads_legacy_url_only_slot() {
    let h = Harness::new().await;
    h.records
        .update_entity(
            RECORD,
            fields(json!({"logo_url": "https://cdn.test/acme/site-1/old%20logo.png?v=2"})),
            None,
        )
        .await
        .unwrap();

    let slots = manager(&h)
        .with_legacy_parser(LegacyKeyParser::new(vec![BASE_URL.to_string()], vec![]));
    let current = slots.current(RECORD, "logo").await.unwrap().unwrap();

    assert_eq!(current.key(), "acme/site-1/old logo.png");
}

/// Scenario: the logo went from JPEG to PNG while the metadata update
/// failed. The caller sees a commit error naming the PNG as orphaned, the
/// JPEG stays live, and a retry after recovery converges.
#[tokio::test]
async fn failed_then_retried_format_change_converges() {
    let h = Harness::new().await;
    let slots = manager(&h);
    let jpeg = slots
        .replace(OWNER, RECORD, "logo", b"jpeg", "image/jpeg", None)
        .await
        .unwrap()
        .reference;

    h.records.fail_updates(true);
    let err = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&jpeg))
        .await
        .unwrap_err();
    assert_eq!(err.kind.orphaned_keys(), ["acme/site-1/logo.png".to_string()]);

    h.records.fail_updates(false);
    let live = slots.current(RECORD, "logo").await.unwrap().unwrap();
    assert_eq!(live, jpeg);

    let outcome = slots
        .replace(OWNER, RECORD, "logo", b"png", "image/png", Some(&live))
        .await
        .unwrap();
    assert_eq!(outcome.reference.key(), "acme/site-1/logo.png");
    assert!(!h.blobs.exists("acme/site-1/logo.jpg").await.unwrap());
    assert_eq!(h.blobs.inner.len().await, 1);
}

#[tokio::test]
async fn another_owners_record_is_rejected_before_upload() {
    let h = Harness::new().await;
    let slots = manager(&h);
    let before = h.entity().await;

    let replace = slots
        .replace("globex", RECORD, "logo", b"png", "image/png", None)
        .await
        .unwrap_err();
    let remove = slots
        .remove("globex", RECORD, "logo", None)
        .await
        .unwrap_err();
    let missing = slots
        .replace(OWNER, "site-404", "logo", b"png", "image/png", None)
        .await
        .unwrap_err();

    for err in [replace, remove, missing] {
        assert!(matches!(err.kind, AssetErrorKind::Validation(_)), "{err}");
    }
    assert!(common::ops(&h.log).is_empty());
    assert!(!h.blobs.exists("globex/site-1/logo.png").await.unwrap());
    assert_eq!(h.entity().await, before);
}
