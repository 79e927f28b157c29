//! End-to-end lifecycle on the on-disk backends.

use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;
use vellum_assets::{AssetFile, CollectionManager, SlotManager};
use vellum_records::{JsonFileMetadataStore, MetadataStore, fields};
use vellum_storage::{BlobStore, FileSystemBlobStore};

#[tokio::test]
async fn test_slot_and_collection_on_disk() {
    let temp_dir = TempDir::new().unwrap();
    let blobs = Arc::new(
        FileSystemBlobStore::new(temp_dir.path().join("blobs"), "https://cdn.example.com").unwrap(),
    );
    let records = Arc::new(JsonFileMetadataStore::new(temp_dir.path().join("records")).unwrap());
    records
        .create_entity("site-1", "acme", fields(json!({"name": "Acme"})))
        .await
        .unwrap();

    let slots = SlotManager::new(blobs.clone(), records.clone());
    let jpeg = slots
        .replace("acme", "site-1", "logo", b"jpeg", "image/jpeg", None)
        .await
        .unwrap()
        .reference;
    let png = slots
        .replace("acme", "site-1", "logo", b"png", "image/png", Some(&jpeg))
        .await
        .unwrap()
        .reference;

    assert!(!temp_dir.path().join("blobs/acme/site-1/logo.jpg").exists());
    assert!(temp_dir.path().join("blobs/acme/site-1/logo.png").exists());

    let gallery = CollectionManager::new(blobs.clone(), records.clone());
    let list = gallery
        .add(
            "acme",
            "site-1",
            "gallery",
            vec![AssetFile::new("Beach Day.JPG", "image/jpeg", b"sand".to_vec())],
            &[],
        )
        .await
        .unwrap()
        .list;
    assert!(list[0].key().ends_with("-Beach-Day.JPG"));

    // Reopen the record store from disk
    let reopened = JsonFileMetadataStore::new(temp_dir.path().join("records")).unwrap();
    let entity = reopened.get_entity("site-1").await.unwrap();
    assert_eq!(entity.field("logo_key"), Some(&json!(png.key())));
    assert_eq!(entity.field("gallery").and_then(|v| v.as_array()).map(Vec::len), Some(1));
    assert!(blobs.exists(list[0].key()).await.unwrap());
}
