//! Tests for the filesystem blob store.

use tempfile::TempDir;
use vellum_storage::{BlobStore, FileSystemBlobStore, StorageErrorKind};

const BASE_URL: &str = "https://cdn.example.com/blobs";

fn store(temp_dir: &TempDir) -> FileSystemBlobStore {
    FileSystemBlobStore::new(temp_dir.path(), BASE_URL).unwrap()
}

#[tokio::test]
async fn test_put_and_get() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    let blob = store
        .put("acme/site-1/logo.png", b"logo bytes", "image/png")
        .await
        .unwrap();

    assert_eq!(blob.key(), "acme/site-1/logo.png");
    assert_eq!(blob.url(), "https://cdn.example.com/blobs/acme/site-1/logo.png");
    assert_eq!(*blob.size_bytes(), 10);
    assert_eq!(blob.content_type(), "image/png");

    let data = store.get("acme/site-1/logo.png").await.unwrap();
    assert_eq!(data, b"logo bytes");

    // Key maps straight onto the directory layout
    assert!(temp_dir.path().join("acme/site-1/logo.png").exists());
}

#[tokio::test]
async fn test_put_overwrites_in_place() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store.put("acme/r/logo.png", b"first", "image/png").await.unwrap();
    store.put("acme/r/logo.png", b"second", "image/png").await.unwrap();

    assert_eq!(store.get("acme/r/logo.png").await.unwrap(), b"second");
    assert_eq!(store.list("acme/").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_get_missing_is_not_found() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    let err = store.get("acme/r/missing.png").await.unwrap_err();
    assert!(matches!(err.kind, StorageErrorKind::NotFound(_)));
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_rejects_traversal_keys() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    let err = store
        .put("../escape.png", b"nope", "image/png")
        .await
        .unwrap_err();
    assert!(matches!(err.kind, StorageErrorKind::InvalidKey(_)));
}

#[tokio::test]
async fn test_remove_reports_and_prunes() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store.put("acme/r1/a.png", b"a", "image/png").await.unwrap();
    store.put("acme/r2/b.png", b"b", "image/png").await.unwrap();

    let report = store
        .remove(&["acme/r1/a.png".to_string(), "acme/r1/never.png".to_string()])
        .await;

    assert!(report.is_complete());
    assert_eq!(report.removed.len(), 2);
    assert!(!store.exists("acme/r1/a.png").await.unwrap());
    assert!(store.exists("acme/r2/b.png").await.unwrap());

    // Emptied record directory is pruned, the base stays
    assert!(!temp_dir.path().join("acme/r1").exists());
    assert!(temp_dir.path().exists());
}

#[tokio::test]
async fn test_remove_invalid_key_is_reported_not_raised() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    let report = store.remove(&["/etc/passwd".to_string()]).await;
    assert!(!report.is_complete());
    assert_eq!(report.failed_keys, vec!["/etc/passwd".to_string()]);
}

#[tokio::test]
async fn test_list_by_prefix() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store.put("acme/r1/a.png", b"a", "image/png").await.unwrap();
    store.put("acme/r1/b.png", b"bb", "image/png").await.unwrap();
    store.put("acme/r2/c.png", b"c", "image/png").await.unwrap();
    store.put("globex/r1/d.png", b"d", "image/png").await.unwrap();

    let acme: Vec<_> = store
        .list("acme/")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.key().clone())
        .collect();
    assert_eq!(acme, vec!["acme/r1/a.png", "acme/r1/b.png", "acme/r2/c.png"]);

    let r1 = store.list("acme/r1/").await.unwrap();
    assert_eq!(r1.len(), 2);
    assert_eq!(*r1[1].size_bytes(), 2);

    assert!(store.list("nobody/").await.unwrap().is_empty());
    assert_eq!(store.list("").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_public_url_is_pure() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileSystemBlobStore::new(temp_dir.path(), "https://cdn.example.com/").unwrap();

    assert_eq!(
        store.public_url("acme/r/x.png"),
        "https://cdn.example.com/acme/r/x.png"
    );
    assert!(!store.exists("acme/r/x.png").await.unwrap());
}

#[tokio::test]
async fn test_list_includes_blobs_named_like_temp_files() {
    let temp_dir = TempDir::new().unwrap();
    let store = store(&temp_dir);

    store
        .put("acme/r1/1700000000000-notes.tmp", b"notes", "text/plain")
        .await
        .unwrap();
    // A leftover from an interrupted write stays hidden
    std::fs::write(
        temp_dir
            .path()
            .join("acme/r1/.logo.png.0b6f2c8e-4a4e-4f3c-9d2a-6f1e2b3c4d5e.tmp"),
        b"partial",
    )
    .unwrap();

    let keys: Vec<_> = store
        .list("acme/")
        .await
        .unwrap()
        .into_iter()
        .map(|b| b.key().clone())
        .collect();
    assert_eq!(keys, vec!["acme/r1/1700000000000-notes.tmp"]);
}
