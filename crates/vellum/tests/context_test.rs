//! Store wiring through the facade.

use serde_json::json;
use tempfile::TempDir;
use vellum::{AssetContext, AssetFile, ConcurrencyMode, VellumConfig, fields};

fn on_disk(temp_dir: &TempDir) -> VellumConfig {
    VellumConfig::from_toml(&format!(
        r#"
        [storage]
        backend = "filesystem"
        path = "{blobs}"
        public_base_url = "https://cdn.example.com"

        [records]
        backend = "json"
        path = "{records}"

        [collections]
        concurrency = "optimistic"

        [reconciler]
        grace_period_secs = 0
        "#,
        blobs = temp_dir.path().join("blobs").display(),
        records = temp_dir.path().join("records").display(),
    ))
    .unwrap()
}

#[tokio::test]
async fn test_managers_share_configured_stores() {
    let temp_dir = TempDir::new().unwrap();
    let context = AssetContext::open(on_disk(&temp_dir)).unwrap();
    context
        .records()
        .create_entity("site-1", "acme", fields(json!({})))
        .await
        .unwrap();

    let logo = context
        .slots()
        .replace("acme", "site-1", "logo", b"png", "image/png", None)
        .await
        .unwrap()
        .reference;
    assert_eq!(logo.url(), "https://cdn.example.com/acme/site-1/logo.png");
    assert!(temp_dir.path().join("blobs/acme/site-1/logo.png").exists());
    assert!(temp_dir.path().join("records/site-1.json").exists());

    let added = context
        .collections()
        .add(
            "acme",
            "site-1",
            "gallery",
            vec![AssetFile::new("a.webp", "image/webp", b"a".to_vec())],
            &[],
        )
        .await
        .unwrap();
    assert_eq!(added.list.len(), 1);
    assert_eq!(
        *context.config().assets().collections().concurrency(),
        ConcurrencyMode::Optimistic
    );
}

#[tokio::test]
async fn test_reconciler_uses_configured_grace_window() {
    let temp_dir = TempDir::new().unwrap();
    let context = AssetContext::open(on_disk(&temp_dir)).unwrap();
    context
        .records()
        .create_entity("site-1", "acme", fields(json!({})))
        .await
        .unwrap();
    context
        .blobs()
        .put("acme/site-1/stray.png", b"stray", "image/png")
        .await
        .unwrap();

    let report = context
        .reconciler()
        .reconcile_owner("acme", chrono::Utc::now() + chrono::Duration::seconds(1))
        .await
        .unwrap();

    assert_eq!(report.deleted(), &["acme/site-1/stray.png".to_string()]);
    assert!(!temp_dir.path().join("blobs/acme/site-1/stray.png").exists());
}

#[test]
fn test_postgres_without_database_feature_fails() {
    let config = VellumConfig::from_toml(
        "[storage]\nbackend = \"memory\"\n\n[records]\nbackend = \"postgres\"\n",
    ).unwrap();
    if cfg!(not(feature = "database")) {
        assert!(AssetContext::open(config).is_err());
    }
}
