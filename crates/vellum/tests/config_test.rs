//! Configuration loading tests.

use std::io::Write;
use vellum::{ConcurrencyMode, RecordsBackend, StorageBackend, VellumConfig};

#[test]
fn test_bundled_defaults_load() {
    let config = VellumConfig::load().unwrap();

    assert_eq!(*config.storage().backend(), StorageBackend::Filesystem);
    assert_eq!(*config.records().backend(), RecordsBackend::Json);
    assert_eq!(*config.assets().uploads().max_bytes(), 10 * 1024 * 1024);
    assert_eq!(*config.assets().collections().max_attempts(), 3);
    assert!(
        config
            .assets()
            .schema()
            .slots()
            .contains(&"logo".to_string())
    );
}

#[test]
fn test_partial_file_keeps_defaults() {
    let config = VellumConfig::from_toml(
        r#"
        [storage]
        backend = "memory"
        public_base_url = "https://cdn.example.com"

        [collections]
        concurrency = "optimistic"
        max_attempts = 5
        "#,
    )
    .unwrap();

    assert_eq!(*config.storage().backend(), StorageBackend::Memory);
    assert_eq!(config.storage().public_base_url(), "https://cdn.example.com");
    assert_eq!(*config.records().backend(), RecordsBackend::Json);
    assert_eq!(
        *config.assets().collections().concurrency(),
        ConcurrencyMode::Optimistic
    );
    assert_eq!(*config.assets().collections().max_attempts(), 5);
    assert_eq!(*config.assets().reconciler().grace_period_secs(), 86_400);
}

#[test]
fn test_from_file() {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    writeln!(
        file,
        r#"
[uploads]
max_bytes = 1024
allowed_content_types = ["image/*"]

[reconciler]
grace_period_secs = 60
dry_run = true

[legacy]
path_markers = ["/object/public/assets/"]
"#
    )
    .unwrap();

    let config = VellumConfig::from_file(file.path()).unwrap();

    assert_eq!(*config.assets().uploads().max_bytes(), 1024);
    assert!(config.assets().uploads().allows("image/heic"));
    assert!(*config.assets().reconciler().dry_run());
    assert_eq!(
        config.assets().legacy().path_markers(),
        &["/object/public/assets/".to_string()]
    );
}

#[test]
fn test_unknown_backend_is_a_config_error() {
    let err = VellumConfig::from_toml("[storage]\nbackend = \"s4\"\n").unwrap_err();
    assert!(err.to_string().contains("Configuration Error"));
}

#[test]
fn test_missing_file_is_a_config_error() {
    assert!(VellumConfig::from_file("/nonexistent/vellum.toml").is_err());
}
