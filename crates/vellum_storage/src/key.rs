//! Key validation and URL derivation shared by all backends.

use vellum_error::{StorageError, StorageErrorKind, StorageResult};

/// Check that a key is a relative, `/`-separated path without traversal.
///
/// # Errors
///
/// Returns `StorageErrorKind::InvalidKey` for empty keys, absolute keys,
/// backslashes, and empty, `.` or `..` segments.
pub fn validate_key(key: &str) -> StorageResult<()> {
    let invalid = |reason: &str| {
        Err(StorageError::new(StorageErrorKind::InvalidKey(format!(
            "{:?}: {}",
            key, reason
        ))))
    };

    if key.is_empty() {
        return invalid("empty key");
    }
    if key.starts_with('/') {
        return invalid("absolute key");
    }
    if key.contains('\\') {
        return invalid("backslash in key");
    }
    if key.split('/').any(|s| s.is_empty() || s == "." || s == "..") {
        return invalid("empty or relative segment");
    }
    Ok(())
}

/// Join a public base URL and a key with exactly one `/` between them.
pub fn join_url(base: &str, key: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), key.trim_start_matches('/'))
}
