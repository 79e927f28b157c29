//! Storage key derivation.
//!
//! Every key lives under `{owner}/{record}/`. Slots use a stable name
//! (`{owner}/{record}/{slot}.{ext}`) so a re-upload with the same extension
//! overwrites in place. Collection entries use a time-unique name
//! (`{owner}/{record}/{millis}-{filename}`) and never overwrite anything.

use crate::format::extension_for;
use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use vellum_error::{AssetError, AssetResult};

const MAX_SEGMENT_LEN: usize = 128;
const MAX_FILENAME_LEN: usize = 96;

/// Derives blob keys for slots and collections.
///
/// Slot keys and namespace prefixes are pure functions of their inputs.
/// Collection keys embed a millisecond timestamp that is strictly
/// increasing per deriver, so files in one batch never share a key.
#[derive(Debug, Default)]
pub struct KeyDeriver {
    last_millis: AtomicI64,
}

impl KeyDeriver {
    /// Create a deriver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that an owner, record or slot identifier is one safe path segment.
    pub fn validate_segment(kind: &str, value: &str) -> AssetResult<()> {
        let valid = !value.is_empty()
            && value.len() <= MAX_SEGMENT_LEN
            && value != "."
            && value != ".."
            && value
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));

        if valid {
            Ok(())
        } else {
            Err(AssetError::validation(format!(
                "{} {:?} must be 1-{} characters of [A-Za-z0-9._-]",
                kind, value, MAX_SEGMENT_LEN
            )))
        }
    }

    /// Namespace prefix for everything an owner stores: `{owner}/`.
    pub fn owner_prefix(owner_id: &str) -> AssetResult<String> {
        Self::validate_segment("owner id", owner_id)?;
        Ok(format!("{}/", owner_id))
    }

    /// Namespace prefix for one record: `{owner}/{record}/`.
    pub fn record_prefix(owner_id: &str, record_id: &str) -> AssetResult<String> {
        Self::validate_segment("owner id", owner_id)?;
        Self::validate_segment("record id", record_id)?;
        Ok(format!("{}/{}/", owner_id, record_id))
    }

    /// Whether `key` sits directly inside the record's namespace.
    pub fn owns(owner_id: &str, record_id: &str, key: &str) -> bool {
        let Ok(prefix) = Self::record_prefix(owner_id, record_id) else {
            return false;
        };
        key.strip_prefix(&prefix)
            .is_some_and(|name| !name.is_empty() && !name.contains('/'))
    }

    /// Stable slot key: `{owner}/{record}/{slot}.{ext}`.
    ///
    /// # Errors
    ///
    /// Returns a validation error for unsafe identifiers or a content type
    /// without a usable extension.
    pub fn slot_key(
        owner_id: &str,
        record_id: &str,
        slot: &str,
        content_type: &str,
    ) -> AssetResult<String> {
        let prefix = Self::record_prefix(owner_id, record_id)?;
        Self::validate_segment("slot name", slot)?;
        let extension = extension_for(content_type).ok_or_else(|| {
            AssetError::validation(format!("no file extension for content type {:?}", content_type))
        })?;
        Ok(format!("{}{}.{}", prefix, slot, extension))
    }

    /// Time-unique collection key for a fixed timestamp:
    /// `{owner}/{record}/{millis}-{filename}`.
    pub fn collection_key_at(
        owner_id: &str,
        record_id: &str,
        millis: i64,
        filename: &str,
        content_type: &str,
    ) -> AssetResult<String> {
        let prefix = Self::record_prefix(owner_id, record_id)?;
        Ok(format!(
            "{}{}-{}",
            prefix,
            millis,
            sanitize_filename(filename, content_type)
        ))
    }

    /// Time-unique collection key stamped with the next timestamp.
    pub fn collection_key(
        &self,
        owner_id: &str,
        record_id: &str,
        filename: &str,
        content_type: &str,
    ) -> AssetResult<String> {
        Self::collection_key_at(owner_id, record_id, self.next_millis(), filename, content_type)
    }

    fn next_millis(&self) -> i64 {
        let now = Utc::now().timestamp_millis();
        let mut last = self.last_millis.load(Ordering::Acquire);
        loop {
            let next = now.max(last + 1);
            match self.last_millis.compare_exchange_weak(
                last,
                next,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

/// Reduce a client file name to a safe single key segment.
///
/// Directory parts are dropped, anything outside `[A-Za-z0-9._-]` becomes
/// `-`, and a missing extension is filled in from the content type.
pub fn sanitize_filename(filename: &str, content_type: &str) -> String {
    let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();

    let mut cleaned = String::with_capacity(base.len());
    for c in base.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
            c
        } else {
            '-'
        };
        if c == '-' && cleaned.ends_with('-') {
            continue;
        }
        cleaned.push(c);
    }

    let mut cleaned = cleaned
        .trim_matches(|c| c == '-' || c == '.')
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect::<String>();
    if cleaned.is_empty() {
        cleaned.push_str("file");
    }

    if !cleaned.contains('.') {
        if let Some(extension) = extension_for(content_type) {
            cleaned.push('.');
            cleaned.push_str(&extension);
        }
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_keys_are_stable() {
        let a = KeyDeriver::slot_key("acme", "site-1", "logo", "image/png").unwrap();
        let b = KeyDeriver::slot_key("acme", "site-1", "logo", "image/png").unwrap();
        assert_eq!(a, "acme/site-1/logo.png");
        assert_eq!(a, b);

        let jpeg = KeyDeriver::slot_key("acme", "site-1", "logo", "image/jpeg").unwrap();
        assert_eq!(jpeg, "acme/site-1/logo.jpg");
    }

    #[test]
    fn collection_keys_are_unique_within_a_batch() {
        let keys = KeyDeriver::new();
        let a = keys.collection_key("acme", "r", "photo.jpg", "image/jpeg").unwrap();
        let b = keys.collection_key("acme", "r", "photo.jpg", "image/jpeg").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("acme/r/") && a.ends_with("-photo.jpg"));
    }

    #[test]
    fn sanitizes_hostile_filenames() {
        assert_eq!(sanitize_filename("../../etc/passwd", "text/plain"), "passwd.plain");
        assert_eq!(sanitize_filename("My Photo (1).JPG", "image/jpeg"), "My-Photo-1-.JPG");
        assert_eq!(sanitize_filename("C:\\Users\\me\\pic.png", "image/png"), "pic.png");
        assert_eq!(sanitize_filename("...", "image/webp"), "file.webp");
    }

    #[test]
    fn ownership_is_limited_to_the_record_namespace() {
        assert!(KeyDeriver::owns("acme", "r1", "acme/r1/logo.png"));
        assert!(!KeyDeriver::owns("acme", "r1", "acme/r2/logo.png"));
        assert!(!KeyDeriver::owns("acme", "r1", "acme/r1/nested/logo.png"));
        assert!(!KeyDeriver::owns("acme", "r1", "globex/r1/logo.png"));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(KeyDeriver::record_prefix("acme/x", "r").is_err());
        assert!(KeyDeriver::record_prefix("acme", "..").is_err());
        assert!(KeyDeriver::slot_key("acme", "r", "logo", "application/x-foo+bar").is_err());
    }
}
