//! Upload validation.

use crate::format::normalize_content_type;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use vellum_error::{AssetError, AssetResult};

/// Limits applied to every upload before any I/O happens.
///
/// # Example
///
/// ```toml
/// [uploads]
/// max_bytes = 5_242_880
/// allowed_content_types = ["image/jpeg", "image/png", "image/*"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct UploadPolicy {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_bytes")]
    max_bytes: u64,

    /// Accepted MIME types; `type/*` matches a whole family
    #[serde(default = "default_allowed_content_types")]
    allowed_content_types: Vec<String>,
}

fn default_max_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_content_types() -> Vec<String> {
    ["image/jpeg", "image/png", "image/webp", "image/gif", "image/avif"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: default_max_bytes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

impl UploadPolicy {
    /// Whether `content_type` is on the allow list.
    pub fn allows(&self, content_type: &str) -> bool {
        let essence = normalize_content_type(content_type);
        let family = essence.split('/').next().unwrap_or_default();

        self.allowed_content_types.iter().any(|allowed| {
            let allowed = normalize_content_type(allowed);
            allowed == essence
                || allowed == "*/*"
                || allowed
                    .strip_suffix("/*")
                    .is_some_and(|prefix| !family.is_empty() && prefix == family)
        })
    }

    /// Validate one upload.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty or oversized content, or a
    /// content type outside the allow list.
    pub fn check(&self, label: &str, data: &[u8], content_type: &str) -> AssetResult<()> {
        if data.is_empty() {
            return Err(AssetError::validation(format!("{} is empty", label)));
        }
        if data.len() as u64 > self.max_bytes {
            return Err(AssetError::validation(format!(
                "{} is {} bytes, limit is {}",
                label,
                data.len(),
                self.max_bytes
            )));
        }
        if !self.allows(content_type) {
            return Err(AssetError::validation(format!(
                "{} has content type {:?}, which is not allowed",
                label, content_type
            )));
        }
        Ok(())
    }
}
