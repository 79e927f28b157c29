//! Key recovery for records that stored only a public URL.
//!
//! Older records kept `<slot>_url` without `<slot>_key`, and older gallery
//! entries were bare URL strings. Deleting their blobs needs the key, which
//! can only be recovered by parsing the URL. This is heuristic: a URL that
//! matches no configured base or marker yields `None` and its blob is left
//! alone.

use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use vellum_storage::validate_key;

/// Recovers blob keys from public URLs.
///
/// # Example
///
/// ```
/// use vellum_assets::LegacyKeyParser;
///
/// let parser = LegacyKeyParser::new(
///     vec!["https://cdn.example.com/assets".to_string()],
///     vec!["/storage/v1/object/public/assets/".to_string()],
/// );
///
/// assert_eq!(
///     parser.recover("https://cdn.example.com/assets/acme/site-1/logo.png?v=3").as_deref(),
///     Some("acme/site-1/logo.png"),
/// );
/// assert_eq!(
///     parser
///         .recover("https://x.supabase.co/storage/v1/object/public/assets/acme/s/My%20Photo.jpg")
///         .as_deref(),
///     Some("acme/s/My Photo.jpg"),
/// );
/// assert_eq!(parser.recover("https://elsewhere.net/logo.png"), None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LegacyKeyParser {
    /// URL prefixes that map directly onto keys
    #[serde(default)]
    public_base_urls: Vec<String>,
    /// Path fragments after which the key starts
    #[serde(default)]
    path_markers: Vec<String>,
}

impl LegacyKeyParser {
    /// Create a parser from base URLs and path markers.
    pub fn new(public_base_urls: Vec<String>, path_markers: Vec<String>) -> Self {
        Self {
            public_base_urls,
            path_markers,
        }
    }

    /// Recover the blob key behind `url`, if it can be determined.
    pub fn recover(&self, url: &str) -> Option<String> {
        let url = url.split(['?', '#']).next().unwrap_or_default();

        let encoded = self
            .public_base_urls
            .iter()
            .filter(|base| !base.is_empty())
            .find_map(|base| {
                url.strip_prefix(base.trim_end_matches('/'))
                    .and_then(|rest| rest.strip_prefix('/'))
            })
            .or_else(|| {
                self.path_markers
                    .iter()
                    .filter(|marker| !marker.is_empty())
                    .find_map(|marker| url.find(marker.as_str()).map(|idx| &url[idx + marker.len()..]))
            })?;

        let key = urlencoding::decode(encoded).ok()?.into_owned();
        match validate_key(&key) {
            Ok(()) => Some(key),
            Err(e) => {
                tracing::debug!(url, error = %e, "Recovered legacy key is not a valid key");
                None
            }
        }
    }
}
