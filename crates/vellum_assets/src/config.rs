//! Asset lifecycle configuration sections.

use crate::{AssetSchema, CollectionManager, ConcurrencyMode, LegacyKeyParser, UploadPolicy};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};

/// `[collections]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct CollectionConfig {
    /// How whole-list commits handle concurrent writers
    #[serde(default)]
    concurrency: ConcurrencyMode,

    /// Attempts per commit in optimistic mode
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,
}

fn default_max_attempts() -> u32 {
    3
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            concurrency: ConcurrencyMode::default(),
            max_attempts: default_max_attempts(),
        }
    }
}

/// `[reconciler]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct ReconcilerConfig {
    /// Minimum age of an unreferenced blob before it may be deleted
    #[serde(default = "default_grace_period_secs")]
    grace_period_secs: u64,

    /// Report candidates without deleting them
    #[serde(default)]
    dry_run: bool,
}

fn default_grace_period_secs() -> u64 {
    86_400 // one day
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            grace_period_secs: default_grace_period_secs(),
            dry_run: false,
        }
    }
}

/// `[legacy]` section.
///
/// The storage backend's own public base URL is always tried first; the
/// markers cover URLs minted by a previous host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct LegacyConfig {
    /// Path fragments after which a legacy URL holds the key
    #[serde(default)]
    path_markers: Vec<String>,
}

impl LegacyConfig {
    /// Build the key parser for a store served from `public_base_url`.
    pub fn parser(&self, public_base_url: &str) -> LegacyKeyParser {
        LegacyKeyParser::new(vec![public_base_url.to_string()], self.path_markers.clone())
    }
}

/// Every asset-related configuration section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct AssetConfig {
    /// `[uploads]`
    #[serde(default)]
    uploads: UploadPolicy,
    /// `[collections]`
    #[serde(default)]
    collections: CollectionConfig,
    /// `[reconciler]`
    #[serde(default)]
    reconciler: ReconcilerConfig,
    /// `[schema]`
    #[serde(default)]
    schema: AssetSchema,
    /// `[legacy]`
    #[serde(default)]
    legacy: LegacyConfig,
}

impl CollectionConfig {
    /// Apply this section to a manager.
    pub fn apply(&self, manager: CollectionManager) -> CollectionManager {
        manager.with_concurrency(self.concurrency, self.max_attempts)
    }
}
