//! Layered configuration for the Vellum binary and embedders.

use config::{Config, File, FileFormat};
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;
use vellum_assets::AssetConfig;
use vellum_error::{ConfigError, VellumError, VellumResult};

/// Blob storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Files under `[storage] path`
    #[default]
    Filesystem,
    /// Process memory, lost on exit
    Memory,
}

/// Metadata backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordsBackend {
    /// One JSON document per record under `[records] path`
    #[default]
    Json,
    /// Process memory, lost on exit
    Memory,
    /// PostgreSQL at `DATABASE_URL` (requires the `database` feature)
    Postgres,
}

/// `[storage]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct StorageConfig {
    /// Which blob store to open
    #[serde(default)]
    backend: StorageBackend,
    /// Root directory of the filesystem backend
    #[serde(default = "default_storage_path")]
    path: PathBuf,
    /// URL prefix under which blobs are publicly served
    #[serde(default = "default_public_base_url")]
    public_base_url: String,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data/blobs")
}

fn default_public_base_url() -> String {
    "http://localhost:8080/blobs".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: default_storage_path(),
            public_base_url: default_public_base_url(),
        }
    }
}

/// `[records]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct RecordsConfig {
    /// Which metadata store to open
    #[serde(default)]
    backend: RecordsBackend,
    /// Directory of the JSON backend
    #[serde(default = "default_records_path")]
    path: PathBuf,
}

fn default_records_path() -> PathBuf {
    PathBuf::from("./data/records")
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            backend: RecordsBackend::default(),
            path: default_records_path(),
        }
    }
}

/// Complete Vellum configuration.
///
/// # Example
///
/// ```toml
/// [storage]
/// backend = "filesystem"
/// path = "/var/lib/vellum/blobs"
/// public_base_url = "https://cdn.example.com"
///
/// [records]
/// backend = "json"
/// path = "/var/lib/vellum/records"
///
/// [collections]
/// concurrency = "optimistic"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Getters)]
pub struct VellumConfig {
    /// `[storage]`
    #[serde(default)]
    storage: StorageConfig,
    /// `[records]`
    #[serde(default)]
    records: RecordsConfig,
    /// `[uploads]`, `[collections]`, `[reconciler]`, `[schema]`, `[legacy]`
    #[serde(flatten)]
    assets: AssetConfig,
}

fn build_error(e: config::ConfigError) -> VellumError {
    VellumError::from(ConfigError::new(format!(
        "Failed to build configuration: {}",
        e
    )))
}

fn parse_error(e: config::ConfigError) -> VellumError {
    VellumError::from(ConfigError::new(format!(
        "Failed to parse configuration: {}",
        e
    )))
}

impl VellumConfig {
    /// Load configuration from a single TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file is missing or malformed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> VellumResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                VellumError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(parse_error)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml: &str) -> VellumResult<Self> {
        Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)
    }

    /// Load configuration with precedence: user override > bundled default.
    ///
    /// Configuration sources in order of precedence (later sources override earlier):
    /// 1. Bundled defaults (vellum.toml shipped with the crate)
    /// 2. User config in home directory (~/.config/vellum/vellum.toml)
    /// 3. User config in current directory (./vellum.toml)
    ///
    /// User config files are optional and silently skipped if not found.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use vellum::VellumConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = VellumConfig::load()?;
    /// println!("{:?}", config.storage().backend());
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> VellumResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../vellum.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/vellum/vellum.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("vellum").required(false));

        builder
            .build()
            .map_err(build_error)?
            .try_deserialize()
            .map_err(parse_error)
    }
}
