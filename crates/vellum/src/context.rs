//! Store wiring.
//!
//! Managers take their store clients explicitly; this module opens the
//! configured backends once and hands the same clients to every manager.

use crate::{RecordsBackend, StorageBackend, VellumConfig};
use std::sync::Arc;
use vellum_assets::{CollectionManager, LegacyKeyParser, Reconciler, SlotManager};
use vellum_error::VellumResult;
use vellum_records::{JsonFileMetadataStore, MemoryMetadataStore, MetadataStore};
use vellum_storage::{BlobStore, FileSystemBlobStore, MemoryBlobStore};

/// Opened stores plus the configuration they were opened with.
#[derive(Clone)]
pub struct AssetContext {
    blobs: Arc<dyn BlobStore>,
    records: Arc<dyn MetadataStore>,
    config: VellumConfig,
}

impl AssetContext {
    /// Open the backends named in `config`.
    ///
    /// # Errors
    ///
    /// Fails if a store directory cannot be created or, for PostgreSQL,
    /// `DATABASE_URL` is unset, unreachable, or the build lacks the
    /// `database` feature.
    #[tracing::instrument(skip(config), fields(storage = ?config.storage().backend(), records = ?config.records().backend()))]
    pub fn open(config: VellumConfig) -> VellumResult<Self> {
        let storage = config.storage();
        let blobs: Arc<dyn BlobStore> = match storage.backend() {
            StorageBackend::Filesystem => Arc::new(FileSystemBlobStore::new(
                storage.path().clone(),
                storage.public_base_url().clone(),
            )?),
            StorageBackend::Memory => Arc::new(MemoryBlobStore::new(storage.public_base_url().clone())),
        };

        let records: Arc<dyn MetadataStore> = match config.records().backend() {
            RecordsBackend::Json => {
                Arc::new(JsonFileMetadataStore::new(config.records().path().clone())?)
            }
            RecordsBackend::Memory => Arc::new(MemoryMetadataStore::new()),
            RecordsBackend::Postgres => open_postgres()?,
        };

        tracing::info!(
            blobs = blobs.backend_name(),
            records = records.backend_name(),
            "Opened asset stores"
        );
        Ok(Self::from_stores(blobs, records, config))
    }

    /// Wrap already-open stores.
    pub fn from_stores(
        blobs: Arc<dyn BlobStore>,
        records: Arc<dyn MetadataStore>,
        config: VellumConfig,
    ) -> Self {
        Self {
            blobs,
            records,
            config,
        }
    }

    /// Blob store client.
    pub fn blobs(&self) -> &Arc<dyn BlobStore> {
        &self.blobs
    }

    /// Metadata store client.
    pub fn records(&self) -> &Arc<dyn MetadataStore> {
        &self.records
    }

    /// Configuration in effect.
    pub fn config(&self) -> &VellumConfig {
        &self.config
    }

    /// Parser for URL-only references served from this store.
    pub fn legacy_parser(&self) -> LegacyKeyParser {
        self.config
            .assets()
            .legacy()
            .parser(self.config.storage().public_base_url())
    }

    /// Slot manager with the configured upload policy.
    pub fn slots(&self) -> SlotManager {
        SlotManager::new(self.blobs.clone(), self.records.clone())
            .with_policy(self.config.assets().uploads().clone())
            .with_legacy_parser(self.legacy_parser())
    }

    /// Collection manager with the configured policy and concurrency mode.
    pub fn collections(&self) -> CollectionManager {
        let manager = CollectionManager::new(self.blobs.clone(), self.records.clone())
            .with_policy(self.config.assets().uploads().clone())
            .with_legacy_parser(self.legacy_parser());
        self.config.assets().collections().apply(manager)
    }

    /// Reconciler over the configured schema and grace window.
    pub fn reconciler(&self) -> Reconciler {
        Reconciler::new(self.blobs.clone(), self.records.clone())
            .with_schema(self.config.assets().schema().clone())
            .with_legacy_parser(self.legacy_parser())
            .with_config(self.config.assets().reconciler())
    }
}

#[cfg(feature = "database")]
fn open_postgres() -> VellumResult<Arc<dyn MetadataStore>> {
    use vellum_error::ConfigError;
    use vellum_records::{PostgresMetadataStore, establish_pool, run_migrations};

    let url = std::env::var("DATABASE_URL")
        .map_err(|_| ConfigError::new("DATABASE_URL must be set for the postgres backend"))?;
    let pool = establish_pool(&url)?;
    let mut conn = pool.get().map_err(|e| {
        ConfigError::new(format!("Failed to get connection from pool: {}", e))
    })?;
    run_migrations(&mut conn)?;
    Ok(Arc::new(PostgresMetadataStore::new(pool)))
}

#[cfg(not(feature = "database"))]
fn open_postgres() -> VellumResult<Arc<dyn MetadataStore>> {
    Err(vellum_error::ConfigError::new(
        "Postgres records backend requires the database feature",
    ))?
}
