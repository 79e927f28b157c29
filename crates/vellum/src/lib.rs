//! Vellum - asset lifecycle for record-attached blobs
//!
//! Vellum keeps binary assets (logos, photos, galleries) in a blob store and
//! the references to them in record metadata, without letting the two drift
//! into dangling references. Every mutation uploads first, commits the new
//! reference second and deletes detached blobs last; anything left behind
//! by a failure is an orphan that the reconciler sweeps.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use vellum::{AssetContext, VellumConfig};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let context = AssetContext::open(VellumConfig::load()?)?;
//! let slots = context.slots();
//!
//! let current = slots.current("site-1", "logo").await?;
//! let png = std::fs::read("logo.png")?;
//! let outcome = slots
//!     .replace("acme", "site-1", "logo", &png, "image/png", current.as_ref())
//!     .await?;
//! println!("logo now at {}", outcome.reference.url());
//! # Ok(())
//! # }
//! ```
//!
//! # Cargo Features
//!
//! - `database` - PostgreSQL metadata backend
//!
//! # Architecture
//!
//! - `vellum_error` - error taxonomy
//! - `vellum_storage` - `BlobStore` trait, filesystem and memory backends
//! - `vellum_records` - `MetadataStore` trait, JSON, memory and PostgreSQL backends
//! - `vellum_assets` - slot and collection managers, key derivation, reconciler
//! - `vellum` - configuration, store wiring and the `vellum` binary

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;

pub use config::{RecordsBackend, RecordsConfig, StorageBackend, StorageConfig, VellumConfig};
pub use context::AssetContext;

pub use vellum_assets::{
    AssetConfig, AssetFile, AssetReference, AssetSchema, CleanupWarning, CollectionAddOutcome,
    CollectionConfig, CollectionManager, CollectionRemoveOutcome, ConcurrencyMode, FailedUpload,
    ImageFormat, KeyDeriver, LegacyConfig, LegacyKeyParser, ReconcileReport, Reconciler,
    ReconcilerConfig, SlotManager, SlotOutcome, SlotRemoveOutcome, UploadPolicy,
};
pub use vellum_error::{
    AssetError, AssetErrorKind, AssetResult, ConfigError, MetadataError, MetadataErrorKind,
    MetadataResult, StorageError, StorageErrorKind, StorageResult, VellumError, VellumErrorKind,
    VellumResult,
};
pub use vellum_records::{
    Entity, Fields, JsonFileMetadataStore, MemoryMetadataStore, MetadataStore, fields,
};
pub use vellum_storage::{BlobStore, FileSystemBlobStore, MemoryBlobStore, StoredBlob};

#[cfg(feature = "database")]
pub use vellum_records::PostgresMetadataStore;
