//! Asset lifecycle for record-attached blobs.
//!
//! Records reference binary assets (logos, cover photos, galleries,
//! avatars) stored in a [`BlobStore`]; the references live in a
//! [`MetadataStore`]. The two stores share no transaction, so every
//! operation here follows one ordering:
//!
//! 1. upload the new blob
//! 2. commit the new reference to the record
//! 3. delete the blob that is no longer referenced
//!
//! Metadata therefore never points at a blob this crate deleted. The price
//! is orphaned blobs when a step after an upload fails; those are logged
//! with their keys and swept later by the [`Reconciler`].
//!
//! # Patterns
//!
//! - [`SlotManager`]: one reference in a `<name>_key`/`<name>_url` field pair,
//!   stable keys so re-uploads overwrite in place
//! - [`CollectionManager`]: an ordered list of references in one array field,
//!   time-unique keys, whole-list commits
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use serde_json::json;
//! use vellum_assets::SlotManager;
//! use vellum_records::{MemoryMetadataStore, MetadataStore, fields};
//! use vellum_storage::{BlobStore, MemoryBlobStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let blobs = Arc::new(MemoryBlobStore::new("https://cdn.example.com"));
//! let records = Arc::new(MemoryMetadataStore::new());
//! records.create_entity("site-1", "acme", fields(json!({}))).await?;
//!
//! let slots = SlotManager::new(blobs.clone(), records.clone());
//! let outcome = slots
//!     .replace("acme", "site-1", "logo", b"\x89PNG", "image/png", None)
//!     .await?;
//!
//! assert_eq!(outcome.reference.key(), "acme/site-1/logo.png");
//! assert!(blobs.exists("acme/site-1/logo.png").await?);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cleanup;
mod collection;
mod config;
mod file;
mod format;
mod keys;
mod legacy;
mod outcome;
mod owner;
mod policy;
mod reconcile;
mod reference;
mod schema;
mod slot;

pub use collection::{CollectionManager, ConcurrencyMode};
pub use config::{AssetConfig, CollectionConfig, LegacyConfig, ReconcilerConfig};
pub use file::AssetFile;
pub use format::ImageFormat;
pub use keys::{KeyDeriver, sanitize_filename};
pub use legacy::LegacyKeyParser;
pub use outcome::{
    CleanupWarning, CollectionAddOutcome, CollectionRemoveOutcome, FailedUpload, SlotOutcome,
    SlotRemoveOutcome,
};
pub use policy::UploadPolicy;
pub use reconcile::{ReconcileReport, Reconciler};
pub use reference::AssetReference;
pub use schema::{
    AssetSchema, CollectionEntries, ReferenceScan, collection_entries, collection_references,
    collection_value, slot_fields, slot_reference,
};
pub use slot::SlotManager;

pub use vellum_error::{AssetError, AssetErrorKind, AssetResult};
pub use vellum_records::MetadataStore;
pub use vellum_storage::BlobStore;
