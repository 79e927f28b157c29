//! Blob storage for Vellum assets.
//!
//! This crate provides the opaque key/value object store that holds asset
//! content. Metadata referencing the blobs lives elsewhere (see
//! `vellum_records`); nothing here knows about records, owners or slots.
//!
//! # Features
//!
//! - **Opaque keys**: `/`-separated keys, validated against traversal
//! - **Public URLs**: every key has a derivable public URL, no I/O involved
//! - **Partial-failure removal**: batch removes report failed keys instead of erroring
//! - **Pluggable backends**: filesystem and in-memory implementations
//!
//! # Example
//!
//! ```rust
//! use vellum_storage::{BlobStore, MemoryBlobStore};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryBlobStore::new("https://cdn.example.com/assets");
//!
//! let blob = store.put("acme/site-1/logo.png", b"\x89PNG", "image/png").await?;
//! assert_eq!(blob.url(), "https://cdn.example.com/assets/acme/site-1/logo.png");
//!
//! let report = store.remove(&[blob.key().clone()]).await;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod blob;
mod filesystem;
mod key;
mod memory;
mod store;

pub use blob::{BlobInfo, RemoveReport, StoredBlob};
pub use filesystem::FileSystemBlobStore;
pub use key::{join_url, validate_key};
pub use memory::MemoryBlobStore;
pub use store::BlobStore;
pub use vellum_error::{StorageError, StorageErrorKind, StorageResult};
