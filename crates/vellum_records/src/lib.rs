//! Record metadata stores for Vellum assets.
//!
//! A metadata store holds one JSON document of fields per record, keyed by
//! record id and tagged with its owner. Asset references live in those
//! fields; the store itself has no idea which fields point at blobs.
//!
//! # Features
//!
//! - Atomic partial updates: patch keys overwrite, `null` removes
//! - Monotonic record versions for optimistic concurrency
//! - In-memory, JSON-file and PostgreSQL (feature `database`) backends
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use vellum_records::{MemoryMetadataStore, MetadataStore, fields};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = MemoryMetadataStore::new();
//! store.create_entity("site-1", "acme", fields(json!({"title": "Acme"}))).await?;
//!
//! let updated = store
//!     .update_entity("site-1", fields(json!({"logo_key": "acme/site-1/logo.png"})), Some(1))
//!     .await?;
//! assert_eq!(*updated.version(), 2);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod entity;
mod json_file;
mod memory;
mod store;

#[cfg(feature = "database")]
mod postgres;
#[cfg(feature = "database")]
pub mod schema;

pub use entity::{Entity, Fields, apply_patch, fields};
pub use json_file::JsonFileMetadataStore;
pub use memory::MemoryMetadataStore;
pub use store::MetadataStore;
pub use vellum_error::{MetadataError, MetadataErrorKind, MetadataResult};

#[cfg(feature = "database")]
pub use postgres::{PostgresMetadataStore, establish_pool, run_migrations};
