//! Error types for the Vellum asset lifecycle library.
//!
//! This crate provides the error taxonomy shared by the blob store, the
//! metadata store and the asset managers.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use vellum_error::{AssetError, AssetErrorKind, VellumResult};
//!
//! fn upload() -> VellumResult<()> {
//!     Err(AssetError::new(AssetErrorKind::Validation(
//!         "content type text/html is not allowed".to_string(),
//!     )))?
//! }
//!
//! assert!(upload().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod asset;
mod config;
mod error;
mod metadata;
mod storage;

pub use asset::{AssetError, AssetErrorKind, AssetResult};
pub use config::ConfigError;
pub use error::{VellumError, VellumErrorKind, VellumResult};
pub use metadata::{MetadataError, MetadataErrorKind, MetadataResult};
pub use storage::{StorageError, StorageErrorKind, StorageResult};
