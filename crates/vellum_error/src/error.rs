//! Top-level error wrapper types.

use crate::{AssetError, ConfigError, MetadataError, StorageError};

/// Every error the Vellum crates can produce.
///
/// # Examples
///
/// ```
/// use vellum_error::{StorageError, StorageErrorKind, VellumError};
///
/// let storage_err = StorageError::new(StorageErrorKind::Unavailable("disk full".to_string()));
/// let err: VellumError = storage_err.into();
/// assert!(format!("{}", err).contains("Storage Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum VellumErrorKind {
    /// Blob storage error
    #[from(StorageError)]
    Storage(StorageError),
    /// Metadata store error
    #[from(MetadataError)]
    Metadata(MetadataError),
    /// Asset lifecycle error
    #[from(AssetError)]
    Asset(AssetError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Vellum error with kind discrimination.
///
/// # Examples
///
/// ```
/// use vellum_error::{ConfigError, VellumResult};
///
/// fn load() -> VellumResult<()> {
///     Err(ConfigError::new("Missing [storage] section"))?
/// }
///
/// assert!(load().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Vellum Error: {}", _0)]
pub struct VellumError(Box<VellumErrorKind>);

impl VellumError {
    /// Create a new error from a kind.
    pub fn new(kind: VellumErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &VellumErrorKind {
        &self.0
    }
}

// Generic From implementation for any type that converts to VellumErrorKind
impl<T> From<T> for VellumError
where
    T: Into<VellumErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Vellum operations.
pub type VellumResult<T> = std::result::Result<T, VellumError>;
