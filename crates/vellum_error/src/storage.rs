//! Blob storage error types.

/// Kinds of blob storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Key is empty, absolute, or contains traversal segments
    #[display("Invalid blob key: {}", _0)]
    InvalidKey(String),
    /// No blob stored under the key
    #[display("Blob not found: {}", _0)]
    NotFound(String),
    /// Failed to create a storage directory
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write blob content
    #[display("Failed to write blob: {}", _0)]
    Write(String),
    /// Failed to read blob content
    #[display("Failed to read blob: {}", _0)]
    Read(String),
    /// Failed to delete a blob
    #[display("Failed to delete blob: {}", _0)]
    Delete(String),
    /// Storage backend is unavailable
    #[display("Storage unavailable: {}", _0)]
    Unavailable(String),
}

/// Blob storage error with location tracking.
///
/// # Examples
///
/// ```
/// use vellum_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("acme/r1/logo.png".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether the error means the blob does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, StorageErrorKind::NotFound(_))
    }
}

/// Result type for blob storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;
