//! Asset lifecycle error types.
//!
//! The three kinds map onto what a caller can do about them: validation
//! failures are fatal for the given input, upload and commit failures can be
//! retried. Cleanup failures after a successful commit are not errors at all
//! and travel as warnings inside the operation outcome.

/// Asset operation failure conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum AssetErrorKind {
    /// Input rejected before any I/O
    #[display("Validation failed: {}", _0)]
    Validation(String),
    /// Blob write failed; no metadata was touched
    #[display("Upload of {} failed: {}", key, reason)]
    Upload {
        /// Key the blob was being written to
        key: String,
        /// Underlying storage failure
        reason: String,
    },
    /// Metadata update failed after upload; listed blobs are orphaned
    #[display("Commit to record {} failed: {} (orphaned: {:?})", record_id, reason, orphaned_keys)]
    Commit {
        /// Record whose update failed
        record_id: String,
        /// Blobs uploaded by the failed operation that nothing references
        orphaned_keys: Vec<String>,
        /// Underlying metadata failure
        reason: String,
    },
}

impl AssetErrorKind {
    /// Whether the caller may retry the same request.
    ///
    /// Commit retries are safe but not idempotent: each retry may leave
    /// another orphaned blob behind for the reconciler.
    pub fn is_retryable(&self) -> bool {
        match self {
            AssetErrorKind::Validation(_) => false,
            AssetErrorKind::Upload { .. } | AssetErrorKind::Commit { .. } => true,
        }
    }

    /// Blobs left behind by this failure.
    pub fn orphaned_keys(&self) -> &[String] {
        match self {
            AssetErrorKind::Commit { orphaned_keys, .. } => orphaned_keys,
            _ => &[],
        }
    }
}

/// Asset error with source location tracking.
///
/// # Examples
///
/// ```
/// use vellum_error::{AssetError, AssetErrorKind};
///
/// let err = AssetError::new(AssetErrorKind::Commit {
///     record_id: "site-1".to_string(),
///     orphaned_keys: vec!["acme/site-1/logo.png".to_string()],
///     reason: "connection reset".to_string(),
/// });
/// assert!(err.kind.is_retryable());
/// assert_eq!(err.kind.orphaned_keys(), ["acme/site-1/logo.png".to_string()]);
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Asset Error: {} at line {} in {}", kind, line, file)]
pub struct AssetError {
    /// The kind of error that occurred
    pub kind: AssetErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl AssetError {
    /// Create a new asset error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AssetErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a validation failure.
    #[track_caller]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(AssetErrorKind::Validation(message.into()))
    }
}

/// Result type for asset manager operations.
pub type AssetResult<T> = std::result::Result<T, AssetError>;
