//! Metadata store error types.

/// Metadata store error conditions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum MetadataErrorKind {
    /// Record not found
    #[display("Record not found: {}", _0)]
    NotFound(String),
    /// Record id cannot be used as a storage identifier
    #[display("Invalid record id: {}", _0)]
    InvalidId(String),
    /// Record already exists
    #[display("Record already exists: {}", _0)]
    AlreadyExists(String),
    /// Conditional update saw a different version
    #[display("Version conflict: expected {}, found {}", expected, actual)]
    Conflict {
        /// Version the caller read
        expected: u64,
        /// Version currently stored
        actual: u64,
    },
    /// Serialization/deserialization error
    #[display("Serialization error: {}", _0)]
    Serialization(String),
    /// Connection failed
    #[display("Metadata store connection error: {}", _0)]
    Connection(String),
    /// Query execution failed
    #[display("Metadata store query error: {}", _0)]
    Query(String),
    /// Filesystem error in a file-backed store
    #[display("Metadata store I/O error: {}", _0)]
    Io(String),
    /// Migration error
    #[display("Migration error: {}", _0)]
    Migration(String),
}

/// Metadata store error with source location tracking.
///
/// # Examples
///
/// ```
/// use vellum_error::{MetadataError, MetadataErrorKind};
///
/// let err = MetadataError::new(MetadataErrorKind::Conflict { expected: 3, actual: 4 });
/// assert!(err.is_conflict());
/// assert!(format!("{}", err).contains("expected 3"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Metadata Error: {} at line {} in {}", kind, line, file)]
pub struct MetadataError {
    /// The kind of error that occurred
    pub kind: MetadataErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl MetadataError {
    /// Create a new MetadataError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: MetadataErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Whether a conditional update lost against a concurrent writer.
    pub fn is_conflict(&self) -> bool {
        matches!(self.kind, MetadataErrorKind::Conflict { .. })
    }

    /// Whether the record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self.kind, MetadataErrorKind::NotFound(_))
    }
}

/// Result type for metadata store operations.
pub type MetadataResult<T> = std::result::Result<T, MetadataError>;

// Diesel error conversions (only available with database feature)
#[cfg(feature = "database")]
impl From<diesel::result::Error> for MetadataError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                MetadataError::new(MetadataErrorKind::NotFound("row".to_string()))
            }
            _ => MetadataError::new(MetadataErrorKind::Query(err.to_string())),
        }
    }
}

#[cfg(feature = "database")]
impl From<diesel::ConnectionError> for MetadataError {
    fn from(err: diesel::ConnectionError) -> Self {
        MetadataError::new(MetadataErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "database")]
impl From<serde_json::Error> for MetadataError {
    fn from(err: serde_json::Error) -> Self {
        MetadataError::new(MetadataErrorKind::Serialization(err.to_string()))
    }
}
