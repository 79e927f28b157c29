//! Upload payloads.

/// One file submitted for upload.
#[derive(Debug, Clone, PartialEq, Eq, derive_getters::Getters)]
pub struct AssetFile {
    /// Client-supplied file name
    filename: String,
    /// Declared MIME type
    content_type: String,
    /// Raw content
    data: Vec<u8>,
}

impl AssetFile {
    /// Create a new upload payload.
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }
}
