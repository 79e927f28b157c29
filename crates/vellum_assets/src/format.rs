//! Image formats and their content types and extensions.

use strum::IntoEnumIterator;

/// Image formats with a canonical file extension.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::EnumIter,
    derive_more::Display,
)]
pub enum ImageFormat {
    /// JPEG
    #[display("jpeg")]
    Jpeg,
    /// PNG
    #[display("png")]
    Png,
    /// WebP
    #[display("webp")]
    Webp,
    /// GIF
    #[display("gif")]
    Gif,
    /// AVIF
    #[display("avif")]
    Avif,
    /// SVG
    #[display("svg")]
    Svg,
}

impl ImageFormat {
    /// Canonical MIME type.
    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Webp => "image/webp",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Avif => "image/avif",
            ImageFormat::Svg => "image/svg+xml",
        }
    }

    /// Canonical file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Webp => "webp",
            ImageFormat::Gif => "gif",
            ImageFormat::Avif => "avif",
            ImageFormat::Svg => "svg",
        }
    }

    /// Look a format up by MIME type, ignoring case and parameters.
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = normalize_content_type(content_type);
        if essence == "image/jpg" || essence == "image/pjpeg" {
            return Some(ImageFormat::Jpeg);
        }
        ImageFormat::iter().find(|f| f.content_type() == essence)
    }

    /// Look a format up by file extension, ignoring case.
    pub fn from_extension(extension: &str) -> Option<Self> {
        let extension = extension.trim_start_matches('.').to_ascii_lowercase();
        if extension == "jpeg" || extension == "jpe" {
            return Some(ImageFormat::Jpeg);
        }
        ImageFormat::iter().find(|f| f.extension() == extension)
    }
}

/// Lowercased MIME type without parameters (`image/PNG; q=1` becomes `image/png`).
pub fn normalize_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// File extension to use for content of the given MIME type.
///
/// Known image formats get their canonical extension; anything else falls
/// back to an alphanumeric MIME subtype (`application/pdf` becomes `pdf`).
pub fn extension_for(content_type: &str) -> Option<String> {
    if let Some(format) = ImageFormat::from_content_type(content_type) {
        return Some(format.extension().to_string());
    }

    let essence = normalize_content_type(content_type);
    let (_, subtype) = essence.split_once('/')?;
    (!subtype.is_empty() && subtype.chars().all(|c| c.is_ascii_alphanumeric()))
        .then(|| subtype.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_lookup_ignores_case_and_params() {
        assert_eq!(
            ImageFormat::from_content_type("Image/JPEG; charset=binary"),
            Some(ImageFormat::Jpeg)
        );
        assert_eq!(ImageFormat::from_content_type("image/svg+xml"), Some(ImageFormat::Svg));
        assert_eq!(ImageFormat::from_content_type("text/html"), None);
    }

    #[test]
    fn jpeg_aliases_share_one_extension() {
        assert_eq!(ImageFormat::from_extension(".JPEG"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::from_content_type("image/jpg"), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::Jpeg.extension(), "jpg");
    }

    #[test]
    fn extension_falls_back_to_subtype() {
        assert_eq!(extension_for("image/jpeg").as_deref(), Some("jpg"));
        assert_eq!(extension_for("application/pdf").as_deref(), Some("pdf"));
        assert_eq!(extension_for("application/vnd.ms-excel"), None);
        assert_eq!(extension_for("garbage"), None);
    }
}
