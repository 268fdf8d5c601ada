/// Shared data structures for the application state
///
/// These structs represent the data model that flows between
/// the imaging/remote layers and the UI layer.

use serde::{Deserialize, Serialize};

/// A loaded source image, immutable once constructed.
///
/// Replaced wholesale when the user uploads a new file or promotes
/// an edited result to the new original.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceImage {
    /// Encoded file bytes exactly as read from disk (or round-tripped
    /// from a data URL)
    pub bytes: Vec<u8>,
    /// Mime type sniffed from the magic bytes
    pub mime_type: String,
    /// Pixel width of the decoded image
    pub width: u32,
    /// Pixel height of the decoded image
    pub height: u32,
    /// Display name, e.g. "IMG_0001.jpg" or "edited-image.png"
    pub filename: String,
}

/// The image part of a successful edit response.
#[derive(Debug, Clone, PartialEq)]
pub struct EditedImage {
    /// Decoded image bytes returned by the service
    pub bytes: Vec<u8>,
    /// Mime type the service reported for the returned image
    pub mime_type: String,
}

/// What the remote service produced for one edit request.
///
/// At least one of the two fields is present; a response with neither
/// is surfaced as an error by the client, never as an empty result.
#[derive(Debug, Clone, PartialEq)]
pub struct EditResult {
    /// The edited image, if the service returned one
    pub image: Option<EditedImage>,
    /// Natural-language commentary accompanying the edit, if any
    pub text: Option<String>,
}

/// Output format for saved images.
///
/// Selected by the user and persisted as a preference; independent of
/// the mime type the service returns internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// PNG (lossless)
    #[default]
    Png,
    /// JPEG at fixed high quality
    Jpeg,
}

impl OutputFormat {
    /// All selectable formats, in menu order
    pub const ALL: [OutputFormat; 2] = [OutputFormat::Png, OutputFormat::Jpeg];

    /// File extension used for downloads
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
        }
    }

    /// Mime type of the encoded output
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
        }
    }

    /// Mapping into the image crate's format enum
    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Jpeg => image::ImageFormat::Jpeg,
        }
    }

    /// Default filename for a saved edit, e.g. "edited-image.png"
    pub fn download_name(&self) -> String {
        format!("edited-image.{}", self.extension())
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Png => write!(f, "PNG"),
            Self::Jpeg => write!(f, "JPEG"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_names() {
        assert_eq!(OutputFormat::Png.download_name(), "edited-image.png");
        assert_eq!(OutputFormat::Jpeg.download_name(), "edited-image.jpg");
    }

    #[test]
    fn test_format_serialization() {
        let json = serde_json::to_string(&OutputFormat::Jpeg).unwrap();
        assert_eq!(json, "\"jpeg\"");
        let restored: OutputFormat = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, OutputFormat::Jpeg);
    }

    #[test]
    fn test_default_is_png() {
        assert_eq!(OutputFormat::default(), OutputFormat::Png);
    }
}
