/// Local image processing module
///
/// This module handles everything that happens to pixels on this
/// machine:
/// - Encoding/decoding, mime sniffing and data URLs (codec.rs)
/// - CSS-equivalent blur/saturate/contrast filters (filters.rs)
/// - Text overlay rasterization (text.rs)
/// - Flattening filters + overlay into a saved image (compositor.rs)
///
/// The remote service never sees any of this; filters and overlays are
/// applied purely client-side.

use thiserror::Error;

pub mod codec;
pub mod compositor;
pub mod filters;
pub mod text;

/// Errors from local image processing
#[derive(Debug, Clone, Error)]
pub enum ImagingError {
    /// The file could not be read from disk
    #[error("Failed to read file: {0}")]
    Read(String),

    /// The image bytes could not be decoded
    #[error("Could not process the image: {0}")]
    Decode(String),

    /// The image could not be encoded to the target format
    #[error("Could not encode the image: {0}")]
    Encode(String),

    /// A data URL was malformed
    #[error("Not a valid data URL")]
    InvalidDataUrl,

    /// The bytes did not match any supported image format
    #[error("Unrecognized image format")]
    UnknownFormat,

    /// No installed font matched the requested family or its fallbacks
    #[error("No usable font found for {0}")]
    FontUnavailable(String),

    /// A background processing task died before finishing
    #[error("Background task failed: {0}")]
    Task(String),
}
