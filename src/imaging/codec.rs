/// Image encoding, decoding and data URL utilities
///
/// Converts between the three byte shapes the application juggles:
/// encoded files on disk, base64 payloads for the remote service, and
/// data URLs for the edited-as-new-original round trip. Also owns the
/// format conversion used when saving (PNG lossless, JPEG at a fixed
/// high quality).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat};
use std::io::Cursor;
use std::path::Path;

use crate::state::data::{OutputFormat, SourceImage};
use super::ImagingError;

/// JPEG quality used for every lossy encode (the canvas 0.95 setting)
pub const JPEG_QUALITY: u8 = 95;

/// Sniff a mime type from the magic bytes of an encoded image
pub fn sniff_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 12 {
        return None;
    }

    // PNG: 89 50 4E 47 0D 0A 1A 0A
    if bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return Some("image/png");
    }

    // JPEG: FF D8 FF
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Some("image/jpeg");
    }

    // WebP: RIFF....WEBP
    if bytes.starts_with(b"RIFF") && &bytes[8..12] == b"WEBP" {
        return Some("image/webp");
    }

    None
}

/// File extension matching a mime type, for generated filenames
pub fn extension_for_mime(mime_type: &str) -> &'static str {
    match mime_type {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        _ => "img",
    }
}

/// Load a source image from a file on disk
///
/// Reads the bytes, sniffs the mime type and decodes once to learn the
/// pixel dimensions. The decoded pixels are thrown away; the original
/// bytes are what gets sent to the service.
pub fn load_source(path: &Path) -> Result<SourceImage, ImagingError> {
    let bytes = std::fs::read(path).map_err(|e| ImagingError::Read(e.to_string()))?;

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".to_string());

    source_from_bytes(bytes, filename)
}

/// Build a source image from already-loaded encoded bytes
pub fn source_from_bytes(bytes: Vec<u8>, filename: String) -> Result<SourceImage, ImagingError> {
    let mime_type = sniff_mime_type(&bytes)
        .ok_or(ImagingError::UnknownFormat)?
        .to_string();

    let decoded =
        image::load_from_memory(&bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;

    Ok(SourceImage {
        width: decoded.width(),
        height: decoded.height(),
        bytes,
        mime_type,
        filename,
    })
}

/// Encode bytes as base64 for the service payload
pub fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Wrap encoded image bytes in a data URL
pub fn to_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, encode_base64(bytes))
}

/// Split a data URL back into its mime type and raw bytes
pub fn parse_data_url(url: &str) -> Result<(String, Vec<u8>), ImagingError> {
    let rest = url.strip_prefix("data:").ok_or(ImagingError::InvalidDataUrl)?;
    let (header, payload) = rest.split_once(',').ok_or(ImagingError::InvalidDataUrl)?;

    let mime_type = header
        .strip_suffix(";base64")
        .ok_or(ImagingError::InvalidDataUrl)?;
    if mime_type.is_empty() {
        return Err(ImagingError::InvalidDataUrl);
    }

    let bytes = BASE64
        .decode(payload.as_bytes())
        .map_err(|_| ImagingError::InvalidDataUrl)?;

    Ok((mime_type.to_string(), bytes))
}

/// Round-trip a data URL into a new source image
///
/// This is the file-like conversion behind "use edited image as new
/// original": the edited bytes re-enter the normal upload path.
pub fn source_from_data_url(url: &str, filename: &str) -> Result<SourceImage, ImagingError> {
    let (_, bytes) = parse_data_url(url)?;
    source_from_bytes(bytes, filename.to_string())
}

/// Re-encode image bytes into the target output format
pub fn convert_format(bytes: &[u8], target: OutputFormat) -> Result<Vec<u8>, ImagingError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;
    encode_image(&decoded, target)
}

/// Encode a decoded image into the target output format
///
/// PNG is lossless; JPEG flattens to opaque RGB at the fixed quality.
/// The compositor funnels through this same function so a no-filter
/// render and a plain conversion produce identical bytes.
pub fn encode_image(img: &DynamicImage, target: OutputFormat) -> Result<Vec<u8>, ImagingError> {
    let mut out = Vec::new();

    match target {
        OutputFormat::Png => {
            img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
                .map_err(|e| ImagingError::Encode(e.to_string()))?;
        }
        OutputFormat::Jpeg => {
            // JPEG has no alpha channel
            let rgb = img.to_rgb8();
            let mut cursor = Cursor::new(&mut out);
            let encoder = JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY);
            rgb.write_with_encoder(encoder)
                .map_err(|e| ImagingError::Encode(e.to_string()))?;
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;

    /// A small test image with enough variation to notice corruption
    fn test_png_bytes() -> Vec<u8> {
        let img = RgbaImage::from_fn(16, 12, |x, y| {
            image::Rgba([(x * 16) as u8, (y * 20) as u8, 128, 255])
        });
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_sniff_mime_type() {
        assert_eq!(sniff_mime_type(&test_png_bytes()), Some("image/png"));
        assert_eq!(sniff_mime_type(b"not an image at all"), None);

        let jpeg = convert_format(&test_png_bytes(), OutputFormat::Jpeg).unwrap();
        assert_eq!(sniff_mime_type(&jpeg), Some("image/jpeg"));
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("image/png"), "png");
        assert_eq!(extension_for_mime("image/jpeg"), "jpg");
        assert_eq!(extension_for_mime("application/octet-stream"), "img");
    }

    #[test]
    fn test_data_url_round_trip_preserves_bytes() {
        let bytes = test_png_bytes();
        let url = to_data_url("image/png", &bytes);
        assert!(url.starts_with("data:image/png;base64,"));

        let (mime, restored) = parse_data_url(&url).unwrap();
        assert_eq!(mime, "image/png");
        assert_eq!(restored, bytes);
    }

    #[test]
    fn test_source_from_data_url() {
        let bytes = test_png_bytes();
        let url = to_data_url("image/png", &bytes);

        let source = source_from_data_url(&url, "edited-image.png").unwrap();
        assert_eq!(source.bytes, bytes);
        assert_eq!(source.mime_type, "image/png");
        assert_eq!(source.width, 16);
        assert_eq!(source.height, 12);
        assert_eq!(source.filename, "edited-image.png");
    }

    #[test]
    fn test_parse_data_url_rejects_garbage() {
        assert!(parse_data_url("http://example.com/a.png").is_err());
        assert!(parse_data_url("data:image/png;base64").is_err());
        assert!(parse_data_url("data:image/png,plain").is_err());
        assert!(parse_data_url("data:image/png;base64,@@@@").is_err());
    }

    #[test]
    fn test_convert_to_jpeg_produces_distinct_jpeg_bytes() {
        let png = test_png_bytes();
        let jpeg = convert_format(&png, OutputFormat::Jpeg).unwrap();

        assert_ne!(jpeg, png);
        assert!(jpeg.starts_with(&[0xFF, 0xD8, 0xFF]));

        // The converted bytes decode to the same dimensions
        let decoded = image::load_from_memory(&jpeg).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (16, 12));
    }

    #[test]
    fn test_load_source_from_disk() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("photo.png");
        std::fs::write(&path, test_png_bytes()).unwrap();

        let source = load_source(&path).unwrap();
        assert_eq!(source.mime_type, "image/png");
        assert_eq!(source.filename, "photo.png");
        assert_eq!((source.width, source.height), (16, 12));
    }

    #[test]
    fn test_load_source_rejects_non_image() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "hello this is definitely text").unwrap();

        assert!(matches!(
            load_source(&path),
            Err(ImagingError::UnknownFormat)
        ));
    }
}
