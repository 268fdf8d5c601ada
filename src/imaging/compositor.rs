/// Flattens the edited image for preview and save
///
/// Takes the raw edited bytes plus the current FilterSpec and
/// TextOverlaySpec and produces a single encoded image at the source's
/// natural resolution (never the on-screen size). The filter stage is
/// skipped outright when the spec is identity so a plain render stays
/// byte-identical to a format conversion; the text overlay is drawn
/// after filtering so it never inherits blur or saturation.

use image::DynamicImage;
use tokio::task;

use crate::state::data::OutputFormat;
use crate::state::edit::{FilterSpec, TextOverlaySpec};
use super::{codec, filters, text, ImagingError};

/// Render the flattened image: decode, filter, overlay, encode.
pub fn render(
    bytes: &[u8],
    filter_spec: &FilterSpec,
    overlay: &TextOverlaySpec,
    format: OutputFormat,
) -> Result<Vec<u8>, ImagingError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| ImagingError::Decode(e.to_string()))?;

    let filtered = if filter_spec.is_identity() {
        decoded
    } else {
        filters::apply(decoded, filter_spec)
    };

    let composed = if overlay.is_empty() {
        filtered
    } else {
        let font = text::load_font(overlay.font)?;
        let mut surface = filtered.to_rgba8();
        text::draw_overlay(&mut surface, overlay, &font);
        DynamicImage::ImageRgba8(surface)
    };

    codec::encode_image(&composed, format)
}

/// Render on a blocking thread so the UI loop never stalls on pixel
/// work. Takes owned inputs because the task outlives the caller.
pub async fn render_task(
    bytes: Vec<u8>,
    filter_spec: FilterSpec,
    overlay: TextOverlaySpec,
    format: OutputFormat,
) -> Result<Vec<u8>, ImagingError> {
    task::spawn_blocking(move || render(&bytes, &filter_spec, &overlay, format))
        .await
        .map_err(|e| ImagingError::Task(e.to_string()))?
}
