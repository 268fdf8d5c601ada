/// Text overlay rasterization
///
/// Lays out a single line of overlay text with ab_glyph, anchored to
/// one of nine grid positions with a fixed edge padding, and blends
/// the coverage into an RGBA buffer. Fonts come from the system via
/// font-kit, resolved by family name with platform fallbacks.

use ab_glyph::{point, Font, FontArc, GlyphId, PxScale, ScaleFont};
use image::RgbaImage;

use crate::state::edit::{
    FontFamily, HorizontalAlign, TextOverlaySpec, VerticalAlign,
};
use super::ImagingError;

/// Distance in pixels between the text anchor and the image edge
pub const EDGE_PADDING: f32 = 20.0;

/// Parse a hex color string like "#RRGGBB" (or "RRGGBBAA") into RGBA
pub fn parse_hex_color(input: &str) -> Option<[u8; 4]> {
    let hex = input.trim().trim_start_matches('#');
    let (rgb, alpha) = match hex.len() {
        6 => (hex, "ff"),
        8 => (&hex[0..6], &hex[6..8]),
        _ => return None,
    };

    let r = u8::from_str_radix(&rgb[0..2], 16).ok()?;
    let g = u8::from_str_radix(&rgb[2..4], 16).ok()?;
    let b = u8::from_str_radix(&rgb[4..6], 16).ok()?;
    let a = u8::from_str_radix(alpha, 16).ok()?;
    Some([r, g, b, a])
}

/// Load a font for the given family from the system.
/// Tries each candidate name in order, then any sans-serif.
pub fn load_font(family: FontFamily) -> Result<FontArc, ImagingError> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let mut names: Vec<FamilyName> = family
        .candidates()
        .iter()
        .map(|name| FamilyName::Title((*name).to_string()))
        .collect();
    names.push(FamilyName::SansSerif);

    let source = SystemSource::new();
    let handle = source
        .select_best_match(&names, &Properties::new())
        .map_err(|_| ImagingError::FontUnavailable(family.to_string()))?;

    let font_data = handle
        .load()
        .ok()
        .and_then(|f| f.copy_font_data())
        .ok_or_else(|| ImagingError::FontUnavailable(family.to_string()))?;

    FontArc::try_from_vec((*font_data).clone())
        .map_err(|_| ImagingError::FontUnavailable(family.to_string()))
}

/// Compute the anchor point for a text block.
///
/// Returns `(x, baseline_y)` where `x` is the alignment reference
/// (line start for left, line center for center, line end for right)
/// and `baseline_y` is where the glyph baseline sits. The bottom row
/// places the baseline exactly `EDGE_PADDING` above the bottom edge.
pub fn anchor_point(
    horizontal: HorizontalAlign,
    vertical: VerticalAlign,
    width: u32,
    height: u32,
    ascent: f32,
    descent: f32,
) -> (f32, f32) {
    let w = width as f32;
    let h = height as f32;

    let x = match horizontal {
        HorizontalAlign::Left => EDGE_PADDING,
        HorizontalAlign::Center => w / 2.0,
        HorizontalAlign::Right => w - EDGE_PADDING,
    };

    // ascent is positive, descent negative (ab_glyph convention)
    let baseline_y = match vertical {
        VerticalAlign::Top => EDGE_PADDING + ascent,
        VerticalAlign::Middle => h / 2.0 + (ascent + descent) / 2.0,
        VerticalAlign::Bottom => h - EDGE_PADDING,
    };

    (x, baseline_y)
}

/// Lay out one line of text, returning positioned glyph ids relative
/// to a left-aligned origin, plus the total advance width.
fn layout_line(font: &FontArc, text: &str, scale: PxScale) -> (Vec<(GlyphId, f32)>, f32) {
    let scaled = font.as_scaled(scale);

    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last_glyph: Option<GlyphId> = None;

    for ch in text.chars() {
        let glyph_id = font.glyph_id(ch);
        if let Some(prev) = last_glyph {
            cursor_x += scaled.kern(prev, glyph_id);
        }
        glyphs.push((glyph_id, cursor_x));
        cursor_x += scaled.h_advance(glyph_id);
        last_glyph = Some(glyph_id);
    }

    (glyphs, cursor_x)
}

/// Draw the overlay text onto the image.
///
/// The image is the already-filtered surface; the text itself is never
/// filtered. Does nothing for an empty overlay.
pub fn draw_overlay(
    img: &mut RgbaImage,
    overlay: &TextOverlaySpec,
    font: &FontArc,
) {
    if overlay.is_empty() {
        return;
    }

    let scale = PxScale::from(overlay.size_px as f32);
    let scaled = font.as_scaled(scale);
    let color = parse_hex_color(&overlay.color).unwrap_or([255, 255, 255, 255]);

    let (glyphs, total_width) = layout_line(font, &overlay.text, scale);

    let (anchor_x, baseline_y) = anchor_point(
        overlay.anchor.horizontal(),
        overlay.anchor.vertical(),
        img.width(),
        img.height(),
        scaled.ascent(),
        scaled.descent(),
    );

    // Shift the left-aligned layout so the anchor lands on the line
    // start, center or end
    let origin_x = match overlay.anchor.horizontal() {
        HorizontalAlign::Left => anchor_x,
        HorizontalAlign::Center => anchor_x - total_width / 2.0,
        HorizontalAlign::Right => anchor_x - total_width,
    };

    for (glyph_id, advance_x) in glyphs {
        let glyph = glyph_id
            .with_scale_and_position(scale, point(origin_x + advance_x, baseline_y));

        let Some(outlined) = font.outline_glyph(glyph) else {
            continue;
        };

        let bounds = outlined.px_bounds();
        outlined.draw(|gx, gy, coverage| {
            let px = bounds.min.x + gx as f32;
            let py = bounds.min.y + gy as f32;
            if px < 0.0 || py < 0.0 {
                return;
            }
            let (px, py) = (px as u32, py as u32);
            if px >= img.width() || py >= img.height() {
                return;
            }

            let alpha = coverage * (color[3] as f32 / 255.0);
            if alpha <= 0.0 {
                return;
            }

            let dst = img.get_pixel_mut(px, py);
            for c in 0..3 {
                let src = color[c] as f32;
                let old = dst.0[c] as f32;
                dst.0[c] = (src * alpha + old * (1.0 - alpha)).round() as u8;
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#FFFFFF"), Some([255, 255, 255, 255]));
        assert_eq!(parse_hex_color("#ff0000"), Some([255, 0, 0, 255]));
        assert_eq!(parse_hex_color("00ff00"), Some([0, 255, 0, 255]));
        assert_eq!(parse_hex_color("#12345678"), Some([0x12, 0x34, 0x56, 0x78]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gggggg"), None);
        assert_eq!(parse_hex_color(""), None);
    }

    #[test]
    fn test_bottom_center_anchor() {
        // Baseline sits exactly at the bottom edge minus the padding,
        // horizontally centered
        let (x, baseline) = anchor_point(
            HorizontalAlign::Center,
            VerticalAlign::Bottom,
            500,
            500,
            36.0,
            -9.0,
        );
        assert_eq!(x, 250.0);
        assert_eq!(baseline, 480.0);
    }

    #[test]
    fn test_top_left_anchor() {
        let (x, baseline) = anchor_point(
            HorizontalAlign::Left,
            VerticalAlign::Top,
            400,
            300,
            36.0,
            -9.0,
        );
        assert_eq!(x, EDGE_PADDING);
        // The glyph tops touch the padding line, so the baseline sits
        // one ascent below it
        assert_eq!(baseline, EDGE_PADDING + 36.0);
    }

    #[test]
    fn test_middle_right_anchor() {
        let (x, baseline) = anchor_point(
            HorizontalAlign::Right,
            VerticalAlign::Middle,
            400,
            300,
            36.0,
            -12.0,
        );
        assert_eq!(x, 380.0);
        // Text block (ascent 36, descent -12) centered on y=150:
        // baseline = 150 + (36 - 12) / 2
        assert_eq!(baseline, 162.0);
    }
}
