/// CSS-equivalent filters for the edited image
///
/// Reproduces the preview filter chain `blur(Xpx) saturate(S)
/// contrast(C)` on raw pixels so the saved file matches what the
/// browser-style preview implies:
/// - blur: gaussian, sigma equal to the radius in pixels
/// - saturate: the standard luminance-preserving color matrix
/// - contrast: linear slope around the mid-gray point
///
/// Callers must skip this stage entirely for an identity FilterSpec;
/// a zero-valued pass is NOT applied as a no-op, which keeps the
/// no-filter output byte-identical to a plain re-encode.

use image::{DynamicImage, RgbaImage};

use crate::state::edit::FilterSpec;

/// Apply the full filter chain in order: blur, then saturate, then
/// contrast. Alpha is never touched.
pub fn apply(img: DynamicImage, spec: &FilterSpec) -> DynamicImage {
    debug_assert!(!spec.is_identity(), "identity filters must be skipped by the caller");

    let blurred = if spec.blur > 0.0 {
        img.blur(spec.blur)
    } else {
        img
    };

    if spec.enhance == 0 {
        return blurred;
    }

    let saturation = spec.saturation();
    let contrast = spec.contrast();

    let mut rgba = blurred.to_rgba8();
    apply_pixel_transform(&mut rgba, |r, g, b| {
        let (r, g, b) = saturate(r, g, b, saturation);
        (
            contrast_channel(r, contrast),
            contrast_channel(g, contrast),
            contrast_channel(b, contrast),
        )
    });

    DynamicImage::ImageRgba8(rgba)
}

/// Apply a per-pixel color transform to every pixel of the buffer.
/// `transform` receives (r, g, b) as f32 in 0..255 and returns the
/// same; results are rounded and clamped back to u8.
fn apply_pixel_transform<F>(img: &mut RgbaImage, transform: F)
where
    F: Fn(f32, f32, f32) -> (f32, f32, f32),
{
    for pixel in img.pixels_mut() {
        let [r, g, b, a] = pixel.0;
        let (nr, ng, nb) = transform(r as f32, g as f32, b as f32);
        pixel.0 = [
            nr.round().clamp(0.0, 255.0) as u8,
            ng.round().clamp(0.0, 255.0) as u8,
            nb.round().clamp(0.0, 255.0) as u8,
            a,
        ];
    }
}

/// The CSS saturate color matrix (ITU-R BT.709 luminance weights)
fn saturate(r: f32, g: f32, b: f32, s: f32) -> (f32, f32, f32) {
    let nr = (0.213 + 0.787 * s) * r + (0.715 - 0.715 * s) * g + (0.072 - 0.072 * s) * b;
    let ng = (0.213 - 0.213 * s) * r + (0.715 + 0.285 * s) * g + (0.072 - 0.072 * s) * b;
    let nb = (0.213 - 0.213 * s) * r + (0.715 - 0.715 * s) * g + (0.072 + 0.928 * s) * b;
    (nr, ng, nb)
}

/// The CSS contrast transfer function: slope `c` around mid-gray
fn contrast_channel(v: f32, c: f32) -> f32 {
    (v - 127.5) * c + 127.5
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid_image(color: [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba(color)))
    }

    #[test]
    fn test_saturate_factor_one_is_identity() {
        let (r, g, b) = saturate(100.0, 150.0, 200.0, 1.0);
        assert!((r - 100.0).abs() < 1e-3);
        assert!((g - 150.0).abs() < 1e-3);
        assert!((b - 200.0).abs() < 1e-3);
    }

    #[test]
    fn test_saturate_preserves_gray() {
        // Neutral pixels have no chroma to amplify
        let (r, g, b) = saturate(128.0, 128.0, 128.0, 2.0);
        assert!((r - 128.0).abs() < 1e-2);
        assert!((g - 128.0).abs() < 1e-2);
        assert!((b - 128.0).abs() < 1e-2);
    }

    #[test]
    fn test_contrast_formula() {
        assert_eq!(contrast_channel(127.5, 1.5), 127.5);
        assert_eq!(contrast_channel(100.0, 1.5), (100.0 - 127.5) * 1.5 + 127.5);
        assert_eq!(contrast_channel(0.0, 2.0), -127.5);
    }

    #[test]
    fn test_enhance_amplifies_saturation() {
        let mut spec = FilterSpec::new();
        spec.set_enhance(100);

        // A reddish pixel should move further from gray
        let result = apply(solid_image([180, 100, 100, 255]), &spec).to_rgba8();
        let px = result.get_pixel(4, 4).0;
        assert!(px[0] > 180, "red channel should increase, got {:?}", px);
        assert!(px[1] < 100, "green channel should decrease, got {:?}", px);
        assert_eq!(px[3], 255, "alpha must be untouched");
    }

    #[test]
    fn test_blur_spreads_edges() {
        // Half black, half white; blurring pulls the boundary toward gray
        let mut img = RgbaImage::from_pixel(16, 16, Rgba([0, 0, 0, 255]));
        for y in 0..16 {
            for x in 8..16 {
                img.put_pixel(x, y, Rgba([255, 255, 255, 255]));
            }
        }

        let mut spec = FilterSpec::new();
        spec.set_blur(3.0);
        let result = apply(DynamicImage::ImageRgba8(img), &spec).to_rgba8();

        let boundary = result.get_pixel(7, 8).0;
        assert!(boundary[0] > 0 && boundary[0] < 255);
    }

    #[test]
    fn test_blur_zero_with_enhance_skips_blur() {
        let mut spec = FilterSpec::new();
        spec.set_enhance(40);

        // Uniform image: saturate/contrast apply cleanly without blur
        let result = apply(solid_image([60, 60, 60, 255]), &spec).to_rgba8();
        let px = result.get_pixel(0, 0).0;
        // Gray stays gray under saturation; contrast pushes it darker
        let expected = contrast_channel(60.0, spec.contrast()).round() as u8;
        assert_eq!(px[0], expected);
        assert_eq!(px[0], px[1]);
        assert_eq!(px[1], px[2]);
    }
}
