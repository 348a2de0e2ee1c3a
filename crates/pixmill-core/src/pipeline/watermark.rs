//! Translucent text watermarks.

use ab_glyph::FontArc;
use image::{ColorType, DynamicImage, GenericImageView, Rgba, RgbaImage};
use std::path::Path;

use super::color::to_color_type;
use super::font::WatermarkFont;
use crate::types::{Watermark, WatermarkPosition};

/// Distance between the text box and the image edge.
pub const PADDING: i64 = 10;

/// Text height for an image: a twentieth of its shorter side.
pub fn font_size_for(width: u32, height: u32) -> u32 {
    width.min(height) / 20
}

/// Top-left corner of the text box for an anchor.
///
/// Text larger than the image yields coordinates past the edges; the
/// compositor clips rather than shrinking the text.
pub fn anchor(
    position: WatermarkPosition,
    (width, height): (u32, u32),
    (text_width, text_height): (u32, u32),
) -> (i64, i64) {
    let (w, h) = (i64::from(width), i64::from(height));
    let (tw, th) = (i64::from(text_width), i64::from(text_height));
    match position {
        WatermarkPosition::TopLeft => (PADDING, PADDING),
        WatermarkPosition::TopRight => (w - tw - PADDING, PADDING),
        WatermarkPosition::BottomLeft => (PADDING, h - th - PADDING),
        WatermarkPosition::BottomRight => (w - tw - PADDING, h - th - PADDING),
        WatermarkPosition::Center => ((w - tw) / 2, (h - th) / 2),
    }
}

/// Renders watermark text and composites it onto images.
#[derive(Clone, Default)]
pub struct WatermarkCompositor {
    font: Option<FontArc>,
}

impl std::fmt::Debug for WatermarkCompositor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkCompositor")
            .field("scalable_font", &self.font.is_some())
            .finish()
    }
}

impl WatermarkCompositor {
    /// Compositor using only the built-in bitmap face.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compositor using a scalable font.
    pub fn with_font(font: FontArc) -> Self {
        Self { font: Some(font) }
    }

    /// Load a TrueType/OpenType font, falling back to the bitmap face if the
    /// path is absent or unreadable.
    pub fn load(font_path: Option<&Path>) -> Self {
        let Some(path) = font_path else {
            return Self::new();
        };
        let loaded = std::fs::read(path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| FontArc::try_from_vec(bytes).map_err(|e| e.to_string()));
        match loaded {
            Ok(font) => {
                tracing::debug!("Loaded watermark font from {:?}", path);
                Self::with_font(font)
            }
            Err(e) => {
                tracing::warn!(
                    "Cannot load watermark font {:?}: {}. Using built-in font.",
                    path,
                    e
                );
                Self::new()
            }
        }
    }

    pub fn has_scalable_font(&self) -> bool {
        self.font.is_some()
    }

    /// Composite `watermark` onto a copy of `image`.
    ///
    /// The result keeps the input's dimensions and channel layout.
    pub fn apply(&self, image: &DynamicImage, watermark: &Watermark) -> DynamicImage {
        let (width, height) = image.dimensions();
        let font = WatermarkFont::for_size(self.font.as_ref(), font_size_for(width, height));
        let text_size = font.measure(&watermark.text);
        let origin = anchor(watermark.position, (width, height), text_size);

        let alpha = (watermark.opacity.clamp(0.0, 1.0) * 255.0).round();
        let mut overlay = RgbaImage::new(width, height);
        font.render(&watermark.text, origin, |x, y, coverage| {
            if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                return;
            }
            let a = (alpha * coverage.clamp(0.0, 1.0)).round() as u8;
            let px = overlay.get_pixel_mut(x as u32, y as u32);
            if a > px[3] {
                *px = Rgba([255, 255, 255, a]);
            }
        });

        let mut base = image.to_rgba8();
        composite_over(&mut base, &overlay);

        let out = DynamicImage::ImageRgba8(base);
        if image.color() == ColorType::Rgba8 {
            out
        } else {
            to_color_type(out, image.color())
        }
    }
}

/// Porter-Duff "over": `overlay` on top of `base`, in place.
fn composite_over(base: &mut RgbaImage, overlay: &RgbaImage) {
    for (dst, src) in base.pixels_mut().zip(overlay.pixels()) {
        let sa = f32::from(src[3]) / 255.0;
        if sa == 0.0 {
            continue;
        }
        let da = f32::from(dst[3]) / 255.0;
        let out_a = sa + da * (1.0 - sa);
        for c in 0..3 {
            let blended =
                (f32::from(src[c]) * sa + f32::from(dst[c]) * da * (1.0 - sa)) / out_a;
            dst[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    const MONO: &[u8] = include_bytes!("../../tests/fixtures/DejaVuSansMono.ttf");

    fn mono() -> FontArc {
        FontArc::try_from_slice(MONO).unwrap()
    }

    /// Pixels that differ from `background`.
    fn ink(image: &RgbaImage, background: [u8; 4]) -> Vec<(u32, u32)> {
        image
            .enumerate_pixels()
            .filter(|(_, _, p)| p.0 != background)
            .map(|(x, y, _)| (x, y))
            .collect()
    }

    fn stamp(text: &str, position: WatermarkPosition, opacity: f32) -> Watermark {
        Watermark {
            text: text.to_string(),
            position,
            opacity,
        }
    }

    #[test]
    fn test_font_size_for() {
        assert_eq!(font_size_for(800, 600), 30);
        assert_eq!(font_size_for(19, 400), 0);
    }

    #[test]
    fn test_anchor_positions() {
        let image = (200, 100);
        let text = (50, 10);
        assert_eq!(anchor(WatermarkPosition::TopLeft, image, text), (10, 10));
        assert_eq!(anchor(WatermarkPosition::TopRight, image, text), (140, 10));
        assert_eq!(anchor(WatermarkPosition::BottomLeft, image, text), (10, 80));
        assert_eq!(anchor(WatermarkPosition::BottomRight, image, text), (140, 80));
        assert_eq!(anchor(WatermarkPosition::Center, image, text), (75, 45));
    }

    #[test]
    fn test_anchor_allows_overflow() {
        let (x, _) = anchor(WatermarkPosition::BottomRight, (30, 30), (100, 7));
        assert!(x < 0);
    }

    #[test]
    fn test_full_opacity_occludes() {
        // 200px -> size 10 -> bitmap scale 1; "H" has a full left column
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 200, Rgba([200, 0, 0, 255])));
        let out = WatermarkCompositor::new()
            .apply(&base, &stamp("H", WatermarkPosition::TopLeft, 1.0))
            .to_rgba8();

        assert_eq!(out.get_pixel(10, 12).0, [255, 255, 255, 255]);
        assert_eq!(out.get_pixel(100, 100).0, [200, 0, 0, 255]);
    }

    #[test]
    fn test_partial_opacity_raises_alpha() {
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(200, 200, Rgba([0, 0, 255, 100])));
        let out = WatermarkCompositor::new()
            .apply(&base, &stamp("H", WatermarkPosition::TopLeft, 0.5))
            .to_rgba8();

        let covered = out.get_pixel(10, 12);
        assert!(covered[3] > 100, "alpha {} not raised", covered[3]);
        assert!(covered[0] > 0);
        assert_eq!(out.get_pixel(150, 150).0, [0, 0, 255, 100]);
    }

    #[test]
    fn test_keeps_dimensions_and_layout() {
        let base = DynamicImage::ImageRgb8(RgbImage::from_pixel(120, 80, Rgb([0, 0, 0])));
        let out = WatermarkCompositor::new().apply(&base, &Watermark::default());
        assert_eq!(out.dimensions(), (120, 80));
        assert_eq!(out.color(), ColorType::Rgb8);
        assert_ne!(out, base);
    }

    #[test]
    fn test_tiny_image_does_not_panic() {
        let base = DynamicImage::new_rgb8(5, 5);
        let out = WatermarkCompositor::new()
            .apply(&base, &stamp("a very long watermark", WatermarkPosition::Center, 1.0));
        assert_eq!(out.dimensions(), (5, 5));
    }

    #[test]
    fn test_missing_font_falls_back() {
        let compositor = WatermarkCompositor::load(Some(Path::new("/nonexistent/font.ttf")));
        assert!(!compositor.has_scalable_font());
    }

    #[test]
    fn test_font_path_loads_scalable_face() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/DejaVuSansMono.ttf");
        assert!(WatermarkCompositor::load(Some(&path)).has_scalable_font());
    }

    #[test]
    fn test_scalable_text_occludes_inside_padding() {
        // 800px -> 40px text
        let red = [200, 0, 0, 255];
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(800, 800, Rgba(red)));
        let out = WatermarkCompositor::with_font(mono())
            .apply(&base, &stamp("MW", WatermarkPosition::BottomRight, 1.0))
            .to_rgba8();

        let inked = ink(&out, red);
        assert!(!inked.is_empty());
        assert!(inked.iter().any(|&(x, y)| out.get_pixel(x, y).0 == [255, 255, 255, 255]));

        let font = mono();
        let (tw, th) = WatermarkFont::for_size(Some(&font), 40).measure("MW");
        let limit = 800 - PADDING as u32;
        for &(x, y) in &inked {
            assert!(x < limit && y < limit, "({x}, {y}) inside padding");
            assert!(x + 1 >= limit - tw && y + 1 >= limit - th, "({x}, {y}) left of text box");
        }
    }

    #[test]
    fn test_scalable_text_top_left_padding_and_partial_opacity() {
        let blue = [0, 0, 255, 100];
        let base = DynamicImage::ImageRgba8(RgbaImage::from_pixel(400, 400, Rgba(blue)));
        let out = WatermarkCompositor::with_font(mono())
            .apply(&base, &stamp("Hi", WatermarkPosition::TopLeft, 0.5))
            .to_rgba8();

        let inked = ink(&out, blue);
        assert!(!inked.is_empty());
        for &(x, y) in &inked {
            assert!(x >= PADDING as u32 && y >= PADDING as u32, "({x}, {y}) inside padding");
            assert!(out.get_pixel(x, y)[3] > 100);
        }
        assert_eq!(out.get_pixel(300, 300).0, blue);
    }
}
