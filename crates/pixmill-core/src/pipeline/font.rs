//! Text measurement and rasterization for watermarks.
//!
//! A scalable font loaded from disk is used when available. Otherwise text is
//! drawn with a small built-in bitmap face, scaled by whole pixels.

use ab_glyph::{point, Font, FontArc, Glyph, PxScale, ScaleFont};

const GLYPH_WIDTH: u32 = 5;
const GLYPH_HEIGHT: u32 = 7;
/// Horizontal advance per glyph, including one column of spacing.
const GLYPH_ADVANCE: u32 = GLYPH_WIDTH + 1;

/// A face resolved for one image's font size.
pub enum WatermarkFont<'a> {
    Scalable { font: &'a FontArc, scale: PxScale },
    Bitmap { scale: u32 },
}

impl<'a> WatermarkFont<'a> {
    /// Pick the face for a target pixel height.
    ///
    /// A size of zero (images under 20px on a side) always uses the bitmap
    /// face at its native size.
    pub fn for_size(font: Option<&'a FontArc>, size: u32) -> Self {
        match font {
            Some(font) if size > 0 => WatermarkFont::Scalable {
                font,
                scale: PxScale::from(size as f32),
            },
            _ => WatermarkFont::Bitmap {
                scale: ((size as f32 / GLYPH_HEIGHT as f32).round() as u32).max(1),
            },
        }
    }

    /// Width and height of the rendered text's bounding box.
    pub fn measure(&self, text: &str) -> (u32, u32) {
        match self {
            WatermarkFont::Scalable { font, scale } => {
                let scaled = font.as_scaled(*scale);
                let width = layout(*font, *scale, text)
                    .last()
                    .map(|g| g.position.x + scaled.h_advance(g.id))
                    .unwrap_or(0.0);
                let height = scaled.ascent() - scaled.descent();
                (width.ceil() as u32, height.ceil() as u32)
            }
            WatermarkFont::Bitmap { scale } => {
                let count = text.chars().count() as u32;
                if count == 0 {
                    return (0, 0);
                }
                ((count * GLYPH_ADVANCE - 1) * scale, GLYPH_HEIGHT * scale)
            }
        }
    }

    /// Rasterize `text` with its bounding box's top-left at `origin`.
    ///
    /// `plot` receives every covered pixel with a coverage in [0, 1];
    /// coordinates may fall outside the image.
    pub fn render<F>(&self, text: &str, origin: (i64, i64), mut plot: F)
    where
        F: FnMut(i64, i64, f32),
    {
        match self {
            WatermarkFont::Scalable { font, scale } => {
                for glyph in layout(*font, *scale, text) {
                    let Some(outlined) = font.outline_glyph(glyph) else {
                        continue;
                    };
                    let bounds = outlined.px_bounds();
                    let (left, top) = (bounds.min.x as i64, bounds.min.y as i64);
                    outlined.draw(|x, y, coverage| {
                        plot(
                            origin.0 + left + i64::from(x),
                            origin.1 + top + i64::from(y),
                            coverage,
                        );
                    });
                }
            }
            WatermarkFont::Bitmap { scale } => {
                let scale = i64::from(*scale);
                for (index, ch) in text.chars().enumerate() {
                    let columns = bitmap_glyph(ch);
                    let glyph_left = origin.0 + index as i64 * i64::from(GLYPH_ADVANCE) * scale;
                    for (col, bits) in columns.iter().enumerate() {
                        for row in 0..GLYPH_HEIGHT as i64 {
                            if bits >> row & 1 == 0 {
                                continue;
                            }
                            let x0 = glyph_left + col as i64 * scale;
                            let y0 = origin.1 + row * scale;
                            for dy in 0..scale {
                                for dx in 0..scale {
                                    plot(x0 + dx, y0 + dy, 1.0);
                                }
                            }
                        }
                    }
                }
            }
        }
    }
}

/// Glyphs positioned on one line with kerning, baseline at the ascent.
fn layout(font: &FontArc, scale: PxScale, text: &str) -> Vec<Glyph> {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0;
    let mut previous = None;
    let mut glyphs = Vec::with_capacity(text.len());
    for ch in text.chars() {
        let id = scaled.glyph_id(ch);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        glyphs.push(id.with_scale_and_position(scale, point(caret, scaled.ascent())));
        caret += scaled.h_advance(id);
        previous = Some(id);
    }
    glyphs
}

/// Column bitmaps for `ch`, least significant bit at the top.
fn bitmap_glyph(ch: char) -> [u8; 5] {
    match ch {
        '©' => COPYRIGHT,
        ' '..='~' => ASCII[ch as usize - 0x20],
        _ => ASCII['?' as usize - 0x20],
    }
}

const COPYRIGHT: [u8; 5] = [0x3E, 0x5D, 0x55, 0x41, 0x3E];

/// Printable ASCII, 0x20 through 0x7E.
#[rustfmt::skip]
const ASCII: [[u8; 5]; 95] = [
    [0x00, 0x00, 0x00, 0x00, 0x00], [0x00, 0x00, 0x5F, 0x00, 0x00],
    [0x00, 0x07, 0x00, 0x07, 0x00], [0x14, 0x7F, 0x14, 0x7F, 0x14],
    [0x24, 0x2A, 0x7F, 0x2A, 0x12], [0x23, 0x13, 0x08, 0x64, 0x62],
    [0x36, 0x49, 0x55, 0x22, 0x50], [0x00, 0x05, 0x03, 0x00, 0x00],
    [0x00, 0x1C, 0x22, 0x41, 0x00], [0x00, 0x41, 0x22, 0x1C, 0x00],
    [0x08, 0x2A, 0x1C, 0x2A, 0x08], [0x08, 0x08, 0x3E, 0x08, 0x08],
    [0x00, 0x50, 0x30, 0x00, 0x00], [0x08, 0x08, 0x08, 0x08, 0x08],
    [0x00, 0x60, 0x60, 0x00, 0x00], [0x20, 0x10, 0x08, 0x04, 0x02],
    [0x3E, 0x51, 0x49, 0x45, 0x3E], [0x00, 0x42, 0x7F, 0x40, 0x00],
    [0x42, 0x61, 0x51, 0x49, 0x46], [0x21, 0x41, 0x45, 0x4B, 0x31],
    [0x18, 0x14, 0x12, 0x7F, 0x10], [0x27, 0x45, 0x45, 0x45, 0x39],
    [0x3C, 0x4A, 0x49, 0x49, 0x30], [0x01, 0x71, 0x09, 0x05, 0x03],
    [0x36, 0x49, 0x49, 0x49, 0x36], [0x06, 0x49, 0x49, 0x29, 0x1E],
    [0x00, 0x36, 0x36, 0x00, 0x00], [0x00, 0x56, 0x36, 0x00, 0x00],
    [0x00, 0x08, 0x14, 0x22, 0x41], [0x14, 0x14, 0x14, 0x14, 0x14],
    [0x41, 0x22, 0x14, 0x08, 0x00], [0x02, 0x01, 0x51, 0x09, 0x06],
    [0x32, 0x49, 0x79, 0x41, 0x3E], [0x7E, 0x11, 0x11, 0x11, 0x7E],
    [0x7F, 0x49, 0x49, 0x49, 0x36], [0x3E, 0x41, 0x41, 0x41, 0x22],
    [0x7F, 0x41, 0x41, 0x22, 0x1C], [0x7F, 0x49, 0x49, 0x49, 0x41],
    [0x7F, 0x09, 0x09, 0x01, 0x01], [0x3E, 0x41, 0x41, 0x51, 0x32],
    [0x7F, 0x08, 0x08, 0x08, 0x7F], [0x00, 0x41, 0x7F, 0x41, 0x00],
    [0x20, 0x40, 0x41, 0x3F, 0x01], [0x7F, 0x08, 0x14, 0x22, 0x41],
    [0x7F, 0x40, 0x40, 0x40, 0x40], [0x7F, 0x02, 0x04, 0x02, 0x7F],
    [0x7F, 0x04, 0x08, 0x10, 0x7F], [0x3E, 0x41, 0x41, 0x41, 0x3E],
    [0x7F, 0x09, 0x09, 0x09, 0x06], [0x3E, 0x41, 0x51, 0x21, 0x5E],
    [0x7F, 0x09, 0x19, 0x29, 0x46], [0x46, 0x49, 0x49, 0x49, 0x31],
    [0x01, 0x01, 0x7F, 0x01, 0x01], [0x3F, 0x40, 0x40, 0x40, 0x3F],
    [0x1F, 0x20, 0x40, 0x20, 0x1F], [0x7F, 0x20, 0x18, 0x20, 0x7F],
    [0x63, 0x14, 0x08, 0x14, 0x63], [0x03, 0x04, 0x78, 0x04, 0x03],
    [0x61, 0x51, 0x49, 0x45, 0x43], [0x00, 0x00, 0x7F, 0x41, 0x41],
    [0x02, 0x04, 0x08, 0x10, 0x20], [0x41, 0x41, 0x7F, 0x00, 0x00],
    [0x04, 0x02, 0x01, 0x02, 0x04], [0x40, 0x40, 0x40, 0x40, 0x40],
    [0x00, 0x01, 0x02, 0x04, 0x00], [0x20, 0x54, 0x54, 0x54, 0x78],
    [0x7F, 0x48, 0x44, 0x44, 0x38], [0x38, 0x44, 0x44, 0x44, 0x20],
    [0x38, 0x44, 0x44, 0x48, 0x7F], [0x38, 0x54, 0x54, 0x54, 0x18],
    [0x08, 0x7E, 0x09, 0x01, 0x02], [0x08, 0x14, 0x54, 0x54, 0x3C],
    [0x7F, 0x08, 0x04, 0x04, 0x78], [0x00, 0x44, 0x7D, 0x40, 0x00],
    [0x20, 0x40, 0x44, 0x3D, 0x00], [0x00, 0x7F, 0x10, 0x28, 0x44],
    [0x00, 0x41, 0x7F, 0x40, 0x00], [0x7C, 0x04, 0x18, 0x04, 0x78],
    [0x7C, 0x08, 0x04, 0x04, 0x78], [0x38, 0x44, 0x44, 0x44, 0x38],
    [0x7C, 0x14, 0x14, 0x14, 0x08], [0x08, 0x14, 0x14, 0x18, 0x7C],
    [0x7C, 0x08, 0x04, 0x04, 0x08], [0x48, 0x54, 0x54, 0x54, 0x20],
    [0x04, 0x3F, 0x44, 0x40, 0x20], [0x3C, 0x40, 0x40, 0x20, 0x7C],
    [0x1C, 0x20, 0x40, 0x20, 0x1C], [0x3C, 0x40, 0x30, 0x40, 0x3C],
    [0x44, 0x28, 0x10, 0x28, 0x44], [0x0C, 0x50, 0x50, 0x50, 0x3C],
    [0x44, 0x64, 0x54, 0x4C, 0x44], [0x00, 0x08, 0x36, 0x41, 0x00],
    [0x00, 0x00, 0x7F, 0x00, 0x00], [0x00, 0x41, 0x36, 0x08, 0x00],
    [0x08, 0x04, 0x08, 0x10, 0x08],
];
