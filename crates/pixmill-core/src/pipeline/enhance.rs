//! Tone enhancements and convolution filters.
//!
//! Each enhancement blends the image with a "degenerate" version of itself:
//! a factor of 1.0 is the identity, 0.0 yields the degenerate image, values
//! above 1.0 extrapolate away from it. Alpha is carried through unchanged.

use image::{DynamicImage, Rgba, RgbaImage};

use super::color::to_color_type;
use crate::types::Filter;

/// 3x3 or 5x5 integer kernel with a divisor and offset.
struct Kernel {
    size: usize,
    weights: &'static [f32],
    scale: f32,
    offset: f32,
}

#[rustfmt::skip]
const BLUR: Kernel = Kernel {
    size: 5,
    weights: &[
        1.0, 1.0, 1.0, 1.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 0.0, 0.0, 0.0, 1.0,
        1.0, 1.0, 1.0, 1.0, 1.0,
    ],
    scale: 16.0,
    offset: 0.0,
};

#[rustfmt::skip]
const SHARPEN: Kernel = Kernel {
    size: 3,
    weights: &[
        -2.0, -2.0, -2.0,
        -2.0, 32.0, -2.0,
        -2.0, -2.0, -2.0,
    ],
    scale: 16.0,
    offset: 0.0,
};

#[rustfmt::skip]
const EDGE_ENHANCE: Kernel = Kernel {
    size: 3,
    weights: &[
        -1.0, -1.0, -1.0,
        -1.0, 10.0, -1.0,
        -1.0, -1.0, -1.0,
    ],
    scale: 2.0,
    offset: 0.0,
};

#[rustfmt::skip]
const EMBOSS: Kernel = Kernel {
    size: 3,
    weights: &[
        -1.0, 0.0, 0.0,
         0.0, 1.0, 0.0,
         0.0, 0.0, 0.0,
    ],
    scale: 1.0,
    offset: 128.0,
};

#[rustfmt::skip]
const CONTOUR: Kernel = Kernel {
    size: 3,
    weights: &[
        -1.0, -1.0, -1.0,
        -1.0,  8.0, -1.0,
        -1.0, -1.0, -1.0,
    ],
    scale: 1.0,
    offset: 255.0,
};

/// Mild smoothing used as the degenerate image for sharpness.
#[rustfmt::skip]
const SMOOTH: Kernel = Kernel {
    size: 3,
    weights: &[
        1.0, 1.0, 1.0,
        1.0, 5.0, 1.0,
        1.0, 1.0, 1.0,
    ],
    scale: 13.0,
    offset: 0.0,
};

/// Scale brightness; 0.0 is black.
pub fn brightness(image: &DynamicImage, factor: f32) -> DynamicImage {
    with_rgba(image, |rgba| {
        let black = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([0, 0, 0, 255]));
        blend(&black, rgba, factor)
    })
}

/// Scale contrast around the mean luminance; 0.0 is flat gray.
pub fn contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    with_rgba(image, |rgba| {
        let count = u64::from(rgba.width()) * u64::from(rgba.height());
        let total: u64 = rgba.pixels().map(|p| u64::from(luma(p))).sum();
        let mean = if count == 0 {
            0
        } else {
            ((total as f64 / count as f64) + 0.5) as u8
        };
        let gray = RgbaImage::from_pixel(rgba.width(), rgba.height(), Rgba([mean, mean, mean, 255]));
        blend(&gray, rgba, factor)
    })
}

/// Scale color saturation; 0.0 is grayscale.
pub fn saturation(image: &DynamicImage, factor: f32) -> DynamicImage {
    with_rgba(image, |rgba| {
        let mut gray = rgba.clone();
        for p in gray.pixels_mut() {
            let l = luma(p);
            *p = Rgba([l, l, l, p[3]]);
        }
        blend(&gray, rgba, factor)
    })
}

/// Scale sharpness; 0.0 is a smoothed image, 2.0 a sharpened one.
pub fn sharpness(image: &DynamicImage, factor: f32) -> DynamicImage {
    with_rgba(image, |rgba| {
        let smooth = convolve(&rgba, &SMOOTH);
        blend(&smooth, rgba, factor)
    })
}

/// Apply one fixed filter.
pub fn apply_filter(image: &DynamicImage, filter: Filter) -> DynamicImage {
    let kernel = match filter {
        Filter::Blur => &BLUR,
        Filter::Sharpen => &SHARPEN,
        Filter::EdgeEnhance => &EDGE_ENHANCE,
        Filter::Emboss => &EMBOSS,
        Filter::Contour => &CONTOUR,
        // Keeps alpha as LumaA
        Filter::Grayscale => return image.grayscale(),
    };
    with_rgba(image, |rgba| convolve(&rgba, kernel))
}

/// Run `op` on an RGBA8 copy, then restore the input's channel layout.
fn with_rgba<F>(image: &DynamicImage, op: F) -> DynamicImage
where
    F: FnOnce(RgbaImage) -> RgbaImage,
{
    let out = op(image.to_rgba8());
    to_color_type(DynamicImage::ImageRgba8(out), image.color())
}

/// ITU-R 601-2 luma.
fn luma(p: &Rgba<u8>) -> u8 {
    let [r, g, b, _] = p.0;
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114 + 500) / 1000) as u8
}

/// `degenerate + (image - degenerate) * factor` on the color channels.
fn blend(degenerate: &RgbaImage, mut image: RgbaImage, factor: f32) -> RgbaImage {
    for (px, d) in image.pixels_mut().zip(degenerate.pixels()) {
        for c in 0..3 {
            let base = f32::from(d[c]);
            px[c] = clamp_u8(base + (f32::from(px[c]) - base) * factor);
        }
    }
    image
}

/// Convolve the color channels, clamping at the edges.
fn convolve(src: &RgbaImage, kernel: &Kernel) -> RgbaImage {
    let (width, height) = src.dimensions();
    let mut out = src.clone();
    if width == 0 || height == 0 {
        return out;
    }
    let radius = (kernel.size / 2) as i64;
    let (max_x, max_y) = (i64::from(width) - 1, i64::from(height) - 1);

    for (x, y, px) in out.enumerate_pixels_mut() {
        let mut acc = [0f32; 3];
        for ky in 0..kernel.size {
            let sy = (i64::from(y) + ky as i64 - radius).clamp(0, max_y) as u32;
            for kx in 0..kernel.size {
                let weight = kernel.weights[ky * kernel.size + kx];
                if weight == 0.0 {
                    continue;
                }
                let sx = (i64::from(x) + kx as i64 - radius).clamp(0, max_x) as u32;
                let sp = src.get_pixel(sx, sy);
                for (c, a) in acc.iter_mut().enumerate() {
                    *a += f32::from(sp[c]) * weight;
                }
            }
        }
        for (c, a) in acc.iter().enumerate() {
            px[c] = clamp_u8(a / kernel.scale + kernel.offset);
        }
    }
    out
}

fn clamp_u8(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
