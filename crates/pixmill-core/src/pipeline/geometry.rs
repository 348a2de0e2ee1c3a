//! Resize and rotate stages.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, RgbaImage};

use super::color::to_color_type;

/// Dimensions that fit `width`x`height` inside the box, preserving aspect.
///
/// Images already inside the box keep their size; nothing is ever upscaled.
pub fn fit_dimensions(width: u32, height: u32, max_width: u32, max_height: u32) -> (u32, u32) {
    if width <= max_width && height <= max_height {
        return (width, height);
    }
    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let new_width = ((width as f64 * ratio).round() as u32).clamp(1, max_width);
    let new_height = ((height as f64 * ratio).round() as u32).clamp(1, max_height);
    (new_width, new_height)
}

/// Scale down to fit within the box (thumbnail semantics).
pub fn fit_within(image: DynamicImage, max_width: u32, max_height: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (new_width, new_height) = fit_dimensions(width, height, max_width, max_height);
    if (new_width, new_height) == (width, height) {
        return image;
    }
    image.resize_exact(new_width, new_height, FilterType::Lanczos3)
}

/// Resize to exactly the given dimensions, distorting aspect if needed.
pub fn stretch_to(image: DynamicImage, width: u32, height: u32) -> DynamicImage {
    if image.dimensions() == (width, height) {
        return image;
    }
    image.resize_exact(width.max(1), height.max(1), FilterType::Lanczos3)
}

/// Rotate counter-clockwise by `degrees`, expanding the canvas to fit.
///
/// Whole turns return the image untouched. Quarter turns are lossless
/// transpositions; any other angle samples nearest-neighbour and fills the
/// uncovered corners with transparent black.
pub fn rotate(image: DynamicImage, degrees: f32) -> DynamicImage {
    let angle = normalize_degrees(degrees);
    if angle == 0.0 {
        image
    } else if angle == 90.0 {
        image.rotate270()
    } else if angle == 180.0 {
        image.rotate180()
    } else if angle == 270.0 {
        image.rotate90()
    } else {
        rotate_expand(&image, angle)
    }
}

/// Angle in [0, 360).
///
/// `rem_euclid` rounds tiny negative angles up to exactly 360, which is
/// folded back to 0.
pub fn normalize_degrees(degrees: f32) -> f64 {
    let angle = (degrees as f64).rem_euclid(360.0);
    if angle >= 360.0 {
        0.0
    } else {
        angle
    }
}

fn rotate_expand(image: &DynamicImage, degrees: f64) -> DynamicImage {
    let (width, height) = image.dimensions();
    let (sin, cos) = degrees.to_radians().sin_cos();
    let (w, h) = (width as f64, height as f64);

    // Bounding box of the rotated corners; epsilon absorbs float noise
    let new_width = ((w * cos.abs() + h * sin.abs()) - 1e-9).ceil().max(1.0) as u32;
    let new_height = ((w * sin.abs() + h * cos.abs()) - 1e-9).ceil().max(1.0) as u32;

    let src = image.to_rgba8();
    let mut out = RgbaImage::new(new_width, new_height);
    let (cx, cy) = (w / 2.0, h / 2.0);
    let (ncx, ncy) = (new_width as f64 / 2.0, new_height as f64 / 2.0);

    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let dx = x as f64 + 0.5 - ncx;
        let dy = y as f64 + 0.5 - ncy;
        // Inverse of a counter-clockwise turn in y-down coordinates
        let sx = dx * cos - dy * sin + cx;
        let sy = dx * sin + dy * cos + cy;
        if sx >= 0.0 && sy >= 0.0 && sx < w && sy < h {
            *pixel = *src.get_pixel(sx as u32, sy as u32);
        }
    }

    to_color_type(DynamicImage::ImageRgba8(out), image.color())
}
