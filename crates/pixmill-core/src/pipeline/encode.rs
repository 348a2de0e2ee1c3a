//! Encoding processed images to the run's output format.

use image::codecs::jpeg::JpegEncoder;
use image::error::{EncodingError, ImageFormatHint};
use image::{ColorType, DynamicImage, ImageError, ImageFormat};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::Path;

use crate::error::PipelineError;
use crate::types::OutputFormat;

/// Encode `image` as `format` into memory.
///
/// `quality` (1-100) drives the lossy JPEG and WebP encoders; the other
/// formats ignore it.
pub fn encode(
    image: &DynamicImage,
    format: OutputFormat,
    quality: u8,
) -> Result<Vec<u8>, ImageError> {
    let image = encodable(image, format);
    let quality = quality.clamp(1, 100);
    match format {
        OutputFormat::Jpeg => {
            let mut buffer = Cursor::new(Vec::new());
            let encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
            image.write_with_encoder(encoder)?;
            Ok(buffer.into_inner())
        }
        OutputFormat::Webp => encode_webp(&image, quality),
        other => {
            let mut buffer = Cursor::new(Vec::new());
            image.write_to(&mut buffer, other.image_format())?;
            Ok(buffer.into_inner())
        }
    }
}

/// Lossy WebP through libwebp; `image` only writes lossless WebP.
fn encode_webp(image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let encoder = webp::Encoder::from_image(image).map_err(|e| webp_error(e.to_string()))?;
    let memory = encoder
        .encode_simple(false, f32::from(quality))
        .map_err(|e| webp_error(format!("{e:?}")))?;
    Ok(memory.to_vec())
}

fn webp_error(message: String) -> ImageError {
    ImageError::Encoding(EncodingError::new(
        ImageFormatHint::Exact(ImageFormat::WebP),
        message,
    ))
}

/// Encode and write to `path`, replacing any existing file.
///
/// Errors name both the `source` image and the output path.
pub fn write_image(
    image: &DynamicImage,
    source: &Path,
    path: &Path,
    format: OutputFormat,
    quality: u8,
) -> Result<(), PipelineError> {
    let bytes = encode(image, format, quality).map_err(|e| PipelineError::Encode {
        input: source.to_path_buf(),
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    std::fs::write(path, bytes).map_err(|e| PipelineError::Write {
        input: source.to_path_buf(),
        path: path.to_path_buf(),
        source: e,
    })
}

/// Convert to a channel layout the target encoder accepts.
fn encodable(image: &DynamicImage, format: OutputFormat) -> Cow<'_, DynamicImage> {
    let color = image.color();
    let supported = match format {
        OutputFormat::Jpeg => matches!(color, ColorType::L8 | ColorType::Rgb8),
        OutputFormat::Webp => matches!(color, ColorType::Rgb8 | ColorType::Rgba8),
        OutputFormat::Gif => matches!(color, ColorType::Rgba8),
        OutputFormat::Bmp => matches!(
            color,
            ColorType::L8 | ColorType::La8 | ColorType::Rgb8 | ColorType::Rgba8
        ),
        OutputFormat::Tiff => matches!(
            color,
            ColorType::L8
                | ColorType::L16
                | ColorType::Rgb8
                | ColorType::Rgba8
                | ColorType::Rgb16
                | ColorType::Rgba16
        ),
        OutputFormat::Png => !matches!(color, ColorType::Rgb32F | ColorType::Rgba32F),
    };

    if supported {
        Cow::Borrowed(image)
    } else if color.has_alpha() && format != OutputFormat::Jpeg {
        Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
    } else if format == OutputFormat::Gif {
        Cow::Owned(DynamicImage::ImageRgba8(image.to_rgba8()))
    } else if format == OutputFormat::Jpeg && !color.has_color() {
        Cow::Owned(DynamicImage::ImageLuma8(image.to_luma8()))
    } else {
        Cow::Owned(DynamicImage::ImageRgb8(image.to_rgb8()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{GenericImageView, Rgb, RgbImage};

    fn sample() -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_fn(16, 12, |x, y| {
            Rgb([(x * 15) as u8, (y * 20) as u8, 128])
        }))
    }

    #[test]
    fn test_every_format_encodes_and_sniffs() {
        for format in OutputFormat::ALL {
            let bytes = encode(&sample(), format, 85).unwrap();
            let guessed = image::guess_format(&bytes).unwrap();
            assert_eq!(guessed, format.image_format(), "{format}");

            let decoded = image::load_from_memory(&bytes).unwrap();
            assert_eq!(decoded.dimensions(), (16, 12), "{format}");
        }
    }

    #[test]
    fn test_jpeg_quality_changes_size() {
        let noisy = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([((x * 37 + y * 11) % 256) as u8, ((x * y) % 256) as u8, (y * 4) as u8])
        }));
        let low = encode(&noisy, OutputFormat::Jpeg, 10).unwrap();
        let high = encode(&noisy, OutputFormat::Jpeg, 95).unwrap();
        assert!(low.len() < high.len());
    }

    #[test]
    fn test_webp_quality_changes_size() {
        let noisy = DynamicImage::ImageRgb8(RgbImage::from_fn(64, 64, |x, y| {
            Rgb([((x * 37 + y * 11) % 256) as u8, ((x * y) % 256) as u8, (y * 4) as u8])
        }));
        let low = encode(&noisy, OutputFormat::Webp, 10).unwrap();
        let high = encode(&noisy, OutputFormat::Webp, 95).unwrap();
        assert_eq!(image::guess_format(&low).unwrap(), ImageFormat::WebP);
        assert!(low.len() < high.len(), "{} >= {}", low.len(), high.len());
    }

    #[test]
    fn test_layouts_are_adapted() {
        let rgba16 = DynamicImage::new_rgba16(4, 4);
        for format in OutputFormat::ALL {
            assert!(encode(&rgba16, format, 85).is_ok(), "{format}");
        }
        let gray = DynamicImage::new_luma8(4, 4);
        let bytes = encode(&gray, OutputFormat::Jpeg, 85).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_write_image_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.png");
        let err = write_image(&sample(), Path::new("/in/shot.png"), &path, OutputFormat::Png, 85)
            .unwrap_err();
        assert!(matches!(err, PipelineError::Write { .. }));
        let message = err.to_string();
        assert!(message.contains("shot.png"), "{message}");
        assert!(message.contains("out.png"), "{message}");
    }
}
