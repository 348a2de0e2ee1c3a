//! Core data types: the per-run [`Configuration`] snapshot and [`Job`]s.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::ConfigError;

/// Destination encoding for every image in a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Bmp,
    Gif,
    Tiff,
    Webp,
}

impl OutputFormat {
    /// All formats, in menu order.
    pub const ALL: [OutputFormat; 6] = [
        OutputFormat::Jpeg,
        OutputFormat::Png,
        OutputFormat::Bmp,
        OutputFormat::Gif,
        OutputFormat::Tiff,
        OutputFormat::Webp,
    ];

    /// File extension for outputs. JPEG is the one irregular mapping.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::Bmp => "bmp",
            OutputFormat::Gif => "gif",
            OutputFormat::Tiff => "tiff",
            OutputFormat::Webp => "webp",
        }
    }

    /// Upper-case display name, also the preset record value.
    pub fn name(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "JPEG",
            OutputFormat::Png => "PNG",
            OutputFormat::Bmp => "BMP",
            OutputFormat::Gif => "GIF",
            OutputFormat::Tiff => "TIFF",
            OutputFormat::Webp => "WEBP",
        }
    }

    /// The codec library's format identifier.
    pub fn image_format(self) -> ImageFormat {
        match self {
            OutputFormat::Jpeg => ImageFormat::Jpeg,
            OutputFormat::Png => ImageFormat::Png,
            OutputFormat::Bmp => ImageFormat::Bmp,
            OutputFormat::Gif => ImageFormat::Gif,
            OutputFormat::Tiff => ImageFormat::Tiff,
            OutputFormat::Webp => ImageFormat::WebP,
        }
    }

    /// Whether the quality setting means anything for this format.
    pub fn supports_quality(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Webp)
    }

    /// Formats that reject or mishandle an alpha channel.
    pub fn requires_opaque(self) -> bool {
        matches!(self, OutputFormat::Jpeg | OutputFormat::Webp)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A numeric setting that may still be the raw text a user typed.
///
/// Typed callers set `Value`; form-driven collaborators can pass whatever was
/// entered as `Text`. Text is parsed when the owning stage is configured, and a
/// parse failure skips only that stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue<T> {
    Value(T),
    Text(String),
}

impl<T: FromStr + Copy> FieldValue<T> {
    /// Wrap user input, keeping it typed when it already parses.
    pub fn parse_input(input: &str) -> Self {
        match input.trim().parse::<T>() {
            Ok(v) => FieldValue::Value(v),
            Err(_) => FieldValue::Text(input.to_string()),
        }
    }

    /// The typed value, or the offending text.
    pub fn resolve(&self) -> Result<T, String> {
        match self {
            FieldValue::Value(v) => Ok(*v),
            FieldValue::Text(raw) => raw.trim().parse::<T>().map_err(|_| raw.clone()),
        }
    }
}

impl<T> From<T> for FieldValue<T> {
    fn from(value: T) -> Self {
        FieldValue::Value(value)
    }
}

impl<T: fmt::Display> fmt::Display for FieldValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Value(v) => write!(f, "{v}"),
            FieldValue::Text(raw) => f.write_str(raw),
        }
    }
}

/// Requested output box for the resize stage.
#[derive(Debug, Clone, PartialEq)]
pub struct TargetSize {
    pub width: FieldValue<u32>,
    pub height: FieldValue<u32>,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width: width.into(),
            height: height.into(),
        }
    }

    /// Both dimensions as positive integers.
    pub fn resolve(&self) -> Result<(u32, u32), String> {
        let width = self
            .width
            .resolve()
            .map_err(|raw| format!("width must be a positive integer, got \"{raw}\""))?;
        let height = self
            .height
            .resolve()
            .map_err(|raw| format!("height must be a positive integer, got \"{raw}\""))?;
        if width == 0 || height == 0 {
            return Err(format!("size must be positive, got {width}x{height}"));
        }
        Ok((width, height))
    }
}

/// Convolution filters and grayscale conversion.
///
/// Variant order is the application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Filter {
    Blur,
    Sharpen,
    EdgeEnhance,
    Emboss,
    Contour,
    Grayscale,
}

impl Filter {
    /// All filters in application order. Grayscale stays last.
    pub const ALL: [Filter; 6] = [
        Filter::Blur,
        Filter::Sharpen,
        Filter::EdgeEnhance,
        Filter::Emboss,
        Filter::Contour,
        Filter::Grayscale,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Filter::Blur => "Blur",
            Filter::Sharpen => "Sharpen",
            Filter::EdgeEnhance => "Edge Enhance",
            Filter::Emboss => "Emboss",
            Filter::Contour => "Contour",
            Filter::Grayscale => "Grayscale",
        }
    }
}

/// Where the watermark text is anchored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WatermarkPosition {
    TopLeft,
    TopRight,
    BottomLeft,
    #[default]
    BottomRight,
    Center,
}

impl WatermarkPosition {
    pub fn name(self) -> &'static str {
        match self {
            WatermarkPosition::TopLeft => "top-left",
            WatermarkPosition::TopRight => "top-right",
            WatermarkPosition::BottomLeft => "bottom-left",
            WatermarkPosition::BottomRight => "bottom-right",
            WatermarkPosition::Center => "center",
        }
    }
}

/// Translucent text stamped onto every image.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub text: String,
    pub position: WatermarkPosition,
    /// In (0, 1]
    pub opacity: f32,
}

impl Default for Watermark {
    fn default() -> Self {
        Self {
            text: "© Copyright".to_string(),
            position: WatermarkPosition::BottomRight,
            opacity: 0.5,
        }
    }
}

/// Default pattern offered when renaming is first enabled.
pub const DEFAULT_RENAME_PATTERN: &str = "image_{num}";

/// Immutable snapshot of every transform parameter and naming rule for a run.
///
/// The executor takes it by value, so later edits on the caller's side never
/// reach a run in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub output_format: OutputFormat,
    pub target_size: Option<TargetSize>,
    pub maintain_aspect: bool,
    /// Degrees counter-clockwise
    pub rotation: FieldValue<f32>,
    /// 1..=100, used by lossy formats only
    pub quality: u8,
    pub brightness: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub sharpness: f32,
    pub filters: BTreeSet<Filter>,
    pub watermark: Option<Watermark>,
    /// Pattern with `{num}` and `{orig}` placeholders
    pub rename: Option<String>,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Jpeg,
            target_size: None,
            maintain_aspect: true,
            rotation: FieldValue::Value(0.0),
            quality: 85,
            brightness: 1.0,
            contrast: 1.0,
            saturation: 1.0,
            sharpness: 1.0,
            filters: BTreeSet::new(),
            watermark: None,
            rename: None,
        }
    }
}

impl Configuration {
    /// Check ranges of the typed fields.
    ///
    /// Free-text fields are not checked here; they are resolved per stage.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.quality) {
            return Err(ConfigError::ValidationError(format!(
                "quality must be between 1 and 100, got {}",
                self.quality
            )));
        }
        for (name, value) in [
            ("brightness", self.brightness),
            ("contrast", self.contrast),
            ("saturation", self.saturation),
            ("sharpness", self.sharpness),
        ] {
            if !value.is_finite() || !(0.0..=2.0).contains(&value) {
                return Err(ConfigError::ValidationError(format!(
                    "{name} must be between 0.0 and 2.0, got {value}"
                )));
            }
        }
        if let Some(watermark) = &self.watermark {
            if !(watermark.opacity > 0.0 && watermark.opacity <= 1.0) {
                return Err(ConfigError::ValidationError(format!(
                    "watermark opacity must be in (0, 1], got {}",
                    watermark.opacity
                )));
            }
        }
        Ok(())
    }

    /// Human-readable list of the operations this configuration performs,
    /// in pipeline order.
    pub fn describe(&self) -> Vec<String> {
        let mut ops = Vec::new();

        if let Some(size) = &self.target_size {
            let mut line = format!("Resize: {}x{}", size.width, size.height);
            if self.maintain_aspect {
                line.push_str(" (proportional)");
            }
            ops.push(line);
        }

        ops.push(format!("Format: {}", self.output_format));
        if self.output_format.supports_quality() {
            ops.push(format!("Quality: {}", self.quality));
        }

        let rotation_is_noop = matches!(self.rotation.resolve(), Ok(angle) if angle == 0.0);
        if !rotation_is_noop {
            ops.push(format!("Rotate: {}°", self.rotation));
        }

        for (label, value) in [
            ("Brightness", self.brightness),
            ("Contrast", self.contrast),
            ("Saturation", self.saturation),
            ("Sharpness", self.sharpness),
        ] {
            if value != 1.0 {
                ops.push(format!("{label}: {value:.1}"));
            }
        }

        if !self.filters.is_empty() {
            let names: Vec<&str> = self.filters.iter().map(|f| f.label()).collect();
            ops.push(format!("Filters: {}", names.join(", ")));
        }

        if let Some(watermark) = &self.watermark {
            ops.push(format!(
                "Watermark: '{}' ({}, {:.0}%)",
                watermark.text,
                watermark.position.name(),
                watermark.opacity * 100.0
            ));
        }

        if let Some(pattern) = self.rename.as_deref().filter(|p| !p.is_empty()) {
            ops.push(format!("Rename: {pattern}"));
        }

        ops
    }
}

/// One source image and its fixed 1-based position in the run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: PathBuf,
    pub sequence: usize,
}

impl Job {
    /// Number a list of sources 1..=n in the given order.
    pub fn batch<I, P>(paths: I) -> Vec<Job>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths
            .into_iter()
            .enumerate()
            .map(|(i, p)| Job {
                source: p.into(),
                sequence: i + 1,
            })
            .collect()
    }

    /// The source's file name, for status messages.
    pub fn file_name(&self) -> String {
        display_name(&self.source)
    }
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
