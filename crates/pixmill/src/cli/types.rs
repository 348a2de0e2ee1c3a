//! CLI enum types: output format, watermark anchor, event stream format.

use clap::ValueEnum;
use pixmill_core::{OutputFormat, WatermarkPosition};

/// Output image formats.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    #[value(alias = "jpg")]
    Jpeg,
    Png,
    Bmp,
    Gif,
    #[value(alias = "tif")]
    Tiff,
    Webp,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Jpeg => OutputFormat::Jpeg,
            FormatArg::Png => OutputFormat::Png,
            FormatArg::Bmp => OutputFormat::Bmp,
            FormatArg::Gif => OutputFormat::Gif,
            FormatArg::Tiff => OutputFormat::Tiff,
            FormatArg::Webp => OutputFormat::Webp,
        }
    }
}

/// Watermark anchors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PositionArg {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
    Center,
}

impl From<PositionArg> for WatermarkPosition {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::TopLeft => WatermarkPosition::TopLeft,
            PositionArg::TopRight => WatermarkPosition::TopRight,
            PositionArg::BottomLeft => WatermarkPosition::BottomLeft,
            PositionArg::BottomRight => WatermarkPosition::BottomRight,
            PositionArg::Center => WatermarkPosition::Center,
        }
    }
}

/// How run progress is written.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum EventsFormat {
    /// Progress bar and summary on stderr (default)
    #[default]
    Bar,
    /// One JSON object per event on stdout (newline-delimited)
    Jsonl,
}

impl std::fmt::Display for EventsFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EventsFormat::Bar => write!(f, "bar"),
            EventsFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}
