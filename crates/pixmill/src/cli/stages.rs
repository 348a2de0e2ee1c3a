//! Stage flags shared by `convert` and `preset save`.

use clap::Args;
use pixmill_core::{Config, Configuration, FieldValue, Filter, PresetStore, TargetSize, Watermark};

use super::types::{FormatArg, PositionArg};

/// Transform settings. Anything not given keeps the base preset's value, or
/// the default when no preset is named.
#[derive(Args, Debug, Default)]
pub struct StageArgs {
    /// Start from a saved preset
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub format: Option<FormatArg>,

    /// Target width in pixels (requires --height)
    #[arg(long)]
    pub width: Option<String>,

    /// Target height in pixels (requires --width)
    #[arg(long)]
    pub height: Option<String>,

    /// Resize to exactly WIDTHxHEIGHT instead of fitting within it
    #[arg(long)]
    pub stretch: bool,

    /// Rotation in degrees, counter-clockwise
    #[arg(long, allow_hyphen_values = true)]
    pub rotate: Option<String>,

    /// Quality for lossy formats (1-100)
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quality: Option<u8>,

    /// Brightness factor (0.0-2.0, 1.0 = unchanged)
    #[arg(long)]
    pub brightness: Option<f32>,

    /// Contrast factor (0.0-2.0, 1.0 = unchanged)
    #[arg(long)]
    pub contrast: Option<f32>,

    /// Saturation factor (0.0-2.0, 1.0 = unchanged)
    #[arg(long)]
    pub saturation: Option<f32>,

    /// Sharpness factor (0.0-2.0, 1.0 = unchanged)
    #[arg(long)]
    pub sharpness: Option<f32>,

    /// Apply a blur filter
    #[arg(long)]
    pub blur: bool,

    /// Apply a sharpen filter
    #[arg(long)]
    pub sharpen: bool,

    /// Apply an edge-enhance filter
    #[arg(long)]
    pub edge_enhance: bool,

    /// Apply an emboss filter
    #[arg(long)]
    pub emboss: bool,

    /// Apply a contour filter
    #[arg(long)]
    pub contour: bool,

    /// Convert to grayscale
    #[arg(long)]
    pub grayscale: bool,

    /// Watermark text
    #[arg(long)]
    pub watermark: Option<String>,

    /// Watermark anchor
    #[arg(long, value_enum)]
    pub watermark_position: Option<PositionArg>,

    /// Watermark opacity (0.0-1.0]
    #[arg(long)]
    pub watermark_opacity: Option<f32>,

    /// Output name pattern; {num} is the zero-padded sequence, {orig} the source name
    #[arg(long)]
    pub rename: Option<String>,
}

impl StageArgs {
    /// Load the base preset (if any) and layer the flags on top.
    pub fn resolve(&self, config: &Config) -> anyhow::Result<Configuration> {
        let base = match &self.preset {
            Some(name) => PresetStore::from_config(config).load(name)?,
            None => Configuration::default(),
        };
        self.apply(base)
    }

    /// Layer the flags onto `base`.
    pub fn apply(&self, mut base: Configuration) -> anyhow::Result<Configuration> {
        if let Some(format) = self.format {
            base.output_format = format.into();
        }

        match (&self.width, &self.height) {
            (Some(width), Some(height)) => {
                base.target_size = Some(TargetSize {
                    width: FieldValue::parse_input(width),
                    height: FieldValue::parse_input(height),
                });
            }
            (None, None) => {}
            _ => anyhow::bail!("--width and --height must be given together"),
        }
        if self.stretch {
            base.maintain_aspect = false;
        }

        if let Some(rotate) = &self.rotate {
            base.rotation = FieldValue::parse_input(rotate);
        }
        if let Some(quality) = self.quality {
            base.quality = quality;
        }
        if let Some(v) = self.brightness {
            base.brightness = v;
        }
        if let Some(v) = self.contrast {
            base.contrast = v;
        }
        if let Some(v) = self.saturation {
            base.saturation = v;
        }
        if let Some(v) = self.sharpness {
            base.sharpness = v;
        }

        for (enabled, filter) in [
            (self.blur, Filter::Blur),
            (self.sharpen, Filter::Sharpen),
            (self.edge_enhance, Filter::EdgeEnhance),
            (self.emboss, Filter::Emboss),
            (self.contour, Filter::Contour),
            (self.grayscale, Filter::Grayscale),
        ] {
            if enabled {
                base.filters.insert(filter);
            }
        }

        if let Some(text) = &self.watermark {
            let watermark = base.watermark.get_or_insert_with(Watermark::default);
            watermark.text = text.clone();
        }
        if self.watermark_position.is_some() || self.watermark_opacity.is_some() {
            let Some(watermark) = base.watermark.as_mut() else {
                anyhow::bail!("--watermark-position and --watermark-opacity need --watermark text");
            };
            if let Some(position) = self.watermark_position {
                watermark.position = position.into();
            }
            if let Some(opacity) = self.watermark_opacity {
                watermark.opacity = opacity;
            }
        }

        if let Some(pattern) = &self.rename {
            base.rename = Some(pattern.clone());
        }

        base.validate()?;
        Ok(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pixmill_core::{OutputFormat, WatermarkPosition};

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        stages: StageArgs,
    }

    fn parse(args: &[&str]) -> StageArgs {
        let mut argv = vec!["test"];
        argv.extend_from_slice(args);
        Harness::parse_from(argv).stages
    }

    #[test]
    fn test_no_flags_keep_base() {
        let config = parse(&[]).apply(Configuration::default()).unwrap();
        assert_eq!(config, Configuration::default());
    }

    #[test]
    fn test_flags_override() {
        let config = parse(&[
            "--format", "png", "--width", "800", "--height", "600", "--stretch", "--rotate",
            "-90", "--blur", "--grayscale", "--brightness", "1.5",
        ])
        .apply(Configuration::default())
        .unwrap();

        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.target_size, Some(TargetSize::new(800, 600)));
        assert!(!config.maintain_aspect);
        assert_eq!(config.rotation, FieldValue::Value(-90.0));
        assert_eq!(config.brightness, 1.5);
        assert_eq!(config.filters.len(), 2);
    }

    #[test]
    fn test_free_text_dimensions_are_kept() {
        let config = parse(&["--width", "wide", "--height", "600"])
            .apply(Configuration::default())
            .unwrap();
        let size = config.target_size.unwrap();
        assert_eq!(size.width, FieldValue::Text("wide".into()));
    }

    #[test]
    fn test_half_a_size_is_rejected() {
        assert!(parse(&["--width", "800"])
            .apply(Configuration::default())
            .is_err());
    }

    #[test]
    fn test_watermark_flags() {
        let config = parse(&[
            "--watermark",
            "© Me",
            "--watermark-position",
            "center",
            "--watermark-opacity",
            "0.8",
        ])
        .apply(Configuration::default())
        .unwrap();
        let watermark = config.watermark.unwrap();
        assert_eq!(watermark.text, "© Me");
        assert_eq!(watermark.position, WatermarkPosition::Center);
        assert_eq!(watermark.opacity, 0.8);

        assert!(parse(&["--watermark-opacity", "0.8"])
            .apply(Configuration::default())
            .is_err());
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        assert!(parse(&["--contrast", "3.0"])
            .apply(Configuration::default())
            .is_err());
    }

    #[test]
    fn test_flags_layer_on_preset_base() {
        let base = Configuration {
            output_format: OutputFormat::Webp,
            rename: Some("web_{num}".into()),
            ..Default::default()
        };
        let config = parse(&["--quality", "60"]).apply(base).unwrap();
        assert_eq!(config.output_format, OutputFormat::Webp);
        assert_eq!(config.quality, 60);
        assert_eq!(config.rename.as_deref(), Some("web_{num}"));
    }
}
