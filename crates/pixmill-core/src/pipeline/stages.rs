//! The fixed, ordered stage library.
//!
//! Every image passes through [`PIPELINE`] in order. Each stage decides from
//! the run's [`Configuration`] whether it applies; a stage whose settings
//! cannot be interpreted is skipped and reported, never fatal.

use image::DynamicImage;
use std::time::Instant;

use super::color::flatten_alpha;
use super::watermark::WatermarkCompositor;
use super::{enhance, geometry};
use crate::types::{Configuration, Filter, Watermark};

/// One slot in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Resize,
    Rotate,
    Brightness,
    Contrast,
    Saturation,
    Sharpness,
    Filter(Filter),
    Watermark,
    Flatten,
}

/// Stage order. Changing it changes output pixels.
pub const PIPELINE: [StageKind; 14] = [
    StageKind::Resize,
    StageKind::Rotate,
    StageKind::Brightness,
    StageKind::Contrast,
    StageKind::Saturation,
    StageKind::Sharpness,
    StageKind::Filter(Filter::Blur),
    StageKind::Filter(Filter::Sharpen),
    StageKind::Filter(Filter::EdgeEnhance),
    StageKind::Filter(Filter::Emboss),
    StageKind::Filter(Filter::Contour),
    StageKind::Filter(Filter::Grayscale),
    StageKind::Watermark,
    StageKind::Flatten,
];

impl StageKind {
    pub fn name(self) -> &'static str {
        match self {
            StageKind::Resize => "resize",
            StageKind::Rotate => "rotate",
            StageKind::Brightness => "brightness",
            StageKind::Contrast => "contrast",
            StageKind::Saturation => "saturation",
            StageKind::Sharpness => "sharpness",
            StageKind::Filter(Filter::Blur) => "blur",
            StageKind::Filter(Filter::Sharpen) => "sharpen",
            StageKind::Filter(Filter::EdgeEnhance) => "edge-enhance",
            StageKind::Filter(Filter::Emboss) => "emboss",
            StageKind::Filter(Filter::Contour) => "contour",
            StageKind::Filter(Filter::Grayscale) => "grayscale",
            StageKind::Watermark => "watermark",
            StageKind::Flatten => "flatten",
        }
    }

    /// The step this stage contributes, `None` when it is a no-op, or the
    /// reason its settings are unusable.
    fn configure(self, config: &Configuration) -> Result<Option<Step>, String> {
        let step = match self {
            StageKind::Resize => {
                let Some(size) = &config.target_size else {
                    return Ok(None);
                };
                let (width, height) = size.resolve()?;
                if config.maintain_aspect {
                    Step::Fit { width, height }
                } else {
                    Step::Stretch { width, height }
                }
            }
            StageKind::Rotate => {
                let degrees = config
                    .rotation
                    .resolve()
                    .map_err(|raw| format!("angle must be a number of degrees, got \"{raw}\""))?;
                if !degrees.is_finite() {
                    return Err(format!("angle must be finite, got {degrees}"));
                }
                if geometry::normalize_degrees(degrees) == 0.0 {
                    return Ok(None);
                }
                Step::Rotate(degrees)
            }
            StageKind::Brightness => return Ok(factor_step(config.brightness, Step::Brightness)),
            StageKind::Contrast => return Ok(factor_step(config.contrast, Step::Contrast)),
            StageKind::Saturation => return Ok(factor_step(config.saturation, Step::Saturation)),
            StageKind::Sharpness => return Ok(factor_step(config.sharpness, Step::Sharpness)),
            StageKind::Filter(filter) => {
                if !config.filters.contains(&filter) {
                    return Ok(None);
                }
                Step::Filter(filter)
            }
            StageKind::Watermark => match &config.watermark {
                Some(watermark) if !watermark.text.is_empty() => Step::Watermark(watermark.clone()),
                _ => return Ok(None),
            },
            StageKind::Flatten => {
                if !config.output_format.requires_opaque() {
                    return Ok(None);
                }
                Step::Flatten
            }
        };
        Ok(Some(step))
    }
}

fn factor_step(factor: f32, make: fn(f32) -> Step) -> Option<Step> {
    (factor != 1.0).then(|| make(factor))
}

/// A configured transform, ready to run on an image.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Fit { width: u32, height: u32 },
    Stretch { width: u32, height: u32 },
    Rotate(f32),
    Brightness(f32),
    Contrast(f32),
    Saturation(f32),
    Sharpness(f32),
    Filter(Filter),
    Watermark(Watermark),
    Flatten,
}

impl Step {
    pub fn apply(&self, image: DynamicImage, compositor: &WatermarkCompositor) -> DynamicImage {
        match self {
            Step::Fit { width, height } => geometry::fit_within(image, *width, *height),
            Step::Stretch { width, height } => geometry::stretch_to(image, *width, *height),
            Step::Rotate(degrees) => geometry::rotate(image, *degrees),
            Step::Brightness(f) => enhance::brightness(&image, *f),
            Step::Contrast(f) => enhance::contrast(&image, *f),
            Step::Saturation(f) => enhance::saturation(&image, *f),
            Step::Sharpness(f) => enhance::sharpness(&image, *f),
            Step::Filter(filter) => enhance::apply_filter(&image, *filter),
            Step::Watermark(watermark) => compositor.apply(&image, watermark),
            Step::Flatten => flatten_alpha(image),
        }
    }
}

/// A stage left out because its settings could not be interpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct StageSkip {
    pub stage: &'static str,
    pub reason: String,
}

impl std::fmt::Display for StageSkip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} skipped: {}", self.stage, self.reason)
    }
}

/// The steps one configuration yields, in pipeline order.
#[derive(Debug, Clone, Default)]
pub struct StagePlan {
    steps: Vec<(StageKind, Step)>,
    skipped: Vec<StageSkip>,
}

impl StagePlan {
    pub fn for_configuration(config: &Configuration) -> Self {
        let mut plan = Self::default();
        for kind in PIPELINE {
            match kind.configure(config) {
                Ok(Some(step)) => plan.steps.push((kind, step)),
                Ok(None) => {}
                Err(reason) => plan.skipped.push(StageSkip {
                    stage: kind.name(),
                    reason,
                }),
            }
        }
        plan
    }

    pub fn steps(&self) -> impl Iterator<Item = &Step> {
        self.steps.iter().map(|(_, step)| step)
    }

    pub fn skipped(&self) -> &[StageSkip] {
        &self.skipped
    }

    /// True when images pass through unchanged.
    pub fn is_identity(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order.
    pub fn apply(&self, mut image: DynamicImage, compositor: &WatermarkCompositor) -> DynamicImage {
        for (kind, step) in &self.steps {
            let start = Instant::now();
            image = step.apply(image, compositor);
            tracing::trace!(
                "  {} done in {:?} ({}x{})",
                kind.name(),
                start.elapsed(),
                image.width(),
                image.height()
            );
        }
        image
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldValue, OutputFormat, TargetSize};

    fn png_config() -> Configuration {
        Configuration {
            output_format: OutputFormat::Png,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_png_plan_is_identity() {
        let plan = StagePlan::for_configuration(&png_config());
        assert!(plan.is_identity());
        assert!(plan.skipped().is_empty());
    }

    #[test]
    fn test_jpeg_plan_flattens() {
        let plan = StagePlan::for_configuration(&Configuration::default());
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![&Step::Flatten]);
    }

    #[test]
    fn test_plan_follows_pipeline_order() {
        let config = Configuration {
            target_size: Some(TargetSize::new(100, 100)),
            rotation: FieldValue::Value(45.0),
            contrast: 1.5,
            brightness: 0.5,
            filters: [Filter::Grayscale, Filter::Blur].into_iter().collect(),
            watermark: Some(Watermark::default()),
            ..png_config()
        };
        let plan = StagePlan::for_configuration(&config);
        let steps: Vec<&Step> = plan.steps().collect();
        assert_eq!(
            steps,
            vec![
                &Step::Fit {
                    width: 100,
                    height: 100
                },
                &Step::Rotate(45.0),
                &Step::Brightness(0.5),
                &Step::Contrast(1.5),
                &Step::Filter(Filter::Blur),
                &Step::Filter(Filter::Grayscale),
                &Step::Watermark(Watermark::default()),
            ]
        );
    }

    #[test]
    fn test_full_turn_rotation_is_skipped_silently() {
        let config = Configuration {
            rotation: FieldValue::Value(360.0),
            ..png_config()
        };
        let plan = StagePlan::for_configuration(&config);
        assert!(plan.is_identity());
        assert!(plan.skipped().is_empty());
    }

    #[test]
    fn test_tiny_negative_rotation_is_skipped() {
        let config = Configuration {
            rotation: FieldValue::Value(-1e-40),
            ..png_config()
        };
        assert!(StagePlan::for_configuration(&config).is_identity());
    }

    #[test]
    fn test_malformed_fields_skip_only_their_stage() {
        let config = Configuration {
            target_size: Some(TargetSize {
                width: FieldValue::Text("wide".into()),
                height: FieldValue::Value(100),
            }),
            rotation: FieldValue::Text("a bit".into()),
            brightness: 1.3,
            ..png_config()
        };
        let plan = StagePlan::for_configuration(&config);
        assert_eq!(plan.steps().collect::<Vec<_>>(), vec![&Step::Brightness(1.3)]);

        let stages: Vec<&str> = plan.skipped().iter().map(|s| s.stage).collect();
        assert_eq!(stages, vec!["resize", "rotate"]);
        assert!(plan.skipped()[1].to_string().contains("a bit"));
    }

    #[test]
    fn test_empty_watermark_text_is_noop() {
        let config = Configuration {
            watermark: Some(Watermark {
                text: String::new(),
                ..Default::default()
            }),
            ..png_config()
        };
        assert!(StagePlan::for_configuration(&config).is_identity());
    }

    #[test]
    fn test_exact_resize_when_aspect_not_kept() {
        let config = Configuration {
            target_size: Some(TargetSize::new(10, 20)),
            maintain_aspect: false,
            ..png_config()
        };
        let plan = StagePlan::for_configuration(&config);
        let out = plan.apply(DynamicImage::new_rgb8(40, 40), &WatermarkCompositor::new());
        assert_eq!((out.width(), out.height()), (10, 20));
    }

    #[test]
    fn test_flatten_drops_alpha_for_jpeg() {
        let plan = StagePlan::for_configuration(&Configuration::default());
        let out = plan.apply(DynamicImage::new_rgba8(4, 4), &WatermarkCompositor::new());
        assert_eq!(out.color(), image::ColorType::Rgb8);
    }
}
