//! Named configuration presets, one TOML file per preset.
//!
//! Records are flat and every field is optional: a missing field takes the
//! [`Configuration`] default, so older or hand-written presets keep loading.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::PresetError;
use crate::types::{
    Configuration, FieldValue, Filter, OutputFormat, TargetSize, Watermark, WatermarkPosition,
    DEFAULT_RENAME_PATTERN,
};

const EXTENSION: &str = "toml";

/// On-disk shape of a preset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct PresetRecord {
    format: OutputFormat,
    #[serde(skip_serializing_if = "Option::is_none")]
    width: Option<FieldValue<u32>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    height: Option<FieldValue<u32>>,
    maintain_ratio: bool,
    rotate: FieldValue<f64>,
    quality: u8,
    brightness: f64,
    contrast: f64,
    saturation: f64,
    sharpness: f64,
    blur: bool,
    sharpen: bool,
    edge_enhance: bool,
    emboss: bool,
    contour: bool,
    grayscale: bool,
    watermark: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    watermark_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watermark_position: Option<WatermarkPosition>,
    #[serde(skip_serializing_if = "Option::is_none")]
    watermark_opacity: Option<f64>,
    rename: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    rename_pattern: Option<String>,
}

impl Default for PresetRecord {
    fn default() -> Self {
        PresetRecord::from(&Configuration::default())
    }
}

/// Widen an f32 to the f64 with the same shortest decimal form, so records
/// read `1.2` rather than `1.2000000476837158`.
fn tidy(value: f32) -> f64 {
    value.to_string().parse().unwrap_or(f64::from(value))
}

impl From<&Configuration> for PresetRecord {
    fn from(config: &Configuration) -> Self {
        let (width, height) = match &config.target_size {
            Some(size) => (Some(size.width.clone()), Some(size.height.clone())),
            None => (None, None),
        };
        let rotate = match &config.rotation {
            FieldValue::Value(v) => FieldValue::Value(tidy(*v)),
            FieldValue::Text(raw) => FieldValue::Text(raw.clone()),
        };
        let has = |f: Filter| config.filters.contains(&f);
        let watermark = config.watermark.as_ref();

        PresetRecord {
            format: config.output_format,
            width,
            height,
            maintain_ratio: config.maintain_aspect,
            rotate,
            quality: config.quality,
            brightness: tidy(config.brightness),
            contrast: tidy(config.contrast),
            saturation: tidy(config.saturation),
            sharpness: tidy(config.sharpness),
            blur: has(Filter::Blur),
            sharpen: has(Filter::Sharpen),
            edge_enhance: has(Filter::EdgeEnhance),
            emboss: has(Filter::Emboss),
            contour: has(Filter::Contour),
            grayscale: has(Filter::Grayscale),
            watermark: watermark.is_some(),
            watermark_text: watermark.map(|w| w.text.clone()),
            watermark_position: watermark.map(|w| w.position),
            watermark_opacity: watermark.map(|w| tidy(w.opacity)),
            rename: config.rename.is_some(),
            rename_pattern: config.rename.clone(),
        }
    }
}

impl From<PresetRecord> for Configuration {
    fn from(record: PresetRecord) -> Self {
        // Resizing needs both dimensions
        let target_size = match (record.width, record.height) {
            (Some(width), Some(height)) => Some(TargetSize { width, height }),
            _ => None,
        };
        let rotation = match record.rotate {
            FieldValue::Value(v) => FieldValue::Value(v as f32),
            FieldValue::Text(raw) => FieldValue::Text(raw),
        };

        let mut filters = BTreeSet::new();
        for (enabled, filter) in [
            (record.blur, Filter::Blur),
            (record.sharpen, Filter::Sharpen),
            (record.edge_enhance, Filter::EdgeEnhance),
            (record.emboss, Filter::Emboss),
            (record.contour, Filter::Contour),
            (record.grayscale, Filter::Grayscale),
        ] {
            if enabled {
                filters.insert(filter);
            }
        }

        let watermark = record.watermark.then(|| {
            let defaults = Watermark::default();
            Watermark {
                text: record.watermark_text.unwrap_or(defaults.text),
                position: record.watermark_position.unwrap_or(defaults.position),
                opacity: record
                    .watermark_opacity
                    .map(|o| o as f32)
                    .unwrap_or(defaults.opacity),
            }
        });
        let rename = record.rename.then(|| {
            record
                .rename_pattern
                .unwrap_or_else(|| DEFAULT_RENAME_PATTERN.to_string())
        });

        Configuration {
            output_format: record.format,
            target_size,
            maintain_aspect: record.maintain_ratio,
            rotation,
            quality: record.quality,
            brightness: record.brightness as f32,
            contrast: record.contrast as f32,
            saturation: record.saturation as f32,
            sharpness: record.sharpness as f32,
            filters,
            watermark,
            rename,
        }
    }
}

/// Directory-backed store of named presets.
#[derive(Debug, Clone)]
pub struct PresetStore {
    dir: PathBuf,
}

impl PresetStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Store rooted at the configured presets directory.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.presets_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing `name`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, PresetError> {
        validate_name(name)?;
        Ok(self.dir.join(format!("{name}.{EXTENSION}")))
    }

    /// Save `configuration` under `name`, replacing any existing preset.
    pub fn save(&self, name: &str, configuration: &Configuration) -> Result<PathBuf, PresetError> {
        let path = self.path_for(name)?;
        let record = PresetRecord::from(configuration);
        let content = toml::to_string_pretty(&record).map_err(|e| PresetError::Malformed {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(&path, content)?;
        tracing::info!("Saved preset '{}' to {:?}", name, path);
        Ok(path)
    }

    /// Load the preset stored under `name`.
    pub fn load(&self, name: &str) -> Result<Configuration, PresetError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(PresetError::NotFound(name.to_string()));
        }

        let content = std::fs::read_to_string(&path)?;
        let malformed = |message: String| PresetError::Malformed {
            name: name.to_string(),
            message,
        };
        let record: PresetRecord = toml::from_str(&content).map_err(|e| malformed(e.to_string()))?;
        let configuration = Configuration::from(record);
        configuration
            .validate()
            .map_err(|e| malformed(e.to_string()))?;

        tracing::debug!("Loaded preset '{}' from {:?}", name, path);
        Ok(configuration)
    }

    /// Names of all stored presets, sorted.
    pub fn list(&self) -> Result<Vec<String>, PresetError> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                names.push(stem.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    /// Remove the preset stored under `name`.
    pub fn delete(&self, name: &str) -> Result<(), PresetError> {
        let path = self.path_for(name)?;
        if !path.is_file() {
            return Err(PresetError::NotFound(name.to_string()));
        }
        std::fs::remove_file(&path)?;
        tracing::info!("Deleted preset '{}'", name);
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<(), PresetError> {
    let trimmed = name.trim();
    let invalid = trimmed.is_empty()
        || trimmed != name
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(PresetError::InvalidName(name.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, PresetStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PresetStore::new(dir.path().join("presets"));
        (dir, store)
    }

    fn rich_configuration() -> Configuration {
        Configuration {
            output_format: OutputFormat::Webp,
            target_size: Some(TargetSize::new(1024, 768)),
            maintain_aspect: false,
            rotation: FieldValue::Value(-12.5),
            quality: 70,
            brightness: 1.2,
            contrast: 0.8,
            saturation: 1.7,
            sharpness: 0.3,
            filters: [Filter::Sharpen, Filter::Grayscale].into_iter().collect(),
            watermark: Some(Watermark {
                text: "© Studio".into(),
                position: WatermarkPosition::TopLeft,
                opacity: 0.35,
            }),
            rename: Some("{orig}_{num}".into()),
        }
    }

    #[test]
    fn test_save_then_load_is_identical() {
        let (_dir, store) = store();
        let config = rich_configuration();
        store.save("web", &config).unwrap();
        assert_eq!(store.load("web").unwrap(), config);
    }

    #[test]
    fn test_record_is_readable() {
        let (_dir, store) = store();
        let path = store.save("web", &rich_configuration()).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("format = \"WEBP\""));
        assert!(content.contains("brightness = 1.2\n"));
        assert!(content.contains("watermark_position = \"top-left\""));
    }

    #[test]
    fn test_missing_preset_is_not_found() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load("ghost"),
            Err(PresetError::NotFound(name)) if name == "ghost"
        ));
    }

    #[test]
    fn test_unparseable_record_is_malformed() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("bad.toml"), "format = [not toml").unwrap();
        assert!(matches!(store.load("bad"), Err(PresetError::Malformed { .. })));
    }

    #[test]
    fn test_out_of_range_record_is_malformed() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(store.dir().join("dim.toml"), "brightness = 9.0\n").unwrap();
        let err = store.load("dim").unwrap_err();
        assert!(err.to_string().contains("brightness"));
    }

    #[test]
    fn test_partial_record_takes_defaults() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(
            store.dir().join("lean.toml"),
            "format = \"PNG\"\nwatermark = true\nrename = true\n",
        )
        .unwrap();

        let config = store.load("lean").unwrap();
        assert_eq!(config.output_format, OutputFormat::Png);
        assert_eq!(config.quality, 85);
        assert_eq!(config.watermark, Some(Watermark::default()));
        assert_eq!(config.rename.as_deref(), Some(DEFAULT_RENAME_PATTERN));
    }

    #[test]
    fn test_text_dimensions_survive() {
        let (_dir, store) = store();
        std::fs::create_dir_all(store.dir()).unwrap();
        std::fs::write(
            store.dir().join("typed.toml"),
            "width = \"800\"\nheight = \"lots\"\nrotate = \"90\"\n",
        )
        .unwrap();

        let config = store.load("typed").unwrap();
        let size = config.target_size.unwrap();
        assert_eq!(size.width.resolve(), Ok(800));
        assert!(size.height.resolve().is_err());
        assert_eq!(config.rotation.resolve(), Ok(90.0));
    }

    #[test]
    fn test_save_overwrites() {
        let (_dir, store) = store();
        store.save("p", &rich_configuration()).unwrap();
        store.save("p", &Configuration::default()).unwrap();
        assert_eq!(store.load("p").unwrap(), Configuration::default());
    }

    #[test]
    fn test_list_and_delete() {
        let (_dir, store) = store();
        assert!(store.list().unwrap().is_empty());

        store.save("zeta", &Configuration::default()).unwrap();
        store.save("alpha", &Configuration::default()).unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha", "zeta"]);

        store.delete("zeta").unwrap();
        assert_eq!(store.list().unwrap(), vec!["alpha"]);
        assert!(matches!(store.delete("zeta"), Err(PresetError::NotFound(_))));
    }

    #[test]
    fn test_invalid_names() {
        let (_dir, store) = store();
        for name in ["", "  ", "../escape", "a/b", "..", " padded"] {
            assert!(
                matches!(
                    store.save(name, &Configuration::default()),
                    Err(PresetError::InvalidName(_))
                ),
                "{name:?} accepted"
            );
        }
    }
}
