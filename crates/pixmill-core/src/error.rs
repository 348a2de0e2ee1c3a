//! Error types for the pixmill conversion pipeline.
//!
//! Errors are split by where they surface: configuration loading, per-image
//! pipeline work (recovered at job granularity by the executor), and the
//! preset store (returned synchronously to the caller).

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for pixmill operations.
#[derive(Error, Debug)]
pub enum PixmillError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Pipeline processing errors
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Preset store errors
    #[error("Preset error: {0}")]
    Preset(#[from] PresetError),

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Per-image errors. The executor reports these and moves on to the next job.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Image decoding failed
    #[error("Decode error for {path}: {message}")]
    Decode { path: PathBuf, message: String },

    /// Encoding to the output format failed
    #[error("Encode error for {input} -> {path}: {message}")]
    Encode {
        input: PathBuf,
        path: PathBuf,
        message: String,
    },

    /// Writing the output file failed
    #[error("Failed to write {path} from {input}: {source}")]
    Write {
        input: PathBuf,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A codec or stage panicked on this image
    #[error("Processing panicked for {path}: {message}")]
    Panicked { path: PathBuf, message: String },

    /// File exceeds size limit
    #[error("File too large: {path} ({size_mb}MB > {max_mb}MB)")]
    FileTooLarge {
        path: PathBuf,
        size_mb: u64,
        max_mb: u64,
    },

    /// Image dimensions exceed limit
    #[error("Image too large: {path} ({width}x{height} > {max_dim})")]
    ImageTooLarge {
        path: PathBuf,
        width: u32,
        height: u32,
        max_dim: u32,
    },

    /// Unsupported image format
    #[error("Unsupported format for {path}: {format}")]
    UnsupportedFormat { path: PathBuf, format: String },

    /// File not found
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),
}

/// Preset store errors.
#[derive(Error, Debug)]
pub enum PresetError {
    /// No record stored under this name
    #[error("Preset not found: {0}")]
    NotFound(String),

    /// A record exists but cannot be turned into a valid configuration
    #[error("Preset '{name}' is malformed: {message}")]
    Malformed { name: String, message: String },

    /// The name cannot be used as a record key
    #[error("Invalid preset name '{0}': must be non-empty and contain no path separators")]
    InvalidName(String),

    /// Reading or writing the record failed
    #[error("Preset storage error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for pixmill results.
pub type Result<T> = std::result::Result<T, PixmillError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
