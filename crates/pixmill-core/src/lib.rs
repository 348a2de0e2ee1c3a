//! Pixmill Core - batch image conversion library.
//!
//! Pixmill applies one [`Configuration`] to a list of images: resize, rotate,
//! tone adjustments, filters and a text watermark, in a fixed order, then
//! writes each result in the chosen format under a predictable name.
//!
//! # Architecture
//!
//! ```text
//! Job → Decode → Resize → Rotate → Enhance → Filters → Watermark → Encode → File
//!                                                                  │
//!                               ProgressEvent stream ◄─────────────┘
//! ```
//!
//! A run executes on its own worker thread and reports through a progress
//! channel; the caller polls it and may cancel between images.
//!
//! # Usage
//!
//! ```rust,ignore
//! use pixmill_core::{Config, Configuration, Executor, Job, ProgressEvent};
//!
//! fn main() -> pixmill_core::Result<()> {
//!     let executor = Executor::new(&Config::load()?);
//!     let jobs = Job::batch(["a.png", "b.jpg"]);
//!     let mut run = executor.run(jobs, Configuration::default(), "out".into())?;
//!
//!     while let Some(event) = run.events().blocking_recv() {
//!         println!("{event:?}");
//!         if event.is_terminal() {
//!             break;
//!         }
//!     }
//!     let summary = run.join()?;
//!     println!("{} of {} converted", summary.succeeded, summary.total);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod preset;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use error::{ConfigError, PipelineError, PipelineResult, PixmillError, PresetError, Result};
pub use pipeline::{
    CancellationToken, Executor, FileDiscovery, ImageDecoder, ImageInfo, ProgressEvent,
    ProgressReceiver, ProgressSink, RunHandle, RunSummary,
};
pub use preset::PresetStore;
pub use types::{
    Configuration, FieldValue, Filter, Job, OutputFormat, TargetSize, Watermark,
    WatermarkPosition, DEFAULT_RENAME_PATTERN,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
