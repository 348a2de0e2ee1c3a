//! Image conversion pipeline components.
//!
//! - **decode**: Load and decode images, with input limits
//! - **stages**: The fixed, ordered transform pipeline
//! - **geometry** / **enhance** / **watermark**: The transforms themselves
//! - **encode**: Write the output format
//! - **naming**: Output file names
//! - **executor**: Runs a batch on a worker thread
//! - **channel**: Progress events and cancellation
//! - **discovery**: Find image files in directories

pub mod channel;
pub mod color;
pub mod decode;
pub mod discovery;
pub mod encode;
pub mod enhance;
pub mod executor;
pub mod font;
pub mod geometry;
pub mod naming;
pub mod stages;
pub mod watermark;

// Re-exports for convenient access
pub use channel::{
    progress_channel, CancellationToken, ProgressEvent, ProgressReceiver, ProgressSender,
    ProgressSink, RunSummary,
};
pub use decode::{DecodedImage, ImageDecoder, ImageInfo};
pub use discovery::FileDiscovery;
pub use encode::encode;
pub use executor::{Executor, RunHandle};
pub use naming::{output_name, output_path};
pub use stages::{StageKind, StagePlan, StageSkip, Step, PIPELINE};
pub use watermark::WatermarkCompositor;
