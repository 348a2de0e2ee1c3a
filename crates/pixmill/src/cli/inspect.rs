//! The `pixmill inspect` command: name, size, format and color mode of images.

use clap::Args;
use pixmill_core::{Config, ImageDecoder};
use std::path::PathBuf;

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image files to inspect
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Print one JSON object per image
    #[arg(long)]
    pub json: bool,
}

/// Execute the inspect command.
pub async fn execute(args: InspectArgs, config: &Config) -> anyhow::Result<()> {
    let decoder = ImageDecoder::new(config.limits.clone());
    let mut failures = 0;

    for path in &args.files {
        match decoder.inspect(path) {
            Ok(info) if args.json => println!("{}", serde_json::to_string(&info)?),
            Ok(info) => {
                println!("{}", info.file_name);
                println!("  Size:   {}x{}", info.width, info.height);
                println!("  Format: {}", info.format.to_uppercase());
                println!("  Mode:   {}", info.color_mode);
                println!("  Bytes:  {}", info.file_size);
            }
            Err(e) => {
                failures += 1;
                tracing::error!("{}", e);
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} file(s) could not be read", failures, args.files.len());
    }
    Ok(())
}
