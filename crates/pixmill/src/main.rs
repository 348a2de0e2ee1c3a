//! Pixmill CLI - batch image conversion.
//!
//! Converts many images at once: resize, rotate, adjust tone, apply filters,
//! stamp a watermark and rename, writing every result in one output format.
//!
//! # Usage
//!
//! ```bash
//! # Convert a folder to 800x600 JPEGs
//! pixmill convert ./photos --out ./web --width 800 --height 600
//!
//! # Save the settings and reuse them
//! pixmill preset save web --width 800 --height 600 --watermark "© Me"
//! pixmill convert ./more --out ./web --preset web
//!
//! # Machine-readable progress
//! pixmill convert a.png b.png --out out --events jsonl
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Pixmill - batch image conversion.
#[derive(Parser, Debug)]
#[command(name = "pixmill")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Convert images with the given settings
    Convert(cli::convert::ConvertArgs),

    /// Save, show, list and delete presets
    Preset(cli::preset::PresetArgs),

    /// Show size, format and color mode of images
    Inspect(cli::inspect::InspectArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logging isn't initialized yet, so config warnings go straight to stderr
    let config = match pixmill_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `pixmill config path`."
            );
            pixmill_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("Pixmill v{}", pixmill_core::VERSION);

    match cli.command {
        Commands::Convert(args) => cli::convert::execute(args, &config).await,
        Commands::Preset(args) => cli::preset::execute(args, &config).await,
        Commands::Inspect(args) => cli::inspect::execute(args, &config).await,
        Commands::Config(args) => cli::config::execute(args, &config).await,
    }
}
