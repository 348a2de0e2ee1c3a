//! The `pixmill preset` command for managing saved presets.

use clap::{Args, Subcommand};
use pixmill_core::{Config, PresetStore};

use super::stages::StageArgs;

/// Arguments for the `preset` command.
#[derive(Args, Debug)]
pub struct PresetArgs {
    #[command(subcommand)]
    pub command: PresetCommand,
}

/// Subcommands for preset management.
#[derive(Subcommand, Debug)]
pub enum PresetCommand {
    /// Save stage settings under a name (overwrites)
    Save {
        /// Preset name
        name: String,

        #[command(flatten)]
        stages: StageArgs,
    },

    /// Show the operations a preset performs
    Show {
        /// Preset name
        name: String,
    },

    /// List saved presets
    List,

    /// Delete a preset
    Delete {
        /// Preset name
        name: String,
    },
}

/// Execute the preset command.
pub async fn execute(args: PresetArgs, config: &Config) -> anyhow::Result<()> {
    let store = PresetStore::from_config(config);

    match args.command {
        PresetCommand::Save { name, stages } => {
            let configuration = stages.resolve(config)?;
            let path = store.save(&name, &configuration)?;
            println!("Preset '{}' saved to: {}", name, path.display());
        }

        PresetCommand::Show { name } => {
            let configuration = store.load(&name)?;
            println!("{}:", name);
            for op in configuration.describe() {
                println!("  • {}", op);
            }
        }

        PresetCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                eprintln!("No presets in {}", store.dir().display());
            }
            for name in names {
                println!("{}", name);
            }
        }

        PresetCommand::Delete { name } => {
            store.delete(&name)?;
            println!("Preset '{}' deleted", name);
        }
    }

    Ok(())
}
