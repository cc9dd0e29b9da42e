//! modseal CLI
//!
//! Seal, unseal and inspect script modules, and build or unpack asset packs.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "modseal")]
#[command(about = "Seal and package script modules", long_about = None)]
#[command(version)]
struct Cli {
    /// Loader configuration file (defaults to ./modseal.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Cipher key, overriding the configured one
    #[arg(short, long, global = true)]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Wrap a plain module in a sealed envelope
    Seal {
        /// Plain source or compiled module
        input: PathBuf,
        /// Sealed output file
        output: PathBuf,
    },

    /// Strip the envelope from a sealed module
    Unseal {
        /// Sealed module
        input: PathBuf,
        /// Plain output file
        output: PathBuf,
    },

    /// Show how modules would be classified when loaded
    Inspect {
        /// Files to inspect
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Build an asset pack from a directory
    Pack {
        /// Directory whose files become assets
        dir: PathBuf,
        /// Pack file to write
        output: PathBuf,
        /// Seal entries that are not sealed yet
        #[arg(long)]
        seal: bool,
    },

    /// List or extract the entries of an asset pack
    Unpack {
        /// Pack file
        pack: PathBuf,
        /// Directory to extract into
        #[arg(required_unless_present = "list")]
        dir: Option<PathBuf>,
        /// Only list entries
        #[arg(short, long)]
        list: bool,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("modseal_runtime=info,modseal=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref(), cli.key)?;

    match cli.command {
        Commands::Seal { input, output } => commands::seal::execute(&config, &input, &output),
        Commands::Unseal { input, output } => commands::unseal::execute(&config, &input, &output),
        Commands::Inspect { files, json } => commands::inspect::execute(&config, &files, json),
        Commands::Pack { dir, output, seal } => {
            commands::pack::execute(&config, &dir, &output, seal)
        }
        Commands::Unpack { pack, dir, list } => {
            commands::unpack::execute(&pack, dir.as_deref(), list)
        }
    }
}
