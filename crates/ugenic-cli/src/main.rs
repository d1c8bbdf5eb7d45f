//! ugenic CLI - build, encode, inspect and lower unit-generator graphs.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ugenic")]
#[command(author, version, about = "Unit-generator graph toolkit", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered element kinds, or show one operator's arguments
    Catalogue(commands::catalogue::CatalogueArgs),

    /// Build a graph from a TOML description and serialize it
    Encode(commands::encode::EncodeArgs),

    /// Deserialize a graph and print its sources
    Decode(commands::decode::DecodeArgs),

    /// Expand a graph and write it as a synth definition
    Lower(commands::lower::LowerArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Catalogue(args) => commands::catalogue::run(args),
        Commands::Encode(args) => commands::encode::run(args),
        Commands::Decode(args) => commands::decode::run(args),
        Commands::Lower(args) => commands::lower::run(args),
    }
}
