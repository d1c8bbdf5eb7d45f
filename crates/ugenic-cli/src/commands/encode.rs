//! Graph serialization command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ugenic_core::encode_graph;

use super::common::{load_graph, registry};

#[derive(Args)]
pub struct EncodeArgs {
    /// TOML graph description
    #[arg(value_name = "GRAPH")]
    input: PathBuf,

    /// Output file for the encoded graph
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,
}

pub fn run(args: EncodeArgs) -> anyhow::Result<()> {
    let registry = registry();
    let (config, graph) = load_graph(&args.input, &registry)?;

    let bytes = encode_graph(&graph)?;
    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!(
        "Encoded '{}': {} sources, {} bytes -> {}",
        config.name,
        graph.sources().len(),
        bytes.len(),
        args.output.display()
    );
    Ok(())
}
