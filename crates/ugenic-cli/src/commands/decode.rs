//! Graph inspection command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ugenic_core::decode_graph;

use super::common::{registry, render_ge};

#[derive(Args)]
pub struct DecodeArgs {
    /// Encoded graph file
    #[arg(value_name = "FILE")]
    input: PathBuf,

    /// Also expand the graph and list its nodes
    #[arg(long)]
    expand: bool,
}

pub fn run(args: DecodeArgs) -> anyhow::Result<()> {
    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let registry = registry();
    let graph = decode_graph(&bytes, &registry)
        .with_context(|| format!("decoding {}", args.input.display()))?;

    println!("Sources ({})", graph.sources().len());
    for (i, source) in graph.sources().iter().enumerate() {
        println!("  [{i}] {}", render_ge(source));
    }

    if args.expand {
        let expanded = graph.expand()?;
        println!();
        println!("Nodes ({})", expanded.len());
        for (i, ugen) in expanded.ugens().iter().enumerate() {
            println!("  #{i} {ugen}");
        }
        if !expanded.params().is_empty() {
            println!();
            println!("Parameters");
            for param in expanded.params() {
                println!("  {} @{} = {:?}", param.name, param.index, param.values);
            }
        }
    }
    Ok(())
}
