//! Synth-definition lowering command.

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ugenic_synthdef::{Destination, LoadPlan, lower};

use super::common::{load_graph, registry};

#[derive(Args)]
pub struct LowerArgs {
    /// TOML graph description
    #[arg(value_name = "GRAPH")]
    input: PathBuf,

    /// Output .scsyndef file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Treat the engine as remote, overriding the description's [load] section
    #[arg(long)]
    remote: bool,
}

pub fn run(args: LowerArgs) -> anyhow::Result<()> {
    let registry = registry();
    let (config, graph) = load_graph(&args.input, &registry)?;
    let expanded = graph.expand()?;

    let def = lower(&config.name, &expanded)?;
    std::fs::write(&args.output, def.bytes())
        .with_context(|| format!("writing {}", args.output.display()))?;

    let destination = if args.remote {
        Destination::Remote
    } else {
        config.load.destination
    };
    let plan = def.load_plan(destination);

    println!(
        "Lowered '{}': {} nodes, {} bytes -> {}",
        def.name(),
        expanded.len(),
        def.byte_len(),
        args.output.display()
    );
    match plan {
        LoadPlan::Inline => println!("Load plan: inline"),
        LoadPlan::OutOfBand => println!(
            "Load plan: out-of-band (load {} from disk)",
            args.output.display()
        ),
        LoadPlan::InlineWithWarning => println!("Load plan: inline (oversized, remote engine)"),
    }
    Ok(())
}
