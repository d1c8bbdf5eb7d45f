//! Catalogue listing command.

#![allow(clippy::print_literal)] // Table headers use literal strings intentionally

use clap::Args;
use ugenic_core::OutputSpec;

use super::common::registry;

#[derive(Args)]
pub struct CatalogueArgs {
    /// Show the arguments of one operator
    #[arg(value_name = "KEY")]
    key: Option<String>,
}

pub fn run(args: CatalogueArgs) -> anyhow::Result<()> {
    let registry = registry();

    if let Some(key) = &args.key {
        let entry = registry.resolve(key)?;
        let Some(spec) = entry.spec() else {
            println!("{key} (structural element, no operator spec)");
            return Ok(());
        };

        println!("{spec}");
        println!("{}", "=".repeat(spec.name().len()));
        println!();
        println!("  {:16}  {:8}  {:10}  {}", "Argument", "Kind", "Rate", "Default");
        println!("  {:16}  {:8}  {:10}  {}", "--------", "----", "----", "-------");
        for arg in spec.args() {
            let default = arg
                .default
                .map_or_else(|| "-".to_owned(), |d| d.to_string());
            println!(
                "  {:16}  {:8}  {:10}  {}",
                arg.name,
                format!("{:?}", arg.kind),
                format!("{:?}", arg.rate),
                default
            );
        }
        println!();
        match spec.output_spec() {
            OutputSpec::Fixed(n) => println!("Outputs: {n}"),
            OutputSpec::Channels => println!("Outputs: from channel-count argument"),
        }
        if spec.has_side_effect() {
            println!("Side effect: yes");
        }
        return Ok(());
    }

    let keys = registry.keys();
    println!("Registered kinds ({})", keys.len());
    println!();
    for key in keys {
        match registry.spec(&key) {
            Some(spec) => println!("  {spec}"),
            None => println!("  {key}"),
        }
    }
    Ok(())
}
