//! Shared CLI helpers used across multiple commands.

use std::path::Path;

use anyhow::Context;
use ugenic_config::GraphConfig;
use ugenic_core::{Elem, GE, SynthGraph};
use ugenic_registry::{PLUGINS, ProductRegistry};

/// The registry used by every command: standard and plugin kinds.
pub fn registry() -> ProductRegistry {
    let registry = ProductRegistry::standard();
    registry.initialize_once(&PLUGINS);
    registry
}

/// Load a TOML description and build its graph.
pub fn load_graph(
    path: &Path,
    registry: &ProductRegistry,
) -> anyhow::Result<(GraphConfig, SynthGraph)> {
    let config = GraphConfig::load(path)?;
    let graph = config
        .build(registry)
        .with_context(|| format!("building graph '{}'", config.name))?;
    tracing::debug!(name = %config.name, sources = graph.sources().len(), "graph built");
    Ok((config, graph))
}

/// Render a graph element as a one-line expression.
pub fn render_ge(ge: &GE) -> String {
    let mut out = String::new();
    write_ge(&mut out, ge);
    out
}

fn write_ge(out: &mut String, ge: &GE) {
    match ge {
        GE::Constant(c) => out.push_str(&c.to_string()),
        GE::Elem(elem) => {
            out.push_str(elem.product_key());
            out.push('(');
            write_fields(out, &elem.fields());
            out.push(')');
        }
        GE::Seq(channels) => {
            out.push('[');
            for (i, channel) in channels.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_ge(out, channel);
            }
            out.push(']');
        }
    }
}

fn write_fields(out: &mut String, fields: &[Elem]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match field {
            Elem::Int(v) => out.push_str(&v.to_string()),
            Elem::Float(v) => out.push_str(&v.to_string()),
            Elem::Bool(v) => out.push_str(&v.to_string()),
            Elem::Str(s) => out.push_str(&format!("{s:?}")),
            Elem::Rate(rate) => out.push_str(rate.suffix()),
            Elem::Ge(ge) => write_ge(out, ge),
            Elem::Seq(items) => {
                out.push('[');
                write_fields(out, items);
                out.push(']');
            }
        }
    }
}
