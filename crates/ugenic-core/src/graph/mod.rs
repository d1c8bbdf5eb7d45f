//! Synth graphs and their expanded node graphs.
//!
//! The graph module splits a synth description into two objects:
//!
//! - [`SynthGraph`] holds the declarative sources (a list of [`GE`]s). It is
//!   what the codec serializes and what the registry factories produce.
//! - [`UGenGraph`] is the frozen result of [`SynthGraph::expand`]: a flat,
//!   topologically ordered node list, the control parameter table and the
//!   root outputs. It is what the lowering step consumes.
//!
//! # Example
//!
//! ```rust,ignore
//! use ugenic_core::{GE, Rate, SynthGraph};
//!
//! let osc = registry.create("SinOsc", Some(Rate::Audio), vec![GE::from(440.0)])?;
//! let out = registry.create("Out", Some(Rate::Audio), vec![GE::from(0.0), osc * GE::from(0.1)])?;
//! let graph = SynthGraph::new(vec![out]).expand()?;
//! for ugen in graph.ugens() {
//!     println!("{ugen}");
//! }
//! ```

mod builder;
mod node;
mod rate_match;

pub use builder::{NodeInput, NodeRequest, UGenGraphBuilder};
pub use node::{UGen, UGenId, UGenIn};
pub use rate_match::{Coercion, InputRate, UPSAMPLE_ADAPTER, coerce_input};

use crate::error::GraphError;
use crate::ge::{GE, UGenInLike};

/// The unexpanded description of a synth: its source elements in order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SynthGraph {
    sources: Vec<GE>,
}

impl SynthGraph {
    /// Creates a graph from its sources.
    pub fn new(sources: Vec<GE>) -> Self {
        Self { sources }
    }

    /// Source elements in declaration order.
    pub fn sources(&self) -> &[GE] {
        &self.sources
    }

    /// Appends a source element.
    pub fn push(&mut self, source: GE) {
        self.sources.push(source);
    }

    /// Consumes the graph, returning its sources.
    pub fn into_sources(self) -> Vec<GE> {
        self.sources
    }

    /// Expands every source, in order, into one node graph.
    ///
    /// Shared elements expand once. Fails on the first construction error and
    /// returns no partial graph.
    pub fn expand(&self) -> Result<UGenGraph, GraphError> {
        let mut builder = UGenGraphBuilder::new();
        let mut roots = Vec::with_capacity(self.sources.len());
        for source in &self.sources {
            roots.push(source.expand(&mut builder)?);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(
            "graph_expand: {} sources -> {} nodes",
            self.sources.len(),
            builder.len()
        );
        builder.build(roots)
    }
}

impl FromIterator<GE> for SynthGraph {
    fn from_iter<I: IntoIterator<Item = GE>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

/// A named control parameter of an expanded graph.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlParam {
    /// Parameter name.
    pub name: String,
    /// Offset of the first value in the flat parameter array.
    pub index: usize,
    /// Default values, one per channel.
    pub values: Vec<f32>,
}

/// A finished, immutable node graph.
///
/// Node order equals creation order, so repeated expansion of the same
/// [`SynthGraph`] yields identical graphs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UGenGraph {
    pub(crate) ugens: Vec<UGen>,
    pub(crate) params: Vec<ControlParam>,
    pub(crate) roots: Vec<UGenInLike>,
}

impl UGenGraph {
    /// Nodes in topological (creation) order.
    pub fn ugens(&self) -> &[UGen] {
        &self.ugens
    }

    /// Looks up a node by id.
    pub fn ugen(&self, id: UGenId) -> Option<&UGen> {
        self.ugens.get(id.index() as usize)
    }

    /// Control parameters in declaration order.
    pub fn params(&self) -> &[ControlParam] {
        &self.params
    }

    /// Flat default values of all control parameters.
    pub fn param_values(&self) -> Vec<f32> {
        self.params
            .iter()
            .flat_map(|p| p.values.iter().copied())
            .collect()
    }

    /// Outputs of each source, in source order.
    pub fn roots(&self) -> &[UGenInLike] {
        &self.roots
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.ugens.len()
    }

    /// True when the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.ugens.is_empty()
    }

    /// Checks the reference invariants.
    ///
    /// Every node input must reference an output of an earlier node, the
    /// output index must exist and the recorded rate must match the
    /// producer's output rate. Root outputs must reference existing nodes.
    pub fn validate(&self) -> Result<(), GraphError> {
        for (position, ugen) in self.ugens.iter().enumerate() {
            let node = UGenId(position as u32);
            for (input, value) in ugen.inputs.iter().enumerate() {
                if let Some(reason) = self.check_ref(*value, Some(position)) {
                    return Err(GraphError::DanglingInput {
                        node,
                        input,
                        reason,
                    });
                }
            }
        }
        for root in &self.roots {
            for (input, value) in root.flat_outputs().into_iter().enumerate() {
                if let Some(reason) = self.check_ref(value, None) {
                    return Err(GraphError::DanglingInput {
                        node: UGenId(self.ugens.len() as u32),
                        input,
                        reason,
                    });
                }
            }
        }
        Ok(())
    }

    /// Describes what is wrong with `value` as seen from node `consumer`.
    fn check_ref(&self, value: UGenIn, consumer: Option<usize>) -> Option<String> {
        let UGenIn::Output { ugen, output, rate } = value else {
            return None;
        };
        let producer = ugen.index() as usize;
        if consumer.is_some_and(|c| producer >= c) {
            return Some(format!("forward reference to {ugen}"));
        }
        let Some(node) = self.ugens.get(producer) else {
            return Some(format!("{ugen} does not exist"));
        };
        match node.output_rates.get(output as usize) {
            None => Some(format!(
                "{ugen} has {} outputs, output {output} requested",
                node.num_outputs()
            )),
            Some(&declared) if declared != rate => Some(format!(
                "{ugen} output {output} runs at {declared} rate, recorded as {rate}"
            )),
            Some(_) => None,
        }
    }
}
