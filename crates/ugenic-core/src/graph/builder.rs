//! Append-only construction of a [`UGenGraph`].
//!
//! The builder owns the node list while a [`SynthGraph`](super::SynthGraph) is
//! expanded. Nodes are appended in creation order and may only reference nodes
//! already present, so the list is topologically ordered by construction.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::GraphError;
use crate::ge::{GraphElem, UGenInLike, identity};
use crate::rate::Rate;

use super::node::{UGen, UGenId, UGenIn};
use super::rate_match::{Coercion, InputRate, UPSAMPLE_ADAPTER, coerce_input};
use super::{ControlParam, UGenGraph};

/// One input of a node about to be created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeInput<'a> {
    /// The input value.
    pub value: UGenIn,
    /// Rate requirement declared by the operator for this argument.
    pub requirement: InputRate,
    /// Argument name, used in error messages.
    pub arg: &'a str,
}

impl<'a> NodeInput<'a> {
    /// An input taken at any rate.
    pub fn any(value: UGenIn, arg: &'a str) -> Self {
        Self {
            value,
            requirement: InputRate::Any,
            arg,
        }
    }
}

/// Description of a node to append with [`UGenGraphBuilder::add_ugen`].
#[derive(Clone, Debug)]
pub struct NodeRequest<'a> {
    /// Operator name.
    pub name: &'a str,
    /// Rate the node runs at; every output runs at this rate.
    pub rate: Rate,
    /// Ordered inputs.
    pub inputs: Vec<NodeInput<'a>>,
    /// Number of outputs.
    pub num_outputs: usize,
    /// Operator-specific selector.
    pub special_index: i16,
    /// True for nodes acting beyond their outputs.
    pub side_effect: bool,
}

/// Builds a [`UGenGraph`] while graph elements are expanded.
#[derive(Default)]
pub struct UGenGraphBuilder {
    ugens: Vec<UGen>,
    params: Vec<ControlParam>,
    /// Expansion results keyed by element identity. The `Arc` keeps the
    /// address alive for the lifetime of the build.
    visited: HashMap<usize, (Arc<dyn GraphElem>, UGenInLike)>,
}

impl UGenGraphBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes created so far.
    pub fn len(&self) -> usize {
        self.ugens.len()
    }

    /// True when no node has been created.
    pub fn is_empty(&self) -> bool {
        self.ugens.is_empty()
    }

    /// Nodes created so far, in creation order.
    pub fn ugens(&self) -> &[UGen] {
        &self.ugens
    }

    /// Expands a shared element once; later visits return the cached result.
    pub(crate) fn visit(&mut self, elem: &Arc<dyn GraphElem>) -> Result<UGenInLike, GraphError> {
        let key = identity(elem);
        if let Some((_, expanded)) = self.visited.get(&key) {
            return Ok(expanded.clone());
        }
        let expanded = elem.expand_into(self)?;
        self.visited
            .insert(key, (Arc::clone(elem), expanded.clone()));
        Ok(expanded)
    }

    /// Appends a node, inserting rate adapters in front of it where needed.
    ///
    /// Every input is checked with [`coerce_input`] before anything is
    /// appended, so a rejected input leaves the builder untouched.
    ///
    /// Returns the node's output: a single output for one-output nodes, a
    /// group otherwise (empty for nodes without outputs).
    pub fn add_ugen(&mut self, request: NodeRequest<'_>) -> Result<UGenInLike, GraphError> {
        let mut coercions = Vec::with_capacity(request.inputs.len());
        for input in &request.inputs {
            let input_rate = input.value.rate();
            match coerce_input(request.rate, input_rate, input.requirement) {
                Coercion::Reject => {
                    return Err(GraphError::incompatible_rates(
                        request.name,
                        input.arg,
                        request.rate,
                        input_rate,
                    ));
                }
                coercion => coercions.push(coercion),
            }
        }

        let mut inputs = Vec::with_capacity(request.inputs.len());
        for (input, coercion) in request.inputs.iter().zip(coercions) {
            let value = if coercion == Coercion::Upsample {
                self.push_adapter(input.value)
            } else {
                input.value
            };
            inputs.push(value);
        }

        let id = self.push(UGen {
            name: request.name.to_owned(),
            rate: request.rate,
            inputs,
            output_rates: vec![request.rate; request.num_outputs],
            special_index: request.special_index,
            side_effect: request.side_effect,
        });

        Ok(outputs_of(id, request.rate, request.num_outputs))
    }

    /// Declares a named control and appends its control node.
    ///
    /// The node's special index is the offset of the control's first value
    /// in the graph's parameter table.
    pub fn add_control(
        &mut self,
        name: &str,
        rate: Rate,
        values: &[f32],
    ) -> Result<UGenInLike, GraphError> {
        if values.is_empty() {
            return Err(GraphError::EmptyControl(name.to_owned()));
        }
        if self.params.iter().any(|p| p.name == name) {
            return Err(GraphError::DuplicateControl(name.to_owned()));
        }
        let node_name = match rate {
            Rate::Scalar | Rate::Control => "Control",
            Rate::Audio => "AudioControl",
            Rate::Demand => return Err(GraphError::unsupported_rate("Control", rate)),
        };
        let offset = self.params.last().map_or(0, |p| p.index + p.values.len());
        let special_index = i16::try_from(offset).map_err(|_| GraphError::ParameterTableFull {
            control: name.to_owned(),
            offset,
        })?;
        self.params.push(ControlParam {
            name: name.to_owned(),
            index: offset,
            values: values.to_vec(),
        });

        let id = self.push(UGen {
            name: node_name.to_owned(),
            rate,
            inputs: Vec::new(),
            output_rates: vec![rate; values.len()],
            special_index,
            side_effect: false,
        });
        Ok(outputs_of(id, rate, values.len()))
    }

    /// Finishes the build and checks the graph invariants.
    pub fn build(self, roots: Vec<UGenInLike>) -> Result<UGenGraph, GraphError> {
        let graph = UGenGraph {
            ugens: self.ugens,
            params: self.params,
            roots,
        };
        graph.validate()?;
        Ok(graph)
    }

    fn push_adapter(&mut self, value: UGenIn) -> UGenIn {
        let id = self.push(UGen {
            name: UPSAMPLE_ADAPTER.to_owned(),
            rate: Rate::Audio,
            inputs: vec![value],
            output_rates: vec![Rate::Audio],
            special_index: 0,
            side_effect: false,
        });
        #[cfg(feature = "tracing")]
        tracing::debug!("rate_adapter: {UPSAMPLE_ADAPTER} {id} for input {value}");
        UGenIn::Output {
            ugen: id,
            output: 0,
            rate: Rate::Audio,
        }
    }

    fn push(&mut self, ugen: UGen) -> UGenId {
        let id = UGenId(self.ugens.len() as u32);
        #[cfg(feature = "tracing")]
        tracing::debug!("graph_add: {id} {ugen}");
        self.ugens.push(ugen);
        id
    }
}

fn outputs_of(id: UGenId, rate: Rate, num_outputs: usize) -> UGenInLike {
    let output = |i: usize| UGenIn::Output {
        ugen: id,
        output: i as u32,
        rate,
    };
    if num_outputs == 1 {
        UGenInLike::Single(output(0))
    } else {
        UGenInLike::Group((0..num_outputs).map(|i| output(i).into()).collect())
    }
}
