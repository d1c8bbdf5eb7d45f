//! Named synth parameters.

use std::sync::Arc;

use crate::error::{GraphError, SerialError};
use crate::ge::{GE, GraphElem, UGenInLike};
use crate::graph::UGenGraphBuilder;
use crate::rate::Rate;
use crate::serial::{Elem, ProductReader, RefMapIn};

/// A named parameter with default values, one per channel.
///
/// Expands into one `Control` (scalar or control rate) or `AudioControl`
/// node and an entry in the graph's parameter table.
#[derive(Clone, Debug, PartialEq)]
pub struct ControlProxy {
    name: String,
    rate: Rate,
    values: Vec<f32>,
}

impl ControlProxy {
    /// Product key.
    pub const KEY: &'static str = "ControlProxy";

    /// Creates a control. Demand rate and empty defaults are rejected.
    pub fn new(name: impl Into<String>, rate: Rate, values: Vec<f32>) -> Result<Self, GraphError> {
        let name = name.into();
        if values.is_empty() {
            return Err(GraphError::EmptyControl(name));
        }
        if rate == Rate::Demand {
            return Err(GraphError::unsupported_rate("Control", rate));
        }
        Ok(Self { name, rate, values })
    }

    /// Creates the control and wraps it into a graph element.
    pub fn make(name: impl Into<String>, rate: Rate, values: Vec<f32>) -> Result<GE, GraphError> {
        Self::new(name, rate, values).map(GE::elem)
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Default values.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(ControlProxy::KEY, 3, arity)?;
            let name = input.read_str()?;
            let rate = input.read_rate()?;
            let values = input.read_seq(RefMapIn::read_float)?;
            ControlProxy::make(name, rate, values)
                .map_err(|e| SerialError::invalid_product(ControlProxy::KEY, e))
        })
    }
}

impl GraphElem for ControlProxy {
    fn product_key(&self) -> &str {
        ControlProxy::KEY
    }

    fn fields(&self) -> Vec<Elem> {
        vec![
            Elem::Str(self.name.clone()),
            Elem::Rate(self.rate),
            Elem::Seq(self.values.iter().copied().map(Elem::Float).collect()),
        ]
    }

    fn rate(&self) -> Option<Rate> {
        Some(self.rate)
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        builder.add_control(&self.name, self.rate, &self.values)
    }
}
