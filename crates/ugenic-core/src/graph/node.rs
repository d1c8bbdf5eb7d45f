//! Concrete node types of an expanded graph.
//!
//! Each node in a [`UGenGraph`](super::UGenGraph) has a [`UGenId`] equal to its
//! position in creation order. Inputs are either constants or
//! `(node, output)` references to earlier nodes.

use core::fmt;

use crate::constant::Constant;
use crate::rate::Rate;

/// Position of a node in its graph.
///
/// Node IDs are assigned sequentially in creation order and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UGenId(pub(crate) u32);

impl UGenId {
    /// Returns the raw numeric identifier.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Display for UGenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UGenId({})", self.0)
    }
}

/// A single scalar input of a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UGenIn {
    /// A constant value.
    Constant(Constant),
    /// One output of an earlier node.
    Output {
        /// The producing node.
        ugen: UGenId,
        /// Output index on the producing node.
        output: u32,
        /// Rate of that output.
        rate: Rate,
    },
}

impl UGenIn {
    /// Rate of the signal carried by this input.
    pub fn rate(&self) -> Rate {
        match self {
            UGenIn::Constant(c) => c.rate(),
            UGenIn::Output { rate, .. } => *rate,
        }
    }

    /// Returns the constant if this input is one.
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            UGenIn::Constant(c) => Some(*c),
            UGenIn::Output { .. } => None,
        }
    }
}

impl From<Constant> for UGenIn {
    fn from(c: Constant) -> Self {
        UGenIn::Constant(c)
    }
}

impl fmt::Display for UGenIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UGenIn::Constant(c) => write!(f, "{c}"),
            UGenIn::Output { ugen, output, .. } => write!(f, "#{}:{}", ugen.0, output),
        }
    }
}

/// A concrete operation instance.
#[derive(Clone, Debug, PartialEq)]
pub struct UGen {
    pub(crate) name: String,
    pub(crate) rate: Rate,
    pub(crate) inputs: Vec<UGenIn>,
    pub(crate) output_rates: Vec<Rate>,
    pub(crate) special_index: i16,
    pub(crate) side_effect: bool,
}

impl UGen {
    /// Operator name as understood by the engine.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rate the node runs at.
    pub fn rate(&self) -> Rate {
        self.rate
    }

    /// Ordered inputs.
    pub fn inputs(&self) -> &[UGenIn] {
        &self.inputs
    }

    /// Declared rate of each output.
    pub fn output_rates(&self) -> &[Rate] {
        &self.output_rates
    }

    /// Number of outputs.
    pub fn num_outputs(&self) -> usize {
        self.output_rates.len()
    }

    /// Operator-specific selector (operator id, control offset), 0 if unused.
    pub fn special_index(&self) -> i16 {
        self.special_index
    }

    /// True when the node acts on the engine beyond its outputs (bus writes).
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }
}

impl fmt::Display for UGen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.name, self.rate.suffix())?;
        if self.special_index != 0 {
            write!(f, "[{}]", self.special_index)?;
        }
        f.write_str("(")?;
        for (i, input) in self.inputs.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{input}")?;
        }
        write!(f, ") -> {}", self.output_rates.len())
    }
}
