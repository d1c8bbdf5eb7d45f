//! Multichannel expansion.
//!
//! An operator call receives one [`Slot`] per declared argument. Expanding
//! slots take part in multichannel expansion; fixed and multi slots do not.
//!
//! [`rewrap`] computes the expansion width `n` as the largest channel count
//! among expanding slots holding a group (singletons were already unbubbled).
//! With no group present the operator is instantiated once. Otherwise it is
//! instantiated `n` times: at position `i` every expanding slot contributes
//! its channel `i` (wrapping by position, a single output repeats), fixed and
//! multi slots contribute the same inputs to every tuple. A channel that is
//! itself a group expands again, so nested groups produce nested results.
//!
//! ```text
//! args:     mode=0 (fixed)   a (width 1)   b = [b0, b1, b2]
//! tuples:   (0, a, b0)       (0, a, b1)    (0, a, b2)
//! result:   Group([op0, op1, op2])
//! ```

use crate::error::GraphError;
use crate::ge::UGenInLike;
use crate::graph::{UGenGraphBuilder, UGenIn};

/// One argument position of an operator call, already expanded.
#[derive(Clone, Debug, PartialEq)]
pub enum Slot {
    /// Takes part in multichannel expansion.
    Expand(UGenInLike),
    /// A value repeated identically in every tuple.
    Fixed(UGenIn),
    /// Consecutive inputs appended identically in every tuple.
    Multi(Vec<UGenIn>),
}

impl Slot {
    /// Creates an expanding slot, unbubbling the value first.
    pub fn expand(value: UGenInLike) -> Self {
        Slot::Expand(value.unbubble())
    }

    /// Width this slot imposes on the expansion, if it holds a group.
    fn group_width(&self) -> Option<usize> {
        match self {
            Slot::Expand(UGenInLike::Group(channels)) => Some(channels.len()),
            _ => None,
        }
    }

    /// The slot as seen by tuple `index`.
    fn channel(&self, index: usize) -> Slot {
        match self {
            Slot::Expand(value) => Slot::Expand(value.channel(index).unbubble()),
            other => other.clone(),
        }
    }

    /// Concrete inputs of a slot that no longer needs expansion.
    fn inputs(&self) -> Vec<UGenIn> {
        match self {
            Slot::Expand(UGenInLike::Single(u)) | Slot::Fixed(u) => vec![*u],
            Slot::Expand(group) => group.flat_outputs(),
            Slot::Multi(inputs) => inputs.clone(),
        }
    }
}

/// Width of the expansion over `slots`: `None` when no slot holds a group.
pub fn expansion_width(slots: &[Slot]) -> Option<usize> {
    slots.iter().filter_map(Slot::group_width).max()
}

/// Instantiates `make` once per parallel argument tuple.
///
/// `make` receives the concrete inputs of every slot, in slot order (one input
/// for expanding and fixed slots, all channels for multi slots). Its results
/// are returned directly when there is no expansion, or grouped in channel
/// order otherwise.
pub fn rewrap<F>(
    builder: &mut UGenGraphBuilder,
    slots: &[Slot],
    make: &mut F,
) -> Result<UGenInLike, GraphError>
where
    F: FnMut(&mut UGenGraphBuilder, Vec<Vec<UGenIn>>) -> Result<UGenInLike, GraphError>,
{
    match expansion_width(slots) {
        None => {
            let inputs = slots.iter().map(Slot::inputs).collect();
            make(builder, inputs)
        }
        Some(width) => {
            let mut channels = Vec::with_capacity(width);
            for index in 0..width {
                let tuple: Vec<Slot> = slots.iter().map(|slot| slot.channel(index)).collect();
                channels.push(rewrap(builder, &tuple, make)?);
            }
            Ok(UGenInLike::Group(channels))
        }
    }
}
