//! Rate compatibility between node inputs and the node consuming them.
//!
//! Only inputs declared [`InputRate::MatchNode`] are checked. For those:
//!
//! | node \ input | scalar   | control  | audio    | demand |
//! |--------------|----------|----------|----------|--------|
//! | scalar       | accept   | reject   | reject   | reject |
//! | control      | accept   | accept   | reject   | reject |
//! | audio        | upsample | upsample | accept   | reject |
//! | demand       | accept   | accept   | accept   | accept |
//!
//! Upsampling inserts a `K2A` adapter node in front of the consumer.

use crate::rate::Rate;

/// Rate requirement of one operator argument.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum InputRate {
    /// Any rate is taken as is. The operator handles rate conversion itself.
    #[default]
    Any,
    /// The input must run at the node's own rate; lower rates are upsampled
    /// into audio nodes, higher rates are rejected.
    MatchNode,
}

/// Outcome of checking one input against its consumer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Coercion {
    /// Wire the input directly.
    Accept,
    /// Wire the input through an audio-rate adapter.
    Upsample,
    /// The connection is invalid.
    Reject,
}

/// Name of the adapter node inserted for [`Coercion::Upsample`].
pub const UPSAMPLE_ADAPTER: &str = "K2A";

/// Decides how an input at `input` rate feeds a node running at `node` rate.
pub fn coerce_input(node: Rate, input: Rate, requirement: InputRate) -> Coercion {
    if requirement == InputRate::Any {
        return Coercion::Accept;
    }
    match (node, input) {
        (Rate::Demand, _) => Coercion::Accept,
        (_, Rate::Demand) => Coercion::Reject,
        (n, i) if n == i => Coercion::Accept,
        (Rate::Audio, Rate::Scalar | Rate::Control) => Coercion::Upsample,
        (Rate::Control, Rate::Scalar) => Coercion::Accept,
        _ => Coercion::Reject,
    }
}
