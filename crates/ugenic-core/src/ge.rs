//! Graph elements: declarative, possibly multichannel expressions.
//!
//! A [`GE`] is not a node yet. Expanding it against a
//! [`UGenGraphBuilder`] produces a [`UGenInLike`]: one output reference, or an
//! ordered group of them (one per channel), possibly nested.
//!
//! Elements are immutable and shared through `Arc`. The identity of the `Arc`
//! matters: a shared element expands once per graph build and is encoded once
//! by the codec, with later occurrences written as back-references.
//!
//! # Example
//!
//! ```rust,ignore
//! let freq = GE::from(440.0);
//! let osc = registry.create("SinOsc", Some(Rate::Audio), vec![freq])?;
//! let stereo = GE::seq([osc.clone(), osc * GE::from(0.5)]);
//! ```

use core::fmt;
use std::sync::Arc;

use crate::constant::Constant;
use crate::error::GraphError;
use crate::graph::{UGenGraphBuilder, UGenIn};
use crate::rate::Rate;
use crate::serial::Elem;

/// Behaviour shared by every non-constant graph element kind.
///
/// Implementors are plain immutable values; the registry maps their
/// [`product_key()`](Self::product_key) back to a reader for decoding.
pub trait GraphElem: fmt::Debug + Send + Sync + 'static {
    /// Registry key of this element kind.
    fn product_key(&self) -> &str;

    /// Fields in declaration order, as written by the codec.
    fn fields(&self) -> Vec<Elem>;

    /// Rate of the element when it is known before expansion.
    fn rate(&self) -> Option<Rate>;

    /// Expands the element into nodes. Called at most once per element
    /// identity and graph build; use [`GE::expand`] for children.
    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError>;
}

/// A graph element.
#[derive(Clone, Debug)]
pub enum GE {
    /// A single-channel constant.
    Constant(Constant),
    /// A shared element (operator, proxy, control).
    Elem(Arc<dyn GraphElem>),
    /// Parallel channels.
    Seq(Vec<GE>),
}

impl GE {
    /// Wraps an element kind into a shareable graph element.
    pub fn elem(elem: impl GraphElem) -> Self {
        GE::Elem(Arc::new(elem))
    }

    /// Builds a multichannel element from its channels.
    pub fn seq(channels: impl IntoIterator<Item = GE>) -> Self {
        GE::Seq(channels.into_iter().collect())
    }

    /// Rate of the element if known before expansion.
    ///
    /// Sequences report the highest rate among their channels.
    pub fn rate(&self) -> Option<Rate> {
        match self {
            GE::Constant(c) => Some(c.rate()),
            GE::Elem(e) => e.rate(),
            GE::Seq(channels) => channels.iter().filter_map(GE::rate).max(),
        }
    }

    /// Returns the constant if this element is one.
    pub fn as_constant(&self) -> Option<Constant> {
        match self {
            GE::Constant(c) => Some(*c),
            _ => None,
        }
    }

    /// Returns the shared element if this is one.
    pub fn as_elem(&self) -> Option<&Arc<dyn GraphElem>> {
        match self {
            GE::Elem(e) => Some(e),
            _ => None,
        }
    }

    /// True when both are the same shared element instance.
    pub fn is_same(&self, other: &GE) -> bool {
        match (self, other) {
            (GE::Elem(a), GE::Elem(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Expands the element into nodes of `builder`.
    ///
    /// Shared elements are memoized by identity, so the same `Arc` always
    /// yields the same outputs within one build.
    pub fn expand(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        match self {
            GE::Constant(c) => Ok(UGenInLike::Single(UGenIn::Constant(*c))),
            GE::Elem(e) => builder.visit(e),
            GE::Seq(channels) => channels
                .iter()
                .map(|ge| ge.expand(builder))
                .collect::<Result<Vec<_>, _>>()
                .map(UGenInLike::Group),
        }
    }
}

/// Identity key of a shared element, stable while the `Arc` is alive.
pub(crate) fn identity(elem: &Arc<dyn GraphElem>) -> usize {
    Arc::as_ptr(elem).cast::<()>() as usize
}

impl PartialEq for GE {
    /// Structural equality. Shared instances short-circuit.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (GE::Constant(a), GE::Constant(b)) => a == b,
            (GE::Seq(a), GE::Seq(b)) => a == b,
            (GE::Elem(a), GE::Elem(b)) => {
                Arc::ptr_eq(a, b)
                    || (a.product_key() == b.product_key() && a.fields() == b.fields())
            }
            _ => false,
        }
    }
}

impl From<f32> for GE {
    /// The designated number-to-element conversion: a single-channel constant.
    fn from(value: f32) -> Self {
        GE::Constant(Constant::new(value))
    }
}

impl From<Constant> for GE {
    fn from(c: Constant) -> Self {
        GE::Constant(c)
    }
}

impl From<Vec<GE>> for GE {
    fn from(channels: Vec<GE>) -> Self {
        GE::Seq(channels)
    }
}

impl From<Arc<dyn GraphElem>> for GE {
    fn from(elem: Arc<dyn GraphElem>) -> Self {
        GE::Elem(elem)
    }
}

/// Result of expanding one [`GE`].
#[derive(Clone, Debug, PartialEq)]
pub enum UGenInLike {
    /// One concrete output or constant.
    Single(UGenIn),
    /// Ordered channels, each possibly a group itself.
    Group(Vec<UGenInLike>),
}

impl UGenInLike {
    /// Collapses singleton groups, recursively.
    ///
    /// `Group([x])` becomes `x.unbubble()`; everything else is returned as is.
    pub fn unbubble(self) -> UGenInLike {
        match self {
            UGenInLike::Group(mut channels) if channels.len() == 1 => {
                channels.pop().map_or(UGenInLike::Group(Vec::new()), UGenInLike::unbubble)
            }
            other => other,
        }
    }

    /// Number of top-level channels. A single output counts as one.
    pub fn num_channels(&self) -> usize {
        match self {
            UGenInLike::Single(_) => 1,
            UGenInLike::Group(channels) => channels.len(),
        }
    }

    /// Selects channel `index` with wraparound by position.
    ///
    /// A single output is its own value at every position; an empty group
    /// stays empty.
    pub fn channel(&self, index: usize) -> UGenInLike {
        match self {
            UGenInLike::Single(_) => self.clone(),
            UGenInLike::Group(channels) if channels.is_empty() => self.clone(),
            UGenInLike::Group(channels) => channels[index % channels.len()].clone(),
        }
    }

    /// Top-level channels: a single output becomes a one-element list.
    pub fn into_channels(self) -> Vec<UGenInLike> {
        match self {
            single @ UGenInLike::Single(_) => vec![single],
            UGenInLike::Group(channels) => channels,
        }
    }

    /// All leaf outputs in channel order, flattening every nesting level.
    pub fn flat_outputs(&self) -> Vec<UGenIn> {
        let mut out = Vec::new();
        self.collect_outputs(&mut out);
        out
    }

    fn collect_outputs(&self, out: &mut Vec<UGenIn>) {
        match self {
            UGenInLike::Single(u) => out.push(*u),
            UGenInLike::Group(channels) => {
                for channel in channels {
                    channel.collect_outputs(out);
                }
            }
        }
    }

    /// Returns the single output if this is one.
    pub fn as_single(&self) -> Option<UGenIn> {
        match self {
            UGenInLike::Single(u) => Some(*u),
            UGenInLike::Group(_) => None,
        }
    }
}

impl From<UGenIn> for UGenInLike {
    fn from(u: UGenIn) -> Self {
        UGenInLike::Single(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(v: f32) -> UGenInLike {
        UGenInLike::Single(UGenIn::Constant(Constant::new(v)))
    }

    #[test]
    fn unbubble_collapses_nested_singletons() {
        let nested = UGenInLike::Group(vec![UGenInLike::Group(vec![c(1.0)])]);
        assert_eq!(nested.unbubble(), c(1.0));
    }

    #[test]
    fn unbubble_keeps_wider_groups() {
        let group = UGenInLike::Group(vec![c(1.0), c(2.0)]);
        assert_eq!(group.clone().unbubble(), group);
    }

    #[test]
    fn unbubble_does_not_reach_into_wide_groups() {
        let group = UGenInLike::Group(vec![UGenInLike::Group(vec![c(1.0)]), c(2.0)]);
        assert_eq!(group.clone().unbubble(), group);
    }

    #[test]
    fn channel_wraps_by_position() {
        let group = UGenInLike::Group(vec![c(1.0), c(2.0), c(3.0)]);
        assert_eq!(group.channel(1), c(2.0));
        assert_eq!(group.channel(4), c(2.0));
        assert_eq!(c(7.0).channel(5), c(7.0));
    }

    #[test]
    fn flat_outputs_flattens_every_level() {
        let group = UGenInLike::Group(vec![
            c(1.0),
            UGenInLike::Group(vec![c(2.0), UGenInLike::Group(vec![c(3.0)])]),
        ]);
        let values: Vec<f32> = group
            .flat_outputs()
            .iter()
            .filter_map(|u| u.as_constant())
            .map(Constant::value)
            .collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn seq_rate_is_highest_channel_rate() {
        let ge = GE::seq([GE::from(1.0), GE::from(2.0)]);
        assert_eq!(ge.rate(), Some(Rate::Scalar));
        assert_eq!(GE::seq([]).rate(), None);
    }

    #[test]
    fn constant_equality() {
        assert_eq!(GE::from(0.5), GE::from(0.5));
        assert_ne!(GE::from(0.5), GE::seq([GE::from(0.5)]));
    }
}
