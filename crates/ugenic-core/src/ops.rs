//! Operator elements: unary and binary math, mixing and channel selection.
//!
//! Math operators become `UnaryOpUGen` / `BinaryOpUGen` nodes whose special
//! index is the engine's selector number. Operators on two constants are
//! folded at construction time and create no node.
//!
//! ```rust,ignore
//! let osc = registry.create("SinOsc", Some(Rate::Audio), vec![GE::from(440.0)])?;
//! let quiet = osc.clone() * GE::from(0.1);
//! let left = GE::seq([osc, quiet]).channel(0);
//! ```

use core::ops::{Add, Div, Mul, Neg, Sub};
use std::sync::Arc;

use crate::constant::Constant;
use crate::error::{GraphError, SerialError};
use crate::expand::{Slot, rewrap};
use crate::ge::{GE, GraphElem, UGenInLike};
use crate::graph::{NodeInput, NodeRequest, UGenGraphBuilder, UGenIn};
use crate::rate::Rate;
use crate::serial::{Elem, ProductReader, RefMapIn};

macro_rules! selectors {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($(#[$vmeta:meta])* $variant:ident = $id:literal, $label:literal;)* }) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
        pub enum $name {
            $($(#[$vmeta])* $variant,)*
        }

        impl $name {
            /// Every operator of this kind.
            pub const ALL: &'static [$name] = &[$($name::$variant,)*];

            /// Selector number understood by the engine.
            pub const fn selector(self) -> i16 {
                match self {
                    $($name::$variant => $id,)*
                }
            }

            /// Operator for a selector number.
            pub fn from_selector(selector: i32) -> Result<Self, GraphError> {
                match selector {
                    $($id => Ok($name::$variant),)*
                    _ => Err(GraphError::UnknownSelector { kind: $kind, selector }),
                }
            }

            /// Lowercase operator name.
            pub const fn name(self) -> &'static str {
                match self {
                    $($name::$variant => $label,)*
                }
            }

            /// Operator by name.
            pub fn parse(name: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|op| op.name() == name)
            }
        }
    };
}

selectors! {
    /// Two-operand operators.
    BinaryOp, "binary" {
        /// `a + b`
        Plus = 0, "plus";
        /// `a - b`
        Minus = 1, "minus";
        /// `a * b`
        Times = 2, "times";
        /// `a / b`
        Div = 4, "div";
        /// Floating-point modulo.
        Mod = 5, "mod";
        /// `1` when equal.
        Eq = 6, "eq";
        /// `1` when not equal.
        Neq = 7, "neq";
        /// `1` when `a < b`.
        Lt = 8, "lt";
        /// `1` when `a > b`.
        Gt = 9, "gt";
        /// `1` when `a <= b`.
        Leq = 10, "leq";
        /// `1` when `a >= b`.
        Geq = 11, "geq";
        /// Smaller operand.
        Min = 12, "min";
        /// Larger operand.
        Max = 13, "max";
        /// Bitwise and.
        BitAnd = 14, "bitand";
        /// Bitwise or.
        BitOr = 15, "bitor";
        /// Round to a multiple of `b`.
        Round = 19, "round";
        /// Truncate to a multiple of `b`.
        Trunc = 21, "trunc";
        /// Two-argument arctangent.
        Atan2 = 22, "atan2";
        /// `sqrt(a² + b²)`
        Hypot = 23, "hypot";
        /// `a` to the power `b`.
        Pow = 25, "pow";
        /// `|a - b|`
        AbsDif = 38, "absdif";
        /// Clip to `[-b, b]`.
        Clip2 = 42, "clip2";
        /// Fold into `[-b, b]`.
        Fold2 = 44, "fold2";
        /// Wrap into `[-b, b]`.
        Wrap2 = 45, "wrap2";
    }
}

selectors! {
    /// One-operand operators.
    UnaryOp, "unary" {
        /// `-a`
        Neg = 0, "neg";
        /// Logical not.
        Not = 1, "not";
        /// `|a|`
        Abs = 5, "abs";
        /// Round up.
        Ceil = 8, "ceil";
        /// Round down.
        Floor = 9, "floor";
        /// Fractional part.
        Frac = 10, "frac";
        /// Sign (-1, 0 or 1).
        Sign = 11, "sign";
        /// `a * a`
        Squared = 12, "squared";
        /// `a * a * a`
        Cubed = 13, "cubed";
        /// Square root.
        Sqrt = 14, "sqrt";
        /// Natural exponential.
        Exp = 15, "exp";
        /// `1 / a`
        Reciprocal = 16, "reciprocal";
        /// MIDI note to frequency.
        Midicps = 17, "midicps";
        /// Frequency to MIDI note.
        Cpsmidi = 18, "cpsmidi";
        /// Decibels to amplitude.
        Dbamp = 21, "dbamp";
        /// Amplitude to decibels.
        Ampdb = 22, "ampdb";
        /// Natural logarithm.
        Log = 25, "log";
        /// Sine.
        Sin = 28, "sin";
        /// Cosine.
        Cos = 29, "cos";
        /// Hyperbolic tangent.
        Tanh = 36, "tanh";
        /// `a / (1 + |a|)`
        Distort = 42, "distort";
        /// Soft clipping.
        Softclip = 43, "softclip";
    }
}

impl BinaryOp {
    /// Evaluates the operator on constants, for the operators that fold.
    pub fn fold(self, a: f32, b: f32) -> Option<f32> {
        match self {
            BinaryOp::Plus => Some(a + b),
            BinaryOp::Minus => Some(a - b),
            BinaryOp::Times => Some(a * b),
            BinaryOp::Div => Some(a / b),
            BinaryOp::Min => Some(a.min(b)),
            BinaryOp::Max => Some(a.max(b)),
            _ => None,
        }
    }
}

impl UnaryOp {
    /// Evaluates the operator on a constant, for the operators that fold.
    pub fn fold(self, a: f32) -> Option<f32> {
        match self {
            UnaryOp::Neg => Some(-a),
            UnaryOp::Abs => Some(a.abs()),
            UnaryOp::Squared => Some(a * a),
            UnaryOp::Cubed => Some(a * a * a),
            UnaryOp::Reciprocal => Some(1.0 / a),
            _ => None,
        }
    }
}

// --- binary ---

/// Product key of binary operator elements and node name of their nodes.
pub const BINARY_OP_UGEN: &str = "BinaryOpUGen";
/// Product key of unary operator elements and node name of their nodes.
pub const UNARY_OP_UGEN: &str = "UnaryOpUGen";

/// A binary operator applied to two elements.
#[derive(Clone, Debug)]
pub struct BinaryOpUGen {
    op: BinaryOp,
    a: GE,
    b: GE,
}

impl BinaryOpUGen {
    /// Applies `op`, folding two constant operands.
    pub fn make(op: BinaryOp, a: GE, b: GE) -> GE {
        if let (Some(x), Some(y)) = (a.as_constant(), b.as_constant()) {
            if let Some(v) = op.fold(x.value(), y.value()) {
                return GE::from(v);
            }
        }
        GE::elem(BinaryOpUGen { op, a, b })
    }

    /// The operator.
    pub fn op(&self) -> BinaryOp {
        self.op
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(BINARY_OP_UGEN, 3, arity)?;
            let op = BinaryOp::from_selector(input.read_int()?)
                .map_err(|e| SerialError::invalid_product(BINARY_OP_UGEN, e))?;
            let a = input.read_ge()?;
            let b = input.read_ge()?;
            Ok(GE::elem(BinaryOpUGen { op, a, b }))
        })
    }
}

/// Expands `op` over two already expanded operands.
pub(crate) fn expand_binary(
    builder: &mut UGenGraphBuilder,
    op: BinaryOp,
    a: UGenInLike,
    b: UGenInLike,
) -> Result<UGenInLike, GraphError> {
    let slots = [Slot::expand(a), Slot::expand(b)];
    rewrap(builder, &slots, &mut |builder, tuple| {
        let (x, y) = (tuple[0][0], tuple[1][0]);
        if let (Some(cx), Some(cy)) = (x.as_constant(), y.as_constant()) {
            if let Some(v) = op.fold(cx.value(), cy.value()) {
                return Ok(UGenIn::Constant(Constant::new(v)).into());
            }
        }
        builder.add_ugen(NodeRequest {
            name: BINARY_OP_UGEN,
            rate: x.rate().max(y.rate()),
            inputs: vec![NodeInput::any(x, "a"), NodeInput::any(y, "b")],
            num_outputs: 1,
            special_index: op.selector(),
            side_effect: false,
        })
    })
}

impl GraphElem for BinaryOpUGen {
    fn product_key(&self) -> &str {
        BINARY_OP_UGEN
    }

    fn fields(&self) -> Vec<Elem> {
        vec![
            Elem::Int(i32::from(self.op.selector())),
            Elem::Ge(self.a.clone()),
            Elem::Ge(self.b.clone()),
        ]
    }

    fn rate(&self) -> Option<Rate> {
        Some(self.a.rate()?.max(self.b.rate()?))
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        let a = self.a.expand(builder)?;
        let b = self.b.expand(builder)?;
        expand_binary(builder, self.op, a, b)
    }
}

// --- unary ---

/// A unary operator applied to an element.
#[derive(Clone, Debug)]
pub struct UnaryOpUGen {
    op: UnaryOp,
    a: GE,
}

impl UnaryOpUGen {
    /// Applies `op`, folding a constant operand.
    pub fn make(op: UnaryOp, a: GE) -> GE {
        if let Some(v) = a.as_constant().and_then(|c| op.fold(c.value())) {
            return GE::from(v);
        }
        GE::elem(UnaryOpUGen { op, a })
    }

    /// The operator.
    pub fn op(&self) -> UnaryOp {
        self.op
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(UNARY_OP_UGEN, 2, arity)?;
            let op = UnaryOp::from_selector(input.read_int()?)
                .map_err(|e| SerialError::invalid_product(UNARY_OP_UGEN, e))?;
            let a = input.read_ge()?;
            Ok(GE::elem(UnaryOpUGen { op, a }))
        })
    }
}

impl GraphElem for UnaryOpUGen {
    fn product_key(&self) -> &str {
        UNARY_OP_UGEN
    }

    fn fields(&self) -> Vec<Elem> {
        vec![
            Elem::Int(i32::from(self.op.selector())),
            Elem::Ge(self.a.clone()),
        ]
    }

    fn rate(&self) -> Option<Rate> {
        self.a.rate()
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        let a = self.a.expand(builder)?;
        let op = self.op;
        rewrap(builder, &[Slot::expand(a)], &mut |builder, tuple| {
            let x = tuple[0][0];
            if let Some(v) = x.as_constant().and_then(|c| op.fold(c.value())) {
                return Ok(UGenIn::Constant(Constant::new(v)).into());
            }
            builder.add_ugen(NodeRequest {
                name: UNARY_OP_UGEN,
                rate: x.rate(),
                inputs: vec![NodeInput::any(x, "a")],
                num_outputs: 1,
                special_index: op.selector(),
                side_effect: false,
            })
        })
    }
}

// --- channel structure ---

/// Sums the top-level channels of an element.
#[derive(Clone, Debug)]
pub struct Mix {
    input: GE,
}

impl Mix {
    /// Product key.
    pub const KEY: &'static str = "Mix";

    /// Mixes `input` down to its channel sum.
    pub fn make(input: GE) -> GE {
        GE::elem(Mix { input })
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(Mix::KEY, 1, arity)?;
            Ok(Mix::make(input.read_ge()?))
        })
    }
}

impl GraphElem for Mix {
    fn product_key(&self) -> &str {
        Mix::KEY
    }

    fn fields(&self) -> Vec<Elem> {
        vec![Elem::Ge(self.input.clone())]
    }

    fn rate(&self) -> Option<Rate> {
        self.input.rate()
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        let mut channels = self.input.expand(builder)?.into_channels().into_iter();
        let Some(mut sum) = channels.next() else {
            return Ok(UGenIn::Constant(Constant::ZERO).into());
        };
        for channel in channels {
            sum = expand_binary(builder, BinaryOp::Plus, sum, channel)?;
        }
        Ok(sum)
    }
}

/// Selects one channel of an element, wrapping around by position.
#[derive(Clone, Debug)]
pub struct ChannelProxy {
    elem: GE,
    index: u16,
}

impl ChannelProxy {
    /// Product key.
    pub const KEY: &'static str = "ChannelProxy";

    /// Selects channel `index` of `elem`.
    pub fn make(elem: GE, index: u16) -> GE {
        GE::elem(ChannelProxy { elem, index })
    }

    /// Selects channel `index` of `elem`, rejecting indices outside `0..=65535`.
    pub fn try_make(elem: GE, index: i32) -> Result<GE, GraphError> {
        let index = u16::try_from(index).map_err(|_| GraphError::InvalidChannelIndex(index))?;
        Ok(ChannelProxy::make(elem, index))
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(ChannelProxy::KEY, 2, arity)?;
            let elem = input.read_ge()?;
            let index = input.read_int()?;
            ChannelProxy::try_make(elem, index)
                .map_err(|e| SerialError::invalid_product(ChannelProxy::KEY, e))
        })
    }
}

impl GraphElem for ChannelProxy {
    fn product_key(&self) -> &str {
        ChannelProxy::KEY
    }

    fn fields(&self) -> Vec<Elem> {
        vec![Elem::Ge(self.elem.clone()), Elem::Int(i32::from(self.index))]
    }

    fn rate(&self) -> Option<Rate> {
        match &self.elem {
            GE::Seq(channels) if !channels.is_empty() => {
                channels[self.index as usize % channels.len()].rate()
            }
            other => other.rate(),
        }
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        Ok(self.elem.expand(builder)?.channel(self.index as usize))
    }
}

/// Flattens every nesting level of an element into one group.
#[derive(Clone, Debug)]
pub struct Flatten {
    elem: GE,
}

impl Flatten {
    /// Product key.
    pub const KEY: &'static str = "Flatten";

    /// Flattens `elem`.
    pub fn make(elem: GE) -> GE {
        GE::elem(Flatten { elem })
    }

    /// Codec reader.
    pub fn reader() -> ProductReader {
        Arc::new(|input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            RefMapIn::check_arity(Flatten::KEY, 1, arity)?;
            Ok(Flatten::make(input.read_ge()?))
        })
    }
}

impl GraphElem for Flatten {
    fn product_key(&self) -> &str {
        Flatten::KEY
    }

    fn fields(&self) -> Vec<Elem> {
        vec![Elem::Ge(self.elem.clone())]
    }

    fn rate(&self) -> Option<Rate> {
        self.elem.rate()
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        let outputs = self.elem.expand(builder)?.flat_outputs();
        Ok(UGenInLike::Group(outputs.into_iter().map(UGenInLike::Single).collect()))
    }
}

// --- GE sugar ---

impl GE {
    /// Applies a binary operator.
    pub fn binary(self, op: BinaryOp, other: GE) -> GE {
        BinaryOpUGen::make(op, self, other)
    }

    /// Applies a unary operator.
    pub fn unary(self, op: UnaryOp) -> GE {
        UnaryOpUGen::make(op, self)
    }

    /// Sums the channels.
    pub fn mix(self) -> GE {
        Mix::make(self)
    }

    /// Selects one channel.
    pub fn channel(self, index: u16) -> GE {
        ChannelProxy::make(self, index)
    }

    /// Flattens all channel nesting.
    pub fn flatten(self) -> GE {
        Flatten::make(self)
    }
}

macro_rules! binary_ops {
    ($($trait:ident, $method:ident, $op:ident;)*) => {
        $(
            impl $trait for GE {
                type Output = GE;

                fn $method(self, rhs: GE) -> GE {
                    BinaryOpUGen::make(BinaryOp::$op, self, rhs)
                }
            }
        )*
    };
}

binary_ops! {
    Add, add, Plus;
    Sub, sub, Minus;
    Mul, mul, Times;
    Div, div, Div;
}

impl Neg for GE {
    type Output = GE;

    fn neg(self) -> GE {
        UnaryOpUGen::make(UnaryOp::Neg, self)
    }
}
