//! Scalar constant leaves.

use core::fmt;
use core::hash::{Hash, Hasher};

use crate::rate::Rate;

/// An immutable 32-bit float leaf of a graph.
///
/// Constants always run at [`Rate::Scalar`]. Equality and hashing use the bit
/// pattern of the value, so a constant equals itself even when it is NaN and
/// the synth-definition constant table can deduplicate by the same key.
#[derive(Clone, Copy, Debug)]
pub struct Constant(f32);

impl Constant {
    /// The constant `0`.
    pub const ZERO: Constant = Constant(0.0);
    /// The constant `1`.
    pub const ONE: Constant = Constant(1.0);
    /// The constant `-1`.
    pub const MINUS_ONE: Constant = Constant(-1.0);

    /// Creates a constant.
    #[inline]
    pub const fn new(value: f32) -> Self {
        Self(value)
    }

    /// Returns the value.
    #[inline]
    pub const fn value(self) -> f32 {
        self.0
    }

    /// Constants are scalar-rate.
    #[inline]
    pub const fn rate(self) -> Rate {
        Rate::Scalar
    }
}

impl PartialEq for Constant {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for Constant {}

impl Hash for Constant {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl From<f32> for Constant {
    fn from(value: f32) -> Self {
        Self(value)
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
