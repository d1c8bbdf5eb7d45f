//! Execution-rate classes for graph elements and nodes.
//!
//! A [`Rate`] says how often a node output is recomputed by the engine. Rates
//! are pure tags: the rules that decide whether an output of one rate may feed
//! an input of a node running at another live in
//! [`coerce_input`](crate::graph::coerce_input).

use core::fmt;

/// Execution-frequency class of a node or node output.
///
/// The derived order (`Scalar < Control < Audio < Demand`) is only used to pick
/// the rate of elements whose rate follows their inputs, e.g. a binary operator
/// runs at the highest rate of its two operands. It is not a compatibility
/// order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Rate {
    /// Computed once when the synth starts (`ir`).
    Scalar,
    /// Computed once per control block (`kr`).
    Control,
    /// Computed per sample (`ar`).
    Audio,
    /// Computed when pulled by a demand-driven consumer (`dr`).
    Demand,
}

impl Rate {
    /// All rates in ascending order.
    pub const ALL: [Rate; 4] = [Rate::Scalar, Rate::Control, Rate::Audio, Rate::Demand];

    /// Wire identifier used by the graph codec and the synth-definition format.
    pub const fn id(self) -> u8 {
        match self {
            Rate::Scalar => 0,
            Rate::Control => 1,
            Rate::Audio => 2,
            Rate::Demand => 3,
        }
    }

    /// Inverse of [`id()`](Self::id).
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Rate::Scalar),
            1 => Some(Rate::Control),
            2 => Some(Rate::Audio),
            3 => Some(Rate::Demand),
            _ => None,
        }
    }

    /// Lowercase rate name.
    pub const fn name(self) -> &'static str {
        match self {
            Rate::Scalar => "scalar",
            Rate::Control => "control",
            Rate::Audio => "audio",
            Rate::Demand => "demand",
        }
    }

    /// Conventional two-letter method suffix (`ir`, `kr`, `ar`, `dr`).
    pub const fn suffix(self) -> &'static str {
        match self {
            Rate::Scalar => "ir",
            Rate::Control => "kr",
            Rate::Audio => "ar",
            Rate::Demand => "dr",
        }
    }

    /// Parses either a rate name or its method suffix.
    pub fn parse(s: &str) -> Option<Self> {
        Rate::ALL
            .into_iter()
            .find(|r| s.eq_ignore_ascii_case(r.name()) || s.eq_ignore_ascii_case(r.suffix()))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_round_trip() {
        for rate in Rate::ALL {
            assert_eq!(Rate::from_id(rate.id()), Some(rate));
        }
        assert_eq!(Rate::from_id(4), None);
    }

    #[test]
    fn derived_order_picks_highest_rate() {
        assert_eq!(Rate::Control.max(Rate::Audio), Rate::Audio);
        assert_eq!(Rate::Scalar.max(Rate::Control), Rate::Control);
        assert_eq!(Rate::Audio.max(Rate::Demand), Rate::Demand);
    }

    #[test]
    fn parse_accepts_names_and_suffixes() {
        assert_eq!(Rate::parse("audio"), Some(Rate::Audio));
        assert_eq!(Rate::parse("kr"), Some(Rate::Control));
        assert_eq!(Rate::parse("IR"), Some(Rate::Scalar));
        assert_eq!(Rate::parse("fast"), None);
    }

    #[test]
    fn display_uses_name() {
        assert_eq!(Rate::Demand.to_string(), "demand");
    }
}
