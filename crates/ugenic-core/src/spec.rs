//! Declarative unit-generator specifications.
//!
//! A [`UGenSpec`] says everything the expansion engine needs to know about an
//! operator: which rates it runs at, what its arguments are and how each one
//! takes part in multichannel expansion, and how many outputs it has.
//!
//! ```rust
//! use ugenic_core::{Rate, UGenSpec};
//!
//! let spec = UGenSpec::new("LPF")
//!     .rates([Rate::Audio, Rate::Control])
//!     .matched("in", None)
//!     .arg("freq", Some(440.0));
//! assert_eq!(spec.args().len(), 2);
//! ```

use core::fmt;

use crate::error::GraphError;
use crate::graph::InputRate;
use crate::rate::Rate;

/// How an operator's rate is chosen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RateSpec {
    /// Always runs at one rate.
    Fixed(Rate),
    /// The caller picks one of the listed rates.
    Choice(Vec<Rate>),
    /// Runs at the highest rate among its inputs, per expanded instance.
    FromInputs,
}

/// How an argument takes part in expansion.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArgKind {
    /// Multichannel expansion applies.
    Expand,
    /// A constant repeated identically in every expanded instance.
    Fixed,
    /// All channels become consecutive inputs of every instance.
    Multi,
    /// A constant giving the number of outputs; not emitted as an input.
    Channels,
}

/// One declared argument.
#[derive(Clone, Debug, PartialEq)]
pub struct ArgSpec {
    /// Argument name.
    pub name: String,
    /// Expansion behaviour.
    pub kind: ArgKind,
    /// Rate requirement checked when the node is created.
    pub rate: InputRate,
    /// Value used when the argument is omitted.
    pub default: Option<f32>,
}

/// Number of outputs of an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputSpec {
    /// A fixed count.
    Fixed(usize),
    /// Given by the operator's [`ArgKind::Channels`] argument.
    Channels,
}

/// Description of one operator.
#[derive(Clone, Debug, PartialEq)]
pub struct UGenSpec {
    name: String,
    rates: RateSpec,
    args: Vec<ArgSpec>,
    outputs: OutputSpec,
    side_effect: bool,
}

impl UGenSpec {
    /// Starts a spec for an operator running at audio or control rate with one
    /// output and no arguments.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rates: RateSpec::Choice(vec![Rate::Audio, Rate::Control]),
            args: Vec::new(),
            outputs: OutputSpec::Fixed(1),
            side_effect: false,
        }
    }

    /// Sets the rates the caller may choose from.
    pub fn rates(mut self, rates: impl IntoIterator<Item = Rate>) -> Self {
        self.rates = RateSpec::Choice(rates.into_iter().collect());
        self
    }

    /// Pins the operator to one rate.
    pub fn fixed_rate(mut self, rate: Rate) -> Self {
        self.rates = RateSpec::Fixed(rate);
        self
    }

    /// Derives the rate from the inputs.
    pub fn rate_from_inputs(mut self) -> Self {
        self.rates = RateSpec::FromInputs;
        self
    }

    /// Adds an expanding argument taken at any rate.
    pub fn arg(self, name: &str, default: Option<f32>) -> Self {
        self.push_arg(name, ArgKind::Expand, InputRate::Any, default)
    }

    /// Adds an expanding argument that must match the node's rate.
    pub fn matched(self, name: &str, default: Option<f32>) -> Self {
        self.push_arg(name, ArgKind::Expand, InputRate::MatchNode, default)
    }

    /// Adds a constant argument repeated in every expanded instance.
    pub fn fixed(self, name: &str, default: Option<f32>) -> Self {
        self.push_arg(name, ArgKind::Fixed, InputRate::Any, default)
    }

    /// Adds an argument whose channels are all passed to every instance.
    pub fn multi(self, name: &str, rate: InputRate) -> Self {
        self.push_arg(name, ArgKind::Multi, rate, None)
    }

    /// Adds the constant argument giving the number of outputs.
    pub fn channels(mut self, name: &str, default: Option<f32>) -> Self {
        self.outputs = OutputSpec::Channels;
        self.push_arg(name, ArgKind::Channels, InputRate::Any, default)
    }

    /// Sets a fixed output count.
    pub fn outputs(mut self, count: usize) -> Self {
        self.outputs = OutputSpec::Fixed(count);
        self
    }

    /// Marks the operator as acting beyond its outputs.
    pub fn side_effect(mut self) -> Self {
        self.side_effect = true;
        self
    }

    fn push_arg(mut self, name: &str, kind: ArgKind, rate: InputRate, default: Option<f32>) -> Self {
        self.args.push(ArgSpec {
            name: name.to_owned(),
            kind,
            rate,
            default,
        });
        self
    }

    // --- accessors ---

    /// Operator name; also its registry key.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rate policy.
    pub fn rate_spec(&self) -> &RateSpec {
        &self.rates
    }

    /// Declared arguments in order.
    pub fn args(&self) -> &[ArgSpec] {
        &self.args
    }

    /// Output count policy.
    pub fn output_spec(&self) -> OutputSpec {
        self.outputs
    }

    /// True for operators acting beyond their outputs.
    pub fn has_side_effect(&self) -> bool {
        self.side_effect
    }

    /// Position of the argument called `name`.
    pub fn arg_index(&self, name: &str) -> Option<usize> {
        self.args.iter().position(|a| a.name == name)
    }

    /// True when instances carry a caller-chosen rate.
    pub fn has_rate_choice(&self) -> bool {
        matches!(self.rates, RateSpec::Choice(_))
    }

    /// Checks a requested rate against the policy.
    ///
    /// Returns the rate stored with an instance: the fixed or chosen rate, or
    /// `None` for rates derived from inputs.
    pub fn resolve_rate(&self, requested: Option<Rate>) -> Result<Option<Rate>, GraphError> {
        match (&self.rates, requested) {
            (RateSpec::Fixed(rate), None) => Ok(Some(*rate)),
            (RateSpec::Fixed(rate), Some(r)) if r == *rate => Ok(Some(r)),
            (RateSpec::Choice(_), None) => Err(GraphError::MissingRate {
                ugen: self.name.clone(),
            }),
            (RateSpec::Choice(allowed), Some(r)) if allowed.contains(&r) => Ok(Some(r)),
            (RateSpec::FromInputs, None) => Ok(None),
            (_, Some(r)) => Err(GraphError::unsupported_rate(&self.name, r)),
        }
    }
}

impl fmt::Display for UGenSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        match &self.rates {
            RateSpec::Fixed(rate) => write!(f, ".{}", rate.suffix())?,
            RateSpec::Choice(rates) => {
                let suffixes: Vec<&str> = rates.iter().map(|r| r.suffix()).collect();
                write!(f, ".{{{}}}", suffixes.join(","))?;
            }
            RateSpec::FromInputs => {}
        }
        f.write_str("(")?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(&arg.name)?;
            if let Some(default) = arg.default {
                write!(f, " = {default}")?;
            }
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lpf() -> UGenSpec {
        UGenSpec::new("LPF")
            .matched("in", None)
            .arg("freq", Some(440.0))
    }

    #[test]
    fn builder_records_args() {
        let spec = lpf();
        assert_eq!(spec.arg_index("freq"), Some(1));
        assert_eq!(spec.args()[0].rate, InputRate::MatchNode);
        assert_eq!(spec.args()[1].default, Some(440.0));
        assert_eq!(spec.output_spec(), OutputSpec::Fixed(1));
    }

    #[test]
    fn channels_arg_switches_output_policy() {
        let spec = UGenSpec::new("In").arg("bus", Some(0.0)).channels("numChannels", Some(1.0));
        assert_eq!(spec.output_spec(), OutputSpec::Channels);
    }

    #[test]
    fn rate_resolution() {
        let spec = lpf();
        assert_eq!(spec.resolve_rate(Some(Rate::Audio)), Ok(Some(Rate::Audio)));
        assert!(matches!(spec.resolve_rate(None), Err(GraphError::MissingRate { .. })));
        assert!(matches!(
            spec.resolve_rate(Some(Rate::Demand)),
            Err(GraphError::UnsupportedRate { .. })
        ));

        let fixed = UGenSpec::new("K2A").fixed_rate(Rate::Audio);
        assert_eq!(fixed.resolve_rate(None), Ok(Some(Rate::Audio)));
        assert!(fixed.resolve_rate(Some(Rate::Control)).is_err());

        let derived = UGenSpec::new("Select").rate_from_inputs();
        assert_eq!(derived.resolve_rate(None), Ok(None));
    }

    #[test]
    fn display_lists_rates_and_defaults() {
        assert_eq!(lpf().to_string(), "LPF.{ar,kr}(in, freq = 440)");
    }
}
