//! The generic operator element driven by a [`UGenSpec`].

use std::sync::Arc;

use crate::error::{GraphError, SerialError};
use crate::expand::{Slot, rewrap};
use crate::ge::{GE, GraphElem, UGenInLike};
use crate::graph::{NodeInput, NodeRequest, UGenGraphBuilder};
use crate::rate::Rate;
use crate::serial::{Elem, ProductReader, RefMapIn};
use crate::spec::{ArgKind, OutputSpec, UGenSpec};

/// Largest output count a channel-count argument may ask for.
pub const MAX_CHANNELS: usize = 65_535;

/// An operator invocation: a spec, a rate and one element per argument.
///
/// Construction checks the rate against the operator spec, fills omitted trailing
/// arguments with their defaults and requires constants for fixed and
/// channel-count arguments.
#[derive(Clone, Debug)]
pub struct UGenSource {
    spec: Arc<UGenSpec>,
    rate: Option<Rate>,
    args: Vec<GE>,
}

impl UGenSource {
    /// Creates an invocation of `spec`.
    pub fn new(spec: Arc<UGenSpec>, rate: Option<Rate>, mut args: Vec<GE>) -> Result<Self, GraphError> {
        let rate = spec.resolve_rate(rate)?;
        let declared = spec.args();
        if args.len() > declared.len() {
            return Err(GraphError::ArgumentCount {
                ugen: spec.name().to_owned(),
                expected: declared.len(),
                actual: args.len(),
            });
        }
        for arg in &declared[args.len()..] {
            let default = arg.default.ok_or_else(|| GraphError::MissingArgument {
                ugen: spec.name().to_owned(),
                arg: arg.name.clone(),
            })?;
            args.push(GE::from(default));
        }
        for (arg, value) in declared.iter().zip(&args) {
            if matches!(arg.kind, ArgKind::Fixed | ArgKind::Channels) && value.as_constant().is_none() {
                return Err(GraphError::NonConstantArgument {
                    ugen: spec.name().to_owned(),
                    arg: arg.name.clone(),
                });
            }
            if arg.kind == ArgKind::Channels
                && let Some(c) = value.as_constant()
                && !valid_channel_count(c.value())
            {
                return Err(GraphError::InvalidChannelCount {
                    ugen: spec.name().to_owned(),
                    arg: arg.name.clone(),
                    value: c.value(),
                });
            }
        }
        Ok(Self { spec, rate, args })
    }

    /// Creates the invocation and wraps it into a graph element.
    pub fn make(spec: Arc<UGenSpec>, rate: Option<Rate>, args: Vec<GE>) -> Result<GE, GraphError> {
        Self::new(spec, rate, args).map(GE::elem)
    }

    /// The operator spec.
    pub fn spec(&self) -> &UGenSpec {
        &self.spec
    }

    /// Arguments, defaults included.
    pub fn args(&self) -> &[GE] {
        &self.args
    }

    /// Builds the codec reader for instances of `spec`.
    pub fn reader(spec: Arc<UGenSpec>) -> ProductReader {
        Arc::new(move |input: &mut RefMapIn<'_>, arity: usize| -> Result<GE, SerialError> {
            let with_rate = usize::from(spec.has_rate_choice());
            RefMapIn::check_arity(spec.name(), with_rate + spec.args().len(), arity)?;
            let rate = if with_rate == 1 {
                Some(input.read_rate()?)
            } else {
                None
            };
            let args = (0..spec.args().len())
                .map(|_| input.read_ge())
                .collect::<Result<Vec<_>, _>>()?;
            UGenSource::make(Arc::clone(&spec), rate, args)
                .map_err(|e| SerialError::invalid_product(spec.name(), e))
        })
    }

    fn num_outputs(&self) -> usize {
        match self.spec.output_spec() {
            OutputSpec::Fixed(n) => n,
            OutputSpec::Channels => self
                .spec
                .args()
                .iter()
                .zip(&self.args)
                .find(|(arg, _)| arg.kind == ArgKind::Channels)
                .and_then(|(_, value)| value.as_constant())
                .map_or(1, |c| c.value() as usize),
        }
    }
}

fn valid_channel_count(value: f32) -> bool {
    value.fract() == 0.0 && (0.0..=MAX_CHANNELS as f32).contains(&value)
}

impl GraphElem for UGenSource {
    fn product_key(&self) -> &str {
        self.spec.name()
    }

    fn fields(&self) -> Vec<Elem> {
        let mut fields = Vec::with_capacity(self.args.len() + 1);
        if self.spec.has_rate_choice() {
            if let Some(rate) = self.rate {
                fields.push(Elem::Rate(rate));
            }
        }
        fields.extend(self.args.iter().cloned().map(Elem::Ge));
        fields
    }

    fn rate(&self) -> Option<Rate> {
        self.rate
            .or_else(|| self.args.iter().filter_map(GE::rate).max())
    }

    fn expand_into(&self, builder: &mut UGenGraphBuilder) -> Result<UGenInLike, GraphError> {
        let mut slots = Vec::with_capacity(self.args.len());
        let mut slot_args = Vec::with_capacity(self.args.len());
        for (arg, value) in self.spec.args().iter().zip(&self.args) {
            let slot = match arg.kind {
                ArgKind::Channels => continue,
                ArgKind::Expand => Slot::expand(value.expand(builder)?),
                ArgKind::Fixed => match value.as_constant() {
                    Some(c) => Slot::Fixed(c.into()),
                    None => {
                        return Err(GraphError::NonConstantArgument {
                            ugen: self.spec.name().to_owned(),
                            arg: arg.name.clone(),
                        });
                    }
                },
                ArgKind::Multi => Slot::Multi(value.expand(builder)?.flat_outputs()),
            };
            slots.push(slot);
            slot_args.push(arg);
        }

        let num_outputs = self.num_outputs();
        rewrap(builder, &slots, &mut |builder, tuple| {
            let mut inputs = Vec::new();
            for (values, arg) in tuple.iter().zip(&slot_args) {
                inputs.extend(values.iter().map(|&value| NodeInput {
                    value,
                    requirement: arg.rate,
                    arg: &arg.name,
                }));
            }
            let rate = self.rate.unwrap_or_else(|| {
                inputs
                    .iter()
                    .map(|i| i.value.rate())
                    .max()
                    .unwrap_or(Rate::Scalar)
            });
            builder.add_ugen(NodeRequest {
                name: self.spec.name(),
                rate,
                inputs,
                num_outputs,
                special_index: 0,
                side_effect: self.spec.has_side_effect(),
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{InputRate, SynthGraph, UGenIn};

    fn sin_osc() -> Arc<UGenSpec> {
        Arc::new(
            UGenSpec::new("SinOsc")
                .arg("freq", Some(440.0))
                .arg("phase", Some(0.0)),
        )
    }

    fn constants(ugen: &crate::graph::UGen) -> Vec<f32> {
        ugen.inputs()
            .iter()
            .filter_map(UGenIn::as_constant)
            .map(|c| c.value())
            .collect()
    }

    #[test]
    fn defaults_fill_trailing_arguments() {
        let src = UGenSource::new(sin_osc(), Some(Rate::Audio), vec![GE::from(220.0)]).unwrap();
        assert_eq!(src.args(), &[GE::from(220.0), GE::from(0.0)]);
    }

    #[test]
    fn too_many_arguments() {
        let err = UGenSource::new(sin_osc(), Some(Rate::Audio), vec![GE::from(1.0); 3]).unwrap_err();
        assert!(matches!(err, GraphError::ArgumentCount { expected: 2, actual: 3, .. }));
    }

    #[test]
    fn missing_argument_without_default() {
        let spec = Arc::new(UGenSpec::new("LPF").matched("in", None));
        let err = UGenSource::new(spec, Some(Rate::Audio), vec![]).unwrap_err();
        assert!(matches!(err, GraphError::MissingArgument { .. }));
    }

    #[test]
    fn fixed_argument_must_be_constant() {
        let osc = UGenSource::make(sin_osc(), Some(Rate::Control), vec![]).unwrap();
        let spec = Arc::new(UGenSpec::new("Line").arg("dur", Some(1.0)).fixed("doneAction", Some(0.0)));
        let err = UGenSource::new(spec, Some(Rate::Control), vec![GE::from(1.0), osc]).unwrap_err();
        assert!(matches!(err, GraphError::NonConstantArgument { .. }));
    }

    #[test]
    fn fields_carry_rate_only_for_rate_choices() {
        let src = UGenSource::new(sin_osc(), Some(Rate::Audio), vec![]).unwrap();
        assert_eq!(src.fields().len(), 3);
        assert_eq!(src.fields()[0], Elem::Rate(Rate::Audio));

        let k2a = Arc::new(UGenSpec::new("K2A").fixed_rate(Rate::Audio).arg("in", Some(0.0)));
        let src = UGenSource::new(k2a, None, vec![]).unwrap();
        assert_eq!(src.fields(), vec![Elem::Ge(GE::from(0.0))]);
    }

    #[test]
    fn expanding_argument_creates_one_node_per_channel() {
        let freqs = GE::seq([GE::from(220.0), GE::from(330.0)]);
        let osc = UGenSource::make(sin_osc(), Some(Rate::Audio), vec![freqs]).unwrap();
        let graph = SynthGraph::new(vec![osc]).expand().unwrap();
        assert_eq!(graph.len(), 2);
        assert_eq!(constants(&graph.ugens()[0]), vec![220.0, 0.0]);
        assert_eq!(constants(&graph.ugens()[1]), vec![330.0, 0.0]);
        assert_eq!(graph.roots()[0].num_channels(), 2);
    }

    #[test]
    fn fixed_mode_width_one_and_width_three() {
        let spec = Arc::new(
            UGenSpec::new("Op")
                .fixed("mode", None)
                .arg("a", None)
                .arg("b", None),
        );
        let b = GE::seq([GE::from(1.0), GE::from(2.0), GE::from(3.0)]);
        let op = UGenSource::make(spec, Some(Rate::Control), vec![GE::from(0.0), GE::from(9.0), b]).unwrap();
        let graph = SynthGraph::new(vec![op]).expand().unwrap();
        assert_eq!(graph.len(), 3);
        for (i, ugen) in graph.ugens().iter().enumerate() {
            assert_eq!(constants(ugen), vec![0.0, 9.0, i as f32 + 1.0]);
        }
    }

    #[test]
    fn multi_argument_is_appended_to_every_instance() {
        let out = Arc::new(
            UGenSpec::new("Out")
                .rates([Rate::Audio])
                .arg("bus", Some(0.0))
                .multi("channelsArray", InputRate::Any)
                .outputs(0)
                .side_effect(),
        );
        let chans = GE::seq([GE::from(0.1), GE::from(0.2)]);
        let ge = UGenSource::make(out, Some(Rate::Audio), vec![GE::from(0.0), chans]).unwrap();
        let graph = SynthGraph::new(vec![ge]).expand().unwrap();
        assert_eq!(graph.len(), 1);
        assert_eq!(constants(&graph.ugens()[0]), vec![0.0, 0.1, 0.2]);
        assert!(graph.ugens()[0].has_side_effect());
        assert_eq!(graph.ugens()[0].num_outputs(), 0);
    }

    #[test]
    fn channels_argument_sets_output_count() {
        let spec = Arc::new(
            UGenSpec::new("In")
                .arg("bus", Some(0.0))
                .channels("numChannels", Some(1.0)),
        );
        let ge = UGenSource::make(spec, Some(Rate::Audio), vec![GE::from(4.0), GE::from(2.0)]).unwrap();
        let graph = SynthGraph::new(vec![ge]).expand().unwrap();
        assert_eq!(graph.ugens()[0].num_outputs(), 2);
        assert_eq!(graph.ugens()[0].inputs().len(), 1);
    }

    #[test]
    fn channel_count_must_be_a_small_whole_number() {
        let spec = Arc::new(
            UGenSpec::new("In")
                .arg("bus", Some(0.0))
                .channels("numChannels", Some(1.0)),
        );
        for bad in [f32::INFINITY, f32::NAN, -1.0, 2.5, 1.0e12] {
            let err = UGenSource::new(Arc::clone(&spec), Some(Rate::Audio), vec![GE::from(0.0), GE::from(bad)])
                .unwrap_err();
            assert!(
                matches!(err, GraphError::InvalidChannelCount { ref arg, .. } if arg == "numChannels"),
                "{bad}: {err}"
            );
        }
        let ge = UGenSource::make(spec, Some(Rate::Audio), vec![GE::from(0.0), GE::from(0.0)]).unwrap();
        let graph = SynthGraph::new(vec![ge]).expand().unwrap();
        assert_eq!(graph.ugens()[0].num_outputs(), 0);
    }

    #[test]
    fn derived_rate_follows_inputs() {
        let spec = Arc::new(UGenSpec::new("Select").rate_from_inputs().arg("which", None));
        let osc = UGenSource::make(sin_osc(), Some(Rate::Control), vec![]).unwrap();
        let ge = UGenSource::make(spec, None, vec![osc]).unwrap();
        assert_eq!(ge.rate(), Some(Rate::Control));
        let graph = SynthGraph::new(vec![ge]).expand().unwrap();
        assert_eq!(graph.ugens()[1].rate(), Rate::Control);
    }
}
