//! Named catalogues of element kinds.
//!
//! A catalogue is a named table of [`ProductEntry`] values. The [`STANDARD`]
//! catalogue holds the built-in operators and the structural elements
//! (math operators, mixing, channel selection, controls). [`PLUGINS`] holds
//! third-party operators and is merged separately.

use ugenic_core::{
    BINARY_OP_UGEN, BinaryOp, BinaryOpUGen, ChannelProxy, ControlProxy, Flatten, GE, GraphError,
    InputRate, Mix, Rate, UNARY_OP_UGEN, UGenSpec, UnaryOp, UnaryOpUGen,
};

use crate::ProductEntry;

/// A named table of entries, merged with
/// [`ProductRegistry::initialize_once`](crate::ProductRegistry::initialize_once).
#[derive(Debug, Clone, Copy)]
pub struct Catalogue {
    /// Unique catalogue id.
    pub id: &'static str,
    /// Builds the entries.
    pub build: fn() -> Vec<ProductEntry>,
}

/// Built-in operators and structural elements.
pub static STANDARD: Catalogue = Catalogue {
    id: "standard",
    build: standard_entries,
};

/// Third-party operators.
pub static PLUGINS: Catalogue = Catalogue {
    id: "plugins",
    build: plugin_entries,
};

const AR_KR: [Rate; 2] = [Rate::Audio, Rate::Control];

fn standard_entries() -> Vec<ProductEntry> {
    let mut entries: Vec<ProductEntry> = standard_specs()
        .into_iter()
        .map(ProductEntry::from_spec)
        .collect();
    entries.extend(structural_entries());
    entries
}

fn standard_specs() -> Vec<UGenSpec> {
    vec![
        // Oscillators
        UGenSpec::new("SinOsc")
            .rates(AR_KR)
            .arg("freq", Some(440.0))
            .arg("phase", Some(0.0)),
        UGenSpec::new("LFSaw")
            .rates(AR_KR)
            .arg("freq", Some(440.0))
            .arg("iphase", Some(0.0)),
        UGenSpec::new("LFPulse")
            .rates(AR_KR)
            .arg("freq", Some(440.0))
            .arg("iphase", Some(0.0))
            .arg("width", Some(0.5)),
        UGenSpec::new("Saw").rates(AR_KR).arg("freq", Some(440.0)),
        UGenSpec::new("Pulse")
            .rates(AR_KR)
            .arg("freq", Some(440.0))
            .arg("width", Some(0.5)),
        UGenSpec::new("Impulse")
            .rates(AR_KR)
            .arg("freq", Some(440.0))
            .arg("phase", Some(0.0)),
        // Noise
        UGenSpec::new("WhiteNoise").rates(AR_KR),
        UGenSpec::new("PinkNoise").rates(AR_KR),
        // Envelopes
        UGenSpec::new("Line")
            .rates([Rate::Audio, Rate::Control, Rate::Scalar])
            .arg("start", Some(0.0))
            .arg("end", Some(1.0))
            .arg("dur", Some(1.0))
            .fixed("doneAction", Some(0.0)),
        // Filters
        UGenSpec::new("LPF")
            .rates(AR_KR)
            .matched("in", None)
            .arg("freq", Some(440.0)),
        UGenSpec::new("HPF")
            .rates(AR_KR)
            .matched("in", None)
            .arg("freq", Some(440.0)),
        UGenSpec::new("BPF")
            .rates(AR_KR)
            .matched("in", None)
            .arg("freq", Some(440.0))
            .arg("rq", Some(1.0)),
        UGenSpec::new("RLPF")
            .rates(AR_KR)
            .matched("in", None)
            .arg("freq", Some(440.0))
            .arg("rq", Some(1.0)),
        // Panning
        UGenSpec::new("Pan2")
            .rates(AR_KR)
            .matched("in", None)
            .arg("pos", Some(0.0))
            .arg("level", Some(1.0))
            .outputs(2),
        UGenSpec::new("PanAz")
            .rates(AR_KR)
            .channels("numChans", None)
            .matched("in", None)
            .arg("pos", Some(0.0))
            .arg("level", Some(1.0))
            .arg("width", Some(2.0))
            .arg("orientation", Some(0.5)),
        // Buses
        UGenSpec::new("In")
            .rates(AR_KR)
            .arg("bus", Some(0.0))
            .channels("numChannels", Some(1.0)),
        UGenSpec::new("Out")
            .rates(AR_KR)
            .arg("bus", None)
            .multi("channelsArray", InputRate::MatchNode)
            .outputs(0)
            .side_effect(),
        UGenSpec::new("ReplaceOut")
            .rates(AR_KR)
            .arg("bus", None)
            .multi("channelsArray", InputRate::MatchNode)
            .outputs(0)
            .side_effect(),
        // Rate conversion
        UGenSpec::new("K2A").fixed_rate(Rate::Audio).arg("in", Some(0.0)),
        UGenSpec::new("A2K").fixed_rate(Rate::Control).arg("in", Some(0.0)),
        // Selection
        UGenSpec::new("Select")
            .rates(AR_KR)
            .arg("which", None)
            .multi("array", InputRate::Any),
        // Demand rate
        UGenSpec::new("Dseq")
            .fixed_rate(Rate::Demand)
            .arg("repeats", Some(1.0))
            .multi("list", InputRate::Any),
        UGenSpec::new("Dwhite")
            .fixed_rate(Rate::Demand)
            .arg("length", Some(f32::INFINITY))
            .arg("lo", Some(0.0))
            .arg("hi", Some(1.0)),
        UGenSpec::new("Duty")
            .rates(AR_KR)
            .arg("dur", Some(1.0))
            .arg("reset", Some(0.0))
            .fixed("doneAction", Some(0.0))
            .arg("level", Some(1.0)),
    ]
}

/// Math operators and channel-structure elements.
fn structural_entries() -> Vec<ProductEntry> {
    vec![
        ProductEntry::new(BINARY_OP_UGEN, BinaryOpUGen::reader()).with_factory(
            |_: Option<Rate>, args: Vec<GE>| {
                let [selector, a, b] = exact_args::<3>(BINARY_OP_UGEN, args)?;
                let op = BinaryOp::from_selector(selector_of(BINARY_OP_UGEN, &selector)?)?;
                Ok(BinaryOpUGen::make(op, a, b))
            },
        ),
        ProductEntry::new(UNARY_OP_UGEN, UnaryOpUGen::reader()).with_factory(
            |_: Option<Rate>, args: Vec<GE>| {
                let [selector, a] = exact_args::<2>(UNARY_OP_UGEN, args)?;
                let op = UnaryOp::from_selector(selector_of(UNARY_OP_UGEN, &selector)?)?;
                Ok(UnaryOpUGen::make(op, a))
            },
        ),
        ProductEntry::new(Mix::KEY, Mix::reader()).with_factory(|_: Option<Rate>, args: Vec<GE>| {
            let [input] = exact_args::<1>(Mix::KEY, args)?;
            Ok(Mix::make(input))
        }),
        ProductEntry::new(Flatten::KEY, Flatten::reader()).with_factory(
            |_: Option<Rate>, args: Vec<GE>| {
                let [input] = exact_args::<1>(Flatten::KEY, args)?;
                Ok(Flatten::make(input))
            },
        ),
        ProductEntry::new(ChannelProxy::KEY, ChannelProxy::reader()).with_factory(
            |_: Option<Rate>, args: Vec<GE>| {
                let [elem, index] = exact_args::<2>(ChannelProxy::KEY, args)?;
                let index = selector_of(ChannelProxy::KEY, &index)?;
                ChannelProxy::try_make(elem, index)
            },
        ),
        ProductEntry::new(ControlProxy::KEY, ControlProxy::reader()),
    ]
}

fn plugin_entries() -> Vec<ProductEntry> {
    [
        UGenSpec::new("MoogLadder")
            .rates(AR_KR)
            .matched("in", None)
            .arg("ffreq", Some(440.0))
            .arg("res", Some(0.0)),
        UGenSpec::new("DiodeRingMod")
            .rates([Rate::Audio])
            .matched("car", None)
            .matched("mod", None),
        UGenSpec::new("Decimator")
            .rates([Rate::Audio])
            .matched("in", None)
            .arg("rate", Some(44100.0))
            .arg("bits", Some(24.0)),
    ]
    .into_iter()
    .map(ProductEntry::from_spec)
    .collect()
}

/// Splits `args` into exactly `N` arguments.
fn exact_args<const N: usize>(key: &str, args: Vec<GE>) -> Result<[GE; N], GraphError> {
    let actual = args.len();
    <[GE; N]>::try_from(args).map_err(|_| GraphError::ArgumentCount {
        ugen: key.to_owned(),
        expected: N,
        actual,
    })
}

/// Reads an integer out of a constant argument.
fn selector_of(key: &str, arg: &GE) -> Result<i32, GraphError> {
    arg.as_constant()
        .map(|c| c.value() as i32)
        .ok_or_else(|| GraphError::NonConstantArgument {
            ugen: key.to_owned(),
            arg: "selector".to_owned(),
        })
}
