//! ugenic Core - unit-generator graph construction and serialization
//!
//! This crate turns declarative, possibly multichannel synth descriptions into
//! flat graphs of single-rate unit-generator nodes, and serializes the
//! descriptions to a compact byte stream that preserves shared structure.
//!
//! # Core Abstractions
//!
//! ## Graph Elements
//!
//! - [`GE`] - A declarative value: constant, shared element or channel sequence
//! - [`GraphElem`] - Object-safe trait implemented by every element kind
//! - [`UGenInLike`] - Result of expanding a [`GE`]: one output or a group
//!
//! ## Operators
//!
//! - [`UGenSpec`] - Data description of an operator (rates, arguments, outputs)
//! - [`UGenSource`] - Generic element invoking a [`UGenSpec`]
//! - [`BinaryOpUGen`], [`UnaryOpUGen`] - Math operators, also via `+ - * /` on [`GE`]
//! - [`Mix`], [`ChannelProxy`], [`Flatten`] - Channel structure
//! - [`ControlProxy`] - Named synth parameters
//!
//! ## Expansion
//!
//! - [`SynthGraph`] - The unexpanded description (list of sources)
//! - [`UGenGraph`] - The expanded, validated node graph
//! - [`UGenGraphBuilder`] - Append-only node list with rate adapters
//! - [`rewrap`] - Multichannel expansion over argument slots
//!
//! ## Codec
//!
//! - [`encode_graph`] / [`decode_graph`] - Whole graphs
//! - [`RefMapOut`] / [`RefMapIn`] - Reference-tracking encoder and typed decoder cursor
//! - [`ProductResolver`] - Type key to reader lookup, implemented by the registry
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ugenic_core::{GE, Rate, SynthGraph, UGenSource, UGenSpec};
//!
//! let sin_osc = Arc::new(UGenSpec::new("SinOsc").arg("freq", Some(440.0)).arg("phase", Some(0.0)));
//! let freqs = GE::seq([GE::from(220.0), GE::from(330.0)]);
//! let osc = UGenSource::make(sin_osc, Some(Rate::Audio), vec![freqs]).unwrap();
//!
//! let graph = SynthGraph::new(vec![osc * GE::from(0.1)]).expand().unwrap();
//! assert_eq!(graph.len(), 4);
//! ```
//!
//! # Features
//!
//! - `tracing` - debug events for node creation, adapter insertion and encoding
//! - `serde` - `Serialize`/`Deserialize` for [`Rate`]

pub mod constant;
pub mod control;
pub mod error;
pub mod expand;
pub mod ge;
pub mod graph;
pub mod ops;
pub mod rate;
pub mod serial;
pub mod source;
pub mod spec;

pub use constant::Constant;
pub use control::ControlProxy;
pub use error::{GraphError, SerialError};
pub use expand::{Slot, expansion_width, rewrap};
pub use ge::{GE, GraphElem, UGenInLike};
pub use graph::{
    Coercion, ControlParam, InputRate, NodeInput, NodeRequest, SynthGraph, UGen, UGenGraph,
    UGenGraphBuilder, UGenId, UGenIn, UPSAMPLE_ADAPTER, coerce_input,
};
pub use ops::{
    BINARY_OP_UGEN, BinaryOp, BinaryOpUGen, ChannelProxy, Flatten, Mix, UNARY_OP_UGEN, UnaryOp,
    UnaryOpUGen,
};
pub use rate::Rate;
pub use serial::{
    Elem, MAX_DEPTH, ProductReader, ProductResolver, RefMapIn, RefMapOut, decode_ge, decode_graph,
    encode_ge, encode_graph,
};
pub use source::{MAX_CHANNELS, UGenSource};
pub use spec::{ArgKind, ArgSpec, OutputSpec, RateSpec, UGenSpec};
