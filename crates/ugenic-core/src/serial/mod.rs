//! Binary codec for graph elements with structural sharing.
//!
//! Every shared element ("product") is written as its type key, its arity and
//! its fields. A product met a second time is written as a back-reference to
//! the index it received the first time, so decoding rebuilds one shared
//! instance rather than two copies.
//!
//! # Stream layout
//!
//! | Tag   | Payload                                   |
//! |-------|-------------------------------------------|
//! | `P`   | key (u16 length + UTF-8), arity (u16), fields |
//! | `<`   | product index (u32)                       |
//! | `C`   | constant (f32)                            |
//! | `X`   | element count (u32), elements             |
//! | `I`   | i32                                       |
//! | `F`   | f32                                       |
//! | `S`   | u16 length + UTF-8                        |
//! | `B`   | u8 (0 or 1)                               |
//! | `R`   | rate id (u8)                              |
//!
//! All integers are big-endian. Product indices count products in the order
//! their encoding completes: a product is numbered after its own fields.
//! Constants and sequences are always inline.
//!
//! A [`SynthGraph`] is one `X` sequence of its sources.
//!
//! Decoding refuses streams whose `X` and `P` values nest deeper than
//! [`MAX_DEPTH`].

mod read;
mod write;

pub use read::{ProductReader, ProductResolver, RefMapIn};
pub use write::RefMapOut;

use crate::error::SerialError;
use crate::ge::GE;
use crate::graph::SynthGraph;
use crate::rate::Rate;

/// Deepest nesting of sequences and products a decoder accepts.
pub const MAX_DEPTH: usize = 256;

/// Tag bytes of the stream.
pub mod tag {
    /// Product: key, arity, fields.
    pub const PRODUCT: u8 = b'P';
    /// Back-reference to an earlier product.
    pub const BACK_REF: u8 = b'<';
    /// Constant graph element.
    pub const CONSTANT: u8 = b'C';
    /// Sequence.
    pub const SEQ: u8 = b'X';
    /// 32-bit signed integer.
    pub const INT: u8 = b'I';
    /// 32-bit float.
    pub const FLOAT: u8 = b'F';
    /// String.
    pub const STR: u8 = b'S';
    /// Boolean.
    pub const BOOL: u8 = b'B';
    /// Rate.
    pub const RATE: u8 = b'R';
}

/// One field of a product, as written by the codec.
#[derive(Clone, Debug, PartialEq)]
pub enum Elem {
    /// An integer (operator selectors, channel indices).
    Int(i32),
    /// A plain number that is not a graph element.
    Float(f32),
    /// A flag.
    Bool(bool),
    /// A name.
    Str(String),
    /// A rate.
    Rate(Rate),
    /// A graph element.
    Ge(GE),
    /// A sequence of fields.
    Seq(Vec<Elem>),
}

impl From<GE> for Elem {
    fn from(ge: GE) -> Self {
        Elem::Ge(ge)
    }
}

impl From<Rate> for Elem {
    fn from(rate: Rate) -> Self {
        Elem::Rate(rate)
    }
}

/// Encodes one graph element.
pub fn encode_ge(ge: &GE) -> Result<Vec<u8>, SerialError> {
    let mut out = RefMapOut::new();
    out.write_ge(ge)?;
    Ok(out.finish())
}

/// Decodes one graph element, resolving type keys through `resolver`.
pub fn decode_ge(bytes: &[u8], resolver: &dyn ProductResolver) -> Result<GE, SerialError> {
    let mut input = RefMapIn::new(bytes, resolver);
    let ge = input.read_ge()?;
    input.finish()?;
    Ok(ge)
}

/// Encodes a synth graph as the sequence of its sources.
pub fn encode_graph(graph: &SynthGraph) -> Result<Vec<u8>, SerialError> {
    let mut out = RefMapOut::new();
    out.write_seq_len(graph.sources().len())?;
    for source in graph.sources() {
        out.write_ge(source)?;
    }
    #[cfg(feature = "tracing")]
    tracing::debug!(
        "graph_encode: {} sources, {} products, {} bytes",
        graph.sources().len(),
        out.products(),
        out.len()
    );
    Ok(out.finish())
}

/// Decodes a synth graph written by [`encode_graph`].
pub fn decode_graph(bytes: &[u8], resolver: &dyn ProductResolver) -> Result<SynthGraph, SerialError> {
    let mut input = RefMapIn::new(bytes, resolver);
    let sources = input.read_seq(RefMapIn::read_ge)?;
    input.finish()?;
    Ok(SynthGraph::new(sources))
}
