//! SCgf version 2 writer.
//!
//! All integers and floats are big-endian. Strings are "pstrings": one
//! length byte followed by that many bytes.

use std::collections::HashMap;
use std::io::Write;

use byteorder::{BigEndian, WriteBytesExt};
use ugenic_core::{UGen, UGenGraph, UGenIn};

use crate::error::SynthDefError;

/// File magic.
pub const MAGIC: &[u8; 4] = b"SCgf";

/// Format version written.
pub const VERSION: i32 = 2;

/// Size of the file header: magic, version and definition count.
pub const HEADER_LEN: usize = 4 + 4 + 2;

/// A lowered definition: its name and the full `SCgf` buffer holding it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SynthDef {
    name: String,
    bytes: Vec<u8>,
}

impl SynthDef {
    /// Definition name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The encoded buffer, header included.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Length of [`bytes()`](Self::bytes).
    pub fn byte_len(&self) -> usize {
        self.bytes.len()
    }

    /// Consumes the definition, returning its buffer.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Lowers `graph` into a single-definition `SCgf` buffer.
pub fn lower(name: &str, graph: &UGenGraph) -> Result<SynthDef, SynthDefError> {
    let bytes = encode_defs(&[(name, graph)])?;
    tracing::debug!(name, nodes = graph.len(), bytes = bytes.len(), "lower");
    Ok(SynthDef {
        name: name.to_owned(),
        bytes,
    })
}

/// Writes an `SCgf` stream holding every definition in `defs`.
pub fn write_defs<W: Write>(w: &mut W, defs: &[(&str, &UGenGraph)]) -> Result<(), SynthDefError> {
    w.write_all(MAGIC)?;
    w.write_i32::<BigEndian>(VERSION)?;
    w.write_i16::<BigEndian>(count_i16("definition", defs.len())?)?;
    for (name, graph) in defs {
        write_def(w, name, graph)?;
    }
    Ok(())
}

/// Writes one definition body (no file header).
pub fn write_def<W: Write>(w: &mut W, name: &str, graph: &UGenGraph) -> Result<(), SynthDefError> {
    write_pstring(w, name)?;

    let constants = ConstantTable::collect(graph);
    w.write_i32::<BigEndian>(count_i32("constant", constants.values.len())?)?;
    for &value in &constants.values {
        w.write_f32::<BigEndian>(value)?;
    }

    let values = graph.param_values();
    w.write_i32::<BigEndian>(count_i32("parameter", values.len())?)?;
    for value in values {
        w.write_f32::<BigEndian>(value)?;
    }

    let params = graph.params();
    w.write_i32::<BigEndian>(count_i32("parameter name", params.len())?)?;
    for param in params {
        write_pstring(w, &param.name)?;
        w.write_i32::<BigEndian>(count_i32("parameter index", param.index)?)?;
    }

    w.write_i32::<BigEndian>(count_i32("node", graph.len())?)?;
    for ugen in graph.ugens() {
        write_ugen(w, ugen, &constants)?;
    }

    // no variants
    w.write_i16::<BigEndian>(0)?;
    Ok(())
}

fn write_ugen<W: Write>(w: &mut W, ugen: &UGen, constants: &ConstantTable) -> Result<(), SynthDefError> {
    write_pstring(w, ugen.name())?;
    w.write_i8(ugen.rate().id() as i8)?;
    w.write_i32::<BigEndian>(count_i32("input", ugen.inputs().len())?)?;
    w.write_i32::<BigEndian>(count_i32("output", ugen.num_outputs())?)?;
    w.write_i16::<BigEndian>(ugen.special_index())?;
    for input in ugen.inputs() {
        match input {
            UGenIn::Constant(c) => {
                w.write_i32::<BigEndian>(-1)?;
                w.write_i32::<BigEndian>(constants.index_of(c.value()))?;
            }
            UGenIn::Output { ugen, output, .. } => {
                w.write_i32::<BigEndian>(ugen.index() as i32)?;
                w.write_i32::<BigEndian>(*output as i32)?;
            }
        }
    }
    for rate in ugen.output_rates() {
        w.write_i8(rate.id() as i8)?;
    }
    Ok(())
}

fn write_pstring<W: Write>(w: &mut W, s: &str) -> Result<(), SynthDefError> {
    let len = u8::try_from(s.len()).map_err(|_| SynthDefError::NameTooLong(s.to_owned()))?;
    w.write_u8(len)?;
    w.write_all(s.as_bytes())?;
    Ok(())
}

fn count_i32(what: &'static str, count: usize) -> Result<i32, SynthDefError> {
    i32::try_from(count).map_err(|_| SynthDefError::TooMany { what, count })
}

fn count_i16(what: &'static str, count: usize) -> Result<i16, SynthDefError> {
    i16::try_from(count).map_err(|_| SynthDefError::TooMany { what, count })
}

/// Constant inputs in order of first appearance, keyed by bit pattern.
struct ConstantTable {
    values: Vec<f32>,
    indices: HashMap<u32, i32>,
}

impl ConstantTable {
    fn collect(graph: &UGenGraph) -> Self {
        let mut table = Self {
            values: Vec::new(),
            indices: HashMap::new(),
        };
        for input in graph.ugens().iter().flat_map(UGen::inputs) {
            if let Some(c) = input.as_constant() {
                let next = table.values.len() as i32;
                table.indices.entry(c.value().to_bits()).or_insert_with(|| {
                    table.values.push(c.value());
                    next
                });
            }
        }
        table
    }

    fn index_of(&self, value: f32) -> i32 {
        // collect() saw every constant input of the graph
        self.indices.get(&value.to_bits()).copied().unwrap_or(-1)
    }
}

/// Writes `defs` into an in-memory buffer.
pub fn encode_defs(defs: &[(&str, &UGenGraph)]) -> Result<Vec<u8>, SynthDefError> {
    let mut bytes = Vec::new();
    write_defs(&mut bytes, defs)?;
    Ok(bytes)
}
