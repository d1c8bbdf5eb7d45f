//! Encoder side of the codec.

use std::collections::HashMap;
use std::sync::Arc;

use byteorder::{BigEndian, WriteBytesExt};

use super::{Elem, tag};
use crate::error::SerialError;
use crate::ge::{GE, GraphElem, identity};
use crate::rate::Rate;

/// Write-side reference map: assigns product indices and emits back-references.
///
/// Lives for one encode call.
#[derive(Default)]
pub struct RefMapOut {
    buf: Vec<u8>,
    indices: HashMap<usize, u32>,
    /// Keeps every indexed product alive so identity keys stay unique.
    retained: Vec<Arc<dyn GraphElem>>,
}

impl RefMapOut {
    /// Creates an empty encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// True when nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Number of products indexed so far.
    pub fn products(&self) -> usize {
        self.retained.len()
    }

    /// Returns the encoded bytes.
    pub fn finish(self) -> Vec<u8> {
        self.buf
    }

    /// Writes a graph element.
    pub fn write_ge(&mut self, ge: &GE) -> Result<(), SerialError> {
        match ge {
            GE::Constant(c) => {
                self.buf.write_u8(tag::CONSTANT)?;
                self.buf.write_f32::<BigEndian>(c.value())?;
            }
            GE::Seq(channels) => {
                self.write_seq_len(channels.len())?;
                for channel in channels {
                    self.write_ge(channel)?;
                }
            }
            GE::Elem(elem) => self.write_product(elem)?,
        }
        Ok(())
    }

    /// Writes one product field.
    pub fn write_elem(&mut self, elem: &Elem) -> Result<(), SerialError> {
        match elem {
            Elem::Int(v) => {
                self.buf.write_u8(tag::INT)?;
                self.buf.write_i32::<BigEndian>(*v)?;
            }
            Elem::Float(v) => {
                self.buf.write_u8(tag::FLOAT)?;
                self.buf.write_f32::<BigEndian>(*v)?;
            }
            Elem::Bool(v) => {
                self.buf.write_u8(tag::BOOL)?;
                self.buf.write_u8(u8::from(*v))?;
            }
            Elem::Str(s) => {
                self.buf.write_u8(tag::STR)?;
                self.write_str(s)?;
            }
            Elem::Rate(rate) => self.write_rate(*rate)?,
            Elem::Ge(ge) => self.write_ge(ge)?,
            Elem::Seq(items) => {
                self.write_seq_len(items.len())?;
                for item in items {
                    self.write_elem(item)?;
                }
            }
        }
        Ok(())
    }

    /// Writes a sequence header; the caller writes the elements.
    pub fn write_seq_len(&mut self, len: usize) -> Result<(), SerialError> {
        self.buf.write_u8(tag::SEQ)?;
        self.buf.write_u32::<BigEndian>(len as u32)?;
        Ok(())
    }

    fn write_rate(&mut self, rate: Rate) -> Result<(), SerialError> {
        self.buf.write_u8(tag::RATE)?;
        self.buf.write_u8(rate.id())?;
        Ok(())
    }

    fn write_product(&mut self, elem: &Arc<dyn GraphElem>) -> Result<(), SerialError> {
        if let Some(&index) = self.indices.get(&identity(elem)) {
            self.buf.write_u8(tag::BACK_REF)?;
            self.buf.write_u32::<BigEndian>(index)?;
            return Ok(());
        }

        let key = elem.product_key();
        let fields = elem.fields();
        let arity = u16::try_from(fields.len()).map_err(|_| SerialError::ArityOverflow {
            key: key.to_owned(),
            arity: fields.len(),
        })?;
        self.buf.write_u8(tag::PRODUCT)?;
        self.write_str(key)?;
        self.buf.write_u16::<BigEndian>(arity)?;
        for field in &fields {
            self.write_elem(field)?;
        }

        let index = self.retained.len() as u32;
        self.indices.insert(identity(elem), index);
        self.retained.push(Arc::clone(elem));
        Ok(())
    }

    fn write_str(&mut self, s: &str) -> Result<(), SerialError> {
        let len = u16::try_from(s.len()).map_err(|_| SerialError::StringTooLong(s.len()))?;
        self.buf.write_u16::<BigEndian>(len)?;
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }
}
