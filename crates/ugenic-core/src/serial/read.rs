//! Decoder side of the codec.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};

use super::{MAX_DEPTH, tag};
use crate::constant::Constant;
use crate::error::SerialError;
use crate::ge::GE;
use crate::rate::Rate;

/// Rebuilds one product from its fields.
///
/// Called with the cursor positioned on the first field and the arity
/// declared in the stream. The reader must consume exactly `arity` fields.
pub type ProductReader =
    Arc<dyn Fn(&mut RefMapIn<'_>, usize) -> Result<GE, SerialError> + Send + Sync>;

/// Maps type keys to product readers during decoding.
pub trait ProductResolver {
    /// Returns the reader for `key`, or [`SerialError::UnknownType`].
    fn resolve_reader(&self, key: &str) -> Result<ProductReader, SerialError>;
}

impl ProductResolver for HashMap<String, ProductReader> {
    fn resolve_reader(&self, key: &str) -> Result<ProductReader, SerialError> {
        self.get(key)
            .cloned()
            .ok_or_else(|| SerialError::UnknownType(key.to_owned()))
    }
}

/// Read-side reference map and typed field cursor.
///
/// Lives for one decode call. Every `read_*` call consumes one field of the
/// product being read; fields inside a sequence are counted separately.
pub struct RefMapIn<'a> {
    cursor: Cursor<&'a [u8]>,
    resolver: &'a dyn ProductResolver,
    refs: Vec<GE>,
    /// Fields consumed per open product or sequence, innermost last.
    frames: Vec<usize>,
    /// Open sequences and products.
    depth: usize,
}

impl<'a> RefMapIn<'a> {
    /// Creates a cursor over `bytes`.
    pub fn new(bytes: &'a [u8], resolver: &'a dyn ProductResolver) -> Self {
        Self {
            cursor: Cursor::new(bytes),
            resolver,
            refs: Vec::new(),
            frames: vec![0],
            depth: 0,
        }
    }

    /// Fails unless the declared arity equals the arity of the type.
    pub fn check_arity(key: &str, expected: usize, arity: usize) -> Result<(), SerialError> {
        if expected == arity {
            Ok(())
        } else {
            Err(SerialError::arity_mismatch(key, expected, arity))
        }
    }

    /// Number of products decoded so far.
    pub fn products(&self) -> usize {
        self.refs.len()
    }

    /// Fails if unread bytes remain.
    pub fn finish(self) -> Result<(), SerialError> {
        let total = self.cursor.get_ref().len() as u64;
        let remaining = total.saturating_sub(self.cursor.position());
        if remaining == 0 {
            Ok(())
        } else {
            Err(SerialError::TrailingBytes(remaining as usize))
        }
    }

    // --- typed fields ---

    /// Reads an integer field.
    pub fn read_int(&mut self) -> Result<i32, SerialError> {
        self.field(tag::INT, "int")?;
        Ok(self.cursor.read_i32::<BigEndian>()?)
    }

    /// Reads a float field.
    pub fn read_float(&mut self) -> Result<f32, SerialError> {
        self.field(tag::FLOAT, "float")?;
        Ok(self.cursor.read_f32::<BigEndian>()?)
    }

    /// Reads a boolean field.
    pub fn read_bool(&mut self) -> Result<bool, SerialError> {
        self.field(tag::BOOL, "bool")?;
        Ok(self.cursor.read_u8()? != 0)
    }

    /// Reads a string field.
    pub fn read_str(&mut self) -> Result<String, SerialError> {
        self.field(tag::STR, "string")?;
        self.read_raw_str()
    }

    /// Reads a rate field.
    pub fn read_rate(&mut self) -> Result<Rate, SerialError> {
        self.field(tag::RATE, "rate")?;
        let id = self.cursor.read_u8()?;
        Rate::from_id(id).ok_or(SerialError::InvalidRate(id))
    }

    /// Reads a graph element field.
    pub fn read_ge(&mut self) -> Result<GE, SerialError> {
        self.count();
        self.read_ge_value()
    }

    /// Reads a sequence field, calling `item` once per element.
    pub fn read_seq<T, F>(&mut self, mut item: F) -> Result<Vec<T>, SerialError>
    where
        F: FnMut(&mut Self) -> Result<T, SerialError>,
    {
        self.field(tag::SEQ, "sequence")?;
        let len = self.cursor.read_u32::<BigEndian>()? as usize;
        self.frames.push(0);
        let mut items = Vec::with_capacity(len.min(1024));
        for _ in 0..len {
            items.push(item(self)?);
        }
        self.frames.pop();
        Ok(items)
    }

    // --- internals ---

    fn count(&mut self) {
        if let Some(consumed) = self.frames.last_mut() {
            *consumed += 1;
        }
    }

    /// Counts one field and checks its tag.
    fn field(&mut self, expected_tag: u8, expected: &'static str) -> Result<(), SerialError> {
        self.count();
        let offset = self.cursor.position();
        let found = self.cursor.read_u8()?;
        if found == expected_tag {
            Ok(())
        } else {
            Err(SerialError::UnexpectedTag {
                found,
                offset,
                expected,
            })
        }
    }

    fn descend(&mut self, offset: u64) -> Result<(), SerialError> {
        if self.depth >= MAX_DEPTH {
            return Err(SerialError::TooDeep {
                limit: MAX_DEPTH,
                offset,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn read_ge_value(&mut self) -> Result<GE, SerialError> {
        let offset = self.cursor.position();
        match self.cursor.read_u8()? {
            tag::CONSTANT => Ok(GE::Constant(Constant::new(
                self.cursor.read_f32::<BigEndian>()?,
            ))),
            tag::SEQ => {
                self.descend(offset)?;
                let len = self.cursor.read_u32::<BigEndian>()? as usize;
                let mut channels = Vec::with_capacity(len.min(1024));
                for _ in 0..len {
                    channels.push(self.read_ge_value()?);
                }
                self.depth -= 1;
                Ok(GE::Seq(channels))
            }
            tag::BACK_REF => {
                let index = self.cursor.read_u32::<BigEndian>()?;
                self.refs
                    .get(index as usize)
                    .cloned()
                    .ok_or(SerialError::InvalidBackReference {
                        index,
                        available: self.refs.len(),
                    })
            }
            tag::PRODUCT => {
                self.descend(offset)?;
                let ge = self.read_product()?;
                self.depth -= 1;
                Ok(ge)
            }
            found => Err(SerialError::UnexpectedTag {
                found,
                offset,
                expected: "graph element",
            }),
        }
    }

    fn read_product(&mut self) -> Result<GE, SerialError> {
        let key = self.read_raw_str()?;
        let arity = self.cursor.read_u16::<BigEndian>()? as usize;
        let reader = self.resolver.resolve_reader(&key)?;

        self.frames.push(0);
        let ge = reader(self, arity)?;
        let consumed = self.frames.pop().unwrap_or_default();
        if consumed != arity {
            return Err(SerialError::arity_mismatch(key, arity, consumed));
        }

        self.refs.push(ge.clone());
        Ok(ge)
    }

    fn read_raw_str(&mut self) -> Result<String, SerialError> {
        let len = self.cursor.read_u16::<BigEndian>()? as usize;
        let mut bytes = vec![0; len];
        self.cursor.read_exact(&mut bytes)?;
        Ok(String::from_utf8(bytes)?)
    }
}
