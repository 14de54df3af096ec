//! Decoder for the unversioned, tag-free bit-packed encoding.
//!
//! The wire carries no type information at all: the reader must consume
//! exactly what the schema dictates, bit by bit. This is the format the game
//! writes at runtime (game events, message events, initdata).

use super::{checked_len, splice_parent, Decoder, PARENT_TAG};
use crate::buffer::{BitBuffer, Endian};
use crate::error::{Error, Result};
use crate::types::{struct_put, ChoiceCase, Field, IntBounds, TypeId, TypeInfo, Value};

/// A type-directed decoder over a bit-packed inner file.
///
/// A decoder is single-use: it drives one top-level decode over its buffer.
pub struct BitPackedDecoder<B> {
    buffer: BitBuffer<B>,
    typeinfos: &'static [TypeInfo],
}

impl<B> BitPackedDecoder<B>
where
    B: AsRef<[u8]>,
{
    /// Construct a decoder over an inner file's bytes and a type table.
    pub fn new(contents: B, typeinfos: &'static [TypeInfo]) -> Self {
        Self {
            buffer: BitBuffer::new(contents, Endian::Big),
            typeinfos,
        }
    }

    /// Decode one value according to the descriptor at `typeid`.
    pub fn instance(&mut self, typeid: TypeId) -> Result<Value> {
        let typeinfo = *self.typeinfos.get(typeid).ok_or_else(|| {
            Error::corrupted(format!(
                "typeid {} out of range at bit {}",
                typeid,
                self.buffer.used_bits()
            ))
        })?;

        match typeinfo {
            TypeInfo::Int(bounds) => self.int(bounds).map(Value::Int),
            TypeInfo::Bool => Ok(Value::Bool(self.buffer.read_bits::<u8>(1)? != 0)),
            TypeInfo::Blob(bounds) => {
                let length = checked_len(self.int(bounds)?)?;
                Ok(Value::Bytes(self.buffer.read_aligned_bytes(length)?))
            }
            TypeInfo::ChoiceString => Err(Error::corrupted(format!(
                "string descriptor in a bit-packed table at bit {}",
                self.buffer.used_bits()
            ))),
            TypeInfo::Optional(inner) => {
                if self.buffer.read_bits::<u8>(1)? != 0 {
                    self.instance(inner)
                } else {
                    Ok(Value::Null)
                }
            }
            TypeInfo::FourCC => {
                let bytes = self.buffer.read_aligned_bytes(4)?;
                Ok(Value::FourCC([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
            TypeInfo::Array(bounds, element) => {
                let length = checked_len(self.int(bounds)?)?;
                (0..length)
                    .map(|_| self.instance(element))
                    .collect::<Result<_>>()
                    .map(Value::Array)
            }
            TypeInfo::BitArray(bounds) => {
                let bits = self.int(bounds)?;
                let data = self
                    .buffer
                    .read_unaligned_bytes((checked_len(bits)? + 7) / 8)?;
                Ok(Value::BitArray { bits, data })
            }
            TypeInfo::Struct(fields) => self.structure(fields),
            TypeInfo::Choice(bounds, cases) => self.choice(bounds, cases),
            TypeInfo::Null => Ok(Value::Null),
        }
    }

    /// True iff the underlying buffer is fully consumed.
    pub fn done(&self) -> bool {
        self.buffer.done()
    }

    /// Total bits consumed so far.
    pub fn used_bits(&self) -> u64 {
        self.buffer.used_bits()
    }

    /// Discard the rest of the current partial byte.
    pub fn byte_align(&mut self) {
        self.buffer.byte_align()
    }

    fn int(&mut self, bounds: IntBounds) -> Result<i64> {
        if bounds.bits == 0 {
            return Ok(bounds.offset);
        }
        let raw = self.buffer.read_bits::<u64>(bounds.bits as u32)?;
        Ok(bounds.offset.wrapping_add(raw as i64))
    }

    fn structure(&mut self, fields: &'static [Field]) -> Result<Value> {
        let mut result = Vec::with_capacity(fields.len());
        let mut replaced = None;
        for field in fields {
            let value = self.instance(field.typeid)?;
            if field.tag == PARENT_TAG {
                if let Some(whole) = splice_parent(&mut result, fields.len() == 1, field.name, value)
                {
                    replaced = Some(whole);
                }
            } else {
                struct_put(&mut result, field.name, value);
            }
        }
        Ok(replaced.unwrap_or(Value::Struct(result)))
    }

    fn choice(&mut self, bounds: IntBounds, cases: &'static [ChoiceCase]) -> Result<Value> {
        let tag = self.int(bounds)?;
        let case = cases.iter().find(|case| case.tag == tag).ok_or_else(|| {
            Error::corrupted(format!(
                "unknown choice tag {} at bit {}",
                tag,
                self.buffer.used_bits()
            ))
        })?;
        Ok(Value::Choice(case.name, Box::new(self.instance(case.typeid)?)))
    }
}

impl<B> Decoder for BitPackedDecoder<B>
where
    B: AsRef<[u8]>,
{
    fn instance(&mut self, typeid: TypeId) -> Result<Value> {
        BitPackedDecoder::instance(self, typeid)
    }

    fn done(&self) -> bool {
        BitPackedDecoder::done(self)
    }

    fn used_bits(&self) -> u64 {
        BitPackedDecoder::used_bits(self)
    }

    fn byte_align(&mut self) {
        BitPackedDecoder::byte_align(self)
    }
}
