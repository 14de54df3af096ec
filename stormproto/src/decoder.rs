//! Type-directed decoders over the replay type-information tables.

mod bitpacked;
mod versioned;

pub use bitpacked::BitPackedDecoder;
pub use versioned::VersionedDecoder;

use std::convert::TryFrom;

use crate::error::{Error, Result};
use crate::types::{struct_put, Value};

/// Struct field tag marking a parent field, whose decoded value is spliced
/// into the enclosing struct.
pub(crate) const PARENT_TAG: i32 = -1;

/// The operations the event-stream framer needs from either decoder
/// variant.
pub trait Decoder {
    /// Decode one value according to the descriptor at `typeid`.
    fn instance(&mut self, typeid: usize) -> Result<Value>;

    /// True iff the underlying buffer is fully consumed.
    fn done(&self) -> bool;

    /// Total bits consumed from the underlying buffer so far.
    fn used_bits(&self) -> u64;

    /// Discard the rest of the current partial byte.
    fn byte_align(&mut self);
}

/// Convert a decoded count or length to a usable size, rejecting negatives.
pub(crate) fn checked_len(value: i64) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::corrupted(format!("negative length {}", value)))
}

/// Splice a parent field's decoded value into a struct under construction.
///
/// Struct parents merge key-by-key, with later fields winning collisions. A
/// non-struct parent of a single-field schema replaces the whole result
/// (returned as `Some`); otherwise it binds under the field's own name.
pub(crate) fn splice_parent(
    result: &mut Vec<(&'static str, Value)>,
    single_field: bool,
    name: &'static str,
    parent: Value,
) -> Option<Value> {
    match parent {
        Value::Struct(fields) => {
            for (field, value) in fields {
                struct_put(result, field, value);
            }
            None
        }
        other if single_field => Some(other),
        other => {
            struct_put(result, name, other);
            None
        }
    }
}
