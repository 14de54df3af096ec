//! Type-information schema and decoded value trees.

use serde::ser::{Serialize, SerializeMap, SerializeSeq, SerializeTuple, Serializer};
use std::fmt;

/// Index of a type descriptor within a [`TypeInfo`] table.
pub type TypeId = usize;

/// Bounds used to read a count or discriminant field: the decoded value is
/// `offset + raw`, where `raw` is `bits` wide.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IntBounds {
    pub offset: i64,
    pub bits: u8,
}

impl IntBounds {
    pub const fn new(offset: i64, bits: u8) -> Self {
        Self { offset, bits }
    }
}

/// One named, tagged field of a struct descriptor.
///
/// A tag of `-1` marks a parent field: its decoded value is spliced into the
/// enclosing struct rather than bound under its own name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    pub typeid: TypeId,
    pub tag: i32,
}

impl Field {
    pub const fn new(name: &'static str, typeid: TypeId, tag: i32) -> Self {
        Self { name, typeid, tag }
    }
}

/// One case of a choice descriptor, keyed by its wire tag.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ChoiceCase {
    pub tag: i64,
    pub name: &'static str,
    pub typeid: TypeId,
}

impl ChoiceCase {
    pub const fn new(tag: i64, name: &'static str, typeid: TypeId) -> Self {
        Self { tag, name, typeid }
    }
}

/// A single type descriptor out of a per-build type-information table.
///
/// The semantics are shared by both decoder variants; only the wire encoding
/// differs. Every referenced [`TypeId`] must stay within the owning table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TypeInfo {
    /// Integer; decoded value is `offset + raw` interpreted as signed 64-bit.
    Int(IntBounds),

    /// Single-bit boolean, equivalent to `Int(0, 1)`.
    Bool,

    /// Length-prefixed opaque byte run, byte-aligned.
    Blob(IntBounds),

    /// Versioned-wire-only blob that decodes to a string.
    ChoiceString,

    /// Either absent or a value of the inner type.
    Optional(TypeId),

    /// Four raw tag bytes, byte-aligned.
    FourCC,

    /// Length-prefixed homogeneous sequence of the element type.
    Array(IntBounds, TypeId),

    /// Length-prefixed raw bit vector.
    BitArray(IntBounds),

    /// Ordered record of tagged fields.
    Struct(&'static [Field]),

    /// Tagged union; the discriminant is read with the given bounds.
    Choice(IntBounds, &'static [ChoiceCase]),

    /// Always decodes to null.
    Null,
}

/// One entry of an event-type table, mapping a wire event id to the type id
/// of the event body and the event's name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EventType {
    pub id: i64,
    pub typeid: TypeId,
    pub name: &'static str,
}

impl EventType {
    pub const fn new(id: i64, typeid: TypeId, name: &'static str) -> Self {
        Self { id, typeid, name }
    }
}

/// A decoded value tree.
///
/// Struct fields keep their insertion order; replacing an existing field
/// keeps its original slot. Absent optionals decode to `Null` and present
/// optionals decode to the inner value directly.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    Bytes(Vec<u8>),
    FourCC([u8; 4]),
    /// A bit vector: the exact bit length plus the packed bit data.
    BitArray { bits: i64, data: Vec<u8> },
    Array(Vec<Value>),
    Struct(Vec<(&'static str, Value)>),
    Choice(&'static str, Box<Value>),
}

impl Value {
    /// The numeric payload of an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// The byte payload of a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Look up a struct field by name.
    pub fn field(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Struct(fields) => fields
                .iter()
                .find(|(field, _)| *field == name)
                .map(|(_, value)| value),
            _ => None,
        }
    }

    /// Walk a path of struct field names from this value.
    pub fn at_path(&self, path: &[&str]) -> Option<&Value> {
        path.iter().try_fold(self, |value, name| value.field(name))
    }
}

/// Bind `value` under `name`, replacing any existing binding in place so the
/// original field order is preserved.
pub(crate) fn struct_put(fields: &mut Vec<(&'static str, Value)>, name: &'static str, value: Value) {
    match fields.iter_mut().find(|(field, _)| *field == name) {
        Some(slot) => slot.1 = value,
        None => fields.push((name, value)),
    }
}

/// Render bytes the way the original tool did: one character per byte,
/// ISO-8859-1 style.
pub(crate) fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&byte| char::from(byte)).collect()
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Str(value) => serializer.serialize_str(value),
            Value::Bytes(bytes) => serializer.serialize_str(&latin1(bytes)),
            Value::FourCC(bytes) => serializer.serialize_str(&latin1(bytes)),
            Value::BitArray { bits, data } => {
                let mut tuple = serializer.serialize_tuple(2)?;
                tuple.serialize_element(bits)?;
                tuple.serialize_element(&latin1(data))?;
                tuple.end()
            }
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Struct(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, value) in fields {
                    map.serialize_entry(name, value)?;
                }
                map.end()
            }
            Value::Choice(name, value) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry(name, value.as_ref())?;
                map.end()
            }
        }
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    write!(f, "'")?;
    for &byte in bytes {
        match byte {
            b'\'' | b'\\' => write!(f, "\\{}", char::from(byte))?,
            0x20..=0x7e => write!(f, "{}", char::from(byte))?,
            _ => write!(f, "\\x{:02x}", byte)?,
        }
    }
    write!(f, "'")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "None"),
            Value::Bool(true) => write!(f, "True"),
            Value::Bool(false) => write!(f, "False"),
            Value::Int(value) => write!(f, "{}", value),
            Value::Str(value) => write_quoted(f, value.as_bytes()),
            Value::Bytes(bytes) => write_quoted(f, bytes),
            Value::FourCC(bytes) => write_quoted(f, bytes),
            Value::BitArray { bits, data } => {
                write!(f, "({}, ", bits)?;
                write_quoted(f, data)?;
                write!(f, ")")
            }
            Value::Array(items) => {
                write!(f, "[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Struct(fields) => {
                write!(f, "{{")?;
                for (index, (name, value)) in fields.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{}': {}", name, value)?;
                }
                write!(f, "}}")
            }
            Value::Choice(name, value) => write!(f, "{{'{}': {}}}", name, value),
        }
    }
}
