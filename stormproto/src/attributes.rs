//! Fixed-layout decoder for the attributes inner file.
//!
//! Unlike every other inner file, `replay.attributes.events` is not driven
//! by the type-information tables: it is a flat little-endian record list
//! with a small fixed header.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::buffer::{BitBuffer, Endian};
use crate::error::Result;
use crate::types::latin1;

/// One attribute entry, keyed into a scope by its attribute id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Attribute {
    pub namespace: u32,
    pub attrid: u32,
    pub value: String,
}

/// The decoded attributes file: a source byte, the map namespace, and the
/// attribute entries grouped by scope and attribute id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ReplayAttributes {
    pub source: u8,
    #[serde(rename = "mapNamespace")]
    pub map_namespace: u32,
    pub scopes: BTreeMap<u32, BTreeMap<u32, Vec<Attribute>>>,
}

/// Decode the `replay.attributes.events` inner file.
///
/// A 32-bit entry count follows the header on the wire; it is read and
/// discarded, and the loop instead runs until the buffer is exhausted.
pub fn decode_replay_attributes_events<B>(contents: B) -> Result<ReplayAttributes>
where
    B: AsRef<[u8]>,
{
    let mut buffer = BitBuffer::new(contents, Endian::Little);
    let mut attributes = ReplayAttributes::default();

    if buffer.done() {
        return Ok(attributes);
    }

    attributes.source = buffer.read_bits::<u8>(8)?;
    attributes.map_namespace = buffer.read_bits::<u32>(32)?;
    let _count = buffer.read_bits::<u32>(32)?;

    while !buffer.done() {
        let namespace = buffer.read_bits::<u32>(32)?;
        let attrid = buffer.read_bits::<u32>(32)?;
        let scope = buffer.read_bits::<u32>(8)?;
        let mut raw = buffer.read_aligned_bytes(4)?;
        raw.reverse();

        attributes
            .scopes
            .entry(scope)
            .or_insert_with(BTreeMap::new)
            .entry(attrid)
            .or_insert_with(Vec::new)
            .push(Attribute {
                namespace,
                attrid,
                value: latin1(strip_nuls(&raw)),
            });
    }

    Ok(attributes)
}

/// Trim the NUL padding that attribute values carry on both ends once
/// reversed.
fn strip_nuls(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&byte| byte != 0);
    match start {
        Some(start) => {
            let end = bytes.iter().rposition(|&byte| byte != 0).unwrap() + 1;
            &bytes[start..end]
        }
        None => &[],
    }
}

impl fmt::Display for ReplayAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{'source': {}, 'mapNamespace': {}, 'scopes': {{",
            self.source, self.map_namespace
        )?;
        for (scope_index, (scope, entries)) in self.scopes.iter().enumerate() {
            if scope_index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {{", scope)?;
            for (attr_index, (attrid, values)) in entries.iter().enumerate() {
                if attr_index > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}: [", attrid)?;
                for (value_index, value) in values.iter().enumerate() {
                    if value_index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(
                        f,
                        "{{'namespace': {}, 'attrid': {}, 'value': '{}'}}",
                        value.namespace, value.attrid, value.value
                    )?;
                }
                write!(f, "]")?;
            }
            write!(f, "}}")?;
        }
        write!(f, "}}}}")
    }
}

#[cfg(test)]
mod tests {
    use super::decode_replay_attributes_events;

    fn entry(wire: &mut Vec<u8>, namespace: u32, attrid: u32, scope: u8, value: &[u8; 4]) {
        wire.extend_from_slice(&namespace.to_le_bytes());
        wire.extend_from_slice(&attrid.to_le_bytes());
        wire.push(scope);
        wire.extend_from_slice(value);
    }

    fn header(wire: &mut Vec<u8>, source: u8, map_namespace: u32, count: u32) {
        wire.push(source);
        wire.extend_from_slice(&map_namespace.to_le_bytes());
        wire.extend_from_slice(&count.to_le_bytes());
    }

    #[test]
    fn empty_file_decodes_to_defaults() {
        let attributes = decode_replay_attributes_events(&[][..]).unwrap();
        assert_eq!(0, attributes.source);
        assert!(attributes.scopes.is_empty());
    }

    #[test]
    fn entries_group_by_scope_and_attrid() {
        let mut wire = Vec::new();
        // The count is deliberately wrong: it is wire padding, not a loop
        // bound.
        header(&mut wire, 120, 999, 7);
        entry(&mut wire, 999, 500, 16, b"vih\0");
        entry(&mut wire, 999, 500, 17, b"muiL");
        entry(&mut wire, 999, 3000, 16, b"5v5\0");

        let attributes = decode_replay_attributes_events(&wire[..]).unwrap();
        assert_eq!(120, attributes.source);
        assert_eq!(999, attributes.map_namespace);

        let scope16 = &attributes.scopes[&16];
        assert_eq!("hiv", scope16[&500][0].value);
        assert_eq!("5v5", scope16[&3000][0].value);
        assert_eq!("Lium", attributes.scopes[&17][&500][0].value);
    }

    #[test]
    fn values_match_their_key_and_carry_no_nuls() {
        let mut wire = Vec::new();
        header(&mut wire, 1, 42, 0);
        entry(&mut wire, 42, 11, 3, b"a\0\0\0");
        entry(&mut wire, 42, 11, 3, b"bc\0\0");

        let attributes = decode_replay_attributes_events(&wire[..]).unwrap();
        for (scope, entries) in &attributes.scopes {
            for (attrid, values) in entries {
                for value in values {
                    assert_eq!(*attrid, value.attrid, "scope {}", scope);
                    assert!(!value.value.contains('\0'));
                    assert!(value.value.chars().all(|c| c.is_ascii_graphic()));
                }
            }
        }
        assert_eq!(2, attributes.scopes[&3][&11].len());
        assert_eq!("a", attributes.scopes[&3][&11][0].value);
        assert_eq!("cb", attributes.scopes[&3][&11][1].value);
    }
}
