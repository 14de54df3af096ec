//! Per-build protocol table sets and the build registry.
//!
//! Each supported base build carries its own generated type-information
//! table plus the named entry-point type ids and event-type tables. Table
//! sets are registered once at startup; replays then select a set by the
//! base build their header reports.

mod baseline;

pub use baseline::BASELINE;

use log::debug;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::sync::RwLock;

use crate::attributes::{decode_replay_attributes_events, ReplayAttributes};
use crate::decoder::{BitPackedDecoder, VersionedDecoder};
use crate::error::{Error, Result};
use crate::events::EventStream;
use crate::types::{EventType, TypeId, TypeInfo, Value};

/// One build's complete decoding tables: the type-information table, the
/// named top-level entry points, and the event-type maps.
#[derive(Debug)]
pub struct Protocol {
    /// The base build this table set was generated from.
    pub build: u32,
    pub typeinfos: &'static [TypeInfo],
    pub replay_header_typeid: TypeId,
    pub game_details_typeid: TypeId,
    pub replay_initdata_typeid: TypeId,
    pub svaruint32_typeid: TypeId,
    pub replay_userid_typeid: TypeId,
    pub game_eventid_typeid: TypeId,
    pub message_eventid_typeid: TypeId,
    pub tracker_eventid_typeid: TypeId,
    pub game_event_types: &'static [EventType],
    pub message_event_types: &'static [EventType],
    pub tracker_event_types: &'static [EventType],
}

impl Protocol {
    /// Decode a replay header from the MPQ user-data block contents.
    pub fn decode_header<B>(&self, contents: B) -> Result<Value>
    where
        B: AsRef<[u8]>,
    {
        VersionedDecoder::new(contents, self.typeinfos).instance(self.replay_header_typeid)
    }

    /// Decode the `replay.details` inner file.
    pub fn decode_replay_details<B>(&self, contents: B) -> Result<Value>
    where
        B: AsRef<[u8]>,
    {
        VersionedDecoder::new(contents, self.typeinfos).instance(self.game_details_typeid)
    }

    /// Decode the `replay.initData` inner file.
    pub fn decode_replay_initdata<B>(&self, contents: B) -> Result<Value>
    where
        B: AsRef<[u8]>,
    {
        BitPackedDecoder::new(contents, self.typeinfos).instance(self.replay_initdata_typeid)
    }

    /// Lazily decode the `replay.game.events` inner file.
    pub fn decode_replay_game_events<B>(&self, contents: B) -> EventStream<BitPackedDecoder<B>>
    where
        B: AsRef<[u8]>,
    {
        EventStream::new(
            BitPackedDecoder::new(contents, self.typeinfos),
            self.svaruint32_typeid,
            Some(self.replay_userid_typeid),
            self.game_eventid_typeid,
            self.game_event_types,
        )
    }

    /// Lazily decode the `replay.message.events` inner file.
    pub fn decode_replay_message_events<B>(&self, contents: B) -> EventStream<BitPackedDecoder<B>>
    where
        B: AsRef<[u8]>,
    {
        EventStream::new(
            BitPackedDecoder::new(contents, self.typeinfos),
            self.svaruint32_typeid,
            Some(self.replay_userid_typeid),
            self.message_eventid_typeid,
            self.message_event_types,
        )
    }

    /// Lazily decode the `replay.tracker.events` inner file.
    ///
    /// Tracker events ride the versioned wire and carry no user id.
    pub fn decode_replay_tracker_events<B>(&self, contents: B) -> EventStream<VersionedDecoder<B>>
    where
        B: AsRef<[u8]>,
    {
        EventStream::new(
            VersionedDecoder::new(contents, self.typeinfos),
            self.svaruint32_typeid,
            None,
            self.tracker_eventid_typeid,
            self.tracker_event_types,
        )
    }

    /// Decode the `replay.attributes.events` inner file.
    ///
    /// The attributes layout is fixed and does not consult the tables; the
    /// method lives here so every inner file decodes through one surface.
    pub fn decode_replay_attributes_events<B>(&self, contents: B) -> Result<ReplayAttributes>
    where
        B: AsRef<[u8]>,
    {
        decode_replay_attributes_events(contents)
    }
}

lazy_static! {
    static ref REGISTRY: RwLock<BTreeMap<u32, &'static Protocol>> = RwLock::new(BTreeMap::new());
}

/// Register a table set under its base build, replacing any previous
/// registration for the same build.
pub fn register(protocol: &'static Protocol) {
    REGISTRY
        .write()
        .expect("protocol registry poisoned")
        .insert(protocol.build, protocol);
}

/// Look up the table set registered for a base build.
pub fn for_build(build: u32) -> Result<&'static Protocol> {
    REGISTRY
        .read()
        .expect("protocol registry poisoned")
        .get(&build)
        .copied()
        .ok_or(Error::ProtocolNotFound { build })
}

/// True iff a table set is registered for the build.
pub fn is_registered(build: u32) -> bool {
    REGISTRY
        .read()
        .expect("protocol registry poisoned")
        .contains_key(&build)
}

/// The compiled-in table set used to bootstrap protocol resolution.
///
/// The header schema is stable enough that the oldest supported build can
/// parse any replay's header; only header decoding is meaningful on it.
pub fn baseline() -> &'static Protocol {
    &BASELINE
}

/// Extract the base build from an MPQ user-data header block by decoding it
/// with the baseline tables.
pub fn base_build(user_data_header: &[u8]) -> Result<u32> {
    let header = baseline().decode_header(user_data_header)?;
    let build = header
        .at_path(&["m_version", "m_baseBuild"])
        .and_then(Value::as_int)
        .ok_or_else(|| Error::corrupted("replay header carries no m_version.m_baseBuild"))?;
    u32::try_from(build)
        .map_err(|_| Error::corrupted(format!("base build {} out of range", build)))
}

/// Resolve the registered table set for a replay from its user-data header.
pub fn resolve(user_data_header: &[u8]) -> Result<&'static Protocol> {
    let build = base_build(user_data_header)?;
    debug!("replay reports base build {}", build);
    for_build(build)
}

#[cfg(test)]
mod tests {
    use super::{base_build, baseline, for_build, is_registered, register, resolve, Protocol, BASELINE};
    use crate::buffer::Endian;
    use crate::error::Error;
    use crate::testutil::{vint, BitWriter};
    use crate::types::{Field, IntBounds, TypeInfo, Value};

    fn wire_vint(value: i64) -> Vec<u8> {
        let mut out = vec![9];
        out.extend(vint(value));
        out
    }

    fn wire_blob(bytes: &[u8]) -> Vec<u8> {
        let mut out = vec![2];
        out.extend(vint(bytes.len() as i64));
        out.extend_from_slice(bytes);
        out
    }

    fn wire_bool(value: bool) -> Vec<u8> {
        vec![6, value as u8]
    }

    fn wire_struct(fields: &[(i64, Vec<u8>)]) -> Vec<u8> {
        let mut out = vec![5];
        out.extend(vint(fields.len() as i64));
        for (tag, payload) in fields {
            out.extend(vint(*tag));
            out.extend_from_slice(payload);
        }
        out
    }

    fn wire_hash() -> Vec<u8> {
        wire_struct(&[(0, vec![4, 0]), (1, wire_blob(&[0x11; 16]))])
    }

    fn header_wire(base_build: i64) -> Vec<u8> {
        wire_struct(&[
            (0, wire_blob(b"Heroes of the Storm replay\x1b11")),
            (
                1,
                wire_struct(&[
                    (0, wire_vint(1)),
                    (1, wire_vint(0)),
                    (2, wire_vint(15)),
                    (3, wire_vint(1)),
                    (4, wire_vint(base_build)),
                    (5, wire_vint(base_build)),
                ]),
            ),
            (2, wire_vint(2)),
            (3, wire_vint(23783)),
            (4, wire_bool(false)),
            (5, wire_hash()),
            (6, wire_vint(base_build)),
            (7, wire_hash()),
            (8, wire_hash()),
        ])
    }

    #[test]
    fn baseline_decodes_a_header() {
        let header = baseline().decode_header(header_wire(39271)).unwrap();

        assert_eq!(
            Some(b"Heroes of the Storm replay\x1b11".as_ref()),
            header.field("m_signature").and_then(Value::as_bytes)
        );
        assert_eq!(
            Some(39271),
            header
                .at_path(&["m_version", "m_baseBuild"])
                .and_then(Value::as_int)
        );
        assert_eq!(Some(2), header.field("m_type").and_then(Value::as_int));
        assert_eq!(
            Some(&Value::Bool(false)),
            header.field("m_useScaledTime")
        );
        assert_eq!(
            Some(&Value::Bytes(vec![0x11; 16])),
            header.at_path(&["m_ngdpRootKey", "m_data"])
        );
    }

    #[test]
    fn base_build_comes_from_the_version_struct() {
        assert_eq!(39271, base_build(&header_wire(39271)).unwrap());
    }

    #[test]
    fn unregistered_build_is_a_protocol_error() {
        assert!(matches!(
            resolve(&header_wire(11111)),
            Err(Error::ProtocolNotFound { build: 11111 })
        ));
        assert!(!is_registered(11111));
    }

    static TEST_PROTOCOL: Protocol = Protocol {
        build: 39271,
        ..BASELINE
    };

    #[test]
    fn registered_build_resolves() {
        register(&TEST_PROTOCOL);
        let protocol = resolve(&header_wire(39271)).unwrap();
        assert_eq!(39271, protocol.build);
        assert_eq!(39271, for_build(39271).unwrap().build);
    }

    const DETAILS_TYPEINFOS: &[TypeInfo] = &[
        /* 0 */ TypeInfo::Blob(IntBounds::new(0, 8)),
        /* 1 */
        TypeInfo::Struct(&[
            Field::new("m_name", 0, 0),
            Field::new("m_teamId", 2, 1),
        ]),
        /* 2 */ TypeInfo::Int(IntBounds::new(0, 8)),
        /* 3 */ TypeInfo::Array(IntBounds::new(0, 5), 1),
        /* 4 */
        TypeInfo::Struct(&[
            Field::new("m_playerList", 3, 0),
            Field::new("m_title", 0, 1),
        ]),
    ];

    static DETAILS_PROTOCOL: Protocol = Protocol {
        build: 88888,
        typeinfos: DETAILS_TYPEINFOS,
        game_details_typeid: 4,
        ..BASELINE
    };

    #[test]
    fn details_shaped_struct_decodes() {
        let players = (0..2i64)
            .map(|index| {
                wire_struct(&[
                    (0, wire_blob(format!("Player{}", index).as_bytes())),
                    (1, wire_vint(index)),
                ])
            })
            .collect::<Vec<_>>();
        let mut list = vec![0u8];
        list.extend(vint(players.len() as i64));
        for player in players {
            list.extend(player);
        }
        let wire = wire_struct(&[(0, list), (1, wire_blob(b"Towers of Doom"))]);

        let details = DETAILS_PROTOCOL.decode_replay_details(wire).unwrap();
        match details.field("m_playerList") {
            Some(Value::Array(players)) => {
                assert_eq!(2, players.len());
                assert_eq!(
                    Some(b"Player0".as_ref()),
                    players[0].field("m_name").and_then(Value::as_bytes)
                );
            }
            other => panic!("expected a player array, got {:?}", other),
        }
        assert_eq!(
            Some(b"Towers of Doom".as_ref()),
            details.field("m_title").and_then(Value::as_bytes)
        );
    }

    const INITDATA_TYPEINFOS: &[TypeInfo] = &[
        /* 0 */ TypeInfo::Blob(IntBounds::new(4, 0)),
        /* 1 */ TypeInfo::Array(IntBounds::new(0, 3), 0),
        /* 2 */ TypeInfo::Struct(&[Field::new("m_cacheHandles", 1, 0)]),
        /* 3 */ TypeInfo::Struct(&[Field::new("m_gameDescription", 2, 0)]),
        /* 4 */ TypeInfo::Struct(&[Field::new("m_syncLobbyState", 3, 0)]),
    ];

    static INITDATA_PROTOCOL: Protocol = Protocol {
        build: 77777,
        typeinfos: INITDATA_TYPEINFOS,
        replay_initdata_typeid: 4,
        ..BASELINE
    };

    #[test]
    fn initdata_cache_handles_decode_as_fixed_blobs() {
        let mut writer = BitWriter::new(Endian::Big);
        writer.write_bits(2, 3);
        writer.write_aligned_bytes(b"hdl1");
        writer.write_aligned_bytes(b"hdl2");

        let initdata = INITDATA_PROTOCOL
            .decode_replay_initdata(writer.into_bytes())
            .unwrap();
        let handles = initdata
            .at_path(&["m_syncLobbyState", "m_gameDescription", "m_cacheHandles"])
            .unwrap();
        match handles {
            Value::Array(handles) => {
                assert_eq!(2, handles.len());
                assert_eq!(Some(b"hdl1".as_ref()), handles[0].as_bytes());
                assert_eq!(Some(b"hdl2".as_ref()), handles[1].as_bytes());
            }
            other => panic!("expected an array of cache handles, got {:?}", other),
        }
    }
}
