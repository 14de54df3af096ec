//! Baseline tables used to bootstrap protocol resolution.
//!
//! The replay header schema has been stable across every shipped build, so
//! any table set can decode it. This minimal set carries just enough of the
//! oldest supported build's tables to read a header and report the base
//! build; the other entry points resolve to `Null` and the event tables are
//! empty. Full per-build table sets are registered by downstream code.

use super::Protocol;
use crate::types::{ChoiceCase, Field, IntBounds, TypeInfo};

const TYPEINFOS: &[TypeInfo] = &[
    /*  0 */ TypeInfo::Int(IntBounds::new(0, 6)),
    /*  1 */ TypeInfo::Int(IntBounds::new(0, 14)),
    /*  2 */ TypeInfo::Int(IntBounds::new(0, 22)),
    /*  3 */ TypeInfo::Int(IntBounds::new(0, 32)),
    /*  4 */
    TypeInfo::Choice(
        IntBounds::new(0, 2),
        &[
            ChoiceCase::new(0, "m_uint6", 0),
            ChoiceCase::new(1, "m_uint14", 1),
            ChoiceCase::new(2, "m_uint22", 2),
            ChoiceCase::new(3, "m_uint32", 3),
        ],
    ),
    /*  5 */ TypeInfo::Int(IntBounds::new(0, 5)),
    /*  6 */ TypeInfo::Struct(&[Field::new("m_userId", 5, 0)]),
    /*  7 */ TypeInfo::Blob(IntBounds::new(0, 8)),
    /*  8 */ TypeInfo::Int(IntBounds::new(0, 8)),
    /*  9 */
    TypeInfo::Struct(&[
        Field::new("m_flags", 8, 0),
        Field::new("m_major", 8, 1),
        Field::new("m_minor", 8, 2),
        Field::new("m_revision", 8, 3),
        Field::new("m_build", 3, 4),
        Field::new("m_baseBuild", 3, 5),
    ]),
    /* 10 */ TypeInfo::Int(IntBounds::new(0, 3)),
    /* 11 */ TypeInfo::Bool,
    /* 12 */ TypeInfo::Array(IntBounds::new(0, 5), 8),
    /* 13 */ TypeInfo::Optional(12),
    /* 14 */ TypeInfo::Blob(IntBounds::new(16, 0)),
    /* 15 */
    TypeInfo::Struct(&[
        Field::new("m_dataDeprecated", 13, 0),
        Field::new("m_data", 14, 1),
    ]),
    /* 16 */
    TypeInfo::Struct(&[
        Field::new("m_signature", 7, 0),
        Field::new("m_version", 9, 1),
        Field::new("m_type", 10, 2),
        Field::new("m_elapsedGameLoops", 3, 3),
        Field::new("m_useScaledTime", 11, 4),
        Field::new("m_ngdpRootKey", 15, 5),
        Field::new("m_dataBuildNum", 3, 6),
        Field::new("m_replayCompatibilityHash", 15, 7),
        Field::new("m_fixedFileHash", 15, 8),
    ]),
    /* 17 */ TypeInfo::Null,
];

/// The baseline table set, keyed as the oldest supported build.
pub const BASELINE: Protocol = Protocol {
    build: 29406,
    typeinfos: TYPEINFOS,
    replay_header_typeid: 16,
    game_details_typeid: 17,
    replay_initdata_typeid: 17,
    svaruint32_typeid: 4,
    replay_userid_typeid: 6,
    game_eventid_typeid: 3,
    message_eventid_typeid: 3,
    tracker_eventid_typeid: 3,
    game_event_types: &[],
    message_event_types: &[],
    tracker_event_types: &[],
};
