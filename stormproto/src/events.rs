//! Lazy event-stream framing over either decoder variant.
//!
//! Game, message and tracker inner files all share the same framing: a
//! gameloop delta, an optional user id, an event id, and the event body,
//! byte-aligned between events. The stream is single-pass; it owns its
//! decoder and advances the underlying cursor as it is consumed.

use log::trace;

use crate::decoder::Decoder;
use crate::error::{Error, Result};
use crate::types::{struct_put, EventType, TypeId, Value};

/// An iterator yielding framed event records from an inner file.
///
/// Each yielded event is a struct value with the synthetic fields `_event`,
/// `_eventid`, `_gameloop`, `_bits` and, when user ids are decoded,
/// `_userid`. The iterator fuses after the first error.
pub struct EventStream<D> {
    decoder: D,
    svaruint32_typeid: TypeId,
    userid_typeid: Option<TypeId>,
    eventid_typeid: TypeId,
    event_types: &'static [EventType],
    gameloop: i64,
    fused: bool,
}

impl<D> EventStream<D>
where
    D: Decoder,
{
    /// Frame events out of `decoder` using the given entry-point type ids.
    ///
    /// `userid_typeid` is `Some` for game and message events and `None` for
    /// tracker events, which carry no user id on the wire.
    pub fn new(
        decoder: D,
        svaruint32_typeid: TypeId,
        userid_typeid: Option<TypeId>,
        eventid_typeid: TypeId,
        event_types: &'static [EventType],
    ) -> Self {
        Self {
            decoder,
            svaruint32_typeid,
            userid_typeid,
            eventid_typeid,
            event_types,
            gameloop: 0,
            fused: false,
        }
    }

    fn next_event(&mut self) -> Result<Value> {
        let start_bits = self.decoder.used_bits();

        // The gameloop delta prefixes every event and accumulates over the
        // stream.
        let delta = varuint32_value(&self.decoder.instance(self.svaruint32_typeid)?);
        self.gameloop += delta;

        let userid = match self.userid_typeid {
            Some(typeid) => Some(self.decoder.instance(typeid)?),
            None => None,
        };

        let eventid = self
            .decoder
            .instance(self.eventid_typeid)?
            .as_int()
            .ok_or_else(|| Error::corrupted("event id did not decode to an integer"))?;
        let event_type = self
            .event_types
            .iter()
            .find(|event_type| event_type.id == eventid)
            .ok_or_else(|| {
                Error::corrupted(format!(
                    "eventid({}) at bit {}",
                    eventid,
                    self.decoder.used_bits()
                ))
            })?;
        trace!(
            "event {} ({}) at gameloop {}",
            event_type.name,
            eventid,
            self.gameloop
        );

        let mut event = match self.decoder.instance(event_type.typeid)? {
            Value::Struct(fields) => fields,
            other => {
                return Err(Error::corrupted(format!(
                    "event {} decoded to a non-struct value: {}",
                    event_type.name, other
                )))
            }
        };
        struct_put(&mut event, "_event", Value::Str(event_type.name.to_string()));
        struct_put(&mut event, "_eventid", Value::Int(eventid));
        struct_put(&mut event, "_gameloop", Value::Int(self.gameloop));
        if let Some(userid) = userid {
            struct_put(&mut event, "_userid", userid);
        }

        // The next event starts at a byte boundary; the alignment padding
        // counts toward this event's footprint.
        self.decoder.byte_align();
        struct_put(
            &mut event,
            "_bits",
            Value::Int((self.decoder.used_bits() - start_bits) as i64),
        );

        Ok(Value::Struct(event))
    }
}

impl<D> Iterator for EventStream<D>
where
    D: Decoder,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.fused || self.decoder.done() {
            return None;
        }
        let event = self.next_event();
        if event.is_err() {
            self.fused = true;
        }
        Some(event)
    }
}

/// The numeric payload of a decoded `svaruint32`: a choice (or single-field
/// struct) wrapping one integer.
fn varuint32_value(value: &Value) -> i64 {
    match value {
        Value::Choice(_, inner) => varuint32_value(inner),
        Value::Struct(fields) => fields
            .first()
            .map(|(_, value)| varuint32_value(value))
            .unwrap_or(0),
        Value::Int(value) => *value,
        _ => 0,
    }
}
