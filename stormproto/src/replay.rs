//! The replay façade: one archive bound to its resolved protocol.

use std::path::Path;

use crate::archive::ReplayArchive;
use crate::attributes::ReplayAttributes;
use crate::decoder::{BitPackedDecoder, VersionedDecoder};
use crate::error::Result;
use crate::events::EventStream;
use crate::protocol::{self, Protocol};
use crate::types::Value;

/// A replay file with its protocol resolved and cached.
///
/// The protocol is chosen eagerly in [`Replay::open`] from the base build
/// the header reports, so a `Replay` must not be reused across files. Each
/// decode method reads the corresponding inner file and drives a fresh
/// decoder over it.
pub struct Replay {
    archive: ReplayArchive,
    protocol: &'static Protocol,
}

impl Replay {
    /// Open a `.StormReplay` file and resolve its protocol.
    ///
    /// Fails with `ProtocolNotFound` if no table set is registered for the
    /// base build the replay header reports.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let archive = ReplayArchive::open(path)?;
        let protocol = protocol::resolve(archive.user_data_header())?;
        Ok(Self { archive, protocol })
    }

    /// The table set this replay decodes with.
    pub fn protocol(&self) -> &'static Protocol {
        self.protocol
    }

    /// The base build the replay header reported.
    pub fn base_build(&self) -> u32 {
        self.protocol.build
    }

    /// Decode the replay header from the MPQ user-data block.
    pub fn decode_header(&self) -> Result<Value> {
        self.protocol.decode_header(self.archive.user_data_header())
    }

    /// Decode the `replay.details` inner file.
    pub fn decode_replay_details(&mut self) -> Result<Value> {
        let contents = self.archive.read_file("replay.details")?;
        self.protocol.decode_replay_details(contents)
    }

    /// Decode the `replay.initData` inner file.
    pub fn decode_replay_initdata(&mut self) -> Result<Value> {
        let contents = self.archive.read_file("replay.initData")?;
        self.protocol.decode_replay_initdata(contents)
    }

    /// Lazily decode the `replay.game.events` inner file.
    pub fn decode_replay_game_events(
        &mut self,
    ) -> Result<EventStream<BitPackedDecoder<Vec<u8>>>> {
        let contents = self.archive.read_file("replay.game.events")?;
        Ok(self.protocol.decode_replay_game_events(contents))
    }

    /// Lazily decode the `replay.message.events` inner file.
    pub fn decode_replay_message_events(
        &mut self,
    ) -> Result<EventStream<BitPackedDecoder<Vec<u8>>>> {
        let contents = self.archive.read_file("replay.message.events")?;
        Ok(self.protocol.decode_replay_message_events(contents))
    }

    /// Lazily decode the `replay.tracker.events` inner file.
    pub fn decode_replay_tracker_events(
        &mut self,
    ) -> Result<EventStream<VersionedDecoder<Vec<u8>>>> {
        let contents = self.archive.read_file("replay.tracker.events")?;
        Ok(self.protocol.decode_replay_tracker_events(contents))
    }

    /// Decode the `replay.attributes.events` inner file.
    pub fn decode_replay_attributes_events(&mut self) -> Result<ReplayAttributes> {
        let contents = self.archive.read_file("replay.attributes.events")?;
        self.protocol.decode_replay_attributes_events(contents)
    }
}
