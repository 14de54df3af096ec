//! Decoder for Heroes of the Storm replay files.
//!
//! A `.StormReplay` file is an MPQ archive holding a handful of well-known
//! inner files, each encoded in a versioned, bit-packed binary format driven
//! by per-build type-information tables. This crate implements the
//! bit-level, type-directed decoders for those formats, the event-stream
//! framing layered above them, and the façade that binds a replay to the
//! right table set by its base build.
//!
//! ```no_run
//! use stormproto::Replay;
//!
//! fn dump(path: &str) -> stormproto::Result<()> {
//!     let mut replay = Replay::open(path)?;
//!     println!("{}", replay.decode_header()?);
//!     for event in replay.decode_replay_tracker_events()? {
//!         println!("{}", event?);
//!     }
//!     Ok(())
//! }
//! ```

#[macro_use]
extern crate lazy_static;

mod archive;
mod attributes;
mod buffer;
mod decoder;
mod error;
mod events;
pub mod protocol;
mod replay;
#[cfg(test)]
mod testutil;
mod traits;
mod types;
mod units;

pub use archive::ReplayArchive;
pub use attributes::{Attribute, ReplayAttributes};
pub use buffer::{BitBuffer, Endian};
pub use decoder::{BitPackedDecoder, Decoder, VersionedDecoder};
pub use error::{Error, Result};
pub use events::EventStream;
pub use protocol::Protocol;
pub use replay::Replay;
pub use types::{ChoiceCase, EventType, Field, IntBounds, TypeId, TypeInfo, Value};
pub use units::{unit_tag, unit_tag_index, unit_tag_recycle};
