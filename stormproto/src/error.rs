//! Error types for replay decoding.

use thiserror::Error;

/// Any error that can occur while decoding a replay.
#[derive(Debug, Error)]
pub enum Error {
    /// The inner-file buffer ran out of bytes mid-read.
    #[error("unexpected end of replay data")]
    Truncated,

    /// The wire data did not match the schema: an unknown choice tag, an
    /// unknown event id, a versioned kind tag that disagrees with the
    /// expected shape, or an out-of-range type id.
    #[error("corrupted replay data: {0}")]
    CorruptedData(String),

    /// No type-information table set is registered for the replay's base
    /// build number.
    #[error("no protocol registered for base build {build}")]
    ProtocolNotFound {
        /// The base build the replay header reported.
        build: u32,
    },

    /// An error surfaced from the MPQ archive layer, message intact.
    #[error("archive error: {0}")]
    Archive(String),
}

impl Error {
    pub(crate) fn corrupted(context: impl Into<String>) -> Self {
        Error::CorruptedData(context.into())
    }
}

/// Type alias for decoder results.
pub type Result<T> = std::result::Result<T, Error>;
