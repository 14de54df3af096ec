//! MPQ archive access for replay files.
//!
//! The heavy lifting is delegated to the `mpq` crate; this wrapper only adds
//! the piece it does not surface: the MPQ user-data block at the start of a
//! `.StormReplay` file, whose content is the encoded replay header.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

/// Magic bytes of the MPQ user-data block that precedes the archive proper.
const USER_DATA_MAGIC: [u8; 4] = [b'M', b'P', b'Q', 0x1b];

/// An opened replay archive: the MPQ reader plus the user-data header bytes.
pub struct ReplayArchive {
    archive: mpq::Archive,
    user_data: Vec<u8>,
}

impl ReplayArchive {
    /// Open a replay file, reading its user-data block up front.
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let user_data = read_user_data(path)?;
        let archive =
            mpq::Archive::open(path.to_string_lossy().as_ref()).map_err(archive_error)?;
        Ok(Self { archive, user_data })
    }

    /// The content of the MPQ user-data header block.
    pub fn user_data_header(&self) -> &[u8] {
        &self.user_data
    }

    /// Read one inner file out of the archive by its exact name.
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.open_file(name).map_err(archive_error)?;
        let mut contents = vec![0u8; file.size() as usize];
        file.read(&mut self.archive, &mut contents)
            .map_err(archive_error)?;
        Ok(contents)
    }
}

fn archive_error<E>(error: E) -> Error
where
    E: std::fmt::Display,
{
    Error::Archive(error.to_string())
}

/// Read the user-data block from the head of the file: the 16-byte block
/// header (magic, block size, archive offset, content size) followed by the
/// content itself.
fn read_user_data(path: &Path) -> Result<Vec<u8>> {
    let mut file = File::open(path).map_err(archive_error)?;
    let mut head = [0u8; 16];
    file.read_exact(&mut head).map_err(archive_error)?;
    if head[0..4] != USER_DATA_MAGIC {
        return Err(Error::Archive(
            "replay carries no MPQ user data block".to_string(),
        ));
    }
    let size = u32::from_le_bytes([head[12], head[13], head[14], head[15]]) as usize;
    let mut content = vec![0u8; size];
    file.read_exact(&mut content).map_err(archive_error)?;
    Ok(content)
}
