//! Readers the inventory can enumerate and reopen.

mod dir;
mod zipped;

pub use dir::DirSource;
pub use zipped::ZipSource;

use std::io::Read;
use std::path::Path;
use std::time::SystemTime;

use crate::entry::{EntryKind, Member};
use crate::error::Result;
use crate::format::{ArchiveFormat, detect_path};

/// A member as the underlying reader reports it, before sanitization.
#[derive(Clone, Debug)]
pub struct RawEntry {
    pub name:     String,
    pub kind:     EntryKind,
    pub size:     u64,
    pub mode:     Option<u32>,
    pub modified: Option<SystemTime>,
    pub member:   Member,
}

/// A source of archive members.
///
/// Implementors own their reader; entries refer back to members through
/// [`Member`] so that no borrow of the source outlives a call.
pub trait Source: Send {
    fn format(&self) -> ArchiveFormat;

    /// Human readable location, used in log lines and errors.
    fn location(&self) -> &Path;

    /// Every member in storage order, unfiltered.
    fn members(&mut self) -> Result<Vec<RawEntry>>;

    /// Open the bytes of `member` for reading.
    fn open(&mut self, member: &Member) -> Result<Box<dyn Read + '_>>;
}

/// Open the source at `path`, picking the reader from the on-disk format.
pub fn open_path(path: &Path) -> Result<Box<dyn Source>> {
    match detect_path(path)? {
        ArchiveFormat::Zip => Ok(Box::new(ZipSource::open(path)?)),
        ArchiveFormat::Directory => Ok(Box::new(DirSource::new(path))),
    }
}
