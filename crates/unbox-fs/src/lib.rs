//! Filesystem primitives for laying files down in an install target and
//! taking them back out again.

mod dir;
mod error;
mod permissions;
mod probe;

pub use dir::{create_dir_tracked, remove_empty_dirs, remove_entry, set_modified};
pub use error::{Error, Result};
pub use permissions::{DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, FileMode, OWNER_READ_WRITE};
pub use probe::{available_bytes, is_privileged, is_writable};

use std::io::{Read, Write};
use std::path::Path;

/// Stream `reader` into a new file at `path` created with `mode`.
///
/// Returns the number of bytes written. The file is flushed before returning.
/// An [`Error::Open`] means the path was left as it was; after an
/// [`Error::Write`] a partially written file is left for the caller.
pub fn write_file<R: Read + ?Sized>(reader: &mut R, path: &Path, mode: FileMode) -> Result<u64> {
    let mut file = mode.create(path)?;
    let written = std::io::copy(reader, &mut file).map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    file.flush().map_err(|e| Error::Write {
        path: path.to_path_buf(),
        source: e,
    })?;
    Ok(written)
}
