use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveFormat {
    Zip,
    Directory,
}

/// Identify an archive from its leading bytes.
pub fn detect_format(data: &[u8]) -> Option<ArchiveFormat> {
    match data {
        // local file header, or the end-of-central-directory record of an empty archive
        [0x50, 0x4B, 0x03, 0x04, ..] | [0x50, 0x4B, 0x05, 0x06, ..] => Some(ArchiveFormat::Zip),
        _ => None,
    }
}

/// Identify the source behind `path`: a directory tree or a zip file.
pub fn detect_path(path: &Path) -> Result<ArchiveFormat> {
    let meta = std::fs::metadata(path).map_err(|e| Error::ArchiveOpenFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    if meta.is_dir() {
        return Ok(ArchiveFormat::Directory);
    }

    let mut header = [0u8; 4];
    let mut file = File::open(path).map_err(|e| Error::ArchiveOpenFailed {
        path: path.to_path_buf(),
        source: e,
    })?;
    let read = read_up_to(&mut file, &mut header).map_err(|e| Error::ArchiveOpenFailed {
        path: path.to_path_buf(),
        source: e,
    })?;

    detect_format(&header[..read]).ok_or_else(|| Error::UnsupportedFormat {
        path: path.to_path_buf(),
    })
}

fn read_up_to<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..])? {
            0 => break,
            n => filled += n,
        }
    }
    Ok(filled)
}
