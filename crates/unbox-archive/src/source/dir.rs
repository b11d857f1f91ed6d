use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::{RawEntry, Source};
use crate::entry::{EntryKind, Member};
use crate::error::{Error, Result};
use crate::format::ArchiveFormat;

/// A pre-extracted tree on disk.
///
/// Walked in file name order with every directory listed before its
/// contents. Symlinks and special files are skipped.
#[derive(Debug)]
pub struct DirSource {
    root: PathBuf,
}

impl DirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self { Self { root: root.into() } }
}

impl Source for DirSource {
    fn format(&self) -> ArchiveFormat { ArchiveFormat::Directory }

    fn location(&self) -> &Path { &self.root }

    fn members(&mut self) -> Result<Vec<RawEntry>> {
        let mut members = Vec::new();
        let walker = WalkDir::new(&self.root)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name();

        for item in walker {
            let item = item?;
            let file_type = item.file_type();
            if !file_type.is_dir() && !file_type.is_file() {
                tracing::debug!("skipping non-regular entry {}", item.path().display());
                continue;
            }

            let Ok(relative) = item.path().strip_prefix(&self.root) else {
                continue;
            };
            let meta = item.metadata()?;
            let kind = if file_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            members.push(RawEntry {
                name: relative.to_string_lossy().into_owned(),
                kind,
                size: if kind == EntryKind::Directory { 0 } else { meta.len() },
                mode: unix_mode(&meta),
                modified: meta.modified().ok(),
                member: Member::Path(relative.to_path_buf()),
            });
        }
        Ok(members)
    }

    fn open(&mut self, member: &Member) -> Result<Box<dyn Read + '_>> {
        let Member::Path(relative) = member else {
            return Err(Error::ReadFailed {
                path: self.root.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "zip member index in a directory tree"),
            });
        };
        let path = self.root.join(relative);
        let file = File::open(&path).map_err(|e| Error::ReadFailed { path, source: e })?;
        Ok(Box::new(file))
    }
}

#[cfg(unix)]
fn unix_mode(meta: &std::fs::Metadata) -> Option<u32> {
    use std::os::unix::fs::PermissionsExt;
    Some(meta.permissions().mode())
}

#[cfg(not(unix))]
fn unix_mode(_meta: &std::fs::Metadata) -> Option<u32> { None }
