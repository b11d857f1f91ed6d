use std::path::{Path, PathBuf};
use std::time::SystemTime;

use unbox_fs::FileMode;

/// Where the bytes of an entry live.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    /// Index of the source inside its [`Inventory`](crate::Inventory).
    pub source: usize,
    pub member: Member,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Member {
    /// Position in the zip central directory.
    ZipIndex(usize),
    /// Path relative to the root of a directory tree.
    Path(PathBuf),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One archive member that passed sanitization.
#[derive(Clone, Debug)]
pub struct Entry {
    pub path:     PathBuf,
    pub kind:     EntryKind,
    pub size:     u64,
    pub mode:     Option<u32>,
    pub modified: Option<SystemTime>,
    pub origin:   Origin,
}

impl Entry {
    pub fn file(path: impl Into<PathBuf>, size: u64, origin: Origin) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
            size,
            mode: None,
            modified: None,
            origin,
        }
    }

    pub fn directory(path: impl Into<PathBuf>, origin: Origin) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
            size: 0,
            mode: None,
            modified: None,
            origin,
        }
    }

    pub fn with_mode(mut self, mode: u32) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn with_modified(mut self, modified: SystemTime) -> Self {
        self.modified = Some(modified);
        self
    }

    pub fn relative_path(&self) -> &Path { &self.path }

    pub fn is_file(&self) -> bool { matches!(self.kind, EntryKind::File) }

    pub fn is_directory(&self) -> bool { matches!(self.kind, EntryKind::Directory) }

    /// Mode to create the entry with, owner read/write always included.
    pub fn file_mode(&self) -> FileMode { FileMode::from_archive(self.mode, self.is_directory()) }
}
