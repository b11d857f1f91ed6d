use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to create directory '{path}': {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("failed to open '{path}' for writing: {source}")]
    Open { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to remove '{path}': {source}")]
    Remove { path: PathBuf, source: io::Error },

    #[error("failed to set permissions on '{path}': {source}")]
    Permissions { path: PathBuf, source: io::Error },

    #[error("failed to set modification time on '{path}': {source}")]
    Timestamp { path: PathBuf, source: io::Error },
}

impl Error {
    /// Path the failed operation was acting on.
    pub fn path(&self) -> &Path {
        match self {
            Self::CreateDir { path, .. }
            | Self::Open { path, .. }
            | Self::Write { path, .. }
            | Self::Remove { path, .. }
            | Self::Permissions { path, .. }
            | Self::Timestamp { path, .. } => path,
        }
    }

    /// The file was never opened, so nothing at the path was touched.
    pub fn is_open_failure(&self) -> bool { matches!(self, Self::Open { .. }) }

    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::CreateDir { source, .. }
            | Self::Open { source, .. }
            | Self::Write { source, .. }
            | Self::Remove { source, .. }
            | Self::Permissions { source, .. }
            | Self::Timestamp { source, .. } => source.kind(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
