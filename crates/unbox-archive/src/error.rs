use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open archive '{path}': {source}")]
    ArchiveOpenFailed { path: PathBuf, source: io::Error },

    #[error("unsupported archive format: '{path}'")]
    UnsupportedFormat { path: PathBuf },

    #[error("archive is corrupted: {source}")]
    Corrupted {
        #[from]
        source: zip::result::ZipError,
    },

    #[error("failed to read '{path}': {source}")]
    ReadFailed { path: PathBuf, source: io::Error },

    #[error("failed to walk directory tree: {source}")]
    WalkFailed {
        #[from]
        source: walkdir::Error,
    },

    #[error("failed to stage bundled archive: {source}")]
    StagingFailed { source: io::Error },

    #[error("member '{path}' belongs to a released source")]
    SourceReleased { path: PathBuf },
}

pub type Result<T> = std::result::Result<T, Error>;
