use std::io;
use std::path::PathBuf;
use std::sync::Arc;

/// Why a candidate install directory was refused.
#[derive(Debug, thiserror::Error)]
pub enum TargetError {
    #[error("'{path}' exists but is not a directory")]
    NotADirectory { path: PathBuf },

    #[error("'{path}' is not writable")]
    NotWritable { path: PathBuf },

    #[error("cannot use '{path}' as install directory: {source}")]
    Other { path: PathBuf, source: io::Error },
}

impl TargetError {
    /// Stable key a frontend can look its translated message up by.
    pub fn key(&self) -> &'static str {
        match self {
            Self::NotADirectory { .. } => "path_err_not_dir",
            Self::NotWritable { .. } => "path_err_not_writable",
            Self::Other { .. } => "path_err_other",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("hook script '{script}' could not be started: {source}")]
    Spawn { script: PathBuf, source: io::Error },

    #[error("hook script '{script}' exited with {status}: {stderr}")]
    ScriptFailed {
        script: PathBuf,
        status: String,
        stderr: String,
    },

    #[error("failed to write '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error(transparent)]
    Fs(#[from] unbox_fs::Error),

    #[error("no home directory to place '{what}' in")]
    NoHome { what: &'static str },
}

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("not enough free space: {required} bytes required, {available} available")]
    InsufficientSpace { required: u64, available: i64 },

    #[error(transparent)]
    Archive(#[from] unbox_archive::Error),

    #[error("failed to install '{path}': {source}")]
    FileCopyFailed {
        path: PathBuf,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("failed to create install directory: {0}")]
    CreateTarget(#[source] unbox_fs::Error),

    #[error("no install directory selected")]
    NoTarget,

    #[error("an install is already running")]
    AlreadyRunning,

    #[error("installer already failed: {0}")]
    AlreadyFailed(Arc<InstallError>),

    #[error("failed to start install thread: {0}")]
    Spawn(#[source] io::Error),

    #[error("hook '{name}' failed: {source}")]
    Hook { name: &'static str, source: HookError },

    #[error("install loop stopped unexpectedly")]
    Interrupted,

    #[error("no start command configured")]
    NoStartCommand,

    #[error("failed to run '{command}': {source}")]
    Exec { command: PathBuf, source: io::Error },

    /// An error that was also recorded as the installer's last error.
    #[error(transparent)]
    Recorded(Arc<InstallError>),
}

impl InstallError {
    /// The underlying error, looking through recorded copies.
    pub fn root(&self) -> &InstallError {
        match self {
            Self::Recorded(inner) | Self::AlreadyFailed(inner) => inner.root(),
            other => other,
        }
    }
}

/// The installer configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
#[error("invalid installer configuration: {0}")]
pub struct ConfigError(#[from] figment::Error);

pub type Result<T> = std::result::Result<T, InstallError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_error_keys() {
        let path = PathBuf::from("/x");
        assert_eq!(TargetError::NotADirectory { path: path.clone() }.key(), "path_err_not_dir");
        assert_eq!(TargetError::NotWritable { path: path.clone() }.key(), "path_err_not_writable");
        let other = TargetError::Other {
            path,
            source: io::Error::other("stat failed"),
        };
        assert_eq!(other.key(), "path_err_other");
    }

    #[test]
    fn copy_failure_names_path() {
        let err = InstallError::FileCopyFailed {
            path: PathBuf::from("/opt/app/bin/tool"),
            source: Box::new(io::Error::other("disk full")),
        };
        assert_eq!(err.to_string(), "failed to install '/opt/app/bin/tool': disk full");
    }
}
