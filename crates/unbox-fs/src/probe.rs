//! Platform probes used to vet an install target.
//!
//! Both probes report failure through sentinel values instead of errors: a
//! target that cannot be probed is treated exactly like one that failed the
//! probe.

use std::path::Path;

/// Whether the current user may create entries inside `path`.
///
/// # Platform Behavior
///
/// **Unix**: `access(2)` with `W_OK`, which honours the effective uid and
/// read-only mounts.
///
/// **Windows**: there is no cheap equivalent, so a probe file is created inside
/// the directory and removed again.
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{AccessFlags, access};
        match access(path, AccessFlags::W_OK) {
            Ok(()) => true,
            Err(errno) => {
                tracing::debug!("{} is not writable: {}", path.display(), errno);
                false
            }
        }
    }

    #[cfg(not(unix))]
    {
        let probe = path.join(format!(".unbox-write-probe-{}", std::process::id()));
        match std::fs::OpenOptions::new().write(true).create_new(true).open(&probe) {
            Ok(file) => {
                drop(file);
                let _ = std::fs::remove_file(&probe);
                true
            }
            Err(e) => {
                tracing::debug!("{} is not writable: {}", path.display(), e);
                false
            }
        }
    }
}

/// Bytes available to an unprivileged user on the filesystem holding `path`.
///
/// Returns `-1` when the filesystem cannot be queried. Values beyond
/// `i64::MAX` saturate.
pub fn available_bytes(path: &Path) -> i64 {
    match fs2::available_space(path) {
        Ok(bytes) => i64::try_from(bytes).unwrap_or(i64::MAX),
        Err(e) => {
            tracing::warn!("cannot query free space of {}: {}", path.display(), e);
            -1
        }
    }
}

/// Whether the process runs with administrator rights.
pub fn is_privileged() -> bool {
    #[cfg(unix)]
    {
        nix::unistd::geteuid().is_root()
    }

    #[cfg(not(unix))]
    {
        false
    }
}
