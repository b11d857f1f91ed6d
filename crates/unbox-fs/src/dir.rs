use crate::{Error, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Create `path` and any missing ancestors, returning the directories that
/// did not exist before, shallowest first.
///
/// An empty result means `path` already existed. The caller owns the returned
/// list and is responsible for undoing it, see [`remove_empty_dirs`].
pub fn create_dir_tracked(path: &Path) -> Result<Vec<PathBuf>> {
    let mut missing = Vec::new();
    let mut cursor = Some(path);
    while let Some(dir) = cursor {
        if dir.as_os_str().is_empty() || dir.is_dir() {
            break;
        }
        missing.push(dir.to_path_buf());
        cursor = dir.parent();
    }
    missing.reverse();

    let mut created = Vec::with_capacity(missing.len());
    for dir in missing {
        match std::fs::create_dir(&dir) {
            Ok(()) => created.push(dir),
            // lost a race with another writer, the directory is not ours
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && dir.is_dir() => {}
            Err(e) => {
                return Err(Error::CreateDir {
                    path: dir,
                    source: e,
                });
            }
        }
    }
    Ok(created)
}

/// Remove a single file or an empty directory.
///
/// Never recursive. Returns `false` when nothing existed at `path`.
pub fn remove_entry(path: &Path) -> Result<bool> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => {
            return Err(Error::Remove {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    let result = if meta.is_dir() {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    };

    match result {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::Remove {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Remove every directory in `dirs` that is empty, deepest first.
///
/// Non-empty or already missing directories are left alone. Returns the
/// number of directories removed.
pub fn remove_empty_dirs<P: AsRef<Path>>(dirs: &[P]) -> usize {
    let mut ordered: Vec<&Path> = dirs.iter().map(AsRef::as_ref).collect();
    ordered.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    let mut removed = 0;
    for dir in ordered {
        match std::fs::remove_dir(dir) {
            Ok(()) => removed += 1,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => tracing::debug!("keeping {}: {}", dir.display(), e),
        }
    }
    removed
}

/// Set the modification time of `path`, leaving the access time untouched.
pub fn set_modified(path: &Path, time: SystemTime) -> Result<()> {
    let mtime = filetime::FileTime::from_system_time(time);
    filetime::set_file_mtime(path, mtime).map_err(|e| Error::Timestamp {
        path: path.to_path_buf(),
        source: e,
    })
}
