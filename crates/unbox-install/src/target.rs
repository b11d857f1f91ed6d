use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::TargetError;

/// An install directory that passed [`validate`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidTarget {
    path:     PathBuf,
    ancestor: PathBuf,
}

impl ValidTarget {
    /// Normalized, absolute install directory.
    pub fn path(&self) -> &Path { &self.path }

    /// Nearest ancestor (or the directory itself) that existed at validation
    /// time. Free space is reported for its filesystem.
    pub fn existing_ancestor(&self) -> &Path { &self.ancestor }

    /// Whether the install directory itself already existed.
    pub fn exists(&self) -> bool { self.path == self.ancestor }

    /// Free bytes on the target filesystem, `-1` when unknown.
    pub fn available_bytes(&self) -> i64 { unbox_fs::available_bytes(&self.ancestor) }

    pub fn has_room_for(&self, total_bytes: u64) -> bool { sufficient_space(total_bytes, self.available_bytes()) }
}

/// `total_bytes` fits when it is strictly below the available space. An
/// unknown amount of space (`-1`) never fits.
pub fn sufficient_space(total_bytes: u64, available: i64) -> bool {
    u64::try_from(available).is_ok_and(|available| total_bytes < available)
}

/// Check that `path` can be used as install directory.
///
/// Relative paths are resolved against the current directory. The path and
/// its ancestors are walked upward until one exists; that one must be a
/// directory the current user can write to.
pub fn validate(path: &Path) -> Result<ValidTarget, TargetError> {
    let absolute = std::path::absolute(path).map_err(|e| TargetError::Other {
        path: path.to_path_buf(),
        source: e,
    })?;
    let normalized = normalize(&absolute);

    for candidate in normalized.ancestors() {
        match std::fs::metadata(candidate) {
            Ok(meta) if !meta.is_dir() => {
                return Err(TargetError::NotADirectory {
                    path: candidate.to_path_buf(),
                });
            }
            Ok(_) if !unbox_fs::is_writable(candidate) => {
                return Err(TargetError::NotWritable {
                    path: candidate.to_path_buf(),
                });
            }
            Ok(_) => {
                tracing::debug!(
                    "install target {} resolves to existing {}",
                    normalized.display(),
                    candidate.display()
                );
                return Ok(ValidTarget {
                    ancestor: candidate.to_path_buf(),
                    path:     normalized.clone(),
                });
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => continue,
            Err(e) => {
                return Err(TargetError::Other {
                    path: candidate.to_path_buf(),
                    source: e,
                });
            }
        }
    }

    Err(TargetError::Other {
        path: normalized,
        source: io::Error::new(io::ErrorKind::NotFound, "no existing ancestor"),
    })
}

fn normalize(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::CurDir => {}
            other => result.push(other.as_os_str()),
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn existing_directory_is_its_own_ancestor() {
        let dir = tempdir().unwrap();
        let target = validate(dir.path()).unwrap();
        assert!(target.exists());
        assert_eq!(target.existing_ancestor(), target.path());
    }

    #[test]
    fn missing_directory_resolves_to_nearest_ancestor() {
        let dir = tempdir().unwrap();
        let wanted = dir.path().join("a/b/c");
        let target = validate(&wanted).unwrap();

        assert!(!target.exists());
        assert_eq!(target.path(), wanted.as_path());
        assert_eq!(target.existing_ancestor(), dir.path());
    }

    #[test]
    fn dot_dot_is_normalized() {
        let dir = tempdir().unwrap();
        let target = validate(&dir.path().join("x/../y")).unwrap();
        assert_eq!(target.path(), dir.path().join("y").as_path());
    }

    #[test]
    fn file_in_the_way_is_not_a_directory() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("file");
        std::fs::write(&file, "x").unwrap();

        let err = validate(&file.join("sub")).unwrap_err();
        assert_eq!(err.key(), "path_err_not_dir");
        assert!(matches!(err, TargetError::NotADirectory { path } if path == file));
    }

    #[cfg(unix)]
    #[test]
    fn read_only_ancestor_is_not_writable() {
        use std::os::unix::fs::PermissionsExt;

        if unbox_fs::is_privileged() {
            // root bypasses permission bits
            return;
        }
        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        std::fs::create_dir(&locked).unwrap();
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o555)).unwrap();

        let err = validate(&locked.join("app")).unwrap_err();
        assert_eq!(err.key(), "path_err_not_writable");

        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[test]
    fn space_is_strictly_greater() {
        assert!(sufficient_space(99, 100));
        assert!(!sufficient_space(100, 100));
        assert!(!sufficient_space(101, 100));
        assert!(!sufficient_space(0, -1));
        assert!(sufficient_space(0, 1));
        assert!(!sufficient_space(0, 0));
    }

    #[test]
    fn real_filesystem_space_query() {
        let dir = tempdir().unwrap();
        let target = validate(dir.path()).unwrap();
        assert!(target.available_bytes() > 0);
        assert!(target.has_room_for(0));
        assert!(!target.has_room_for(u64::MAX));
    }
}
