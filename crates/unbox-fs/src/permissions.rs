use crate::{Error, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Owner read and write bits. Every installed file carries them, whatever the
/// archive says, so the installing user can always update or remove it later.
pub const OWNER_READ_WRITE: u32 = 0o600;

/// Mode used for files whose archive record carries no permission bits.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Mode used for directories whose archive record carries no permission bits.
pub const DEFAULT_DIR_MODE: u32 = 0o755;

const PERMISSION_BITS: u32 = 0o7777;

/// Permission bits for an installed file or directory.
///
/// Built from the raw mode an archive records for a member. File type bits
/// (`S_IFREG`, `S_IFDIR`, ...) are masked off and owner read/write is forced on.
///
/// # Platform Behavior
///
/// **Unix**: the bits are passed to `open(2)` on creation and to `chmod(2)`
/// through [`FileMode::apply_to_path`].
///
/// **Windows**: only the owner write bit is meaningful and it is always set, so
/// applying a mode clears the `readonly` attribute and nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FileMode(u32);

impl Default for FileMode {
    fn default() -> Self {
        Self(DEFAULT_FILE_MODE)
    }
}

impl From<u32> for FileMode {
    fn from(mode: u32) -> Self {
        Self((mode & PERMISSION_BITS) | OWNER_READ_WRITE)
    }
}

impl FileMode {
    /// Mode for an archive member, falling back to the defaults when the
    /// archive does not record one. Directories always keep owner `rwx`.
    ///
    /// # Examples
    /// ```
    /// use unbox_fs::FileMode;
    ///
    /// assert_eq!(FileMode::from_archive(Some(0o100444), false).bits(), 0o644);
    /// assert_eq!(FileMode::from_archive(None, true).bits(), 0o755);
    /// ```
    pub fn from_archive(mode: Option<u32>, is_dir: bool) -> Self {
        match (mode, is_dir) {
            // a directory the owner cannot enter cannot be filled or emptied
            (Some(mode), true) => Self::from(mode | 0o700),
            (Some(mode), false) => Self::from(mode),
            (None, true) => Self::from(DEFAULT_DIR_MODE),
            (None, false) => Self::from(DEFAULT_FILE_MODE),
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    /// Open `path` for writing with create + truncate semantics.
    ///
    /// On Unix the mode is handed to the kernel at creation time, so a freshly
    /// created file never exists with broader permissions than requested. An
    /// existing file keeps its permission bits.
    pub fn create(self, path: &Path) -> Result<File> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(self.0);
        }

        options.open(path).map_err(|e| Error::Open {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Apply the mode to an existing file or directory.
    pub fn apply_to_path(self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(self.0);
            std::fs::set_permissions(path, perms).map_err(|e| Error::Permissions {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        #[cfg(windows)]
        {
            let mut perms = std::fs::metadata(path)
                .map_err(|e| Error::Permissions {
                    path: path.to_path_buf(),
                    source: e,
                })?
                .permissions();
            perms.set_readonly(false);
            std::fs::set_permissions(path, perms).map_err(|e| Error::Permissions {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_read_write_is_forced() {
        assert_eq!(FileMode::from(0o444).bits(), 0o644);
        assert_eq!(FileMode::from(0o000).bits(), 0o600);
        assert_eq!(FileMode::from(0o755).bits(), 0o755);
    }

    #[test]
    fn file_type_bits_are_masked() {
        assert_eq!(FileMode::from(0o100755).bits(), 0o755);
        assert_eq!(FileMode::from(0o040700).bits(), 0o700);
    }

    #[test]
    fn archive_defaults() {
        assert_eq!(FileMode::from_archive(None, false).bits(), DEFAULT_FILE_MODE);
        assert_eq!(FileMode::from_archive(None, true).bits(), DEFAULT_DIR_MODE);
        assert_eq!(FileMode::default().bits(), DEFAULT_FILE_MODE);
    }

    #[test]
    fn archive_directories_stay_traversable() {
        assert_eq!(FileMode::from_archive(Some(0o040500), true).bits(), 0o700);
        assert_eq!(FileMode::from_archive(Some(0o500), false).bits(), 0o700);
        assert_eq!(FileMode::from_archive(Some(0o400), false).bits(), 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn create_uses_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tool");
        drop(FileMode::from(0o700).create(&path).unwrap());
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);
    }

    #[cfg(unix)]
    #[test]
    fn apply_to_path_sets_bits() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("script.sh");
        std::fs::write(&path, "echo").unwrap();
        FileMode::from(0o750).apply_to_path(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o750);
    }
}
