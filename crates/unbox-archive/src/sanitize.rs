use std::path::{Component, Path, PathBuf};

/// Placeholder root every member path is resolved against before it is
/// accepted. Members that do not land strictly inside it are unsafe.
pub const SANDBOX_ROOT: &str = "/some/dir";

/// Sanitize a raw archive member name into a safe relative path.
///
/// Backslashes are treated as separators, `.` components are dropped and
/// `..` pops the previous component. Absolute names, names that resolve
/// outside [`SANDBOX_ROOT`] and names that resolve to the root itself yield
/// `None`.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use unbox_archive::sanitize_member;
///
/// assert_eq!(sanitize_member("bin/./tool").unwrap(), Path::new("bin/tool"));
/// assert!(sanitize_member("../../etc/passwd").is_none());
/// ```
pub fn sanitize_member(name: &str) -> Option<PathBuf> {
    let unified = name.replace('\\', "/");
    if is_absolute_name(&unified) {
        return None;
    }

    let root = Path::new(SANDBOX_ROOT);
    let resolved = normalize_path(&root.join(&unified));
    if !resolved.starts_with(root) {
        return None;
    }

    let relative = resolved.strip_prefix(root).ok()?;
    if relative.as_os_str().is_empty() {
        return None;
    }
    Some(relative.to_path_buf())
}

/// Re-root a sanitized path relative to `prefix`.
///
/// Paths outside the prefix and the prefix itself yield `None`.
pub fn strip_subdir(path: &Path, prefix: &Path) -> Option<PathBuf> {
    let rest = path.strip_prefix(prefix).ok()?;
    if rest.as_os_str().is_empty() {
        return None;
    }
    Some(rest.to_path_buf())
}

/// Unix roots, UNC shares and drive letters all count as absolute, whatever
/// platform the archive was built on.
fn is_absolute_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    name.starts_with('/') || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':')
}

/// Resolve `.` and `..` lexically. Never touches the filesystem.
fn normalize_path(path: &Path) -> PathBuf {
    let mut result = PathBuf::new();

    for component in path.components() {
        match component {
            Component::ParentDir => {
                result.pop();
            }
            Component::Normal(part) => result.push(part),
            Component::RootDir => result.push(Component::RootDir.as_os_str()),
            Component::Prefix(prefix) => result.push(prefix.as_os_str()),
            Component::CurDir => {}
        }
    }

    result
}
