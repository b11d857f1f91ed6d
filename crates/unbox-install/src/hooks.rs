//! Hook traits for the install lifecycle.
//!
//! Hooks run around the copy loop, never inside it. The frontend calls
//! [`Installer::pre_install`](crate::Installer::pre_install) before starting
//! the copy and [`Installer::post_install`](crate::Installer::post_install)
//! after it completed.

use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::error::HookError;

/// An installed file or directory, as handed to post-install hooks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstalledItem {
    pub path:   PathBuf,
    pub is_dir: bool,
}

/// Everything a hook can see and extend.
#[derive(Clone, Debug, Default)]
pub struct HookContext {
    pub target_dir:      PathBuf,
    /// Installed entries in reverse install order, so contents come before
    /// their directory.
    pub installed:       Vec<InstalledItem>,
    /// Installer variables plus `installDir`.
    pub variables:       BTreeMap<String, String>,
    pub create_launcher: bool,
    /// Files created by hooks outside the archive, e.g. a launcher entry.
    pub artifacts:       Vec<PathBuf>,
}

impl HookContext {
    pub fn variable(&self, key: &str) -> &str { self.variables.get(key).map_or("", String::as_str) }
}

/// Hook trait for install lifecycle events.
/// Implement this to add behavior before or after the copy loop.
pub trait InstallHook: Send + Sync {
    /// Name of this hook for error reporting.
    fn name(&self) -> &'static str;

    /// A failing required hook fails the install; others are only logged.
    fn required(&self) -> bool { false }

    /// Called before the copy loop starts.
    fn pre_install(&self, _ctx: &mut HookContext) -> Result<(), HookError> { Ok(()) }

    /// Called after the copy loop completed.
    fn post_install(&self, _ctx: &mut HookContext) -> Result<(), HookError> { Ok(()) }
}
