//! Stock post-actions: hook scripts, launcher entry, uninstaller script.

mod launcher;
mod script;
mod uninstaller;

pub use launcher::{LauncherHook, desktop_entry, desktop_file_name};
pub use script::ScriptHook;
pub use uninstaller::{UninstallerHook, uninstall_script};
