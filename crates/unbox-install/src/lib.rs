//! Install engine: target validation, a cancellable background copy loop
//! with rollback, progress reporting and post-install actions.
//!
//! # Architecture
//!
//! - `target.rs` - Install directory validation and free-space policy
//! - `engine/` - The `Installer`: copy loop, cancellation, rollback
//! - `progress.rs` - Single-slot, lossy status channel
//! - `status.rs` - States and per-entry status values
//! - `hooks.rs` - Pre/post-install hook trait
//! - `post/` - Stock hooks: scripts, launcher entry, uninstaller
//! - `config.rs` - Installer configuration and variable templates
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use unbox_archive::Inventory;
//! use unbox_install::{Installer, State};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let installer = Installer::new(Inventory::open(Path::new("payload.zip"))?);
//! installer.set_target("/opt/studio")?;
//! installer.check_space()?;
//! installer.pre_install()?;
//! installer.start_install()?;
//! if installer.wait_for_done() == State::Completed {
//!     installer.post_install()?;
//! }
//! # Ok(())
//! # }
//! ```

pub use config::{CONFIG_FILE_NAME, ENV_PREFIX, InstallerConfig, expand_variables};
pub use engine::{Canceller, Installer, ProgressFn};
pub use error::{ConfigError, HookError, InstallError, Result, TargetError};
pub use hooks::{HookContext, InstallHook, InstalledItem};
pub use progress::{DEFAULT_POLL_WAIT, DEFAULT_PUSH_WAIT, Reporter};
pub use size::format_size;
pub use status::{InstallEntry, State, Status};
pub use target::{ValidTarget, sufficient_space, validate};

mod config;
mod engine;
mod error;
pub mod hooks;
pub mod post;
mod progress;
mod size;
mod status;
mod target;
