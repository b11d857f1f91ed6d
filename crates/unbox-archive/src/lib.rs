//! Archive inventory with path sanitization.
//!
//! # Architecture
//!
//! - `sanitize.rs` - Member path sanitization (zip-slip prevention)
//! - `format.rs` - Format detection
//! - `source/` - Zip and directory tree readers
//! - `inventory.rs` - Cached, ordered entry list and bundle staging
//! - `entry.rs` - Shared entry types

pub use entry::{Entry, EntryKind, Member, Origin};
pub use error::{Error, Result};
pub use format::{ArchiveFormat, detect_format, detect_path};
pub use inventory::Inventory;
pub use sanitize::{SANDBOX_ROOT, sanitize_member, strip_subdir};
pub use source::{DirSource, RawEntry, Source, ZipSource, open_path};

pub mod entry;
mod error;
mod format;
mod inventory;
mod sanitize;
pub mod source;
