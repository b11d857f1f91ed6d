use unbox_fs::{remove_empty_dirs, remove_entry};

use super::{Installer, lock, read, write};
use crate::status::{State, Status};

impl Installer {
    /// Abort the copy loop and undo everything it installed.
    ///
    /// Files reported by hooks go first. Entries are then removed in reverse
    /// install order, one at a time: files are deleted, directories only when
    /// empty and only when the installer created them. Directories created
    /// implicitly go last, deepest first.
    /// The target is never removed recursively. Failures are logged and
    /// skipped. Valid from any state.
    pub fn rollback(&self) {
        self.abort();

        let shared = &self.shared;
        let _action = lock(&shared.inventory);
        shared.set_state(State::Aborting);
        tracing::info!("rolling back install");

        let artifacts = std::mem::take(&mut write(&shared.session).artifacts);
        for artifact in artifacts.iter().rev() {
            match remove_entry(artifact) {
                Ok(true) => tracing::info!("rolled back {}", artifact.display()),
                Ok(false) => {}
                Err(e) => tracing::warn!("rollback: {}", e),
            }
        }

        let count = read(&shared.session).entries.len();
        let mut removed = 0usize;
        for index in (0..count).rev() {
            let item = read(&shared.session).entries[index].clone();
            if !item.installed {
                continue;
            }
            shared.emit(Status::entry(State::Aborting, item.clone()));

            if item.is_directory() && item.pre_existing {
                tracing::debug!("keeping pre-existing directory {}", item.target.display());
            } else {
                match remove_entry(&item.target) {
                    Ok(_) => {
                        removed += 1;
                        tracing::info!("rolled back {}", item.target.display());
                    }
                    Err(e) => tracing::warn!("rollback: {}", e),
                }
            }

            let mut session = write(&shared.session);
            let slot = &mut session.entries[index];
            slot.installed = false;
            slot.pre_existing = false;
            if !item.is_directory() {
                session.copied_bytes = session.copied_bytes.saturating_sub(item.size());
            }
        }

        let scaffold = std::mem::take(&mut write(&shared.session).scaffold);
        let pruned = remove_empty_dirs(&scaffold);
        tracing::info!("rollback removed {} entries and {} directories", removed, pruned);

        shared.cancel.clear();
        write(&shared.session).done = true;
        shared.set_state(State::RolledBack);
        shared.emit(Status::finished(State::RolledBack));
    }
}
