use std::path::Path;

use unbox_archive::Inventory;
use unbox_fs::{create_dir_tracked, set_modified, write_file};

use super::{Shared, lock, read, write};
use crate::error::{InstallError, Result};
use crate::status::{InstallEntry, State, Status};
use crate::target::ValidTarget;

enum Outcome {
    Completed,
    Aborted,
}

/// Ends a run however the loop exits: clears the running flag, turns a panic
/// into a recorded failure and releases anyone waiting in `abort`.
struct RunGuard<'a> {
    shared: &'a Shared,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        write(&self.shared.session).running = false;
        if std::thread::panicking() {
            self.shared.fail(InstallError::Interrupted);
        }
        self.shared.cancel.acknowledge();
    }
}

fn copy_failed(path: &Path, source: impl std::error::Error + Send + Sync + 'static) -> InstallError {
    InstallError::FileCopyFailed {
        path:   path.to_path_buf(),
        source: Box::new(source),
    }
}

impl Shared {
    pub(super) fn run_install(&self, target: ValidTarget) {
        let _guard = RunGuard { shared: self };
        let mut inventory = lock(&self.inventory);

        match self.copy_all(&mut inventory, &target) {
            Ok(Outcome::Completed) => {
                if let Err(e) = inventory.release_staging() {
                    tracing::warn!("failed to remove staging directory: {}", e);
                }
                write(&self.session).done = true;
                tracing::info!("install to {} completed", target.path().display());
                self.set_state(State::Completed);
                self.emit(Status::finished(State::Completed));
            }
            Ok(Outcome::Aborted) => {}
            Err(err) => {
                self.fail(err);
            }
        }
    }

    fn copy_all(&self, inventory: &mut Inventory, target: &ValidTarget) -> Result<Outcome> {
        self.populate(inventory)?;

        let created = create_dir_tracked(target.path()).map_err(InstallError::CreateTarget)?;
        self.track_scaffold(created);

        let count = {
            let mut session = write(&self.session);
            for item in session.entries.iter_mut().filter(|e| !e.installed) {
                item.target = target.path().join(&item.entry.path);
            }
            session.entries.len()
        };
        self.set_state(State::Copying);

        for index in 0..count {
            if self.cancel.is_requested() {
                self.cancel.clear();
                tracing::info!("install stopped before entry {} of {}", index, count);
                self.set_state(State::Aborting);
                self.emit(Status::finished(State::Aborting));
                return Ok(Outcome::Aborted);
            }

            let item = read(&self.session).entries[index].clone();
            if item.installed {
                continue;
            }
            self.emit(Status::entry(State::Copying, item.clone()));
            tracing::info!("installing {}", item.target.display());

            let pre_existing = if item.is_directory() {
                self.install_directory(&item)?
            } else {
                self.install_file(inventory, &item)?;
                false
            };

            let mut session = write(&self.session);
            let slot = &mut session.entries[index];
            slot.installed = true;
            slot.pre_existing = pre_existing;
            if !item.is_directory() {
                session.copied_bytes += item.size();
            }
        }

        Ok(Outcome::Completed)
    }

    /// Returns whether the directory was already there.
    fn install_directory(&self, item: &InstallEntry) -> Result<bool> {
        let mut created = create_dir_tracked(&item.target).map_err(|e| copy_failed(&item.target, e))?;
        let made_here = created.last().is_some_and(|dir| dir == &item.target);
        if made_here {
            created.pop();
        }
        self.track_scaffold(created);

        if made_here {
            if let Err(e) = item.entry.file_mode().apply_to_path(&item.target) {
                tracing::warn!("{}", e);
            }
        }
        Ok(!made_here)
    }

    fn install_file(&self, inventory: &mut Inventory, item: &InstallEntry) -> Result<()> {
        let path = item.target.as_path();
        if let Some(parent) = path.parent() {
            let created = create_dir_tracked(parent).map_err(|e| copy_failed(path, e))?;
            self.track_scaffold(created);
        }

        let mut reader = inventory.open_entry(&item.entry).map_err(|e| copy_failed(path, e))?;
        let existed = path.symlink_metadata().is_ok();
        if let Err(e) = write_file(&mut reader, path, item.entry.file_mode()) {
            drop(reader);
            // never marked installed, rollback does not see it; only a file
            // this call created is ours to remove
            if !existed && !e.is_open_failure() {
                if let Err(cleanup) = unbox_fs::remove_entry(path) {
                    tracing::debug!("could not remove partial file: {}", cleanup);
                }
            }
            return Err(copy_failed(path, e));
        }
        drop(reader);

        if let Some(modified) = item.entry.modified {
            set_modified(path, modified).map_err(|e| copy_failed(path, e))?;
        }
        Ok(())
    }
}
