use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use unbox_install::{DEFAULT_POLL_WAIT, Installer, State};

use crate::tracker::InstallTracker;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Installed,
    Cancelled,
    Failed,
}

impl Outcome {
    pub fn exit_code(self) -> ExitCode {
        match self {
            Self::Installed => ExitCode::SUCCESS,
            Self::Cancelled | Self::Failed => ExitCode::FAILURE,
        }
    }
}

/// A user interface driving one install.
pub trait Frontend {
    fn present(&self, installer: &Installer) -> Outcome;
}

/// Installs into a fixed directory, reporting on the terminal.
///
/// A raised cancellation flag (Ctrl-C) rolls the install back, or stops it
/// before anything is copied.
#[derive(Clone, Debug)]
pub struct CliFrontend {
    target:        PathBuf,
    show_progress: bool,
}

impl CliFrontend {
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target:        target.into(),
            show_progress: true,
        }
    }

    pub fn quiet(mut self) -> Self {
        self.show_progress = false;
        self
    }

    fn run(&self, installer: &Installer) -> Result<Outcome> {
        let target = installer
            .set_target(&self.target)
            .with_context(|| format!("Cannot install into {}", self.target.display()))?;
        installer.check_space()?;

        let total = installer.total_bytes()?;
        let dir = target.path().display();
        match installer.space_string() {
            Some(space) => println!("Installing {} into {} ({} free)", installer.size_string(), dir, space),
            None => println!("Installing {} into {}", installer.size_string(), dir),
        }

        installer.pre_install()?;
        if installer.canceller().is_cancelled() {
            installer.rollback();
            println!("Installation cancelled before copying");
            return Ok(Outcome::Cancelled);
        }
        installer.start_install()?;

        let tracker = if self.show_progress {
            InstallTracker::new(total)
        } else {
            InstallTracker::hidden(total)
        };
        let state = loop {
            let status = installer.status(DEFAULT_POLL_WAIT);
            let current = status.current.map(|e| e.relative_path().display().to_string());
            tracker.update(installer.copied_bytes(), current);

            match installer.state() {
                state if state.is_terminal() => break state,
                State::Aborting if !installer.is_running() => {
                    log::info!("install interrupted, rolling back");
                    installer.rollback();
                    break installer.state();
                }
                _ => {}
            }
        };

        match state {
            State::Completed => {
                tracker.finish("done");
                if let Err(e) = installer.post_install() {
                    installer.rollback();
                    return Err(e).context("Post-install step failed, installation was rolled back");
                }
                println!("Installed to {}", dir);
                Ok(Outcome::Installed)
            }
            State::RolledBack => {
                tracker.abandon("cancelled");
                println!("Installation cancelled, changes were rolled back");
                Ok(Outcome::Cancelled)
            }
            _ => {
                tracker.abandon("failed");
                installer.rollback();
                let err = match installer.error() {
                    Some(err) => anyhow::Error::new(err),
                    None => anyhow!("install stopped in state {:?}", state),
                };
                Err(err.context("Installation failed, changes were rolled back"))
            }
        }
    }
}

impl Frontend for CliFrontend {
    fn present(&self, installer: &Installer) -> Outcome {
        match self.run(installer) {
            Ok(outcome) => outcome,
            Err(e) => {
                log::error!("{:#}", e);
                eprintln!("Error: {:#}", e);
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};
    use unbox_archive::Inventory;
    use zip::write::SimpleFileOptions;

    fn installer(dir: &std::path::Path) -> Installer {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.add_directory("bin/", SimpleFileOptions::default()).unwrap();
        writer.start_file("bin/studio", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"#!/bin/sh\n").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let archive = dir.join("payload.zip");
        std::fs::write(&archive, bytes).unwrap();
        Installer::new(Inventory::open(&archive).unwrap())
    }

    #[test]
    fn installs_into_target() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("studio");

        let outcome = CliFrontend::new(&target).quiet().present(&installer(temp_dir.path()));

        assert_eq!(outcome, Outcome::Installed);
        assert!(target.join("bin/studio").is_file());
    }

    #[test]
    fn rejected_target_fails_without_copying() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("taken");
        std::fs::write(&target, "a file").unwrap();

        let installer = installer(temp_dir.path());
        let outcome = CliFrontend::new(&target).quiet().present(&installer);

        assert_eq!(outcome, Outcome::Failed);
        assert_eq!(installer.state(), State::Idle);
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "a file");
    }

    #[test]
    fn cancelled_before_start_installs_nothing() {
        let temp_dir = tempfile::tempdir().unwrap();
        let target = temp_dir.path().join("studio");
        let installer = installer(temp_dir.path());
        installer.canceller().cancel();

        let outcome = CliFrontend::new(&target).quiet().present(&installer);

        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(installer.state(), State::RolledBack);
        assert!(!target.exists());
    }
}
