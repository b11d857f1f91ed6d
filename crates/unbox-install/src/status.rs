use std::path::{Path, PathBuf};

use unbox_archive::Entry;

/// Install engine lifecycle.
///
/// `Idle → Preparing → Copying → {Completed | Aborting → RolledBack | Failed}`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum State {
    #[default]
    Idle,
    Preparing,
    Copying,
    Aborting,
    Completed,
    Failed,
    RolledBack,
}

impl State {
    pub fn is_terminal(self) -> bool { matches!(self, Self::Completed | Self::Failed | Self::RolledBack) }
}

/// An archive entry bound to its location in the install target.
#[derive(Clone, Debug)]
pub struct InstallEntry {
    pub entry:        Entry,
    pub target:       PathBuf,
    pub installed:    bool,
    /// Directory entries only: the directory was already there, so rollback
    /// leaves it in place.
    pub pre_existing: bool,
}

impl InstallEntry {
    pub(crate) fn new(entry: Entry) -> Self {
        Self {
            entry,
            target: PathBuf::new(),
            installed: false,
            pre_existing: false,
        }
    }

    pub fn relative_path(&self) -> &Path { &self.entry.path }

    pub fn is_directory(&self) -> bool { self.entry.is_directory() }

    pub fn size(&self) -> u64 { self.entry.size }
}

/// Snapshot emitted at every step of an install or rollback.
///
/// `Status::default()` is the neutral status a poller gets when nothing new
/// happened.
#[derive(Clone, Debug, Default)]
pub struct Status {
    pub current: Option<InstallEntry>,
    pub done:    bool,
    pub aborted: bool,
    pub state:   State,
}

impl Status {
    pub(crate) fn entry(state: State, entry: InstallEntry) -> Self {
        Self {
            current: Some(entry),
            done: false,
            aborted: state == State::Aborting,
            state,
        }
    }

    pub(crate) fn finished(state: State) -> Self {
        Self {
            current: None,
            done: matches!(state, State::Completed | State::RolledBack),
            aborted: matches!(state, State::Aborting | State::RolledBack),
            state,
        }
    }

    pub fn is_neutral(&self) -> bool {
        self.current.is_none() && !self.done && !self.aborted && self.state == State::Idle
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states() {
        assert!(State::Completed.is_terminal());
        assert!(State::Failed.is_terminal());
        assert!(State::RolledBack.is_terminal());
        assert!(!State::Aborting.is_terminal());
        assert!(!State::Copying.is_terminal());
        assert!(!State::Idle.is_terminal());
    }

    #[test]
    fn default_status_is_neutral() {
        assert!(Status::default().is_neutral());
        assert!(!Status::finished(State::Completed).is_neutral());
    }

    #[test]
    fn finished_flags() {
        let done = Status::finished(State::Completed);
        assert!(done.done && !done.aborted);

        let rolled_back = Status::finished(State::RolledBack);
        assert!(rolled_back.done && rolled_back.aborted);

        let aborted = Status::finished(State::Aborting);
        assert!(!aborted.done && aborted.aborted);

        let failed = Status::finished(State::Failed);
        assert!(!failed.done && !failed.aborted);
    }
}
