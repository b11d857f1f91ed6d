//! The install engine.
//!
//! An [`Installer`] owns the archive [`Inventory`] and copies its entries into
//! a validated target directory on a background thread. Callers poll it for
//! progress, abort it, and roll partial or complete installs back.
//!
//! # Locking
//!
//! - the inventory mutex is the action lock: held by the copy loop for the
//!   whole install and by [`Installer::rollback`] for the whole rollback, so
//!   the two never interleave
//! - the session lock guards entries and counters and is only ever held for a
//!   single entry update, so queries never wait for a file copy
//! - the state mutex and the cancellation rendezvous have their own locks
//!
//! Locks are always taken in that order.

mod cancel;
mod copy;
mod rollback;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

pub use cancel::Canceller;
use cancel::Cancellation;
use unbox_archive::Inventory;

use crate::error::{InstallError, Result, TargetError};
use crate::hooks::{HookContext, InstallHook, InstalledItem};
use crate::progress::Reporter;
use crate::size::format_size;
use crate::status::{InstallEntry, State, Status};
use crate::target::{ValidTarget, sufficient_space, validate};

/// Synchronous progress observer, see [`Installer::set_progress_fn`].
pub type ProgressFn = dyn Fn(&Status) + Send + Sync;

#[derive(Debug)]
struct Session {
    target:          Option<ValidTarget>,
    entries:         Vec<InstallEntry>,
    scanned:         bool,
    total_bytes:     u64,
    copied_bytes:    u64,
    done:            bool,
    error:           Option<Arc<InstallError>>,
    create_launcher: bool,
    /// Directories created implicitly, removed after a rollback when empty.
    scaffold:        Vec<PathBuf>,
    /// Files hooks reported creating, removed first on rollback.
    artifacts:       Vec<PathBuf>,
    running:         bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            target:          None,
            entries:         Vec::new(),
            scanned:         false,
            total_bytes:     0,
            copied_bytes:    0,
            done:            false,
            error:           None,
            create_launcher: true,
            scaffold:        Vec::new(),
            artifacts:       Vec::new(),
            running:         false,
        }
    }
}

struct Shared {
    inventory:     Mutex<Inventory>,
    session:       RwLock<Session>,
    state:         Mutex<State>,
    state_changed: Condvar,
    cancel:        Arc<Cancellation>,
    reporter:      Reporter,
    observer:      RwLock<Option<Arc<ProgressFn>>>,
    hooks:         RwLock<Vec<Arc<dyn InstallHook>>>,
    variables:     RwLock<BTreeMap<String, String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> { mutex.lock().unwrap_or_else(PoisonError::into_inner) }

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> { lock.read().unwrap_or_else(PoisonError::into_inner) }

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> { lock.write().unwrap_or_else(PoisonError::into_inner) }

impl Shared {
    fn state(&self) -> State { *lock(&self.state) }

    fn set_state(&self, state: State) {
        let mut current = lock(&self.state);
        tracing::debug!("installer state {:?} -> {:?}", *current, state);
        *current = state;
        self.state_changed.notify_all();
    }

    /// Push `status` into the reporter slot and call the observer.
    fn emit(&self, status: Status) {
        let observer = read(&self.observer).clone();
        if let Some(observer) = observer {
            observer(&status);
        }
        self.reporter.push(status);
    }

    /// Keep the first fatal error; later ones are only logged.
    fn record_error(&self, err: InstallError) -> Arc<InstallError> {
        let mut session = write(&self.session);
        match &session.error {
            Some(first) => {
                tracing::warn!("further error after '{}': {}", first, err);
                Arc::new(err)
            }
            None => {
                let err = Arc::new(err);
                session.error = Some(err.clone());
                err
            }
        }
    }

    fn fail(&self, err: InstallError) -> Arc<InstallError> {
        tracing::error!("install failed: {}", err);
        let err = self.record_error(err);
        self.set_state(State::Failed);
        self.emit(Status::finished(State::Failed));
        err
    }

    fn track_scaffold(&self, created: Vec<PathBuf>) {
        if !created.is_empty() {
            write(&self.session).scaffold.extend(created);
        }
    }

    /// Fill the session from the inventory once.
    fn populate(&self, inventory: &mut Inventory) -> std::result::Result<(), unbox_archive::Error> {
        if read(&self.session).scanned {
            return Ok(());
        }
        let entries: Vec<InstallEntry> = inventory.scan()?.iter().cloned().map(InstallEntry::new).collect();
        let total_bytes = inventory.total_bytes()?;
        tracing::info!("{} entries, {} bytes to install", entries.len(), total_bytes);

        let mut session = write(&self.session);
        session.entries = entries;
        session.total_bytes = total_bytes;
        session.copied_bytes = 0;
        session.scanned = true;
        Ok(())
    }

    fn ensure_scanned(&self) -> std::result::Result<(), unbox_archive::Error> {
        if read(&self.session).scanned {
            return Ok(());
        }
        let mut inventory = lock(&self.inventory);
        self.populate(&mut inventory)
    }
}

/// Copies an [`Inventory`] into a target directory.
///
/// Cheap to clone; clones share the same install.
#[derive(Clone)]
pub struct Installer {
    shared: Arc<Shared>,
}

impl Installer {
    pub fn new(inventory: Inventory) -> Self {
        Self {
            shared: Arc::new(Shared {
                inventory:     Mutex::new(inventory),
                session:       RwLock::new(Session::default()),
                state:         Mutex::new(State::Idle),
                state_changed: Condvar::new(),
                cancel:        Arc::new(Cancellation::default()),
                reporter:      Reporter::new(),
                observer:      RwLock::new(None),
                hooks:         RwLock::new(Vec::new()),
                variables:     RwLock::new(BTreeMap::new()),
            }),
        }
    }

    /// Validate `path` and make it the install directory.
    pub fn set_target(&self, path: impl AsRef<Path>) -> std::result::Result<ValidTarget, TargetError> {
        let target = validate(path.as_ref())?;
        tracing::info!("install directory set to {}", target.path().display());
        write(&self.shared.session).target = Some(target.clone());
        Ok(target)
    }

    pub fn target(&self) -> Option<ValidTarget> { read(&self.shared.session).target.clone() }

    pub fn set_create_launcher(&self, create: bool) { write(&self.shared.session).create_launcher = create; }

    pub fn create_launcher(&self) -> bool { read(&self.shared.session).create_launcher }

    /// Variables handed to hooks, e.g. `product` or `start_command`.
    pub fn set_variables(&self, variables: BTreeMap<String, String>) { *write(&self.shared.variables) = variables; }

    pub fn add_hook(&self, hook: impl InstallHook + 'static) { write(&self.shared.hooks).push(Arc::new(hook)); }

    /// Call `f` with every status before an entry is copied and for every
    /// entry rolled back. Runs on the thread doing the work.
    pub fn set_progress_fn(&self, f: impl Fn(&Status) + Send + Sync + 'static) {
        *write(&self.shared.observer) = Some(Arc::new(f));
    }

    /// Handle that raises the cancellation flag without waiting.
    pub fn canceller(&self) -> Canceller {
        Canceller {
            cancel: self.shared.cancel.clone(),
        }
    }

    /// Start the copy loop on a background thread and return immediately.
    pub fn start_install(&self) -> Result<()> {
        let shared = &self.shared;
        {
            let session = read(&shared.session);
            if let Some(err) = &session.error {
                return Err(InstallError::AlreadyFailed(err.clone()));
            }
            if session.running {
                return Err(InstallError::AlreadyRunning);
            }
            if session.target.is_none() {
                return Err(InstallError::NoTarget);
            }
        }

        if let Err(e) = shared.ensure_scanned() {
            return Err(InstallError::Recorded(shared.fail(InstallError::Archive(e))));
        }

        let target = {
            let mut session = write(&shared.session);
            if session.running {
                return Err(InstallError::AlreadyRunning);
            }
            let Some(target) = session.target.clone() else {
                return Err(InstallError::NoTarget);
            };
            session.running = true;
            session.done = false;
            shared.cancel.arm();
            target
        };
        shared.set_state(State::Preparing);

        let worker = Arc::clone(shared);
        let spawned = std::thread::Builder::new()
            .name("unbox-install".into())
            .spawn(move || worker.run_install(target));

        match spawned {
            Ok(_) => Ok(()),
            Err(e) => {
                write(&shared.session).running = false;
                shared.cancel.acknowledge();
                shared.set_state(State::Idle);
                Err(InstallError::Spawn(e))
            }
        }
    }

    /// Stop the copy loop and wait until it confirmed.
    ///
    /// No-op when no loop is running. The loop finishes the entry it is
    /// working on first.
    pub fn abort(&self) {
        if self.shared.cancel.abort() {
            tracing::info!("install aborted");
        }
    }

    /// Raise the cancellation flag without waiting.
    pub fn request_abort(&self) { self.shared.cancel.request(); }

    /// Block until the installer reached a terminal state and return it.
    pub fn wait_for_done(&self) -> State {
        let mut state = lock(&self.shared.state);
        while !state.is_terminal() {
            state = self.shared.state_changed.wait(state).unwrap_or_else(PoisonError::into_inner);
        }
        *state
    }

    /// Like [`Installer::wait_for_done`], giving up after `timeout`.
    pub fn wait_for_done_timeout(&self, timeout: Duration) -> Option<State> {
        let state = lock(&self.shared.state);
        let (state, _) = self
            .shared
            .state_changed
            .wait_timeout_while(state, timeout, |state| !state.is_terminal())
            .unwrap_or_else(PoisonError::into_inner);
        state.is_terminal().then_some(*state)
    }

    pub fn state(&self) -> State { self.shared.state() }

    /// First fatal error, if any. Never cleared.
    pub fn error(&self) -> Option<Arc<InstallError>> { read(&self.shared.session).error.clone() }

    pub fn is_done(&self) -> bool { read(&self.shared.session).done }

    /// Whether a copy loop is active, including one winding down after an
    /// abort request.
    pub fn is_running(&self) -> bool { read(&self.shared.session).running }

    /// Take the latest status, waiting at most `wait`.
    pub fn status(&self, wait: Duration) -> Status { self.shared.reporter.poll(wait) }

    pub fn reporter(&self) -> Reporter { self.shared.reporter.clone() }

    /// Ratio of copied to total bytes, `0.0` with nothing to copy.
    pub fn progress(&self) -> f64 {
        let session = read(&self.shared.session);
        if session.total_bytes == 0 {
            return 0.0;
        }
        session.copied_bytes as f64 / session.total_bytes as f64
    }

    /// The entry being copied now, or the next one.
    pub fn next_file(&self) -> Option<InstallEntry> {
        read(&self.shared.session).entries.iter().find(|e| !e.installed).cloned()
    }

    pub fn entries(&self) -> Vec<InstallEntry> { read(&self.shared.session).entries.clone() }

    /// Total install size, scanning the inventory on first use.
    pub fn total_bytes(&self) -> Result<u64> {
        self.shared.ensure_scanned()?;
        Ok(read(&self.shared.session).total_bytes)
    }

    pub fn copied_bytes(&self) -> u64 { read(&self.shared.session).copied_bytes }

    /// Human readable total install size, `"0 B"` when unknown.
    pub fn size_string(&self) -> String {
        match self.total_bytes() {
            Ok(total) => format_size(total),
            Err(e) => {
                tracing::warn!("cannot determine install size: {}", e);
                format_size(0)
            }
        }
    }

    /// Human readable free space on the target filesystem.
    pub fn space_string(&self) -> Option<String> {
        let available = self.target()?.available_bytes();
        u64::try_from(available).ok().map(format_size)
    }

    /// Whether the install fits on the target filesystem.
    pub fn sufficient_space(&self) -> bool { self.check_space().is_ok() }

    /// Like [`Installer::sufficient_space`], reporting the numbers on failure.
    pub fn check_space(&self) -> Result<()> {
        let target = self.target().ok_or(InstallError::NoTarget)?;
        let required = self.total_bytes()?;
        let available = target.available_bytes();
        if sufficient_space(required, available) {
            Ok(())
        } else {
            Err(InstallError::InsufficientSpace { required, available })
        }
    }

    /// Run the `pre_install` stage of every hook.
    pub fn pre_install(&self) -> Result<()> {
        self.run_hooks("pre-install", |hook, ctx| hook.pre_install(ctx))?;
        Ok(())
    }

    /// Run the `post_install` stage of every hook and return the artifacts
    /// they created.
    ///
    /// Artifacts are kept on the installer whether or not a hook fails, so a
    /// later [`Installer::rollback`] removes them too.
    pub fn post_install(&self) -> Result<Vec<PathBuf>> {
        self.run_hooks("post-install", |hook, ctx| hook.post_install(ctx))
    }

    fn run_hooks(
        &self,
        stage: &str,
        call: impl Fn(&dyn InstallHook, &mut HookContext) -> std::result::Result<(), crate::error::HookError>,
    ) -> Result<Vec<PathBuf>> {
        let mut ctx = self.hook_context();
        let hooks = read(&self.shared.hooks).clone();

        let mut failed = None;
        for hook in hooks {
            tracing::debug!("running {} hook '{}'", stage, hook.name());
            if let Err(source) = call(hook.as_ref(), &mut ctx) {
                let err = InstallError::Hook {
                    name: hook.name(),
                    source,
                };
                if hook.required() {
                    tracing::error!("{}", err);
                    failed = Some(err);
                    break;
                }
                tracing::warn!("{}", err);
            }
        }

        if !ctx.artifacts.is_empty() {
            write(&self.shared.session).artifacts.extend(ctx.artifacts.iter().cloned());
        }
        match failed {
            Some(err) => Err(InstallError::Recorded(self.shared.record_error(err))),
            None => Ok(ctx.artifacts),
        }
    }

    /// `<target>/<start_command>`, when both are set.
    pub fn start_command(&self) -> Option<PathBuf> {
        let target = self.target()?;
        let variables = read(&self.shared.variables);
        let command = variables.get("start_command").filter(|c| !c.is_empty())?;
        Some(target.path().join(command))
    }

    /// Run the installed application.
    ///
    /// On Unix the installer process is replaced and this only returns on
    /// failure. Elsewhere the application is started detached.
    pub fn exec_installed(&self) -> Result<()> {
        let command = self.start_command().ok_or(InstallError::NoStartCommand)?;
        tracing::info!("running {}", command.display());

        let mut cmd = Command::new(&command);
        if let Some(target) = self.target() {
            cmd.current_dir(target.path());
        }
        launch(cmd).map_err(|source| InstallError::Exec { command, source })
    }

    fn hook_context(&self) -> HookContext {
        let session = read(&self.shared.session);
        let target_dir = session
            .target
            .as_ref()
            .map(|t| t.path().to_path_buf())
            .unwrap_or_default();

        let mut variables = read(&self.shared.variables).clone();
        variables.insert("installDir".to_string(), target_dir.to_string_lossy().into_owned());

        HookContext {
            installed: session
                .entries
                .iter()
                .rev()
                .filter(|e| e.installed && !(e.is_directory() && e.pre_existing))
                .map(|e| InstalledItem {
                    path:   e.target.clone(),
                    is_dir: e.is_directory(),
                })
                .collect(),
            target_dir,
            variables,
            create_launcher: session.create_launcher,
            artifacts: Vec::new(),
        }
    }
}

#[cfg(unix)]
fn launch(mut cmd: Command) -> std::io::Result<()> {
    use std::os::unix::process::CommandExt;
    Err(cmd.exec())
}

#[cfg(not(unix))]
fn launch(mut cmd: Command) -> std::io::Result<()> {
    cmd.spawn()?;
    Ok(())
}

impl std::fmt::Debug for Installer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let session = read(&self.shared.session);
        f.debug_struct("Installer")
            .field("state", &self.shared.state())
            .field("target", &session.target)
            .field("entries", &session.entries.len())
            .field("copied_bytes", &session.copied_bytes)
            .field("total_bytes", &session.total_bytes)
            .finish()
    }
}
