use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, PoisonError};

/// Cooperative cancellation with a stop rendezvous.
///
/// The loop polls [`Cancellation::is_requested`] between entries. A caller of
/// [`Cancellation::abort`] sets the flag and then sleeps until the loop calls
/// [`Cancellation::acknowledge`], which happens exactly once per run.
///
/// A request raised while no run is active stays pending, so the next run
/// stops before its first entry. It is cleared once acted upon.
#[derive(Debug, Default)]
pub(crate) struct Cancellation {
    requested: AtomicBool,
    running:   Mutex<bool>,
    stopped:   Condvar,
}

impl Cancellation {
    /// Start a new run.
    pub(crate) fn arm(&self) { *self.running.lock().unwrap_or_else(PoisonError::into_inner) = true; }

    pub(crate) fn request(&self) { self.requested.store(true, Ordering::SeqCst); }

    /// Drop a request that has been acted upon.
    pub(crate) fn clear(&self) { self.requested.store(false, Ordering::SeqCst); }

    pub(crate) fn is_requested(&self) -> bool { self.requested.load(Ordering::SeqCst) }

    #[cfg(test)]
    pub(crate) fn is_running(&self) -> bool { *self.running.lock().unwrap_or_else(PoisonError::into_inner) }

    /// Mark the current run as stopped and wake every waiter.
    pub(crate) fn acknowledge(&self) {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        *running = false;
        self.stopped.notify_all();
    }

    /// Request a stop and wait for the loop to confirm it.
    ///
    /// Returns `false` without waiting when no run is active.
    pub(crate) fn abort(&self) -> bool {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        if !*running {
            return false;
        }
        self.requested.store(true, Ordering::SeqCst);
        while *running {
            running = self.stopped.wait(running).unwrap_or_else(PoisonError::into_inner);
        }
        true
    }
}

/// Non-blocking handle that only raises the cancellation flag.
///
/// Safe to use from signal handlers and UI callbacks where blocking on the
/// rendezvous is not an option.
#[derive(Clone, Debug)]
pub struct Canceller {
    pub(crate) cancel: Arc<Cancellation>,
}

impl Canceller {
    pub fn cancel(&self) { self.cancel.request(); }

    pub fn is_cancelled(&self) -> bool { self.cancel.is_requested() }
}
