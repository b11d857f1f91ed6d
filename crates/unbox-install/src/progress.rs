//! Single-slot status conduit between the install loop and a UI.
//!
//! The slot holds at most one [`Status`]. A producer that finds it still
//! occupied after a short wait drops its status instead of blocking, and a
//! consumer that finds nothing within its wait gets the neutral status.

use std::time::Duration;

use crossbeam_channel::{Receiver, Sender, bounded};

use crate::status::Status;

/// How long a push waits for the slot to free up before giving up.
pub const DEFAULT_PUSH_WAIT: Duration = Duration::from_millis(2);

/// Default wait used by UI pollers.
pub const DEFAULT_POLL_WAIT: Duration = Duration::from_millis(100);

#[derive(Clone, Debug)]
pub struct Reporter {
    tx:        Sender<Status>,
    rx:        Receiver<Status>,
    push_wait: Duration,
}

impl Default for Reporter {
    fn default() -> Self { Self::new() }
}

impl Reporter {
    pub fn new() -> Self { Self::with_push_wait(DEFAULT_PUSH_WAIT) }

    pub fn with_push_wait(push_wait: Duration) -> Self {
        let (tx, rx) = bounded(1);
        Self { tx, rx, push_wait }
    }

    /// Offer `status`; returns `false` when it was dropped.
    pub fn push(&self, status: Status) -> bool { self.tx.send_timeout(status, self.push_wait).is_ok() }

    /// Take the pending status, waiting at most `wait` for one to arrive.
    pub fn poll(&self, wait: Duration) -> Status { self.rx.recv_timeout(wait).unwrap_or_default() }
}
