//! Deadline-bounded waits.
//!
//! The calling thread waits on a one-slot channel that the output collector
//! completes. When the deadline passes the caller simply stops waiting: the
//! interpreter is never interrupted and keeps evaluating until it finishes on
//! its own.

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

/// Why a bounded wait ended without a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WaitError {
    /// The deadline passed first.
    Elapsed,
    /// Every sender was dropped.
    Disconnected,
}

/// Block on `rx` for at most `timeout`; `None` waits forever.
///
/// A zero timeout has already elapsed and never succeeds, even if a value
/// happens to be ready.
pub(crate) fn wait<T>(rx: &Receiver<T>, timeout: Option<Duration>) -> Result<T, WaitError> {
    match timeout {
        None => rx.recv().map_err(|_| WaitError::Disconnected),
        Some(t) if t.is_zero() => Err(WaitError::Elapsed),
        Some(t) => rx.recv_timeout(t).map_err(|e| match e {
            RecvTimeoutError::Timeout => WaitError::Elapsed,
            RecvTimeoutError::Disconnected => WaitError::Disconnected,
        }),
    }
}
