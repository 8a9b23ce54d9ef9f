//! Shared result buffer fed by the stdout/stderr reader threads.
//!
//! The collector owns the buffer and the completion hand-off for the command
//! currently in flight. Each stream is attributed separately: a stdout line
//! belongs to the command after the last echoed one, a stderr line to the
//! command after the last stderr marker. A command completes once both of
//! its markers have arrived, or as soon as its stderr marker arrives after
//! an error line. The markers travel on different pipes, so either may be
//! seen first.
//!
//! Output that belongs to an earlier, abandoned command (one whose caller
//! timed out) is dropped by that attribution, so it never leaks into a newer
//! command's result.

use std::sync::mpsc::SyncSender;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace};

use super::echo::{classify, EchoToken, OutputLine};

/// Result of one command, as seen by the reader threads or the writer.
#[derive(Debug)]
pub(crate) enum Completion {
    /// Both markers observed; accumulated stdout text.
    Output(String),
    /// Something was written to stderr; accumulated text including it.
    Error(String),
    /// stdout closed before the command completed.
    Exited,
    /// The writer could not deliver the command.
    WriteFailed(std::io::Error),
}

struct Pending {
    seq: u64,
    done: SyncSender<Completion>,
    echoed: bool,
    settled: bool,
    failed: bool,
}

#[derive(Default)]
struct State {
    active: Option<Pending>,
    buffer: String,
    /// Highest command sequence echoed on stdout.
    last_echo: u64,
    /// Highest command sequence marked on stderr.
    last_marker: u64,
    /// A command has been issued; from then on stdout without an active
    /// command is dropped.
    begun: bool,
    closed: bool,
    detached: bool,
}

pub(crate) struct Collector {
    token: EchoToken,
    state: Mutex<State>,
}

impl Collector {
    pub fn new(token: EchoToken) -> Self {
        Self {
            token,
            state: Mutex::new(State::default()),
        }
    }

    pub fn token(&self) -> &EchoToken {
        &self.token
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking reader must not wedge the session.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reset the buffer and register `done` as the completion target for `seq`.
    pub fn begin(&self, seq: u64, done: SyncSender<Completion>) {
        let mut state = self.lock();
        // Before the first command the buffer holds the startup banner.
        if state.begun {
            state.buffer.clear();
        }
        state.begun = true;

        if state.closed {
            let _ = done.try_send(Completion::Exited);
            state.active = None;
            return;
        }

        state.active = Some(Pending {
            seq,
            done,
            echoed: false,
            settled: false,
            failed: false,
        });
    }

    pub fn on_stdout(&self, line: &str) {
        let mut state = self.lock();
        if state.detached {
            return;
        }

        match classify(line, &self.token) {
            OutputLine::Echo(seq) => {
                state.last_echo = state.last_echo.max(seq);
                match state.active.as_mut() {
                    Some(pending) if pending.seq == seq => {
                        pending.echoed = true;
                        state.try_complete();
                    }
                    _ => debug!("Echo of command {} with no waiter", seq),
                }
            }
            OutputLine::Blank => {}
            OutputLine::Value(value) => {
                if state.owns_stdout() {
                    state.buffer.push_str(&value);
                    state.buffer.push('\n');
                }
            }
            OutputLine::Text(text) => {
                if state.owns_stdout() {
                    state.buffer.push_str(text);
                    state.buffer.push('\n');
                }
            }
        }
    }

    pub fn on_stderr(&self, line: &str) {
        let mut state = self.lock();
        if state.detached {
            return;
        }

        if let Some(seq) = self.token.match_stderr_marker(line) {
            state.last_marker = state.last_marker.max(seq);
            match state.active.as_mut() {
                Some(pending) if pending.seq == seq => {
                    pending.settled = true;
                    state.try_complete();
                }
                _ => debug!("stderr marker of command {} with no waiter", seq),
            }
            return;
        }

        let owner = state.last_marker + 1;
        let State { active, buffer, .. } = &mut *state;
        match active.as_mut() {
            Some(pending) if pending.seq == owner => {
                debug!("Octave stderr: {}", line);
                pending.failed = true;
                buffer.push_str(line);
                buffer.push('\n');
            }
            Some(_) => debug!("Dropping stderr of abandoned command {}: {}", owner, line),
            None => trace!("stderr with no command in flight: {}", line),
        }
    }

    /// stdout reached EOF: the process is gone.
    pub fn on_closed(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.buffer.clear();
        state.complete(Completion::Exited);
    }

    /// Stop reacting to reader output. Any waiting caller sees a disconnect.
    pub fn detach(&self) {
        let mut state = self.lock();
        state.detached = true;
        state.active = None;
        state.buffer.clear();
    }

    #[cfg(test)]
    fn buffered(&self) -> String {
        self.lock().buffer.clone()
    }
}

impl State {
    fn owns_stdout(&self) -> bool {
        match &self.active {
            Some(pending) => self.last_echo + 1 == pending.seq,
            None => !self.begun,
        }
    }

    /// Hand the buffer over once the active command's markers allow it.
    fn try_complete(&mut self) {
        let Some(pending) = &self.active else {
            return;
        };
        if !pending.settled || !(pending.echoed || pending.failed) {
            return;
        }

        let text = std::mem::take(&mut self.buffer);
        let completion = if pending.failed {
            Completion::Error(text)
        } else {
            Completion::Output(text)
        };
        self.complete(completion);
    }

    fn complete(&mut self, completion: Completion) {
        if let Some(pending) = self.active.take() {
            // The receiver is gone when the caller already timed out.
            if pending.done.try_send(completion).is_err() {
                debug!("Completion for command {} had no waiter", pending.seq);
            }
        }
    }
}
