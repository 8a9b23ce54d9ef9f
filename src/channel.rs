//! Echo-synchronized command channel.
//!
//! Octave streams output with no message boundaries. The channel writes the
//! command followed by two marker lines carrying the process's echo token and
//! a command sequence number: a string literal that comes back on stdout, and
//! an `fputs` that comes back on stderr. Once both have been seen, everything
//! the command printed on either stream has been seen too.
//!
//! # Protocol
//!
//! ```text
//! host  -> octave   x = magic(3)
//! host  -> octave   "5f0c6b1e-...-3a99:4"
//! host  -> octave   fputs(stderr, "5f0c6b1e-...-3a99:4\n"); fflush(stderr);
//! octave -> host    x =                                   (stdout)
//! octave -> host    ...                                   (stdout)
//! octave -> host    ans = 5f0c6b1e-...-3a99:4             (stdout)
//! octave -> host    5f0c6b1e-...-3a99:4                   (stderr)
//! ```
//!
//! Any other stderr line before the stderr marker turns the result into a
//! `CommandError`, without waiting for the stdout echo.

mod collector;
mod echo;
mod writer;

use std::process::ChildStdin;
use std::sync::mpsc;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::deadline::{self, WaitError};
use crate::error::{OctaveError, Result};

pub(crate) use collector::Collector;
pub(crate) use echo::EchoToken;
use writer::StdinWriter;

/// Writes commands to the interpreter and waits for their markers.
pub(crate) struct CommandChannel {
    writer: StdinWriter,
    collector: Arc<Collector>,
    next_seq: u64,
}

impl CommandChannel {
    pub fn new(stdin: ChildStdin, collector: Arc<Collector>) -> Result<Self> {
        Ok(Self {
            writer: StdinWriter::spawn(stdin)?,
            collector,
            next_seq: 0,
        })
    }

    pub fn token(&self) -> &EchoToken {
        self.collector.token()
    }

    /// Run one command and return everything it printed.
    ///
    /// `None` (or an empty command) only round-trips the markers, which is
    /// how the startup banner gets drained.
    pub fn execute(&mut self, command: Option<&str>, timeout: Option<Duration>) -> Result<String> {
        self.next_seq += 1;
        let seq = self.next_seq;

        let mut payload = String::new();
        if let Some(command) = command.filter(|c| !c.trim().is_empty()) {
            payload.push_str(command);
            payload.push('\n');
        }
        payload.push_str(&self.token().request_line(seq));
        payload.push('\n');
        payload.push_str(&self.token().stderr_marker_line(seq));
        payload.push('\n');

        let (done_tx, done_rx) = mpsc::sync_channel(1);
        self.collector.begin(seq, done_tx.clone());
        self.writer.send(payload, Some(done_tx))?;

        let started = Instant::now();
        match deadline::wait(&done_rx, timeout) {
            Ok(collector::Completion::Output(text)) => {
                debug!(
                    "Octave command {} finished in {:.3}s",
                    seq,
                    started.elapsed().as_secs_f64()
                );
                Ok(text)
            }
            Ok(collector::Completion::Error(text)) => {
                debug!("Octave command {} reported an error", seq);
                Err(OctaveError::Command(text))
            }
            Ok(collector::Completion::Exited) | Err(WaitError::Disconnected) => {
                warn!("Octave process went away during command {}", seq);
                Err(OctaveError::ProcessExited)
            }
            Ok(collector::Completion::WriteFailed(e)) => {
                if e.kind() == std::io::ErrorKind::BrokenPipe {
                    Err(OctaveError::ProcessExited)
                } else {
                    Err(OctaveError::Io(e))
                }
            }
            Err(WaitError::Elapsed) => {
                // Deadline is always Some here: a None deadline cannot elapse.
                let timeout = timeout.unwrap_or_default();
                warn!(
                    "Octave command {} timed out after {}ms",
                    seq,
                    timeout.as_millis()
                );
                Err(OctaveError::Timeout { timeout })
            }
        }
    }

    /// Queue a line without waiting for any reply.
    pub fn send_nowait(&self, line: &str) {
        if let Err(e) = self.writer.send(format!("{}\n", line), None) {
            debug!("Failed to queue {:?} for Octave: {}", line, e);
        }
    }
}
