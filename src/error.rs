//! Error taxonomy for Octave sessions.
//!
//! Every fallible operation in the crate returns [`OctaveError`]. A dead
//! interpreter is not reported between commands: the session restarts it
//! before the next command instead. `ProcessExited` only surfaces
//! when the child dies while a command is in flight.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Session-level error types.
#[derive(Debug, Error)]
pub enum OctaveError {
    /// The interpreter binary could not be spawned.
    #[error("Octave binary not found: {}", path.display())]
    BinaryNotFound {
        /// Path that was handed to the process builder
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The command did not complete before its deadline.
    #[error("Octave timeout after {}ms", timeout.as_millis())]
    Timeout {
        /// The deadline that elapsed
        timeout: Duration,
    },

    /// The interpreter wrote to its error stream. The payload is the
    /// accumulated output, verbatim.
    #[error("{0}")]
    Command(String),

    /// A typed getter could not interpret the returned text.
    #[error("Cannot parse {expected} from Octave output: {text:?}")]
    Parse {
        /// Shape the caller asked for ("scalar", "vector", ...)
        expected: &'static str,
        /// Offending text
        text: String,
    },

    /// The interpreter exited while a command was waiting for its echo.
    #[error("Octave process exited while a command was in flight")]
    ProcessExited,

    /// Writing to the interpreter's stdin failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl OctaveError {
    /// True for [`OctaveError::Timeout`], the one error callers commonly retry.
    pub fn is_timeout(&self) -> bool {
        matches!(self, OctaveError::Timeout { .. })
    }

    pub(crate) fn parse(expected: &'static str, text: impl Into<String>) -> Self {
        OctaveError::Parse {
            expected,
            text: text.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, OctaveError>;
