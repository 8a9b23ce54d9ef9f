//! Octave Bridge Library
//!
//! Drives a GNU Octave REPL running as a child process and exposes it as a
//! synchronous, typed API:
//!
//! - `session` - supervised interpreter process with automatic restart
//! - `interpreter` - typed getters/setters, shape probe, batch execution
//! - `config` - session configuration and environment overrides
//! - `models` - result types shared with front ends
//! - `async_session` - tokio adapter
//!
//! Commands are synchronized with an echo token: after each command the
//! bridge asks Octave to print a per-process random string and treats its
//! appearance on stdout as "command complete".
//!
//! ```ignore
//! use octave_bridge::{Interpreter, Session, SessionConfig};
//!
//! let mut octave = Session::start(SessionConfig::from_env())?;
//! octave.set_row_vector("v", &[1.0, 2.0, 3.0], None)?;
//! let v = octave.get_column_vector("v", None)?;
//! ```
//!
//! One command is in flight per session at a time; share a session between
//! threads or tasks through `AsyncSession` (or your own mutex).

pub mod async_session;
mod channel;
pub mod config;
mod deadline;
pub mod encode;
pub mod error;
pub mod interpreter;
pub mod models;
pub mod parse;
mod process;
pub mod session;

pub use async_session::AsyncSession;
pub use config::{timeout_from_millis, SessionConfig, VectorParsing};
pub use error::{OctaveError, Result};
pub use interpreter::Interpreter;
pub use models::{BatchOutcome, BatchStopRule, Matrix, ResultType, SessionRestarted};
pub use session::Session;
