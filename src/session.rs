//! A supervised Octave session.
//!
//! `Session` is what host applications hold. It owns one interpreter process
//! and transparently replaces it when it dies: every command first checks
//! liveness, restarts the process (fresh echo token, fresh buffer) if it has
//! exited, notifies restart observers, and only then sends the command. The
//! replacement's warm-up runs under the triggering command's timeout.
//!
//! Timeouts and command errors are never retried here; that is the caller's
//! call. A timed-out command leaves the interpreter running, and only an
//! actual process exit triggers a restart.
//!
//! # Example
//!
//! ```ignore
//! use octave_bridge::{Interpreter, Session, SessionConfig};
//! use std::time::Duration;
//!
//! let mut session = Session::start(SessionConfig::new("octave-cli"))?;
//! session.set_scalar("x", 2.0, Some(Duration::from_secs(5)))?;
//! let y = session.get_scalar("x * 21", Some(Duration::from_secs(5)))?;
//! ```

use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::{SessionConfig, VectorParsing};
use crate::error::Result;
use crate::interpreter::Interpreter;
use crate::models::SessionRestarted;
use crate::process::ReplProcess;

type RestartObserver = Box<dyn Fn(&SessionRestarted) + Send + Sync>;

pub struct Session {
    config: SessionConfig,
    process: ReplProcess,
    observers: Vec<RestartObserver>,
    restarts: u64,
}

impl Session {
    /// Spawn the interpreter and drain its banner.
    ///
    /// # Errors
    ///
    /// - `BinaryNotFound` if the binary cannot be spawned
    /// - `Timeout` if the warm-up command exceeds `startup_timeout_ms`
    pub fn start(config: SessionConfig) -> Result<Self> {
        let process = ReplProcess::start(&config, config.startup_timeout())?;
        Ok(Self {
            config,
            process,
            observers: Vec::new(),
            restarts: 0,
        })
    }

    /// Start `binary` with default settings and the given warm-up deadline.
    pub fn launch(
        binary: impl Into<PathBuf>,
        show_window: bool,
        timeout: Option<Duration>,
    ) -> Result<Self> {
        let mut config = SessionConfig::new(binary).with_startup_timeout(timeout);
        config.show_window = show_window;
        Self::start(config)
    }

    /// Register a callback fired after every automatic restart.
    pub fn on_restart<F>(&mut self, observer: F)
    where
        F: Fn(&SessionRestarted) + Send + Sync + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    /// Terminate the interpreter. The next command starts a new one.
    pub fn stop(&mut self) {
        self.process.stop();
    }

    pub fn has_exited(&mut self) -> bool {
        self.process.has_exited()
    }

    /// Whatever the interpreter printed before it was ready.
    pub fn banner(&self) -> &str {
        self.process.banner()
    }

    pub fn process_id(&self) -> u32 {
        self.process.id()
    }

    /// The current process's echo token (changes on restart).
    pub fn echo_token(&self) -> &str {
        self.process.token()
    }

    pub fn restart_count(&self) -> u64 {
        self.restarts
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace a dead interpreter. Called before every command, with that
    /// command's timeout.
    fn ensure_running(&mut self, timeout: Option<Duration>) -> Result<()> {
        let Some(status) = self.process.exit_status() else {
            return Ok(());
        };

        warn!("Octave exited ({}), restarting", status);
        let fresh = ReplProcess::start(&self.config, timeout)?;
        // The old process already exited, so dropping it is a no-op.
        self.process = fresh;
        self.restarts += 1;

        let event = SessionRestarted {
            restarts: self.restarts,
            exit_code: status.code(),
            pid: self.process.id(),
            restarted_at: Utc::now(),
        };
        info!("Octave restarted (pid {}, restart #{})", event.pid, event.restarts);
        for observer in &self.observers {
            observer(&event);
        }
        Ok(())
    }
}

impl Interpreter for Session {
    fn execute(&mut self, command: &str, timeout: Option<Duration>) -> Result<String> {
        self.ensure_running(timeout)?;
        self.process.execute(Some(command), timeout)
    }

    fn vector_parsing(&self) -> VectorParsing {
        self.config.vector_parsing
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("binary", &self.config.binary)
            .field("pid", &self.process.id())
            .field("restarts", &self.restarts)
            .field("observers", &self.observers.len())
            .finish()
    }
}
