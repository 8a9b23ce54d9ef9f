//! Async adapter for tokio hosts.
//!
//! `AsyncSession` is a cloneable handle around a [`Session`]. Calls run on
//! tokio's blocking pool and are serialized by a mutex, so several tasks may
//! share one interpreter without interleaving commands.
//!
//! ```ignore
//! let octave = AsyncSession::start(SessionConfig::from_env()).await?;
//! let x = octave.run(|s| s.get_scalar("pi", None)).await?;
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::config::SessionConfig;
use crate::error::{OctaveError, Result};
use crate::interpreter::Interpreter;
use crate::models::{Matrix, ResultType};
use crate::session::Session;

#[derive(Clone)]
pub struct AsyncSession {
    inner: Arc<Mutex<Session>>,
}

impl AsyncSession {
    pub async fn start(config: SessionConfig) -> Result<Self> {
        let session = tokio::task::spawn_blocking(move || Session::start(config))
            .await
            .map_err(join_error)??;
        Ok(Self::from_session(session))
    }

    pub fn from_session(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session on the blocking pool.
    pub async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Session) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut session = inner.lock().unwrap_or_else(PoisonError::into_inner);
            f(&mut session)
        })
        .await
        .map_err(join_error)?
    }

    pub async fn execute(&self, command: impl Into<String>, timeout: Option<Duration>) -> Result<String> {
        let command = command.into();
        self.run(move |s| s.execute(&command, timeout)).await
    }

    pub async fn get_scalar(&self, name: impl Into<String>, timeout: Option<Duration>) -> Result<f64> {
        let name = name.into();
        self.run(move |s| s.get_scalar(&name, timeout)).await
    }

    pub async fn get_matrix(&self, name: impl Into<String>, timeout: Option<Duration>) -> Result<Matrix> {
        let name = name.into();
        self.run(move |s| s.get_matrix(&name, timeout)).await
    }

    pub async fn result_type(
        &self,
        name: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<ResultType> {
        let name = name.into();
        self.run(move |s| s.result_type(&name, timeout)).await
    }
}

fn join_error(err: tokio::task::JoinError) -> OctaveError {
    OctaveError::Io(std::io::Error::other(format!(
        "Octave worker task failed: {}",
        err
    )))
}
