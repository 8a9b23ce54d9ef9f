//! Session configuration.
//!
//! `SessionConfig` is plain serde data so hosts can embed it in their own
//! settings files. Environment variables override individual fields:
//!
//! | Variable | Field |
//! |---|---|
//! | `OCTAVE_BRIDGE_BINARY` | `binary` |
//! | `OCTAVE_BRIDGE_ARGS` | `args` (whitespace separated) |
//! | `OCTAVE_BRIDGE_WORKDIR` | `working_dir` |
//! | `OCTAVE_BRIDGE_TIMEOUT_MS` | `command_timeout_ms` |

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Default interpreter binary, resolved through `PATH`.
pub const DEFAULT_BINARY: &str = "octave-cli";

const DEFAULT_STARTUP_TIMEOUT_MS: i64 = 10_000;
const DEFAULT_COMMAND_TIMEOUT_MS: i64 = 5_000;

/// Convert a millisecond timeout into a deadline.
///
/// Negative values mean "wait forever" and map to `None`.
pub fn timeout_from_millis(ms: i64) -> Option<Duration> {
    u64::try_from(ms).ok().map(Duration::from_millis)
}

/// How vector output is turned into numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorParsing {
    /// Every numeric token, in order. Header lines (`v =`,
    /// `Columns 1 through 8:`) are skipped.
    #[default]
    CollectAll,
    /// One element per line; when a line holds several tokens only the last
    /// one survives. Row vectors collapse to their final element.
    LastTokenPerLine,
}

/// Everything needed to (re)start an interpreter process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Interpreter executable.
    pub binary: PathBuf,
    /// Extra arguments, passed without shell interpretation.
    pub args: Vec<String>,
    /// Working directory of the child.
    pub working_dir: PathBuf,
    /// Create a visible console window (Windows only).
    pub show_window: bool,
    /// Deadline for the warm-up command, negative for none.
    pub startup_timeout_ms: i64,
    /// Default deadline for front ends that do not pass one explicitly.
    pub command_timeout_ms: i64,
    /// Commands run after every warm-up, e.g. `format long`.
    pub startup_commands: Vec<String>,
    pub vector_parsing: VectorParsing,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from(DEFAULT_BINARY),
            args: Vec::new(),
            working_dir: PathBuf::from("."),
            show_window: false,
            startup_timeout_ms: DEFAULT_STARTUP_TIMEOUT_MS,
            command_timeout_ms: DEFAULT_COMMAND_TIMEOUT_MS,
            startup_commands: Vec::new(),
            vector_parsing: VectorParsing::default(),
        }
    }
}

impl SessionConfig {
    /// Configuration for the given binary with every other field defaulted.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `OCTAVE_BRIDGE_*` environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Overlay values from an environment lookup.
    ///
    /// Takes the lookup as a closure so tests do not have to mutate the
    /// process environment.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(binary) = lookup("OCTAVE_BRIDGE_BINARY") {
            debug!("Using Octave binary from OCTAVE_BRIDGE_BINARY: {}", binary);
            self.binary = PathBuf::from(binary);
        }
        if let Some(args) = lookup("OCTAVE_BRIDGE_ARGS") {
            self.args = args.split_whitespace().map(str::to_string).collect();
        }
        if let Some(dir) = lookup("OCTAVE_BRIDGE_WORKDIR") {
            self.working_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup("OCTAVE_BRIDGE_TIMEOUT_MS") {
            match raw.trim().parse::<i64>() {
                Ok(ms) => self.command_timeout_ms = ms,
                Err(_) => warn!("Ignoring invalid OCTAVE_BRIDGE_TIMEOUT_MS: {}", raw),
            }
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_startup_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.startup_timeout_ms = millis_or_forever(timeout);
        self
    }

    pub fn with_startup_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.startup_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_vector_parsing(mut self, parsing: VectorParsing) -> Self {
        self.vector_parsing = parsing;
        self
    }

    pub fn startup_timeout(&self) -> Option<Duration> {
        timeout_from_millis(self.startup_timeout_ms)
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        timeout_from_millis(self.command_timeout_ms)
    }
}

fn millis_or_forever(timeout: Option<Duration>) -> i64 {
    timeout
        .map(|t| i64::try_from(t.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(-1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    #[test]
    fn test_timeout_from_millis() {
        assert_eq!(timeout_from_millis(-1), None);
        assert_eq!(timeout_from_millis(i64::MIN), None);
        assert_eq!(timeout_from_millis(0), Some(Duration::ZERO));
        assert_eq!(timeout_from_millis(1500), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.binary, PathBuf::from("octave-cli"));
        assert!(config.args.is_empty());
        assert_eq!(config.working_dir, PathBuf::from("."));
        assert!(!config.show_window);
        assert_eq!(config.startup_timeout(), Some(Duration::from_secs(10)));
        assert_eq!(config.command_timeout(), Some(Duration::from_secs(5)));
        assert_eq!(config.vector_parsing, VectorParsing::CollectAll);
    }

    #[test]
    fn test_apply_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("OCTAVE_BRIDGE_BINARY", "/usr/local/bin/octave"),
            ("OCTAVE_BRIDGE_ARGS", "--no-gui  --quiet"),
            ("OCTAVE_BRIDGE_WORKDIR", "/tmp"),
            ("OCTAVE_BRIDGE_TIMEOUT_MS", "-1"),
        ]
        .into_iter()
        .collect();

        let mut config = SessionConfig::default();
        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.binary, PathBuf::from("/usr/local/bin/octave"));
        assert_eq!(config.args, vec!["--no-gui", "--quiet"]);
        assert_eq!(config.working_dir, PathBuf::from("/tmp"));
        assert_eq!(config.command_timeout(), None);
    }

    #[test]
    fn test_apply_env_ignores_bad_timeout() {
        let mut config = SessionConfig::default();
        config.apply_env(|key| (key == "OCTAVE_BRIDGE_TIMEOUT_MS").then(|| "soon".to_string()));
        assert_eq!(config.command_timeout_ms, 5_000);
    }

    #[test]
    fn test_deserialize_partial_json() {
        let json = r#"{
            "binary": "octave",
            "startup_commands": ["format long"],
            "vector_parsing": "last_token_per_line"
        }"#;

        let config: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.binary, PathBuf::from("octave"));
        assert_eq!(config.startup_commands, vec!["format long"]);
        assert_eq!(config.vector_parsing, VectorParsing::LastTokenPerLine);
        assert_eq!(config.startup_timeout_ms, 10_000);
    }

    #[test]
    fn test_builder_timeouts() {
        let config = SessionConfig::new("octave").with_startup_timeout(None);
        assert_eq!(config.startup_timeout_ms, -1);
        assert_eq!(config.startup_timeout(), None);

        let config = config.with_startup_timeout(Some(Duration::from_millis(750)));
        assert_eq!(config.startup_timeout(), Some(Duration::from_millis(750)));
    }
}
