//! Echo tokens and output line classification.
//!
//! After every command the channel writes a string literal the interpreter
//! echoes back as `ans = <token>:<seq>`, then an `fputs` that writes
//! `<token>:<seq>` to stderr. The token is a random UUID generated per process
//! start; the sequence number identifies the command.
//!
//! stdout and stderr are separate pipes read by separate threads, so only
//! the pair of markers tells when both streams are done with a command.

use uuid::Uuid;

/// Prefix Octave puts in front of anonymous results.
pub(crate) const RESULT_PREFIX: &str = "ans =";

/// Per-process end-of-response marker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoToken {
    id: String,
}

impl EchoToken {
    pub fn generate() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// The input line that makes the interpreter print this token for `seq`.
    pub fn request_line(&self, seq: u64) -> String {
        format!("\"{}:{}\"", self.id, seq)
    }

    /// The input line that makes the interpreter write this token for `seq`
    /// to its error stream.
    pub fn stderr_marker_line(&self, seq: u64) -> String {
        format!("fputs(stderr, \"{}:{}\\n\"); fflush(stderr);", self.id, seq)
    }

    /// Sequence number carried by a stderr line, if it is this token's marker.
    pub fn match_stderr_marker(&self, line: &str) -> Option<u64> {
        line.trim()
            .strip_prefix(self.id.as_str())?
            .strip_prefix(':')?
            .parse()
            .ok()
    }

    /// Sequence number carried by `line`, if it is this token's echo.
    pub fn match_echo(&self, line: &str) -> Option<u64> {
        line.trim()
            .strip_prefix(RESULT_PREFIX)?
            .trim_start()
            .strip_prefix(self.id.as_str())?
            .strip_prefix(':')?
            .parse()
            .ok()
    }
}

/// What a single stdout line means to the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum OutputLine<'a> {
    /// The echo for command `seq`.
    Echo(u64),
    /// Nothing worth keeping (blank, or a bare `ans =` header).
    Blank,
    /// An `ans = ...` line with the prefix removed.
    Value(String),
    /// Anything else, kept verbatim.
    Text(&'a str),
}

pub(crate) fn classify<'a>(line: &'a str, token: &EchoToken) -> OutputLine<'a> {
    if let Some(seq) = token.match_echo(line) {
        return OutputLine::Echo(seq);
    }

    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed == RESULT_PREFIX {
        return OutputLine::Blank;
    }

    if line.contains(RESULT_PREFIX) {
        return OutputLine::Value(line.replace(RESULT_PREFIX, "").trim().to_string());
    }

    OutputLine::Text(line)
}
