//! octave-bridge - line-oriented front end for an Octave session.
//!
//! Reads commands from stdin and forwards them to a supervised Octave
//! process. Lines starting with `:` are meta commands that use the typed
//! getters and print JSON:
//!
//! ```text
//! :scalar NAME   :bool NAME   :vector NAME   :matrix NAME
//! :string NAME   :type NAME   :clear         :quit
//! ```
//!
//! Configuration comes from `OCTAVE_BRIDGE_*` environment variables; an
//! optional first argument overrides the binary.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{Context, Result};
use octave_bridge::{Interpreter, Session, SessionConfig};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Raw(&'a str),
    Scalar(&'a str),
    Bool(&'a str),
    Vector(&'a str),
    Matrix(&'a str),
    Text(&'a str),
    Type(&'a str),
    Clear,
    Quit,
    Unknown(&'a str),
}

fn parse_line(line: &str) -> Line<'_> {
    let Some(meta) = line.trim().strip_prefix(':') else {
        return Line::Raw(line);
    };

    let (verb, arg) = match meta.split_once(char::is_whitespace) {
        Some((verb, arg)) => (verb, arg.trim()),
        None => (meta, ""),
    };

    match (verb, arg.is_empty()) {
        ("clear", _) => Line::Clear,
        ("quit" | "q", _) => Line::Quit,
        ("scalar", false) => Line::Scalar(arg),
        ("bool", false) => Line::Bool(arg),
        ("vector", false) => Line::Vector(arg),
        ("matrix", false) => Line::Matrix(arg),
        ("string", false) => Line::Text(arg),
        ("type", false) => Line::Type(arg),
        _ => Line::Unknown(meta),
    }
}

/// Execute one line; `Ok(None)` means quit.
fn handle(session: &mut Session, line: &str, timeout: Option<Duration>) -> Result<Option<String>> {
    let output = match parse_line(line) {
        Line::Raw(command) => session.execute(command, timeout)?,
        Line::Scalar(name) => serde_json::to_string(&session.get_scalar(name, timeout)?)?,
        Line::Bool(name) => serde_json::to_string(&session.get_boolean(name, timeout)?)?,
        Line::Vector(name) => serde_json::to_string(&session.get_column_vector(name, timeout)?)?,
        Line::Matrix(name) => serde_json::to_string(&session.get_matrix(name, timeout)?.to_rows())?,
        Line::Text(name) => serde_json::to_string(&session.get_string(name, timeout)?)?,
        Line::Type(name) => serde_json::to_string(&session.result_type(name, timeout)?)?,
        Line::Clear => {
            session.clear_all_variables(timeout)?;
            String::new()
        }
        Line::Quit => return Ok(None),
        Line::Unknown(meta) => anyhow::bail!("Unknown meta command: :{}", meta),
    };
    Ok(Some(output))
}

fn main() -> Result<()> {
    // Initialize logging (stderr, so stdout stays machine-readable)
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "octave_bridge=info".into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();

    info!("Starting octave-bridge v{}", env!("CARGO_PKG_VERSION"));

    let mut config = SessionConfig::from_env();
    if let Some(binary) = std::env::args().nth(1) {
        config.binary = binary.into();
    }
    let timeout = config.command_timeout();

    let mut session = Session::start(config).context("Failed to start Octave")?;
    session.on_restart(|event| {
        eprintln!(
            "[octave restarted: pid {}, restart #{}]",
            event.pid, event.restarts
        );
    });

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        match handle(&mut session, &line, timeout) {
            Ok(Some(output)) => {
                let output = output.trim_end();
                if !output.is_empty() {
                    writeln!(stdout, "{}", output)?;
                    stdout.flush()?;
                }
            }
            Ok(None) => break,
            Err(e) => eprintln!("{:#}", e),
        }
    }

    session.stop();
    Ok(())
}
