//! Interpreter process supervision.
//!
//! `ReplProcess` owns one child interpreter: it spawns it with piped stdio,
//! starts a reader thread per output stream that feeds the channel's
//! collector, and drains the startup banner with an empty warm-up command
//! before handing the process out.
//!
//! # Process Cleanup Safety
//! The struct is assembled right after `spawn()` so that a failing warm-up
//! still runs `Drop`, which asks the interpreter to exit and kills it if it
//! does not, preventing orphaned interpreters.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::channel::{Collector, CommandChannel, EchoToken};
use crate::config::SessionConfig;
use crate::error::{OctaveError, Result};

/// A running interpreter plus its command channel.
pub(crate) struct ReplProcess {
    child: Child,
    channel: CommandChannel,
    collector: Arc<Collector>,
    banner: String,
}

impl ReplProcess {
    /// Spawn the interpreter and wait for it to become ready.
    ///
    /// `ready_timeout` bounds the warm-up and each startup command.
    pub fn start(config: &SessionConfig, ready_timeout: Option<Duration>) -> Result<Self> {
        info!(
            "Starting Octave: {} {}",
            config.binary.display(),
            config.args.join(" ")
        );

        let mut command = Command::new(&config.binary);
        command
            .args(&config.args)
            .current_dir(&config.working_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        configure_window(&mut command, config.show_window);

        let mut child = command.spawn().map_err(|source| {
            error!("Failed to spawn {}: {}", config.binary.display(), source);
            OctaveError::BinaryNotFound {
                path: config.binary.clone(),
                source,
            }
        })?;

        let handles = (child.stdin.take(), child.stdout.take(), child.stderr.take());
        let (stdin, stdout, stderr) = match handles {
            (Some(stdin), Some(stdout), Some(stderr)) => (stdin, stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(OctaveError::Io(std::io::Error::other(
                    "Octave child is missing a piped stdio handle",
                )));
            }
        };

        let collector = Arc::new(Collector::new(EchoToken::generate()));
        let channel = match CommandChannel::new(stdin, Arc::clone(&collector)) {
            Ok(channel) => channel,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        let mut process = ReplProcess {
            child,
            channel,
            collector: Arc::clone(&collector),
            banner: String::new(),
        };

        let out = Arc::clone(&collector);
        spawn_reader("octave-stdout", stdout, move |event| match event {
            Some(line) => out.on_stdout(line),
            None => out.on_closed(),
        })?;

        let err = Arc::clone(&collector);
        spawn_reader("octave-stderr", stderr, move |event| {
            if let Some(line) = event {
                err.on_stderr(line);
            }
        })?;

        process.banner = process.channel.execute(None, ready_timeout)?;
        debug!("Octave banner: {:?}", process.banner);

        for startup in &config.startup_commands {
            process
                .channel
                .execute(Some(startup.as_str()), ready_timeout)?;
        }

        info!("Octave ready (pid {})", process.child.id());
        Ok(process)
    }

    pub fn execute(&mut self, command: Option<&str>, timeout: Option<Duration>) -> Result<String> {
        self.channel.execute(command, timeout)
    }

    /// Terminate the interpreter. No-op when it already exited.
    pub fn stop(&mut self) {
        if self.has_exited() {
            return;
        }

        info!("Stopping Octave (pid {})", self.child.id());
        self.collector.detach();
        if let Err(e) = self.child.kill() {
            warn!("Failed to kill Octave: {}", e);
        }
        let _ = self.child.wait();
    }

    /// Non-blocking liveness check.
    pub fn has_exited(&mut self) -> bool {
        self.exit_status().is_some()
    }

    pub fn exit_status(&mut self) -> Option<ExitStatus> {
        match self.child.try_wait() {
            Ok(status) => status,
            Err(e) => {
                warn!("Error polling Octave process: {}", e);
                None
            }
        }
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }

    pub fn banner(&self) -> &str {
        &self.banner
    }

    pub fn token(&self) -> &str {
        self.channel.token().as_str()
    }
}

impl Drop for ReplProcess {
    fn drop(&mut self) {
        if self.has_exited() {
            return;
        }

        self.collector.detach();
        self.channel.send_nowait("exit");

        for _ in 0..10 {
            match self.child.try_wait() {
                Ok(Some(_status)) => {
                    debug!("Octave process exited cleanly");
                    return;
                }
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(e) => {
                    warn!("Error waiting for Octave: {}", e);
                    return;
                }
            }
        }

        warn!("Octave didn't exit gracefully, killing");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Read `stream` line by line on its own thread; `None` marks EOF.
fn spawn_reader<R, F>(name: &str, stream: R, mut on_event: F) -> Result<()>
where
    R: Read + Send + 'static,
    F: FnMut(Option<&str>) + Send + 'static,
{
    let label = name.to_string();
    thread::Builder::new().name(label.clone()).spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            match reader.read_until(b'\n', &mut raw) {
                Ok(0) => {
                    debug!("{} closed", label);
                    break;
                }
                Ok(_) => {
                    let line = String::from_utf8_lossy(&raw);
                    on_event(Some(line.trim_end_matches(['\r', '\n'])));
                }
                Err(e) => {
                    error!("Failed to read from {}: {}", label, e);
                    break;
                }
            }
        }

        on_event(None);
    })?;
    Ok(())
}

#[cfg(windows)]
fn configure_window(command: &mut Command, show_window: bool) {
    use std::os::windows::process::CommandExt;
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;

    if !show_window {
        command.creation_flags(CREATE_NO_WINDOW);
    }
}

#[cfg(not(windows))]
fn configure_window(_command: &mut Command, show_window: bool) {
    if show_window {
        debug!("show_window has no effect on this platform");
    }
}
