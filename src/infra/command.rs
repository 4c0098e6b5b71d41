//! External process execution
//!
//! Runs argument vectors with an explicit working directory and an explicit
//! environment overlay. The process-wide cwd and environment are never touched.

use std::collections::HashMap;
use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    /// Empty argument vector
    #[error("Empty command line")]
    Empty,

    /// Program could not be started
    #[error("Failed to start '{program}': {error}")]
    Spawn { program: String, error: String },

    /// Program exited non-zero (or was killed by a signal)
    #[error("'{command}' {}", describe_exit(*code))]
    Failed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

fn describe_exit(code: Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "was terminated by a signal".to_string(),
    }
}

/// Stderr fragments git and friends emit for network-level failures
fn transient_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?i)(could not resolve host|temporary failure in name resolution|connection (refused|reset|timed out)|operation timed out|network is unreachable|remote end hung up|early eof|rpc failed|gnutls_handshake|ssl_connect|tls connection)",
        )
        .expect("transient pattern is a valid regex")
    })
}

impl CommandError {
    /// Whether the failure looks like a transient network problem worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Failed { stderr, .. } => transient_pattern().is_match(stderr),
            Self::Empty | Self::Spawn { .. } => false,
        }
    }
}

/// Retry policy that retries immediately, a fixed number of times
#[derive(Debug, Clone, Copy)]
struct ImmediateRetry {
    remaining: u32,
}

impl backoff::backoff::Backoff for ImmediateRetry {
    fn reset(&mut self) {}

    fn next_backoff(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(Duration::ZERO)
    }
}

/// Runs external commands with a fixed environment overlay
#[derive(Debug, Clone, Default)]
pub struct CommandRunner {
    env: HashMap<String, String>,
    quiet: bool,
}

impl CommandRunner {
    /// Create a runner that inherits the process environment unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the environment variables applied to every spawned command
    #[must_use]
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Discard stdout of streamed commands
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    fn command<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> Result<Command, CommandError> {
        let (program, rest) = args.split_first().ok_or(CommandError::Empty)?;
        let mut command = Command::new(program);
        command.args(rest).current_dir(cwd).envs(&self.env);
        Ok(command)
    }

    /// Run a command, streaming its output to the terminal
    pub fn run<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> Result<(), CommandError> {
        let line = display_args(args);
        tracing::debug!(command = %line, cwd = %cwd.display(), "running");

        let mut command = self.command(args, cwd)?;
        if self.quiet {
            command.stdout(Stdio::null());
        }

        let status = command.status().map_err(|e| CommandError::Spawn {
            program: program_name(args),
            error: e.to_string(),
        })?;

        if !status.success() {
            return Err(CommandError::Failed {
                command: line,
                code: status.code(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    /// Run a command and return its trimmed stdout
    pub fn capture<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> Result<String, CommandError> {
        let line = display_args(args);
        tracing::debug!(command = %line, cwd = %cwd.display(), "capturing");

        let output = self
            .command(args, cwd)?
            .stdin(Stdio::null())
            .output()
            .map_err(|e| CommandError::Spawn {
                program: program_name(args),
                error: e.to_string(),
            })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            if !stderr.is_empty() {
                tracing::debug!(stderr = %stderr, "command stderr");
            }
            return Err(CommandError::Failed {
                command: line,
                code: output.status.code(),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }

    /// Like [`Self::capture`], retrying transient failures immediately
    ///
    /// `attempts` is the total number of tries; a non-transient failure is
    /// returned right away.
    pub fn capture_with_retry<S: AsRef<OsStr>>(
        &self,
        args: &[S],
        cwd: &Path,
        attempts: u32,
    ) -> Result<String, CommandError> {
        let policy = ImmediateRetry {
            remaining: attempts.saturating_sub(1),
        };

        let operation = || {
            self.capture(args, cwd).map_err(|e| {
                if e.is_transient() {
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        };

        let notify = |e: CommandError, _: Duration| {
            tracing::warn!(error = %e, "transient failure, retrying");
        };

        backoff::retry_notify(policy, operation, notify).map_err(|e| match e {
            backoff::Error::Permanent(e) | backoff::Error::Transient { err: e, .. } => e,
        })
    }

    /// Run a command with elevated rights
    ///
    /// Prefixes `sudo` unless the current user is already root.
    pub fn run_with_sudo<S: AsRef<OsStr>>(&self, args: &[S], cwd: &Path) -> Result<(), CommandError> {
        if self.is_root(cwd) {
            return self.run(args, cwd);
        }

        let mut elevated: Vec<&OsStr> = Vec::with_capacity(args.len() + 1);
        elevated.push(OsStr::new("sudo"));
        elevated.extend(args.iter().map(|a| a.as_ref()));
        self.run(&elevated, cwd)
    }

    fn is_root(&self, cwd: &Path) -> bool {
        self.capture(&["id", "-u"], cwd).is_ok_and(|uid| uid == "0")
    }
}

fn program_name<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.first()
        .map(|p| p.as_ref().to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Render an argument vector for logs and error messages
pub fn display_args<S: AsRef<OsStr>>(args: &[S]) -> String {
    args.iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}
