//! Output formatting and progress indicators
//!
//! This module provides utilities for displaying spinners and formatted
//! status messages to the user.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::Level;

/// Output settings from the global CLI flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Only errors are printed
    pub quiet: bool,
    /// Number of `-v` flags
    pub verbose: u8,
}

impl OutputConfig {
    pub fn new(quiet: bool, verbose: u8) -> Self {
        Self { quiet, verbose }
    }

    /// Default log level when `RUST_LOG` does not say otherwise
    pub fn log_level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            _ => Level::DEBUG,
        }
    }

    /// Print a success line
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {message}", status::SUCCESS);
        }
    }

    /// Print an informational line
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {message}", status::INFO);
        }
    }

    /// Print a plain line
    pub fn line(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Spinner for an operation of unknown duration; hidden when quiet
    pub fn spinner(&self, message: &str) -> ProgressBar {
        if self.quiet {
            return ProgressBar::hidden();
        }
        create_spinner(message)
    }
}

/// Create a spinner for operations with unknown duration
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(80));
    pb
}

/// Print an error and the causes its message does not already include
pub fn display_error(error: &anyhow::Error) {
    for line in error_lines(error) {
        eprintln!("{line}");
    }
}

fn error_lines(error: &anyhow::Error) -> Vec<String> {
    let mut lines = vec![format!("{} {error}", status::ERROR)];
    let mut previous = error.to_string();
    for cause in error.chain().skip(1) {
        let text = cause.to_string();
        if !previous.contains(&text) {
            lines.push(format!("  caused by: {text}"));
        }
        previous = text;
    }
    lines
}

/// Banner printed before a module is processed
pub fn module_banner(name: &str) -> String {
    format!("=== Building {name} ===")
}

/// Status message prefixes
pub mod status {
    /// Success prefix (green checkmark)
    pub const SUCCESS: &str = "✓";

    /// Error prefix (red X)
    pub const ERROR: &str = "✗";

    /// Info prefix (blue circle)
    pub const INFO: &str = "ℹ";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(OutputConfig::new(false, 0).log_level(), Level::WARN);
        assert_eq!(OutputConfig::new(false, 1).log_level(), Level::INFO);
        assert_eq!(OutputConfig::new(false, 2).log_level(), Level::DEBUG);
        assert_eq!(OutputConfig::new(false, 5).log_level(), Level::DEBUG);
        assert_eq!(OutputConfig::new(true, 2).log_level(), Level::ERROR);
    }

    #[test]
    fn test_error_lines_skip_repeated_causes() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error = anyhow::Error::new(io).context("Failed to write state");
        assert_eq!(
            error_lines(&error),
            vec!["✗ Failed to write state", "  caused by: disk full"]
        );

        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let error = anyhow::Error::new(io).context("Write failed: disk full");
        assert_eq!(error_lines(&error), vec!["✗ Write failed: disk full"]);
    }

    #[test]
    fn test_module_banner() {
        assert_eq!(module_banner("libfoo"), "=== Building libfoo ===");
    }

    #[test]
    fn test_quiet_spinner_is_hidden() {
        assert!(OutputConfig::new(true, 0).spinner("syncing").is_hidden());
    }
}
