//! Common test utilities and helpers
//!
//! This module provides shared utilities for integration tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// Test project context
///
/// A temporary directory holding the manifest, a `home/` used as
/// `MODBUILD_HOME` and any local upstream repositories.
pub struct TestProject {
    /// Temporary directory for the test project
    pub dir: TempDir,
}

impl TestProject {
    /// Create a new test project in a temporary directory
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the path to the test project directory
    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// modbuild home used by [`Self::run`]
    pub fn home(&self) -> PathBuf {
        self.dir.path().join("home")
    }

    /// Create a file in the test project
    pub fn create_file(&self, name: &str, content: &str) {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        std::fs::write(path, content).expect("Failed to write file");
    }

    /// Check if a file exists in the test project
    pub fn file_exists(&self, name: &str) -> bool {
        self.dir.path().join(name).exists()
    }

    /// Read a file from the test project
    pub fn read_file(&self, name: &str) -> String {
        std::fs::read_to_string(self.dir.path().join(name)).expect("Failed to read file")
    }

    /// Write `modbuild.toml` with one `[[module]]` per (name, repo) pair
    pub fn write_manifest(&self, modules: &[(&str, &Path)]) {
        let mut manifest = String::from("[sync]\nretries = 2\n");
        for (name, repo) in modules {
            manifest.push_str(&format!(
                "\n[[module]]\nname = \"{name}\"\nrepo = \"{}\"\n",
                repo.display()
            ));
        }
        self.create_file("modbuild.toml", &manifest);
    }

    /// Run modbuild in the project directory
    pub fn run(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_modbuild"))
            .current_dir(self.dir.path())
            .env("MODBUILD_HOME", self.home())
            .env_remove("MODBUILD_MANIFEST")
            .env_remove("RUST_LOG")
            .args(args)
            .output()
            .expect("Failed to execute modbuild")
    }

    /// Persisted build state, parsed
    pub fn state(&self) -> serde_json::Value {
        let content = std::fs::read_to_string(self.home().join("state.json"))
            .expect("Failed to read state file");
        serde_json::from_str(&content).expect("State file is not JSON")
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `tool` is on PATH; prints a skip notice when it is not
pub fn has_tool(tool: &str) -> bool {
    if which::which(tool).is_ok() {
        return true;
    }
    eprintln!("skipping: '{tool}' not found in PATH");
    false
}

/// Run git in `repo` with a fixed identity
pub fn git(repo: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(["-c", "user.name=modbuild", "-c", "user.email=modbuild@localhost"])
        .args(args)
        .current_dir(repo)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Create an upstream repository on `master`
pub fn init_upstream(path: &Path) {
    std::fs::create_dir_all(path).expect("Failed to create upstream directory");
    git(path, &["init", "-q"]);
    git(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
}

/// Write `file` in `repo`, commit it and return the commit id
pub fn commit(repo: &Path, file: &str, content: &str) -> String {
    std::fs::write(repo.join(file), content).expect("Failed to write upstream file");
    git(repo, &["add", "-A"]);
    git(repo, &["commit", "-q", "-m", file]);
    git(repo, &["rev-parse", "HEAD"])
}

/// Makefile that appends a line to `<log>` every time it is built
pub fn counting_makefile(log: &Path) -> String {
    format!("all:\n\techo built >> {}\n", log.display())
}

/// Number of builds recorded in `log`
pub fn build_count(log: &Path) -> usize {
    std::fs::read_to_string(log)
        .map(|s| s.lines().count())
        .unwrap_or(0)
}
