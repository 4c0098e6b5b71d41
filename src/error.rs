//! Error types for modbuild
//!
//! Domain-specific error types using thiserror.

use std::path::PathBuf;
use thiserror::Error;

use crate::infra::command::CommandError;
use crate::infra::git::GitError;

/// Project manifest errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Manifest file not found
    #[error("Manifest not found at '{path}'")]
    NotFound { path: PathBuf },

    /// IO error while reading the manifest
    #[error("Failed to read manifest '{path}': {error}")]
    ReadError { path: PathBuf, error: String },

    /// Manifest is not valid TOML for our schema
    #[error("Failed to parse manifest '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// Manifest lists no modules
    #[error("Manifest declares no modules")]
    NoModules,

    /// Two modules share a name
    #[error("Module '{name}' is declared more than once")]
    DuplicateModule { name: String },

    /// Module name cannot be used as a directory name
    #[error("Invalid module name '{name}'")]
    InvalidModuleName { name: String },

    /// Missing required field
    #[error("Module '{module}' is missing required field '{field}'")]
    MissingField { module: String, field: String },

    /// Numeric setting out of range
    #[error("Setting '{name}' must be at least 1")]
    InvalidValue { name: String },
}

/// Filesystem errors
#[derive(Error, Debug)]
pub enum FilesystemError {
    /// Failed to create directory
    #[error("Failed to create directory '{path}': {error}")]
    CreateDir { path: PathBuf, error: String },

    /// Failed to remove directory
    #[error("Failed to remove '{path}': {error}")]
    Remove { path: PathBuf, error: String },

    /// Failed to walk a directory tree
    #[error("Failed to scan '{path}': {error}")]
    Walk { path: PathBuf, error: String },
}

/// Repository synchronization errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// A git command failed (after the retry budget for network failures)
    #[error(transparent)]
    Git(#[from] GitError),

    /// The source root could not be prepared
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),
}

/// Build errors
#[derive(Error, Debug)]
pub enum BuildError {
    /// A build or install command exited non-zero
    #[error("Build step failed: {0}")]
    Command(#[from] CommandError),

    /// Working directory preparation or libtool cleanup failed
    #[error(transparent)]
    Filesystem(#[from] FilesystemError),

    /// Asked to build a tree with no recognized build system
    #[error("No supported build system in '{path}'")]
    Unsupported { path: PathBuf },

    /// Post-build revision could not be resolved
    #[error("Failed to resolve built revision: {0}")]
    Revision(#[from] GitError),
}

/// Build-state persistence errors
#[derive(Error, Debug)]
pub enum StateError {
    /// State file exists but cannot be read
    #[error("Failed to read build state '{path}': {error}")]
    Read { path: PathBuf, error: String },

    /// State file is not a valid build-state record
    #[error("Build state '{path}' is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// State file could not be written
    #[error("Failed to write build state '{path}': {error}")]
    Write { path: PathBuf, error: String },
}

/// Top-level error for an orchestration run
///
/// Every variant is fatal: the run stops at the first one and the process
/// exits non-zero.
#[derive(Error, Debug)]
pub enum ModbuildError {
    /// Fetching or checking out the module's source failed
    #[error("Module '{module}': sync failed: {source}")]
    Sync {
        module: String,
        #[source]
        source: SyncError,
    },

    /// No supported build system in the module's source tree
    #[error("Module '{module}': unknown build system in '{path}'")]
    Detection { module: String, path: PathBuf },

    /// Building or installing the module failed
    #[error("Module '{module}': build failed: {source}")]
    Build {
        module: String,
        #[source]
        source: BuildError,
    },

    /// Build state could not be loaded or persisted
    #[error("Build state error: {0}")]
    State(#[from] StateError),
}

impl ModbuildError {
    /// Name of the module the run stopped at, if any
    pub fn module(&self) -> Option<&str> {
        match self {
            Self::Sync { module, .. }
            | Self::Detection { module, .. }
            | Self::Build { module, .. } => Some(module),
            Self::State(_) => None,
        }
    }

    /// Short name of the step that failed
    pub fn step(&self) -> &'static str {
        match self {
            Self::Sync { .. } => "sync",
            Self::Detection { .. } => "detect",
            Self::Build { .. } => "build",
            Self::State(_) => "state",
        }
    }
}
