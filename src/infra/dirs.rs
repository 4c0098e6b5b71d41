//! Platform-specific directory management
//!
//! Resolves the home directory that holds module sources, build trees, the
//! shared install prefix and the build state. Follows the XDG Base Directory
//! Specification on Linux and standard locations on macOS.
//!
//! The `MODBUILD_HOME` environment variable overrides the platform default.

use std::env;
use std::path::{Path, PathBuf};

use crate::config::defaults;

/// Environment variable overriding the home directory
pub const ENV_HOME_DIR: &str = "MODBUILD_HOME";

/// Application name used in directory paths
const APP_NAME: &str = "modbuild";

/// Directory provider for modbuild
#[derive(Debug, Clone)]
pub struct ModbuildDirs {
    home: PathBuf,
}

impl ModbuildDirs {
    /// Resolve directories from the environment, then platform defaults
    #[must_use]
    pub fn new() -> Self {
        Self {
            home: Self::resolve_home(),
        }
    }

    /// Use an explicit home directory
    #[must_use]
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    /// Root of all modbuild state
    ///
    /// - Linux: `$XDG_DATA_HOME/modbuild` or `~/.local/share/modbuild`
    /// - macOS: `~/Library/Application Support/modbuild`
    #[must_use]
    pub fn home(&self) -> &Path {
        &self.home
    }

    /// Default root for module checkouts
    #[must_use]
    pub fn source_dir(&self) -> PathBuf {
        self.home.join(defaults::SOURCE_SUBDIR)
    }

    /// Default root for out-of-source build trees
    #[must_use]
    pub fn build_dir(&self) -> PathBuf {
        self.home.join(defaults::BUILD_SUBDIR)
    }

    /// Default shared install prefix
    #[must_use]
    pub fn install_dir(&self) -> PathBuf {
        self.home.join(defaults::INSTALL_SUBDIR)
    }

    fn resolve_home() -> PathBuf {
        if let Ok(path) = env::var(ENV_HOME_DIR) {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }

        Self::platform_data_dir()
    }

    fn platform_data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join(APP_NAME))
            .unwrap_or_else(|| {
                // Fallback to home directory
                dirs::home_dir()
                    .map(|h| h.join(".local").join("share").join(APP_NAME))
                    .unwrap_or_else(|| {
                        PathBuf::from(".")
                            .join(".local")
                            .join("share")
                            .join(APP_NAME)
                    })
            })
    }
}

impl Default for ModbuildDirs {
    fn default() -> Self {
        Self::new()
    }
}
