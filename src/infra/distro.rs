//! Host distribution detection
//!
//! Reads `/etc/os-release` to find out which distribution modbuild runs on,
//! which package manager to use and where libraries are installed.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

/// Location of the os-release file
pub const OS_RELEASE: &str = "/etc/os-release";

/// Distributions with a package manager implementation
pub const SUPPORTED_DISTROS: &[&str] = &["ubuntu", "debian"];

/// Distributions installing 64-bit libraries into `lib64`
const LIB64_DISTROS: &[&str] = &["fedora", "centos", "rhel", "opensuse-leap", "opensuse-tumbleweed"];

/// Architectures modules are known to build on
const SUPPORTED_ARCHES: &[&str] = &["x86", "x86_64"];

/// Information about the host distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistroInfo {
    /// Distribution id (`ID` in os-release), lowercase
    pub name: String,
    /// Release (`VERSION_ID`), `unknown` when absent
    pub version: String,
    /// Whether the distribution could be identified at all
    pub valid: bool,
    /// Whether builds are expected to work here
    pub supported: bool,
    /// Libraries go to `lib64` instead of `lib`
    pub use_lib64: bool,
}

impl DistroInfo {
    /// Detect the running host
    pub fn detect() -> Self {
        Self::from_path(Path::new(OS_RELEASE), std::env::consts::ARCH)
    }

    /// Detect from an os-release file; an unreadable file yields an invalid distro
    pub fn from_path(path: &Path, arch: &str) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_os_release(&content, arch),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot read os-release");
                Self::from_os_release("", arch)
            }
        }
    }

    /// Build from os-release content and a machine architecture
    pub fn from_os_release(content: &str, arch: &str) -> Self {
        let fields = parse_os_release(content);

        let name = fields
            .get("ID")
            .map(|id| id.to_lowercase())
            .unwrap_or_default();
        let version = fields
            .get("VERSION_ID")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string());
        let valid = !name.is_empty();
        let supported = valid
            && SUPPORTED_DISTROS.contains(&name.as_str())
            && SUPPORTED_ARCHES.contains(&arch);

        Self {
            version,
            valid,
            supported,
            use_lib64: arch == "x86_64" && LIB64_DISTROS.contains(&name.as_str()),
            name: if valid { name } else { "unknown".to_string() },
        }
    }
}

impl fmt::Display for DistroInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.version)
    }
}

/// Parse `KEY=value` lines, stripping optional quotes
pub fn parse_os_release(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| {
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                .unwrap_or(value);
            (key.trim().to_string(), value.to_string())
        })
        .collect()
}
