//! Build-system detection
//!
//! Classifies a source tree by the marker files it contains. Markers are
//! probed in a fixed priority order and the first hit wins, so a tree that
//! ships both `autogen.sh` and a stray `Makefile` is built with autotools.

use std::fmt;
use std::path::Path;

use crate::config::defaults;

/// Supported build systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildSystem {
    /// Python packaging entry point (`setup.py`)
    Activity,
    /// Autotools bootstrap script (`autogen.sh`)
    Autotools,
    /// Plain `Makefile`
    Make,
    /// Nothing recognizable
    Unknown,
}

impl BuildSystem {
    /// Marker file probed for each known build system, highest priority first
    pub const PRIORITY: [(Self, &'static str); 3] = [
        (Self::Activity, defaults::ACTIVITY_MARKER),
        (Self::Autotools, defaults::AUTOTOOLS_MARKER),
        (Self::Make, defaults::MAKE_MARKER),
    ];
}

impl fmt::Display for BuildSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activity => write!(f, "activity"),
            Self::Autotools => write!(f, "autotools"),
            Self::Make => write!(f, "make"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Classify the source tree at `source_dir`
pub fn detect(source_dir: &Path) -> BuildSystem {
    BuildSystem::PRIORITY
        .iter()
        .find(|(_, marker)| source_dir.join(marker).is_file())
        .map_or(BuildSystem::Unknown, |(kind, _)| *kind)
}
