//! Default configuration values

/// Maximum number of clone/fetch attempts for transient network failures
pub const MAX_SYNC_ATTEMPTS: u32 = 10;

/// Make parallelism is this many jobs per detected CPU core
pub const JOBS_PER_CORE: usize = 2;

/// Default branch checked out when a module does not name one
pub const DEFAULT_BRANCH: &str = "master";

/// Name of the git remote modules are synchronized from
pub const DEFAULT_REMOTE: &str = "origin";

/// Project manifest file name
pub const MANIFEST_FILE: &str = "modbuild.toml";

/// Persisted build state file name (inside the home directory)
pub const STATE_FILE: &str = "state.json";

/// Subdirectory names under the home directory
pub const SOURCE_SUBDIR: &str = "source";
pub const BUILD_SUBDIR: &str = "build";
pub const INSTALL_SUBDIR: &str = "install";

/// Marker files probed by the build-system detector, in priority order
pub const ACTIVITY_MARKER: &str = "setup.py";
pub const AUTOTOOLS_MARKER: &str = "autogen.sh";
pub const MAKE_MARKER: &str = "Makefile";

/// Libtool archive pattern purged from the shared lib dir after autotools installs
pub const LIBTOOL_ARCHIVE_EXT: &str = "la";
