//! Source modules
//!
//! A module is one independently buildable component: a git repository,
//! the branch to follow and how to build it. Modules are read-only for the
//! whole run; the project manifest owns them.

use std::path::{Path, PathBuf};

use crate::config::defaults;

/// One buildable source module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    /// Unique name, also used as directory name
    pub name: String,
    /// Repository URL
    pub repo: String,
    /// Branch to check out
    pub branch: String,
    /// Extra flags passed to the configure/bootstrap step
    pub options: Vec<String>,
    /// Build in a directory separate from the source tree
    pub out_of_source: bool,
    source_dir: PathBuf,
    build_dir: PathBuf,
}

impl Module {
    /// Create a module on the default branch, located under `source/` and `build/`
    pub fn new(name: impl Into<String>, repo: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            source_dir: Path::new(defaults::SOURCE_SUBDIR).join(&name),
            build_dir: Path::new(defaults::BUILD_SUBDIR).join(&name),
            name,
            repo: repo.into(),
            branch: defaults::DEFAULT_BRANCH.to_string(),
            options: Vec::new(),
            out_of_source: false,
        }
    }

    /// Set the branch
    #[must_use]
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = branch.into();
        self
    }

    /// Set the configure options
    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = options;
        self
    }

    /// Build out of source
    #[must_use]
    pub fn with_out_of_source(mut self, out_of_source: bool) -> Self {
        self.out_of_source = out_of_source;
        self
    }

    /// Place the module's directories under the given source and build roots
    #[must_use]
    pub fn located_in(mut self, source_root: &Path, build_root: &Path) -> Self {
        self.source_dir = source_root.join(&self.name);
        self.build_dir = build_root.join(&self.name);
        self
    }

    /// Checked-out source tree
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Dedicated build directory (used only for out-of-source builds)
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Directory the build commands run in
    pub fn work_dir(&self) -> &Path {
        if self.out_of_source {
            &self.build_dir
        } else {
            &self.source_dir
        }
    }
}

/// Whether `name` can safely be used as a single directory component
pub fn is_valid_module_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_whitespace)
}
