//! Build environment setup
//!
//! Makes everything installed into the shared prefix visible to later
//! modules: binaries, libraries, pkg-config files, aclocal macros, data
//! files and python packages. The variables are handed to every spawned
//! build command; the process environment itself is left untouched.

use std::collections::HashMap;
use std::path::Path;

use crate::core::manifest::Layout;

/// Environment overlay for build commands
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildEnvironment {
    vars: HashMap<String, String>,
}

impl BuildEnvironment {
    /// Start from the given base values (usually the current process environment)
    pub fn from_base<I, K, V>(base: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: base
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Environment for building into `layout`, on top of the process environment
    pub fn for_layout(layout: &Layout) -> Self {
        let mut env = Self::from_base(std::env::vars());
        env.add_layout(layout);
        env
    }

    /// Append the prefix search paths of `layout`
    pub fn add_layout(&mut self, layout: &Layout) {
        let prefix = &layout.prefix;
        let lib = &layout.lib_dir;

        self.add_path("PATH", &prefix.join("bin"));
        self.add_path("LD_LIBRARY_PATH", lib);
        self.add_path("PKG_CONFIG_PATH", &lib.join("pkgconfig"));
        self.add_path("PKG_CONFIG_PATH", &prefix.join("share").join("pkgconfig"));
        self.add_path("XDG_DATA_DIRS", &prefix.join("share"));
        self.add_path("ACLOCAL_PATH", &prefix.join("share").join("aclocal"));
        self.add_path(
            "PYTHONPATH",
            &lib.join("python3").join("site-packages"),
        );
    }

    /// Append `path` to the colon-separated list in `name`
    ///
    /// An unset (or empty) variable becomes just `path`.
    pub fn add_path(&mut self, name: &str, path: &Path) {
        let path = path.display().to_string();
        match self.vars.get_mut(name) {
            Some(current) if !current.is_empty() => {
                if !current.split(':').any(|p| p == path) {
                    current.push(':');
                    current.push_str(&path);
                }
            }
            _ => {
                self.vars.insert(name.to_string(), path);
            }
        }
    }

    /// Value of a variable
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Convert to environment variable map for process execution
    pub fn into_env_map(self) -> HashMap<String, String> {
        self.vars
    }
}
