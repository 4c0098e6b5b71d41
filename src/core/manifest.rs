//! Manifest (modbuild.toml) parsing and validation
//!
//! The manifest lists the modules to build, in build order, plus optional
//! path, sync, build and host-system settings. String values may reference
//! environment variables with `${VAR}` syntax.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::module::{is_valid_module_name, Module};
use crate::error::ConfigError;
use crate::infra::dirs::ModbuildDirs;

/// The project manifest (modbuild.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Manifest {
    /// Directory overrides
    #[serde(default)]
    pub paths: PathsConfig,

    /// Source synchronization settings
    #[serde(default)]
    pub sync: SyncConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Host system settings
    #[serde(default)]
    pub system: SystemConfig,

    /// Modules in build order
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleSpec>,
}

/// Directory overrides; relative paths are resolved against the manifest directory
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PathsConfig {
    pub home: Option<PathBuf>,
    pub source: Option<PathBuf>,
    pub build: Option<PathBuf>,
    pub prefix: Option<PathBuf>,
    pub lib: Option<PathBuf>,
}

/// Source synchronization settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Total clone/fetch attempts for transient network failures
    #[serde(default = "default_retries")]
    pub retries: u32,
}

fn default_retries() -> u32 {
    defaults::MAX_SYNC_ATTEMPTS
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retries: default_retries(),
        }
    }
}

/// Build settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BuildConfig {
    /// Make parallelism; defaults to twice the CPU count
    pub jobs: Option<usize>,
}

/// Host system settings
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemConfig {
    /// Distro name; auto-detected when absent
    pub distro: Option<String>,

    /// Host packages the modules need
    #[serde(default)]
    pub packages: Vec<String>,
}

/// A module entry as written in the manifest
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleSpec {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub repo: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default)]
    pub options: Vec<String>,

    #[serde(default)]
    pub out_of_source: bool,
}

fn default_branch() -> String {
    defaults::DEFAULT_BRANCH.to_string()
}

/// Substitute environment variables in a string
///
/// Replaces `${VAR_NAME}` with the value of the variable, or an empty string
/// when it is unset.
pub fn substitute_env_vars(input: &str) -> String {
    let re = Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("env var pattern is valid");
    re.replace_all(input, |caps: &regex::Captures<'_>| {
        std::env::var(&caps[1]).unwrap_or_default()
    })
    .into_owned()
}

fn substitute_in_value(value: &mut toml::Value) {
    match value {
        toml::Value::String(s) => *s = substitute_env_vars(s),
        toml::Value::Array(items) => items.iter_mut().for_each(substitute_in_value),
        toml::Value::Table(table) => table.iter_mut().for_each(|(_, v)| substitute_in_value(v)),
        _ => {}
    }
}

impl Manifest {
    /// Parse from TOML, substituting `${VAR}` references
    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        let mut value: toml::Value = toml::from_str(content)?;
        substitute_in_value(&mut value);
        value.try_into()
    }

    /// Load from a file path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                ConfigError::ReadError {
                    path: path.to_path_buf(),
                    error: e.to_string(),
                }
            }
        })?;

        Self::from_toml(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Check the manifest for structural problems
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.modules.is_empty() {
            return Err(ConfigError::NoModules);
        }

        let mut seen = HashSet::new();
        for entry in &self.modules {
            if !is_valid_module_name(&entry.name) {
                return Err(ConfigError::InvalidModuleName {
                    name: entry.name.clone(),
                });
            }
            if entry.repo.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    module: entry.name.clone(),
                    field: "repo".to_string(),
                });
            }
            if entry.branch.trim().is_empty() {
                return Err(ConfigError::MissingField {
                    module: entry.name.clone(),
                    field: "branch".to_string(),
                });
            }
            if !seen.insert(entry.name.as_str()) {
                return Err(ConfigError::DuplicateModule {
                    name: entry.name.clone(),
                });
            }
        }

        if self.sync.retries == 0 {
            return Err(ConfigError::InvalidValue {
                name: "sync.retries".to_string(),
            });
        }
        if self.build.jobs == Some(0) {
            return Err(ConfigError::InvalidValue {
                name: "build.jobs".to_string(),
            });
        }

        Ok(())
    }
}

/// Resolved directory layout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    /// Root of all state; holds the state file
    pub home: PathBuf,
    /// Module checkouts live in `<source_root>/<name>`
    pub source_root: PathBuf,
    /// Out-of-source builds live in `<build_root>/<name>`
    pub build_root: PathBuf,
    /// Shared install prefix
    pub prefix: PathBuf,
    /// Shared library directory
    pub lib_dir: PathBuf,
}

impl Layout {
    /// Default layout under `dirs`
    pub fn from_dirs(dirs: &ModbuildDirs, use_lib64: bool) -> Self {
        let prefix = dirs.install_dir();
        Self {
            home: dirs.home().to_path_buf(),
            source_root: dirs.source_dir(),
            build_root: dirs.build_dir(),
            lib_dir: prefix.join(lib_name(use_lib64)),
            prefix,
        }
    }

    /// Location of the persisted build state
    pub fn state_file(&self) -> PathBuf {
        self.home.join(defaults::STATE_FILE)
    }
}

fn lib_name(use_lib64: bool) -> &'static str {
    if use_lib64 {
        "lib64"
    } else {
        "lib"
    }
}

/// A validated manifest with every path resolved
#[derive(Debug, Clone)]
pub struct Project {
    pub layout: Layout,
    /// Modules in build order
    pub modules: Vec<Module>,
    /// Total clone/fetch attempts
    pub sync_attempts: u32,
    /// Make parallelism override
    pub jobs: Option<usize>,
    pub system: SystemConfig,
}

impl Project {
    /// Load, validate and resolve the manifest at `manifest_path`
    pub fn load(
        manifest_path: &Path,
        dirs: &ModbuildDirs,
        use_lib64: bool,
    ) -> Result<Self, ConfigError> {
        let manifest = Manifest::load(manifest_path)?;
        let base = manifest_path.parent().unwrap_or_else(|| Path::new("."));
        Self::resolve(manifest, base, dirs, use_lib64)
    }

    /// Validate `manifest` and resolve its paths against `base`
    pub fn resolve(
        manifest: Manifest,
        base: &Path,
        dirs: &ModbuildDirs,
        use_lib64: bool,
    ) -> Result<Self, ConfigError> {
        manifest.validate()?;

        let absolute = |p: &PathBuf| {
            if p.is_absolute() {
                p.clone()
            } else {
                base.join(p)
            }
        };

        let dirs = match &manifest.paths.home {
            Some(home) => ModbuildDirs::with_home(absolute(home)),
            None => dirs.clone(),
        };
        let fallback = Layout::from_dirs(&dirs, use_lib64);

        let prefix = manifest.paths.prefix.as_ref().map_or(fallback.prefix, absolute);
        let lib_dir = manifest
            .paths
            .lib
            .as_ref()
            .map_or_else(|| prefix.join(lib_name(use_lib64)), absolute);

        let layout = Layout {
            home: fallback.home,
            source_root: manifest
                .paths
                .source
                .as_ref()
                .map_or(fallback.source_root, absolute),
            build_root: manifest
                .paths
                .build
                .as_ref()
                .map_or(fallback.build_root, absolute),
            prefix,
            lib_dir,
        };

        let modules = manifest
            .modules
            .into_iter()
            .map(|entry| {
                Module::new(entry.name, entry.repo)
                    .with_branch(entry.branch)
                    .with_options(entry.options)
                    .with_out_of_source(entry.out_of_source)
                    .located_in(&layout.source_root, &layout.build_root)
            })
            .collect();

        Ok(Self {
            layout,
            modules,
            sync_attempts: manifest.sync.retries,
            jobs: manifest.build.jobs,
            system: manifest.system,
        })
    }
}
