//! Build-state store
//!
//! Records, per module, the revision that was last built successfully.
//! The state file is the single source of truth for "is this module up to
//! date": an entry exists only for a revision whose build completed.
//!
//! ```json
//! {
//!   "built_modules": {
//!     "libfoo": "3f786850e387550fdab836ed7e6dc881de23001b"
//!   }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;

use crate::core::module::Module;
use crate::error::StateError;

/// Opaque identifier of a module's checked-out source
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Revision(String);

impl Revision {
    /// Wrap a revision string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form for display
    pub fn short(&self) -> &str {
        self.0.get(..12).unwrap_or(&self.0)
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// In-memory build state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildState {
    /// Module name -> last successfully built revision
    built_modules: BTreeMap<String, Revision>,
}

impl BuildState {
    /// Empty state (nothing built)
    pub fn new() -> Self {
        Self::default()
    }

    /// Revision last built for `name`
    pub fn get(&self, name: &str) -> Option<&Revision> {
        self.built_modules.get(name)
    }

    /// Record a successful build of `name` at `revision`
    pub fn set(&mut self, name: &str, revision: Revision) {
        tracing::debug!(module = name, revision = %revision, "recording built revision");
        self.built_modules.insert(name.to_string(), revision);
    }

    /// Point invalidation; returns whether an entry was removed
    pub fn invalidate(&mut self, name: &str) -> bool {
        self.built_modules.remove(name).is_some()
    }

    /// Drop the entries of every module strictly after `index` in `modules`
    ///
    /// Returns the names that were actually removed.
    pub fn invalidate_suffix(&mut self, modules: &[Module], index: usize) -> Vec<String> {
        let mut removed = Vec::new();
        for module in modules.iter().skip(index.saturating_add(1)) {
            if self.invalidate(&module.name) {
                removed.push(module.name.clone());
            }
        }
        if !removed.is_empty() {
            tracing::debug!(modules = ?removed, "invalidated downstream modules");
        }
        removed
    }

    /// Forget every recorded module
    pub fn clear(&mut self) {
        self.built_modules.clear();
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.built_modules.is_empty()
    }

    /// Number of recorded modules
    pub fn len(&self) -> usize {
        self.built_modules.len()
    }

    /// Iterate over recorded modules in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Revision)> {
        self.built_modules.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Durable storage for [`BuildState`]
pub trait StateStore {
    /// Load the persisted state, or an empty state when nothing was persisted
    fn load(&self) -> Result<BuildState, StateError>;

    /// Replace the persisted state with `state`
    fn save(&self, state: &BuildState) -> Result<(), StateError>;
}

/// JSON file backed state store
#[derive(Debug, Clone)]
pub struct JsonStateStore {
    path: PathBuf,
}

impl JsonStateStore {
    /// Store backed by the file at `path`
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl StateStore for JsonStateStore {
    fn load(&self) -> Result<BuildState, StateError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %self.path.display(), "no build state yet, starting empty");
                return Ok(BuildState::new());
            }
            Err(e) => {
                return Err(StateError::Read {
                    path: self.path.clone(),
                    error: e.to_string(),
                })
            }
        };

        let state: BuildState =
            serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        tracing::debug!(path = %self.path.display(), modules = state.len(), "loaded build state");
        Ok(state)
    }

    fn save(&self, state: &BuildState) -> Result<(), StateError> {
        let write_err = |e: io::Error| StateError::Write {
            path: self.path.clone(),
            error: e.to_string(),
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let content = serde_json::to_string_pretty(state).map_err(|e| StateError::Write {
            path: self.path.clone(),
            error: e.to_string(),
        })?;

        // Write to a sibling temp file, then rename over the target
        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(".tmp");
        let temp_path = PathBuf::from(temp_name);
        fs::write(&temp_path, content).map_err(write_err)?;
        fs::rename(&temp_path, &self.path).map_err(write_err)?;

        tracing::debug!(path = %self.path.display(), modules = state.len(), "saved build state");
        Ok(())
    }
}
