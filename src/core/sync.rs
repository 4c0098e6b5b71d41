//! Repository sync
//!
//! Brings a module's checkout up to date with its remote and reports the
//! revision the working tree ends up at.

use crate::config::defaults;
use crate::core::module::Module;
use crate::core::orchestrator::SourceSync;
use crate::core::state::Revision;
use crate::error::SyncError;
use crate::infra::filesystem;
use crate::infra::git::Vcs;

/// [`SourceSync`] over a version-control collaborator
#[derive(Debug, Clone)]
pub struct RepositorySync<V> {
    vcs: V,
    remote: String,
}

impl<V: Vcs> RepositorySync<V> {
    /// Sync through `vcs` using the default remote name
    pub fn new(vcs: V) -> Self {
        Self {
            vcs,
            remote: defaults::DEFAULT_REMOTE.to_string(),
        }
    }

    /// The underlying version-control collaborator
    pub fn vcs(&self) -> &V {
        &self.vcs
    }
}

impl<V: Vcs> SourceSync for RepositorySync<V> {
    fn sync(&self, module: &Module) -> Result<Revision, SyncError> {
        let source_dir = module.source_dir();

        if source_dir.exists() {
            tracing::debug!(module = %module.name, "updating existing checkout");
            self.vcs.set_remote(source_dir, &self.remote, &module.repo)?;
            self.vcs.fetch(source_dir, &self.remote)?;
        } else {
            if let Some(parent) = source_dir.parent() {
                filesystem::create_dir_all(parent)?;
            }
            self.vcs.clone_repo(&module.repo, source_dir)?;
        }

        self.vcs.checkout(source_dir, &self.remote, &module.branch)?;

        let revision = self.vcs.resolve_head(source_dir)?;
        tracing::info!(module = %module.name, revision = %revision, "source synced");
        Ok(revision)
    }
}
