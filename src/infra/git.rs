//! Git operations
//!
//! Network-facing operations (clone, fetch, remote repair, checkout) shell
//! out to the `git` CLI so they behave exactly like an interactive checkout.
//! Reading the checked-out revision uses the gix crate.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::state::Revision;
use crate::infra::command::{CommandError, CommandRunner};

/// Git operation errors
#[derive(Error, Debug)]
pub enum GitError {
    /// Failed to clone repository
    #[error("Failed to clone '{url}': {source}")]
    CloneFailed {
        url: String,
        #[source]
        source: CommandError,
    },

    /// Failed to point the remote at the configured URL
    #[error("Failed to set remote '{remote}' to '{url}' in '{}': {source}", repo.display())]
    SetRemoteFailed {
        repo: PathBuf,
        remote: String,
        url: String,
        #[source]
        source: CommandError,
    },

    /// Failed to fetch from the remote
    #[error("Failed to fetch '{remote}' in '{}': {source}", repo.display())]
    FetchFailed {
        repo: PathBuf,
        remote: String,
        #[source]
        source: CommandError,
    },

    /// Failed to checkout branch
    #[error("Failed to checkout branch '{branch}' in '{}': {source}", repo.display())]
    CheckoutFailed {
        repo: PathBuf,
        branch: String,
        #[source]
        source: CommandError,
    },

    /// Failed to resolve HEAD to a commit
    #[error("Failed to resolve HEAD in '{}': {error}", repo.display())]
    ResolveFailed { repo: PathBuf, error: String },

    /// Invalid repository
    #[error("Invalid repository at '{}': {error}", path.display())]
    InvalidRepository { path: PathBuf, error: String },
}

/// Version-control collaborator used by repository sync
pub trait Vcs {
    /// Clone `url` into `dest` (which must not exist yet)
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError>;

    /// Point `remote` of the repository at `url`
    fn set_remote(&self, repo: &Path, remote: &str, url: &str) -> Result<(), GitError>;

    /// Fetch updates for `remote`
    fn fetch(&self, repo: &Path, remote: &str) -> Result<(), GitError>;

    /// Check out `branch` at the tip last fetched from `remote`
    fn checkout(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), GitError>;

    /// Commit the working tree is at
    fn resolve_head(&self, repo: &Path) -> Result<Revision, GitError>;
}

/// [`Vcs`] implementation backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    runner: CommandRunner,
    /// Total attempts for clone/fetch
    attempts: u32,
}

impl GitCli {
    /// Create a git collaborator retrying network operations `attempts` times in total
    pub fn new(runner: CommandRunner, attempts: u32) -> Self {
        Self { runner, attempts }
    }
}

impl Vcs for GitCli {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), GitError> {
        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        tracing::info!(url, dest = %dest.display(), "cloning");

        self.runner
            .capture_with_retry(
                &[
                    OsStr::new("git"),
                    OsStr::new("clone"),
                    OsStr::new("--progress"),
                    OsStr::new(url),
                    dest.as_os_str(),
                ],
                parent,
                self.attempts,
            )
            .map(drop)
            .map_err(|source| GitError::CloneFailed {
                url: url.to_string(),
                source,
            })
    }

    fn set_remote(&self, repo: &Path, remote: &str, url: &str) -> Result<(), GitError> {
        self.runner
            .capture(&["git", "remote", "set-url", remote, url], repo)
            .map(drop)
            .map_err(|source| GitError::SetRemoteFailed {
                repo: repo.to_path_buf(),
                remote: remote.to_string(),
                url: url.to_string(),
                source,
            })
    }

    fn fetch(&self, repo: &Path, remote: &str) -> Result<(), GitError> {
        tracing::info!(repo = %repo.display(), remote, "fetching");

        self.runner
            .capture_with_retry(&["git", "remote", "update", remote], repo, self.attempts)
            .map(drop)
            .map_err(|source| GitError::FetchFailed {
                repo: repo.to_path_buf(),
                remote: remote.to_string(),
                source,
            })
    }

    fn checkout(&self, repo: &Path, remote: &str, branch: &str) -> Result<(), GitError> {
        // -B moves an existing local branch to the fetched tip
        let upstream = format!("{remote}/{branch}");
        self.runner
            .capture(&["git", "checkout", "-B", branch, upstream.as_str()], repo)
            .map(drop)
            .map_err(|source| GitError::CheckoutFailed {
                repo: repo.to_path_buf(),
                branch: branch.to_string(),
                source,
            })
    }

    fn resolve_head(&self, repo: &Path) -> Result<Revision, GitError> {
        resolve_head(repo)
    }
}

/// Resolve the commit HEAD points at
pub fn resolve_head(repo_path: &Path) -> Result<Revision, GitError> {
    let repo = gix::open(repo_path).map_err(|e| GitError::InvalidRepository {
        path: repo_path.to_path_buf(),
        error: e.to_string(),
    })?;

    let id = repo.head_id().map_err(|e| GitError::ResolveFailed {
        repo: repo_path.to_path_buf(),
        error: e.to_string(),
    })?;

    Ok(Revision::new(id.to_hex().to_string()))
}
