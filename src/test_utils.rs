//! Test utilities
//!
//! Fixtures for tests that need real git repositories or build trees.

#[cfg(test)]
pub mod git {
    use std::path::{Path, PathBuf};

    use crate::core::state::Revision;
    use crate::infra::command::CommandRunner;
    use crate::infra::git::resolve_head;

    pub const GIT: &str = "git";
    pub const MAKE: &str = "make";

    /// Returns true (and logs) when `tool` is not installed
    pub fn skip_without(tool: &str) -> bool {
        if which::which(tool).is_err() {
            eprintln!("skipping: '{tool}' not found in PATH");
            return true;
        }
        false
    }

    fn git(repo: &Path, args: &[&str]) {
        let mut full = vec!["git", "-c", "user.name=modbuild", "-c", "user.email=modbuild@localhost"];
        full.extend_from_slice(args);
        CommandRunner::new()
            .capture(&full, repo)
            .unwrap_or_else(|e| panic!("git {args:?} failed: {e}"));
    }

    /// Create an empty upstream repository whose default branch is `master`
    pub fn init_upstream(path: &Path) -> PathBuf {
        std::fs::create_dir_all(path).unwrap();
        git(path, &["init", "-q"]);
        git(path, &["symbolic-ref", "HEAD", "refs/heads/master"]);
        path.to_path_buf()
    }

    /// Write `file` and commit it, returning the new commit
    pub fn commit_file(repo: &Path, file: &str, content: &str) -> Revision {
        let path = repo.join(file);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        git(repo, &["add", "-A"]);
        let message = format!("update {file}");
        git(repo, &["commit", "-q", "-m", message.as_str()]);
        resolve_head(repo).unwrap()
    }
}

#[cfg(test)]
pub mod fakes {
    //! In-memory collaborators for orchestrator tests

    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};

    use crate::core::detect::BuildSystem;
    use crate::core::module::Module;
    use crate::core::orchestrator::{ModuleBuilder, SourceSync};
    use crate::core::state::{BuildState, Revision, StateStore};
    use crate::error::{BuildError, StateError, SyncError};
    use crate::infra::command::CommandError;

    /// Upstream revisions, editable between runs
    #[derive(Debug, Default)]
    pub struct FakeUpstream {
        revisions: RefCell<HashMap<String, Revision>>,
        broken: RefCell<HashSet<String>>,
        pub synced: RefCell<Vec<String>>,
    }

    impl FakeUpstream {
        pub fn set(&self, module: &str, revision: &str) {
            self.revisions
                .borrow_mut()
                .insert(module.to_string(), Revision::new(revision));
        }

        pub fn break_module(&self, module: &str) {
            self.broken.borrow_mut().insert(module.to_string());
        }

        pub fn revision(&self, module: &str) -> Revision {
            self.revisions.borrow()[module].clone()
        }
    }

    impl SourceSync for FakeUpstream {
        fn sync(&self, module: &Module) -> Result<Revision, SyncError> {
            self.synced.borrow_mut().push(module.name.clone());
            if self.broken.borrow().contains(&module.name) {
                return Err(SyncError::Git(crate::infra::git::GitError::FetchFailed {
                    repo: module.source_dir().to_path_buf(),
                    remote: "origin".to_string(),
                    source: CommandError::Failed {
                        command: "git remote update origin".to_string(),
                        code: Some(128),
                        stderr: "fatal: not a git repository".to_string(),
                    },
                }));
            }
            Ok(self.revision(&module.name))
        }
    }

    /// Builder recording its invocations; fails for chosen modules
    #[derive(Debug)]
    pub struct FakeBuilder<'a> {
        upstream: &'a FakeUpstream,
        failing: RefCell<HashSet<String>>,
        pub built: RefCell<Vec<(String, BuildSystem)>>,
    }

    impl<'a> FakeBuilder<'a> {
        pub fn new(upstream: &'a FakeUpstream) -> Self {
            Self {
                upstream,
                failing: RefCell::default(),
                built: RefCell::default(),
            }
        }

        pub fn fail(&self, module: &str) {
            self.failing.borrow_mut().insert(module.to_string());
        }

        pub fn built_names(&self) -> Vec<String> {
            self.built.borrow().iter().map(|(n, _)| n.clone()).collect()
        }

        pub fn reset(&self) {
            self.built.borrow_mut().clear();
        }
    }

    impl ModuleBuilder for FakeBuilder<'_> {
        fn execute(&self, module: &Module, kind: BuildSystem) -> Result<Revision, BuildError> {
            self.built.borrow_mut().push((module.name.clone(), kind));
            if self.failing.borrow().contains(&module.name) {
                return Err(BuildError::Command(CommandError::Failed {
                    command: "make".to_string(),
                    code: Some(2),
                    stderr: String::new(),
                }));
            }
            Ok(self.upstream.revision(&module.name))
        }
    }

    /// State store keeping the last saved state in memory
    #[derive(Debug, Default)]
    pub struct MemoryStore {
        pub saved: RefCell<Option<BuildState>>,
        pub saves: RefCell<usize>,
    }

    impl MemoryStore {
        pub fn persisted(&self) -> BuildState {
            self.saved.borrow().clone().unwrap_or_default()
        }
    }

    impl StateStore for MemoryStore {
        fn load(&self) -> Result<BuildState, StateError> {
            Ok(self.persisted())
        }

        fn save(&self, state: &BuildState) -> Result<(), StateError> {
            *self.saved.borrow_mut() = Some(state.clone());
            *self.saves.borrow_mut() += 1;
            Ok(())
        }
    }
}
