//! Incremental build orchestration
//!
//! Walks the ordered module list once. For each module the source is synced
//! and its revision compared with the last successfully built one; an equal
//! revision skips the module, anything else invalidates the module and
//! everything after it, then builds it and records the result.
//!
//! Per-module states:
//!
//! ```text
//! PENDING -> SYNCED -> UP_TO_DATE
//!                   -> BUILDING -> BUILT
//!         (any step) -> FAILED (aborts the run)
//! ```
//!
//! The state is persisted after every successful build, so an interrupted
//! run keeps every module it completed.

use crate::core::detect::{detect, BuildSystem};
use crate::core::module::Module;
use crate::core::state::{BuildState, Revision, StateStore};
use crate::error::{BuildError, ModbuildError, SyncError};

/// Brings a module's source up to date
pub trait SourceSync {
    /// Sync the module and return the revision now checked out
    fn sync(&self, module: &Module) -> Result<Revision, SyncError>;
}

/// Builds and installs a module
pub trait ModuleBuilder {
    /// Build `module` with `kind`, returning the revision that was built
    fn execute(&self, module: &Module, kind: BuildSystem) -> Result<Revision, BuildError>;
}

/// What happened to one module during a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Stored revision matched the synced one; nothing was built
    UpToDate,
    /// Built and recorded at `revision`
    Built { revision: Revision },
}

/// Per-module outcomes of a completed run, in build order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    pub modules: Vec<(String, Outcome)>,
}

impl RunReport {
    /// Number of modules that were built
    pub fn built(&self) -> usize {
        self.modules
            .iter()
            .filter(|(_, o)| matches!(o, Outcome::Built { .. }))
            .count()
    }

    /// Number of modules that were already up to date
    pub fn up_to_date(&self) -> usize {
        self.modules
            .iter()
            .filter(|(_, o)| *o == Outcome::UpToDate)
            .count()
    }
}

/// Observer for per-module progress
///
/// The CLI uses it for banners and spinners; the default methods do nothing.
pub trait Progress {
    /// A module is about to be processed
    fn module_started(&self, _module: &Module) {}

    /// A module's source is synced
    fn module_synced(&self, _module: &Module, _revision: &Revision) {}

    /// A module finished with `outcome`
    fn module_finished(&self, _module: &Module, _outcome: &Outcome) {}
}

/// Progress observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl Progress for NoProgress {}

/// Drives sync, detection, build and state updates over a module list
pub struct Orchestrator<'a, S, B, T> {
    sync: &'a S,
    builder: &'a B,
    store: &'a T,
    progress: &'a dyn Progress,
}

impl<'a, S, B, T> Orchestrator<'a, S, B, T>
where
    S: SourceSync,
    B: ModuleBuilder,
    T: StateStore,
{
    /// Create an orchestrator over the given collaborators
    pub fn new(sync: &'a S, builder: &'a B, store: &'a T) -> Self {
        Self {
            sync,
            builder,
            store,
            progress: &NoProgress,
        }
    }

    /// Report progress to `progress`
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Process `modules` in order, updating and persisting `state`
    ///
    /// Stops at the first failure. Everything built before that point has
    /// already been persisted; the failing module has no entry.
    pub fn run(
        &self,
        modules: &[Module],
        state: &mut BuildState,
    ) -> Result<RunReport, ModbuildError> {
        let mut report = RunReport::default();

        for (index, module) in modules.iter().enumerate() {
            self.progress.module_started(module);
            let outcome = self.process(modules, index, state)?;
            self.progress.module_finished(module, &outcome);
            report.modules.push((module.name.clone(), outcome));
        }

        tracing::info!(
            built = report.built(),
            up_to_date = report.up_to_date(),
            "run complete"
        );
        Ok(report)
    }

    fn process(
        &self,
        modules: &[Module],
        index: usize,
        state: &mut BuildState,
    ) -> Result<Outcome, ModbuildError> {
        let module = &modules[index];

        let revision = self.sync.sync(module).map_err(|source| ModbuildError::Sync {
            module: module.name.clone(),
            source,
        })?;
        self.progress.module_synced(module, &revision);

        if state.get(&module.name) == Some(&revision) {
            tracing::info!(module = %module.name, revision = %revision, "up to date");
            return Ok(Outcome::UpToDate);
        }

        // Stale: drop this entry and everything downstream before building
        state.invalidate(&module.name);
        let downstream = state.invalidate_suffix(modules, index);
        if !downstream.is_empty() {
            tracing::info!(module = %module.name, invalidated = ?downstream, "invalidated downstream modules");
        }
        self.store.save(state)?;

        let kind = detect(module.source_dir());
        if kind == BuildSystem::Unknown {
            return Err(ModbuildError::Detection {
                module: module.name.clone(),
                path: module.source_dir().to_path_buf(),
            });
        }
        tracing::debug!(module = %module.name, build_system = %kind, "detected build system");

        let built = self
            .builder
            .execute(module, kind)
            .map_err(|source| ModbuildError::Build {
                module: module.name.clone(),
                source,
            })?;

        state.set(&module.name, built.clone());
        self.store.save(state)?;

        Ok(Outcome::Built { revision: built })
    }
}
