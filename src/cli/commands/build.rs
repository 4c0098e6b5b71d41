//! Build command implementation
//!
//! Implements `modbuild build`: wires the git, build and state collaborators
//! for this host and runs the orchestrator over the manifest's modules.

use std::cell::RefCell;

use anyhow::{Context as _, Result};
use indicatif::ProgressBar;

use super::Context;
use crate::cli::output::{module_banner, OutputConfig};
use crate::core::build_env::BuildEnvironment;
use crate::core::clean::prepare_prefix;
use crate::core::executor::BuildExecutor;
use crate::core::module::Module;
use crate::core::orchestrator::{Orchestrator, Outcome, Progress};
use crate::core::state::{JsonStateStore, Revision, StateStore};
use crate::core::sync::RepositorySync;
use crate::infra::command::CommandRunner;
use crate::infra::distro::DistroInfo;
use crate::infra::git::GitCli;

/// Execute the build command
pub async fn execute(context: &Context, jobs: Option<usize>) -> Result<()> {
    let context = context.clone();
    // Builds block for minutes; keep them off the async runtime
    tokio::task::spawn_blocking(move || run(&context, jobs))
        .await
        .context("Build task failed")?
}

fn run(context: &Context, jobs: Option<usize>) -> Result<()> {
    let distro = DistroInfo::detect();
    let project = context.project(&distro)?;
    let output = context.output;

    let env = BuildEnvironment::for_layout(&project.layout);
    let runner = CommandRunner::new()
        .with_env(env.into_env_map())
        .with_quiet(output.quiet);

    let sync = RepositorySync::new(GitCli::new(runner.clone(), project.sync_attempts));
    let mut executor = BuildExecutor::new(runner, &project.layout);
    if let Some(jobs) = jobs.or(project.jobs) {
        executor = executor.with_jobs(jobs);
    }
    let store = JsonStateStore::new(project.layout.state_file());

    let mut state = store.load()?;
    prepare_prefix(&project.layout, &mut state)?;
    tracing::info!(
        modules = project.modules.len(),
        jobs = executor.jobs(),
        prefix = %project.layout.prefix.display(),
        "starting build"
    );

    let progress = CliProgress::new(output);
    let report = Orchestrator::new(&sync, &executor, &store)
        .with_progress(&progress)
        .run(&project.modules, &mut state);
    progress.clear();
    let report = report?;

    output.success(&format!(
        "{} built, {} up to date",
        report.built(),
        report.up_to_date()
    ));
    Ok(())
}

/// Prints banners and a sync spinner as modules are processed
struct CliProgress {
    output: OutputConfig,
    spinner: RefCell<Option<ProgressBar>>,
}

impl CliProgress {
    fn new(output: OutputConfig) -> Self {
        Self {
            output,
            spinner: RefCell::new(None),
        }
    }

    fn clear(&self) {
        if let Some(spinner) = self.spinner.borrow_mut().take() {
            spinner.finish_and_clear();
        }
    }
}

impl Progress for CliProgress {
    fn module_started(&self, module: &Module) {
        self.output.line(&module_banner(&module.name));
        let spinner = self.output.spinner(&format!("Syncing {}", module.name));
        *self.spinner.borrow_mut() = Some(spinner);
    }

    fn module_synced(&self, _module: &Module, _revision: &Revision) {
        self.clear();
    }

    fn module_finished(&self, module: &Module, outcome: &Outcome) {
        match outcome {
            Outcome::UpToDate => self.output.info(&format!("{} is up to date", module.name)),
            Outcome::Built { revision } => self
                .output
                .success(&format!("Built {} at {}", module.name, revision.short())),
        }
    }
}
