//! Build execution
//!
//! Runs the build/install sequence for a detected build system and reports
//! the revision that was built.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::config::defaults;
use crate::core::detect::BuildSystem;
use crate::core::manifest::Layout;
use crate::core::module::Module;
use crate::core::orchestrator::ModuleBuilder;
use crate::core::state::Revision;
use crate::error::BuildError;
use crate::infra::command::{CommandError, CommandRunner};
use crate::infra::filesystem;
use crate::infra::git::resolve_head;

/// Make parallelism used when none is configured
pub fn default_jobs() -> usize {
    num_cpus::get() * defaults::JOBS_PER_CORE
}

/// [`ModuleBuilder`] that shells out to the module's own build tooling
#[derive(Debug, Clone)]
pub struct BuildExecutor {
    runner: CommandRunner,
    prefix: PathBuf,
    lib_dir: PathBuf,
    jobs: usize,
}

impl BuildExecutor {
    /// Builder installing into the shared locations of `layout`
    pub fn new(runner: CommandRunner, layout: &Layout) -> Self {
        Self {
            runner,
            prefix: layout.prefix.clone(),
            lib_dir: layout.lib_dir.clone(),
            jobs: default_jobs(),
        }
    }

    /// Override make parallelism
    #[must_use]
    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Make parallelism in use
    pub fn jobs(&self) -> usize {
        self.jobs
    }

    /// Directory the build runs in, created for out-of-source builds
    fn prepare_work_dir(&self, module: &Module) -> Result<PathBuf, BuildError> {
        let work_dir = module.work_dir();
        if module.out_of_source {
            filesystem::create_dir_all(work_dir)?;
        }
        Ok(work_dir.to_path_buf())
    }

    /// Bootstrap command line for an autotools module
    pub fn autogen_command(&self, module: &Module) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            module.source_dir().join(defaults::AUTOTOOLS_MARKER).into(),
            "--prefix".into(),
            self.prefix.clone().into(),
            "--libdir".into(),
            self.lib_dir.clone().into(),
        ];
        args.extend(module.options.iter().map(OsString::from));
        args
    }

    fn build_make(&self, work_dir: &Path) -> Result<(), CommandError> {
        self.runner.run(&["make"], work_dir)
    }

    fn build_autotools(&self, module: &Module, work_dir: &Path) -> Result<(), BuildError> {
        self.runner.run(&self.autogen_command(module), work_dir)?;

        let jobs = self.jobs.to_string();
        self.runner.run(&["make", "-j", jobs.as_str()], work_dir)?;
        self.runner.run(&["make", "install"], work_dir)?;

        let purged = filesystem::purge_libtool_archives(&self.lib_dir)?;
        if purged > 0 {
            tracing::debug!(module = %module.name, count = purged, "purged libtool archives");
        }
        Ok(())
    }

    fn build_activity(&self, module: &Module) -> Result<(), CommandError> {
        let setup = Path::new(".").join(defaults::ACTIVITY_MARKER);
        self.runner.run(
            &[
                setup.as_os_str(),
                OsStr::new("install"),
                OsStr::new("--prefix"),
                self.prefix.as_os_str(),
            ],
            module.source_dir(),
        )
    }
}

impl ModuleBuilder for BuildExecutor {
    fn execute(&self, module: &Module, kind: BuildSystem) -> Result<Revision, BuildError> {
        tracing::info!(module = %module.name, build_system = %kind, "building");

        match kind {
            BuildSystem::Make => {
                let work_dir = self.prepare_work_dir(module)?;
                self.build_make(&work_dir)?;
            }
            BuildSystem::Autotools => {
                let work_dir = self.prepare_work_dir(module)?;
                self.build_autotools(module, &work_dir)?;
            }
            BuildSystem::Activity => self.build_activity(module)?,
            BuildSystem::Unknown => {
                return Err(BuildError::Unsupported {
                    path: module.source_dir().to_path_buf(),
                });
            }
        }

        Ok(resolve_head(module.source_dir())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::git::{commit_file, init_upstream, skip_without, GIT, MAKE};
    use tempfile::TempDir;

    fn layout(root: &Path) -> Layout {
        Layout {
            home: root.to_path_buf(),
            source_root: root.join("source"),
            build_root: root.join("build"),
            prefix: root.join("install"),
            lib_dir: root.join("install").join("lib"),
        }
    }

    #[test]
    fn test_default_jobs_is_twice_cpu_count() {
        assert_eq!(default_jobs(), num_cpus::get() * 2);
    }

    #[test]
    fn test_with_jobs_never_zero() {
        let temp = TempDir::new().unwrap();
        let executor = BuildExecutor::new(CommandRunner::new(), &layout(temp.path())).with_jobs(0);
        assert_eq!(executor.jobs(), 1);
    }

    #[test]
    fn test_autogen_command_line() {
        let executor = BuildExecutor::new(CommandRunner::new(), &layout(Path::new("/mb")));
        let module = Module::new("libfoo", "url")
            .with_options(vec!["--disable-docs".to_string()])
            .located_in(Path::new("/mb/source"), Path::new("/mb/build"));

        let args = executor.autogen_command(&module);

        let args: Vec<String> = args.iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec![
                "/mb/source/libfoo/autogen.sh",
                "--prefix",
                "/mb/install",
                "--libdir",
                "/mb/install/lib",
                "--disable-docs",
            ]
        );
    }

    #[test]
    fn test_unknown_build_system_is_error() {
        let temp = TempDir::new().unwrap();
        let executor = BuildExecutor::new(CommandRunner::new(), &layout(temp.path()));
        let module = Module::new("x", "url").located_in(temp.path(), temp.path());

        assert!(matches!(
            executor.execute(&module, BuildSystem::Unknown),
            Err(BuildError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_make_build_returns_head_revision() {
        if skip_without(GIT) || skip_without(MAKE) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        let source = layout.source_root.join("libfoo");
        init_upstream(&source);
        let head = commit_file(&source, "Makefile", "all:\n\ttouch built.txt\n");
        let module = Module::new("libfoo", "url").located_in(&layout.source_root, &layout.build_root);

        let executor = BuildExecutor::new(CommandRunner::new().with_quiet(true), &layout);
        let revision = executor.execute(&module, BuildSystem::Make).unwrap();

        assert_eq!(revision, head);
        assert!(source.join("built.txt").exists());
    }

    #[test]
    fn test_out_of_source_creates_build_dir() {
        if skip_without(GIT) || skip_without(MAKE) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        let source = layout.source_root.join("libfoo");
        init_upstream(&source);
        commit_file(&source, "Makefile", "all:\n\ttouch built.txt\n");
        // make in the empty build dir has no Makefile to read
        let module = Module::new("libfoo", "url")
            .with_out_of_source(true)
            .located_in(&layout.source_root, &layout.build_root);

        let executor = BuildExecutor::new(CommandRunner::new().with_quiet(true), &layout);
        let result = executor.execute(&module, BuildSystem::Make);

        assert!(layout.build_root.join("libfoo").is_dir());
        assert!(matches!(result, Err(BuildError::Command(_))));
    }

    #[test]
    fn test_failing_make_is_build_error() {
        if skip_without(GIT) || skip_without(MAKE) {
            return;
        }
        let temp = TempDir::new().unwrap();
        let layout = layout(temp.path());
        let source = layout.source_root.join("libfoo");
        init_upstream(&source);
        commit_file(&source, "Makefile", "all:\n\tfalse\n");
        let module = Module::new("libfoo", "url").located_in(&layout.source_root, &layout.build_root);

        let executor = BuildExecutor::new(CommandRunner::new().with_quiet(true), &layout);

        assert!(matches!(
            executor.execute(&module, BuildSystem::Make),
            Err(BuildError::Command(CommandError::Failed { .. }))
        ));
    }
}
