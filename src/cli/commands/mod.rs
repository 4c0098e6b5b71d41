//! CLI command implementations
//!
//! Each command is implemented in its own submodule.

pub mod build;
pub mod clean;
pub mod deps;
pub mod distro;
pub mod status;

use std::path::PathBuf;

use anyhow::{Context as _, Result};
use clap::Subcommand;

use crate::cli::output::OutputConfig;
use crate::config::defaults;
use crate::core::manifest::Project;
use crate::infra::dirs::ModbuildDirs;
use crate::infra::distro::DistroInfo;

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sync every module and build the ones that changed
    Build {
        /// Number of parallel make jobs (overrides the manifest)
        #[arg(short, long)]
        jobs: Option<usize>,
    },

    /// Remove the install prefix, build outputs and in-source checkouts
    Clean,

    /// Show the last built revision of every module
    Status,

    /// Show the detected host distribution
    Distro,

    /// Host package management
    Deps {
        #[command(subcommand)]
        command: DepsCommands,
    },
}

/// Host package subcommands
#[derive(Subcommand, Debug)]
pub enum DepsCommands {
    /// Install the packages listed in the manifest
    Install {
        /// Answer yes to package manager prompts
        #[arg(short, long)]
        yes: bool,
    },

    /// List the manifest packages with their installed dependencies
    List,

    /// Purge host packages
    Remove {
        /// Packages to remove
        #[arg(required = true)]
        packages: Vec<String>,
    },

    /// Refresh package lists and upgrade installed packages
    Update {
        /// Answer yes to package manager prompts
        #[arg(short, long)]
        yes: bool,
    },
}

/// State shared by every command
#[derive(Debug, Clone)]
pub struct Context {
    /// Manifest location (absolute)
    pub manifest_path: PathBuf,
    pub output: OutputConfig,
}

impl Context {
    /// Resolve the manifest path; defaults to `modbuild.toml` in the current directory
    pub fn new(manifest: Option<PathBuf>, output: OutputConfig) -> Result<Self> {
        let current_dir = std::env::current_dir()?;
        let manifest_path = match manifest {
            Some(path) if path.is_absolute() => path,
            Some(path) => current_dir.join(path),
            None => current_dir.join(defaults::MANIFEST_FILE),
        };
        Ok(Self {
            manifest_path,
            output,
        })
    }

    /// Load and resolve the project for this host
    pub fn project(&self, distro: &DistroInfo) -> Result<Project> {
        Project::load(&self.manifest_path, &ModbuildDirs::new(), distro.use_lib64).with_context(
            || {
                format!(
                    "Failed to load project from {}",
                    self.manifest_path.display()
                )
            },
        )
    }
}

impl Commands {
    /// Execute the command
    pub async fn run(self, context: Context) -> Result<()> {
        match self {
            Self::Build { jobs } => build::execute(&context, jobs).await,
            Self::Clean => clean::execute(&context).await,
            Self::Status => status::execute(&context).await,
            Self::Distro => distro::execute(&context).await,
            Self::Deps { command } => match command {
                DepsCommands::Install { yes } => deps::execute_install(&context, yes).await,
                DepsCommands::List => deps::execute_list(&context).await,
                DepsCommands::Remove { packages } => {
                    deps::execute_remove(&context, &packages).await
                }
                DepsCommands::Update { yes } => deps::execute_update(&context, yes).await,
            },
        }
    }
}
