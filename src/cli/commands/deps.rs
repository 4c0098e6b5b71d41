//! CLI implementation for `modbuild deps`
//!
//! Host packages are listed under `[system] packages` in the manifest. The
//! package manager is chosen from `[system] distro`, or from the detected
//! host distribution when that is not set.

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::manifest::Project;
use crate::infra::command::CommandRunner;
use crate::infra::distro::DistroInfo;
use crate::infra::package_manager::{package_manager_for, PackageManager};

fn package_manager(
    context: &Context,
    interactive: bool,
) -> Result<(Project, Box<dyn PackageManager>)> {
    let host = DistroInfo::detect();
    let project = context.project(&host)?;
    let distro = project.system.distro.clone().unwrap_or_else(|| host.name.clone());
    tracing::debug!(distro = %distro, "selecting package manager");

    let runner = CommandRunner::new().with_quiet(context.output.quiet);
    let manager = package_manager_for(&distro, runner, interactive)?;
    Ok((project, manager))
}

/// Install the manifest's host packages
pub async fn execute_install(context: &Context, yes: bool) -> Result<()> {
    let (project, manager) = package_manager(context, !yes)?;
    let packages = &project.system.packages;

    if packages.is_empty() {
        context.output.success("No system packages listed");
        return Ok(());
    }

    manager
        .install(packages)
        .with_context(|| "Failed to install system packages")?;
    context
        .output
        .success(&format!("Installed {} packages", packages.len()));
    Ok(())
}

/// Print the manifest's host packages with their installed dependencies
pub async fn execute_list(context: &Context) -> Result<()> {
    let (project, manager) = package_manager(context, true)?;

    let packages = manager
        .find_with_deps(&project.system.packages)
        .with_context(|| "Failed to read the package database")?;
    for package in packages {
        println!("{package}");
    }
    Ok(())
}

/// Purge the given host packages
pub async fn execute_remove(context: &Context, packages: &[String]) -> Result<()> {
    let (_, manager) = package_manager(context, true)?;

    manager
        .remove(packages)
        .with_context(|| "Failed to remove system packages")?;
    context
        .output
        .success(&format!("Removed {} packages", packages.len()));
    Ok(())
}

/// Refresh package lists and upgrade the host
pub async fn execute_update(context: &Context, yes: bool) -> Result<()> {
    let (_, manager) = package_manager(context, !yes)?;

    manager
        .update()
        .with_context(|| "Failed to update system packages")?;
    context.output.success("System packages updated");
    Ok(())
}
