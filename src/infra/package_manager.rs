//! Host package management
//!
//! Installs the system packages modules need to build. One implementation
//! per distribution family, picked explicitly from the distro name.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use thiserror::Error;

use crate::infra::command::{CommandError, CommandRunner};

/// Package manager errors
#[derive(Error, Debug)]
pub enum PackageManagerError {
    /// A package tool exited non-zero
    #[error("Package manager command failed: {0}")]
    Command(#[from] CommandError),

    /// No implementation for this distribution
    #[error("No package manager available for distribution '{name}'")]
    UnsupportedDistro { name: String },
}

/// Host package manager
pub trait PackageManager {
    /// Install `packages`
    fn install(&self, packages: &[String]) -> Result<(), PackageManagerError>;

    /// Remove (purge) `packages`
    fn remove(&self, packages: &[String]) -> Result<(), PackageManagerError>;

    /// Refresh package lists and upgrade installed packages
    fn update(&self) -> Result<(), PackageManagerError>;

    /// Names of all installed packages
    fn find_all_installed(&self) -> Result<BTreeSet<String>, PackageManagerError>;

    /// `names` plus their installed transitive dependencies
    fn find_with_deps(&self, names: &[String]) -> Result<Vec<String>, PackageManagerError>;
}

/// One package known to the package database
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageRecord {
    pub name: String,
    pub installed: bool,
    /// Dependencies; each inner list holds the alternatives of one `a | b` group
    pub depends: Vec<Vec<String>>,
    /// Virtual packages this package provides
    pub provides: Vec<String>,
}

/// Read access to a package database
pub trait PackageIndex {
    /// Record of a real package
    fn package(&self, name: &str) -> Option<&PackageRecord>;

    /// Real packages providing the virtual package `name`
    fn providers(&self, name: &str) -> Vec<&str>;

    /// A name no real package has, but some package provides
    fn is_virtual(&self, name: &str) -> bool {
        self.package(name).is_none() && !self.providers(name).is_empty()
    }
}

/// Expand `names` to the list of installed packages they pull in
///
/// Dependencies come before the package that requested them. Every
/// alternative of a dependency group is included. Unknown and not installed
/// packages are skipped.
pub fn find_with_deps<I: PackageIndex + ?Sized>(index: &I, names: &[String]) -> Vec<String> {
    let mut result = Vec::new();
    for name in names {
        expand(index, name, &mut result);
        if !result.contains(name) {
            result.push(name.clone());
        }
    }
    result
}

fn expand<I: PackageIndex + ?Sized>(index: &I, name: &str, result: &mut Vec<String>) {
    if index.is_virtual(name) {
        for provider in index.providers(name) {
            expand(index, provider, result);
        }
        return;
    }

    let Some(record) = index.package(name) else {
        tracing::warn!(package = name, "package not in database");
        return;
    };
    if !record.installed {
        tracing::warn!(package = name, "package not installed");
        return;
    }

    for group in &record.depends {
        for dependency in group {
            if !result.contains(dependency) {
                result.push(dependency.clone());
                expand(index, dependency, result);
            }
        }
    }
}

/// dpkg database snapshot
#[derive(Debug, Clone, Default)]
pub struct DpkgIndex {
    packages: HashMap<String, PackageRecord>,
    providers: HashMap<String, Vec<String>>,
}

/// `dpkg-query` format producing the lines [`DpkgIndex::parse`] reads
pub const DPKG_QUERY_FORMAT: &str = "${Package}\t${Status}\t${Depends}\t${Provides}\n";

impl DpkgIndex {
    /// Parse `dpkg-query -W -f` output in [`DPKG_QUERY_FORMAT`]
    pub fn parse(output: &str) -> Self {
        let mut index = Self::default();

        for line in output.lines() {
            let mut fields = line.split('\t');
            let Some(name) = fields.next().map(str::trim).filter(|n| !n.is_empty()) else {
                continue;
            };
            let status = fields.next().unwrap_or_default();
            let depends = fields.next().unwrap_or_default();
            let provides = fields.next().unwrap_or_default();

            let record = PackageRecord {
                name: name.to_string(),
                installed: status.split_whitespace().last() == Some("installed"),
                depends: parse_relations(depends),
                provides: parse_relations(provides).into_iter().flatten().collect(),
            };

            if record.installed {
                for virtual_name in &record.provides {
                    index
                        .providers
                        .entry(virtual_name.clone())
                        .or_default()
                        .push(record.name.clone());
                }
            }
            // Multi-arch packages repeat; keep an installed instance
            match index.packages.get(name) {
                Some(existing) if existing.installed => {}
                _ => {
                    index.packages.insert(record.name.clone(), record);
                }
            }
        }

        index
    }

    /// Installed package names
    pub fn installed(&self) -> BTreeSet<String> {
        self.packages
            .values()
            .filter(|p| p.installed)
            .map(|p| p.name.clone())
            .collect()
    }
}

impl PackageIndex for DpkgIndex {
    fn package(&self, name: &str) -> Option<&PackageRecord> {
        self.packages.get(name)
    }

    fn providers(&self, name: &str) -> Vec<&str> {
        self.providers
            .get(name)
            .map(|p| p.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Parse a Debian relationship field: `a (>= 1), b | c:any`
fn parse_relations(field: &str) -> Vec<Vec<String>> {
    field
        .split(',')
        .map(|group| {
            group
                .split('|')
                .filter_map(|alternative| {
                    let name = alternative
                        .trim()
                        .split([' ', '('])
                        .next()
                        .unwrap_or_default();
                    let name = name.split(':').next().unwrap_or_default();
                    (!name.is_empty()).then(|| name.to_string())
                })
                .collect::<Vec<_>>()
        })
        .filter(|group| !group.is_empty())
        .collect()
}

/// apt/dpkg package manager (Debian, Ubuntu)
#[derive(Debug, Clone)]
pub struct AptPackageManager {
    runner: CommandRunner,
    interactive: bool,
}

impl AptPackageManager {
    /// Create an apt package manager; non-interactive mode answers yes to prompts
    pub fn new(runner: CommandRunner, interactive: bool) -> Self {
        Self {
            runner,
            interactive,
        }
    }

    fn apt_get(&self, action: &str, packages: &[String]) -> Vec<String> {
        let mut args = vec!["apt-get".to_string()];
        if !self.interactive {
            args.push("-y".to_string());
        }
        args.push(action.to_string());
        args.extend(packages.iter().cloned());
        args
    }

    fn index(&self) -> Result<DpkgIndex, PackageManagerError> {
        let output = self
            .runner
            .capture(&["dpkg-query", "-W", "-f", DPKG_QUERY_FORMAT], Path::new("/"))?;
        Ok(DpkgIndex::parse(&output))
    }
}

impl PackageManager for AptPackageManager {
    fn install(&self, packages: &[String]) -> Result<(), PackageManagerError> {
        if packages.is_empty() {
            return Ok(());
        }
        self.runner
            .run_with_sudo(&self.apt_get("install", packages), Path::new("/"))?;
        Ok(())
    }

    fn remove(&self, packages: &[String]) -> Result<(), PackageManagerError> {
        if packages.is_empty() {
            return Ok(());
        }
        let mut args = vec!["dpkg".to_string(), "-P".to_string()];
        args.extend(packages.iter().cloned());
        self.runner.run_with_sudo(&args, Path::new("/"))?;
        Ok(())
    }

    fn update(&self) -> Result<(), PackageManagerError> {
        self.runner
            .run_with_sudo(&["apt-get", "update"], Path::new("/"))?;
        self.runner
            .run_with_sudo(&self.apt_get("upgrade", &[]), Path::new("/"))?;
        Ok(())
    }

    fn find_all_installed(&self) -> Result<BTreeSet<String>, PackageManagerError> {
        Ok(self.index()?.installed())
    }

    fn find_with_deps(&self, names: &[String]) -> Result<Vec<String>, PackageManagerError> {
        Ok(find_with_deps(&self.index()?, names))
    }
}

/// Package manager for `distro`, if one is implemented
pub fn package_manager_for(
    distro: &str,
    runner: CommandRunner,
    interactive: bool,
) -> Result<Box<dyn PackageManager>, PackageManagerError> {
    match distro {
        "ubuntu" | "debian" => Ok(Box::new(AptPackageManager::new(runner, interactive))),
        other => Err(PackageManagerError::UnsupportedDistro {
            name: other.to_string(),
        }),
    }
}
