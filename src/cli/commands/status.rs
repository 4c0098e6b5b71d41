//! CLI implementation for `modbuild status`
//!
//! Lists the manifest's modules in build order with the revision each was
//! last built at.

use anyhow::Result;

use super::Context;
use crate::core::state::{BuildState, JsonStateStore, StateStore};
use crate::infra::distro::DistroInfo;

/// Execute the status command
pub async fn execute(context: &Context) -> Result<()> {
    let project = context.project(&DistroInfo::detect())?;
    let state = JsonStateStore::new(project.layout.state_file()).load()?;

    let names: Vec<&str> = project.modules.iter().map(|m| m.name.as_str()).collect();
    for line in status_lines(&names, &state) {
        println!("{line}");
    }
    Ok(())
}

/// One line per module: name and built revision (or `not built`)
pub fn status_lines(modules: &[&str], state: &BuildState) -> Vec<String> {
    let width = modules.iter().map(|m| m.len()).max().unwrap_or(0);
    modules
        .iter()
        .map(|name| {
            let revision = state
                .get(name)
                .map_or_else(|| "not built".to_string(), |r| r.short().to_string());
            format!("{name:<width$}  {revision}")
        })
        .collect()
}
