//! CLI implementation for `modbuild clean` command
//!
//! Removes build outputs. The build state is left alone, so the next build
//! re-syncs every module and compares against the recorded revisions.

use anyhow::{Context as _, Result};

use super::Context;
use crate::core::clean::{clean, has_build_artifacts};
use crate::infra::distro::DistroInfo;

/// Execute the clean command
pub async fn execute(context: &Context) -> Result<()> {
    let project = context.project(&DistroInfo::detect())?;
    let output = context.output;

    if !has_build_artifacts(&project.layout, &project.modules) {
        output.success("Nothing to clean");
        return Ok(());
    }

    let result = clean(&project.layout, &project.modules)
        .with_context(|| "Failed to clean build artifacts")?;

    output.success("Cleaned build artifacts:");
    for path in &result.removed {
        output.line(&format!("  Removed {}", path.display()));
    }

    Ok(())
}
