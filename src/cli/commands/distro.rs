//! CLI implementation for `modbuild distro`

use anyhow::Result;

use super::Context;
use crate::infra::distro::DistroInfo;

/// Execute the distro command
pub async fn execute(context: &Context) -> Result<()> {
    let info = DistroInfo::detect();
    let output = context.output;

    output.line(&format!("Distribution: {info}"));
    output.line(&format!("Library dir:  {}", if info.use_lib64 { "lib64" } else { "lib" }));
    if !info.valid {
        output.info("Could not identify the host distribution");
    } else if info.supported {
        output.success("Supported");
    } else {
        output.info("Not a supported distribution; builds may fail");
    }
    Ok(())
}
