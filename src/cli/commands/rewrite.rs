//! rewrite command - Load a simulation and write it back out

use std::path::Path;

use anyhow::{Context as _, Result};

use super::open_simulation;
use crate::cli::Context;
use crate::ui::output;

/// Write the loaded simulation to `output`, or back into its own workspace.
pub fn rewrite(ctx: &Context, output_ws: Option<&Path>) -> Result<()> {
    let simulation = open_simulation(ctx)?;
    let target = output_ws.unwrap_or(simulation.sim_path()).to_path_buf();

    let written = simulation
        .write(&target)
        .with_context(|| format!("Failed to write simulation to '{}'", target.display()))?;

    for path in &written {
        output::debug(format!("wrote {}", path.display()), ctx.verbosity());
    }
    output::success(
        format!("Wrote {} file(s) to {}", written.len(), target.display()),
        ctx.verbosity(),
    );
    Ok(())
}
