//! relocate command - Move one model's files into a directory

use std::path::Path;

use anyhow::{Context as _, Result};

use super::open_simulation;
use crate::cli::Context;
use crate::ui::output;

/// Move `model` into `dir` and write the simulation.
pub fn relocate(ctx: &Context, model: &str, dir: &str, output_ws: Option<&Path>) -> Result<()> {
    let mut simulation = open_simulation(ctx)?;

    simulation
        .set_model_relative_path(model, dir)
        .with_context(|| format!("Failed to relocate model '{}'", model))?;

    let target = output_ws.unwrap_or(simulation.sim_path()).to_path_buf();
    let written = simulation
        .write(&target)
        .with_context(|| format!("Failed to write simulation to '{}'", target.display()))?;

    for path in &written {
        output::debug(format!("wrote {}", path.display()), ctx.verbosity());
    }
    output::success(
        format!(
            "Moved model '{}' to '{}' ({} file(s) written)",
            model,
            simulation.files().model_relative_path(model),
            written.len()
        ),
        ctx.verbosity(),
    );
    Ok(())
}
