//! check command - Load a simulation and report validity problems

use anyhow::{bail, Result};

use super::open_simulation;
use crate::cli::Context;
use crate::ui::output;

/// Verify the simulation; fails when any problem is found.
pub fn check(ctx: &Context) -> Result<()> {
    let simulation = open_simulation(ctx)?;
    let result = simulation.verify();

    if result.ok {
        let models = simulation.models().count();
        output::success(
            format!("ok: simulation with {} model(s) is valid", models),
            ctx.verbosity(),
        );
        return Ok(());
    }

    eprintln!("{}", output::format_list(&result.errors, "  - "));
    bail!("simulation is not valid ({} problem(s))", result.errors.len())
}
