//! schema command - Show the package schema in use

use anyhow::{anyhow, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::schema::{PackageStructure, SchemaService};
use crate::ui::output;

fn describe(structure: &PackageStructure) -> String {
    let mut flags = vec![if structure.optional { "optional" } else { "required" }];
    if structure.multi_package {
        flags.push("multi");
    }
    format!(
        "{:<6} {:<5} {}",
        structure.file_type.as_str(),
        format!("{:?}", structure.layout).to_lowercase(),
        flags.join(",")
    )
}

/// Print the schema, optionally for a single model type.
pub fn schema(ctx: &Context, model_type: Option<&str>) -> Result<()> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;
    let schema = config.schema()?;
    let verbosity = ctx.verbosity();

    if let Some(model_type) = model_type {
        let structure = schema
            .model_structure(model_type)
            .ok_or_else(|| anyhow!("Unknown model type: {}", model_type))?;
        for entry in structure.package_struct_objs.values() {
            output::print(describe(entry), verbosity);
        }
        return Ok(());
    }

    output::print(format!("version {}", schema.version()), verbosity);
    output::print(
        format!("priority: {}", schema.priority_record_codes().join(", ")),
        verbosity,
    );

    output::print("\nsimulation", verbosity);
    for entry in schema.simulation_structure().package_struct_objs.values() {
        output::print(format!("  {}", describe(entry)), verbosity);
    }

    for model_type in schema.model_types() {
        if let Some(structure) = schema.model_structure(model_type) {
            output::print(format!("\n{}", structure.model_type), verbosity);
            for entry in structure.package_struct_objs.values() {
                output::print(format!("  {}", describe(entry)), verbosity);
            }
        }
    }

    output::print("\nutilities", verbosity);
    for entry in schema.utl_struct_objs().values() {
        output::print(format!("  {}", describe(entry)), verbosity);
    }
    Ok(())
}
