//! init command - Write a skeleton simulation with one model

use std::rc::Rc;

use anyhow::{bail, Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::container::PackageHost;
use crate::core::package::{DefaultPackageFactory, PackageFactory};
use crate::core::schema::SchemaService;
use crate::core::simulation::Simulation;
use crate::core::types::PackageType;
use crate::ui::output;

/// Create a simulation with TDIS, IMS and one model holding its required packages.
pub fn init(ctx: &Context, model: &str, model_type: Option<&str>, force: bool) -> Result<()> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;
    let nam_path = sim_ws.join(config.sim_name_file());
    if nam_path.exists() && !force {
        bail!(
            "'{}' already exists. Use --force to overwrite it.",
            nam_path.display()
        );
    }

    let schema: Rc<dyn SchemaService> = Rc::new(config.schema().context("Failed to load schema")?);
    let factory: Rc<dyn PackageFactory> = Rc::new(DefaultPackageFactory::new(Rc::clone(&schema)));
    let model_type = model_type.unwrap_or(config.default_model_type());

    let mut simulation = Simulation::new(sim_ws.clone(), Rc::clone(&schema), factory);
    simulation.set_name_filename(config.sim_name_file());

    let created = simulation
        .add_model(model, model_type)
        .with_context(|| format!("Failed to create model '{}'", model))?;
    let mut required: Vec<PackageType> = created
        .structure()
        .package_struct_objs
        .values()
        .filter(|s| !s.optional)
        .map(|s| s.file_type.clone())
        .collect();
    if let Some(discretization) = schema.priority_types().first() {
        required.insert(0, discretization.clone());
    }
    for package_type in &required {
        created
            .create_package(package_type)
            .with_context(|| format!("Failed to create package '{}'", package_type))?;
    }

    for package_type in schema
        .simulation_structure()
        .package_struct_objs
        .values()
        .filter(|s| !s.optional)
        .map(|s| s.file_type.clone())
        .collect::<Vec<_>>()
    {
        simulation
            .create_package(&package_type)
            .with_context(|| format!("Failed to create package '{}'", package_type))?;
    }

    let written = simulation
        .write(&sim_ws)
        .with_context(|| format!("Failed to write simulation to '{}'", sim_ws.display()))?;
    output::success(
        format!(
            "Wrote {} file(s) for model '{}' [{}]; fill in package data, then run 'mfsim check'",
            written.len(),
            model,
            model_type
        ),
        ctx.verbosity(),
    );
    Ok(())
}
