//! list command - Show the models and packages of a simulation

use anyhow::Result;
use serde::Serialize;

use super::open_simulation;
use crate::cli::Context;
use crate::core::container::PackageHost;
use crate::core::package::Package;
use crate::core::simulation::Simulation;
use crate::ui::output;

#[derive(Debug, Serialize)]
struct PackageListing {
    address: Option<String>,
    package_type: String,
    name: String,
    filename: String,
    parent: Option<String>,
    loaded: bool,
}

impl From<&Package> for PackageListing {
    fn from(package: &Package) -> Self {
        Self {
            address: package.address().map(ToString::to_string),
            package_type: package.package_type().to_string(),
            name: package.name().to_string(),
            filename: package.filename().to_string(),
            parent: package.parent().map(ToString::to_string),
            loaded: package.is_loaded(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ModelListing {
    name: String,
    model_type: String,
    name_file: String,
    relative_path: String,
    packages: Vec<PackageListing>,
}

#[derive(Debug, Serialize)]
struct SimulationListing {
    sim_ws: String,
    name_file: String,
    packages: Vec<PackageListing>,
    models: Vec<ModelListing>,
}

fn listing(simulation: &Simulation) -> SimulationListing {
    SimulationListing {
        sim_ws: simulation.sim_path().display().to_string(),
        name_file: simulation.name_filename().to_string(),
        packages: simulation
            .container()
            .packages()
            .map(PackageListing::from)
            .collect(),
        models: simulation
            .models()
            .map(|model| ModelListing {
                name: model.name().to_string(),
                model_type: model.model_type().to_string(),
                name_file: model.name_filename().to_string(),
                relative_path: model.relative_path().to_string(),
                packages: model.packages().map(PackageListing::from).collect(),
            })
            .collect(),
    }
}

/// List the simulation's packages, as a table or as JSON.
pub fn list(ctx: &Context, json: bool) -> Result<()> {
    let simulation = open_simulation(ctx)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&listing(&simulation))?);
        return Ok(());
    }

    let verbosity = ctx.verbosity();
    output::print(
        format!("simulation ({})", simulation.name_filename()),
        verbosity,
    );
    for package in simulation.container().packages() {
        output::print(output::format_package(package), verbosity);
    }

    for model in simulation.models() {
        output::print("", verbosity);
        output::print(
            format!(
                "{} [{}] in '{}' ({})",
                model.name(),
                model.model_type(),
                model.relative_path(),
                model.name_filename()
            ),
            verbosity,
        );
        for package in model.packages() {
            output::print(output::format_package(package), verbosity);
        }
    }

    Ok(())
}
