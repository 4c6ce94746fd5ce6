//! cli::commands
//!
//! Command dispatch and handlers.
//!
//! # Architecture
//!
//! Each command handler:
//! 1. Resolves the workspace and loads configuration
//! 2. Loads the simulation through the core loader
//! 3. Formats and displays output
//!
//! Handlers return `anyhow::Result` and attach context to core errors.

mod check;
mod completion;
mod config_cmd;
mod init;
mod list;
mod relocate;
mod rewrite;
mod schema_cmd;

pub use check::check;
pub use completion::completion;
pub use config_cmd::{get as config_get, list as config_list, set as config_set};
pub use init::init;
pub use list::list;
pub use relocate::relocate;
pub use rewrite::rewrite;
pub use schema_cmd::schema;

use std::path::Path;
use std::rc::Rc;

use anyhow::{Context as _, Result};

use super::args::{Command, ConfigAction};
use super::Context;
use crate::core::config::Config;
use crate::core::package::{DefaultPackageFactory, PackageFactory};
use crate::core::schema::SchemaService;
use crate::core::simulation::Simulation;
use crate::ui::output;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::Init {
            model,
            model_type,
            force,
        } => init::init(ctx, &model, model_type.as_deref(), force),
        Command::List { json } => list::list(ctx, json),
        Command::Check => check::check(ctx),
        Command::Relocate { model, dir, output } => {
            relocate::relocate(ctx, &model, &dir, output.as_deref())
        }
        Command::Rewrite { output } => rewrite::rewrite(ctx, output.as_deref()),
        Command::Schema { model_type } => schema_cmd::schema(ctx, model_type.as_deref()),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { global, key, value } => config_cmd::set(ctx, &key, &value, global),
            ConfigAction::List => config_cmd::list(ctx),
        },
        Command::Completion { shell } => completion::completion(shell),
    }
}

/// Load configuration for `sim_ws`, reporting any warnings.
pub(crate) fn load_config(ctx: &Context, sim_ws: &Path) -> Result<Config> {
    let result = Config::load(Some(sim_ws)).context("Failed to load config")?;
    for warning in &result.warnings {
        output::warn(
            format!("{} ({})", warning.message, warning.path.display()),
            ctx.verbosity(),
        );
    }
    Ok(result.config)
}

/// Load the simulation in the context's workspace.
pub(crate) fn open_simulation(ctx: &Context) -> Result<Simulation> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;

    let schema: Rc<dyn SchemaService> = Rc::new(config.schema().context("Failed to load schema")?);
    let factory: Rc<dyn PackageFactory> = Rc::new(DefaultPackageFactory::new(Rc::clone(&schema)));

    output::debug(
        format!("loading {}", sim_ws.join(config.sim_name_file()).display()),
        ctx.verbosity(),
    );
    Simulation::load(&sim_ws, schema, factory, config.load_options())
        .with_context(|| format!("Failed to load simulation from '{}'", sim_ws.display()))
}
