//! config command - Get, set, or list configuration values

use std::path::PathBuf;

use anyhow::{bail, Context as _, Result};

use super::load_config;
use crate::cli::Context;
use crate::core::config::Config;

/// Keys accepted by `config get` and `config set`.
pub const KEYS: &[&str] = &["strict", "schema_path", "default_model_type", "sim_name_file"];

fn value_of(config: &Config, key: &str) -> Result<String> {
    Ok(match key {
        "strict" => config.strict().to_string(),
        "schema_path" => config
            .schema_path()
            .map(|p| p.display().to_string())
            .unwrap_or_default(),
        "default_model_type" => config.default_model_type().to_string(),
        "sim_name_file" => config.sim_name_file().to_string(),
        _ => bail!("Unknown configuration key: {} (expected one of: {})", key, KEYS.join(", ")),
    })
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => bail!("Invalid boolean value: {}", value),
    }
}

/// Get a configuration value.
pub fn get(ctx: &Context, key: &str) -> Result<()> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;
    let value = value_of(&config, key)?;

    if !value.is_empty() {
        println!("{}", value);
    }
    Ok(())
}

/// Set a configuration value in the workspace or global config.
pub fn set(ctx: &Context, key: &str, value: &str, global: bool) -> Result<()> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;

    let path = if global {
        let mut global_config = config.global;
        match key {
            "strict" => global_config.strict = Some(parse_bool(value)?),
            "schema_path" => global_config.schema_path = Some(PathBuf::from(value)),
            "default_model_type" => global_config.default_model_type = Some(value.to_string()),
            "sim_name_file" => bail!("sim_name_file can only be set per workspace"),
            _ => bail!("Unknown configuration key: {}", key),
        }
        Config::write_global(&global_config).context("Failed to write config")?
    } else {
        let mut workspace = config.workspace.unwrap_or_default();
        match key {
            "strict" => workspace.strict = Some(parse_bool(value)?),
            "schema_path" => workspace.schema_path = Some(PathBuf::from(value)),
            "default_model_type" => workspace.default_model_type = Some(value.to_string()),
            "sim_name_file" => workspace.sim_name_file = Some(value.to_string()),
            _ => bail!("Unknown configuration key: {}", key),
        }
        Config::write_workspace(&sim_ws, &workspace).context("Failed to write config")?
    };

    if !ctx.quiet {
        println!("Set {} = {} in {}", key, value, path.display());
    }
    Ok(())
}

/// List all configuration values.
pub fn list(ctx: &Context) -> Result<()> {
    let sim_ws = ctx.sim_ws()?;
    let config = load_config(ctx, &sim_ws)?;

    println!("# Configuration");
    if let Some(path) = config.global_config_loaded_from() {
        println!("# global: {}", path.display());
    }
    if let Some(path) = config.workspace_config_loaded_from() {
        println!("# workspace: {}", path.display());
    }

    for key in KEYS {
        let value = value_of(&config, key)?;
        if value.is_empty() {
            println!("{} = (not set)", key);
        } else {
            println!("{} = {}", key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_key_has_a_value() {
        let config = Config::default();
        for key in KEYS {
            assert!(value_of(&config, key).is_ok(), "{key}");
        }
        assert!(value_of(&config, "trunk").is_err());
    }

    #[test]
    fn booleans() {
        assert!(parse_bool("TRUE").unwrap());
        assert!(!parse_bool("no").unwrap());
        assert!(parse_bool("maybe").is_err());
    }
}
