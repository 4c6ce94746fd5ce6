//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! mfsim has two configuration scopes:
//! - **Global**: User-level settings
//! - **Workspace**: Per-simulation overrides stored next to `mfsim.nam`
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Workspace config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$MFSIM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/mfsim/config.toml`
//! 3. `~/.mfsim/config.toml` (canonical write location)
//!
//! # Workspace Config Locations
//!
//! Searched in order:
//! 1. `<sim_ws>/.mfsim/config.toml` (canonical)
//! 2. `<sim_ws>/mfsim.toml` (compatibility, warns)
//!
//! # Example
//!
//! ```no_run
//! use mfsim::core::config::Config;
//! use std::path::Path;
//!
//! let result = Config::load(Some(Path::new("/path/to/sim"))).unwrap();
//! let config = result.config;
//!
//! println!("Strict: {}", config.strict());
//! println!("Name file: {}", config.sim_name_file());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, WorkspaceConfig};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::loader::LoadOptions;
use crate::core::schema::{Schema, SchemaError};
use crate::core::simulation::SIM_NAME_FILE;

/// Model type used when nothing is configured.
pub const DEFAULT_MODEL_TYPE: &str = "gwf6";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Warnings generated during config loading.
#[derive(Debug, Clone)]
pub struct ConfigWarning {
    /// The warning message.
    pub message: String,
    /// The path that triggered the warning.
    pub path: PathBuf,
}

/// Result of loading configuration.
#[derive(Debug)]
pub struct ConfigLoadResult {
    /// The loaded configuration.
    pub config: Config,
    /// Any warnings generated during loading.
    pub warnings: Vec<ConfigWarning>,
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence: workspace config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Workspace configuration (if a workspace was given)
    pub workspace: Option<WorkspaceConfig>,
    global_path: Option<PathBuf>,
    workspace_path: Option<PathBuf>,
    workspace_root: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `sim_ws` is provided, also loads the workspace config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed.
    /// Missing config files are not an error (defaults are used).
    pub fn load(sim_ws: Option<&Path>) -> Result<ConfigLoadResult, ConfigError> {
        let global_path = Self::find_global();
        Self::load_from(global_path.as_deref(), sim_ws)
    }

    /// Load configuration with an explicit global config file.
    ///
    /// `global_path` of `None` means defaults for the global scope.
    pub fn load_from(
        global_path: Option<&Path>,
        sim_ws: Option<&Path>,
    ) -> Result<ConfigLoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let global = match global_path {
            Some(path) => read_config::<GlobalConfig>(path)?,
            None => GlobalConfig::default(),
        };

        let (workspace, workspace_path) = match sim_ws {
            Some(ws) => Self::load_workspace(ws, &mut warnings)?,
            None => (None, None),
        };

        global.validate()?;
        if let Some(ref w) = workspace {
            w.validate()?;
        }

        Ok(ConfigLoadResult {
            config: Config {
                global,
                workspace,
                global_path: global_path.map(Path::to_path_buf),
                workspace_path,
                workspace_root: sim_ws.map(Path::to_path_buf),
            },
            warnings,
        })
    }

    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("MFSIM_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("mfsim/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".mfsim/config.toml"))
            .filter(|path| path.exists())
    }

    fn load_workspace(
        sim_ws: &Path,
        warnings: &mut Vec<ConfigWarning>,
    ) -> Result<(Option<WorkspaceConfig>, Option<PathBuf>), ConfigError> {
        let canonical = Self::workspace_config_path(sim_ws);
        if canonical.exists() {
            let config = read_config(&canonical)?;
            return Ok((Some(config), Some(canonical)));
        }

        let compat = sim_ws.join("mfsim.toml");
        if compat.exists() {
            warnings.push(ConfigWarning {
                message: format!(
                    "Using deprecated config location. Please move to '{}'",
                    canonical.display()
                ),
                path: compat.clone(),
            });
            let config = read_config(&compat)?;
            return Ok((Some(config), Some(compat)));
        }

        Ok((None, None))
    }

    /// Get the canonical path for global config.
    ///
    /// Returns `~/.mfsim/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".mfsim/config.toml"))
    }

    /// Get the canonical path for workspace config.
    pub fn workspace_config_path(sim_ws: &Path) -> PathBuf {
        sim_ws.join(".mfsim/config.toml")
    }

    /// Write global config atomically.
    pub fn write_global(config: &GlobalConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::global_config_path()?;
        write_config_atomic(&path, config)?;
        Ok(path)
    }

    /// Write workspace config atomically.
    pub fn write_workspace(sim_ws: &Path, config: &WorkspaceConfig) -> Result<PathBuf, ConfigError> {
        config.validate()?;
        let path = Self::workspace_config_path(sim_ws);
        write_config_atomic(&path, config)?;
        Ok(path)
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Whether loads reject content outside blocks.
    ///
    /// Defaults to `false` if not configured.
    pub fn strict(&self) -> bool {
        self.workspace
            .as_ref()
            .and_then(|w| w.strict)
            .or(self.global.strict)
            .unwrap_or(false)
    }

    /// Schema definition file, if one is configured.
    ///
    /// A relative workspace path resolves against the workspace root.
    pub fn schema_path(&self) -> Option<PathBuf> {
        if let Some(path) = self.workspace.as_ref().and_then(|w| w.schema_path.as_ref()) {
            return Some(match &self.workspace_root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path.clone(),
            });
        }
        self.global.schema_path.clone()
    }

    /// Model type for new models.
    ///
    /// Defaults to "gwf6" if not configured.
    pub fn default_model_type(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.default_model_type.as_deref())
            .or(self.global.default_model_type.as_deref())
            .unwrap_or(DEFAULT_MODEL_TYPE)
    }

    /// Simulation name file.
    ///
    /// Defaults to "mfsim.nam" if not configured.
    pub fn sim_name_file(&self) -> &str {
        self.workspace
            .as_ref()
            .and_then(|w| w.sim_name_file.as_deref())
            .unwrap_or(SIM_NAME_FILE)
    }

    /// Loader options derived from this configuration.
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            strict: self.strict(),
            sim_name_file: self.sim_name_file().to_string(),
        }
    }

    /// The configured schema, or the builtin one.
    pub fn schema(&self) -> Result<Schema, SchemaError> {
        match self.schema_path() {
            Some(path) => Schema::from_path(&path),
            None => Schema::builtin(),
        }
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded workspace config file.
    pub fn workspace_config_loaded_from(&self) -> Option<&Path> {
        self.workspace_path.as_deref()
    }
}

fn read_config<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Write a config file atomically (temp file in the same directory, then rename).
fn write_config_atomic<T: serde::Serialize>(path: &Path, config: &T) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(config).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents.as_bytes())
        .map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

    file.sync_all().map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
