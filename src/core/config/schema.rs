//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$MFSIM_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/mfsim/config.toml`
//! 3. `~/.mfsim/config.toml` (canonical write location)
//!
//! # Workspace Config
//!
//! Located at `<sim_ws>/.mfsim/config.toml` (canonical).
//!
//! # Validation
//!
//! Values are validated after parsing: the default model type must be a
//! legal container tag and the simulation name file must be a `.nam` file.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::types::{ContainerName, NAME_FILE_TYPE};

fn validate_model_type(value: &Option<String>) -> Result<(), ConfigError> {
    if let Some(model_type) = value {
        ContainerName::new(model_type.as_str()).map_err(|e| {
            ConfigError::InvalidValue(format!("invalid default_model_type: {}", e))
        })?;
    }
    Ok(())
}

fn validate_schema_path(value: &Option<PathBuf>) -> Result<(), ConfigError> {
    if let Some(path) = value {
        if path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue(
                "schema_path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// strict = false
/// default_model_type = "gwf6"
/// schema_path = "/opt/mf6/schema.toml"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Reject content outside blocks when loading
    pub strict: Option<bool>,

    /// Schema definition to use instead of the builtin one
    pub schema_path: Option<PathBuf>,

    /// Model type for `mfsim new`-style scaffolding
    pub default_model_type: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model_type(&self.default_model_type)?;
        validate_schema_path(&self.schema_path)
    }
}

/// Workspace configuration, stored next to a simulation.
///
/// # Example
///
/// ```toml
/// strict = true
/// sim_name_file = "mfsim.nam"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct WorkspaceConfig {
    /// Reject content outside blocks when loading
    pub strict: Option<bool>,

    /// Schema definition, relative paths resolve against the workspace
    pub schema_path: Option<PathBuf>,

    /// Model type override for this workspace
    pub default_model_type: Option<String>,

    /// Simulation name file (default: "mfsim.nam")
    pub sim_name_file: Option<String>,
}

impl WorkspaceConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_model_type(&self.default_model_type)?;
        validate_schema_path(&self.schema_path)?;

        if let Some(name_file) = &self.sim_name_file {
            let extension = format!(".{}", NAME_FILE_TYPE);
            if name_file.len() <= extension.len()
                || !name_file.to_ascii_lowercase().ends_with(&extension)
            {
                return Err(ConfigError::InvalidValue(format!(
                    "invalid sim_name_file '{}', must end in '{}'",
                    name_file, extension
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod global_config {
        use super::*;

        #[test]
        fn defaults() {
            let config = GlobalConfig::default();
            assert!(config.strict.is_none());
            assert!(config.schema_path.is_none());
            assert!(config.default_model_type.is_none());
        }

        #[test]
        fn valid_model_type() {
            let config = GlobalConfig {
                default_model_type: Some("gwt6".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn invalid_model_type() {
            let config = GlobalConfig {
                default_model_type: Some("has space".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn empty_schema_path_rejected() {
            let config = GlobalConfig {
                schema_path: Some(PathBuf::new()),
                ..Default::default()
            };
            assert!(config.validate().is_err());
        }

        #[test]
        fn roundtrip() {
            let config = GlobalConfig {
                strict: Some(true),
                schema_path: Some(PathBuf::from("/opt/mf6/schema.toml")),
                default_model_type: Some("gwf6".to_string()),
            };

            let toml = toml::to_string_pretty(&config).unwrap();
            let parsed: GlobalConfig = toml::from_str(&toml).unwrap();
            assert_eq!(config, parsed);
        }
    }

    mod workspace_config {
        use super::*;

        #[test]
        fn valid_name_file() {
            let config = WorkspaceConfig {
                sim_name_file: Some("run.NAM".to_string()),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }

        #[test]
        fn name_file_needs_extension() {
            for bad in ["mfsim.txt", ".nam", ""] {
                let config = WorkspaceConfig {
                    sim_name_file: Some(bad.to_string()),
                    ..Default::default()
                };
                assert!(config.validate().is_err(), "{bad:?} accepted");
            }
        }

        #[test]
        fn reject_unknown_fields() {
            let toml = r#"
                strict = true
                trunk = "main"
            "#;

            let result: Result<WorkspaceConfig, _> = toml::from_str(toml);
            assert!(result.is_err());
        }
    }
}
