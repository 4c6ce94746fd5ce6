//! core::schema::definition
//!
//! TOML-backed schema definitions.
//!
//! # Format
//!
//! ```toml
//! version = "6"
//! priority = ["dis", "disv", "disu"]
//!
//! [simulation]
//! name_file = "nam"
//!
//! [[simulation.packages]]
//! file_type = "tdis"
//! optional = false
//! required_blocks = ["dimensions", "perioddata"]
//!
//! [[models]]
//! model_type = "gwf6"
//!
//! [[models.packages]]
//! file_type = "wel"
//! multi_package = true
//!
//! [[utilities]]
//! file_type = "obs"
//! multi_package = true
//! ```
//!
//! # Validation
//!
//! Definitions are strictly parsed (unknown fields are rejected) and then
//! validated: no duplicate types per container, priority types must be
//! defined by some model, and every array-layout type `<x>a` needs a
//! list-layout base type `<x>` in the same container.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{Layout, ModelStructure, PackageStructure, SchemaService, SimulationStructure};
use crate::core::types::PackageType;

/// The builtin MODFLOW 6 definition.
const BUILTIN_DEFINITION: &str = include_str!("mf6.toml");

/// Errors from loading a schema definition.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to read schema file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse schema definition: {0}")]
    ParseError(String),

    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDefinition {
    version: String,
    #[serde(default)]
    priority: Vec<PackageType>,
    simulation: SimulationDefinition,
    #[serde(default)]
    models: Vec<ModelDefinition>,
    #[serde(default)]
    utilities: Vec<PackageDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SimulationDefinition {
    #[serde(default = "default_name_file")]
    name_file: PackageType,
    #[serde(default)]
    packages: Vec<PackageDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModelDefinition {
    model_type: String,
    #[serde(default = "default_name_file")]
    name_file: PackageType,
    #[serde(default)]
    packages: Vec<PackageDefinition>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PackageDefinition {
    file_type: PackageType,
    #[serde(default = "default_optional")]
    optional: bool,
    #[serde(default)]
    multi_package: bool,
    #[serde(default)]
    layout: Layout,
    #[serde(default)]
    required_blocks: Vec<String>,
    #[serde(default)]
    description: Option<String>,
}

fn default_name_file() -> PackageType {
    PackageType::name_file()
}

fn default_optional() -> bool {
    true
}

impl From<PackageDefinition> for PackageStructure {
    fn from(def: PackageDefinition) -> Self {
        Self {
            file_type: def.file_type,
            optional: def.optional,
            multi_package: def.multi_package,
            layout: def.layout,
            required_blocks: def
                .required_blocks
                .into_iter()
                .map(|b| b.to_ascii_lowercase())
                .collect(),
            description: def.description,
        }
    }
}

/// A schema loaded from a TOML definition.
#[derive(Debug, Clone)]
pub struct Schema {
    version: String,
    priority: Vec<PackageType>,
    simulation: SimulationStructure,
    models: Vec<ModelStructure>,
    utilities: BTreeMap<PackageType, PackageStructure>,
}

impl Schema {
    /// The builtin MODFLOW 6 schema.
    ///
    /// # Errors
    ///
    /// Only fails if the bundled definition is malformed.
    pub fn builtin() -> Result<Self, SchemaError> {
        Self::from_toml_str(BUILTIN_DEFINITION)
    }

    /// Load a schema definition from a file.
    pub fn from_path(path: &Path) -> Result<Self, SchemaError> {
        let contents = fs::read_to_string(path).map_err(|e| SchemaError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml_str(&contents)
    }

    /// Parse and validate a schema definition.
    pub fn from_toml_str(contents: &str) -> Result<Self, SchemaError> {
        let def: SchemaDefinition =
            toml::from_str(contents).map_err(|e| SchemaError::ParseError(e.to_string()))?;
        Self::from_definition(def)
    }

    fn from_definition(def: SchemaDefinition) -> Result<Self, SchemaError> {
        if def.version.trim().is_empty() {
            return Err(SchemaError::InvalidDefinition(
                "version cannot be empty".into(),
            ));
        }

        let simulation = SimulationStructure {
            name_file: name_file_structure(def.simulation.name_file),
            package_struct_objs: collect_packages("simulation", def.simulation.packages)?,
        };

        let mut models: Vec<ModelStructure> = Vec::new();
        for model in def.models {
            let model_type = model.model_type.trim().to_ascii_lowercase();
            if model_type.is_empty() {
                return Err(SchemaError::InvalidDefinition(
                    "model_type cannot be empty".into(),
                ));
            }
            if models.iter().any(|m| m.model_type == model_type) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "model type '{model_type}' is defined twice"
                )));
            }
            let package_struct_objs = collect_packages(&model_type, model.packages)?;
            models.push(ModelStructure {
                model_type,
                name_file: name_file_structure(model.name_file),
                package_struct_objs,
            });
        }

        let utilities = collect_packages("utilities", def.utilities)?;

        for t in &def.priority {
            if !models.iter().any(|m| m.package_struct_objs.contains_key(t)) {
                return Err(SchemaError::InvalidDefinition(format!(
                    "priority type '{t}' is not defined by any model"
                )));
            }
        }

        Ok(Self {
            version: def.version.trim().to_string(),
            priority: def.priority,
            simulation,
            models,
            utilities,
        })
    }
}

fn name_file_structure(file_type: PackageType) -> PackageStructure {
    PackageStructure {
        optional: false,
        ..PackageStructure::new(file_type)
    }
}

/// Build a container's structure map, rejecting duplicates and orphaned
/// array-layout variants.
fn collect_packages(
    container: &str,
    packages: Vec<PackageDefinition>,
) -> Result<BTreeMap<PackageType, PackageStructure>, SchemaError> {
    let mut map = BTreeMap::new();
    for package in packages {
        let structure = PackageStructure::from(package);
        if structure.file_type.is_name_file() {
            return Err(SchemaError::InvalidDefinition(format!(
                "{container}: the name file type cannot be declared as a package"
            )));
        }
        let key = structure.file_type.clone();
        if map.insert(key.clone(), structure).is_some() {
            return Err(SchemaError::InvalidDefinition(format!(
                "{container}: package type '{key}' is defined twice"
            )));
        }
    }

    for (file_type, structure) in &map {
        if structure.layout != Layout::Array {
            continue;
        }
        let base = file_type
            .as_str()
            .strip_suffix('a')
            .and_then(|b| PackageType::new(b).ok());
        let has_list_base = base
            .and_then(|b| map.get(&b))
            .is_some_and(|s| s.layout == Layout::List);
        if !has_list_base {
            return Err(SchemaError::InvalidDefinition(format!(
                "{container}: array layout type '{file_type}' has no list layout base type"
            )));
        }
    }

    Ok(map)
}

impl SchemaService for Schema {
    fn version(&self) -> &str {
        &self.version
    }

    fn model_structure(&self, model_type: &str) -> Option<&ModelStructure> {
        let wanted = model_type.trim().to_ascii_lowercase();
        self.models.iter().find(|m| m.model_type == wanted)
    }

    fn model_types(&self) -> Vec<&str> {
        self.models.iter().map(|m| m.model_type.as_str()).collect()
    }

    fn simulation_structure(&self) -> &SimulationStructure {
        &self.simulation
    }

    fn utl_struct_objs(&self) -> &BTreeMap<PackageType, PackageStructure> {
        &self.utilities
    }

    fn priority_types(&self) -> &[PackageType] {
        &self.priority
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        version = "6"
        priority = ["dis"]

        [simulation]
        [[simulation.packages]]
        file_type = "tdis"
        optional = false

        [[models]]
        model_type = "GWF6"

        [[models.packages]]
        file_type = "dis"

        [[models.packages]]
        file_type = "rch"
        multi_package = true

        [[models.packages]]
        file_type = "rcha"
        multi_package = true
        layout = "array"
    "#;

    #[test]
    fn builtin_schema_parses() {
        let schema = Schema::builtin().unwrap();
        assert_eq!(schema.version(), "6");
        assert_eq!(schema.model_types(), vec!["gwf6", "gwt6"]);
    }

    #[test]
    fn minimal_definition() {
        let schema = Schema::from_toml_str(MINIMAL).unwrap();
        let gwf = schema.model_structure("gwf6").unwrap();
        assert_eq!(gwf.package_struct_objs.len(), 3);
        assert!(gwf.name_file.file_type.is_name_file());
        assert!(!gwf.name_file.optional);
        assert!(schema.utl_struct_objs().is_empty());
    }

    #[test]
    fn defaults_apply() {
        let schema = Schema::from_toml_str(MINIMAL).unwrap();
        let gwf = schema.model_structure("gwf6").unwrap();
        let dis = gwf
            .get_package_struct(&PackageType::new("dis").unwrap())
            .unwrap();
        assert!(dis.optional);
        assert!(!dis.multi_package);
        assert_eq!(dis.layout, Layout::List);
    }

    #[test]
    fn unknown_fields_rejected() {
        let text = MINIMAL.replace("optional = false", "optional = false\nbogus = 1");
        assert!(matches!(
            Schema::from_toml_str(&text),
            Err(SchemaError::ParseError(_))
        ));
    }

    #[test]
    fn duplicate_types_rejected() {
        let text = format!("{MINIMAL}\n[[models.packages]]\nfile_type = \"dis\"\n");
        assert!(matches!(
            Schema::from_toml_str(&text),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn unknown_priority_rejected() {
        let text = MINIMAL.replace("priority = [\"dis\"]", "priority = [\"disv\"]");
        assert!(matches!(
            Schema::from_toml_str(&text),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn array_type_without_base_rejected() {
        let text = r#"
            version = "6"
            [simulation]
            [[models]]
            model_type = "gwf6"
            [[models.packages]]
            file_type = "evta"
            layout = "array"
        "#;
        assert!(matches!(
            Schema::from_toml_str(text),
            Err(SchemaError::InvalidDefinition(_))
        ));
    }

    #[test]
    fn empty_version_rejected() {
        let text = MINIMAL.replace("version = \"6\"", "version = \" \"");
        assert!(Schema::from_toml_str(&text).is_err());
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = Schema::from_path(Path::new("/nonexistent/schema.toml")).unwrap_err();
        assert!(matches!(err, SchemaError::ReadError { .. }));
    }
}
