//! core::schema
//!
//! The Schema Service: package-type metadata consumed by containers,
//! the loader and the package factory.
//!
//! # Modules
//!
//! - [`definition`] - TOML-backed schema definitions and the builtin MODFLOW 6 schema
//!
//! # Design
//!
//! The schema is an explicitly constructed service injected into each
//! simulation (`Rc<dyn SchemaService>`), never a process-wide singleton.
//! Containers ask it three questions:
//!
//! - Which package types may this container hold?
//! - Is a type required, and may several instances coexist?
//! - Which types must load first (discretization priority)?
//!
//! # Example
//!
//! ```
//! use mfsim::core::schema::{Schema, SchemaService};
//! use mfsim::core::types::PackageType;
//!
//! let schema = Schema::builtin().unwrap();
//! let gwf = schema.model_structure("gwf6").unwrap();
//!
//! let wel = gwf.get_package_struct(&PackageType::new("wel").unwrap()).unwrap();
//! assert!(wel.multi_package);
//! assert!(wel.optional);
//!
//! assert_eq!(schema.priority_record_codes(), vec!["DIS6", "DISV6", "DISU6"]);
//! ```

pub mod definition;

pub use definition::{Schema, SchemaError};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::naming::model_family;
use super::types::PackageType;

/// Physical layout a package representation expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Row/list-based period data (the default)
    #[default]
    List,
    /// Array-based period data (`READASARRAYS`)
    Array,
}

/// Schema entry for one package type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageStructure {
    /// The package type this entry describes
    pub file_type: PackageType,
    /// Whether a container is valid without an instance of this type
    pub optional: bool,
    /// Whether several instances may coexist in one container
    pub multi_package: bool,
    /// Layout the package representation expects
    pub layout: Layout,
    /// Blocks a package file must contain to be valid
    pub required_blocks: Vec<String>,
    /// Human-readable description
    pub description: Option<String>,
}

impl PackageStructure {
    /// An optional, single-instance, list-layout structure with no required blocks.
    pub fn new(file_type: PackageType) -> Self {
        Self {
            file_type,
            optional: true,
            multi_package: false,
            layout: Layout::List,
            required_blocks: Vec::new(),
            description: None,
        }
    }
}

/// Schema entries for one model type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelStructure {
    /// Model type as written in the simulation name file (`gwf6`)
    pub model_type: String,
    /// Structure of the model name file
    pub name_file: PackageStructure,
    /// Package types this model may hold
    pub package_struct_objs: BTreeMap<PackageType, PackageStructure>,
}

impl ModelStructure {
    /// Look up the structure for a package type.
    pub fn get_package_struct(&self, package_type: &PackageType) -> Option<&PackageStructure> {
        self.package_struct_objs.get(package_type)
    }

    /// Model family (`gwf6` -> `gwf`).
    pub fn family(&self) -> String {
        model_family(&self.model_type)
    }
}

/// Schema entries for simulation-level packages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStructure {
    /// Structure of the simulation name file
    pub name_file: PackageStructure,
    /// Package types the simulation itself may hold
    pub package_struct_objs: BTreeMap<PackageType, PackageStructure>,
}

impl SimulationStructure {
    /// Look up the structure for a simulation-level package type.
    pub fn get_package_struct(&self, package_type: &PackageType) -> Option<&PackageStructure> {
        self.package_struct_objs.get(package_type)
    }
}

/// Errors from structure lookups.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StructureError {
    #[error("package type '{package_type}' is not defined for {container_type}")]
    NotFound {
        package_type: PackageType,
        container_type: String,
    },

    #[error("unknown model type '{0}'")]
    UnknownModelType(String),
}

/// Lookup service for package-type metadata.
///
/// Implementations must be deterministic: the same question always gets
/// the same answer for the lifetime of a simulation build.
pub trait SchemaService: std::fmt::Debug {
    /// Schema version string, used as the record-code suffix (`"6"`).
    fn version(&self) -> &str;

    /// Structure for a model type (case-insensitive).
    fn model_structure(&self, model_type: &str) -> Option<&ModelStructure>;

    /// All model types the schema defines.
    fn model_types(&self) -> Vec<&str>;

    /// Structure for simulation-level packages.
    fn simulation_structure(&self) -> &SimulationStructure;

    /// Utility package types shared by every model (`obs`, `ts`, ...).
    fn utl_struct_objs(&self) -> &BTreeMap<PackageType, PackageStructure>;

    /// Package types loaded before everything else.
    fn priority_types(&self) -> &[PackageType];

    /// Name-file record codes of the priority types (`DIS6`, ...).
    fn priority_record_codes(&self) -> Vec<String> {
        self.priority_types()
            .iter()
            .map(|t| t.record_code(self.version()))
            .collect()
    }

    /// Structure for the first model type in a family (`gwf` -> `gwf6`).
    fn model_structure_for_family(&self, family: &str) -> Option<&ModelStructure> {
        self.model_types()
            .into_iter()
            .find(|t| model_family(t) == family)
            .and_then(|t| self.model_structure(t))
    }
}
