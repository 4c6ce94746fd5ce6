//! core::package::factory
//!
//! Package Factory: resolve a package constructor by type and model family.
//!
//! # Design
//!
//! Containers and the loader never name a concrete representation. They ask
//! a [`PackageFactory`] for a [`PackageConstructor`] and build through it, so
//! a caller can inject representations for specific package types while
//! everything else falls back to [`BlockPackage`].
//!
//! # Resolution
//!
//! - Family [`SIMULATION_FAMILY`] resolves simulation-level packages
//! - Any other family resolves the model's packages first, then the shared
//!   utility packages
//! - Unknown types resolve to `None`
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use mfsim::core::package::{DefaultPackageFactory, PackageFactory};
//! use mfsim::core::schema::Schema;
//! use mfsim::core::types::PackageType;
//!
//! let schema = Rc::new(Schema::builtin().unwrap());
//! let factory = DefaultPackageFactory::new(schema);
//!
//! let wel = PackageType::new("wel").unwrap();
//! assert!(factory.constructor(&wel, "gwf").is_some());
//! assert!(factory.constructor(&wel, "sim").is_none());
//! ```

use std::rc::Rc;

use super::{BlockPackage, Package, PackageData};
use crate::core::schema::{PackageStructure, SchemaService};
use crate::core::types::PackageType;

/// Family name used for simulation-level packages.
pub const SIMULATION_FAMILY: &str = "sim";

/// Builds an empty representation for a structure and schema version.
pub type BuildFn = fn(&PackageStructure, &str) -> Box<dyn PackageData>;

fn build_block_package(structure: &PackageStructure, version: &str) -> Box<dyn PackageData> {
    Box::new(BlockPackage::new(structure, version))
}

/// A resolved constructor: the schema entry plus a builder.
#[derive(Clone)]
pub struct PackageConstructor {
    /// Schema entry the package is built for
    pub structure: PackageStructure,
    version: String,
    build: BuildFn,
}

impl PackageConstructor {
    pub fn new(structure: PackageStructure, version: impl Into<String>, build: BuildFn) -> Self {
        Self {
            structure,
            version: version.into(),
            build,
        }
    }

    /// Constructor producing a [`BlockPackage`].
    pub fn block(structure: PackageStructure, version: impl Into<String>) -> Self {
        Self::new(structure, version, build_block_package)
    }

    /// Build an unregistered package of this type.
    pub fn build(&self) -> Package {
        let data = (self.build)(&self.structure, &self.version);
        Package::new(self.structure.file_type.clone(), data)
    }
}

impl std::fmt::Debug for PackageConstructor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageConstructor")
            .field("structure", &self.structure)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

/// Resolve constructors by package type and model family.
pub trait PackageFactory: std::fmt::Debug {
    /// Constructor for `package_type` within `family`, or `None` if the
    /// type is unknown there.
    fn constructor(&self, package_type: &PackageType, family: &str) -> Option<PackageConstructor>;
}

/// Factory backed by a schema; every known type becomes a [`BlockPackage`].
#[derive(Debug, Clone)]
pub struct DefaultPackageFactory {
    schema: Rc<dyn SchemaService>,
}

impl DefaultPackageFactory {
    pub fn new(schema: Rc<dyn SchemaService>) -> Self {
        Self { schema }
    }

    fn structure(&self, package_type: &PackageType, family: &str) -> Option<&PackageStructure> {
        if family == SIMULATION_FAMILY {
            return self
                .schema
                .simulation_structure()
                .get_package_struct(package_type);
        }
        let model = self.schema.model_structure_for_family(family)?;
        model
            .get_package_struct(package_type)
            .or_else(|| self.schema.utl_struct_objs().get(package_type))
    }
}

impl PackageFactory for DefaultPackageFactory {
    fn constructor(&self, package_type: &PackageType, family: &str) -> Option<PackageConstructor> {
        let structure = self.structure(package_type, family)?;
        Some(PackageConstructor::block(
            structure.clone(),
            self.schema.version(),
        ))
    }
}
