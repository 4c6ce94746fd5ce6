//! core::container
//!
//! The package collection shared by models and the simulation, and the
//! registration algorithm that keeps it consistent.
//!
//! # Architecture
//!
//! [`PackageContainer`] owns the state a container mutates while packages
//! come and go: the ordered collection, the name lookup, the Path Registry
//! and the discriminator counters. [`PackageHost`] is implemented by
//! [`Model`](super::model::Model) and [`Simulation`](super::simulation::Simulation)
//! and supplies what differs between them (schema lookups and name file
//! bookkeeping); registration, attachment and removal are provided methods.
//!
//! # Registration
//!
//! Registration is split in two so the loader can build and load a package
//! before it joins the collection:
//!
//! - [`PackageHost::register_package`] assigns the address, and optionally
//!   a default instance name and file name
//! - [`PackageHost::attach_package`] inserts the package, links it to its
//!   parent, and records top-level packages in the name file
//!
//! [`PackageHost::add_package`] does both.
//!
//! # Invariants
//!
//! - No two packages in a container share an address
//! - Instance names are unique within a container (case-insensitive)
//! - Every attached top-level package has a name file record

use std::collections::HashMap;
use std::rc::Rc;

use thiserror::Error;

use super::naming::{child_package_name, NameIter};
use super::package::{Package, PackageFactory};
use super::registry::{DiscriminatorCounters, PathRegistry};
use super::schema::{PackageStructure, StructureError};
use super::types::{Address, ContainerName, PackageName, PackageType, TypeError};

/// Errors from container operations.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Structure(#[from] StructureError),

    #[error("package '{0}' has not been registered")]
    NotRegistered(PackageType),

    #[error("a package named '{name}' already exists in {container}")]
    DuplicateName { name: String, container: String },

    #[error("parent package {0} does not exist")]
    UnknownParent(Address),

    #[error("no package at {0}")]
    NotFound(Address),

    #[error("failed to write '{path}': {source}")]
    Write {
        path: std::path::PathBuf,
        source: std::io::Error,
    },
}

/// What [`PackageHost::register_package`] should assign besides the address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterOptions {
    /// Generate a default instance name
    pub set_package_name: bool,
    /// Generate a default file name
    pub set_package_filename: bool,
}

impl RegisterOptions {
    /// Keep the name and file name the package already carries.
    pub fn keep_identity() -> Self {
        Self {
            set_package_name: false,
            set_package_filename: false,
        }
    }
}

impl Default for RegisterOptions {
    fn default() -> Self {
        Self {
            set_package_name: true,
            set_package_filename: true,
        }
    }
}

/// Result of registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// Assigned address
    pub address: Address,
    /// Schema entry, `None` for a type the container does not support
    pub structure: Option<PackageStructure>,
}

/// Ordered package collection with its lookups and naming state.
#[derive(Debug, Default)]
pub struct PackageContainer {
    packages: Vec<Package>,
    names: HashMap<String, Address>,
    registry: PathRegistry,
    counters: DiscriminatorCounters,
}

impl PackageContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Packages in insertion order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    fn position(&self, address: &Address) -> Option<usize> {
        self.packages
            .iter()
            .position(|p| p.address() == Some(address))
    }

    pub fn package(&self, address: &Address) -> Option<&Package> {
        self.packages.iter().find(|p| p.address() == Some(address))
    }

    pub fn package_mut(&mut self, address: &Address) -> Option<&mut Package> {
        self.packages
            .iter_mut()
            .find(|p| p.address() == Some(address))
    }

    pub(crate) fn packages_mut(&mut self) -> impl Iterator<Item = &mut Package> {
        self.packages.iter_mut()
    }

    /// Package with the given instance name (case-insensitive).
    pub fn by_name(&self, name: &str) -> Option<&Package> {
        let address = self.names.get(&name.to_ascii_lowercase())?;
        self.package(address)
    }

    /// Whether an instance name is taken (case-insensitive).
    pub fn has_name(&self, name: &str) -> bool {
        self.names.contains_key(&name.to_ascii_lowercase())
    }

    /// First name of the `<base>_0`, `<base>_1`, ... sequence not yet taken.
    pub fn next_free_name(&self, base: &str) -> Result<PackageName, TypeError> {
        let candidate = NameIter::new(base)
            .find(|candidate| !self.has_name(candidate))
            .unwrap_or_else(|| format!("{base}_0"));
        PackageName::new(candidate)
    }

    /// Whether any package writes to `filename`.
    pub fn has_filename(&self, filename: &str) -> bool {
        self.packages.iter().any(|p| p.filename() == filename)
    }

    /// Packages of one type, in insertion order.
    pub fn of_type(&self, package_type: &PackageType) -> Vec<&Package> {
        self.packages
            .iter()
            .filter(|p| p.package_type() == package_type)
            .collect()
    }

    pub fn registry(&self) -> &PathRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut PathRegistry {
        &mut self.registry
    }

    pub(crate) fn counters_mut(&mut self) -> &mut DiscriminatorCounters {
        &mut self.counters
    }

    fn insert(&mut self, package: Package, address: Address) {
        self.names.insert(package.name().key(), address);
        self.packages.push(package);
    }

    fn take(&mut self, address: &Address) -> Option<Package> {
        let index = self.position(address)?;
        let package = self.packages.remove(index);
        self.names.remove(&package.name().key());
        self.registry.release(address);
        Some(package)
    }
}

/// A container packages can be registered into.
pub trait PackageHost {
    /// Container name, the first segment of every address.
    fn container_name(&self) -> &ContainerName;

    /// Container type used in messages (`gwf6`, `simulation`).
    fn container_type(&self) -> &str;

    /// Model family for factory lookups (`gwf`, `sim`).
    fn family(&self) -> String;

    /// Schema version (record-code suffix).
    fn version(&self) -> String;

    /// Schema entry for a package type this container accepts.
    fn package_struct(&self, package_type: &PackageType) -> Option<PackageStructure>;

    /// Factory for building this container's packages.
    fn factory(&self) -> Rc<dyn PackageFactory>;

    fn container(&self) -> &PackageContainer;

    fn container_mut(&mut self) -> &mut PackageContainer;

    /// Record a newly attached top-level package in the name file.
    fn record_package(&mut self, package: &Package);

    /// Drop a removed top-level package from the name file.
    fn forget_package(&mut self, package: &Package);

    /// Assign an address and, optionally, a default name and file name.
    ///
    /// The package is not added to the collection. A type the container
    /// does not support still gets an address, but the returned structure
    /// is `None`.
    fn register_package(&mut self, package: &mut Package, options: RegisterOptions) -> Registration {
        let package_type = package.package_type().clone();
        let candidate = match package.parent() {
            Some(parent) => parent.child(&package_type),
            None => Address::top_level(self.container_name(), &package_type),
        };
        let address = self.container_mut().registry_mut().assign(candidate);
        package.set_address(address.clone());

        if package_type.is_name_file() {
            return Registration {
                address,
                structure: self.package_struct(&package_type),
            };
        }

        let structure = self.package_struct(&package_type);

        if options.set_package_name {
            let multi = structure.as_ref().is_some_and(|s| s.multi_package);
            let base = match package.parent() {
                Some(parent) => Some(child_package_name(parent, &package_type)),
                None if multi => Some(package_type.to_string()),
                None => None,
            };
            let name = base
                .and_then(|base| self.container().next_free_name(&base).ok())
                .unwrap_or_else(|| PackageName::from(&package_type));
            package.set_name(name);
        }

        if options.set_package_filename {
            let stem = package
                .parent()
                .and_then(|parent| self.container().package(parent))
                .map(|parent| parent.filename().to_string())
                .unwrap_or_else(|| self.container_name().to_string());
            let default = format!("{stem}.{package_type}");
            let filename = if self.container().has_filename(&default) {
                format!("{}.{}", self.container_name(), package.name())
            } else {
                default
            };
            package.set_filename(filename);
        }

        if structure.is_none() {
            tracing::warn!(
                package_type = %package_type,
                container = %self.container_name(),
                "registering unsupported package type"
            );
        }

        Registration { address, structure }
    }

    /// Insert a registered package into the collection.
    ///
    /// Child packages are linked into their parent's child list; top-level
    /// packages get a name file record. A duplicate instance name is
    /// rejected and the package's address is freed.
    fn attach_package(&mut self, package: Package) -> Result<Address, ContainerError> {
        let address = package
            .address()
            .cloned()
            .ok_or_else(|| ContainerError::NotRegistered(package.package_type().clone()))?;

        if self.container().has_name(package.name().as_str()) {
            self.container_mut().registry_mut().release(&address);
            return Err(ContainerError::DuplicateName {
                name: package.name().to_string(),
                container: self.container_name().to_string(),
            });
        }

        match package.parent().cloned() {
            Some(parent) => {
                if self.container().package(&parent).is_none() {
                    self.container_mut().registry_mut().release(&address);
                    return Err(ContainerError::UnknownParent(parent));
                }
                if let Some(parent_package) = self.container_mut().package_mut(&parent) {
                    parent_package.add_child(address.clone());
                }
            }
            None => self.record_package(&package),
        }

        self.container_mut().insert(package, address.clone());
        Ok(address)
    }

    /// Register and attach in one step.
    fn add_package(
        &mut self,
        mut package: Package,
        options: RegisterOptions,
    ) -> Result<Registration, ContainerError> {
        let registration = self.register_package(&mut package, options);
        self.attach_package(package)?;
        Ok(registration)
    }

    /// Build, register and attach a fresh package of `package_type`.
    ///
    /// Fails with [`StructureError::NotFound`] when the factory has no
    /// constructor for the type in this container.
    fn create_package(&mut self, package_type: &PackageType) -> Result<Address, ContainerError> {
        self.create_package_in(package_type, None)
    }

    /// Like [`create_package`](Self::create_package), nested under `parent`.
    ///
    /// The child is named `<parent>_<type>_<n>`, written to
    /// `<parent file>.<type>`, and referenced from the parent's options so
    /// it loads back as the same child.
    fn create_child_package(
        &mut self,
        parent: &Address,
        package_type: &PackageType,
    ) -> Result<Address, ContainerError> {
        self.create_package_in(package_type, Some(parent.clone()))
    }

    #[doc(hidden)]
    fn create_package_in(
        &mut self,
        package_type: &PackageType,
        parent: Option<Address>,
    ) -> Result<Address, ContainerError> {
        let constructor = self
            .factory()
            .constructor(package_type, &self.family())
            .ok_or_else(|| StructureError::NotFound {
                package_type: package_type.clone(),
                container_type: self.container_type().to_string(),
            })?;
        let mut package = constructor.build();
        if let Some(parent) = &parent {
            if self.container().package(parent).is_none() {
                return Err(ContainerError::UnknownParent(parent.clone()));
            }
            package = package.with_parent(parent.clone());
        }
        let address = self.add_package(package, RegisterOptions::default())?.address;

        if let Some(parent) = parent {
            let filename = self
                .container()
                .package(&address)
                .map(|p| p.filename().to_string())
                .unwrap_or_default();
            if let Some(parent_package) = self.container_mut().package_mut(&parent) {
                parent_package.add_reference(package_type, &filename);
            }
        }
        Ok(address)
    }

    /// Remove a package and, recursively, its children.
    ///
    /// Frees their addresses and names and drops the name file record of a
    /// top-level package. Returns the removed package.
    fn remove_package(&mut self, address: &Address) -> Result<Package, ContainerError> {
        let children = self
            .container()
            .package(address)
            .ok_or_else(|| ContainerError::NotFound(address.clone()))?
            .children()
            .to_vec();
        for child in &children {
            self.remove_package(child)?;
        }

        let package = self
            .container_mut()
            .take(address)
            .ok_or_else(|| ContainerError::NotFound(address.clone()))?;
        match package.parent() {
            Some(parent) => {
                if let Some(parent_package) = self.container_mut().package_mut(parent) {
                    parent_package.remove_child(address);
                    parent_package.remove_reference(package.filename());
                }
            }
            None => self.forget_package(&package),
        }
        Ok(package)
    }

    /// Package by instance name, else the first package of that type.
    /// Case-insensitive.
    fn get_package(&self, tag: &str) -> Option<&Package> {
        let container = self.container();
        if let Some(package) = container.by_name(tag) {
            return Some(package);
        }
        let package_type = PackageType::new(tag).ok()?;
        container.of_type(&package_type).into_iter().next()
    }

    /// Every package of one type.
    fn packages_of_type(&self, package_type: &PackageType) -> Vec<&Package> {
        self.container().of_type(package_type)
    }

    fn package(&self, address: &Address) -> Option<&Package> {
        self.container().package(address)
    }

    fn package_mut(&mut self, address: &Address) -> Option<&mut Package> {
        self.container_mut().package_mut(address)
    }
}
