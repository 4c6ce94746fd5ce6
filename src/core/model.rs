//! core::model
//!
//! The Model container.
//!
//! # Design
//!
//! A model owns its packages (through [`PackageContainer`]) and its name
//! file. The name file is a typed field rather than a collection member:
//! it is registered for addressing only and is never counted among the
//! model's packages.
//!
//! The schema and the package factory are injected at construction and
//! shared with the enclosing simulation.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use mfsim::core::container::PackageHost;
//! use mfsim::core::model::Model;
//! use mfsim::core::package::DefaultPackageFactory;
//! use mfsim::core::schema::Schema;
//! use mfsim::core::types::{ContainerName, PackageType};
//!
//! let schema = Rc::new(Schema::builtin().unwrap());
//! let factory = Rc::new(DefaultPackageFactory::new(schema.clone()));
//! let mut model = Model::new(ContainerName::new("flow").unwrap(), "gwf6", schema, factory).unwrap();
//!
//! let wel = PackageType::new("wel").unwrap();
//! model.create_package(&wel).unwrap();
//! model.create_package(&wel).unwrap();
//!
//! assert!(model.get_package("wel_0").is_some());
//! assert_eq!(model.get_package("wel_1").unwrap().filename(), "flow.wel_1");
//! assert_eq!(model.name_file().records.len(), 2);
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use super::container::{ContainerError, PackageContainer, PackageHost};
use super::files::{normalize_dir, FileLocations};
use super::namefile::{ModelNameFile, NameRecord};
use super::package::{Package, PackageFactory};
use super::schema::{ModelStructure, PackageStructure, SchemaService, StructureError};
use super::types::{Address, ContainerName, PackageType};
use super::verify::{verify_model, VerifyResult};

/// A model: a named package container with its own name file.
#[derive(Debug)]
pub struct Model {
    name: ContainerName,
    structure: ModelStructure,
    schema: Rc<dyn SchemaService>,
    factory: Rc<dyn PackageFactory>,
    name_file: ModelNameFile,
    name_file_address: Address,
    name_filename: String,
    relative_path: String,
    container: PackageContainer,
}

impl Model {
    /// Create an empty model of `model_type`.
    ///
    /// The name file gets the address `(name, nam)`, the file name
    /// `<name>.nam`, and a listing file `<name>.lst`.
    pub fn new(
        name: ContainerName,
        model_type: &str,
        schema: Rc<dyn SchemaService>,
        factory: Rc<dyn PackageFactory>,
    ) -> Result<Self, ContainerError> {
        let structure = schema
            .model_structure(model_type)
            .cloned()
            .ok_or_else(|| StructureError::UnknownModelType(model_type.to_string()))?;

        let mut container = PackageContainer::new();
        let name_file_address = container
            .registry_mut()
            .assign(Address::top_level(&name, &PackageType::name_file()));

        let name_file = ModelNameFile {
            list_file: Some(format!("{name}.lst")),
            ..ModelNameFile::new()
        };

        Ok(Self {
            name_filename: format!("{name}.nam"),
            name,
            structure,
            schema,
            factory,
            name_file,
            name_file_address,
            relative_path: ".".to_string(),
            container,
        })
    }

    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    /// Model type as written in the simulation name file (`gwf6`).
    pub fn model_type(&self) -> &str {
        &self.structure.model_type
    }

    pub fn structure(&self) -> &ModelStructure {
        &self.structure
    }

    pub fn schema(&self) -> &Rc<dyn SchemaService> {
        &self.schema
    }

    pub fn name_file(&self) -> &ModelNameFile {
        &self.name_file
    }

    /// Replace the name file, e.g. with one read from disk.
    pub fn set_name_file(&mut self, name_file: ModelNameFile) {
        self.name_file = name_file;
    }

    pub fn name_file_address(&self) -> &Address {
        &self.name_file_address
    }

    /// File name of the model name file, without directory.
    pub fn name_filename(&self) -> &str {
        &self.name_filename
    }

    pub fn set_name_filename(&mut self, filename: impl Into<String>) {
        self.name_filename = filename.into();
    }

    /// Directory of the model relative to the simulation working directory.
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Record where the model's files already live, without rewriting them.
    pub(crate) fn assume_relative_path(&mut self, dir: &str) {
        self.relative_path = normalize_dir(dir);
    }

    /// Packages in insertion order.
    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.container.packages()
    }

    /// Whether a type is a schema-declared model package or a shared utility.
    pub fn supports(&self, package_type: &PackageType) -> bool {
        self.package_struct(package_type).is_some()
    }

    /// Move every file of the model into `dir`.
    ///
    /// Rewrites the listing file, every name file record, and each
    /// package's internal file references. File names never change.
    pub fn set_relative_path(&mut self, dir: &str) {
        let from = std::mem::replace(&mut self.relative_path, normalize_dir(dir));
        self.name_file.relocate(&self.relative_path);
        let dir = self.relative_path.clone();
        for package in self.container.packages_mut() {
            package.relocate(&from, &dir);
        }
        tracing::debug!(model = %self.name, dir = %dir, "relocated model files");
    }

    /// Full validity report.
    pub fn verify(&self) -> VerifyResult {
        verify_model(self)
    }

    /// Whether the model is valid (see [`verify`](Self::verify)).
    pub fn is_valid(&self) -> bool {
        self.verify().ok
    }

    /// Write the name file and every package under `files`.
    ///
    /// External data files read at load time are copied to where the
    /// packages now reference them. Returns the paths written.
    pub fn write(&self, files: &FileLocations) -> Result<Vec<PathBuf>, ContainerError> {
        let container = self.name.as_str();
        let mut written = Vec::new();

        let nam_path = files.resolve(container, &self.name_filename);
        write_file(&nam_path, &self.name_file.render())?;
        written.push(nam_path);

        for package in self.container.packages() {
            let path = files.resolve(container, package.filename());
            write_file(&path, &package.render())?;
            written.push(path);
            written.extend(copy_external_files(package, files.sim_path())?);
        }
        Ok(written)
    }
}

/// Write a file, creating parent directories.
pub(crate) fn write_file(path: &std::path::Path, contents: &str) -> Result<(), ContainerError> {
    let io_err = |source| ContainerError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, contents).map_err(io_err)
}

/// Copy a package's external files under `ws` at their current references.
///
/// Files already in place are left alone. A missing source is reported
/// and skipped.
pub(crate) fn copy_external_files(
    package: &Package,
    ws: &Path,
) -> Result<Vec<PathBuf>, ContainerError> {
    let mut copied = Vec::new();
    for (relative, origin) in package.external_sources() {
        let target = ws.join(relative);
        if target == origin {
            continue;
        }
        if !origin.is_file() {
            tracing::warn!(
                package = %package.name(),
                file = %origin.display(),
                "external file not found, not copied"
            );
            continue;
        }
        if let (Ok(a), Ok(b)) = (fs::canonicalize(&target), fs::canonicalize(origin)) {
            if a == b {
                continue;
            }
        }
        let io_err = |source| ContainerError::Write {
            path: target.clone(),
            source,
        };
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        fs::copy(origin, &target).map_err(io_err)?;
        copied.push(target);
    }
    Ok(copied)
}

impl PackageHost for Model {
    fn container_name(&self) -> &ContainerName {
        &self.name
    }

    fn container_type(&self) -> &str {
        &self.structure.model_type
    }

    fn family(&self) -> String {
        self.structure.family()
    }

    fn version(&self) -> String {
        self.schema.version().to_string()
    }

    fn package_struct(&self, package_type: &PackageType) -> Option<PackageStructure> {
        if package_type.is_name_file() {
            return Some(self.structure.name_file.clone());
        }
        self.structure
            .get_package_struct(package_type)
            .or_else(|| self.schema.utl_struct_objs().get(package_type))
            .cloned()
    }

    fn factory(&self) -> Rc<dyn PackageFactory> {
        Rc::clone(&self.factory)
    }

    fn container(&self) -> &PackageContainer {
        &self.container
    }

    fn container_mut(&mut self) -> &mut PackageContainer {
        &mut self.container
    }

    fn record_package(&mut self, package: &Package) {
        let code = package.package_type().record_code(self.schema.version());
        self.name_file.update_record(NameRecord::new(
            code,
            package.filename(),
            Some(package.name().to_string()),
        ));
    }

    fn forget_package(&mut self, package: &Package) {
        self.name_file
            .remove_record(package.name().as_str(), package.filename());
    }
}
