//! core::simulation
//!
//! The Simulation container: models, simulation-level packages, the
//! simulation name file and the File Location Map.
//!
//! # Design
//!
//! The simulation owns everything shared by its models: the injected schema
//! and factory, the [`FileLocations`] table, and the simulation name file
//! that lists models, time discretization and solutions. It is itself a
//! [`PackageHost`] for simulation-level packages (TDIS, IMS).
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use mfsim::core::container::PackageHost;
//! use mfsim::core::package::DefaultPackageFactory;
//! use mfsim::core::schema::Schema;
//! use mfsim::core::simulation::Simulation;
//! use mfsim::core::types::PackageType;
//!
//! let schema = Rc::new(Schema::builtin().unwrap());
//! let factory = Rc::new(DefaultPackageFactory::new(schema.clone()));
//! let mut sim = Simulation::new("/tmp/sim", schema, factory);
//!
//! sim.add_model("flow", "gwf6").unwrap();
//! sim.create_package(&PackageType::new("tdis").unwrap()).unwrap();
//! sim.set_model_relative_path("flow", "models/flow").unwrap();
//!
//! assert_eq!(sim.name_file().models[0].filename, "models/flow/flow.nam");
//! assert_eq!(sim.name_file().tdis.as_deref(), Some("sim.tdis"));
//! ```

use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use super::container::{ContainerError, PackageContainer, PackageHost};
use super::files::{file_basename, FileLocations};
use super::loader::{LoadError, LoadOptions, Loader};
use super::model::{copy_external_files, write_file, Model};
use super::namefile::{ModelRecord, SimulationNameFile, SolutionRecord};
use super::package::factory::SIMULATION_FAMILY;
use super::package::{Package, PackageFactory};
use super::schema::{PackageStructure, SchemaService};
use super::types::{ContainerName, PackageType, TypeError};
use super::verify::{verify_simulation, VerifyResult};

/// Default simulation name file.
pub const SIM_NAME_FILE: &str = "mfsim.nam";

/// Solution group new solutions are placed in.
const DEFAULT_SOLUTION_GROUP: u32 = 1;

/// Errors from simulation operations.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error("model '{0}' already exists")]
    DuplicateModel(String),

    #[error("model '{0}' does not exist")]
    UnknownModel(String),
}

/// A simulation: models plus simulation-level packages.
#[derive(Debug)]
pub struct Simulation {
    name: ContainerName,
    schema: Rc<dyn SchemaService>,
    factory: Rc<dyn PackageFactory>,
    name_file: SimulationNameFile,
    name_filename: String,
    files: FileLocations,
    models: Vec<Model>,
    container: PackageContainer,
}

impl Simulation {
    /// Create an empty simulation rooted at `sim_ws`.
    pub fn new(
        sim_ws: impl Into<PathBuf>,
        schema: Rc<dyn SchemaService>,
        factory: Rc<dyn PackageFactory>,
    ) -> Self {
        Self {
            name: ContainerName::simulation(),
            schema,
            factory,
            name_file: SimulationNameFile::new(),
            name_filename: SIM_NAME_FILE.to_string(),
            files: FileLocations::new(sim_ws),
            models: Vec::new(),
            container: PackageContainer::new(),
        }
    }

    /// Load a simulation from `sim_ws`.
    pub fn load(
        sim_ws: &Path,
        schema: Rc<dyn SchemaService>,
        factory: Rc<dyn PackageFactory>,
        options: LoadOptions,
    ) -> Result<Self, LoadError> {
        Loader::new(options).load_simulation(sim_ws, schema, factory)
    }

    pub fn name(&self) -> &ContainerName {
        &self.name
    }

    pub fn schema(&self) -> &Rc<dyn SchemaService> {
        &self.schema
    }

    pub fn package_factory(&self) -> &Rc<dyn PackageFactory> {
        &self.factory
    }

    pub fn name_file(&self) -> &SimulationNameFile {
        &self.name_file
    }

    pub(crate) fn set_name_file(&mut self, name_file: SimulationNameFile) {
        self.name_file = name_file;
    }

    pub fn name_filename(&self) -> &str {
        &self.name_filename
    }

    pub fn set_name_filename(&mut self, filename: impl Into<String>) {
        self.name_filename = filename.into();
    }

    pub fn files(&self) -> &FileLocations {
        &self.files
    }

    pub(crate) fn files_mut(&mut self) -> &mut FileLocations {
        &mut self.files
    }

    /// Simulation working directory.
    pub fn sim_path(&self) -> &Path {
        self.files.sim_path()
    }

    pub fn models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter()
    }

    /// Model by name.
    pub fn model(&self, name: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.name().as_str() == name)
    }

    pub fn model_mut(&mut self, name: &str) -> Option<&mut Model> {
        self.models.iter_mut().find(|m| m.name().as_str() == name)
    }

    /// Create a model and list it in the simulation name file.
    pub fn add_model(&mut self, name: &str, model_type: &str) -> Result<&mut Model, SimulationError> {
        let name = ContainerName::new(name)?;
        let model = Model::new(
            name,
            model_type,
            Rc::clone(&self.schema),
            Rc::clone(&self.factory),
        )?;
        self.name_file.add_model(ModelRecord {
            model_type: model.model_type().to_string(),
            filename: model.name_filename().to_string(),
            name: model.name().to_string(),
        });
        self.files.set_model_relative_path(model.name().as_str(), ".");
        self.insert_model(model)
    }

    /// Add an already-built model without touching the name file.
    pub(crate) fn insert_model(&mut self, model: Model) -> Result<&mut Model, SimulationError> {
        if self.model(model.name().as_str()).is_some() {
            return Err(SimulationError::DuplicateModel(model.name().to_string()));
        }
        let index = self.models.len();
        self.models.push(model);
        Ok(&mut self.models[index])
    }

    /// Move a model into `dir` relative to the simulation working directory.
    ///
    /// Updates the File Location Map, the model's record in the simulation
    /// name file, and every file the model records. File names never change.
    pub fn set_model_relative_path(&mut self, model: &str, dir: &str) -> Result<(), SimulationError> {
        let Some(target) = self.models.iter_mut().find(|m| m.name().as_str() == model) else {
            return Err(SimulationError::UnknownModel(model.to_string()));
        };
        self.files.set_model_relative_path(model, dir);
        let dir = self.files.model_relative_path(model).to_string();
        if !self.name_file.relocate_model(model, &dir) {
            tracing::warn!(model, "model has no record in the simulation name file");
        }
        target.set_relative_path(&dir);
        Ok(())
    }

    /// Full validity report for the simulation and its models.
    pub fn verify(&self) -> VerifyResult {
        verify_simulation(self)
    }

    pub fn is_valid(&self) -> bool {
        self.verify().ok
    }

    /// Write every file of the simulation under `ws`.
    ///
    /// Returns the paths written.
    pub fn write(&self, ws: &Path) -> Result<Vec<PathBuf>, ContainerError> {
        let mut files = self.files.clone();
        files.set_sim_path(ws);

        let mut written = Vec::new();
        let nam_path = files.resolve_sim(&self.name_filename);
        write_file(&nam_path, &self.name_file.render())?;
        written.push(nam_path);

        for package in self.container.packages() {
            let path = files.resolve_sim(package.filename());
            write_file(&path, &package.render())?;
            written.push(path);
            written.extend(copy_external_files(package, ws)?);
        }

        for model in &self.models {
            written.extend(model.write(&files)?);
        }
        tracing::debug!(count = written.len(), ws = %ws.display(), "wrote simulation");
        Ok(written)
    }
}

impl PackageHost for Simulation {
    fn container_name(&self) -> &ContainerName {
        &self.name
    }

    fn container_type(&self) -> &str {
        "simulation"
    }

    fn family(&self) -> String {
        SIMULATION_FAMILY.to_string()
    }

    fn version(&self) -> String {
        self.schema.version().to_string()
    }

    fn package_struct(&self, package_type: &PackageType) -> Option<PackageStructure> {
        let structure = self.schema.simulation_structure();
        if package_type.is_name_file() {
            return Some(structure.name_file.clone());
        }
        structure.get_package_struct(package_type).cloned()
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

    /// TDIS goes to the timing block; IMS to solution group 1, solving every
    /// model. A solution already listed under the same file name keeps its
    /// model list.
    fn record_package(&mut self, package: &Package) {
        match package.package_type().as_str() {
            "tdis" => self.name_file.set_timing(package.filename()),
            "ims" => {
                let filename = package.filename().to_string();
                if self.name_file.solutions().any(|s| s.filename == filename) {
                    return;
                }
                let models = self.models.iter().map(|m| m.name().to_string()).collect();
                self.name_file.update_solution(
                    DEFAULT_SOLUTION_GROUP,
                    SolutionRecord {
                        code: package.package_type().record_code(self.schema.version()),
                        filename,
                        models,
                    },
                );
            }
            other => {
                tracing::debug!(package_type = other, "no simulation name file slot for package");
            }
        }
    }

    fn forget_package(&mut self, package: &Package) {
        match package.package_type().as_str() {
            "tdis" => {
                if self.name_file.tdis.as_deref() == Some(package.filename()) {
                    self.name_file.tdis = None;
                }
            }
            "ims" => {
                self.name_file.remove_solution(package.filename());
            }
            _ => {}
        }
    }
}

/// Model name as it would be derived from a name file path (`a/flow.nam` -> `flow`).
pub fn model_name_from_file(filename: &str) -> &str {
    let base = file_basename(filename);
    base.rsplit_once('.').map(|(stem, _)| stem).unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::package::DefaultPackageFactory;
    use crate::core::schema::Schema;

    fn simulation() -> Simulation {
        let schema: Rc<dyn SchemaService> = Rc::new(Schema::builtin().unwrap());
        let factory = Rc::new(DefaultPackageFactory::new(schema.clone()));
        Simulation::new("/sim", schema, factory)
    }

    fn tag(s: &str) -> PackageType {
        PackageType::new(s).unwrap()
    }

    #[test]
    fn add_model_lists_it() {
        let mut sim = simulation();
        sim.add_model("flow", "gwf6").unwrap();
        let record = &sim.name_file().models[0];
        assert_eq!(record.model_type, "gwf6");
        assert_eq!(record.filename, "flow.nam");
        assert_eq!(record.name, "flow");
        assert!(sim.model("flow").is_some());
        assert!(matches!(
            sim.add_model("flow", "gwf6"),
            Err(SimulationError::DuplicateModel(_))
        ));
        assert!(sim.add_model("bad name", "gwf6").is_err());
    }

    #[test]
    fn simulation_packages_fill_name_file_slots() {
        let mut sim = simulation();
        sim.add_model("a", "gwf6").unwrap();
        sim.add_model("b", "gwt6").unwrap();
        sim.create_package(&tag("tdis")).unwrap();
        let ims = sim.create_package(&tag("ims")).unwrap();
        assert_eq!(sim.name_file().tdis.as_deref(), Some("sim.tdis"));
        let solution = sim.name_file().solutions().next().unwrap();
        assert_eq!(solution.code, "IMS6");
        assert_eq!(solution.filename, "sim.ims");
        assert_eq!(solution.models, vec!["a", "b"]);

        sim.remove_package(&ims).unwrap();
        assert_eq!(sim.name_file().solutions().count(), 0);
    }

    #[test]
    fn model_packages_are_rejected_at_simulation_level() {
        let mut sim = simulation();
        assert!(sim.create_package(&tag("dis")).is_err());
    }

    #[test]
    fn relocation_updates_every_layer() {
        let mut sim = simulation();
        let model = sim.add_model("flow", "gwf6").unwrap();
        model.create_package(&tag("dis")).unwrap();
        sim.set_model_relative_path("flow", "sub/dir").unwrap();
        sim.set_model_relative_path("flow", "sub/dir").unwrap();

        assert_eq!(sim.files().model_relative_path("flow"), "sub/dir");
        assert_eq!(sim.files().last_accessed(), Some("flow"));
        assert_eq!(sim.name_file().models[0].filename, "sub/dir/flow.nam");
        let model = sim.model("flow").unwrap();
        assert_eq!(model.name_file().records[0].filename, "sub/dir/flow.dis");
        assert_eq!(model.name_file().list_file.as_deref(), Some("sub/dir/flow.lst"));

        assert!(matches!(
            sim.set_model_relative_path("nope", "x"),
            Err(SimulationError::UnknownModel(_))
        ));
    }

    #[test]
    fn validity_needs_tdis_and_ims() {
        let mut sim = simulation();
        assert!(!sim.is_valid());
        sim.create_package(&tag("tdis")).unwrap();
        sim.create_package(&tag("ims")).unwrap();
        // Fresh TDIS lacks its required blocks
        assert!(!sim.is_valid());
    }

    #[test]
    fn model_name_from_file_strips_dir_and_extension() {
        assert_eq!(model_name_from_file("a/b/flow.nam"), "flow");
        assert_eq!(model_name_from_file("flow"), "flow");
    }
}
