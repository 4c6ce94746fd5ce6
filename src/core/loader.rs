//! core::loader
//!
//! Ordered package discovery from name files.
//!
//! # Algorithm
//!
//! For a model, the loader walks the name file's records:
//!
//! 1. Discretization records (`DIS6`, `DISV6`, `DISU6`) move to the front;
//!    the relative order within each group is kept
//! 2. Each file name is resolved against the model's directory
//! 3. Types the model does not support are skipped with a warning
//! 4. Each accepted record gets an instance name, is built through the
//!    package factory, and loads its file
//! 5. A file written in the alternate layout is retried once with the
//!    alternate type (`rch` -> `rcha`); a second mismatch is fatal
//! 6. The loaded package joins the model, and its parent if it has one
//! 7. Files referenced from inside loaded packages are then loaded as
//!    children of the referencing package, each exactly once
//!
//! A simulation loads its time discretization first, then each model, then
//! its solutions. Exchange records stay in the name file but are not loaded.
//!
//! # Failure
//!
//! Unreadable files, malformed records and parse failures abort the load.
//! The partially built container is dropped with the error.

use std::collections::{HashSet, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;

use super::container::{ContainerError, PackageHost, RegisterOptions};
use super::files::{file_basename, file_dirname, FileLocations};
use super::model::Model;
use super::namefile::{ModelNameFile, NameFileError, NameRecord, SimulationNameFile};
use super::naming::child_package_name;
use super::package::{LoadOutcome, Package, PackageError, PackageFactory};
use super::schema::SchemaService;
use super::simulation::{model_name_from_file, Simulation, SimulationError, SIM_NAME_FILE};
use super::types::{Address, ContainerName, PackageName, PackageType, TypeError};

/// Errors that abort a load.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid name file '{path}': {source}")]
    NameFile {
        path: PathBuf,
        source: NameFileError,
    },

    #[error("failed to parse '{path}': {source}")]
    Package {
        path: PathBuf,
        source: PackageError,
    },

    #[error("malformed record '{record}': {source}")]
    MalformedRecord { record: String, source: TypeError },

    #[error("no constructor for package type '{package_type}' in {family} containers")]
    MissingConstructor {
        package_type: PackageType,
        family: String,
    },

    #[error("'{path}' does not match either layout of '{package_type}': {reason}")]
    LayoutMismatch {
        path: PathBuf,
        package_type: PackageType,
        reason: String,
    },

    #[error(transparent)]
    InvalidName(#[from] TypeError),

    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Simulation(#[from] SimulationError),
}

/// Options controlling a load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOptions {
    /// Reject content outside blocks
    pub strict: bool,
    /// Simulation name file, relative to the working directory
    pub sim_name_file: String,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            strict: false,
            sim_name_file: SIM_NAME_FILE.to_string(),
        }
    }
}

/// One package file to load.
#[derive(Debug, Clone)]
pub struct PackageRequest {
    /// Type from the name file record (or the reference)
    pub package_type: PackageType,
    /// File name as recorded
    pub filename: String,
    /// Location on disk
    pub path: PathBuf,
    /// Instance name from the record, if any
    pub name: Option<String>,
    /// Parent package, for referenced files
    pub parent: Option<Address>,
    /// Simulation working directory, the base of external file names
    pub sim_path: PathBuf,
}

/// Put priority records first, keeping relative order within both groups.
pub fn order_records(records: &[NameRecord], priority_codes: &[String]) -> Vec<NameRecord> {
    let is_priority =
        |r: &NameRecord| priority_codes.iter().any(|c| c.eq_ignore_ascii_case(&r.code));
    let (mut first, rest): (Vec<NameRecord>, Vec<NameRecord>) =
        records.iter().cloned().partition(|r| is_priority(r));
    first.extend(rest);
    first
}

fn read(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Drives package loading for models and simulations.
#[derive(Debug, Clone, Default)]
pub struct Loader {
    options: LoadOptions,
}

impl Loader {
    pub fn new(options: LoadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load a simulation and all of its models from `sim_ws`.
    pub fn load_simulation(
        &self,
        sim_ws: &Path,
        schema: Rc<dyn SchemaService>,
        factory: Rc<dyn PackageFactory>,
    ) -> Result<Simulation, LoadError> {
        let nam_path = sim_ws.join(&self.options.sim_name_file);
        let name_file = SimulationNameFile::parse(&read(&nam_path)?, self.options.strict)
            .map_err(|source| LoadError::NameFile {
                path: nam_path.clone(),
                source,
            })?;
        tracing::debug!(path = %nam_path.display(), models = name_file.models.len(), "loading simulation");

        let mut sim = Simulation::new(sim_ws, Rc::clone(&schema), Rc::clone(&factory));
        sim.set_name_filename(self.options.sim_name_file.clone());
        sim.set_name_file(name_file.clone());

        if let Some(tdis) = &name_file.tdis {
            let package_type = PackageType::new("tdis")?;
            self.load_simulation_package(&mut sim, package_type, tdis, None)?;
        }

        for record in &name_file.models {
            if schema.model_structure(&record.model_type).is_none() {
                tracing::warn!(
                    model = %record.name,
                    model_type = %record.model_type,
                    "skipping model of unsupported type"
                );
                continue;
            }
            let model = self.load_model_record(
                &mut sim,
                &record.name,
                &record.model_type,
                &record.filename,
            )?;
            sim.insert_model(model)?;
        }

        for solution in name_file.solutions() {
            let package_type = PackageType::from_record_code(&solution.code, schema.version())
                .map_err(|source| LoadError::MalformedRecord {
                    record: solution.code.clone(),
                    source,
                })?;
            self.load_simulation_package(&mut sim, package_type, &solution.filename, None)?;
        }

        for exchange in &name_file.exchanges {
            tracing::debug!(
                exchange = %exchange.exchange_type,
                file = %exchange.filename,
                "exchange kept in name file, not loaded"
            );
        }

        Ok(sim)
    }

    fn load_simulation_package(
        &self,
        sim: &mut Simulation,
        package_type: PackageType,
        filename: &str,
        name: Option<String>,
    ) -> Result<Option<Address>, LoadError> {
        if sim.package_struct(&package_type).is_none() {
            tracing::warn!(package_type = %package_type, file = filename, "skipping unsupported simulation package");
            return Ok(None);
        }
        let request = PackageRequest {
            path: sim.files().resolve_sim(filename),
            package_type,
            filename: filename.to_string(),
            name,
            parent: None,
            sim_path: sim.sim_path().to_path_buf(),
        };
        self.load_package(sim, request).map(Some)
    }

    fn load_model_record(
        &self,
        sim: &mut Simulation,
        name: &str,
        model_type: &str,
        filename: &str,
    ) -> Result<Model, LoadError> {
        let name = ContainerName::new(name)?;
        let relative = file_dirname(filename);
        sim.files_mut()
            .set_model_relative_path(name.as_str(), &relative);

        let mut model = Model::new(
            name,
            model_type,
            Rc::clone(sim.schema()),
            Rc::clone(sim.package_factory()),
        )?;
        model.assume_relative_path(&relative);
        model.set_name_filename(file_basename(filename));

        let nam_path = sim.files().resolve_sim(filename);
        let name_file = ModelNameFile::parse(&read(&nam_path)?, self.options.strict)
            .map_err(|source| LoadError::NameFile {
                path: nam_path.clone(),
                source,
            })?;
        model.set_name_file(name_file);

        if model_name_from_file(filename) != model.name().as_str() {
            tracing::debug!(model = %model.name(), file = filename, "model name differs from name file");
        }

        self.load_model(&mut model, sim.files())?;
        Ok(model)
    }

    /// Load every package listed in a model's name file.
    ///
    /// The model's name file must already be populated.
    pub fn load_model(&self, model: &mut Model, files: &FileLocations) -> Result<(), LoadError> {
        let version = model.schema().version().to_string();
        let priority = model.schema().priority_record_codes();
        let records = order_records(&model.name_file().records, &priority);
        let container = model.name().to_string();

        let mut loaded_files: HashSet<String> = HashSet::new();
        let mut loaded: VecDeque<Address> = VecDeque::new();

        for record in &records {
            let package_type =
                record
                    .package_type(&version)
                    .map_err(|source| LoadError::MalformedRecord {
                        record: format!("{} {}", record.code, record.filename),
                        source,
                    })?;
            if !model.supports(&package_type) {
                tracing::warn!(
                    model = %container,
                    code = %record.code,
                    file = %record.filename,
                    "skipping unsupported package type"
                );
                continue;
            }

            let request = PackageRequest {
                path: files.resolve(&container, &record.filename),
                package_type,
                filename: record.filename.clone(),
                name: record.name.clone(),
                parent: None,
                sim_path: files.sim_path().to_path_buf(),
            };
            tracing::debug!(model = %container, file = %record.filename, "loading package");
            let address = self.load_package(model, request)?;
            loaded_files.insert(record.filename.clone());
            loaded.push_back(address);
        }

        while let Some(parent) = loaded.pop_front() {
            let references = match model.package(&parent) {
                Some(package) => package.referenced_files(),
                None => continue,
            };
            for reference in references {
                if !loaded_files.insert(reference.filename.clone()) {
                    continue;
                }
                if !model.supports(&reference.package_type) {
                    tracing::warn!(
                        model = %container,
                        package_type = %reference.package_type,
                        file = %reference.filename,
                        "skipping unsupported referenced file"
                    );
                    continue;
                }
                let request = PackageRequest {
                    path: files.resolve(&container, &reference.filename),
                    package_type: reference.package_type,
                    filename: reference.filename,
                    name: None,
                    parent: Some(parent.clone()),
                    sim_path: files.sim_path().to_path_buf(),
                };
                let address = self.load_package(model, request)?;
                loaded.push_back(address);
            }
        }

        Ok(())
    }

    /// Load one package file into `host`.
    ///
    /// The package keeps the file name it was loaded from. Its instance name
    /// is the first free `<parent>_<type>_<n>` for children, the recorded
    /// name for multi-instance types (or `<type>_<n>` when the record has
    /// none), and the type tag for single-instance types without a recorded
    /// name.
    pub fn load_package<H: PackageHost>(
        &self,
        host: &mut H,
        request: PackageRequest,
    ) -> Result<Address, LoadError> {
        let name = self.instance_name(host, &request)?;
        let text = read(&request.path)?;

        let mut package = self.build(host, &request.package_type, &request, &name)?;
        let outcome = package
            .load(&text, self.options.strict)
            .map_err(|source| LoadError::Package {
                path: request.path.clone(),
                source,
            })?;

        if let LoadOutcome::LayoutMismatch { reason } = outcome {
            let alternate = request.package_type.alternate();
            tracing::debug!(
                file = %request.filename,
                from = %request.package_type,
                to = %alternate,
                reason = %reason,
                "retrying with alternate layout"
            );
            if let Some(address) = package.address() {
                host.container_mut().registry_mut().release(address);
            }
            if host.package_struct(&alternate).is_none() {
                return Err(LoadError::LayoutMismatch {
                    path: request.path.clone(),
                    package_type: request.package_type.clone(),
                    reason,
                });
            }

            package = self.build(host, &alternate, &request, &name)?;
            let outcome = package
                .load(&text, self.options.strict)
                .map_err(|source| LoadError::Package {
                    path: request.path.clone(),
                    source,
                })?;
            if let LoadOutcome::LayoutMismatch { reason } = outcome {
                if let Some(address) = package.address() {
                    host.container_mut().registry_mut().release(address);
                }
                return Err(LoadError::LayoutMismatch {
                    path: request.path,
                    package_type: alternate,
                    reason,
                });
            }
        }

        package.track_external_files(&request.sim_path);
        Ok(host.attach_package(package)?)
    }

    fn instance_name<H: PackageHost>(
        &self,
        host: &mut H,
        request: &PackageRequest,
    ) -> Result<PackageName, LoadError> {
        let package_type = &request.package_type;
        let multi = host
            .package_struct(package_type)
            .is_some_and(|s| s.multi_package);

        if let Some(parent) = &request.parent {
            let base = child_package_name(parent, package_type);
            return Ok(host.container().next_free_name(&base)?);
        }
        if multi {
            let n = host.container_mut().counters_mut().next(package_type.as_str());
            let name = match &request.name {
                Some(name) => name.clone(),
                None => format!("{package_type}_{n}"),
            };
            return Ok(PackageName::new(name)?);
        }
        match &request.name {
            Some(name) => Ok(PackageName::new(name.clone())?),
            None => Ok(PackageName::from(package_type)),
        }
    }

    fn build<H: PackageHost>(
        &self,
        host: &mut H,
        package_type: &PackageType,
        request: &PackageRequest,
        name: &PackageName,
    ) -> Result<Package, LoadError> {
        let family = host.family();
        let constructor = host
            .factory()
            .constructor(package_type, &family)
            .ok_or_else(|| LoadError::MissingConstructor {
                package_type: package_type.clone(),
                family,
            })?;
        let mut package = constructor
            .build()
            .with_name(name.clone())
            .with_filename(request.filename.clone());
        if let Some(parent) = &request.parent {
            package = package.with_parent(parent.clone());
        }
        host.register_package(&mut package, RegisterOptions::keep_identity());
        Ok(package)
    }
}
