//! core::verify
//!
//! Validity checks for models and simulations.
//!
//! # Checks
//!
//! - Every non-optional schema type has at least one package
//! - Every package reports itself valid
//! - Every top-level package has a name file record
//! - Every name file record resolves to a package
//! - Every model has a record in the simulation name file
//!
//! A missing required package is reported, not raised: callers decide
//! whether an invalid container is fatal.
//!
//! # Invariants
//!
//! - Never mutates the container
//! - Must be deterministic

use thiserror::Error;

use super::container::PackageHost;
use super::model::Model;
use super::simulation::Simulation;

/// One validity failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    #[error("{container}: required package type '{package_type}' is missing")]
    MissingRequiredPackage {
        container: String,
        package_type: String,
    },

    #[error("{container}: package '{name}' is not valid")]
    InvalidPackage { container: String, name: String },

    #[error("{container}: package '{name}' has no name file record")]
    MissingNameRecord { container: String, name: String },

    #[error("{container}: name file record '{filename}' has no package")]
    DanglingNameRecord { container: String, filename: String },
}

/// Result of verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyResult {
    /// Whether verification passed
    pub ok: bool,
    /// Errors found during verification
    pub errors: Vec<VerifyError>,
}

impl VerifyResult {
    /// Create a successful result.
    pub fn success() -> Self {
        Self {
            ok: true,
            errors: vec![],
        }
    }

    /// Create a failed result with errors.
    pub fn failure(errors: Vec<VerifyError>) -> Self {
        Self { ok: false, errors }
    }

    fn from_errors(errors: Vec<VerifyError>) -> Self {
        if errors.is_empty() {
            Self::success()
        } else {
            Self::failure(errors)
        }
    }
}

fn check_packages<H: PackageHost>(host: &H, errors: &mut Vec<VerifyError>) {
    let container = host.container_name().to_string();
    for package in host.container().packages() {
        if !package.is_valid() {
            errors.push(VerifyError::InvalidPackage {
                container: container.clone(),
                name: package.name().to_string(),
            });
        }
    }
}

/// Verify a model.
pub fn verify_model(model: &Model) -> VerifyResult {
    let container = model.name().to_string();
    let mut errors = Vec::new();

    for (package_type, structure) in &model.structure().package_struct_objs {
        if !structure.optional && model.packages_of_type(package_type).is_empty() {
            errors.push(VerifyError::MissingRequiredPackage {
                container: container.clone(),
                package_type: package_type.to_string(),
            });
        }
    }

    check_packages(model, &mut errors);

    let name_file = model.name_file();
    for package in model.packages().filter(|p| p.is_top_level()) {
        let recorded = name_file.find_by_name(package.name().as_str()).is_some()
            || name_file.find_by_filename(package.filename()).is_some();
        if !recorded {
            errors.push(VerifyError::MissingNameRecord {
                container: container.clone(),
                name: package.name().to_string(),
            });
        }
    }

    for record in &name_file.records {
        let resolved = model.packages().any(|p| {
            p.filename() == record.filename
                || record
                    .name
                    .as_deref()
                    .is_some_and(|n| p.name().as_str().eq_ignore_ascii_case(n))
        });
        if !resolved {
            errors.push(VerifyError::DanglingNameRecord {
                container: container.clone(),
                filename: record.filename.clone(),
            });
        }
    }

    VerifyResult::from_errors(errors)
}

/// Verify a simulation and every model in it.
pub fn verify_simulation(simulation: &Simulation) -> VerifyResult {
    let container = simulation.name().to_string();
    let mut errors = Vec::new();

    let structure = simulation.schema().simulation_structure();
    for (package_type, entry) in &structure.package_struct_objs {
        if !entry.optional && simulation.packages_of_type(package_type).is_empty() {
            errors.push(VerifyError::MissingRequiredPackage {
                container: container.clone(),
                package_type: package_type.to_string(),
            });
        }
    }

    check_packages(simulation, &mut errors);

    let name_file = simulation.name_file();
    if let Some(tdis) = &name_file.tdis {
        if !simulation.container().has_filename(tdis) {
            errors.push(VerifyError::DanglingNameRecord {
                container: container.clone(),
                filename: tdis.clone(),
            });
        }
    }
    for solution in name_file.solutions() {
        if !simulation.container().has_filename(&solution.filename) {
            errors.push(VerifyError::DanglingNameRecord {
                container: container.clone(),
                filename: solution.filename.clone(),
            });
        }
    }
    for record in &name_file.models {
        if simulation.model(&record.name).is_none() {
            errors.push(VerifyError::DanglingNameRecord {
                container: container.clone(),
                filename: record.filename.clone(),
            });
        }
    }

    for model in simulation.models() {
        if name_file.model_record(model.name().as_str()).is_none() {
            errors.push(VerifyError::MissingNameRecord {
                container: container.clone(),
                name: model.name().to_string(),
            });
        }
        errors.extend(verify_model(model).errors);
    }

    VerifyResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::namefile::NameRecord;

    #[test]
    fn result_constructors() {
        assert!(VerifyResult::success().ok);
        let failed = VerifyResult::failure(vec![VerifyError::InvalidPackage {
            container: "m".into(),
            name: "dis".into(),
        }]);
        assert!(!failed.ok);
        assert_eq!(failed.errors.len(), 1);
    }

    #[test]
    fn error_messages_name_the_container() {
        let err = VerifyError::MissingRequiredPackage {
            container: "flow".into(),
            package_type: "ic".into(),
        };
        assert_eq!(
            err.to_string(),
            "flow: required package type 'ic' is missing"
        );
    }

    #[test]
    fn dangling_records_are_reported() {
        use crate::core::package::DefaultPackageFactory;
        use crate::core::schema::{Schema, SchemaService};
        use crate::core::types::ContainerName;
        use std::rc::Rc;

        let schema: Rc<dyn SchemaService> = Rc::new(Schema::builtin().unwrap());
        let factory = Rc::new(DefaultPackageFactory::new(schema.clone()));
        let mut model = Model::new(ContainerName::new("m").unwrap(), "gwf6", schema, factory).unwrap();
        let mut name_file = model.name_file().clone();
        name_file.update_record(NameRecord::new("WEL6", "m.wel", Some("wel_0".into())));
        model.set_name_file(name_file);

        let result = verify_model(&model);
        assert!(result.errors.contains(&VerifyError::DanglingNameRecord {
            container: "m".into(),
            filename: "m.wel".into(),
        }));
    }

    #[test]
    fn models_missing_from_the_simulation_name_file_are_reported() {
        use crate::core::namefile::SimulationNameFile;
        use crate::core::package::DefaultPackageFactory;
        use crate::core::schema::{Schema, SchemaService};
        use std::rc::Rc;

        let schema: Rc<dyn SchemaService> = Rc::new(Schema::builtin().unwrap());
        let factory = Rc::new(DefaultPackageFactory::new(schema.clone()));
        let mut simulation = Simulation::new("/tmp/sim", schema, factory);
        simulation.add_model("m", "gwf6").unwrap();
        assert!(!verify_simulation(&simulation)
            .errors
            .iter()
            .any(|e| matches!(e, VerifyError::MissingNameRecord { .. })));

        simulation.set_name_file(SimulationNameFile::new());
        let result = verify_simulation(&simulation);
        assert!(result.errors.iter().any(|e| matches!(
            e,
            VerifyError::MissingNameRecord { name, .. } if name == "m"
        )));
    }
}
