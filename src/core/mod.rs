//! core
//!
//! Core domain types, schema service, containers and loading for mfsim.
//!
//! # Modules
//!
//! - [`types`] - Strong types: PackageType, ContainerName, PackageName, Address
//! - [`naming`] - Deterministic name and path perturbation rules
//! - [`registry`] - Path Registry and discriminator counters
//! - [`schema`] - Schema Service trait and TOML-backed definitions
//! - [`package`] - Package instances, package data and the package factory
//! - [`namefile`] - Model and simulation name files
//! - [`files`] - File Location Map for container relative paths
//! - [`container`] - Shared package container and registration algorithm
//! - [`model`] - Model container
//! - [`simulation`] - Simulation container
//! - [`loader`] - Ordered, schema-driven loading with layout fallback
//! - [`verify`] - Validity checks
//! - [`config`] - Configuration schema and loading
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid names and addresses at construction
//! - The schema is injected, never global
//! - All ordering and naming is deterministic

pub mod config;
pub mod container;
pub mod files;
pub mod loader;
pub mod model;
pub mod namefile;
pub mod naming;
pub mod package;
pub mod registry;
pub mod schema;
pub mod simulation;
pub mod types;
pub mod verify;
