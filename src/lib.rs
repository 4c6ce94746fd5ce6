//! mfsim - Schema-driven model layer for MODFLOW 6 input file sets
//!
//! mfsim builds, loads, validates and relocates the hierarchical set of input
//! files that make up a MODFLOW 6 simulation: a simulation name file, one or
//! more models, and the packages attached to each model.
//!
//! # Architecture
//!
//! The codebase follows a layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to core)
//! - [`core`] - Domain types, schema service, containers, loader, verification
//! - [`ui`] - User-facing output helpers
//!
//! # Correctness Invariants
//!
//! mfsim maintains the following invariants:
//!
//! 1. No two live packages in a container tree share an address
//! 2. A container's name file and its package collection stay consistent
//! 3. Discretization packages load before any package that depends on them
//! 4. Relocation changes directories only, never file names

pub mod cli;
pub mod core;
pub mod ui;
