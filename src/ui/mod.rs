//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All command output goes through this module so quiet and debug modes
//! behave the same everywhere. Diagnostics from the core go through
//! `tracing` instead.

pub mod output;
