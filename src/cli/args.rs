//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--cwd <path>`: Use that directory as the simulation workspace
//! - `--debug`: Enable debug logging
//! - `--quiet` / `-q`: Minimal output

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// mfsim - Load, check and relocate MODFLOW 6 input file sets
#[derive(Parser, Debug)]
#[command(name = "mfsim")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Simulation workspace (defaults to the current directory)
    #[arg(long, global = true)]
    pub cwd: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a skeleton simulation with one model
    #[command(
        name = "init",
        long_about = "Write a skeleton simulation into the workspace.\n\n\
            Creates the simulation name file with TDIS and IMS, and one model \
            holding a discretization package plus every package its type requires. \
            The model type defaults to the configured default_model_type.",
        after_help = "\
WORKFLOW EXAMPLES:
    # GWF model named 'flow' in the current directory
    mfsim init flow

    # Transport model in another workspace
    mfsim --cwd ../transport init trans --model-type gwt6"
    )]
    Init {
        /// Model name
        model: String,

        /// Model type (default: configured default_model_type)
        #[arg(long)]
        model_type: Option<String>,

        /// Overwrite an existing simulation name file
        #[arg(long)]
        force: bool,
    },

    /// List the models and packages of a simulation
    #[command(
        name = "list",
        long_about = "Load the simulation in the workspace and list its packages.\n\n\
            Every package is shown with its address, type and file name. Child \
            packages (observations, time series) are indented under their parent.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List the simulation in the current directory
    mfsim list

    # Machine-readable listing
    mfsim list --json"
    )]
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Load a simulation and report validity problems
    #[command(
        name = "check",
        long_about = "Load the simulation and verify it.\n\n\
            Reports missing required packages, invalid package files and name \
            file records that do not match a package. Exits non-zero when the \
            simulation is not valid."
    )]
    Check,

    /// Move a model's files into a subdirectory
    #[command(
        name = "relocate",
        long_about = "Move every file of one model into a directory relative to \
            the simulation workspace.\n\n\
            The simulation name file, the model name file and every file \
            reference inside the model's packages are rewritten. File names \
            themselves never change. Use '.' to move a model back to the workspace.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Move model 'flow' into ./flow and write the result in place
    mfsim relocate flow flow

    # Write the relocated simulation somewhere else
    mfsim relocate flow flow --output ../relocated"
    )]
    Relocate {
        /// Model name
        model: String,

        /// Target directory, relative to the workspace
        dir: String,

        /// Write into this workspace instead of the source one
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Load and write a simulation back out
    #[command(
        name = "rewrite",
        long_about = "Load the simulation and write every file back out.\n\n\
            Useful to normalize formatting or copy a simulation to another workspace."
    )]
    Rewrite {
        /// Write into this workspace instead of the source one
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show the package schema in use
    #[command(name = "schema")]
    Schema {
        /// Only show this model type
        model_type: Option<String>,
    },

    /// Get, set, or list configuration values
    #[command(
        name = "config",
        long_about = "Get, set, or list configuration values.\n\n\
            Workspace configuration lives in <sim_ws>/.mfsim/config.toml and \
            overrides the global configuration in ~/.mfsim/config.toml.",
        after_help = "\
WORKFLOW EXAMPLES:
    # List all configuration values
    mfsim config list

    # Reject stray content when loading this workspace
    mfsim config set strict true

    # Set a user-wide default
    mfsim config set --global default_model_type gwt6"
    )]
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    #[command(
        name = "completion",
        long_about = "Generate shell completion scripts for tab-completion.\n\n\
            Outputs a completion script for the specified shell.",
        after_help = "\
WORKFLOW EXAMPLES:
    # Bash (add to ~/.bashrc)
    mfsim completion bash >> ~/.bashrc

    # Zsh
    mfsim completion zsh > ~/.zfunc/_mfsim"
    )]
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set a configuration value
    Set {
        /// Write the global config instead of the workspace config
        #[arg(long)]
        global: bool,
        /// Configuration key
        key: String,
        /// Value to set
        value: String,
    },
    /// List all configuration values
    List,
}

/// Supported shells for completion
#[derive(clap::ValueEnum, Debug, Clone, Copy)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}
