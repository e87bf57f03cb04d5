//! # kkit CLI Module
//!
//! This module implements the CLI interface for kkit.
//!
//! ## Available Commands
//!
//! - `export` - Write a model document as a kkit dump file
//! - `status` - Show entity counts and estimated header values

mod commands;

use crate::config::{ClockConfig, Config};
use clap::{Parser, Subcommand};
use kkit_core::KkitError;
use std::path::PathBuf;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// kkit - GENESIS kkit model exporter
///
/// Reads a chemical kinetics model document and writes it in the kkit v11
/// flat dump format.
#[derive(Parser, Debug)]
#[command(name = "kkit")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress informational logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Path to a kkit.toml configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output in JSON format (for programmatic access)
    #[arg(long, global = true)]
    pub json_mode: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a model document to a kkit dump file
    Export {
        /// Path to the model document (JSON)
        #[arg(short, long)]
        model: PathBuf,

        /// Output file path
        #[arg(short, long)]
        output: PathBuf,

        /// Simulation run time in seconds
        #[arg(long)]
        run_time: Option<f64>,

        /// Chemical simulation step in seconds
        #[arg(long)]
        sim_dt: Option<f64>,

        /// Plot sampling step in seconds
        #[arg(long)]
        plot_dt: Option<f64>,
    },

    /// Show model status
    Status {
        /// Path to the model document (JSON)
        #[arg(short, long)]
        model: PathBuf,
    },
}

impl Cli {
    /// Default log filter for the chosen verbosity.
    #[must_use]
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "kkit=debug,kkit_core=debug"
        } else if self.quiet {
            "kkit=warn,kkit_core=warn"
        } else {
            "kkit=info,kkit_core=info"
        }
    }
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments.
pub fn execute(cli: Cli) -> Result<(), KkitError> {
    let config = Config::resolve(cli.config.as_deref())?;
    let json_mode = cli.json_mode;

    match cli.command {
        Commands::Export {
            model,
            output,
            run_time,
            sim_dt,
            plot_dt,
        } => {
            let overrides = ClockConfig {
                run_time,
                sim_dt,
                plot_dt,
            };
            cmd_export(&config, json_mode, &model, &output, overrides).map(|_| ())
        }
        Commands::Status { model } => cmd_status(&config, json_mode, &model).map(|_| ()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
