//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::deploy::PromptMode;
use crate::export::ExportFormat;

/// Confidant - Declarative configuration and secret deployment.
#[derive(Parser, Debug)]
#[command(name = "confidant")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Stage to operate on (dev, stage, prod, ...).
    #[arg(short, long, global = true, env = "CONFIDANT_STAGE")]
    pub stage: Option<String>,

    /// Path to the spec file (defaults to confidant.yml).
    #[arg(short, long, global = true, env = "CONFIDANT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Deploy declared configs and secrets to the store.
    Deploy {
        /// Delete stored records no longer declared.
        #[arg(long)]
        remove_orphans: bool,

        /// Prompt for secret values (missing, all).
        #[arg(short, long, value_enum)]
        prompt: Option<PromptMode>,
    },

    /// List deployed records for the current stage and service.
    List {
        /// Sort by last-modified time instead of name.
        #[arg(short, long)]
        modified: bool,

        /// Sort by version instead of name.
        #[arg(short = 'r', long = "version-sort")]
        by_version: bool,
    },

    /// Print the value of a single deployed record.
    Get {
        /// Short key of the record (last path segment).
        #[arg(short, long)]
        param: String,
    },

    /// Export deployed values in a machine-readable format.
    Export {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output_file: Option<PathBuf>,

        /// Export only the named keys (repeatable).
        #[arg(short, long = "key")]
        keys: Vec<String>,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
