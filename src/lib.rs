// ============================================================================
// Linting
// ============================================================================

#![forbid(unsafe_code)]               // Unsafe code is forbidden
#![warn(missing_docs)]                // All public items must be documented
#![warn(clippy::all)]                 // All standard Clippy lints
#![warn(clippy::pedantic)]            // Very strict Clippy lints

// ============================================================================
// Crate Documentation
// ============================================================================

//! # Confidant
//!
//! A declarative, idempotent deployment tool for application configuration
//! and secrets.
//!
//! ## Overview
//!
//! Confidant reads a YAML spec describing the configs and secrets a service
//! needs per stage, and reconciles a store backend to match it:
//!
//! - Declare plain configs and secret placeholders in `confidant.yml`
//! - Interpolate `{{variable}}` templates from stage, service, caller
//!   identity, and CloudFormation stack outputs
//! - Deploy to SSM Parameter Store, Secrets Manager, or a local JSON file
//! - Prompt interactively for secret values, never storing them in the spec
//! - Export deployed values as JSON, YAML, dotenv, or TypeScript types
//!
//! ## Architecture
//!
//! A deploy run is a pipeline:
//!
//! 1. **Load**: parse the spec, resolve variables, materialize entries
//! 2. **Diff**: read stored records and compute what is new or changed
//! 3. **Write**: push only the differences, prompting for missing secrets
//!
//! ## Modules
//!
//! - [`spec`]: spec parsing, interpolation, and materialization
//! - [`vars`]: dynamic variable resolution
//! - [`aws`]: STS and CloudFormation adapters
//! - [`store`]: store backends (SSM, Secrets Manager, local)
//! - [`deploy`]: the reconciliation engine
//! - [`export`]: machine-readable output emitters
//! - [`cli`]: command-line interface
//!
//! ## Example
//!
//! ```yaml
//! provider: ssm
//! service: billing
//!
//! config:
//!   defaults:
//!     log-level: info
//!   prod:
//!     log-level: warn
//!
//! secret:
//!   defaults:
//!     db-password: Database password
//! ```

// ============================================================================
// Modules
// ============================================================================

pub mod aws;
pub mod cli;
pub mod deploy;
pub mod error;
pub mod export;
pub mod spec;
pub mod store;
pub mod vars;

// ============================================================================
// Re-exports
// ============================================================================

pub use cli::{Cli, Commands, TerminalPrompt};
pub use deploy::{DeployOptions, DeployReport, Deployer, PromptMode, SecretPrompt};
pub use error::{ConfidantError, Result};
pub use export::{write_export, ExportFormat};
pub use spec::{Entry, Provider, RawSpec, ResolvedSpec, SpecLoader};
pub use store::{LocalStore, SecretsManagerStore, SsmStore, Store, StoredRecord};
pub use vars::{IdentityLookup, StackOutputLookup, VariableResolver};
