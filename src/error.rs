//! Error types for the confidant deployment tool.
//!
//! This module provides the error hierarchy for all operations in the
//! deployment lifecycle: spec loading, template interpolation, variable
//! resolution, store access, and the deploy engine.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for confidant operations.
#[derive(Debug, Error)]
pub enum ConfidantError {
    /// Specification-related errors.
    #[error("Spec error: {0}")]
    Spec(#[from] SpecError),

    /// Template interpolation errors.
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    /// Dynamic variable resolution errors.
    #[error("Variable resolution error: {0}")]
    Resolve(#[from] ResolveError),

    /// Store backend errors.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// Deploy engine errors.
    #[error("Deploy error: {0}")]
    Deploy(#[from] DeployError),

    /// IO errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid command-line usage.
    #[error("{0}")]
    Usage(String),

    /// Generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Specification-related errors.
///
/// All of these are raised before any network or store activity.
#[derive(Debug, Error)]
pub enum SpecError {
    /// The spec file was not found.
    #[error("Spec file not found: {path}")]
    FileNotFound {
        /// Path to the missing file.
        path: PathBuf,
    },

    /// The spec file could not be parsed.
    #[error("Failed to parse spec: {message}")]
    ParseError {
        /// Description of the parse error.
        message: String,
        /// Optional source location.
        location: Option<String>,
    },

    /// A required top-level field is missing or empty.
    #[error("Required field '{field}' is missing from the spec")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },
}

/// Template interpolation errors.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// A placeholder references a variable that is not defined.
    #[error("Template references undefined variable '{key}'")]
    MissingVariable {
        /// Name of the missing variable.
        key: String,
    },

    /// A `{{` placeholder is never closed.
    #[error("Unterminated placeholder in template: {template}")]
    UnterminatedPlaceholder {
        /// The offending template string.
        template: String,
    },
}

/// Dynamic variable resolution errors.
#[derive(Debug, Error)]
pub enum ResolveError {
    /// The cloud identity lookup failed; nothing can be deployed.
    #[error("Failed to resolve caller identity: {message}")]
    IdentityUnavailable {
        /// Description of the failure.
        message: String,
    },

    /// A stack output lookup failed.
    ///
    /// Callers treat this as "the stack contributes nothing" rather than
    /// aborting the run.
    #[error("Failed to read outputs of stack '{stack}': {message}")]
    StackLookup {
        /// Name of the stack.
        stack: String,
        /// Description of the failure.
        message: String,
    },
}

/// Store backend errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A backend request failed.
    #[error("{backend} {operation} failed: {message}")]
    Request {
        /// Backend identifier (ssm, secrets-manager, local).
        backend: &'static str,
        /// The operation that failed.
        operation: &'static str,
        /// Description of the failure.
        message: String,
    },

    /// A write for a specific entry failed.
    ///
    /// Writes before this entry stand; writes after it were never attempted.
    #[error("Failed to write entry '{name}': {message}")]
    WriteFailed {
        /// Name of the entry that failed to write.
        name: String,
        /// Description of the failure.
        message: String,
    },

    /// The local snapshot file could not be parsed.
    #[error("Store data is corrupted at {path}: {message}")]
    Corrupted {
        /// Path to the snapshot file.
        path: PathBuf,
        /// Description of the corruption.
        message: String,
    },

    /// Record serialization failed.
    #[error("Store serialization error: {message}")]
    Serialization {
        /// Description of the serialization error.
        message: String,
    },
}

/// Deploy engine errors.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Declared secrets have no value and no prompt mode was requested.
    #[error("secret values missing ({names}); re-run deploy with --prompt missing or --prompt all")]
    MissingValues {
        /// Comma-separated names of the unresolved secrets.
        names: String,
    },

    /// Interactive prompting failed.
    #[error("Failed to prompt for '{name}': {message}")]
    PromptFailed {
        /// Key that was being prompted for.
        name: String,
        /// Description of the failure.
        message: String,
    },
}

/// Result type alias for confidant operations.
pub type Result<T> = std::result::Result<T, ConfidantError>;

impl ConfidantError {
    /// Creates a new internal error with the given message.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Creates a usage error for an operator mistake on the command line.
    #[must_use]
    pub fn usage(message: impl Into<String>) -> Self {
        Self::Usage(message.into())
    }
}

impl StoreError {
    /// Creates a backend request error.
    #[must_use]
    pub fn request(
        backend: &'static str,
        operation: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::Request {
            backend,
            operation,
            message: message.into(),
        }
    }

    /// Creates a write error for a named entry.
    #[must_use]
    pub fn write_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::WriteFailed {
            name: name.into(),
            message: message.into(),
        }
    }
}

impl DeployError {
    /// Creates a `MissingValues` error from the unresolved secret names.
    #[must_use]
    pub fn missing_values(names: &[&str]) -> Self {
        Self::MissingValues {
            names: names.join(", "),
        }
    }
}
