//! Export emitters: stored values rendered as JSON, YAML, dotenv, or a
//! TypeScript `ProcessEnv` declaration.

use clap::ValueEnum;
use std::collections::BTreeMap;
use std::io::Write;

use crate::error::{ConfidantError, Result};
use crate::spec::{Entry, ResolvedSpec};

/// Supported export output flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ExportFormat {
    /// JSON object of key/value pairs.
    #[default]
    Json,
    /// YAML mapping of key/value pairs.
    Yaml,
    /// dotenv lines with quoted, escaped values.
    Dotenv,
    /// TypeScript `NodeJS.ProcessEnv` interface declaration.
    TypesNode,
}

/// Writes `params` to `out` in the requested format.
///
/// Keys are emitted in sorted order for every format.
///
/// # Errors
///
/// Returns an error when serialization or the underlying write fails.
pub fn write_export(
    params: &BTreeMap<String, String>,
    format: ExportFormat,
    out: &mut dyn Write,
) -> Result<()> {
    match format {
        ExportFormat::Json => {
            let body = serde_json::to_string_pretty(params)
                .map_err(|e| ConfidantError::internal(e.to_string()))?;
            writeln!(out, "{body}")?;
        }
        ExportFormat::Yaml => {
            let body = serde_yaml::to_string(params)
                .map_err(|e| ConfidantError::internal(e.to_string()))?;
            write!(out, "{body}")?;
        }
        ExportFormat::Dotenv => {
            for (key, value) in params {
                writeln!(out, "{}=\"{}\"", env_key(key), escape_double_quoted(value))?;
            }
        }
        ExportFormat::TypesNode => {
            writeln!(out, "declare global {{")?;
            writeln!(out, "  namespace NodeJS {{")?;
            writeln!(out, "    interface ProcessEnv {{")?;
            for key in params.keys() {
                writeln!(out, "      {}: string;", env_key(key))?;
            }
            writeln!(out, "    }}")?;
            writeln!(out, "  }}")?;
            writeln!(out, "}}")?;
            writeln!(out)?;
            writeln!(out, "export {{}};")?;
        }
    }
    Ok(())
}

/// Selects the declared entries to export: every entry when `keys` is
/// empty, otherwise the entries whose short key is named.
///
/// # Errors
///
/// Returns an error when a requested key is not declared.
pub fn entries_for_keys<'s>(spec: &'s ResolvedSpec, keys: &[String]) -> Result<Vec<&'s Entry>> {
    if keys.is_empty() {
        return Ok(spec.all.iter().collect());
    }

    let mut entries = Vec::with_capacity(keys.len());
    for key in keys {
        let entry = spec
            .all
            .iter()
            .find(|e| e.key() == key)
            .ok_or_else(|| ConfidantError::internal(format!("key '{key}' is not declared")))?;
        entries.push(entry);
    }
    Ok(entries)
}

/// Converts a short key to environment-variable form: uppercase with
/// dashes replaced by underscores.
#[must_use]
pub fn env_key(key: &str) -> String {
    key.to_uppercase().replace('-', "_")
}

/// Escapes a value for a double-quoted dotenv assignment.
fn escape_double_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '"' => escaped.push_str("\\\""),
            '!' => escaped.push_str("\\!"),
            '$' => escaped.push_str("\\$"),
            '`' => escaped.push_str("\\`"),
            _ => escaped.push(c),
        }
    }
    escaped
}
