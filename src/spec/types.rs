//! Specification types: the raw YAML document and the materialized entries.
//!
//! [`RawSpec`] maps one-to-one onto the `confidant.yml` file. [`ResolvedSpec`]
//! is the fully materialized form produced by the loader: prefix computed,
//! templates interpolated, entries deduplicated. It is read-only after
//! construction.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Store backend providers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Provider {
    /// AWS SSM Parameter Store.
    Ssm,
    /// AWS Secrets Manager.
    SecretsManager,
    /// Local JSON snapshot file.
    Local,
}

impl Provider {
    /// Returns true when the provider needs cloud identity and stack-output
    /// context for interpolation.
    #[must_use]
    pub const fn requires_cloud(self) -> bool {
        matches!(self, Self::Ssm | Self::SecretsManager)
    }

    /// Returns the provider name as written in the spec file.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ssm => "ssm",
            Self::SecretsManager => "secrets-manager",
            Self::Local => "local",
        }
    }
}

/// The raw specification as parsed from the YAML file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSpec {
    /// Store backend provider.
    #[serde(default)]
    pub provider: Option<Provider>,

    /// Service the entries belong to.
    #[serde(default)]
    pub service: String,

    /// Explicit path prefix override. Derived from stage/service when absent.
    #[serde(default)]
    pub prefix: Option<String>,

    /// AWS region override.
    #[serde(default)]
    pub region: Option<String>,

    /// Files to generate from the deployed configuration.
    #[serde(default)]
    pub generate: Vec<RawGenerate>,

    /// Plain configuration blocks: `defaults`, `shared`, and one per stage.
    /// Values are templates interpolated at load time.
    #[serde(default)]
    pub config: BTreeMap<String, BTreeMap<String, String>>,

    /// Secret blocks: `defaults` and `shared`. Values are human-readable
    /// descriptions; the secret values themselves are never written in the
    /// spec file.
    #[serde(default)]
    pub secret: BTreeMap<String, BTreeMap<String, String>>,

    /// CloudFormation stacks whose outputs become interpolation variables.
    /// Stack names may themselves contain placeholders.
    #[serde(rename = "cloudformation-stacks", default)]
    pub cloudformation_stacks: Vec<String>,

    /// Directory holding the local snapshot store.
    #[serde(default)]
    pub db_dir: Option<String>,
}

/// A raw generate target.
#[derive(Debug, Clone, Deserialize)]
pub struct RawGenerate {
    /// Output flavor (e.g. `dotenv`, `types-node`).
    #[serde(rename = "type")]
    pub kind: String,
    /// Output path template.
    pub path: String,
}

/// A generate target with its path interpolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generate {
    /// Output flavor.
    pub kind: String,
    /// Interpolated output path.
    pub path: String,
}

/// One declared configuration or secret value with its absolute name.
///
/// Entries are immutable once produced for a given run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Absolute slash-delimited path, unique within the resolved spec.
    pub name: String,
    /// Declared value; empty means unset/unknown (secrets start empty).
    pub value: String,
    /// Whether the backend should encrypt this entry at rest.
    pub secret: bool,
    /// Free-form metadata carried to backends that support it.
    pub description: Option<String>,
}

impl Entry {
    /// Creates a plain configuration entry.
    #[must_use]
    pub const fn plain(name: String, value: String) -> Self {
        Self {
            name,
            value,
            secret: false,
            description: None,
        }
    }

    /// Creates a secret entry. The value stays empty until resolved by
    /// prompting or by reading back the stored record.
    #[must_use]
    pub const fn secret(name: String, description: String) -> Self {
        Self {
            name,
            value: String::new(),
            secret: true,
            description: Some(description),
        }
    }

    /// Returns the last path segment of the entry name.
    #[must_use]
    pub fn key(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }
}

/// The fully materialized specification for one service/stage invocation.
#[derive(Debug, Clone)]
pub struct ResolvedSpec {
    /// Service name.
    pub service: String,
    /// Active stage.
    pub stage: String,
    /// Store backend provider.
    pub provider: Provider,
    /// Effective region (`local` for the file-based provider).
    pub region: String,
    /// Interpolated path prefix, ending with `/`.
    pub prefix: String,
    /// Plain configuration entries, deduplicated, values interpolated.
    pub configs: Vec<Entry>,
    /// Secret entries, deduplicated, values empty.
    pub secrets: Vec<Entry>,
    /// Secrets followed by configs, deduplicated by name.
    pub all: Vec<Entry>,
    /// Resolved CloudFormation stack names.
    pub stacks: Vec<String>,
    /// Generate targets with interpolated paths.
    pub generate: Vec<Generate>,
    /// Directory for the local snapshot store, when configured.
    pub db_dir: Option<PathBuf>,
}

impl ResolvedSpec {
    /// Returns the names of every declared entry.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.all.iter().map(|e| e.name.clone()).collect()
    }

    /// Looks up a declared entry by its short key (last path segment).
    ///
    /// Shared entries resolve through their own `/{stage}/shared/` path
    /// rather than the service prefix.
    #[must_use]
    pub fn entry_by_key(&self, key: &str) -> Option<&Entry> {
        self.all.iter().find(|e| e.key() == key)
    }
}
