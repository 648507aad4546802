//! Spec loading: parse, validate, resolve variables, materialize entries.
//!
//! Loading is fail-fast: required fields are validated before any network
//! resolution is attempted. Entries are deduplicated by name with last-wins
//! semantics across the blocks in declaration order defaults -> shared ->
//! stage.

use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{ConfidantError, Result, SpecError};
use crate::vars::{ResolvedVariables, ServiceContext, VariableResolver};

use super::template;
use super::types::{Entry, Generate, Provider, RawSpec, ResolvedSpec};

/// Default spec file names searched when no explicit path is given.
pub const DEFAULT_SPEC_FILES: &[&str] = &["confidant.yml", "confidant.yaml"];

/// Finds the spec file: the explicit path when given, otherwise the first
/// default name present in the current directory.
///
/// # Errors
///
/// Returns an error when no spec file can be found.
pub fn find_spec_file(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.exists() {
            return Ok(path.to_path_buf());
        }
        return Err(SpecError::FileNotFound {
            path: path.to_path_buf(),
        }
        .into());
    }

    for name in DEFAULT_SPEC_FILES {
        let path = PathBuf::from(name);
        if path.exists() {
            debug!("found spec file: {}", path.display());
            return Ok(path);
        }
    }

    Err(SpecError::FileNotFound {
        path: PathBuf::from(DEFAULT_SPEC_FILES[0]),
    }
    .into())
}

/// Parses a raw spec from YAML.
///
/// # Errors
///
/// Returns an error when the YAML is invalid.
pub fn parse_spec(content: &str, source: Option<&Path>) -> Result<RawSpec> {
    serde_yaml::from_str(content).map_err(|e| {
        SpecError::ParseError {
            message: e.to_string(),
            location: source.map(|p| p.display().to_string()),
        }
        .into()
    })
}

/// Materializes a [`ResolvedSpec`] from a raw specification.
pub struct SpecLoader<'a> {
    /// Variable resolver, required for cloud providers.
    resolver: Option<VariableResolver<'a>>,
    /// Region override, normally the SDK's effective region.
    region: Option<String>,
    /// Whether per-stage config values are interpolated like defaults and
    /// shared values are.
    interpolate_stage: bool,
}

impl Default for SpecLoader<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> SpecLoader<'a> {
    /// Creates a loader with stage interpolation enabled and no resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            resolver: None,
            region: None,
            interpolate_stage: true,
        }
    }

    /// Sets the variable resolver used for cloud providers.
    #[must_use]
    pub fn with_resolver(mut self, resolver: VariableResolver<'a>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Sets the effective region used for interpolation variables.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Controls whether per-stage config values run through the
    /// interpolator. Defaults and shared values always do.
    #[must_use]
    pub const fn with_stage_interpolation(mut self, enabled: bool) -> Self {
        self.interpolate_stage = enabled;
        self
    }

    /// Materializes the resolved spec from a parsed raw spec.
    ///
    /// # Errors
    ///
    /// Returns an error when required fields are missing, interpolation
    /// fails, or the identity lookup fails for a cloud provider.
    pub async fn load(&self, raw: RawSpec, stage: &str) -> Result<ResolvedSpec> {
        validate(&raw)?;
        let provider = raw
            .provider
            .ok_or_else(|| ConfidantError::internal("provider validated but absent"))?;

        let region = self
            .region
            .clone()
            .or_else(|| raw.region.clone())
            .unwrap_or_else(|| "local".to_string());

        let ctx = ServiceContext {
            service: raw.service.clone(),
            stage: stage.to_string(),
            region: region.clone(),
            requires_cloud: provider.requires_cloud(),
        };

        let resolved = if ctx.requires_cloud {
            let resolver = self.resolver.as_ref().ok_or_else(|| {
                ConfidantError::internal(format!(
                    "provider '{}' requires cloud context but no resolver was configured",
                    provider.name()
                ))
            })?;
            resolver.resolve(&ctx, &raw.cloudformation_stacks).await?
        } else {
            ResolvedVariables::base(&ctx)
        };
        let variables = &resolved.variables;

        let prefix = template::render(
            &derive_prefix(stage, &raw.service, raw.prefix.as_deref()),
            variables,
        )?;

        let mut configs: Vec<Entry> = Vec::new();
        for (key, value) in raw.config.get("defaults").into_iter().flatten() {
            let value = template::render(value, variables)?;
            configs.push(Entry::plain(format!("{prefix}{key}"), value));
        }
        for (key, value) in raw.config.get("shared").into_iter().flatten() {
            let value = template::render(value, variables)?;
            configs.push(Entry::plain(shared_path(stage, key), value));
        }
        for (key, value) in raw.config.get(stage).into_iter().flatten() {
            let value = if self.interpolate_stage {
                template::render(value, variables)?
            } else {
                value.clone()
            };
            configs.push(Entry::plain(format!("{prefix}{key}"), value));
        }
        let configs = dedup_last_wins(configs);

        let mut secrets: Vec<Entry> = Vec::new();
        for (key, description) in raw.secret.get("defaults").into_iter().flatten() {
            secrets.push(Entry::secret(
                format!("{prefix}{key}"),
                description.clone(),
            ));
        }
        for (key, description) in raw.secret.get("shared").into_iter().flatten() {
            secrets.push(Entry::secret(shared_path(stage, key), description.clone()));
        }
        let secrets = dedup_last_wins(secrets);

        // Secrets sort first by construction.
        let mut all = secrets.clone();
        all.extend(configs.iter().cloned());
        let all = dedup_last_wins(all);

        let mut generate = Vec::with_capacity(raw.generate.len());
        for target in &raw.generate {
            generate.push(Generate {
                kind: target.kind.clone(),
                path: template::render(&target.path, variables)?,
            });
        }

        debug!(
            "resolved {} configs and {} secrets under prefix {prefix}",
            configs.len(),
            secrets.len()
        );

        Ok(ResolvedSpec {
            service: raw.service,
            stage: stage.to_string(),
            provider,
            region,
            prefix,
            configs,
            secrets,
            all,
            stacks: resolved.stacks,
            generate,
            db_dir: raw.db_dir.map(PathBuf::from),
        })
    }
}

/// Validates required top-level fields before any network resolution.
fn validate(raw: &RawSpec) -> Result<()> {
    if raw.service.trim().is_empty() {
        return Err(SpecError::MissingField {
            field: "service".to_string(),
        }
        .into());
    }
    if raw.provider.is_none() {
        return Err(SpecError::MissingField {
            field: "provider".to_string(),
        }
        .into());
    }
    Ok(())
}

/// Computes the path prefix: the explicit override when given, otherwise
/// `/{stage}/{service}/`, degrading to `/{service}/` without a stage.
fn derive_prefix(stage: &str, service: &str, explicit: Option<&str>) -> String {
    if let Some(prefix) = explicit {
        return prefix.to_string();
    }
    if stage.is_empty() {
        format!("/{service}/")
    } else {
        format!("/{stage}/{service}/")
    }
}

/// Computes the path of a shared entry: `/{stage}/shared/{key}`, or
/// `/shared/{key}` without a stage.
fn shared_path(stage: &str, key: &str) -> String {
    if stage.is_empty() {
        format!("/shared/{key}")
    } else {
        format!("/{stage}/shared/{key}")
    }
}

/// Deduplicates entries by name; the last declared value wins while the
/// first declaration keeps its position.
fn dedup_last_wins(entries: Vec<Entry>) -> Vec<Entry> {
    let mut unique: Vec<Entry> = Vec::new();
    for entry in entries {
        if let Some(existing) = unique.iter_mut().find(|e| e.name == entry.name) {
            *existing = entry;
        } else {
            unique.push(entry);
        }
    }
    unique
}
