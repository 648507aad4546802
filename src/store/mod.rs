//! Store backends for configuration and secret records.
//!
//! This module defines the common interface over the three backends (SSM
//! Parameter Store, Secrets Manager, local JSON snapshot) plus the factory
//! that selects one from a resolved spec.

mod local;
mod record;
mod secrets_manager;
mod ssm;

pub use local::LocalStore;
pub use record::{RecordKind, StoredRecord};
pub use secrets_manager::SecretsManagerStore;
pub use ssm::SsmStore;

use async_trait::async_trait;
use aws_config::SdkConfig;
use std::path::{Path, PathBuf};

use crate::error::{ConfidantError, Result, StoreError};
use crate::spec::{Entry, Provider, ResolvedSpec};

/// Trait for record storage backends.
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes one entry, creating or overwriting it.
    async fn put(&self, entry: &Entry) -> Result<()>;

    /// Writes entries in declaration order.
    ///
    /// Stops at the first failure: earlier writes stand, later entries are
    /// never attempted.
    async fn put_many(&self, entries: &[Entry]) -> Result<()> {
        for entry in entries {
            self.put(entry)
                .await
                .map_err(|e| StoreError::write_failed(&entry.name, e.to_string()))?;
        }
        Ok(())
    }

    /// Reads one record by its absolute name.
    ///
    /// Returns `None` when no record exists under that name.
    async fn get(&self, name: &str) -> Result<Option<StoredRecord>>;

    /// Reads the named records, omitting names that do not exist.
    async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>>;

    /// Reads every record whose name starts with `prefix`.
    async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>>;

    /// Deletes one record by name. Deleting an absent record is not an
    /// error.
    async fn delete(&self, name: &str) -> Result<()>;

    /// Deletes the named records.
    async fn delete_many(&self, names: &[String]) -> Result<()> {
        for name in names {
            self.delete(name).await?;
        }
        Ok(())
    }

    /// Gets the backend type name.
    fn backend_type(&self) -> &'static str;
}

#[async_trait]
impl Store for Box<dyn Store> {
    async fn put(&self, entry: &Entry) -> Result<()> {
        (**self).put(entry).await
    }

    async fn put_many(&self, entries: &[Entry]) -> Result<()> {
        (**self).put_many(entries).await
    }

    async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
        (**self).get(name).await
    }

    async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
        (**self).get_many(names).await
    }

    async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
        (**self).get_by_path(prefix).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        (**self).delete(name).await
    }

    async fn delete_many(&self, names: &[String]) -> Result<()> {
        (**self).delete_many(names).await
    }

    fn backend_type(&self) -> &'static str {
        (**self).backend_type()
    }
}

/// Builds the store backend selected by the resolved spec.
///
/// # Errors
///
/// Returns an error when a cloud provider is selected but no SDK
/// configuration was supplied.
pub fn for_spec(spec: &ResolvedSpec, sdk: Option<&SdkConfig>) -> Result<Box<dyn Store>> {
    match spec.provider {
        Provider::Ssm => {
            let config = sdk.ok_or_else(|| {
                ConfidantError::internal("ssm provider selected without AWS configuration")
            })?;
            Ok(Box::new(SsmStore::new(config)))
        }
        Provider::SecretsManager => {
            let config = sdk.ok_or_else(|| {
                ConfidantError::internal(
                    "secrets-manager provider selected without AWS configuration",
                )
            })?;
            Ok(Box::new(SecretsManagerStore::new(config)))
        }
        Provider::Local => Ok(Box::new(LocalStore::new(local_store_path(spec)))),
    }
}

/// Computes the snapshot file path for the local provider:
/// `{db_dir}/{stage}-{service}.json`, defaulting the directory to
/// `~/.confidant`.
#[must_use]
pub fn local_store_path(spec: &ResolvedSpec) -> PathBuf {
    let dir = spec
        .db_dir
        .clone()
        .map_or_else(|| expand_home(Path::new("~/.confidant")), |d| expand_home(&d));
    let file = if spec.stage.is_empty() {
        format!("{}.json", spec.service)
    } else {
        format!("{}-{}.json", spec.stage, spec.service)
    };
    dir.join(file)
}

/// Expands a leading `~` to the user's home directory.
fn expand_home(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::Generate;

    fn spec_with(stage: &str, db_dir: Option<&str>) -> ResolvedSpec {
        ResolvedSpec {
            service: "api".to_string(),
            stage: stage.to_string(),
            provider: Provider::Local,
            region: "local".to_string(),
            prefix: "/dev/api/".to_string(),
            configs: Vec::new(),
            secrets: Vec::new(),
            all: Vec::new(),
            stacks: Vec::new(),
            generate: Vec::<Generate>::new(),
            db_dir: db_dir.map(PathBuf::from),
        }
    }

    #[test]
    fn test_local_path_includes_stage_and_service() {
        let path = local_store_path(&spec_with("dev", Some("/var/lib/confidant")));
        assert_eq!(path, PathBuf::from("/var/lib/confidant/dev-api.json"));
    }

    #[test]
    fn test_local_path_without_stage() {
        let path = local_store_path(&spec_with("", Some("/var/lib/confidant")));
        assert_eq!(path, PathBuf::from("/var/lib/confidant/api.json"));
    }

    #[test]
    fn test_local_path_defaults_under_home() {
        let path = local_store_path(&spec_with("dev", None));
        assert!(path.ends_with(".confidant/dev-api.json"));
    }

    #[test]
    fn test_factory_selects_local_without_sdk() {
        let store = for_spec(&spec_with("dev", Some("/tmp")), None).unwrap();
        assert_eq!(store.backend_type(), "local");
    }
}
