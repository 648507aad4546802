//! Local file-based store backend.
//!
//! Records live in one JSON snapshot per stage/service. Every operation
//! reads the whole file, applies the change, and rewrites it. Versions are
//! simple string counters starting at "1".

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;
use tokio::fs;
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::spec::Entry;

use super::{RecordKind, Store, StoredRecord};

/// Local JSON snapshot store.
#[derive(Debug)]
pub struct LocalStore {
    /// Path to the snapshot file.
    path: PathBuf,
}

impl LocalStore {
    /// Creates a store over the given snapshot file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Reads the full snapshot. A missing file is an empty store.
    async fn read_all(&self) -> Result<Vec<StoredRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            StoreError::Corrupted {
                path: self.path.clone(),
                message: format!("failed to read snapshot: {e}"),
            }
        })?;

        serde_json::from_str(&content).map_err(|e| {
            StoreError::Corrupted {
                path: self.path.clone(),
                message: format!("failed to parse snapshot: {e}"),
            }
            .into()
        })
    }

    /// Rewrites the full snapshot, creating parent directories as needed.
    async fn write_all(&self, records: &[StoredRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::request("local", "create-dir", e.to_string())
            })?;
        }

        let content = serde_json::to_string_pretty(records).map_err(|e| {
            StoreError::Serialization {
                message: e.to_string(),
            }
        })?;

        fs::write(&self.path, content)
            .await
            .map_err(|e| StoreError::request("local", "write", e.to_string()))?;

        debug!("wrote {} records to {}", records.len(), self.path.display());
        Ok(())
    }
}

/// Inserts or updates one record in the snapshot, bumping the version
/// counter on update.
fn upsert(records: &mut Vec<StoredRecord>, entry: &Entry) {
    let now = Utc::now();

    if let Some(existing) = records.iter_mut().find(|r| r.name == entry.name) {
        let version = existing
            .version
            .parse::<u64>()
            .map_or_else(|_| "1".to_string(), |v| (v + 1).to_string());
        existing.value = entry.value.clone();
        existing.version = version;
        existing.kind = RecordKind::from_secret(entry.secret);
        existing.modified = now;
    } else {
        records.push(StoredRecord {
            name: entry.name.clone(),
            value: entry.value.clone(),
            version: "1".to_string(),
            kind: RecordKind::from_secret(entry.secret),
            created: now,
            modified: now,
        });
    }
}

#[async_trait]
impl Store for LocalStore {
    async fn put(&self, entry: &Entry) -> Result<()> {
        self.put_many(std::slice::from_ref(entry)).await
    }

    async fn put_many(&self, entries: &[Entry]) -> Result<()> {
        let mut records = self.read_all().await?;
        for entry in entries {
            upsert(&mut records, entry);
        }
        self.write_all(&records).await
    }

    async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
        let records = self.read_all().await?;
        Ok(records.into_iter().find(|r| r.name == name))
    }

    async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
        let records = self.read_all().await?;
        Ok(names
            .iter()
            .filter_map(|name| records.iter().find(|r| &r.name == name).cloned())
            .collect())
    }

    async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
        let records = self.read_all().await?;
        Ok(records
            .into_iter()
            .filter(|r| r.name.starts_with(prefix))
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let names = [name.to_string()];
        self.delete_many(&names).await
    }

    async fn delete_many(&self, names: &[String]) -> Result<()> {
        let mut records = self.read_all().await?;
        records.retain(|r| !names.contains(&r.name));
        self.write_all(&records).await
    }

    fn backend_type(&self) -> &'static str {
        "local"
    }
}
