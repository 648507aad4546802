//! Secrets Manager backend.
//!
//! Secrets Manager has no overwrite-on-create, so a write is a read
//! followed by either `CreateSecret` or `PutSecretValue`. Every record read
//! back from this backend is a secret.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_secretsmanager::types::{Filter, FilterNameStringType};
use aws_sdk_secretsmanager::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::spec::Entry;

use super::{RecordKind, Store, StoredRecord};

/// Secrets Manager backend.
pub struct SecretsManagerStore {
    client: Client,
}

impl SecretsManagerStore {
    /// Creates a store over the shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }

    /// Checks whether a secret with the given name already exists.
    async fn exists(&self, name: &str) -> Result<bool> {
        let result = self.client.describe_secret().secret_id(name).send().await;

        match result {
            Ok(_) => Ok(true),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    Ok(false)
                } else {
                    Err(StoreError::request(
                        "secrets-manager",
                        "DescribeSecret",
                        service_err.to_string(),
                    )
                    .into())
                }
            }
        }
    }
}

#[async_trait]
impl Store for SecretsManagerStore {
    async fn put(&self, entry: &Entry) -> Result<()> {
        if self.exists(&entry.name).await? {
            self.client
                .put_secret_value()
                .secret_id(&entry.name)
                .secret_string(&entry.value)
                .send()
                .await
                .map_err(|e| StoreError::write_failed(&entry.name, e.to_string()))?;
        } else {
            self.client
                .create_secret()
                .name(&entry.name)
                .secret_string(&entry.value)
                .set_description(entry.description.clone())
                .send()
                .await
                .map_err(|e| StoreError::write_failed(&entry.name, e.to_string()))?;
        }

        debug!("wrote secret {}", entry.name);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
        let result = self.client.get_secret_value().secret_id(name).send().await;

        match result {
            Ok(response) => {
                let timestamp = response.created_date().map_or_else(Utc::now, |d| {
                    DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos()).unwrap_or_default()
                });
                Ok(Some(StoredRecord {
                    name: response.name().unwrap_or(name).to_string(),
                    value: response.secret_string().unwrap_or_default().to_string(),
                    version: response.version_id().unwrap_or_default().to_string(),
                    kind: RecordKind::Secret,
                    created: timestamp,
                    modified: timestamp,
                }))
            }
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    Ok(None)
                } else {
                    Err(StoreError::request(
                        "secrets-manager",
                        "GetSecretValue",
                        service_err.to_string(),
                    )
                    .into())
                }
            }
        }
    }

    async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::with_capacity(names.len());
        for name in names {
            if let Some(record) = self.get(name).await? {
                records.push(record);
            }
        }
        Ok(records)
    }

    async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
        let mut names = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let filter = Filter::builder()
                .key(FilterNameStringType::Name)
                .values(prefix)
                .build();
            let response = self
                .client
                .list_secrets()
                .filters(filter)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| {
                    StoreError::request("secrets-manager", "ListSecrets", e.to_string())
                })?;

            for secret in response.secret_list() {
                if let Some(name) = secret.name() {
                    names.push(name.to_string());
                }
            }

            next_token = response.next_token().map(ToString::to_string);
            if next_token.is_none() {
                break;
            }
        }

        self.get_many(&names).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let result = self
            .client
            .delete_secret()
            .secret_id(name)
            .force_delete_without_recovery(true)
            .send()
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_resource_not_found_exception() {
                    Ok(())
                } else {
                    Err(StoreError::request(
                        "secrets-manager",
                        "DeleteSecret",
                        service_err.to_string(),
                    )
                    .into())
                }
            }
        }
    }

    fn backend_type(&self) -> &'static str {
        "secrets-manager"
    }
}
