//! SSM Parameter Store backend.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ssm::types::{Parameter, ParameterType};
use aws_sdk_ssm::Client;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::{Result, StoreError};
use crate::spec::Entry;

use super::{RecordKind, Store, StoredRecord};

/// GetParameters accepts at most this many names per request.
const GET_BATCH_SIZE: usize = 10;

/// Parameter Store backend.
pub struct SsmStore {
    client: Client,
}

impl SsmStore {
    /// Creates a store over the shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl Store for SsmStore {
    async fn put(&self, entry: &Entry) -> Result<()> {
        let kind = if entry.secret {
            ParameterType::SecureString
        } else {
            ParameterType::String
        };

        self.client
            .put_parameter()
            .name(&entry.name)
            .value(&entry.value)
            .r#type(kind)
            .set_description(entry.description.clone())
            .overwrite(true)
            .send()
            .await
            .map_err(|e| StoreError::write_failed(&entry.name, e.to_string()))?;

        debug!("wrote parameter {}", entry.name);
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Option<StoredRecord>> {
        let records = self.get_many(&[name.to_string()]).await?;
        Ok(records.into_iter().next())
    }

    async fn get_many(&self, names: &[String]) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::with_capacity(names.len());
        for chunk in names.chunks(GET_BATCH_SIZE) {
            let response = self
                .client
                .get_parameters()
                .set_names(Some(chunk.to_vec()))
                .with_decryption(true)
                .send()
                .await
                .map_err(|e| StoreError::request("ssm", "GetParameters", e.to_string()))?;

            for parameter in response.parameters() {
                records.push(parameter_to_record(parameter));
            }
        }
        Ok(records)
    }

    async fn get_by_path(&self, prefix: &str) -> Result<Vec<StoredRecord>> {
        let mut records = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let response = self
                .client
                .get_parameters_by_path()
                .path(prefix)
                .recursive(true)
                .with_decryption(true)
                .set_next_token(next_token)
                .send()
                .await
                .map_err(|e| StoreError::request("ssm", "GetParametersByPath", e.to_string()))?;

            for parameter in response.parameters() {
                records.push(parameter_to_record(parameter));
            }

            next_token = response.next_token().map(ToString::to_string);
            if next_token.is_none() {
                break;
            }
        }

        Ok(records)
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let result = self.client.delete_parameter().name(name).send().await;

        match result {
            Ok(_) => Ok(()),
            Err(sdk_err) => {
                let service_err = sdk_err.into_service_error();
                if service_err.is_parameter_not_found() {
                    Ok(())
                } else {
                    Err(StoreError::request(
                        "ssm",
                        "DeleteParameter",
                        service_err.to_string(),
                    )
                    .into())
                }
            }
        }
    }

    fn backend_type(&self) -> &'static str {
        "ssm"
    }
}

fn parameter_to_record(parameter: &Parameter) -> StoredRecord {
    let kind = match parameter.r#type() {
        Some(ParameterType::SecureString) => RecordKind::Secret,
        _ => RecordKind::Plain,
    };
    let modified = parameter.last_modified_date().map_or_else(
        Utc::now,
        |d| DateTime::<Utc>::from_timestamp(d.secs(), d.subsec_nanos()).unwrap_or_default(),
    );

    StoredRecord {
        name: parameter.name().unwrap_or_default().to_string(),
        value: parameter.value().unwrap_or_default().to_string(),
        version: parameter.version().to_string(),
        kind,
        // The parameter API does not expose the creation time.
        created: modified,
        modified,
    }
}
