//! Caller identity via STS.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sts::Client;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::vars::{CallerIdentity, IdentityLookup};

/// STS-backed identity lookup.
pub struct StsIdentity {
    client: Client,
}

impl StsIdentity {
    /// Creates an identity lookup over the shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl IdentityLookup for StsIdentity {
    async fn caller_identity(&self) -> Result<CallerIdentity> {
        let response = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| ResolveError::IdentityUnavailable {
                message: e.to_string(),
            })?;

        let account = response
            .account()
            .ok_or_else(|| ResolveError::IdentityUnavailable {
                message: "caller identity has no account".to_string(),
            })?
            .to_string();

        debug!("resolved caller identity for account {account}");
        Ok(CallerIdentity { account })
    }
}
