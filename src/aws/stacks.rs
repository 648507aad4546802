//! CloudFormation stack output lookup.

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_cloudformation::Client;
use std::collections::HashMap;
use tracing::debug;

use crate::error::{ResolveError, Result};
use crate::vars::StackOutputLookup;

/// CloudFormation-backed stack output lookup.
pub struct CloudFormationOutputs {
    client: Client,
}

impl CloudFormationOutputs {
    /// Creates a stack output lookup over the shared SDK configuration.
    #[must_use]
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl StackOutputLookup for CloudFormationOutputs {
    async fn outputs(&self, stack_name: &str) -> Result<HashMap<String, String>> {
        let response = self
            .client
            .describe_stacks()
            .stack_name(stack_name)
            .send()
            .await
            .map_err(|e| ResolveError::StackLookup {
                stack: stack_name.to_string(),
                message: e.to_string(),
            })?;

        let stack = response
            .stacks()
            .first()
            .ok_or_else(|| ResolveError::StackLookup {
                stack: stack_name.to_string(),
                message: "stack not found".to_string(),
            })?;

        let mut outputs = HashMap::new();
        for output in stack.outputs() {
            if let (Some(key), Some(value)) = (output.output_key(), output.output_value()) {
                outputs.insert(key.to_string(), value.to_string());
            }
        }

        debug!("stack {stack_name} exposes {} outputs", outputs.len());
        Ok(outputs)
    }
}
