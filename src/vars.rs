//! Dynamic variable resolution for template interpolation.
//!
//! The resolver produces the flat variable map consumed by the interpolator:
//! `stage` and `service` always, plus `region`, `account`, and CloudFormation
//! stack outputs when the provider needs cloud context. Lookups are injected
//! as traits so the resolver never owns network clients.

use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::error::Result;
use crate::spec::template;

/// Flat variable mapping used for interpolation.
pub type VariableMap = HashMap<String, String>;

/// Caller identity as reported by the cloud provider.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    /// Account identifier of the current credentials.
    pub account: String,
}

/// Looks up who/what is calling.
#[async_trait]
pub trait IdentityLookup: Send + Sync {
    /// Returns the identity of the current credentials.
    ///
    /// Failure here is fatal for the whole run.
    async fn caller_identity(&self) -> Result<CallerIdentity>;
}

/// Looks up infrastructure stack outputs.
#[async_trait]
pub trait StackOutputLookup: Send + Sync {
    /// Returns the output key/value pairs of the named stack.
    ///
    /// Failures are non-fatal to callers; an unavailable stack simply
    /// contributes nothing to the variable map.
    async fn outputs(&self, stack_name: &str) -> Result<HashMap<String, String>>;
}

/// Inputs describing the service under deployment.
#[derive(Debug, Clone)]
pub struct ServiceContext {
    /// Service name.
    pub service: String,
    /// Active stage.
    pub stage: String,
    /// Effective region.
    pub region: String,
    /// Whether the configured provider needs cloud context.
    pub requires_cloud: bool,
}

/// Variables plus the resolved stack names they came from.
#[derive(Debug, Clone)]
pub struct ResolvedVariables {
    /// The variable map.
    pub variables: VariableMap,
    /// Stack names after interpolation, in declaration order.
    pub stacks: Vec<String>,
}

impl ResolvedVariables {
    /// Returns the base mapping for providers without cloud context.
    #[must_use]
    pub fn base(ctx: &ServiceContext) -> Self {
        let mut variables = VariableMap::new();
        variables.insert("stage".to_string(), ctx.stage.clone());
        variables.insert("service".to_string(), ctx.service.clone());
        Self {
            variables,
            stacks: Vec::new(),
        }
    }
}

/// Resolves the variable map from injected identity and stack lookups.
pub struct VariableResolver<'a> {
    /// Identity lookup collaborator.
    identity: &'a dyn IdentityLookup,
    /// Stack output lookup collaborator.
    stacks: &'a dyn StackOutputLookup,
}

impl<'a> VariableResolver<'a> {
    /// Creates a new resolver over the given lookups.
    #[must_use]
    pub const fn new(identity: &'a dyn IdentityLookup, stacks: &'a dyn StackOutputLookup) -> Self {
        Self { identity, stacks }
    }

    /// Resolves the variable map for `ctx`.
    ///
    /// Providers without cloud context get the base `{stage, service}` map
    /// with no network calls. Otherwise the map is seeded from the caller
    /// identity, each stack reference is interpolated against the map so
    /// far, and stack outputs are merged in declaration order with later
    /// stacks overwriting earlier keys.
    ///
    /// # Errors
    ///
    /// Returns an error when the identity lookup fails or a stack reference
    /// template names an undefined variable. Stack output lookup failures
    /// are logged and skipped.
    pub async fn resolve(
        &self,
        ctx: &ServiceContext,
        stack_refs: &[String],
    ) -> Result<ResolvedVariables> {
        let mut resolved = ResolvedVariables::base(ctx);

        if !ctx.requires_cloud {
            debug!("provider needs no cloud context; using base variables");
            return Ok(resolved);
        }

        let identity = self.identity.caller_identity().await?;
        resolved
            .variables
            .insert("region".to_string(), ctx.region.clone());
        resolved
            .variables
            .insert("account".to_string(), identity.account);

        // Stack names may reference stage/service/region/account.
        for reference in stack_refs {
            let name = template::render(reference, &resolved.variables)?;
            resolved.stacks.push(name);
        }

        for name in &resolved.stacks {
            match self.stacks.outputs(name).await {
                Ok(outputs) => {
                    debug!("merged {} outputs from stack {name}", outputs.len());
                    for (key, value) in outputs {
                        resolved.variables.insert(key, value);
                    }
                }
                Err(err) => warn!("skipping outputs of stack {name}: {err}"),
            }
        }

        Ok(resolved)
    }
}
