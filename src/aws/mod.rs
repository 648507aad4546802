//! AWS adapters: shared SDK configuration, caller identity, and
//! CloudFormation stack outputs.

pub mod identity;
pub mod stacks;

pub use identity::StsIdentity;
pub use stacks::CloudFormationOutputs;

use aws_config::SdkConfig;

/// Loads the shared SDK configuration, honoring an explicit region override
/// ahead of the environment/profile chain.
pub async fn load_config(region: Option<&str>) -> SdkConfig {
    if let Some(region_str) = region {
        aws_config::from_env()
            .region(aws_config::Region::new(region_str.to_string()))
            .load()
            .await
    } else {
        aws_config::load_from_env().await
    }
}

/// Returns the effective region of an SDK configuration, when one resolved.
#[must_use]
pub fn effective_region(config: &SdkConfig) -> Option<String> {
    config.region().map(ToString::to_string)
}
