//! Interactive terminal prompting for secret values.

use dialoguer::Input;

use crate::deploy::SecretPrompt;
use crate::error::{DeployError, Result};

/// Terminal-backed secret prompt.
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl SecretPrompt for TerminalPrompt {
    fn prompt(&self, key: &str, default: Option<&str>) -> Result<String> {
        let mut input = Input::<String>::new()
            .with_prompt(format!("Enter value for {key}"))
            .validate_with(|value: &String| {
                if value.trim().is_empty() {
                    Err("value must not be empty")
                } else {
                    Ok(())
                }
            });

        if let Some(current) = default {
            input = input.default(current.to_string());
        }

        input.interact_text().map_err(|e| {
            DeployError::PromptFailed {
                name: key.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }
}
