//! Strict `{{variable}}` template interpolation.
//!
//! Rendering is plain text substitution: no loops, no conditionals, no
//! function calls. Resolution is strict - any placeholder whose key is not
//! present in the variable map is a hard failure naming the key, never a
//! silent empty substitution.

use std::collections::HashMap;

use crate::error::TemplateError;

/// Renders `template` against `variables`.
///
/// Placeholders use the `{{key}}` form; whitespace inside the braces is
/// ignored (`{{ key }}` is equivalent). The function is deterministic and
/// side-effect free.
///
/// # Errors
///
/// Returns [`TemplateError::MissingVariable`] when a placeholder references
/// a key absent from `variables`, and
/// [`TemplateError::UnterminatedPlaceholder`] when a `{{` is never closed.
pub fn render(
    template: &str,
    variables: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        output.push_str(&rest[..start]);
        let after = &rest[start + 2..];

        let Some(end) = after.find("}}") else {
            return Err(TemplateError::UnterminatedPlaceholder {
                template: template.to_string(),
            });
        };

        let key = after[..end].trim();
        match variables.get(key) {
            Some(value) => output.push_str(value),
            None => {
                return Err(TemplateError::MissingVariable {
                    key: key.to_string(),
                })
            }
        }

        rest = &after[end + 2..];
    }

    output.push_str(rest);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variables(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_render_plain_text_unchanged() {
        let vars = variables(&[]);
        let result = render("no placeholders here", &vars).unwrap();
        assert_eq!(result, "no placeholders here");
    }

    #[test]
    fn test_render_single_variable() {
        let vars = variables(&[("service", "billing")]);
        let result = render("/prod/{{service}}/", &vars).unwrap();
        assert_eq!(result, "/prod/billing/");
    }

    #[test]
    fn test_render_multiple_variables() {
        let vars = variables(&[("stage", "dev"), ("service", "api"), ("account", "1234")]);
        let result = render("{{stage}}-{{service}}-{{account}}", &vars).unwrap();
        assert_eq!(result, "dev-api-1234");
    }

    #[test]
    fn test_render_ignores_placeholder_whitespace() {
        let vars = variables(&[("region", "us-east-1")]);
        let result = render("region={{ region }}", &vars).unwrap();
        assert_eq!(result, "region=us-east-1");
    }

    #[test]
    fn test_render_missing_variable_fails() {
        let vars = variables(&[("stage", "dev")]);
        let err = render("{{stage}}/{{unknown}}", &vars).unwrap_err();
        match err {
            TemplateError::MissingVariable { key } => assert_eq!(key, "unknown"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_render_missing_variable_fails_despite_valid_ones() {
        // Strictness does not depend on how many valid references surround
        // the missing one.
        let vars = variables(&[("a", "1"), ("b", "2"), ("c", "3")]);
        let result = render("{{a}}{{b}}{{missing}}{{c}}", &vars);
        assert!(result.is_err());
    }

    #[test]
    fn test_render_unterminated_placeholder_fails() {
        let vars = variables(&[("stage", "dev")]);
        let err = render("{{stage", &vars).unwrap_err();
        assert!(matches!(err, TemplateError::UnterminatedPlaceholder { .. }));
    }

    #[test]
    fn test_render_is_repeatable() {
        let vars = variables(&[("service", "api")]);
        let first = render("{{service}}", &vars).unwrap();
        let second = render("{{service}}", &vars).unwrap();
        assert_eq!(first, second);
    }
}
