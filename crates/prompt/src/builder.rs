//! Prompt builder: renders a definition's templates with Handlebars.

use crate::types::{BuiltPrompt, PromptDefinition};
use docqa_core::{AppError, AppResult};
use handlebars::Handlebars;
use std::collections::HashMap;

/// Build a prompt from a definition and input variables.
///
/// Renders the optional system template and the user template against the
/// same variables. Values are inserted verbatim, without HTML escaping.
///
/// # Example
/// ```no_run
/// use docqa_prompt::{build_prompt, default_answer_prompt};
/// use std::collections::HashMap;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut vars = HashMap::new();
/// vars.insert("question".to_string(), "Who owns the VPN?".to_string());
/// vars.insert("context".to_string(), "[Source: it.md]\n...".to_string());
///
/// let built = build_prompt(&default_answer_prompt(), &vars)?;
/// println!("User prompt: {}", built.user);
/// # Ok(())
/// # }
/// ```
pub fn build_prompt(
    definition: &PromptDefinition,
    variables: &HashMap<String, String>,
) -> AppResult<BuiltPrompt> {
    tracing::debug!("Building prompt: {}", definition.id);

    let system = match definition.system {
        Some(ref template) => Some(render_template(template, variables)?),
        None => None,
    };
    let user = render_template(&definition.template, variables)?;

    Ok(BuiltPrompt { system, user })
}

/// Render a Handlebars template with variables.
fn render_template(template: &str, variables: &HashMap<String, String>) -> AppResult<String> {
    let mut handlebars = Handlebars::new();

    // Plain text prompts, no HTML escaping
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .register_template_string("prompt", template)
        .map_err(|e| AppError::Prompt(format!("Failed to register template: {}", e)))?;

    handlebars
        .render("prompt", variables)
        .map_err(|e| AppError::Prompt(format!("Failed to render template: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::{default_answer_prompt, NO_ANSWER_SENTINEL};

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_render_simple_template() {
        let rendered =
            render_template("Question: {{question}}", &vars(&[("question", "Hi?")])).unwrap();
        assert_eq!(rendered, "Question: Hi?");
    }

    #[test]
    fn test_render_does_not_escape() {
        let rendered = render_template("{{context}}", &vars(&[("context", "a < b & \"c\"")]))
            .unwrap();
        assert_eq!(rendered, "a < b & \"c\"");
    }

    #[test]
    fn test_render_template_missing_variable() {
        // Handlebars renders missing variables as empty string
        let rendered = render_template("Question: {{missing}}", &HashMap::new()).unwrap();
        assert_eq!(rendered, "Question: ");
    }

    #[test]
    fn test_render_template_syntax_error() {
        let result = render_template("{{#if}}", &HashMap::new());
        assert!(matches!(result, Err(AppError::Prompt(_))));
    }

    #[test]
    fn test_build_default_answer_prompt() {
        let variables = vars(&[
            ("question", "How many PTO days?"),
            ("context", "[Source: pto.md]\nYou get 25 days."),
            ("sentinel", NO_ANSWER_SENTINEL),
        ]);

        let built = build_prompt(&default_answer_prompt(), &variables).unwrap();
        let system = built.system.unwrap();

        assert!(system.contains("using ONLY the provided context"));
        assert!(system.contains(&format!("respond with: \"{}\"", NO_ANSWER_SENTINEL)));
        assert!(system.ends_with("Context:\n[Source: pto.md]\nYou get 25 days."));
        assert_eq!(built.user, "How many PTO days?");
    }
}
