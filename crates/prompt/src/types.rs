//! Prompt definition and rendered prompt types.

use serde::{Deserialize, Serialize};

/// A prompt definition loaded from YAML.
///
/// Both `system` and `template` are Handlebars templates rendered against
/// the same variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptDefinition {
    /// Unique prompt identifier
    pub id: String,

    /// Human-readable title
    pub title: String,

    /// API version for schema evolution
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Creator identifier
    #[serde(rename = "createdBy", default)]
    pub created_by: String,

    /// System instruction template (optional)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// User message template
    pub template: String,
}

/// A fully built prompt ready for LLM execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltPrompt {
    /// System message (optional)
    pub system: Option<String>,

    /// User message (required)
    pub user: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_definition_deserialization() {
        let yaml = r#"
id: docqa.answer
title: Answer from docs
apiVersion: "1.0"
system: "Context:\n{{context}}"
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(def.id, "docqa.answer");
        assert_eq!(def.system.as_deref(), Some("Context:\n{{context}}"));
        assert_eq!(def.template, "{{question}}");
        assert!(def.created_by.is_empty());
    }

    #[test]
    fn test_system_is_optional() {
        let yaml = r#"
id: plain
title: Plain
apiVersion: "1.0"
template: "{{question}}"
"#;

        let def: PromptDefinition = serde_yaml::from_str(yaml).unwrap();
        assert!(def.system.is_none());
    }
}
