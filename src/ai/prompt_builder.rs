//! Prompt construction from the configured templates.

use crate::core::models::{ExtractedDocument, PromptPayload};
use crate::errors::PipelineError;

/// Placeholder the user-prompt template must contain.
pub const TEXT_MARKER: &str = "{{text}}";

/// List of disallowed patterns in custom prompts (prompt injection protection)
pub const DISALLOWED_PATTERNS: [&str; 4] = ["system:", "assistant:", "user:", "{{"];

/// Maximum length allowed for a request's custom style prompt
pub const MAX_CUSTOM_PROMPT_LENGTH: usize = 800;

/// System and user prompt templates, validated once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    system_prompt: String,
    user_template: String,
}

impl PromptTemplate {
    /// # Errors
    ///
    /// Returns `Configuration` if `user_template` lacks [`TEXT_MARKER`];
    /// such a template would silently drop the page text.
    pub fn new(
        system_prompt: impl Into<String>,
        user_template: impl Into<String>,
    ) -> Result<Self, PipelineError> {
        let user_template = user_template.into();
        if !user_template.contains(TEXT_MARKER) {
            return Err(PipelineError::Configuration(format!(
                "user_prompt_template must contain the {TEXT_MARKER} placeholder"
            )));
        }
        Ok(Self {
            system_prompt: system_prompt.into(),
            user_template,
        })
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn user_template(&self) -> &str {
        &self.user_template
    }
}

/// Builds the provider payload. The marker is substituted in the template
/// only, so text that itself contains `{{text}}` is inserted verbatim.
///
/// # Errors
///
/// Returns `InvalidInput` if `custom_prompt` fails [`sanitize_custom_prompt`].
pub fn build(
    document: &ExtractedDocument,
    template: &PromptTemplate,
    custom_prompt: Option<&str>,
) -> Result<PromptPayload, PipelineError> {
    let user_prompt = template.user_template.replace(TEXT_MARKER, &document.raw_text);

    let system_prompt = match custom_prompt.filter(|s| !s.trim().is_empty()) {
        Some(custom) => {
            let custom = sanitize_custom_prompt(custom).map_err(PipelineError::InvalidInput)?;
            if template.system_prompt.is_empty() {
                format!("CUSTOM STYLE (override lower-priority rules): {custom}")
            } else {
                format!(
                    "{}\n\nCUSTOM STYLE (override lower-priority rules): {custom}",
                    template.system_prompt
                )
            }
        }
        None => template.system_prompt.clone(),
    };

    Ok(PromptPayload {
        system_prompt,
        user_prompt,
    })
}

/// Sanitizes a custom prompt to prevent prompt injection attacks
/// Returns a Result with either the sanitized prompt or an error message
pub fn sanitize_custom_prompt(prompt: &str) -> Result<String, String> {
    if prompt.chars().count() > MAX_CUSTOM_PROMPT_LENGTH {
        return Err(format!(
            "Custom prompt exceeds maximum length of {MAX_CUSTOM_PROMPT_LENGTH} characters"
        ));
    }

    let lowered = prompt.to_lowercase();
    for pattern in &DISALLOWED_PATTERNS {
        if lowered.contains(pattern) {
            return Err(format!(
                "Custom prompt contains disallowed pattern: {pattern}"
            ));
        }
    }

    Ok(prompt.chars().filter(|c| !c.is_control()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(text: &str) -> ExtractedDocument {
        ExtractedDocument {
            raw_text: text.to_string(),
            source_url: "https://example.com/article".to_string(),
        }
    }

    #[test]
    fn marker_inserted_text_is_not_rescanned() {
        let template = PromptTemplate::new("sys", "A: {{text}} B").unwrap();
        let payload = build(&doc("x {{text}} y"), &template, None).unwrap();
        assert_eq!(payload.user_prompt, "A: x {{text}} y B");
    }

    #[test]
    fn every_marker_occurrence_is_replaced() {
        let template = PromptTemplate::new("", "{{text}} / {{text}}").unwrap();
        let payload = build(&doc("t"), &template, None).unwrap();
        assert_eq!(payload.user_prompt, "t / t");
    }

    #[test]
    fn custom_style_appended_to_system_prompt() {
        let template = PromptTemplate::new("Be brief.", "{{text}}").unwrap();
        let payload = build(&doc("t"), &template, Some("Speak like a pirate")).unwrap();
        assert!(payload.system_prompt.starts_with("Be brief."));
        assert!(payload.system_prompt.ends_with("Speak like a pirate"));
    }
}
