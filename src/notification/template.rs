//! Rendering of the per-handler `message` override with minijinja.

use std::collections::HashSet;

use minijinja::{Environment, UndefinedBehavior};
use thiserror::Error;

use super::description::{truncate_chars, uncolorize};

/// Top-level names available to a message template.
pub const MESSAGE_CONTEXT_KEYS: &[&str] = &[
    "client",
    "check",
    "occurrences",
    "action",
    "summary",
    "severity",
    "incident_key",
    "dashboard_link",
    "details",
];

/// Errors raised by [`TemplateService`].
#[derive(Debug, Error)]
pub enum TemplateServiceError {
    /// The template failed to parse or to render.
    #[error("Failed to render template")]
    RenderError(#[from] minijinja::Error),

    /// The template reads a name the message context does not offer.
    #[error("Template refers to unknown variable '{0}'")]
    UnknownVariable(String),
}

/// Strict minijinja environment with the event formatting filters
/// (`uncolorize`, `truncate_chars`) registered.
pub struct TemplateService {
    env: Environment<'static>,
}

impl Default for TemplateService {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateService {
    /// Builds the environment with strict undefined handling.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.add_filter("uncolorize", |value: String| uncolorize(&value).into_owned());
        env.add_filter("truncate_chars", |value: String, max: usize| truncate_chars(&value, max));
        Self { env }
    }

    /// Renders `template` against `context`.
    pub fn render(
        &self,
        template: &str,
        context: serde_json::Value,
    ) -> Result<String, TemplateServiceError> {
        self.env.render_str(template, context).map_err(|e| {
            tracing::warn!(template, error = %e, "Failed to render message template.");
            TemplateServiceError::RenderError(e)
        })
    }

    /// Returns every variable the template reads, as dotted paths.
    pub fn extract_variables(&self, template: &str) -> Result<HashSet<String>, TemplateServiceError> {
        Ok(self.env.template_from_str(template)?.undeclared_variables(true))
    }

    /// Fails if the template does not parse or reads a name outside
    /// [`MESSAGE_CONTEXT_KEYS`].
    pub fn check(&self, template: &str) -> Result<(), TemplateServiceError> {
        for variable in self.extract_variables(template)? {
            let root = variable.split('.').next().unwrap_or_default();
            if !MESSAGE_CONTEXT_KEYS.contains(&root) {
                return Err(TemplateServiceError::UnknownVariable(variable));
            }
        }
        Ok(())
    }
}
