#![forbid(unsafe_code)]

//! Template rendering configuration.
//!
//! # Environment variables
//!
//! - `FORMKIT_CHILDREN_PLACEHOLDER`: edit-mode expansion of `$#children$`
//! - `FORMKIT_BINDING_OPEN`: run-mode marker placed before braced expressions
//! - `FORMKIT_BINDING_CLOSE`: run-mode marker placed after braced expressions

use std::env;
use std::fmt;

pub const ENV_CHILDREN_PLACEHOLDER: &str = "FORMKIT_CHILDREN_PLACEHOLDER";
pub const ENV_BINDING_OPEN: &str = "FORMKIT_BINDING_OPEN";
pub const ENV_BINDING_CLOSE: &str = "FORMKIT_BINDING_CLOSE";

/// Edit-mode markup standing in for a node's children. The editing host
/// replaces it with the edit renders of each child.
pub const DEFAULT_CHILDREN_PLACEHOLDER: &str = "<edit-children></edit-children>";

/// Settings shared by every compiled template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfig {
    pub children_placeholder: String,
    pub binding_open: String,
    pub binding_close: String,
}

impl Default for TemplateConfig {
    fn default() -> Self {
        Self {
            children_placeholder: DEFAULT_CHILDREN_PLACEHOLDER.to_string(),
            binding_open: "{{".to_string(),
            binding_close: "}}".to_string(),
        }
    }
}

/// Configuration parse diagnostics (env + validation).
#[derive(Debug, Clone)]
pub struct TemplateConfigParse {
    pub config: TemplateConfig,
    pub errors: Vec<TemplateConfigError>,
}

/// Configuration error with field context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl TemplateConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TemplateConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={:?} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for TemplateConfigError {}

impl TemplateConfig {
    #[must_use]
    pub fn with_children_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.children_placeholder = placeholder.into();
        self
    }

    #[must_use]
    pub fn with_binding_markers(mut self, open: impl Into<String>, close: impl Into<String>) -> Self {
        self.binding_open = open.into();
        self.binding_close = close.into();
        self
    }

    /// Wrap an expression in the interpolation markers.
    #[must_use]
    pub fn interpolate(&self, expression: &str) -> String {
        format!("{}{}{}", self.binding_open, expression, self.binding_close)
    }

    /// Parse config from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with_diagnostics().config
    }

    /// Parse config from environment variables and return diagnostics.
    #[must_use]
    pub fn from_env_with_diagnostics() -> TemplateConfigParse {
        from_env_with(|key| env::var(key).ok())
    }

    /// Validate config constraints and return all violations.
    pub fn validate(&self) -> Result<(), Vec<TemplateConfigError>> {
        let mut errors = Vec::new();
        validate_non_empty("children_placeholder", &self.children_placeholder, &mut errors);
        validate_non_empty("binding_open", &self.binding_open, &mut errors);
        validate_non_empty("binding_close", &self.binding_close, &mut errors);
        for (field, value) in [
            ("binding_open", &self.binding_open),
            ("binding_close", &self.binding_close),
        ] {
            if value.contains('"') {
                errors.push(TemplateConfigError::new(
                    field,
                    value.as_str(),
                    "marker must not contain '\"'",
                ));
            }
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn validate_non_empty(field: &'static str, value: &str, errors: &mut Vec<TemplateConfigError>) {
    if value.is_empty() {
        errors.push(TemplateConfigError::new(field, value, "must not be empty"));
    }
}

fn from_env_with<F>(mut get: F) -> TemplateConfigParse
where
    F: FnMut(&str) -> Option<String>,
{
    let mut config = TemplateConfig::default();

    if let Some(value) = get(ENV_CHILDREN_PLACEHOLDER) {
        config.children_placeholder = value;
    }
    if let Some(value) = get(ENV_BINDING_OPEN) {
        config.binding_open = value;
    }
    if let Some(value) = get(ENV_BINDING_CLOSE) {
        config.binding_close = value;
    }

    let errors = match config.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => {
            let defaults = TemplateConfig::default();
            for error in &errors {
                match error.field {
                    "children_placeholder" => {
                        config.children_placeholder = defaults.children_placeholder.clone();
                    }
                    "binding_open" => config.binding_open = defaults.binding_open.clone(),
                    "binding_close" => config.binding_close = defaults.binding_close.clone(),
                    _ => {}
                }
            }
            errors
        }
    };

    TemplateConfigParse { config, errors }
}
