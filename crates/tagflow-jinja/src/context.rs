//! Template variables
//!
//! Variables come from a JSON object (variables.json); each top-level key is
//! available by name in pipeline templates.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use minijinja::Value as MinijinjaValue;

/// Variables available while rendering pipeline files
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateContext {
    pub vars: HashMap<String, serde_json::Value>,
}

/// Error loading template variables
#[derive(Debug, thiserror::Error)]
pub enum ContextError {
    #[error("Failed to read variables file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid variables document: {0}")]
    Parse(String),

    #[error("Variables document must be a JSON object")]
    NotAnObject,
}

impl TemplateContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON object of variables
    pub fn from_json(json: &str) -> Result<Self, ContextError> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ContextError::Parse(e.to_string()))?;

        match value {
            serde_json::Value::Object(map) => Ok(Self {
                vars: map.into_iter().collect(),
            }),
            _ => Err(ContextError::NotAnObject),
        }
    }

    /// Load variables from a JSON file
    pub fn from_file(path: &Path) -> Result<Self, ContextError> {
        let json = std::fs::read_to_string(path).map_err(|source| ContextError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// Add a variable
    pub fn add_var(&mut self, key: impl Into<String>, value: serde_json::Value) -> &mut Self {
        self.vars.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&serde_json::Value> {
        self.vars.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Convert to MiniJinja value for rendering
    pub fn to_minijinja_value(&self) -> MinijinjaValue {
        MinijinjaValue::from_serialize(&self.vars)
    }
}

/// Builder for TemplateContext
#[derive(Default)]
pub struct TemplateContextBuilder {
    context: TemplateContext,
}

impl TemplateContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn var(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.context.add_var(key, value);
        self
    }

    pub fn build(self) -> TemplateContext {
        self.context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn loads_top_level_object() {
        let context = TemplateContext::from_json(r#"{"env": "prod", "retries": 3}"#).unwrap();

        assert_eq!(context.get("env"), Some(&json!("prod")));
        assert_eq!(context.get("retries"), Some(&json!(3)));
    }

    #[test]
    fn rejects_non_objects() {
        assert!(matches!(TemplateContext::from_json("[1, 2]"), Err(ContextError::NotAnObject)));
        assert!(matches!(TemplateContext::from_json("{oops"), Err(ContextError::Parse(_))));
    }

    #[test]
    fn builder_adds_vars() {
        let context = TemplateContextBuilder::new()
            .var("schema", json!("analytics"))
            .build();

        assert!(!context.is_empty());
        assert_eq!(context.get("schema"), Some(&json!("analytics")));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = TemplateContext::from_file(Path::new("/no/such/variables.json")).unwrap_err();
        assert!(matches!(err, ContextError::Io { .. }));
    }
}
