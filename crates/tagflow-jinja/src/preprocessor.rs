//! Jinja template preprocessing
//!
//! Expands placeholders in raw pipeline text so the tag scanner only ever
//! sees resolved text.

use minijinja::{Environment, Error as JinjaError, ErrorKind, UndefinedBehavior};
use std::path::{Path, PathBuf};
use tagflow_core::{Diagnostic, DiagnosticCode, Location};
use tracing::debug;

use crate::context::TemplateContext;

/// Result of template preprocessing
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    /// Raw pipeline text
    pub original: String,

    /// Text with all placeholders expanded
    pub rendered: String,

    /// File path (if any)
    pub file_path: Option<PathBuf>,

    /// Whether any template syntax was detected and processed
    pub had_jinja: bool,
}

/// Error during template preprocessing
#[derive(Debug, thiserror::Error)]
pub enum PreprocessError {
    #[error("Template render error: {message}")]
    RenderError {
        message: String,
        file_path: Option<PathBuf>,
        line: Option<usize>,
    },

    #[error("Undefined variable: {message}")]
    UndefinedVariable {
        message: String,
        file_path: Option<PathBuf>,
        line: Option<usize>,
    },
}

impl PreprocessError {
    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let (code, file_path, line) = match self {
            PreprocessError::RenderError { file_path, line, .. } => {
                (DiagnosticCode::TemplateRenderError, file_path, line)
            }
            PreprocessError::UndefinedVariable { file_path, line, .. } => {
                (DiagnosticCode::TemplateUndefinedVariable, file_path, line)
            }
        };

        let mut diag = Diagnostic::from_code(code, self.to_string());
        if let Some(path) = file_path {
            let file = path.display().to_string();
            let location = match line {
                Some(l) => Location::with_line(file, *l),
                None => Location::new(file),
            };
            diag = diag.with_location(location);
        }
        diag
    }
}

/// Template preprocessor for pipeline files
pub struct TemplatePreprocessor {
    env: Environment<'static>,
    context: TemplateContext,
}

impl TemplatePreprocessor {
    /// Create a new preprocessor; undefined variables render as empty text
    pub fn new(context: TemplateContext) -> Self {
        let mut env = Environment::new();

        env.add_filter("as_bool", |value: String| -> bool {
            matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
        });

        Self { env, context }
    }

    /// Create a preprocessor with no variables
    pub fn with_defaults() -> Self {
        Self::new(TemplateContext::default())
    }

    /// Fail on undefined variables instead of rendering them empty
    pub fn strict(mut self, strict: bool) -> Self {
        let behavior = if strict {
            UndefinedBehavior::Strict
        } else {
            UndefinedBehavior::Lenient
        };
        self.env.set_undefined_behavior(behavior);
        self
    }

    pub fn context(&self) -> &TemplateContext {
        &self.context
    }

    /// Check if text contains template syntax
    pub fn has_jinja(text: &str) -> bool {
        text.contains("{{") || text.contains("{%") || text.contains("{#")
    }

    /// Expand placeholders in pipeline text
    pub fn preprocess(&self, text: &str, file_path: Option<&Path>) -> Result<PreprocessResult, PreprocessError> {
        let had_jinja = Self::has_jinja(text);

        // If no template syntax detected, return as-is
        if !had_jinja {
            return Ok(PreprocessResult {
                original: text.to_string(),
                rendered: text.to_string(),
                file_path: file_path.map(Path::to_path_buf),
                had_jinja: false,
            });
        }

        let rendered = self.env
            .render_str(text, self.context.to_minijinja_value())
            .map_err(|e| Self::to_preprocess_error(e, file_path))?;

        debug!(
            file = ?file_path,
            bytes_in = text.len(),
            bytes_out = rendered.len(),
            "rendered pipeline template"
        );

        Ok(PreprocessResult {
            original: text.to_string(),
            rendered,
            file_path: file_path.map(Path::to_path_buf),
            had_jinja: true,
        })
    }

    /// Convert MiniJinja error to PreprocessError
    fn to_preprocess_error(error: JinjaError, file_path: Option<&Path>) -> PreprocessError {
        let message = error.to_string();
        let line = error.line();
        let file_path = file_path.map(Path::to_path_buf);

        if error.kind() == ErrorKind::UndefinedError {
            PreprocessError::UndefinedVariable { message, file_path, line }
        } else {
            PreprocessError::RenderError { message, file_path, line }
        }
    }
}

impl Default for TemplatePreprocessor {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::TemplateContextBuilder;
    use serde_json::json;

    fn preprocessor() -> TemplatePreprocessor {
        TemplatePreprocessor::new(
            TemplateContextBuilder::new()
                .var("schema", json!("analytics"))
                .var("full_refresh", json!("yes"))
                .build(),
        )
    }

    #[test]
    fn test_has_jinja() {
        assert!(TemplatePreprocessor::has_jinja(r#"<sql id="{{ name }}">x</sql>"#));
        assert!(TemplatePreprocessor::has_jinja("{% if x %}y{% endif %}"));
        assert!(TemplatePreprocessor::has_jinja("{# comment #}"));
        assert!(!TemplatePreprocessor::has_jinja(r#"<sql id="a">select 1</sql>"#));
    }

    #[test]
    fn test_no_jinja_passthrough() {
        let text = "<sql id=\"a\">select 1</sql>\n";
        let result = preprocessor().preprocess(text, None).unwrap();

        assert_eq!(result.original, text);
        assert_eq!(result.rendered, text);
        assert!(!result.had_jinja);
    }

    #[test]
    fn test_variable_substitution() {
        let text = r#"<sql id="orders" schema="{{ schema }}">select 1</sql>"#;
        let result = preprocessor().preprocess(text, None).unwrap();

        assert!(result.had_jinja);
        assert_eq!(result.rendered, r#"<sql id="orders" schema="analytics">select 1</sql>"#);
    }

    #[test]
    fn test_as_bool_filter() {
        let result = preprocessor()
            .preprocess("{{ full_refresh | as_bool }}", None)
            .unwrap();
        assert_eq!(result.rendered, "true");
    }

    #[test]
    fn test_undefined_is_empty_by_default() {
        let result = preprocessor().preprocess("[{{ missing }}]", None).unwrap();
        assert_eq!(result.rendered, "[]");
    }

    #[test]
    fn test_strict_undefined() {
        let err = preprocessor()
            .strict(true)
            .preprocess("[{{ missing }}]", Some(Path::new("pipelines/p.xml")))
            .unwrap_err();

        assert!(matches!(err, PreprocessError::UndefinedVariable { .. }));
        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DiagnosticCode::TemplateUndefinedVariable);
        assert_eq!(diag.file(), Some("pipelines/p.xml"));
    }

    #[test]
    fn test_syntax_error() {
        let err = preprocessor()
            .preprocess("{% if %}", Some(Path::new("bad.xml")))
            .unwrap_err();

        assert!(matches!(err, PreprocessError::RenderError { .. }));
        assert_eq!(err.to_diagnostic().code, DiagnosticCode::TemplateRenderError);
    }
}
