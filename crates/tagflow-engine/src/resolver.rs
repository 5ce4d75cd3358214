//! Template resolution seam
//!
//! The build never expands placeholders itself; it hands the raw text of each
//! file to a [`TemplateResolver`] and parses whatever comes back.

use std::path::Path;
use tagflow_core::Diagnostic;
use tagflow_jinja::TemplatePreprocessor;

/// Expands variable placeholders in raw pipeline text
pub trait TemplateResolver {
    /// Resolve the text of the file at `path`
    ///
    /// An error drops the whole file from the build.
    fn resolve(&self, text: &str, path: &Path) -> Result<String, Diagnostic>;
}

/// Leaves text untouched
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughResolver;

impl TemplateResolver for PassthroughResolver {
    fn resolve(&self, text: &str, _path: &Path) -> Result<String, Diagnostic> {
        Ok(text.to_string())
    }
}

impl TemplateResolver for TemplatePreprocessor {
    fn resolve(&self, text: &str, path: &Path) -> Result<String, Diagnostic> {
        self.preprocess(text, Some(path))
            .map(|result| result.rendered)
            .map_err(|e| e.to_diagnostic())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tagflow_core::DiagnosticCode;
    use tagflow_jinja::TemplateContext;

    #[test]
    fn passthrough_keeps_placeholders() {
        let text = r#"<sql id="{{ name }}">x</sql>"#;
        assert_eq!(PassthroughResolver.resolve(text, Path::new("p.xml")).unwrap(), text);
    }

    #[test]
    fn jinja_failures_become_diagnostics() {
        let resolver = TemplatePreprocessor::new(TemplateContext::new()).strict(true);
        let diag = resolver.resolve("{{ nope }}", Path::new("pipelines/p.xml")).unwrap_err();

        assert_eq!(diag.code, DiagnosticCode::TemplateUndefinedVariable);
        assert_eq!(diag.file(), Some("pipelines/p.xml"));
    }
}
