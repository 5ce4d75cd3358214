//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // File-level failures (1xxx)
    /// A pipeline file could not be read
    FileReadError,

    /// Template resolution failed for a pipeline file
    TemplateRenderError,

    /// Template referenced a variable that is not defined (strict mode only)
    TemplateUndefinedVariable,

    // Element issues (2xxx)
    /// A classified element has an empty or missing `id` attribute
    ElementMissingId,

    /// Two tasks in the same pipeline file share an id
    TaskDuplicateId,

    // Graph issues (3xxx)
    /// A dependency unit id was declared more than once; the later one wins
    UnitDuplicateId,

    /// The dependency graph contains a cycle
    GraphCycle,

    // General (9xxx)
    /// General informational message
    Info,

    /// Unexpected internal failure
    InternalError,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FileReadError => "FILE_READ_ERROR",
            Self::TemplateRenderError => "TEMPLATE_RENDER_ERROR",
            Self::TemplateUndefinedVariable => "TEMPLATE_UNDEFINED_VARIABLE",
            Self::ElementMissingId => "ELEMENT_MISSING_ID",
            Self::TaskDuplicateId => "TASK_DUPLICATE_ID",
            Self::UnitDuplicateId => "UNIT_DUPLICATE_ID",
            Self::GraphCycle => "GRAPH_CYCLE",
            Self::Info => "INFO",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Severity used when the configuration does not override it
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::FileReadError
            | Self::TemplateRenderError
            | Self::TemplateUndefinedVariable
            | Self::InternalError => Severity::Error,
            Self::ElementMissingId
            | Self::TaskDuplicateId
            | Self::UnitDuplicateId
            | Self::GraphCycle => Severity::Warn,
            Self::Info => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - the affected file did not contribute to the graph
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Path of the pipeline file
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
        }
        Ok(())
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Element or unit id the diagnostic is about
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,

    /// Other files involved (e.g. the earlier declaration of a duplicate id)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            element: None,
            related: Vec::new(),
        }
    }

    /// Create a diagnostic using the code's default severity
    pub fn from_code(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set the element id
    pub fn with_element(mut self, element: impl Into<String>) -> Self {
        self.element = Some(element.into());
        self
    }

    /// Set related files
    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }

    /// File path of the location, if any
    pub fn file(&self) -> Option<&str> {
        self.location.as_ref().map(|l| l.file.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::FileReadError.as_str(), "FILE_READ_ERROR");
        assert_eq!(DiagnosticCode::UnitDuplicateId.as_str(), "UNIT_DUPLICATE_ID");
        assert_eq!(DiagnosticCode::ElementMissingId.as_str(), "ELEMENT_MISSING_ID");
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&DiagnosticCode::TemplateUndefinedVariable).unwrap();
        assert_eq!(json, "\"TEMPLATE_UNDEFINED_VARIABLE\"");
    }

    #[test]
    fn collisions_are_not_errors_by_default() {
        assert_eq!(DiagnosticCode::UnitDuplicateId.default_severity(), Severity::Warn);
        assert_eq!(DiagnosticCode::ElementMissingId.default_severity(), Severity::Warn);
        assert_eq!(DiagnosticCode::FileReadError.default_severity(), Severity::Error);
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::from_code(
            DiagnosticCode::FileReadError,
            "Failed to read pipelines/broken.xml",
        )
        .with_location(Location::new("pipelines/broken.xml"));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("FILE_READ_ERROR"));
        assert!(json.contains("error"));
        assert!(!json.contains("related"));
        assert_eq!(diag.file(), Some("pipelines/broken.xml"));
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::new("a.xml").to_string(), "a.xml");
        assert_eq!(Location::with_line("a.xml", 3).to_string(), "a.xml:3");
    }
}
