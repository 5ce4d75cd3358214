//! Configuration schema (tagflow.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use crate::diagnostic::{Diagnostic, DiagnosticCode, Severity};

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }

    /// Apply the override (if any) to a diagnostic
    pub fn apply(&self, mut diagnostic: Diagnostic) -> Diagnostic {
        diagnostic.severity = self.get_severity(diagnostic.code, diagnostic.severity);
        diagnostic
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the pipeline files
    #[serde(default = "default_pipelines_dir")]
    pub pipelines_dir: PathBuf,

    /// File extension of pipeline files (without the dot)
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Also scan subdirectories of `pipelines_dir`
    #[serde(default)]
    pub recursive: bool,

    /// JSON document with template variables
    #[serde(default = "default_variables")]
    pub variables: PathBuf,

    /// Where the dependency graph is written
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Fail template rendering on undefined variables instead of rendering them empty
    #[serde(default)]
    pub strict_undefined: bool,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,

    /// Project root path (for resolving relative paths)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_pipelines_dir() -> PathBuf {
    PathBuf::from("pipelines")
}

fn default_extension() -> String {
    "xml".to_string()
}

fn default_variables() -> PathBuf {
    PathBuf::from("variables.json")
}

fn default_output() -> PathBuf {
    PathBuf::from("graph.json")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pipelines_dir: default_pipelines_dir(),
            extension: default_extension(),
            recursive: false,
            variables: default_variables(),
            output: default_output(),
            strict_undefined: false,
            severity: SeverityThreshold::default(),
            project_root: std::env::current_dir().unwrap_or_default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.project_root = std::env::current_dir().unwrap_or_default();
        Ok(config)
    }

    /// Save config to TOML file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let toml = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(path, toml)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Resolve a configured path against the project root
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || self.project_root.as_os_str().is_empty() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
