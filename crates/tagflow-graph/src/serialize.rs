//! graph.json reading and writing
//!
//! The document is one JSON object keyed by unit id in graph order, each value
//! `{"type", "inputs", "outputs", "chains_to"}`, pretty-printed with four-space
//! indentation. The same graph always produces the same bytes.

use serde::Serialize;
use serde_json::ser::{PrettyFormatter, Serializer};
use std::path::{Path, PathBuf};
use tagflow_core::{Diagnostic, DiagnosticCode, Location};

use crate::dag::DependencyGraph;

/// Error reading or writing a graph document
#[derive(Debug, thiserror::Error)]
pub enum GraphIoError {
    #[error("IO error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid graph document: {0}")]
    Json(#[from] serde_json::Error),
}

impl GraphIoError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            GraphIoError::Io { path, .. } => Diagnostic::from_code(DiagnosticCode::InternalError, self.to_string())
                .with_location(Location::new(path.display().to_string())),
            GraphIoError::Json(_) => Diagnostic::from_code(DiagnosticCode::InternalError, self.to_string()),
        }
    }
}

/// Canonical graph.json encoding
pub struct GraphSerializer;

impl GraphSerializer {
    const INDENT: &'static [u8] = b"    ";

    /// Serialize to the canonical JSON text
    pub fn to_json(graph: &DependencyGraph) -> Result<String, GraphIoError> {
        let mut buffer = Vec::new();
        let mut serializer = Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(Self::INDENT));
        graph.serialize(&mut serializer)?;

        // serde_json only ever writes valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Read a graph document, keeping its key order
    pub fn from_json(json: &str) -> Result<DependencyGraph, GraphIoError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(graph: &DependencyGraph, path: &Path) -> Result<(), GraphIoError> {
        let json = Self::to_json(graph)?;
        std::fs::write(path, json).map_err(|source| GraphIoError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn load(path: &Path) -> Result<DependencyGraph, GraphIoError> {
        let json = std::fs::read_to_string(path).map_err(|source| GraphIoError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
