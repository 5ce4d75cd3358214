//! Per-file pipeline model

use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tagflow_core::{Diagnostic, DiagnosticCode, Location};
use tracing::debug;

use crate::element::{Connection, Element, Table, Task};
use crate::tag::{parse_file, parse_tags, TagParseError, TaggedElement};

/// Everything declared in one pipeline file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pipeline {
    /// Source file
    pub path: PathBuf,

    pub tasks: Vec<Task>,
    pub connections: Vec<Connection>,

    /// Dependency units (`<sql>` and `<python>`), in document order
    pub tables: Vec<Table>,
}

impl Pipeline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// Partition tagged records into typed collections
    pub fn from_elements(path: impl Into<PathBuf>, elements: &[TaggedElement]) -> Self {
        let mut pipeline = Self::new(path);

        for element in elements.iter().filter_map(Element::from_tagged) {
            match element {
                Element::Task(task) => pipeline.tasks.push(task),
                Element::Connection(connection) => pipeline.connections.push(connection),
                Element::Unit(table) => pipeline.tables.push(table),
            }
        }

        debug!(
            path = %pipeline.path.display(),
            tags = elements.len(),
            tasks = pipeline.tasks.len(),
            connections = pipeline.connections.len(),
            units = pipeline.tables.len(),
            "classified pipeline elements"
        );

        pipeline
    }

    /// Parse already-resolved text
    pub fn parse(path: impl Into<PathBuf>, text: &str) -> Self {
        Self::from_elements(path, &parse_tags(text))
    }

    /// Read and parse a file without template resolution
    pub fn from_file(path: &Path) -> Result<Self, TagParseError> {
        let elements = parse_file(path)?;
        Ok(Self::from_elements(path, &elements))
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn connection(&self, id: &str) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    pub fn table(&self, id: &str) -> Option<&Table> {
        self.tables.iter().find(|t| t.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty() && self.connections.is_empty() && self.tables.is_empty()
    }

    /// Warnings about ids: empty ids on any element and repeated task ids
    pub fn lint(&self) -> Vec<Diagnostic> {
        let file = self.path.display().to_string();
        let mut diagnostics = Vec::new();

        let ids = self
            .tasks
            .iter()
            .map(|t| ("task", t.id.as_str()))
            .chain(self.connections.iter().map(|c| ("connection", c.id.as_str())))
            .chain(self.tables.iter().map(|t| (t.unit_type.as_str(), t.id.as_str())));

        for (kind, id) in ids {
            if id.trim().is_empty() {
                diagnostics.push(
                    Diagnostic::from_code(
                        DiagnosticCode::ElementMissingId,
                        format!("<{}> element has no id", kind),
                    )
                    .with_location(Location::new(file.clone())),
                );
            }
        }

        let mut seen = HashSet::new();
        for task in &self.tasks {
            if !task.id.is_empty() && !seen.insert(task.id.as_str()) {
                diagnostics.push(
                    Diagnostic::from_code(
                        DiagnosticCode::TaskDuplicateId,
                        format!("Task '{}' is declared more than once", task.id),
                    )
                    .with_location(Location::new(file.clone()))
                    .with_element(task.id.clone()),
                );
            }
        }

        diagnostics
    }
}
