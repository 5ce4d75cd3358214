//! Two-pass graph construction
//!
//! Pass 1 (`add_table`/`add_pipeline`) creates one node per unit. Pass 2
//! (`finish`) derives `outputs` once every node is known, so inputs may refer
//! to units declared later or in other files.

use indexmap::IndexMap;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tagflow_core::{Diagnostic, DiagnosticCode, Location};
use tagflow_markup::{Pipeline, Table};
use tracing::{debug, warn};

use crate::chain::chain_for;
use crate::dag::DependencyGraph;
use crate::node::{GraphNode, NodeId};

/// A unit id declared more than once
///
/// The later declaration replaces the earlier node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub id: NodeId,

    /// File of the replaced declaration
    pub previous: Option<PathBuf>,

    /// File of the declaration that won
    pub replacement: Option<PathBuf>,
}

impl Collision {
    pub fn to_diagnostic(&self) -> Diagnostic {
        let describe = |path: &Option<PathBuf>| {
            path.as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "<unknown>".to_string())
        };

        let mut diagnostic = Diagnostic::from_code(
            DiagnosticCode::UnitDuplicateId,
            format!(
                "Unit '{}' is declared again; the declaration in {} replaces the one in {}",
                self.id,
                describe(&self.replacement),
                describe(&self.previous),
            ),
        )
        .with_element(self.id.clone());

        if let Some(path) = &self.replacement {
            diagnostic = diagnostic.with_location(Location::new(path.display().to_string()));
        }
        if let Some(path) = &self.previous {
            diagnostic = diagnostic.with_related(vec![path.display().to_string()]);
        }

        diagnostic
    }
}

/// Owns the node map for one build
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: IndexMap<NodeId, GraphNode>,
    sources: HashMap<NodeId, Option<PathBuf>>,
    collisions: Vec<Collision>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create (or replace) the node for one unit
    ///
    /// A repeated id keeps its original position in the map but takes the
    /// new declaration's value.
    pub fn add_table(&mut self, table: &Table, source: Option<&Path>) {
        let node = GraphNode::new(table.unit_type, table.input_ids()).with_chain(chain_for(table));
        let source = source.map(Path::to_path_buf);

        if self.nodes.insert(table.id.clone(), node).is_some() {
            let previous = self.sources.get(&table.id).cloned().flatten();
            warn!(id = %table.id, "duplicate unit id, keeping the later declaration");
            self.collisions.push(Collision {
                id: table.id.clone(),
                previous,
                replacement: source.clone(),
            });
        }
        self.sources.insert(table.id.clone(), source);
    }

    /// Add every unit of one pipeline file, in document order
    pub fn add_pipeline(&mut self, pipeline: &Pipeline) {
        for table in &pipeline.tables {
            self.add_table(table, Some(&pipeline.path));
        }
        debug!(
            path = %pipeline.path.display(),
            units = pipeline.tables.len(),
            total = self.nodes.len(),
            "added pipeline units"
        );
    }

    /// Duplicate ids seen so far
    pub fn collisions(&self) -> &[Collision] {
        &self.collisions
    }

    /// File that declared the current node for an id
    pub fn source_of(&self, id: &str) -> Option<&Path> {
        self.sources.get(id).and_then(|p| p.as_deref())
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Derive outputs and return the graph
    pub fn finish(mut self) -> DependencyGraph {
        let edges: Vec<(NodeId, NodeId)> = self
            .nodes
            .iter()
            .flat_map(|(id, node)| {
                node.inputs
                    .iter()
                    .filter(|input| !input.is_empty())
                    .map(move |input| (input.clone(), id.clone()))
            })
            .collect();

        for (input, id) in edges {
            if let Some(parent) = self.nodes.get_mut(input.as_str()) {
                if !parent.outputs.contains(&id) {
                    parent.outputs.push(id);
                }
            }
        }

        DependencyGraph::from_nodes(self.nodes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tagflow_markup::UnitType;

    fn sql(id: &str, inputs: &str) -> Table {
        Table::new(id, UnitType::Sql).with_inputs(inputs)
    }

    #[test]
    fn forward_references_resolve() {
        let mut builder = GraphBuilder::new();
        builder.add_table(&sql("late_reader", "early"), None);
        builder.add_table(&sql("early", ""), None);
        let graph = builder.finish();

        assert_eq!(graph.get("early").unwrap().outputs, vec!["late_reader"]);
    }

    #[test]
    fn outputs_follow_processing_order() {
        let graph = DependencyGraph::from_tables(&[
            sql("src", ""),
            sql("b", "src"),
            sql("a", "src"),
        ]);

        assert_eq!(graph.get("src").unwrap().outputs, vec!["b", "a"]);
    }

    #[test]
    fn repeated_input_gives_one_edge() {
        let graph = DependencyGraph::from_tables(&[sql("a", ""), sql("b", "a,a")]);

        assert_eq!(graph.get("b").unwrap().inputs, vec!["a", "a"]);
        assert_eq!(graph.get("a").unwrap().outputs, vec!["b"]);
    }

    #[test]
    fn empty_and_dangling_inputs_make_no_edges() {
        let graph = DependencyGraph::from_tables(&[sql("", ""), sql("b", ",missing")]);

        assert_eq!(graph.get("b").unwrap().inputs, vec!["", "missing"]);
        assert!(graph.get("").unwrap().outputs.is_empty());
        assert!(graph.iter().all(|(_, n)| !n.outputs.iter().any(|o| o == "missing")));
    }

    #[test]
    fn last_write_wins_and_keeps_position() {
        let first = Pipeline {
            path: PathBuf::from("pipelines/a.xml"),
            tables: vec![sql("shared", "x"), sql("other", "")],
            ..Pipeline::default()
        };
        let second = Pipeline {
            path: PathBuf::from("pipelines/b.xml"),
            tables: vec![Table::new("shared", UnitType::Python).with_inputs("other")],
            ..Pipeline::default()
        };

        let mut builder = GraphBuilder::new();
        builder.add_pipeline(&first);
        builder.add_pipeline(&second);

        assert_eq!(
            builder.collisions(),
            &[Collision {
                id: "shared".to_string(),
                previous: Some(PathBuf::from("pipelines/a.xml")),
                replacement: Some(PathBuf::from("pipelines/b.xml")),
            }]
        );
        assert_eq!(builder.source_of("shared"), Some(Path::new("pipelines/b.xml")));

        let diagnostic = builder.collisions()[0].to_diagnostic();
        assert_eq!(diagnostic.code, DiagnosticCode::UnitDuplicateId);
        assert_eq!(diagnostic.file(), Some("pipelines/b.xml"));
        assert_eq!(diagnostic.related, vec!["pipelines/a.xml"]);

        let graph = builder.finish();
        assert_eq!(graph.ids(), vec!["shared", "other"]);

        let shared = graph.get("shared").unwrap();
        assert_eq!(shared.unit_type, UnitType::Python);
        assert_eq!(shared.inputs, vec!["other"]);
        assert_eq!(graph.get("other").unwrap().outputs, vec!["shared"]);
    }

    #[test]
    fn self_reference_is_an_edge() {
        let graph = DependencyGraph::from_tables(&[sql("loop", "loop")]);
        assert_eq!(graph.get("loop").unwrap().outputs, vec!["loop"]);
    }
}
