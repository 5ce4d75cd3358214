//! Dependency graph (DAG) queries
//!
//! The graph is keyed by unit id in insertion order. Edges come from the
//! nodes' `outputs`; `inputs` may also name ids that are not nodes, which
//! every query ignores.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use tagflow_markup::{Pipeline, Table};

use crate::builder::GraphBuilder;
use crate::node::{GraphNode, NodeId};

/// Merged dependency graph of all pipeline files
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    nodes: IndexMap<NodeId, GraphNode>,
}

impl DependencyGraph {
    /// Wrap nodes whose edges are already derived
    pub fn from_nodes(nodes: IndexMap<NodeId, GraphNode>) -> Self {
        Self { nodes }
    }

    /// Build a graph from units in processing order
    pub fn from_tables<'a>(tables: impl IntoIterator<Item = &'a Table>) -> Self {
        let mut builder = GraphBuilder::new();
        for table in tables {
            builder.add_table(table, None);
        }
        builder.finish()
    }

    /// Build a graph from parsed pipelines in processing order
    pub fn from_pipelines(pipelines: &[Pipeline]) -> Self {
        let mut builder = GraphBuilder::new();
        for pipeline in pipelines {
            builder.add_pipeline(pipeline);
        }
        builder.finish()
    }

    pub fn nodes(&self) -> &IndexMap<NodeId, GraphNode> {
        &self.nodes
    }

    pub fn get(&self, node_id: &str) -> Option<&GraphNode> {
        self.nodes.get(node_id)
    }

    pub fn contains(&self, node_id: &str) -> bool {
        self.nodes.contains_key(node_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids in insertion order
    pub fn ids(&self) -> Vec<&NodeId> {
        self.nodes.keys().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &GraphNode)> {
        self.nodes.iter()
    }

    /// Immediate parents: declared inputs that are nodes, without repeats
    pub fn parents(&self, node_id: &str) -> Vec<&NodeId> {
        let Some(node) = self.nodes.get(node_id) else {
            return Vec::new();
        };

        let mut seen = HashSet::new();
        node.inputs
            .iter()
            .filter_map(|input| self.nodes.get_key_value(input.as_str()).map(|(k, _)| k))
            .filter(|id| seen.insert(id.as_str()))
            .collect()
    }

    /// Immediate children (the node's outputs)
    pub fn children(&self, node_id: &str) -> Vec<&NodeId> {
        self.nodes
            .get(node_id)
            .map(|node| node.outputs.iter().collect())
            .unwrap_or_default()
    }

    /// Nodes without any known input
    pub fn roots(&self) -> Vec<&NodeId> {
        self.nodes
            .keys()
            .filter(|id| self.parents(id).is_empty())
            .collect()
    }

    /// Get all downstream nodes (transitive closure of children)
    ///
    /// This is the blast radius: every unit that has to rerun if this one changes.
    pub fn downstream(&self, node_id: &str) -> Vec<NodeId> {
        self.closure(node_id, |id| self.children(id))
    }

    /// Get all upstream nodes (transitive closure of parents)
    pub fn upstream(&self, node_id: &str) -> Vec<NodeId> {
        self.closure(node_id, |id| self.parents(id))
    }

    fn closure<'a>(&'a self, node_id: &str, next: impl Fn(&str) -> Vec<&'a NodeId>) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut queue: VecDeque<&NodeId> = next(node_id).into_iter().collect();
        let mut result = Vec::new();

        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.as_str()) {
                continue;
            }
            result.push(current.clone());

            for neighbour in next(current.as_str()) {
                if !visited.contains(neighbour.as_str()) {
                    queue.push_back(neighbour);
                }
            }
        }

        result
    }

    /// Check if there's a path from source to target
    pub fn has_path(&self, source: &str, target: &str) -> bool {
        self.downstream(source).iter().any(|id| id == target)
    }

    /// Breadth-first distance of every node from the roots
    ///
    /// Nodes reachable only through a cycle have no depth and are left out.
    pub fn depths(&self) -> IndexMap<NodeId, usize> {
        let mut depths: IndexMap<NodeId, usize> = IndexMap::new();
        let mut queue = VecDeque::new();

        for root in self.roots() {
            depths.insert(root.clone(), 0);
            queue.push_back(root);
        }

        while let Some(current) = queue.pop_front() {
            let depth = depths[current.as_str()];
            for child in self.children(current) {
                if !depths.contains_key(child.as_str()) {
                    depths.insert(child.clone(), depth + 1);
                    queue.push_back(child);
                }
            }
        }

        depths
    }

    /// Node ids grouped by depth, shallowest first, insertion order within a level
    pub fn levels(&self) -> Vec<Vec<NodeId>> {
        let depths = self.depths();
        let max_depth = depths.values().copied().max();
        let mut levels = vec![Vec::new(); max_depth.map_or(0, |d| d + 1)];

        for id in self.nodes.keys() {
            if let Some(&depth) = depths.get(id.as_str()) {
                levels[depth].push(id.clone());
            }
        }

        levels
    }

    /// Get topological sort of all nodes
    ///
    /// Returns `None` when the graph has a cycle.
    pub fn topological_sort(&self) -> Option<Vec<NodeId>> {
        let mut in_degree: HashMap<&str, usize> = self
            .nodes
            .keys()
            .map(|id| (id.as_str(), self.parents(id).len()))
            .collect();
        let mut result = Vec::new();

        // Find nodes with no dependencies
        let mut queue: VecDeque<&NodeId> = self
            .nodes
            .keys()
            .filter(|id| in_degree[id.as_str()] == 0)
            .collect();

        // Kahn's algorithm
        while let Some(node) = queue.pop_front() {
            result.push(node.clone());

            for child in self.children(node) {
                if let Some(degree) = in_degree.get_mut(child.as_str()) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        // Check if all nodes were visited (no cycles)
        if result.len() == self.nodes.len() {
            Some(result)
        } else {
            None
        }
    }

    /// Units that chain to another pipeline file
    pub fn chains(&self) -> Vec<(&NodeId, &str)> {
        self.nodes
            .iter()
            .filter_map(|(id, node)| node.chains_to.as_deref().map(|target| (id, target)))
            .collect()
    }
}
