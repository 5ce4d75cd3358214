//! Graph node record

use serde::{Deserialize, Serialize};
use tagflow_markup::UnitType;

/// Node identifier (the unit's `id` attribute)
pub type NodeId = String;

/// One dependency unit in the merged graph
///
/// Field order is the serialized key order of `graph.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    #[serde(rename = "type")]
    pub unit_type: UnitType,

    /// Declared inputs, verbatim (may include unknown ids)
    pub inputs: Vec<NodeId>,

    /// Units that list this one as an input
    pub outputs: Vec<NodeId>,

    /// Pipeline file this unit triggers, if any
    pub chains_to: Option<String>,
}

impl GraphNode {
    pub fn new(unit_type: UnitType, inputs: Vec<NodeId>) -> Self {
        Self {
            unit_type,
            inputs,
            outputs: Vec::new(),
            chains_to: None,
        }
    }

    pub fn with_chain(mut self, chains_to: Option<String>) -> Self {
        self.chains_to = chains_to;
        self
    }
}
