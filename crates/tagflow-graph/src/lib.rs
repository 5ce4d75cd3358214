//! Dependency graph construction and traversal
//!
//! This crate handles:
//! - Building the unit graph from parsed pipelines (two passes: nodes, then edges)
//! - Detecting pipeline chaining in python units
//! - Depth, ordering and impact queries
//! - Reading and writing `graph.json`

pub mod node;
pub mod chain;
pub mod dag;
pub mod builder;
pub mod serialize;

pub use node::{GraphNode, NodeId};
pub use chain::detect_chain;
pub use dag::DependencyGraph;
pub use builder::{Collision, GraphBuilder};
pub use serialize::{GraphIoError, GraphSerializer};
