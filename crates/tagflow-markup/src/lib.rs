//! Pipeline markup parsing
//!
//! This crate handles:
//! - Scanning resolved pipeline text for `<name key="value">...</name>` tags
//! - Classifying tagged records into tasks, connections and dependency units
//! - The per-file pipeline model
//!
//! The tag grammar is single-level: inner content is captured verbatim and
//! never parsed for nested tags.

pub mod tag;
pub mod element;
pub mod pipeline;

pub use tag::{parse_tags, parse_file, TaggedElement, TagParseError};
pub use element::{Connection, Element, ElementKind, Table, Task, UnitType};
pub use pipeline::Pipeline;
