//! tagflow engine - build orchestration
//!
//! This crate turns a directory of pipeline files into a dependency graph:
//! - Pipeline file discovery
//! - Template resolution through an injectable resolver
//! - Per-file isolation: a file that cannot be read or resolved is reported
//!   and skipped, the rest of the build goes on
//! - Collecting diagnostics into a build report

pub mod resolver;
pub mod discovery;
pub mod build;

pub use resolver::{PassthroughResolver, TemplateResolver};
pub use discovery::{discover_pipelines, DiscoveryError};
pub use build::{BuildError, BuildOutput, ProjectBuild};
