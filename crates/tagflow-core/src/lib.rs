//! tagflow core
//!
//! Shared types for every tagflow crate: diagnostics, the build report and
//! the `tagflow.toml` configuration.
//! Never rename diagnostic codes - they are part of the public API.

pub mod diagnostic;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use report::{Report, ReportSummary, ReportVersion};
pub use config::{Config, ConfigError, SeverityThreshold};
