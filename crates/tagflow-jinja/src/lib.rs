//! Template resolution for pipeline files
//!
//! This crate handles:
//! - Loading template variables (variables.json)
//! - Rendering Jinja placeholders in raw pipeline text before tag parsing
//! - Turning render failures into diagnostics

pub mod preprocessor;
pub mod context;

pub use preprocessor::{TemplatePreprocessor, PreprocessResult, PreprocessError};
pub use context::{TemplateContext, TemplateContextBuilder, ContextError};
