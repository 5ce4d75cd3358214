//! Build orchestration
//!
//! Runs every pipeline file through read → resolve → parse → classify and
//! merges the units into one graph. Files are processed one after another in
//! the order given; the node map has a single owner and the edge pass runs
//! once at the end.

use std::path::{Path, PathBuf};
use tagflow_core::{Config, Diagnostic, DiagnosticCode, Location, Report};
use tagflow_graph::{Collision, DependencyGraph, GraphBuilder};
use tagflow_jinja::{ContextError, TemplateContext, TemplatePreprocessor};
use tagflow_markup::{Pipeline, TagParseError};
use tracing::{debug, info, warn};

use crate::discovery::{discover_pipelines, DiscoveryError};
use crate::resolver::{PassthroughResolver, TemplateResolver};

/// Environment failures that stop a build before it starts
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Variables(#[from] ContextError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Everything a build produced
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub graph: DependencyGraph,

    /// Pipelines that contributed, in processing order
    pub pipelines: Vec<Pipeline>,

    pub report: Report,
}

impl BuildOutput {
    /// Files that were skipped, as reported in the diagnostics
    pub fn failed_files(&self) -> Vec<&str> {
        let mut files: Vec<&str> = self
            .report
            .diagnostics
            .iter()
            .filter(|d| is_file_failure(d.code))
            .filter_map(|d| d.file())
            .collect();
        files.dedup();
        files
    }
}

fn is_file_failure(code: DiagnosticCode) -> bool {
    matches!(
        code,
        DiagnosticCode::FileReadError
            | DiagnosticCode::TemplateRenderError
            | DiagnosticCode::TemplateUndefinedVariable
    )
}

/// One build over a set of pipeline files
pub struct ProjectBuild {
    config: Config,
    resolver: Box<dyn TemplateResolver>,
}

impl ProjectBuild {
    /// A build that parses files without template resolution
    pub fn new(config: Config) -> Self {
        Self {
            config,
            resolver: Box::new(PassthroughResolver),
        }
    }

    /// A build that renders templates with the configured variables file
    ///
    /// A missing variables file means no variables; an unreadable or
    /// malformed one is an error.
    pub fn from_config(config: Config) -> Result<Self, BuildError> {
        let variables_path = config.resolve_path(&config.variables);
        let context = if variables_path.exists() {
            TemplateContext::from_file(&variables_path)?
        } else {
            debug!(path = %variables_path.display(), "no variables file, rendering without variables");
            TemplateContext::new()
        };

        let preprocessor = TemplatePreprocessor::new(context).strict(config.strict_undefined);
        Ok(Self::new(config).with_resolver(preprocessor))
    }

    /// Replace the template resolver
    pub fn with_resolver(mut self, resolver: impl TemplateResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Discover pipeline files in the configured directory and build them
    pub fn run_project(&self) -> Result<BuildOutput, BuildError> {
        let dir = self.config.resolve_path(&self.config.pipelines_dir);
        let files = discover_pipelines(&dir, &self.config.extension, self.config.recursive)?;
        info!(dir = %dir.display(), files = files.len(), "discovered pipeline files");
        Ok(self.run(&files))
    }

    /// Build the given files in order
    pub fn run(&self, files: &[PathBuf]) -> BuildOutput {
        let mut builder = GraphBuilder::new();
        let mut pipelines = Vec::new();
        let mut diagnostics = Vec::new();
        let mut files_failed = 0;

        for path in files {
            match self.load_pipeline(path) {
                Ok(pipeline) => {
                    diagnostics.extend(pipeline.lint());
                    builder.add_pipeline(&pipeline);
                    pipelines.push(pipeline);
                }
                Err(diagnostic) => {
                    warn!(path = %path.display(), error = %diagnostic.message, "skipping pipeline file");
                    diagnostics.push(diagnostic);
                    files_failed += 1;
                }
            }
        }

        diagnostics.extend(builder.collisions().iter().map(Collision::to_diagnostic));
        let graph = builder.finish();

        if graph.topological_sort().is_none() {
            diagnostics.push(Diagnostic::from_code(
                DiagnosticCode::GraphCycle,
                "The dependency graph contains a cycle; no execution order exists",
            ));
        }

        let mut report = Report::from_diagnostics(
            diagnostics
                .into_iter()
                .map(|d| self.config.severity.apply(d))
                .collect(),
        );
        report.summary.files_parsed = pipelines.len();
        report.summary.files_failed = files_failed;
        report.summary.units = graph.len();

        info!(
            files = files.len(),
            failed = files_failed,
            units = graph.len(),
            "dependency graph built"
        );

        BuildOutput {
            graph,
            pipelines,
            report,
        }
    }

    /// Read, resolve and parse one file
    ///
    /// The error is the diagnostic explaining why the file was dropped.
    pub fn load_pipeline(&self, path: &Path) -> Result<Pipeline, Diagnostic> {
        let resolved = self.resolve_file(path)?;
        Ok(Pipeline::parse(path, &resolved))
    }

    /// Read one file and expand its placeholders
    ///
    /// A resolver failure without a location is attributed to `path`.
    pub fn resolve_file(&self, path: &Path) -> Result<String, Diagnostic> {
        let raw = std::fs::read_to_string(path).map_err(|source| {
            TagParseError::Io {
                path: path.to_path_buf(),
                source,
            }
            .to_diagnostic()
        })?;

        self.resolver.resolve(&raw, path).map_err(|diagnostic| {
            if diagnostic.location.is_some() {
                diagnostic
            } else {
                diagnostic.with_location(Location::new(path.display().to_string()))
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingResolver;

    impl TemplateResolver for FailingResolver {
        fn resolve(&self, _text: &str, path: &Path) -> Result<String, Diagnostic> {
            Err(Diagnostic::from_code(DiagnosticCode::TemplateRenderError, "boom")
                .with_location(Location::new(path.display().to_string())))
        }
    }

    #[test]
    fn resolver_failure_drops_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xml");
        std::fs::write(&path, r#"<sql id="a">select 1</sql>"#).unwrap();

        let build = ProjectBuild::new(Config::default()).with_resolver(FailingResolver);
        let output = build.run(&[path.clone()]);

        assert!(output.graph.is_empty());
        assert!(output.pipelines.is_empty());
        assert_eq!(output.report.summary.files_failed, 1);
        assert_eq!(output.failed_files(), vec![path.display().to_string()]);
    }

    struct UnlocatedResolver;

    impl TemplateResolver for UnlocatedResolver {
        fn resolve(&self, _text: &str, _path: &Path) -> Result<String, Diagnostic> {
            Err(Diagnostic::from_code(DiagnosticCode::TemplateRenderError, "vault lookup failed"))
        }
    }

    #[test]
    fn resolver_failure_without_location_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.xml");
        std::fs::write(&path, r#"<sql id="a">select 1</sql>"#).unwrap();

        let build = ProjectBuild::new(Config::default()).with_resolver(UnlocatedResolver);
        let output = build.run(&[path.clone()]);

        let file = path.display().to_string();
        assert_eq!(output.report.summary.files_failed, 1);
        assert_eq!(output.failed_files(), vec![file.as_str()]);
        assert_eq!(output.report.diagnostics[0].file(), Some(file.as_str()));
        assert_eq!(output.report.diagnostics[0].message, "vault lookup failed");
    }

    #[test]
    fn empty_file_list_gives_empty_graph() {
        let output = ProjectBuild::new(Config::default()).run(&[]);

        assert!(output.graph.is_empty());
        assert_eq!(output.report.summary.total, 0);
    }
}
