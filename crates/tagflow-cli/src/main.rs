use clap::{Parser, Subcommand};
use colored::Colorize;
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tagflow_core::{Config, Report, Severity};
use tagflow_engine::{BuildOutput, ProjectBuild};
use tagflow_graph::{DependencyGraph, GraphSerializer};
use tagflow_markup::parse_tags;

/// tagflow - dependency graphs for tag-based data pipelines
#[derive(Parser)]
#[command(name = "tagflow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to config file (default: tagflow.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the dependency graph from every pipeline file
    Build {
        /// Directory holding the pipeline files
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Output file for graph.json
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also write the diagnostics report as JSON
        #[arg(short, long)]
        report: Option<PathBuf>,

        /// JSON file with template variables
        #[arg(long)]
        variables: Option<PathBuf>,
    },

    /// Parse one pipeline file and print its model as JSON
    Parse {
        file: PathBuf,

        /// Print the raw tagged elements instead of the classified model
        #[arg(short, long)]
        elements: bool,
    },

    /// Show upstream and downstream units of one unit
    Impact {
        /// Unit id
        id: String,

        /// graph.json to read (default: the configured output)
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },

    /// Show execution levels and a topological order
    Order {
        /// graph.json to read (default: the configured output)
        #[arg(short, long)]
        graph: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    // Load config if specified
    let config = if let Some(config_path) = &cli.config {
        Config::from_file(config_path)?
    } else if Path::new("tagflow.toml").exists() {
        Config::from_file(Path::new("tagflow.toml"))?
    } else {
        if cli.verbose {
            eprintln!("{}", "No config file found, using defaults".yellow());
        }
        Config::default()
    };
    tracing::debug!(root = %config.project_root.display(), "configuration loaded");

    match cli.command {
        Commands::Build { dir, output, report, variables } => {
            let cwd = std::env::current_dir()?;
            let config = apply_build_flags(config, &cwd, dir, output, variables);
            build_command(config, report.as_deref(), cli.verbose)
        }
        Commands::Parse { file, elements } => parse_command(config, &file, elements),
        Commands::Impact { id, graph } => {
            let graph_path = graph.unwrap_or_else(|| config.resolve_path(&config.output));
            impact_command(&id, &graph_path)
        }
        Commands::Order { graph } => {
            let graph_path = graph.unwrap_or_else(|| config.resolve_path(&config.output));
            order_command(&graph_path)
        }
    }
}

/// Paths given on the command line are relative to the working directory,
/// not to the config file
fn apply_build_flags(
    mut config: Config,
    cwd: &Path,
    dir: Option<PathBuf>,
    output: Option<PathBuf>,
    variables: Option<PathBuf>,
) -> Config {
    if let Some(dir) = dir {
        config.pipelines_dir = cwd.join(dir);
    }
    if let Some(output) = output {
        config.output = cwd.join(output);
    }
    if let Some(variables) = variables {
        config.variables = cwd.join(variables);
    }
    config
}

/// Build command - discover, parse and merge every pipeline file
fn build_command(config: Config, report_path: Option<&Path>, verbose: bool) -> Result<()> {
    let output_path = config.resolve_path(&config.output);

    if verbose {
        eprintln!(
            "{} {}",
            "Reading pipelines from:".cyan(),
            config.resolve_path(&config.pipelines_dir).display()
        );
    }

    let build = ProjectBuild::from_config(config)?;
    let output = build.run_project()?;

    GraphSerializer::save(&output.graph, &output_path)?;
    if verbose {
        eprintln!("{} {}", "Graph saved to:".green(), output_path.display());
    }

    if let Some(path) = report_path {
        output.report.save_to_file(path)?;
        if verbose {
            eprintln!("{} {}", "Report saved to:".green(), path.display());
        }
    }

    print_build_summary(&output);

    // Exit with error code if there are errors
    if output.report.has_errors() {
        std::process::exit(1);
    }

    Ok(())
}

/// Parse command - show what one file declares
fn parse_command(config: Config, file: &Path, elements: bool) -> Result<()> {
    let build = ProjectBuild::from_config(config)?;

    let json = if elements {
        let text = build
            .resolve_file(file)
            .map_err(|d| anyhow::anyhow!("{}", d.message))?;
        serde_json::to_string_pretty(&parse_tags(&text))?
    } else {
        let pipeline = build
            .load_pipeline(file)
            .map_err(|d| anyhow::anyhow!("{}", d.message))?;
        for diag in pipeline.lint() {
            eprintln!("[{}] {}: {}", "WARN".yellow().bold(), diag.code, diag.message);
        }
        serde_json::to_string_pretty(&pipeline)?
    };

    println!("{}", json);
    Ok(())
}

fn load_graph(path: &Path) -> Result<DependencyGraph> {
    GraphSerializer::load(path).map_err(|e| {
        anyhow::anyhow!("{}. Run 'tagflow build' first.", e)
    })
}

/// Impact command - show what feeds a unit and what it feeds
fn impact_command(id: &str, graph_path: &Path) -> Result<()> {
    let graph = load_graph(graph_path)?;
    let node = graph
        .get(id)
        .ok_or_else(|| anyhow::anyhow!("Unit '{}' not found in {}", id, graph_path.display()))?;

    let downstream = graph.downstream(id);
    let upstream = graph.upstream(id);

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Impact Analysis".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("{} {} ({})", "Unit:".bold(), id.green(), node.unit_type);
    if let Some(target) = &node.chains_to {
        println!("{} {}", "Chains to:".bold(), target.cyan());
    }
    println!();

    println!("{} {}", "Upstream units:".bold(), upstream.len());
    for dep in &upstream {
        println!("  - {}", dep);
    }
    println!();

    println!("{} {}", "Downstream units:".bold(), downstream.len());
    if downstream.is_empty() {
        println!("{}", "✓ No downstream dependencies".green());
    } else {
        for (i, dep) in downstream.iter().enumerate() {
            println!("  {}. {}", i + 1, dep.yellow());
        }
        println!();
        println!("{}", "⚠ Changes to this unit require rerunning the units above".yellow().bold());
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());

    Ok(())
}

/// Order command - levels by depth and a full execution order
fn order_command(graph_path: &Path) -> Result<()> {
    let graph = load_graph(graph_path)?;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Execution Order".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    for (depth, level) in graph.levels().iter().enumerate() {
        println!("  {} {}", format!("Level {}:", depth).bold(), level.join(", "));
    }
    println!();

    match graph.topological_sort() {
        Some(order) => {
            println!("{}", "Topological order:".bold());
            for (i, id) in order.iter().enumerate() {
                println!("  {}. {}", i + 1, id);
            }
        }
        None => {
            println!("{}", "✗ The graph has a cycle; no execution order exists".red().bold());
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());

    Ok(())
}

fn print_build_summary(output: &BuildOutput) {
    let report: &Report = &output.report;

    println!("\n{}", "=".repeat(60).bright_blue());
    println!("{}", "Pipeline Graph Build".bold().bright_blue());
    println!("{}", "=".repeat(60).bright_blue());
    println!();

    println!("Version: {}", report.version);
    println!("Timestamp: {}", report.timestamp);
    println!();

    println!("{}", "Summary:".bold());
    println!("  Files parsed: {}", report.summary.files_parsed);
    if report.summary.files_failed > 0 {
        println!("  Files failed: {}", format!("{}", report.summary.files_failed).red().bold());
    }
    println!("  Units:        {}", report.summary.units);
    println!("  Chains:       {}", output.graph.chains().len());

    if report.summary.errors > 0 {
        println!("  Errors:   {}", format!("{}", report.summary.errors).red().bold());
    } else {
        println!("  Errors:   {}", format!("{}", report.summary.errors).green());
    }

    if report.summary.warnings > 0 {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).yellow());
    } else {
        println!("  Warnings: {}", format!("{}", report.summary.warnings).green());
    }
    println!();

    if report.diagnostics.is_empty() {
        println!("{}", "✓ No issues found!".green().bold());
    } else {
        println!("{}", "Diagnostics:".bold());
        for diag in &report.diagnostics {
            let severity_str = match diag.severity {
                Severity::Error => "ERROR".red().bold(),
                Severity::Warn => "WARN".yellow().bold(),
                Severity::Info => "INFO".cyan(),
            };

            println!("  [{}] {}: {}", severity_str, diag.code, diag.message);

            if let Some(loc) = &diag.location {
                println!("    at {}", loc);
            }
            for related in &diag.related {
                println!("    see also {}", related);
            }
        }
    }

    println!();
    println!("{}", "=".repeat(60).bright_blue());
}
