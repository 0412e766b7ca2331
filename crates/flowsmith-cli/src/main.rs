//! CLI entry point for Flowsmith.
//!
//! This binary provides the `flowsmith` command with subcommands for
//! creating, deploying, inspecting and listing generated workflows.

mod cli;
mod config;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flowsmith_classifier::KeywordClassifier;
use flowsmith_registry::{DeployReport, FilesystemSink, WorkflowRegistry, WorkflowRequest};
use flowsmith_schema::{WorkflowGraph, catalog};

use crate::cli::{Cli, Commands};
use crate::config::FlowsmithConfig;

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let mut config = config::load_config(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    init_tracing(&config.log_level);

    match cli.command {
        Commands::Create {
            tasks,
            name,
            id,
            description,
            category,
            depends,
            no_deploy,
        } => {
            let mut request = WorkflowRequest::new(tasks);
            request.name = name;
            request.id = id;
            request.description = description;
            request.category = category;
            request.dependencies = depends.into_iter().collect();
            cmd_create(&config, request, no_deploy).await
        }
        Commands::Example { no_deploy } => {
            cmd_create(&config, WorkflowRequest::comprehensive_example(), no_deploy).await
        }
        Commands::Catalog => cmd_catalog(&config).await,
        Commands::Deploy { schema } => cmd_deploy(&config, &schema).await,
        Commands::Plan { schema } => cmd_plan(&schema),
        Commands::Classify { description } => cmd_classify(&description),
        Commands::List => cmd_list(&config).await,
    }
}

// ---------------------------------------------------------------------------
// Subcommands
// ---------------------------------------------------------------------------

async fn cmd_create(config: &FlowsmithConfig, request: WorkflowRequest, no_deploy: bool) -> Result<()> {
    let (registry, _) = open_registry(config)?;
    let id = registry
        .create(request)
        .await
        .context("failed to create workflow")?;

    let graph = registry.get(&id)?;
    println!("Created workflow `{id}` ({} steps)", graph.len());
    print_plan(&graph)?;

    if no_deploy {
        return Ok(());
    }
    let report = registry.deploy(&id).await?;
    print_report(&report)
}

async fn cmd_catalog(config: &FlowsmithConfig) -> Result<()> {
    let (registry, _) = open_registry(config)?;
    let mut failed = Vec::new();

    for graph in catalog::builtin_workflows().context("failed to build catalog workflows")? {
        let id = registry.insert(graph).await.id().to_string();
        let report = registry.deploy(&id).await?;
        if print_report(&report).is_err() {
            failed.push(id);
        }
    }

    if !failed.is_empty() {
        bail!("catalog deployment incomplete for: {}", failed.join(", "));
    }
    Ok(())
}

async fn cmd_deploy(config: &FlowsmithConfig, schema: &Path) -> Result<()> {
    let graph = read_schema(schema)?;
    let (registry, _) = open_registry(config)?;
    let id = registry.insert(graph).await.id().to_string();
    let report = registry.deploy(&id).await?;
    print_report(&report)
}

fn cmd_plan(schema: &Path) -> Result<()> {
    let graph = read_schema(schema)?;
    println!("{} ({})", graph.metadata().name, graph.id());
    print_plan(&graph)
}

fn cmd_classify(description: &str) -> Result<()> {
    let classifier = KeywordClassifier::with_default_table()?;
    let classification = classifier.classify(description)?;
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

async fn cmd_list(config: &FlowsmithConfig) -> Result<()> {
    let (registry, sink) = open_registry(config)?;
    for graph in sink.load_schemas().await? {
        registry.insert(graph).await;
    }

    let summaries = registry.list();
    if summaries.is_empty() {
        println!("No workflows under {}", config.output_dir.display());
        return Ok(());
    }

    println!("{:<32} {:>5}  {:<16} NAME", "ID", "STEPS", "CATEGORY");
    for summary in summaries {
        println!(
            "{:<32} {:>5}  {:<16} {}",
            summary.id,
            summary.steps,
            summary.category.as_deref().unwrap_or("-"),
            summary.name
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn open_registry(config: &FlowsmithConfig) -> Result<(WorkflowRegistry, Arc<FilesystemSink>)> {
    let sink = Arc::new(FilesystemSink::new(&config.output_dir));
    let registry = WorkflowRegistry::new(sink.clone())
        .context("failed to initialise workflow registry")?
        .with_default_category(&config.default_category);
    info!(output_dir = %config.output_dir.display(), "registry ready");
    Ok((registry, sink))
}

fn read_schema(path: &Path) -> Result<WorkflowGraph> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    WorkflowGraph::from_json(&text).with_context(|| format!("invalid workflow schema {}", path.display()))
}

fn print_plan(graph: &WorkflowGraph) -> Result<()> {
    let batch = graph.execution_order()?;
    for (n, wave) in batch.waves().iter().enumerate() {
        println!("  wave {}: {}", n + 1, wave.join(", "));
    }
    Ok(())
}

/// Print where each artifact landed.  Fails when any kind is missing.
fn print_report(report: &DeployReport) -> Result<()> {
    println!("Deployed `{}`:", report.workflow_id);
    for (kind, location) in &report.locations {
        println!("  {kind:<18} {location}");
    }
    for failure in report.emission_failures.values() {
        eprintln!("  {failure}");
    }
    for (kind, reason) in &report.storage_failures {
        eprintln!("  storage of `{kind}` failed: {reason}");
    }

    if !report.is_complete() {
        bail!(
            "{} of {} artifacts failed for `{}`",
            report.emission_failures.len() + report.storage_failures.len(),
            report.locations.len() + report.emission_failures.len() + report.storage_failures.len(),
            report.workflow_id
        );
    }
    Ok(())
}

fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
