//! Command-line arguments.
//!
//! Subcommands map one-to-one onto registry operations; `main.rs` only
//! dispatches them.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Flowsmith -- turn task lists into workflow plugins.
#[derive(Parser)]
#[command(
    name = "flowsmith",
    version,
    about = "Flowsmith -- workflow scaffolding generator",
    long_about = "Classifies free-text tasks into typed workflow steps and generates a \
                  server plugin, a client component, a config descriptor, a schema dump \
                  and a host registration snippet for each workflow."
)]
pub struct Cli {
    /// Root directory for deployed artifacts (overrides config and env).
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    /// Config file to read instead of `config/default.toml`.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a workflow from tasks and deploy it.
    Create {
        /// Task descriptions, one per step, in execution order.
        #[arg(required = true)]
        tasks: Vec<String>,

        /// Display name; the id is derived from it unless `--id` is given.
        #[arg(long)]
        name: Option<String>,

        /// Explicit workflow id.
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        category: Option<String>,

        /// Override a step's dependencies: `step_3=step_1` or `step_2=`.
        /// May be repeated.
        #[arg(long = "depends", value_parser = parse_dependency)]
        depends: Vec<(String, Vec<String>)>,

        /// Register and print the plan without writing artifacts.
        #[arg(long)]
        no_deploy: bool,
    },

    /// Create and deploy the five-step comprehensive example.
    Example {
        #[arg(long)]
        no_deploy: bool,
    },

    /// Deploy the built-in catalog workflows.
    Catalog,

    /// Load a schema dump and deploy it.
    Deploy {
        /// Path to a `schema.json` file.
        schema: PathBuf,
    },

    /// Print the execution waves of a schema dump.
    Plan {
        /// Path to a `schema.json` file.
        schema: PathBuf,
    },

    /// Print how a task description is classified, as JSON.
    Classify {
        description: String,
    },

    /// List the workflows deployed under the output directory.
    List,
}

/// Parse `STEP=DEP[,DEP...]`.  An empty right-hand side makes the step a
/// root.
pub fn parse_dependency(raw: &str) -> Result<(String, Vec<String>), String> {
    let (step, deps) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected STEP=DEP[,DEP...], got `{raw}`"))?;
    let step = step.trim();
    if step.is_empty() {
        return Err(format!("missing step id in `{raw}`"));
    }
    let deps = deps
        .split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string)
        .collect();
    Ok((step.to_string(), deps))
}
