//! The workflow registry.
//!
//! Owns every known [`WorkflowGraph`] keyed by workflow id, turns task lists
//! into graphs through the classifier, and deploys graphs by running the
//! emission engine and handing each artifact to an [`ArtifactSink`].
//!
//! The map is backed by [`DashMap`]; graphs are immutable and shared as
//! `Arc`, so a reader always sees a whole graph.  Mutations and deployments
//! of the same id are serialized by a per-id async mutex; different ids
//! never wait on each other.
//!
//! # Example
//!
//! ```rust
//! # use std::sync::Arc;
//! # use flowsmith_registry::{MemorySink, WorkflowRegistry, WorkflowRequest};
//! # async fn demo() -> flowsmith_registry::Result<()> {
//! let registry = WorkflowRegistry::new(Arc::new(MemorySink::new()))?;
//! let id = registry
//!     .create(WorkflowRequest::new(["data input", "ai analysis"]).with_name("Quick Look"))
//!     .await?;
//! assert_eq!(id, "quick_look");
//! let report = registry.deploy(&id).await?;
//! assert!(report.is_complete());
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use flowsmith_classifier::KeywordClassifier;
use flowsmith_emit::naming::title_case;
use flowsmith_emit::{ArtifactKind, EmissionEngine, EmissionFailure, EmissionReport};
use flowsmith_schema::{StepDefinition, WorkflowGraph, WorkflowMetadata};

use crate::error::{RegistryError, Result};
use crate::request::{GENERATED_AUTHOR, WorkflowRequest};
use crate::sink::ArtifactSink;

/// Category given to generated workflows when the request names none.
pub const DEFAULT_CATEGORY: &str = "auto_generated";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// One row of [`WorkflowRegistry::list`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowSummary {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub version: String,
    /// Number of steps.
    pub steps: usize,
    pub registered_at: DateTime<Utc>,
}

/// Outcome of [`WorkflowRegistry::deploy`].
///
/// Kinds that failed to emit are in `emission_failures`; kinds that emitted
/// but could not be stored are in `storage_failures`.  Everything else has a
/// location.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeployReport {
    pub workflow_id: String,
    pub locations: BTreeMap<ArtifactKind, String>,
    pub emission_failures: BTreeMap<ArtifactKind, EmissionFailure>,
    pub storage_failures: BTreeMap<ArtifactKind, String>,
}

impl DeployReport {
    pub fn is_complete(&self) -> bool {
        self.emission_failures.is_empty() && self.storage_failures.is_empty()
    }

    pub fn location(&self, kind: ArtifactKind) -> Option<&str> {
        self.locations.get(&kind).map(String::as_str)
    }
}

struct Entry {
    graph: Arc<WorkflowGraph>,
    registered_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Concurrent workflow store.  Cheaply cloneable; clones share state.
#[derive(Clone)]
pub struct WorkflowRegistry {
    entries: Arc<DashMap<String, Entry>>,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    classifier: Arc<KeywordClassifier>,
    engine: Arc<EmissionEngine>,
    sink: Arc<dyn ArtifactSink>,
    default_category: String,
}

impl WorkflowRegistry {
    /// Registry with the built-in keyword table and all five emission
    /// targets.
    pub fn new(sink: Arc<dyn ArtifactSink>) -> Result<Self> {
        Ok(Self::with_components(
            KeywordClassifier::with_default_table()?,
            EmissionEngine::with_default_targets()?,
            sink,
        ))
    }

    pub fn with_components(
        classifier: KeywordClassifier,
        engine: EmissionEngine,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            locks: Arc::new(DashMap::new()),
            classifier: Arc::new(classifier),
            engine: Arc::new(engine),
            sink,
            default_category: DEFAULT_CATEGORY.to_string(),
        }
    }

    /// Category used when a request does not set one.
    pub fn with_default_category(mut self, category: impl Into<String>) -> Self {
        self.default_category = category.into();
        self
    }

    pub fn classifier(&self) -> &KeywordClassifier {
        &self.classifier
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    // -- Building -------------------------------------------------------------

    /// Build a graph from a request without registering it.
    ///
    /// Tasks are classified in order and become `step_1..step_n`.  Each step
    /// depends on the one before it unless the request overrides its
    /// dependencies.
    pub fn compile(&self, request: &WorkflowRequest) -> Result<WorkflowGraph> {
        if request.tasks.is_empty() {
            return Err(RegistryError::EmptyTaskList);
        }

        let step_ids: Vec<String> = (1..=request.tasks.len()).map(|n| format!("step_{n}")).collect();
        if let Some(unknown) = request.dependencies.keys().find(|k| !step_ids.contains(*k)) {
            return Err(RegistryError::InvalidRequest {
                reason: format!(
                    "dependency override for `{unknown}`, but the request only has {} steps",
                    step_ids.len()
                ),
            });
        }

        let mut steps: Vec<StepDefinition> = Vec::with_capacity(request.tasks.len());
        for (index, task) in request.tasks.iter().enumerate() {
            let task = task.trim();
            if task.is_empty() {
                return Err(RegistryError::InvalidRequest {
                    reason: format!("task {} is blank", index + 1),
                });
            }

            let step_id = &step_ids[index];
            let depends_on = match request.dependencies.get(step_id) {
                Some(deps) => deps.clone(),
                None if index == 0 => Vec::new(),
                None => vec![step_ids[index - 1].clone()],
            };

            let classification = self.classifier.classify(task)?;
            debug!(
                step_id = %step_id,
                category = %classification.category.as_str(),
                keyword = ?classification.matched_keyword,
                "task classified"
            );

            steps.push(
                classification
                    .into_step(step_id.clone(), title_case(task), format!("Execute {task}"))
                    .with_depends_on(depends_on),
            );
        }

        let name = request.resolved_name();
        let description = request
            .description
            .clone()
            .unwrap_or_else(|| format!("Auto-generated workflow for {name}"));
        let category = request
            .category
            .clone()
            .unwrap_or_else(|| self.default_category.clone());
        let metadata = WorkflowMetadata::new(request.resolved_id(), name)
            .with_description(description)
            .with_author(GENERATED_AUTHOR)
            .with_category(category);

        Ok(WorkflowGraph::new(metadata, steps)?)
    }

    // -- Mutation -------------------------------------------------------------

    /// Build and register a workflow.  Returns its id.
    ///
    /// An existing workflow with the same id is replaced.
    pub async fn create(&self, request: WorkflowRequest) -> Result<String> {
        let graph = self.compile(&request)?;
        let id = graph.id().to_string();
        let steps = graph.len();
        self.insert(graph).await;
        info!(workflow_id = %id, steps, "workflow created");
        Ok(id)
    }

    /// Register an already-built graph, replacing any previous one with the
    /// same id.
    pub async fn insert(&self, graph: WorkflowGraph) -> Arc<WorkflowGraph> {
        let id = graph.id().to_string();
        let lock = self.lock_for(&id);
        let _guard = lock.lock().await;

        let graph = Arc::new(graph);
        let previous = self.entries.insert(
            id.clone(),
            Entry {
                graph: Arc::clone(&graph),
                registered_at: Utc::now(),
            },
        );
        if previous.is_some() {
            info!(workflow_id = %id, "workflow replaced");
        } else {
            debug!(workflow_id = %id, "workflow registered");
        }
        graph
    }

    /// Unregister a workflow.
    pub async fn remove(&self, workflow_id: &str) -> Result<Arc<WorkflowGraph>> {
        let lock = self.existing_lock(workflow_id)?;
        let _guard = lock.lock().await;

        let (_, entry) = self
            .entries
            .remove(workflow_id)
            .ok_or_else(|| unknown(workflow_id))?;
        // Keep the lock while another task still waits on it.
        self.locks.remove_if(workflow_id, |_, held| {
            Arc::ptr_eq(held, &lock) && Arc::strong_count(held) == 2
        });
        info!(workflow_id, "workflow removed");
        Ok(entry.graph)
    }

    // -- Queries --------------------------------------------------------------

    pub fn get(&self, workflow_id: &str) -> Result<Arc<WorkflowGraph>> {
        self.entries
            .get(workflow_id)
            .map(|entry| Arc::clone(&entry.graph))
            .ok_or_else(|| unknown(workflow_id))
    }

    pub fn contains(&self, workflow_id: &str) -> bool {
        self.entries.contains_key(workflow_id)
    }

    /// Summaries of every registered workflow, sorted by id.
    pub fn list(&self) -> Vec<WorkflowSummary> {
        let mut summaries: Vec<WorkflowSummary> = self
            .entries
            .iter()
            .map(|entry| {
                let meta = entry.graph.metadata();
                WorkflowSummary {
                    id: meta.id.clone(),
                    name: meta.name.clone(),
                    description: meta.description.clone(),
                    category: meta.category.clone(),
                    version: meta.version.clone(),
                    steps: entry.graph.len(),
                    registered_at: entry.registered_at,
                }
            })
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        summaries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    // -- Emission -------------------------------------------------------------

    /// Emit every artifact of a workflow without storing anything.
    pub fn render(&self, workflow_id: &str) -> Result<EmissionReport> {
        let graph = self.get(workflow_id)?;
        Ok(self.engine.emit(&graph)?)
    }

    /// Emit every artifact of a workflow and store them through the sink.
    ///
    /// Artifacts are stored concurrently.  A kind that fails to emit or to
    /// store is recorded in the report; the other kinds still land.
    pub async fn deploy(&self, workflow_id: &str) -> Result<DeployReport> {
        let lock = self.existing_lock(workflow_id)?;
        let _guard = lock.lock().await;

        let graph = self.get(workflow_id)?;
        let emission = self.engine.emit(&graph)?;

        let stores = emission.artifacts.values().map(|artifact| async move {
            (artifact.kind, self.sink.store(workflow_id, artifact).await)
        });
        let outcomes = join_all(stores).await;

        let mut report = DeployReport {
            workflow_id: workflow_id.to_string(),
            emission_failures: emission.failures,
            ..DeployReport::default()
        };
        for (kind, outcome) in outcomes {
            match outcome {
                Ok(location) => {
                    report.locations.insert(kind, location);
                }
                Err(e) => {
                    warn!(workflow_id, kind = %kind, error = %e, "artifact storage failed");
                    report.storage_failures.insert(kind, e.to_string());
                }
            }
        }

        info!(
            workflow_id,
            stored = report.locations.len(),
            failed = report.emission_failures.len() + report.storage_failures.len(),
            "workflow deployed"
        );
        Ok(report)
    }

    /// Lock for `workflow_id`, created on first registration.
    fn lock_for(&self, workflow_id: &str) -> Arc<Mutex<()>> {
        Arc::clone(self.locks.entry(workflow_id.to_string()).or_default().value())
    }

    /// Lock for a registered workflow.  Unknown ids never allocate one.
    fn existing_lock(&self, workflow_id: &str) -> Result<Arc<Mutex<()>>> {
        self.locks
            .get(workflow_id)
            .map(|lock| Arc::clone(lock.value()))
            .ok_or_else(|| unknown(workflow_id))
    }

    #[cfg(test)]
    fn lock_count(&self) -> usize {
        self.locks.len()
    }
}

fn unknown(workflow_id: &str) -> RegistryError {
    RegistryError::UnknownWorkflow {
        workflow_id: workflow_id.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
