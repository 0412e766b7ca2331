//! The validated workflow graph.
//!
//! A [`WorkflowGraph`] can only be obtained through [`WorkflowGraph::new`],
//! [`WorkflowGraph::from_parts`] or deserialization, and all three run the
//! same validation pass.  Once built the graph is immutable; changing it
//! means building a new one.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::error::{IdentifierScope, Result, SchemaError};
use crate::order::{self, ExecutionBatch};
use crate::parameter::ParameterDefinition;
use crate::step::{StepDefinition, validate_parameter_list};

// ---------------------------------------------------------------------------
// Metadata and settings
// ---------------------------------------------------------------------------

/// Descriptive metadata for a workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowMetadata {
    /// Stable identifier; also names the deployed artifact directory.
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

impl WorkflowMetadata {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            version: default_version(),
            author: None,
            category: None,
            tags: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

/// Workflow-level hints consumed by the generated artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowSettings {
    pub parallel_execution: bool,
    pub max_parallel_steps: u32,
    pub default_timeout_secs: u64,
    /// Advance the client view to the next step after a success.
    pub auto_advance: bool,
    pub save_intermediate_results: bool,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            parallel_execution: false,
            max_parallel_steps: 3,
            default_timeout_secs: 300,
            auto_advance: true,
            save_intermediate_results: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Serialized form
// ---------------------------------------------------------------------------

/// Unvalidated document shape.  Deserialization goes through this type and
/// then through [`WorkflowGraph::from_parts`].
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowDocument {
    pub metadata: WorkflowMetadata,
    pub steps: Vec<StepDefinition>,
    #[serde(default)]
    pub settings: WorkflowSettings,
    #[serde(default)]
    pub global_parameters: Vec<ParameterDefinition>,
}

impl TryFrom<WorkflowDocument> for WorkflowGraph {
    type Error = SchemaError;

    fn try_from(doc: WorkflowDocument) -> Result<Self> {
        Self::from_parts(doc.metadata, doc.steps, doc.settings, doc.global_parameters)
    }
}

// ---------------------------------------------------------------------------
// WorkflowGraph
// ---------------------------------------------------------------------------

/// A validated, acyclic workflow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WorkflowDocument")]
pub struct WorkflowGraph {
    metadata: WorkflowMetadata,
    steps: Vec<StepDefinition>,
    settings: WorkflowSettings,
    global_parameters: Vec<ParameterDefinition>,
}

impl WorkflowGraph {
    /// Build a graph with default settings and no global parameters.
    pub fn new(metadata: WorkflowMetadata, steps: Vec<StepDefinition>) -> Result<Self> {
        Self::from_parts(metadata, steps, WorkflowSettings::default(), Vec::new())
    }

    /// Build a graph, validating every invariant.
    ///
    /// Checks run in this order: metadata, each step on its own, step id
    /// uniqueness, dependency targets, global parameters, and finally
    /// acyclicity.  The first violation is returned; nothing is built.
    pub fn from_parts(
        metadata: WorkflowMetadata,
        steps: Vec<StepDefinition>,
        settings: WorkflowSettings,
        global_parameters: Vec<ParameterDefinition>,
    ) -> Result<Self> {
        if metadata.id.trim().is_empty() {
            return Err(SchemaError::InvalidMetadata {
                reason: "workflow id must not be empty".into(),
            });
        }

        for step in &steps {
            step.validate()?;
        }

        let mut index: HashMap<&str, usize> = HashMap::with_capacity(steps.len());
        for (i, step) in steps.iter().enumerate() {
            if index.insert(step.id.as_str(), i).is_some() {
                return Err(SchemaError::DuplicateIdentifier {
                    scope: IdentifierScope::Step,
                    id: step.id.clone(),
                    context: metadata.id.clone(),
                });
            }
        }

        for step in &steps {
            if let Some(missing) = step.depends_on.iter().find(|d| !index.contains_key(d.as_str())) {
                return Err(SchemaError::UnknownDependency {
                    step_id: step.id.clone(),
                    missing_id: missing.clone(),
                });
            }
        }

        validate_parameter_list(&global_parameters, "global parameters")?;

        let batch = order::layer(&steps)?;

        debug!(
            workflow_id = %metadata.id,
            steps = steps.len(),
            waves = batch.len(),
            "workflow graph constructed"
        );

        Ok(Self {
            metadata,
            steps,
            settings,
            global_parameters,
        })
    }

    pub fn id(&self) -> &str {
        &self.metadata.id
    }

    pub fn metadata(&self) -> &WorkflowMetadata {
        &self.metadata
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    pub fn global_parameters(&self) -> &[ParameterDefinition] {
        &self.global_parameters
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Look up a step by id.
    pub fn step_by_id(&self, id: &str) -> Result<&StepDefinition> {
        self.steps
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SchemaError::StepNotFound {
                step_id: id.to_string(),
            })
    }

    /// Compute the execution waves.
    ///
    /// Construction already proved the graph acyclic, so for a built graph
    /// this always succeeds; the `Result` is kept because the same routine
    /// reports cycles during construction.
    pub fn execution_order(&self) -> Result<ExecutionBatch> {
        order::layer(&self.steps)
    }

    /// Distinct handler references in first-appearance order.
    pub fn handler_references(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.steps
            .iter()
            .filter_map(|s| s.handler_reference.as_deref())
            .filter(|h| seen.insert(*h))
            .collect()
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Export a JSON Schema (draft 2020-12) document describing this
    /// workflow.
    pub fn to_json_schema(&self) -> Result<Value> {
        Ok(json!({
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "type": "object",
            "title": self.metadata.name,
            "description": self.metadata.description,
            "properties": {
                "metadata": serde_json::to_value(&self.metadata)?,
                "steps": serde_json::to_value(&self.steps)?,
                "settings": serde_json::to_value(&self.settings)?,
            }
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parameter::ParameterKind;
    use crate::step::{PromptConfig, StepCategory};

    fn meta() -> WorkflowMetadata {
        WorkflowMetadata::new("wf", "Workflow")
    }

    fn step(id: &str, deps: &[&str]) -> StepDefinition {
        StepDefinition::new(id, id, StepCategory::DataTransformation).with_depends_on(deps.iter().copied())
    }

    #[test]
    fn unknown_dependency_fails_construction() {
        let result = WorkflowGraph::new(meta(), vec![step("a", &[]), step("b", &["ghost"])]);
        match result {
            Err(SchemaError::UnknownDependency { step_id, missing_id }) => {
                assert_eq!(step_id, "b");
                assert_eq!(missing_id, "ghost");
            }
            other => panic!("expected UnknownDependency, got {other:?}"),
        }
    }

    #[test]
    fn duplicate_step_ids_fail_construction() {
        let result = WorkflowGraph::new(meta(), vec![step("a", &[]), step("a", &[])]);
        assert!(matches!(
            result,
            Err(SchemaError::DuplicateIdentifier { scope: IdentifierScope::Step, .. })
        ));
    }

    #[test]
    fn cycle_fails_construction() {
        let result = WorkflowGraph::new(meta(), vec![step("a", &["b"]), step("b", &["a"])]);
        match result {
            Err(SchemaError::CyclicDependency { remaining }) => assert_eq!(remaining, vec!["a", "b"]),
            other => panic!("expected CyclicDependency, got {other:?}"),
        }
    }

    #[test]
    fn empty_workflow_id_is_rejected() {
        let result = WorkflowGraph::new(WorkflowMetadata::new(" ", "x"), vec![]);
        assert!(matches!(result, Err(SchemaError::InvalidMetadata { .. })));
    }

    #[test]
    fn duplicate_global_parameters_are_rejected() {
        let p = ParameterDefinition::builder("api_base", ParameterKind::Url).build().unwrap();
        let result = WorkflowGraph::from_parts(
            meta(),
            vec![step("a", &[])],
            WorkflowSettings::default(),
            vec![p.clone(), p],
        );
        assert!(matches!(result, Err(SchemaError::DuplicateIdentifier { .. })));
    }

    #[test]
    fn step_lookup() {
        let graph = WorkflowGraph::new(meta(), vec![step("a", &[]), step("b", &["a"])]).unwrap();
        assert_eq!(graph.step_by_id("b").unwrap().depends_on, vec!["a"]);
        assert!(matches!(
            graph.step_by_id("zzz"),
            Err(SchemaError::StepNotFound { .. })
        ));
    }

    #[test]
    fn execution_order_is_idempotent() {
        let graph = WorkflowGraph::new(
            meta(),
            vec![step("a", &[]), step("b", &["a"]), step("c", &[])],
        )
        .unwrap();
        let first = graph.execution_order().unwrap();
        let second = graph.execution_order().unwrap();
        assert_eq!(first, second);
        assert_eq!(first.waves()[0], vec!["a", "c"]);
    }

    #[test]
    fn deserialization_revalidates() {
        let json = r#"{
            "metadata": {"id": "wf", "name": "WF"},
            "steps": [
                {"id": "a", "name": "A", "category": "data_transformation", "depends_on": ["missing"]}
            ]
        }"#;
        let err = WorkflowGraph::from_json(json).unwrap_err();
        assert!(err.to_string().contains("missing"), "got: {err}");
    }

    #[test]
    fn handler_references_are_distinct() {
        let graph = WorkflowGraph::new(
            meta(),
            vec![
                step("a", &[]).with_handler("handle_x"),
                step("b", &[]).with_handler("handle_y"),
                step("c", &[]).with_handler("handle_x"),
            ],
        )
        .unwrap();
        assert_eq!(graph.handler_references(), vec!["handle_x", "handle_y"]);
    }

    #[test]
    fn json_schema_export_carries_title_and_steps() {
        let graph = WorkflowGraph::new(
            meta().with_description("desc"),
            vec![
                StepDefinition::new("gen", "Generate", StepCategory::InferenceProcessing)
                    .with_prompt(PromptConfig::new("Do {input_data}")),
            ],
        )
        .unwrap();
        let schema = graph.to_json_schema().unwrap();
        assert_eq!(schema["title"], "Workflow");
        assert_eq!(schema["description"], "desc");
        assert_eq!(schema["properties"]["steps"][0]["id"], "gen");
        assert_eq!(schema["properties"]["settings"]["max_parallel_steps"], 3);
    }
}
