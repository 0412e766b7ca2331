//! Workflow creation requests.
//!
//! A [`WorkflowRequest`] is the input to [`WorkflowRegistry::create`]: an
//! ordered list of free-text tasks plus optional identity fields.  Anything
//! left unset is derived when the request is resolved.
//!
//! [`WorkflowRegistry::create`]: crate::WorkflowRegistry::create

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use flowsmith_emit::naming::title_case;

/// Id used when neither an id nor a name is given.
pub const DEFAULT_WORKFLOW_ID: &str = "auto_workflow";

/// Author recorded on generated workflows.
pub const GENERATED_AUTHOR: &str = "Flowsmith Auto-Generator";

/// Ordered task list plus optional identity overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowRequest {
    pub tasks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Explicit dependencies keyed by generated step id (`step_<n>`).
    /// Steps without an entry depend on the previous step.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Vec<String>>,
}

impl WorkflowRequest {
    pub fn new<I, S>(tasks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tasks: tasks.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Replace the default dependency of `step_id`.  An empty list makes
    /// the step a root.
    pub fn with_dependencies<I, S>(mut self, step_id: impl Into<String>, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies
            .insert(step_id.into(), deps.into_iter().map(Into::into).collect());
        self
    }

    /// The five-task pipeline touching every inferred category.
    pub fn comprehensive_example() -> Self {
        Self::new([
            "data input and validation",
            "ai-powered analysis",
            "report generation",
            "code execution and testing",
            "output formatting",
        ])
        .with_name("Comprehensive AI Data Pipeline")
        .with_description("A full-featured workflow demonstrating all step types and capabilities")
        .with_category("example")
    }

    /// The workflow id: the explicit id, else the name's lower-cased words
    /// joined by `_` (with `-` also mapped to `_`), else
    /// [`DEFAULT_WORKFLOW_ID`].
    pub fn resolved_id(&self) -> String {
        if let Some(id) = self.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return id.to_string();
        }
        match self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            Some(name) => name
                .to_lowercase()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
                .replace('-', "_"),
            None => DEFAULT_WORKFLOW_ID.to_string(),
        }
    }

    /// The display name: the explicit name, else the id's `_`-separated
    /// words title-cased.
    pub fn resolved_name(&self) -> String {
        if let Some(name) = self.name.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            return name.to_string();
        }
        title_case(&self.resolved_id().split('_').collect::<Vec<_>>().join(" "))
    }
}
