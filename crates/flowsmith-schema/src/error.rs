//! Schema error types.
//!
//! Every structural problem with a workflow surfaces through [`SchemaError`].
//! The four construction errors (`UnknownDependency`, `CyclicDependency`,
//! `InvalidParameter`, `DuplicateIdentifier`) are raised before a graph value
//! exists, so callers never observe a partially validated workflow.

use std::fmt;

/// Which namespace a duplicated identifier collided in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierScope {
    /// Two steps in the same workflow share an id.
    Step,
    /// Two parameters in the same step (or the global list) share a name.
    Parameter,
    /// A step lists the same predecessor twice.
    Dependency,
}

impl fmt::Display for IdentifierScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Step => write!(f, "step id"),
            Self::Parameter => write!(f, "parameter name"),
            Self::Dependency => write!(f, "dependency"),
        }
    }
}

/// Unified error type for the workflow schema.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    // -- Graph construction --------------------------------------------------
    /// A step names a predecessor that is not part of the graph.
    #[error("step `{step_id}` depends on unknown step `{missing_id}`")]
    UnknownDependency { step_id: String, missing_id: String },

    /// The dependency relation has no topological order.  `remaining` lists
    /// every step that could not be placed, in input order.
    #[error("cyclic dependency among steps: {}", .remaining.join(", "))]
    CyclicDependency { remaining: Vec<String> },

    /// A parameter definition breaks one of its own invariants.
    #[error("invalid parameter `{parameter}`{}: {reason}", owner_suffix(.owner.as_deref()))]
    InvalidParameter {
        /// The owning step, when known.  `None` for standalone or global
        /// parameters.
        owner: Option<String>,
        parameter: String,
        reason: String,
    },

    /// An identifier that must be unique was seen twice.
    #[error("duplicate {scope} `{id}` in {context}")]
    DuplicateIdentifier {
        scope: IdentifierScope,
        id: String,
        /// Where the collision happened (workflow id or step id).
        context: String,
    },

    /// A step definition is malformed (e.g. missing a required prompt block).
    #[error("invalid step `{step_id}`: {reason}")]
    InvalidStep { step_id: String, reason: String },

    /// Workflow metadata is unusable (e.g. empty id).
    #[error("invalid workflow metadata: {reason}")]
    InvalidMetadata { reason: String },

    // -- Lookup ---------------------------------------------------------------
    /// `step_by_id` was called with an id the graph does not contain.
    #[error("step not found: {step_id}")]
    StepNotFound { step_id: String },

    // -- Serialization --------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

fn owner_suffix(owner: Option<&str>) -> String {
    owner.map(|o| format!(" in step `{o}`")).unwrap_or_default()
}

impl SchemaError {
    /// Attach the owning step id to an `InvalidParameter` error.  Other
    /// variants pass through untouched.
    pub fn in_step(self, step_id: &str) -> Self {
        match self {
            Self::InvalidParameter {
                owner: None,
                parameter,
                reason,
            } => Self::InvalidParameter {
                owner: Some(step_id.to_string()),
                parameter,
                reason,
            },
            other => other,
        }
    }
}

/// Convenience alias used throughout the schema crate.
pub type Result<T> = std::result::Result<T, SchemaError>;
