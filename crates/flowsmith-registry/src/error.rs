//! Registry error types.

use flowsmith_classifier::ClassifierError;
use flowsmith_emit::EmitError;
use flowsmith_schema::SchemaError;

/// Unified error type for the workflow registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    // -- Lookup errors --------------------------------------------------------
    /// No workflow with this id is registered.
    #[error("unknown workflow: {workflow_id}")]
    UnknownWorkflow { workflow_id: String },

    // -- Request errors -------------------------------------------------------
    /// A workflow request carried no tasks.
    #[error("workflow request has no tasks")]
    EmptyTaskList,

    /// A workflow request is malformed (blank task, override for a step that
    /// does not exist).
    #[error("invalid workflow request: {reason}")]
    InvalidRequest { reason: String },

    // -- Storage errors -------------------------------------------------------
    /// The artifact sink refused or failed to store an artifact.
    #[error("storage error at `{location}`: {reason}")]
    Storage { location: String, reason: String },

    /// An I/O operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // -- Upstream errors ------------------------------------------------------
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Classifier(#[from] ClassifierError),

    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Convenience alias used throughout the registry crate.
pub type Result<T> = std::result::Result<T, RegistryError>;
