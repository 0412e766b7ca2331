//! Emission error types.
//!
//! [`EmitError`] is what an individual emitter returns.  The engine never
//! propagates it for a single artifact kind; it records an
//! [`EmissionFailure`] instead and carries on with the other kinds.

use std::fmt;

use serde::Serialize;

use flowsmith_schema::SchemaError;

use crate::artifact::ArtifactKind;

/// Unified error type for the emission engine.
#[derive(Debug, thiserror::Error)]
pub enum EmitError {
    // -- Template errors ------------------------------------------------------
    /// A template or fragment failed to compile.
    #[error("template `{name}` does not compile: {reason}")]
    Template { name: String, reason: String },

    /// Rendering a compiled template failed.
    #[error("rendering `{template}` failed: {reason}")]
    Render { template: String, reason: String },

    // -- Input errors ---------------------------------------------------------
    /// Two distinct source names derive the same generated identifier.
    #[error("{scope} `{first}` and `{second}` both derive the identifier `{derived}`")]
    NameCollision {
        scope: String,
        first: String,
        second: String,
        derived: String,
    },

    /// The render view could not be derived from the graph.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// JSON serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the emit crate.
pub type Result<T> = std::result::Result<T, EmitError>;

/// A per-kind emission failure, as recorded in an emission report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmissionFailure {
    pub kind: ArtifactKind,
    /// The emitter's error message.
    pub detail: String,
}

impl EmissionFailure {
    pub fn new(kind: ArtifactKind, error: &EmitError) -> Self {
        Self {
            kind,
            detail: error.to_string(),
        }
    }
}

impl fmt::Display for EmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "emission of `{}` failed: {}", self.kind, self.detail)
    }
}

impl std::error::Error for EmissionFailure {}
