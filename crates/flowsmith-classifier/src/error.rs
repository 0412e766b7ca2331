//! Classifier error types.

use flowsmith_schema::{SchemaError, StepCategory};

/// Unified error type for the step classifier.
#[derive(Debug, thiserror::Error)]
pub enum ClassifierError {
    // -- Table errors ---------------------------------------------------------
    /// A keyword table entry is empty and would match every description.
    #[error("empty keyword in `{category}` rule")]
    EmptyKeyword { category: StepCategory },

    /// The same category appears in two rules.
    #[error("category `{category}` listed twice in keyword table")]
    DuplicateCategory { category: StepCategory },

    /// Building the matching automaton failed.
    #[error("classifier build error: {reason}")]
    Build { reason: String },

    // -- Inference errors -----------------------------------------------------
    /// An inferred parameter or step failed schema validation.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Convenience alias used throughout the classifier crate.
pub type Result<T> = std::result::Result<T, ClassifierError>;
