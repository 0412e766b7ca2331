//! Flowsmith workflow schema.
//!
//! Typed models for compiled workflows and the rules that keep them sound:
//!
//! - **[`parameter`]** -- Typed input fields with select options, defaults,
//!   and validation rules.
//! - **[`step`]** -- Step definitions, the closed [`StepCategory`] set, and
//!   the tagged per-category configuration payload.
//! - **[`graph`]** -- The immutable, validated [`WorkflowGraph`] plus its
//!   JSON and JSON Schema forms.
//! - **[`order`]** -- Wave layering of a graph into an [`ExecutionBatch`].
//! - **[`catalog`]** -- Built-in reference workflows.
//! - **[`error`]** -- Unified schema error types via [`thiserror`].
//!
//! A graph that exists has already passed every structural check: unknown
//! dependencies, cycles, duplicate identifiers, and malformed parameters are
//! all rejected at construction.

pub mod catalog;
pub mod error;
pub mod graph;
pub mod order;
pub mod parameter;
pub mod step;

// Re-export the most commonly used types at the crate root for convenience.
pub use error::{IdentifierScope, Result, SchemaError};
pub use graph::{WorkflowDocument, WorkflowGraph, WorkflowMetadata, WorkflowSettings};
pub use order::ExecutionBatch;
pub use parameter::{ParameterBuilder, ParameterDefinition, ParameterKind, RuleKind, ValidationRule};
pub use step::{PromptConfig, ResponseFormat, StepCategory, StepConfig, StepDefinition};
