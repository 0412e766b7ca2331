//! Flowsmith emission engine.
//!
//! Compiles a validated workflow graph into its deployable artifacts:
//!
//! - **[`view`]** -- The shared render view; every derived name is computed
//!   here once, via [`naming`].
//! - **[`emitter`]** -- The [`Emitter`] trait, one implementation per
//!   [`ArtifactKind`].
//! - **[`template`]** / **[`fragments`]** -- Handlebars emitters driven by
//!   per-category fragments with a generic fallback.
//! - **[`structured`]** -- JSON emitters for the config descriptor and the
//!   schema dump.
//! - **[`engine`]** -- Runs every emitter and isolates per-kind failures.
//! - **[`error`]** -- Emission error types via [`thiserror`].

pub mod artifact;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod fragments;
pub mod naming;
pub mod structured;
pub mod template;
pub mod view;

pub use artifact::{Artifact, ArtifactKind};
pub use emitter::Emitter;
pub use engine::{EmissionEngine, EmissionReport};
pub use error::{EmissionFailure, EmitError, Result};
pub use fragments::FragmentSet;
pub use structured::{ConfigDescriptorEmitter, SchemaDumpEmitter};
pub use template::TemplateEmitter;
pub use view::GraphView;
