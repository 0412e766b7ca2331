//! Workflow registry for Flowsmith.
//!
//! - [`request`]: task-list requests and id/name derivation
//! - [`registry`]: the concurrent workflow store, creation and deployment
//! - [`sink`]: storage collaborators for deployed artifacts

pub mod error;
pub mod registry;
pub mod request;
pub mod sink;

pub use error::{RegistryError, Result};
pub use registry::{DEFAULT_CATEGORY, DeployReport, WorkflowRegistry, WorkflowSummary};
pub use request::{DEFAULT_WORKFLOW_ID, GENERATED_AUTHOR, WorkflowRequest};
pub use sink::{ArtifactSink, FilesystemSink, MemorySink};
