//! The emitter contract.
//!
//! An [`Emitter`] turns the shared [`GraphView`] into the text of one
//! artifact kind.  Emitters must be pure: the same view always yields the
//! same text, with no timestamps or random identifiers.

use crate::artifact::ArtifactKind;
use crate::error::Result;
use crate::view::GraphView;

/// Renders one artifact kind.
pub trait Emitter: Send + Sync {
    /// The artifact kind this emitter produces.
    fn kind(&self) -> ArtifactKind;

    /// File name of the artifact for `workflow_id`.
    fn file_name(&self, workflow_id: &str) -> String {
        self.kind().file_name(workflow_id)
    }

    /// Render the artifact text.
    fn emit(&self, view: &GraphView<'_>) -> Result<String>;
}
