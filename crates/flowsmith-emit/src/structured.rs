//! Emitters whose output is structured JSON rather than template text.

use serde_json::json;

use crate::artifact::ArtifactKind;
use crate::emitter::Emitter;
use crate::error::Result;
use crate::view::GraphView;

/// Host-application registration descriptor (`config.json`).
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigDescriptorEmitter;

impl Emitter for ConfigDescriptorEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::ConfigDescriptor
    }

    fn emit(&self, view: &GraphView<'_>) -> Result<String> {
        let steps: Vec<_> = view
            .steps
            .iter()
            .map(|s| {
                json!({
                    "id": s.id,
                    "name": s.name,
                    "description": s.description,
                })
            })
            .collect();

        let descriptor = json!({
            "id": view.workflow_id,
            "name": view.name,
            "description": view.description,
            "category": view.category,
            "plugin_class": format!("{}.plugin_instance", view.module_name),
            "steps": steps,
        });
        Ok(serde_json::to_string_pretty(&descriptor)?)
    }
}

/// Lossless JSON dump of the graph (`schema.json`).  Loading it back with
/// `WorkflowGraph::from_json` yields an equal graph.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaDumpEmitter;

impl Emitter for SchemaDumpEmitter {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::SchemaDump
    }

    fn emit(&self, view: &GraphView<'_>) -> Result<String> {
        Ok(view.source().to_json()?)
    }
}
