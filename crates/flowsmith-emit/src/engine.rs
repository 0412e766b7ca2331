//! The emission engine.
//!
//! Holds one emitter per [`ArtifactKind`] and runs all of them against a
//! single [`GraphView`].  A failing emitter never stops the others: its
//! error is recorded as an [`EmissionFailure`] in the report.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info, warn};

use flowsmith_schema::WorkflowGraph;

use crate::artifact::{Artifact, ArtifactKind};
use crate::emitter::Emitter;
use crate::error::{EmissionFailure, Result};
use crate::structured::{ConfigDescriptorEmitter, SchemaDumpEmitter};
use crate::template::TemplateEmitter;
use crate::view::GraphView;

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Per-kind outcome of one emission run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EmissionReport {
    pub workflow_id: String,
    pub artifacts: BTreeMap<ArtifactKind, Artifact>,
    pub failures: BTreeMap<ArtifactKind, EmissionFailure>,
}

impl EmissionReport {
    /// Whether every registered kind succeeded.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.get(&kind)
    }

    pub fn failure(&self, kind: ArtifactKind) -> Option<&EmissionFailure> {
        self.failures.get(&kind)
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Registry of emitters keyed by artifact kind.
pub struct EmissionEngine {
    emitters: BTreeMap<ArtifactKind, Box<dyn Emitter>>,
}

impl EmissionEngine {
    /// Create an engine with no emitters.
    #[must_use]
    pub fn new() -> Self {
        Self {
            emitters: BTreeMap::new(),
        }
    }

    /// Create an engine with the five built-in targets.
    pub fn with_default_targets() -> Result<Self> {
        let mut engine = Self::new();
        engine.register(Box::new(TemplateEmitter::server_handler()?));
        engine.register(Box::new(TemplateEmitter::client_view()?));
        engine.register(Box::new(ConfigDescriptorEmitter));
        engine.register(Box::new(SchemaDumpEmitter));
        engine.register(Box::new(TemplateEmitter::host_integration()?));
        Ok(engine)
    }

    /// Register an emitter under its kind, replacing any previous one.
    ///
    /// Returns the replaced emitter, if any.
    pub fn register(&mut self, emitter: Box<dyn Emitter>) -> Option<Box<dyn Emitter>> {
        let kind = emitter.kind();
        let previous = self.emitters.insert(kind, emitter);
        if previous.is_some() {
            warn!(kind = %kind, "emitter replaced");
        } else {
            debug!(kind = %kind, "emitter registered");
        }
        previous
    }

    /// Registered kinds, in kind order.
    pub fn kinds(&self) -> impl Iterator<Item = ArtifactKind> + '_ {
        self.emitters.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.emitters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emitters.is_empty()
    }

    /// Run every emitter against `graph`.
    ///
    /// Returns `Err` only when the shared render view cannot be built; each
    /// emitter's own failure lands in the report.
    pub fn emit(&self, graph: &WorkflowGraph) -> Result<EmissionReport> {
        let view = GraphView::new(graph)?;
        let mut report = EmissionReport {
            workflow_id: view.workflow_id.clone(),
            ..EmissionReport::default()
        };

        for (&kind, emitter) in &self.emitters {
            match emitter.emit(&view) {
                Ok(content) => {
                    let file_name = emitter.file_name(&view.workflow_id);
                    debug!(workflow_id = %view.workflow_id, kind = %kind, bytes = content.len(), "artifact emitted");
                    report.artifacts.insert(
                        kind,
                        Artifact {
                            kind,
                            file_name,
                            content,
                        },
                    );
                }
                Err(e) => {
                    warn!(workflow_id = %view.workflow_id, kind = %kind, error = %e, "emission failed");
                    report.failures.insert(kind, EmissionFailure::new(kind, &e));
                }
            }
        }

        info!(
            workflow_id = %report.workflow_id,
            emitted = report.artifacts.len(),
            failed = report.failures.len(),
            "workflow emitted"
        );

        Ok(report)
    }
}

impl Default for EmissionEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmitError;
    use flowsmith_schema::catalog;

    struct Broken;

    impl Emitter for Broken {
        fn kind(&self) -> ArtifactKind {
            ArtifactKind::ClientView
        }

        fn emit(&self, _view: &GraphView<'_>) -> Result<String> {
            Err(EmitError::Render {
                template: "client-view/document".into(),
                reason: "boom".into(),
            })
        }
    }

    #[test]
    fn failing_emitter_does_not_block_others() {
        let mut engine = EmissionEngine::new();
        engine.register(Box::new(ConfigDescriptorEmitter));
        engine.register(Box::new(Broken));

        let graph = catalog::dq_testing().unwrap();
        let report = engine.emit(&graph).unwrap();

        assert!(!report.is_complete());
        let config = report.artifact(ArtifactKind::ConfigDescriptor).unwrap();
        assert_eq!(config.file_name, "config.json");

        let failure = report.failure(ArtifactKind::ClientView).unwrap();
        assert_eq!(failure.kind, ArtifactKind::ClientView);
        assert!(failure.detail.contains("boom"));
        assert!(report.artifact(ArtifactKind::ClientView).is_none());
    }

    #[test]
    fn registering_twice_replaces() {
        let mut engine = EmissionEngine::new();
        assert!(engine.register(Box::new(SchemaDumpEmitter)).is_none());
        assert!(engine.register(Box::new(SchemaDumpEmitter)).is_some());
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn default_targets_emit_five_files() {
        let engine = EmissionEngine::with_default_targets().unwrap();
        assert_eq!(engine.kinds().collect::<Vec<_>>(), ArtifactKind::ALL.to_vec());

        let graph = catalog::ai_web_testing().unwrap();
        let report = engine.emit(&graph).unwrap();
        assert!(report.is_complete(), "failures: {:?}", report.failures);

        let names: Vec<&str> = report.artifacts.values().map(|a| a.file_name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "ai_web_testing_plugin.py",
                "ai_web_testing_workflow.tsx",
                "config.json",
                "schema.json",
                "ai_web_testing_integration.py",
            ]
        );
    }

    #[test]
    fn repeated_emission_is_identical() {
        let engine = EmissionEngine::with_default_targets().unwrap();
        let graph = catalog::dq_testing().unwrap();
        let first = engine.emit(&graph).unwrap();
        let second = engine.emit(&graph).unwrap();
        assert_eq!(first.artifacts, second.artifacts);
    }
}
