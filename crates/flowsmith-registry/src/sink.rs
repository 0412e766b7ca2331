//! Artifact sinks -- where deployed artifacts end up.
//!
//! The registry hands every emitted [`Artifact`] to an [`ArtifactSink`] and
//! records the location the sink reports back.  [`FilesystemSink`] writes
//! `<root>/<workflow_id>/<file_name>`; [`MemorySink`] keeps everything in a
//! map and is what tests use.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info, instrument, warn};

use flowsmith_emit::{Artifact, ArtifactKind};
use flowsmith_schema::WorkflowGraph;

use crate::error::{RegistryError, Result};

/// Storage collaborator for deployed artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Store one artifact and return where it landed.
    async fn store(&self, workflow_id: &str, artifact: &Artifact) -> Result<String>;
}

// ---------------------------------------------------------------------------
// FilesystemSink
// ---------------------------------------------------------------------------

/// Writes artifacts under a root directory, one sub-directory per workflow.
#[derive(Debug, Clone)]
pub struct FilesystemSink {
    root: PathBuf,
}

impl FilesystemSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the artifacts of `workflow_id`.
    ///
    /// The id becomes a single path component, so separators and `..` are
    /// refused.
    pub fn workflow_dir(&self, workflow_id: &str) -> Result<PathBuf> {
        if workflow_id.is_empty()
            || workflow_id == "."
            || workflow_id == ".."
            || workflow_id.contains(['/', '\\'])
        {
            return Err(RegistryError::Storage {
                location: self.root.display().to_string(),
                reason: format!("workflow id `{workflow_id}` is not a valid directory name"),
            });
        }
        Ok(self.root.join(workflow_id))
    }

    /// Load every `<root>/*/schema.json` that parses as a workflow graph.
    ///
    /// Unreadable or invalid dumps are skipped with a warning.  A missing
    /// root yields an empty list.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub async fn load_schemas(&self) -> Result<Vec<WorkflowGraph>> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let schema_file = ArtifactKind::SchemaDump.file_name("");
        let mut graphs = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path().join(&schema_file);
            if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
                continue;
            }
            let text = match tokio::fs::read_to_string(&path).await {
                Ok(text) => text,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "unreadable schema dump skipped");
                    continue;
                }
            };
            match WorkflowGraph::from_json(&text) {
                Ok(graph) => graphs.push(graph),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "invalid schema dump skipped");
                }
            }
        }

        graphs.sort_by(|a, b| a.id().cmp(b.id()));
        debug!(count = graphs.len(), "schema dumps loaded");
        Ok(graphs)
    }
}

#[async_trait]
impl ArtifactSink for FilesystemSink {
    #[instrument(skip(self, artifact), fields(kind = %artifact.kind, file = %artifact.file_name))]
    async fn store(&self, workflow_id: &str, artifact: &Artifact) -> Result<String> {
        let dir = self.workflow_dir(workflow_id)?;
        let path = dir.join(&artifact.file_name);

        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| RegistryError::Storage {
                location: dir.display().to_string(),
                reason: e.to_string(),
            })?;
        tokio::fs::write(&path, artifact.content.as_bytes())
            .await
            .map_err(|e| RegistryError::Storage {
                location: path.display().to_string(),
                reason: e.to_string(),
            })?;

        info!(workflow_id, path = %path.display(), bytes = artifact.content.len(), "artifact stored");
        Ok(path.display().to_string())
    }
}

// ---------------------------------------------------------------------------
// MemorySink
// ---------------------------------------------------------------------------

/// In-memory sink keyed by `<workflow_id>/<file_name>`.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    files: Arc<DashMap<String, String>>,
}

impl MemorySink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, workflow_id: &str, file_name: &str) -> Option<String> {
        self.files
            .get(&format!("{workflow_id}/{file_name}"))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn store(&self, workflow_id: &str, artifact: &Artifact) -> Result<String> {
        let key = format!("{workflow_id}/{}", artifact.file_name);
        self.files.insert(key.clone(), artifact.content.clone());
        debug!(key = %key, "artifact stored in memory");
        Ok(format!("memory://{key}"))
    }
}
