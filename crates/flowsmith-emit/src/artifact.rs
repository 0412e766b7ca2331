//! Artifact kinds and generated artifacts.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The kinds of artifact a workflow compiles to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
    /// Python plugin exposing one endpoint per step.
    ServerHandler,
    /// React component that walks the user through the steps.
    ClientView,
    /// Registration descriptor for the host application.
    ConfigDescriptor,
    /// Lossless JSON form of the graph.
    SchemaDump,
    /// Python snippet that registers the plugin and its routes with the
    /// host API server.
    HostIntegration,
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 5] = [
        Self::ServerHandler,
        Self::ClientView,
        Self::ConfigDescriptor,
        Self::SchemaDump,
        Self::HostIntegration,
    ];

    /// Registration name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ServerHandler => "server-handler",
            Self::ClientView => "client-view",
            Self::ConfigDescriptor => "config-descriptor",
            Self::SchemaDump => "schema-dump",
            Self::HostIntegration => "host-integration",
        }
    }

    /// File name of this artifact inside the workflow's directory.
    pub fn file_name(self, workflow_id: &str) -> String {
        match self {
            Self::ServerHandler => format!("{workflow_id}_plugin.py"),
            Self::ClientView => format!("{workflow_id}_workflow.tsx"),
            Self::ConfigDescriptor => "config.json".to_string(),
            Self::SchemaDump => "schema.json".to_string(),
            Self::HostIntegration => format!("{workflow_id}_integration.py"),
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown artifact kind: {s}"))
    }
}

/// One generated file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub file_name: String,
    pub content: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in ArtifactKind::ALL {
            assert_eq!(kind.as_str().parse::<ArtifactKind>().unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
        assert!("pdf".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn file_names() {
        assert_eq!(ArtifactKind::ServerHandler.file_name("dq"), "dq_plugin.py");
        assert_eq!(ArtifactKind::ClientView.file_name("dq"), "dq_workflow.tsx");
        assert_eq!(ArtifactKind::ConfigDescriptor.file_name("dq"), "config.json");
        assert_eq!(ArtifactKind::HostIntegration.file_name("dq"), "dq_integration.py");
    }
}
