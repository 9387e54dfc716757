use crate::error::CompileError;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// The complete, canonical definition of a designed flow, ready for compilation.
/// This is the target structure for any custom editor format conversion.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDefinition {
    pub name: String,
    /// Explicit version label. When absent, the compiled graph derives one
    /// from the definition's content.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default)]
    pub containers: Vec<ContainerDefinition>,
    #[serde(default)]
    pub edges: Vec<EdgeDefinition>,
}

/// An ordered run of nodes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerDefinition {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Editor layout only; ignored by execution.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<LayoutPosition>,
    #[serde(default)]
    pub nodes: Vec<NodeDefinition>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutPosition {
    pub x: f64,
    pub y: f64,
}

/// Defines a single step. `config` stays untyped until the compiler parses it
/// with the parser registered for `node_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// Defines a connection that leaves one container and enters another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    pub target: String,
}

impl WorkspaceDefinition {
    /// Parses a workspace document from JSON.
    pub fn from_json(json: &str) -> Result<Self, CompileError> {
        serde_json::from_str(json).map_err(|e| CompileError::JsonParseError(e.to_string()))
    }

    /// SHA-256 of the definition's JSON form, as lowercase hex.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(serde_json::to_vec(self).unwrap_or_default());
        format!("{:x}", hasher.finalize())
    }
}

impl NodeDefinition {
    pub fn new(id: &str, node_type: &str, config: serde_json::Value) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            config,
        }
    }
}

impl EdgeDefinition {
    pub fn new(source: &str, source_handle: Option<&str>, target: &str) -> Self {
        Self {
            id: None,
            source: source.to_string(),
            source_handle: source_handle.map(str::to_string),
            target: target.to_string(),
        }
    }

    /// A name for diagnostics: the declared id, or the edge's position in the list.
    pub(crate) fn label(&self, index: usize) -> String {
        match &self.id {
            Some(id) => format!("'{}'", id),
            None => format!("#{}", index),
        }
    }
}
