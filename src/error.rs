use itertools::Itertools;
use thiserror::Error;

/// A single broken invariant found while validating a workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("Container '{0}' is declared more than once")]
    DuplicateContainerId(String),

    #[error("Node '{node_id}' is declared more than once (in container '{container_id}')")]
    DuplicateNodeId {
        node_id: String,
        container_id: String,
    },

    #[error("Container '{0}' has no nodes")]
    EmptyContainer(String),

    #[error("Workspace has no start node")]
    MissingStartNode,

    #[error("Workspace has {} start nodes: {}", .0.len(), .0.join(", "))]
    MultipleStartNodes(Vec<String>),

    #[error("Start node '{node_id}' must be the first node of container '{container_id}'")]
    StartNodeNotFirst {
        node_id: String,
        container_id: String,
    },

    #[error("Node '{node_id}' has an unregistered or invalid node type: '{type_name}'")]
    InvalidNodeType { node_id: String, type_name: String },

    #[error("Node '{node_id}' of type '{type_name}' has an invalid config: {message}")]
    InvalidNodeConfig {
        node_id: String,
        type_name: String,
        message: String,
    },

    #[error("Handle '{handle}' is declared more than once in container '{container_id}'")]
    DuplicateHandle {
        container_id: String,
        handle: String,
    },

    #[error("Edge {edge} leaves from unknown container '{container_id}'")]
    UnknownEdgeSource { edge: String, container_id: String },

    #[error("Edge {edge} points to unknown container '{container_id}'")]
    UnknownEdgeTarget { edge: String, container_id: String },

    #[error("Edge {edge} uses handle '{handle}', which does not exist in container '{container_id}'")]
    UnresolvedSourceHandle {
        edge: String,
        container_id: String,
        handle: String,
    },

    #[error("Container '{container_id}' has more than one edge for handle {}", .handle.as_deref().unwrap_or("<none>"))]
    DuplicateEdge {
        container_id: String,
        handle: Option<String>,
    },
}

/// Every violation found in a workspace, in discovery order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Workspace failed validation with {} violation(s): {}", .violations.len(), .violations.iter().join("; "))]
pub struct ValidationErrors {
    pub violations: Vec<Violation>,
}

impl ValidationErrors {
    pub fn len(&self) -> usize {
        self.violations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter()
    }

    pub fn contains(&self, violation: &Violation) -> bool {
        self.violations.contains(violation)
    }
}

/// Errors that can occur while loading and compiling a workspace.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error("Failed to parse workspace JSON: {0}")]
    JsonParseError(String),

    #[error(transparent)]
    Conversion(#[from] WorkspaceConversionError),

    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Usage errors raised when a caller drives a session incorrectly.
///
/// Runtime outcomes such as dead ends or I/O failures are not errors; they
/// terminate the session and are reported through a `terminated` event.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Session '{0}' is terminated and accepts no further input")]
    SessionTerminated(String),

    #[error("Event addressed to session '{found}' was delivered to session '{expected}'")]
    SessionMismatch { expected: String, found: String },

    #[error("Session '{0}' is not awaiting input")]
    NotAwaitingInput(String),

    #[error("Node '{node_id}' expects a {expected} event, but received a {found} event")]
    UnexpectedEvent {
        node_id: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Node '{node_id}' has no button with id '{button_id}'")]
    UnknownButton { node_id: String, button_id: String },

    #[error("Node '{node_id}' received {count} selected buttons, but {expected}")]
    InvalidSelectionCount {
        node_id: String,
        count: usize,
        expected: &'static str,
    },

    #[error("Snapshot was taken against workspace version '{found}', but the loaded version is '{expected}'")]
    WorkspaceVersionMismatch { expected: String, found: String },

    #[error("Position {container_id}[{node_index}] is not valid for this workspace: {message}")]
    InvalidPosition {
        container_id: String,
        node_index: usize,
        message: String,
    },
}

/// Errors that can occur when encoding or decoding a session snapshot.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    #[error("Snapshot deserialization failed: {0}")]
    Deserialization(String),
}

/// Errors that can occur when converting a custom editor format into a `WorkspaceDefinition`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceConversionError {
    #[error("Invalid custom data: {0}")]
    ValidationError(String),
}
