use crate::error::SnapshotError;
use crate::variables::VariableStore;
use bincode::config::standard;
use bincode::serde::{decode_from_slice, encode_to_vec};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a session currently is: a container and the index of a node in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub container_id: String,
    pub node_index: usize,
}

impl Position {
    pub fn new(container_id: &str, node_index: usize) -> Self {
        Self {
            container_id: container_id.to_string(),
            node_index,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Running,
    /// Suspended at an input, button or I/O node.
    AwaitingInput,
    Terminated { reason: TerminationReason },
}

impl SessionStatus {
    pub fn is_terminated(&self) -> bool {
        matches!(self, SessionStatus::Terminated { .. })
    }
}

/// Why a session stopped. Reported through a `terminated` outbound event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TerminationReason {
    /// The flow ran out of nodes and edges.
    Completed,
    /// A condition matched no group and had nowhere to continue.
    #[serde(rename_all = "camelCase")]
    DeadEnd { node_id: String, detail: String },
    #[serde(rename_all = "camelCase")]
    IoFailure { node_id: String, error: String },
    StepLimitExceeded { limit: usize },
    Cancelled,
}

/// A live conversation. Only the `Executor` mutates it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub(crate) id: String,
    pub(crate) workspace_version: String,
    pub(crate) store: VariableStore,
    pub(crate) position: Position,
    pub(crate) status: SessionStatus,
}

impl Session {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn workspace_version(&self) -> &str {
        &self.workspace_version
    }

    pub fn variables(&self) -> &VariableStore {
        &self.store
    }

    pub fn variable(&self, name: &str) -> Option<&str> {
        self.store.get(name)
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn status(&self) -> &SessionStatus {
        &self.status
    }

    pub fn is_terminated(&self) -> bool {
        self.status.is_terminated()
    }

    pub fn termination_reason(&self) -> Option<&TerminationReason> {
        match &self.status {
            SessionStatus::Terminated { reason } => Some(reason),
            _ => None,
        }
    }

    /// Captures everything needed to resume this session later.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id.clone(),
            workspace_version: self.workspace_version.clone(),
            store_snapshot: self.store.snapshot(),
            position: self.position.clone(),
            status: self.status.clone(),
        }
    }
}

/// The persisted form of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: String,
    pub workspace_version: String,
    pub store_snapshot: BTreeMap<String, String>,
    pub position: Position,
    pub status: SessionStatus,
}

impl SessionSnapshot {
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string_pretty(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        serde_json::from_str(json).map_err(|e| SnapshotError::Deserialization(e.to_string()))
    }

    /// Encodes the snapshot in the compact bincode format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SnapshotError> {
        encode_to_vec(self, standard()).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, SnapshotError> {
        decode_from_slice(bytes, standard())
            .map(|(snapshot, _)| snapshot)
            .map_err(|e| SnapshotError::Deserialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SessionSnapshot {
        SessionSnapshot {
            session_id: "s-1".to_string(),
            workspace_version: "v1".to_string(),
            store_snapshot: BTreeMap::from([("name".to_string(), "Bob".to_string())]),
            position: Position::new("c2", 1),
            status: SessionStatus::Terminated {
                reason: TerminationReason::DeadEnd {
                    node_id: "cond".to_string(),
                    detail: "no group matched".to_string(),
                },
            },
        }
    }

    #[test]
    fn test_snapshot_json_uses_camel_case_keys() {
        let json = sample().to_json().unwrap();
        assert!(json.contains("\"sessionId\""));
        assert!(json.contains("\"storeSnapshot\""));
        assert!(json.contains("\"nodeIndex\": 1"));
        assert!(json.contains("\"nodeId\": \"cond\""));
    }

    #[test]
    fn test_snapshot_survives_bincode() {
        let snapshot = sample();
        let bytes = snapshot.to_bytes().unwrap();
        assert_eq!(SessionSnapshot::from_bytes(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_garbage_bytes_are_rejected() {
        let result = SessionSnapshot::from_bytes(&[0xff, 0xff, 0xff]);
        assert!(matches!(result, Err(SnapshotError::Deserialization(_))));
    }
}
