//! Directed edges between node ports.

use crate::pipeline::id::{ConnectionId, NodeId};
use serde::{Deserialize, Serialize};

/// A validated edge from one node's output port to another's input port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: ConnectionId,
    pub source: NodeId,
    pub source_port: String,
    pub target: NodeId,
    pub target_port: String,
    /// Result of the admission check at insertion time.
    #[serde(default)]
    pub validated: bool,
}

impl Connection {
    pub fn touches(&self, node_id: &NodeId) -> bool {
        &self.source == node_id || &self.target == node_id
    }

    pub fn targets(&self, node_id: &NodeId, port_id: &str) -> bool {
        &self.target == node_id && self.target_port == port_id
    }
}

/// A proposed edge, not yet admitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub source: NodeId,
    pub source_port: String,
    pub target: NodeId,
    pub target_port: String,
}

impl ConnectionRequest {
    pub fn new(
        source: impl Into<NodeId>,
        source_port: impl Into<String>,
        target: impl Into<NodeId>,
        target_port: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_port: source_port.into(),
            target: target.into(),
            target_port: target_port.into(),
        }
    }

    /// Materialize as an admitted connection under a fresh id.
    pub(crate) fn admit(self) -> Connection {
        Connection {
            id: ConnectionId::generate(),
            source: self.source,
            source_port: self.source_port,
            target: self.target,
            target_port: self.target_port,
            validated: true,
        }
    }
}

impl From<&Connection> for ConnectionRequest {
    fn from(conn: &Connection) -> Self {
        Self {
            source: conn.source.clone(),
            source_port: conn.source_port.clone(),
            target: conn.target.clone(),
            target_port: conn.target_port.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admit_marks_validated() {
        let conn = ConnectionRequest::new("a", "output", "b", "input").admit();
        assert!(conn.validated);
        assert!(conn.id.as_str().starts_with("conn-"));
        assert!(conn.touches(&NodeId::new("a")));
        assert!(conn.targets(&NodeId::new("b"), "input"));
        assert!(!conn.targets(&NodeId::new("b"), "output"));
    }

    #[test]
    fn test_serialized_field_names() {
        let conn = ConnectionRequest::new("a", "out", "b", "in").admit();
        let value = serde_json::to_value(&conn).unwrap();
        assert_eq!(value["sourcePort"], "out");
        assert_eq!(value["targetPort"], "in");
        assert_eq!(value["validated"], true);
    }
}
