//! Node instances placed in a pipeline.
//!
//! A `NodeInstance` couples a shared, immutable `NodeSpec` with the mutable
//! per-instance state: canvas position, parameter values, execution state
//! and produced outputs.
//!
//! Execution state is a single tagged enum, so a progress value only exists
//! while a node is running and an error message only exists on failure.

use crate::pipeline::id::NodeId;
use crate::registry::NodeSpec;
use crate::types::{ArtifactRef, Position};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Produced artifacts keyed by output port id.
pub type NodeOutputs = BTreeMap<String, ArtifactRef>;

/// Execution state of one node.
///
/// Serialized inline into the node as `{"status": "running", "progress": 40.0}`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NodeState {
    #[default]
    Idle,
    Running {
        progress: f64,
    },
    Completed,
    Error {
        error: String,
    },
}

impl NodeState {
    pub fn status(&self) -> NodeStatus {
        match self {
            NodeState::Idle => NodeStatus::Idle,
            NodeState::Running { .. } => NodeStatus::Running,
            NodeState::Completed => NodeStatus::Completed,
            NodeState::Error { .. } => NodeStatus::Error,
        }
    }
}

/// Status label without payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStatus {
    Idle,
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeStatus::Idle => write!(f, "idle"),
            NodeStatus::Running => write!(f, "running"),
            NodeStatus::Completed => write!(f, "completed"),
            NodeStatus::Error => write!(f, "error"),
        }
    }
}

/// A placed, stateful occurrence of a node spec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInstance {
    pub id: NodeId,
    /// Shared template; never mutated through the instance.
    #[serde(rename = "nodeSpec")]
    pub spec: Arc<NodeSpec>,
    pub position: Position,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(flatten)]
    pub state: NodeState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<NodeOutputs>,
}

impl NodeInstance {
    /// New idle instance with every parameter set to its spec default.
    pub fn from_spec(spec: Arc<NodeSpec>, position: Position) -> Self {
        let parameters = spec
            .parameters
            .iter()
            .map(|p| (p.id.clone(), p.default_value.clone()))
            .collect();
        Self {
            id: NodeId::generate(&spec.id),
            spec,
            position,
            parameters,
            state: NodeState::Idle,
            outputs: None,
        }
    }

    pub fn spec_id(&self) -> &str {
        &self.spec.id
    }

    pub fn status(&self) -> NodeStatus {
        self.state.status()
    }

    /// Current progress. Completed nodes report 100.
    pub fn progress(&self) -> Option<f64> {
        match self.state {
            NodeState::Running { progress } => Some(progress),
            NodeState::Completed => Some(100.0),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            NodeState::Error { error } => Some(error),
            _ => None,
        }
    }

    pub fn output(&self, port_id: &str) -> Option<&ArtifactRef> {
        self.outputs.as_ref().and_then(|o| o.get(port_id))
    }
}
