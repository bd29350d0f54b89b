//! The unit of work behind a node.
//!
//! Real conversion happens in an external backend. The engine only needs to
//! know whether a node's work succeeded and which artifacts it produced.

use crate::pipeline::node::{NodeInstance, NodeOutputs};
use crate::types::ArtifactRef;
use thiserror::Error;

/// Failure reported by a node's operation.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{0}")]
pub struct OperationError(pub String);

impl OperationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Work performed when a node's progress reaches 100.
#[cfg_attr(test, mockall::automock)]
pub trait NodeOperation: Send {
    /// Run `node`. `Ok(Some(outputs))` replaces the node's outputs;
    /// `Ok(None)` leaves them as they are.
    fn run(&mut self, node: &NodeInstance) -> Result<Option<NodeOutputs>, OperationError>;
}

/// Stand-in for the conversion backend: always succeeds and produces one
/// placeholder artifact per output port.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimulatedOperation;

impl NodeOperation for SimulatedOperation {
    fn run(&mut self, node: &NodeInstance) -> Result<Option<NodeOutputs>, OperationError> {
        // Uploaded files already carry their artifact.
        if node.outputs.is_some() {
            return Ok(None);
        }
        let outputs = node
            .spec
            .outputs
            .iter()
            .map(|port| {
                let mime_type = port
                    .mime_types
                    .first()
                    .cloned()
                    .unwrap_or_else(|| crate::types::OCTET_STREAM.to_string());
                let artifact = ArtifactRef {
                    handle: format!("artifact://{}/{}", node.id, port.id),
                    name: format!("{}-{}", node.id, port.id),
                    mime_type,
                    size: 0,
                };
                (port.id.clone(), artifact)
            })
            .collect();
        Ok(Some(outputs))
    }
}
