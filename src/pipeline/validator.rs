//! Admission control for proposed connections.
//!
//! Checks run in a fixed order and stop at the first failure:
//!
//! 1. both endpoints exist, with the ports on the correct side
//! 2. the port MIME sets intersect (see [`crate::pipeline::port`])
//! 3. a single-cardinality input does not already have an edge
//! 4. the new edge does not close a directed cycle

use crate::pipeline::connection::ConnectionRequest;
use crate::pipeline::id::NodeId;
use crate::pipeline::model::Pipeline;
use crate::pipeline::port::mime_sets_intersect;
use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

/// Why a proposed connection was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConnectionRejection {
    #[error("Source node {0} does not exist")]
    UnknownSourceNode(NodeId),

    #[error("Target node {0} does not exist")]
    UnknownTargetNode(NodeId),

    #[error("Node {node} has no output port '{port}'")]
    UnknownSourcePort { node: NodeId, port: String },

    #[error("Node {node} has no input port '{port}'")]
    UnknownTargetPort { node: NodeId, port: String },

    #[error("Incompatible formats: {output_types:?} cannot feed {input_types:?}")]
    IncompatibleFormats {
        output_types: Vec<String>,
        input_types: Vec<String>,
    },

    #[error("Input port '{port}' on node {node} accepts a single connection")]
    PortOccupied { node: NodeId, port: String },

    #[error("Connection would create a cycle")]
    WouldCreateCycle,
}

/// Reason code surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RejectionReason {
    /// Missing node or port.
    Endpoint,
    IncompatibleFormat,
    Cardinality,
    Cycle,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Endpoint => "endpoint",
            RejectionReason::IncompatibleFormat => "incompatible-format",
            RejectionReason::Cardinality => "cardinality",
            RejectionReason::Cycle => "cycle",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ConnectionRejection {
    pub fn reason(&self) -> RejectionReason {
        match self {
            ConnectionRejection::UnknownSourceNode(_)
            | ConnectionRejection::UnknownTargetNode(_)
            | ConnectionRejection::UnknownSourcePort { .. }
            | ConnectionRejection::UnknownTargetPort { .. } => RejectionReason::Endpoint,
            ConnectionRejection::IncompatibleFormats { .. } => RejectionReason::IncompatibleFormat,
            ConnectionRejection::PortOccupied { .. } => RejectionReason::Cardinality,
            ConnectionRejection::WouldCreateCycle => RejectionReason::Cycle,
        }
    }
}

/// Read-only validator over the current connection set of a pipeline.
pub struct ConnectionValidator<'a> {
    pipeline: &'a Pipeline,
}

impl<'a> ConnectionValidator<'a> {
    pub fn new(pipeline: &'a Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn is_valid(&self, request: &ConnectionRequest) -> bool {
        self.explain(request).is_ok()
    }

    /// Run every check in order and report the first failure.
    pub fn explain(&self, request: &ConnectionRequest) -> Result<(), ConnectionRejection> {
        let source = self
            .pipeline
            .node(&request.source)
            .ok_or_else(|| ConnectionRejection::UnknownSourceNode(request.source.clone()))?;
        let target = self
            .pipeline
            .node(&request.target)
            .ok_or_else(|| ConnectionRejection::UnknownTargetNode(request.target.clone()))?;

        let output = source.spec.output(&request.source_port).ok_or_else(|| {
            ConnectionRejection::UnknownSourcePort {
                node: request.source.clone(),
                port: request.source_port.clone(),
            }
        })?;
        let input = target.spec.input(&request.target_port).ok_or_else(|| {
            ConnectionRejection::UnknownTargetPort {
                node: request.target.clone(),
                port: request.target_port.clone(),
            }
        })?;

        if !mime_sets_intersect(&output.mime_types, &input.mime_types) {
            return Err(ConnectionRejection::IncompatibleFormats {
                output_types: output.mime_types.clone(),
                input_types: input.mime_types.clone(),
            });
        }

        if !input.multiple
            && self
                .pipeline
                .connections
                .iter()
                .any(|c| c.targets(&request.target, &request.target_port))
        {
            return Err(ConnectionRejection::PortOccupied {
                node: request.target.clone(),
                port: request.target_port.clone(),
            });
        }

        if self.would_create_cycle(&request.source, &request.target) {
            return Err(ConnectionRejection::WouldCreateCycle);
        }

        Ok(())
    }

    /// Adding `from -> to` closes a cycle iff `to` already reaches `from`.
    /// A self-edge counts as a cycle.
    pub fn would_create_cycle(&self, from: &NodeId, to: &NodeId) -> bool {
        let mut visited: HashSet<&NodeId> = HashSet::new();
        let mut stack = vec![to];

        while let Some(current) = stack.pop() {
            if current == from {
                return true;
            }
            if !visited.insert(current) {
                continue;
            }
            for conn in &self.pipeline.connections {
                if &conn.source == current {
                    stack.push(&conn.target);
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::NodeInstance;
    use crate::registry::NodeRegistry;
    use crate::types::Position;

    fn pipeline_with(specs: &[&str]) -> (Pipeline, Vec<NodeId>) {
        let registry = NodeRegistry::builtin();
        let mut pipeline = Pipeline::new("test");
        let ids = specs
            .iter()
            .map(|spec_id| {
                let node = NodeInstance::from_spec(
                    registry.find_spec(spec_id).unwrap(),
                    Position::default(),
                );
                let id = node.id.clone();
                pipeline.nodes.push(node);
                id
            })
            .collect();
        (pipeline, ids)
    }

    fn connect(pipeline: &mut Pipeline, req: ConnectionRequest) {
        ConnectionValidator::new(pipeline).explain(&req).unwrap();
        pipeline.connections.push(req.admit());
    }

    #[test]
    fn test_wildcard_output_feeds_image_input() {
        let (pipeline, ids) = pipeline_with(&["file-input", "image-resize"]);
        let req = ConnectionRequest::new(ids[0].clone(), "output", ids[1].clone(), "input");
        assert!(ConnectionValidator::new(&pipeline).is_valid(&req));
    }

    #[test]
    fn test_missing_ports_are_endpoint_errors() {
        let (pipeline, ids) = pipeline_with(&["file-input", "image-resize"]);
        let validator = ConnectionValidator::new(&pipeline);

        let into_file_input =
            ConnectionRequest::new(ids[1].clone(), "output", ids[0].clone(), "input");
        let err = validator.explain(&into_file_input).unwrap_err();
        assert!(matches!(err, ConnectionRejection::UnknownTargetPort { .. }));
        assert_eq!(err.reason(), RejectionReason::Endpoint);

        let ghost = ConnectionRequest::new("ghost", "output", ids[1].clone(), "input");
        assert!(matches!(
            validator.explain(&ghost),
            Err(ConnectionRejection::UnknownSourceNode(_))
        ));
    }

    #[test]
    fn test_incompatible_formats() {
        let (pipeline, ids) = pipeline_with(&["video-to-gif", "audio-convert"]);
        let req = ConnectionRequest::new(ids[0].clone(), "output", ids[1].clone(), "input");
        let err = ConnectionValidator::new(&pipeline).explain(&req).unwrap_err();
        assert_eq!(err.reason(), RejectionReason::IncompatibleFormat);
    }

    #[test]
    fn test_single_input_cardinality() {
        let (mut pipeline, ids) = pipeline_with(&["file-input", "file-input", "image-resize"]);
        connect(
            &mut pipeline,
            ConnectionRequest::new(ids[0].clone(), "output", ids[2].clone(), "input"),
        );
        let second = ConnectionRequest::new(ids[1].clone(), "output", ids[2].clone(), "input");
        let err = ConnectionValidator::new(&pipeline)
            .explain(&second)
            .unwrap_err();
        assert_eq!(err.reason(), RejectionReason::Cardinality);
    }

    #[test]
    fn test_cycle_rejected() {
        let (mut pipeline, ids) = pipeline_with(&["ai-translate", "ai-translate", "ai-translate"]);
        connect(
            &mut pipeline,
            ConnectionRequest::new(ids[0].clone(), "output", ids[1].clone(), "input"),
        );
        connect(
            &mut pipeline,
            ConnectionRequest::new(ids[1].clone(), "output", ids[2].clone(), "input"),
        );
        let back = ConnectionRequest::new(ids[2].clone(), "output", ids[0].clone(), "input");
        let err = ConnectionValidator::new(&pipeline).explain(&back).unwrap_err();
        assert_eq!(err, ConnectionRejection::WouldCreateCycle);
    }

    #[test]
    fn test_self_edge_is_cycle() {
        let (pipeline, ids) = pipeline_with(&["ai-translate"]);
        let req = ConnectionRequest::new(ids[0].clone(), "output", ids[0].clone(), "input");
        assert_eq!(
            ConnectionValidator::new(&pipeline).explain(&req),
            Err(ConnectionRejection::WouldCreateCycle)
        );
    }

    #[test]
    fn test_reason_codes() {
        assert_eq!(RejectionReason::IncompatibleFormat.to_string(), "incompatible-format");
        assert_eq!(
            serde_json::to_string(&RejectionReason::Cycle).unwrap(),
            "\"cycle\""
        );
    }
}
