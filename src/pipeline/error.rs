//! Pipeline-specific error types.

use crate::pipeline::id::NodeId;
use crate::pipeline::validator::ConnectionRejection;
use thiserror::Error;

/// Validation and admission errors raised by graph mutations.
///
/// Every variant is reported before anything is written, so the graph is
/// left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    #[error("Unknown node spec: {0}")]
    UnknownSpec(String),

    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),

    #[error("Node spec '{spec_id}' has no parameter '{parameter}'")]
    UnknownParameter { spec_id: String, parameter: String },

    #[error("Invalid value for parameter '{parameter}': {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("Connection rejected: {0}")]
    ConnectionRejected(#[from] ConnectionRejection),

    #[error("Pipeline integrity violation: {0}")]
    Integrity(String),

    #[error("Registry has no file-input node spec")]
    MissingFileInputSpec,
}

impl PipelineError {
    /// Name of the offending parameter, for parameter errors.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            PipelineError::UnknownParameter { parameter, .. }
            | PipelineError::InvalidParameter { parameter, .. } => Some(parameter),
            _ => None,
        }
    }
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
