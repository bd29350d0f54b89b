//! Pipeline documents on disk and over the wire.
//!
//! - Export serializes the current pipeline to JSON under a name derived
//!   from the pipeline name.
//! - Import parses such a document and checks its integrity. Any failure is
//!   reported as a generic import error with the cause attached, and the
//!   caller's state is never touched.
//! - [`SaveSlots`] keeps previously saved pipelines in one JSON array file.

pub mod slots;

pub use slots::{SaveSlots, SavedPipelineSummary};

use crate::pipeline::error::PipelineError;
use crate::pipeline::id::PipelineId;
use crate::pipeline::model::Pipeline;
use thiserror::Error;

/// File name used when a pipeline name sanitizes to nothing.
pub const FALLBACK_EXPORT_NAME: &str = "pipeline.json";

/// Why an import was refused.
#[derive(Error, Debug)]
pub enum ImportCause {
    #[error("malformed document: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error(transparent)]
    Invalid(#[from] PipelineError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to import pipeline")]
    Import(#[source] ImportCause),

    #[error("No saved pipeline with id {0}")]
    NotFound(PipelineId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StorageError {
    /// Underlying import failure, if this is an import error.
    pub fn import_cause(&self) -> Option<&ImportCause> {
        match self {
            StorageError::Import(cause) => Some(cause),
            _ => None,
        }
    }
}

/// A serialized pipeline ready to be written out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedPipeline {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `My Pipeline (v2)` becomes `My_Pipeline__v2_.json`.
pub fn export_file_name(name: &str) -> String {
    if name.is_empty() {
        return FALLBACK_EXPORT_NAME.to_string();
    }
    let stem: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}.json", stem)
}

pub fn export_pipeline(pipeline: &Pipeline) -> Result<ExportedPipeline, StorageError> {
    let bytes = serde_json::to_vec_pretty(pipeline)?;
    let file_name = export_file_name(&pipeline.name);
    tracing::info!(
        "Exported pipeline {} as {} ({} bytes)",
        pipeline.id,
        file_name,
        bytes.len()
    );
    Ok(ExportedPipeline { file_name, bytes })
}

/// Parse and verify a pipeline document.
pub fn import_pipeline(bytes: &[u8]) -> Result<Pipeline, StorageError> {
    let pipeline: Pipeline = serde_json::from_slice(bytes)
        .map_err(|e| StorageError::Import(ImportCause::Malformed(e)))?;
    pipeline
        .check_integrity()
        .map_err(|e| StorageError::Import(ImportCause::Invalid(e)))?;
    tracing::info!(
        "Imported pipeline {} ('{}', {} nodes)",
        pipeline.id,
        pipeline.name,
        pipeline.nodes.len()
    );
    Ok(pipeline)
}
