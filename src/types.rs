//! Core value types shared across the engine.
//!
//! # Main Types
//!
//! - [`Position`] - Canvas coordinates of a node
//! - [`IncomingFile`] - A file handed over by the file-picking collaborator
//! - [`UploadedFile`] - The engine's record of an ingested file
//! - [`ArtifactRef`] - Reference to a produced or uploaded artifact, stored in
//!   a node's `outputs`
//!
//! File contents never pass through the engine. Files are addressed by an
//! opaque `handle` string owned by whatever storage the host uses.

use crate::pipeline::id::FileId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fallback MIME type for files without a usable type.
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Node position on the editing canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Reference to an artifact sitting behind an output port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactRef {
    /// Opaque content handle.
    pub handle: String,
    pub name: String,
    pub mime_type: String,
    pub size: u64,
}

/// `{name, size, mimeType, contentHandle}` as delivered by a file picker
/// or drag-and-drop source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingFile {
    pub name: String,
    pub size: u64,
    #[serde(default)]
    pub mime_type: String,
    pub content_handle: String,
}

impl IncomingFile {
    pub fn new(
        name: impl Into<String>,
        size: u64,
        mime_type: impl Into<String>,
        content_handle: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            size,
            mime_type: mime_type.into(),
            content_handle: content_handle.into(),
        }
    }
}

/// An ingested file, kept in the editor's upload list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub id: FileId,
    pub name: String,
    pub size: u64,
    pub mime_type: String,
    pub content_handle: String,
    pub uploaded_at: DateTime<Utc>,
}

impl UploadedFile {
    /// Record an incoming file under a fresh id, normalizing its MIME type.
    pub fn ingest(file: IncomingFile) -> Self {
        Self {
            id: FileId::generate(),
            mime_type: normalize_mime(&file.mime_type),
            name: file.name,
            size: file.size,
            content_handle: file.content_handle,
            uploaded_at: Utc::now(),
        }
    }

    /// Artifact placed on the file-input node's output port.
    pub fn artifact(&self) -> ArtifactRef {
        ArtifactRef {
            handle: self.content_handle.clone(),
            name: self.name.clone(),
            mime_type: self.mime_type.clone(),
            size: self.size,
        }
    }
}

/// Parse a MIME string with the `mime` crate; empty or malformed input
/// becomes `application/octet-stream`.
pub fn normalize_mime(raw: &str) -> String {
    match raw.trim().parse::<mime::Mime>() {
        Ok(parsed) => parsed.essence_str().to_string(),
        Err(_) => OCTET_STREAM.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_mime() {
        assert_eq!(normalize_mime("image/png"), "image/png");
        assert_eq!(normalize_mime("text/plain; charset=utf-8"), "text/plain");
        assert_eq!(normalize_mime(""), OCTET_STREAM);
        assert_eq!(normalize_mime("not a mime"), OCTET_STREAM);
    }

    #[test]
    fn test_ingest_builds_artifact() {
        let upload = UploadedFile::ingest(IncomingFile::new("a.pdf", 42, "", "blob:1"));
        assert!(upload.id.as_str().starts_with("file-"));
        assert_eq!(upload.mime_type, OCTET_STREAM);

        let artifact = upload.artifact();
        assert_eq!(artifact.handle, "blob:1");
        assert_eq!(artifact.size, 42);
    }

    #[test]
    fn test_artifact_serializes_camel_case() {
        let artifact = ArtifactRef {
            handle: "h".into(),
            name: "n".into(),
            mime_type: "image/png".into(),
            size: 1,
        };
        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["mimeType"], "image/png");
    }
}
