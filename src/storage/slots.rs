//! Local save-slot registry.
//!
//! All saved pipelines live in one JSON array file. Saving a pipeline whose
//! id is already present replaces that entry in place; otherwise it is
//! appended. The whole file is read and rewritten on every change.

use super::StorageError;
use crate::pipeline::id::PipelineId;
use crate::pipeline::model::Pipeline;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Listing entry for the "open" dialog.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavedPipelineSummary {
    pub id: PipelineId,
    pub name: String,
    pub modified: DateTime<Utc>,
    pub node_count: usize,
    pub connection_count: usize,
}

impl From<&Pipeline> for SavedPipelineSummary {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            id: pipeline.id.clone(),
            name: pipeline.name.clone(),
            modified: pipeline.metadata.modified,
            node_count: pipeline.nodes.len(),
            connection_count: pipeline.connections.len(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SaveSlots {
    path: PathBuf,
}

impl SaveSlots {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every saved pipeline. A missing file is an empty registry.
    pub fn load_all(&self) -> Result<Vec<Pipeline>, StorageError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn write_all(&self, pipelines: &[Pipeline]) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(pipelines)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    /// Insert or replace by pipeline id.
    pub fn save(&self, pipeline: &Pipeline) -> Result<(), StorageError> {
        let mut pipelines = self.load_all()?;
        match pipelines.iter_mut().find(|p| p.id == pipeline.id) {
            Some(existing) => *existing = pipeline.clone(),
            None => pipelines.push(pipeline.clone()),
        }
        self.write_all(&pipelines)?;
        tracing::info!(
            "Saved pipeline {} to {:?} ({} slots)",
            pipeline.id,
            self.path,
            pipelines.len()
        );
        Ok(())
    }

    pub fn get(&self, id: &PipelineId) -> Result<Pipeline, StorageError> {
        self.load_all()?
            .into_iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| StorageError::NotFound(id.clone()))
    }

    /// Returns false when no slot had that id.
    pub fn remove(&self, id: &PipelineId) -> Result<bool, StorageError> {
        let mut pipelines = self.load_all()?;
        let before = pipelines.len();
        pipelines.retain(|p| &p.id != id);
        if pipelines.len() == before {
            return Ok(false);
        }
        self.write_all(&pipelines)?;
        Ok(true)
    }

    pub fn list(&self) -> Result<Vec<SavedPipelineSummary>, StorageError> {
        Ok(self
            .load_all()?
            .iter()
            .map(SavedPipelineSummary::from)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let slots = SaveSlots::new(dir.path().join("none.json"));
        assert!(slots.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_save_appends_then_replaces() {
        let dir = TempDir::new().unwrap();
        let slots = SaveSlots::new(dir.path().join("nested").join("slots.json"));

        let mut first = Pipeline::new("first");
        let second = Pipeline::new("second");
        slots.save(&first).unwrap();
        slots.save(&second).unwrap();
        assert_eq!(slots.list().unwrap().len(), 2);

        first.name = "first (edited)".into();
        slots.save(&first).unwrap();
        let all = slots.load_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "first (edited)");
        assert_eq!(all[1].id, second.id);
    }

    #[test]
    fn test_document_is_json_array() {
        let dir = TempDir::new().unwrap();
        let slots = SaveSlots::new(dir.path().join("slots.json"));
        slots.save(&Pipeline::new("x")).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(slots.path()).unwrap()).unwrap();
        assert!(raw.is_array());
    }

    #[test]
    fn test_get_and_remove() {
        let dir = TempDir::new().unwrap();
        let slots = SaveSlots::new(dir.path().join("slots.json"));
        let p = Pipeline::new("keep");
        slots.save(&p).unwrap();
        assert_eq!(slots.get(&p.id).unwrap(), p);
        assert!(slots.remove(&p.id).unwrap());
        assert!(!slots.remove(&p.id).unwrap());
        assert!(matches!(slots.get(&p.id), Err(StorageError::NotFound(_))));
    }
}
