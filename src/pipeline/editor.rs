//! The editing context: one pipeline, its history, selection and uploads.
//!
//! Every graph mutation goes through `PipelineEditor`. History-worthy
//! mutations commit a snapshot synchronously before returning, so the undo
//! stack always mirrors the externally visible sequence of states.
//!
//! Mutations that are NOT recorded:
//! - `move_node` (recorded once by `end_move`)
//! - execution status writes
//! - selection changes and upload bookkeeping
//! - `replace_pipeline`, which is itself a history navigation or reset

use crate::pipeline::connection::ConnectionRequest;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::history::{History, DEFAULT_HISTORY_CAPACITY};
use crate::pipeline::id::{ConnectionId, FileId, NodeId};
use crate::pipeline::model::Pipeline;
use crate::pipeline::node::{NodeInstance, NodeState};
use crate::pipeline::parameters::{validate_parameters, ParameterPolicy};
use crate::pipeline::validator::ConnectionValidator;
use crate::registry::{NodeRegistry, FILE_INPUT_SPEC_ID};
use crate::types::{IncomingFile, Position, UploadedFile};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Name given to pipelines created without one.
pub const DEFAULT_PIPELINE_NAME: &str = "Untitled Pipeline";

/// Currently selected nodes and connections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    pub nodes: BTreeSet<NodeId>,
    pub connections: BTreeSet<ConnectionId>,
}

impl Selection {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.connections.is_empty()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
    }
}

pub struct PipelineEditor {
    registry: Arc<NodeRegistry>,
    pipeline: Pipeline,
    history: History<Pipeline>,
    selection: Selection,
    uploads: Vec<UploadedFile>,
    policy: ParameterPolicy,
    default_name: String,
    /// Positions changed since the last commit.
    move_pending: bool,
}

impl PipelineEditor {
    /// Editor holding a fresh, empty pipeline.
    pub fn new(registry: Arc<NodeRegistry>) -> Self {
        let mut editor = Self {
            registry,
            pipeline: Pipeline::new(DEFAULT_PIPELINE_NAME),
            history: History::new(DEFAULT_HISTORY_CAPACITY),
            selection: Selection::default(),
            uploads: Vec::new(),
            policy: ParameterPolicy::default(),
            default_name: DEFAULT_PIPELINE_NAME.to_string(),
            move_pending: false,
        };
        editor.history.push_state(&editor.pipeline);
        editor
    }

    pub fn with_parameter_policy(mut self, policy: ParameterPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Resize the undo stack. Existing history is discarded.
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history = History::new(capacity);
        self.history.push_state(&self.pipeline);
        self
    }

    /// Name used by `new_pipeline`. Also renames the current pipeline when
    /// it is still untouched.
    pub fn with_default_name(mut self, name: impl Into<String>) -> Self {
        self.default_name = name.into();
        if self.pipeline.is_empty() && !self.history.can_undo() {
            self.pipeline.name = self.default_name.clone();
            self.history.clear();
            self.history.push_state(&self.pipeline);
        }
        self
    }

    // ==================== Accessors ====================

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub(crate) fn pipeline_mut(&mut self) -> &mut Pipeline {
        &mut self.pipeline
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    pub fn parameter_policy(&self) -> ParameterPolicy {
        self.policy
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn uploaded_files(&self) -> &[UploadedFile] {
        &self.uploads
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo_depth(&self) -> usize {
        self.history.undo_depth()
    }

    fn commit(&mut self, action: &str) {
        self.pipeline.touch();
        self.history.push_state(&self.pipeline);
        self.move_pending = false;
        tracing::trace!("Committed '{}' (undo depth {})", action, self.history.undo_depth());
    }

    // ==================== Nodes ====================

    /// Place a node of `spec_id`. Parameters start from the spec defaults,
    /// overridden by `initial` after validation.
    pub fn add_node(
        &mut self,
        spec_id: &str,
        position: Position,
        initial: Option<BTreeMap<String, Value>>,
    ) -> PipelineResult<NodeId> {
        let spec = self
            .registry
            .find_spec(spec_id)
            .ok_or_else(|| PipelineError::UnknownSpec(spec_id.to_string()))?;
        let overrides = match initial {
            Some(initial) => validate_parameters(&spec, &initial, self.policy)?,
            None => BTreeMap::new(),
        };

        let mut node = NodeInstance::from_spec(spec, position);
        node.parameters.extend(overrides);
        let id = node.id.clone();
        self.pipeline.nodes.push(node);
        self.commit("add node");
        tracing::info!("Added node {} ({})", id, spec_id);
        Ok(id)
    }

    /// Ingest an uploaded file as a file-input node carrying the file on its
    /// output port.
    pub fn add_file_node(
        &mut self,
        file: IncomingFile,
        position: Position,
    ) -> PipelineResult<(NodeId, FileId)> {
        let spec = self
            .registry
            .find_spec(FILE_INPUT_SPEC_ID)
            .ok_or(PipelineError::MissingFileInputSpec)?;
        let port_id = spec
            .outputs
            .first()
            .map(|p| p.id.clone())
            .ok_or(PipelineError::MissingFileInputSpec)?;

        let upload = UploadedFile::ingest(file);
        let mut node = NodeInstance::from_spec(spec, position);
        node.outputs = Some(BTreeMap::from([(port_id, upload.artifact())]));

        let node_id = node.id.clone();
        let file_id = upload.id.clone();
        tracing::info!(
            "Ingested file '{}' ({}, {} bytes) as node {}",
            upload.name,
            upload.mime_type,
            upload.size,
            node_id
        );
        self.uploads.push(upload);
        self.pipeline.nodes.push(node);
        self.commit("add file node");
        Ok((node_id, file_id))
    }

    /// Delete a node and its incident connections. Absent ids are a no-op.
    pub fn remove_node(&mut self, id: &NodeId) -> bool {
        if !self.remove_node_quiet(id) {
            return false;
        }
        self.commit("remove node");
        true
    }

    fn remove_node_quiet(&mut self, id: &NodeId) -> bool {
        let Some((_, removed)) = self.pipeline.remove_node(id) else {
            return false;
        };
        self.selection.nodes.remove(id);
        for conn in &removed {
            self.selection.connections.remove(&conn.id);
        }
        tracing::info!("Removed node {} and {} connection(s)", id, removed.len());
        true
    }

    /// Merge validated values into a node's parameters. On any invalid
    /// entry nothing is applied.
    pub fn update_node_parameters(
        &mut self,
        id: &NodeId,
        partial: BTreeMap<String, Value>,
    ) -> PipelineResult<()> {
        if partial.is_empty() {
            return if self.pipeline.contains_node(id) {
                Ok(())
            } else {
                Err(PipelineError::UnknownNode(id.clone()))
            };
        }
        let policy = self.policy;
        let node = self
            .pipeline
            .node_mut(id)
            .ok_or_else(|| PipelineError::UnknownNode(id.clone()))?;
        let validated = validate_parameters(&node.spec, &partial, policy)?;
        node.parameters.extend(validated);
        self.commit("update parameters");
        tracing::debug!("Updated {} parameter(s) on {}", partial.len(), id);
        Ok(())
    }

    /// Reposition a node without recording history. Call `end_move` when
    /// the drag finishes.
    pub fn move_node(&mut self, id: &NodeId, position: Position) -> PipelineResult<()> {
        let node = self
            .pipeline
            .node_mut(id)
            .ok_or_else(|| PipelineError::UnknownNode(id.clone()))?;
        node.position = position;
        self.move_pending = true;
        Ok(())
    }

    /// Commit pending moves as one history entry. Returns false if nothing
    /// moved.
    pub fn end_move(&mut self) -> bool {
        if !self.move_pending {
            return false;
        }
        self.commit("move");
        true
    }

    // ==================== Connections ====================

    pub fn add_connection(&mut self, request: ConnectionRequest) -> PipelineResult<ConnectionId> {
        if let Err(rejection) = ConnectionValidator::new(&self.pipeline).explain(&request) {
            tracing::warn!(
                "Rejected connection {}.{} -> {}.{} ({}): {}",
                request.source,
                request.source_port,
                request.target,
                request.target_port,
                rejection.reason(),
                rejection
            );
            return Err(rejection.into());
        }

        let conn = request.admit();
        let id = conn.id.clone();
        tracing::info!(
            "Added connection {}: {}.{} -> {}.{}",
            id,
            conn.source,
            conn.source_port,
            conn.target,
            conn.target_port
        );
        self.pipeline.connections.push(conn);
        self.commit("add connection");
        Ok(id)
    }

    /// Delete a connection. Absent ids are a no-op.
    pub fn remove_connection(&mut self, id: &ConnectionId) -> bool {
        if self.pipeline.remove_connection(id).is_none() {
            return false;
        }
        self.selection.connections.remove(id);
        self.commit("remove connection");
        tracing::info!("Removed connection {}", id);
        true
    }

    // ==================== Document ====================

    /// Swap the whole pipeline. Clears the selection; records no history.
    pub fn replace_pipeline(&mut self, pipeline: Pipeline) {
        tracing::debug!("Replacing pipeline with {} ({})", pipeline.id, pipeline.name);
        self.pipeline = pipeline;
        self.selection.clear();
        self.move_pending = false;
    }

    /// Install a loaded document after checking its integrity. History is
    /// reset to the loaded state.
    ///
    /// No run survives a load, so nodes saved mid-run come back idle. Every
    /// connection has just passed the integrity check and is marked
    /// validated.
    pub fn load_pipeline(&mut self, mut pipeline: Pipeline) -> PipelineResult<()> {
        pipeline.check_integrity()?;
        for node in pipeline.nodes.iter_mut() {
            if matches!(node.state, NodeState::Running { .. }) {
                node.state = NodeState::Idle;
            }
        }
        for conn in pipeline.connections.iter_mut() {
            conn.validated = true;
        }
        tracing::info!(
            "Loaded pipeline {} ('{}', {} nodes, {} connections)",
            pipeline.id,
            pipeline.name,
            pipeline.nodes.len(),
            pipeline.connections.len()
        );
        self.history.clear();
        self.replace_pipeline(pipeline);
        self.history.push_state(&self.pipeline);
        Ok(())
    }

    /// Start over with an empty pipeline, clearing history and uploads.
    pub fn new_pipeline(&mut self) {
        self.history.clear();
        self.uploads.clear();
        self.replace_pipeline(Pipeline::new(self.default_name.clone()));
        self.history.push_state(&self.pipeline);
        tracing::info!("Created new pipeline {}", self.pipeline.id);
    }

    /// Install an undo/redo snapshot. Execution results are not part of
    /// history: nodes still present keep their live state and outputs, and
    /// nodes brought back by the snapshot start idle.
    fn restore_snapshot(&mut self, mut snapshot: Pipeline) {
        for node in snapshot.nodes.iter_mut() {
            match self.pipeline.node(&node.id) {
                Some(live) => {
                    node.state = live.state.clone();
                    node.outputs = live.outputs.clone();
                }
                None => node.state = NodeState::Idle,
            }
        }
        self.replace_pipeline(snapshot);
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.restore_snapshot(snapshot);
                tracing::info!("Undo (remaining {})", self.history.undo_depth());
                true
            }
            None => {
                tracing::debug!("Nothing to undo");
                false
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.restore_snapshot(snapshot);
                tracing::info!("Redo (remaining {})", self.history.redo_depth());
                true
            }
            None => {
                tracing::debug!("Nothing to redo");
                false
            }
        }
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.pipeline.name = name.into();
        self.commit("rename");
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.pipeline.description = description.into();
        self.commit("set description");
    }

    pub fn set_tags(&mut self, tags: Vec<String>) {
        self.pipeline.metadata.tags = tags;
        self.commit("set tags");
    }

    // ==================== Selection ====================

    /// Select a node, optionally keeping the current selection. Returns
    /// false if the node does not exist.
    pub fn select_node(&mut self, id: &NodeId, additive: bool) -> bool {
        if !self.pipeline.contains_node(id) {
            return false;
        }
        if !additive {
            self.selection.clear();
        }
        self.selection.nodes.insert(id.clone());
        true
    }

    pub fn select_connection(&mut self, id: &ConnectionId, additive: bool) -> bool {
        if self.pipeline.connection(id).is_none() {
            return false;
        }
        if !additive {
            self.selection.clear();
        }
        self.selection.connections.insert(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    /// Delete every selected connection and node as a single history entry.
    /// Returns how many items were removed.
    pub fn delete_selection(&mut self) -> usize {
        let selection = std::mem::take(&mut self.selection);
        let mut removed = 0;
        for id in &selection.connections {
            if self.pipeline.remove_connection(id).is_some() {
                removed += 1;
            }
        }
        for id in &selection.nodes {
            if self.remove_node_quiet(id) {
                removed += 1;
            }
        }
        if removed > 0 {
            self.commit("delete selection");
            tracing::info!("Deleted {} selected item(s)", removed);
        }
        removed
    }

    // ==================== Uploads ====================

    /// Forget an upload record. Nodes created from it keep their artifact.
    pub fn remove_uploaded_file(&mut self, id: &FileId) -> bool {
        let before = self.uploads.len();
        self.uploads.retain(|f| &f.id != id);
        before != self.uploads.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::node::NodeState;
    use crate::pipeline::validator::{ConnectionRejection, RejectionReason};
    use serde_json::json;

    fn editor() -> PipelineEditor {
        PipelineEditor::new(Arc::new(NodeRegistry::builtin()))
    }

    fn add(editor: &mut PipelineEditor, spec_id: &str) -> NodeId {
        editor.add_node(spec_id, Position::default(), None).unwrap()
    }

    #[test]
    fn test_add_node_unknown_spec_leaves_state() {
        let mut ed = editor();
        let before = ed.pipeline().clone();
        let err = ed.add_node("nope", Position::default(), None).unwrap_err();
        assert_eq!(err, PipelineError::UnknownSpec("nope".into()));
        assert_eq!(ed.pipeline(), &before);
        assert!(!ed.can_undo());
    }

    #[test]
    fn test_add_node_with_overrides() {
        let mut ed = editor();
        let id = ed
            .add_node(
                "image-resize",
                Position::new(5.0, 5.0),
                Some(BTreeMap::from([("width".to_string(), json!(1024))])),
            )
            .unwrap();
        let node = ed.pipeline().node(&id).unwrap();
        assert_eq!(node.parameters["width"], json!(1024));
        assert_eq!(node.parameters["height"], json!(600.0));
        assert_eq!(node.state, NodeState::Idle);
    }

    #[test]
    fn test_first_mutation_is_undoable() {
        let mut ed = editor();
        let empty = ed.pipeline().clone();
        add(&mut ed, "docx-to-pdf");
        assert!(ed.undo());
        assert_eq!(ed.pipeline(), &empty);
        assert!(!ed.undo());
    }

    #[test]
    fn test_move_recorded_only_on_end_move() {
        let mut ed = editor();
        let id = add(&mut ed, "docx-to-pdf");
        let depth = ed.undo_depth();
        for x in 0..10 {
            ed.move_node(&id, Position::new(x as f64, 0.0)).unwrap();
        }
        assert_eq!(ed.undo_depth(), depth);
        assert!(ed.end_move());
        assert_eq!(ed.undo_depth(), depth + 1);
        assert!(!ed.end_move());
        assert!(matches!(
            ed.move_node(&NodeId::new("ghost"), Position::default()),
            Err(PipelineError::UnknownNode(_))
        ));
    }

    #[test]
    fn test_rejected_connection_reports_reason() {
        let mut ed = editor();
        let a = add(&mut ed, "file-input");
        let b = add(&mut ed, "image-resize");
        ed.add_connection(ConnectionRequest::new(a.clone(), "output", b.clone(), "input"))
            .unwrap();
        let err = ed
            .add_connection(ConnectionRequest::new(b, "output", a, "output"))
            .unwrap_err();
        match err {
            PipelineError::ConnectionRejected(rejection) => {
                assert_eq!(rejection.reason(), RejectionReason::Endpoint)
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(ed.pipeline().connections.len(), 1);
    }

    #[test]
    fn test_cycle_rejection_does_not_touch_history() {
        let mut ed = editor();
        let a = add(&mut ed, "ai-translate");
        let b = add(&mut ed, "ai-translate");
        ed.add_connection(ConnectionRequest::new(a.clone(), "output", b.clone(), "input"))
            .unwrap();
        let depth = ed.undo_depth();
        let err = ed
            .add_connection(ConnectionRequest::new(b, "output", a, "input"))
            .unwrap_err();
        assert_eq!(
            err,
            PipelineError::ConnectionRejected(ConnectionRejection::WouldCreateCycle)
        );
        assert_eq!(ed.undo_depth(), depth);
    }

    #[test]
    fn test_invalid_parameters_change_nothing() {
        let mut ed = editor();
        let id = add(&mut ed, "image-resize");
        let before = ed.pipeline().clone();
        let err = ed
            .update_node_parameters(
                &id,
                BTreeMap::from([
                    ("width".to_string(), json!(100)),
                    ("height".to_string(), json!(-4)),
                ]),
            )
            .unwrap_err();
        assert_eq!(err.parameter(), Some("height"));
        assert_eq!(ed.pipeline(), &before);
    }

    #[test]
    fn test_add_file_node_records_upload() {
        let mut ed = editor();
        let (node_id, file_id) = ed
            .add_file_node(
                IncomingFile::new("photo.png", 1234, "image/png", "blob:photo"),
                Position::default(),
            )
            .unwrap();
        let node = ed.pipeline().node(&node_id).unwrap();
        assert_eq!(node.spec_id(), FILE_INPUT_SPEC_ID);
        assert_eq!(node.output("output").unwrap().handle, "blob:photo");
        assert_eq!(ed.uploaded_files()[0].id, file_id);

        assert!(ed.remove_uploaded_file(&file_id));
        assert!(ed.uploaded_files().is_empty());
        assert!(ed.pipeline().node(&node_id).is_some());
    }

    #[test]
    fn test_delete_selection_single_entry() {
        let mut ed = editor();
        let a = add(&mut ed, "file-input");
        let b = add(&mut ed, "image-resize");
        let c = add(&mut ed, "docx-to-pdf");
        ed.add_connection(ConnectionRequest::new(a.clone(), "output", b.clone(), "input"))
            .unwrap();
        let before = ed.pipeline().clone();
        let depth = ed.undo_depth();

        assert!(ed.select_node(&a, false));
        assert!(ed.select_node(&c, true));
        assert_eq!(ed.delete_selection(), 2);
        assert_eq!(ed.undo_depth(), depth + 1);
        assert_eq!(ed.pipeline().nodes.len(), 1);
        assert!(ed.pipeline().connections.is_empty());
        assert!(ed.selection().is_empty());

        assert!(ed.undo());
        assert_eq!(ed.pipeline(), &before);
        assert_eq!(ed.delete_selection(), 0);
    }

    #[test]
    fn test_new_pipeline_resets() {
        let mut ed = editor().with_default_name("Scratch");
        assert_eq!(ed.pipeline().name, "Scratch");
        ed.add_file_node(IncomingFile::new("a.txt", 1, "text/plain", "h"), Position::default())
            .unwrap();
        ed.new_pipeline();
        assert!(ed.pipeline().is_empty());
        assert!(ed.uploaded_files().is_empty());
        assert!(!ed.can_undo());
        assert!(!ed.can_redo());
    }

    #[test]
    fn test_load_rejects_broken_document() {
        let mut ed = editor();
        add(&mut ed, "docx-to-pdf");
        let current = ed.pipeline().clone();

        let mut broken = current.clone();
        let ghost = ConnectionRequest::new("x", "output", "y", "input").admit();
        broken.connections.push(ghost);
        assert!(ed.load_pipeline(broken).is_err());
        assert_eq!(ed.pipeline(), &current);
    }

    #[test]
    fn test_metadata_edits_are_undoable() {
        let mut ed = editor();
        ed.rename("Invoices");
        ed.set_tags(vec!["finance".into()]);
        assert_eq!(ed.pipeline().metadata.tags, vec!["finance".to_string()]);
        assert!(ed.undo());
        assert!(ed.pipeline().metadata.tags.is_empty());
        assert!(ed.undo());
        assert_eq!(ed.pipeline().name, DEFAULT_PIPELINE_NAME);
    }
}
