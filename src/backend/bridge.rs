//! Thread boundary between the studio backend and the UI.
//!
//! The UI holds a `StudioBridge`: a bounded command sender, the event
//! receiver and a clone of the execution cancel flag. Every method is
//! fire-and-forget; outcomes come back as [`StudioEvent`]s.

use crate::events::StudioEvent;
use crate::execution::CancelToken;
use crate::pipeline::connection::ConnectionRequest;
use crate::pipeline::id::{ConnectionId, FileId, NodeId, PipelineId};
use crate::types::{IncomingFile, Position};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

/// Commands sent from the UI thread to the backend.
#[derive(Debug, Clone)]
pub enum StudioCommand {
    /// Discard the current pipeline and start an empty one.
    NewPipeline,
    /// Load a saved pipeline by id.
    Open(PipelineId),
    /// Store the current pipeline in its save slot.
    Save,
    /// Replace the current pipeline with a serialized document.
    Import(Vec<u8>),
    /// Serialize the current pipeline.
    Export,
    Undo,
    Redo,
    DeleteSelection,
    Execute,
    Stop,
    AddNode {
        spec_id: String,
        position: Position,
        parameters: Option<BTreeMap<String, Value>>,
    },
    AddFileNode {
        file: IncomingFile,
        position: Position,
    },
    RemoveNode(NodeId),
    UpdateParameters {
        node_id: NodeId,
        parameters: BTreeMap<String, Value>,
    },
    /// Drag in progress; not recorded in history.
    MoveNode {
        node_id: NodeId,
        position: Position,
    },
    /// Drag finished.
    EndMove,
    AddConnection(ConnectionRequest),
    RemoveConnection(ConnectionId),
    SelectNode {
        node_id: NodeId,
        additive: bool,
    },
    SelectConnection {
        connection_id: ConnectionId,
        additive: bool,
    },
    ClearSelection,
    Rename(String),
    SetDescription(String),
    SetTags(Vec<String>),
    RemoveUploadedFile(FileId),
    /// Request the save-slot listing.
    ListSaved,
    /// Request the current pipeline, history and selection state.
    RequestSnapshot,
    /// Shut down the backend thread.
    Shutdown,
}

impl StudioCommand {
    /// Short label used in failure events and logs.
    pub fn name(&self) -> &'static str {
        match self {
            StudioCommand::NewPipeline => "new",
            StudioCommand::Open(_) => "open",
            StudioCommand::Save => "save",
            StudioCommand::Import(_) => "import",
            StudioCommand::Export => "export",
            StudioCommand::Undo => "undo",
            StudioCommand::Redo => "redo",
            StudioCommand::DeleteSelection => "delete-selection",
            StudioCommand::Execute => "execute",
            StudioCommand::Stop => "stop",
            StudioCommand::AddNode { .. } => "add-node",
            StudioCommand::AddFileNode { .. } => "add-file-node",
            StudioCommand::RemoveNode(_) => "remove-node",
            StudioCommand::UpdateParameters { .. } => "update-parameters",
            StudioCommand::MoveNode { .. } => "move-node",
            StudioCommand::EndMove => "end-move",
            StudioCommand::AddConnection(_) => "add-connection",
            StudioCommand::RemoveConnection(_) => "remove-connection",
            StudioCommand::SelectNode { .. } => "select-node",
            StudioCommand::SelectConnection { .. } => "select-connection",
            StudioCommand::ClearSelection => "clear-selection",
            StudioCommand::Rename(_) => "rename",
            StudioCommand::SetDescription(_) => "set-description",
            StudioCommand::SetTags(_) => "set-tags",
            StudioCommand::RemoveUploadedFile(_) => "remove-uploaded-file",
            StudioCommand::ListSaved => "list-saved",
            StudioCommand::RequestSnapshot => "request-snapshot",
            StudioCommand::Shutdown => "shutdown",
        }
    }
}

/// UI-side handle for communicating with the backend thread.
pub struct StudioBridge {
    pub cmd_tx: Sender<StudioCommand>,
    pub event_rx: Receiver<StudioEvent>,
    cancel: CancelToken,
}

impl StudioBridge {
    /// Create a new bridge pair: `(bridge_for_ui, cmd_rx, event_tx)`.
    ///
    /// The backend thread owns `cmd_rx` and `event_tx`.
    pub fn new(
        command_capacity: usize,
        event_capacity: usize,
        cancel: CancelToken,
    ) -> (Self, Receiver<StudioCommand>, Sender<StudioEvent>) {
        let (cmd_tx, cmd_rx) = bounded(command_capacity);
        let (event_tx, event_rx) = bounded(event_capacity);
        (
            Self {
                cmd_tx,
                event_rx,
                cancel,
            },
            cmd_rx,
            event_tx,
        )
    }

    // --- Events ---

    /// Drain all pending events.
    pub fn drain(&self) -> Vec<StudioEvent> {
        let mut events = Vec::new();
        while let Ok(event) = self.event_rx.try_recv() {
            events.push(event);
        }
        events
    }

    /// Try to receive a single event without blocking.
    pub fn try_recv(&self) -> Option<StudioEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Block for the next event, up to `timeout`.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<StudioEvent> {
        match self.event_rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    // --- Commands ---

    pub fn send_command(&self, cmd: StudioCommand) -> bool {
        self.cmd_tx.send(cmd).is_ok()
    }

    pub fn new_pipeline(&self) {
        let _ = self.cmd_tx.send(StudioCommand::NewPipeline);
    }

    pub fn open(&self, id: PipelineId) {
        let _ = self.cmd_tx.send(StudioCommand::Open(id));
    }

    pub fn save(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Save);
    }

    pub fn import(&self, bytes: Vec<u8>) {
        let _ = self.cmd_tx.send(StudioCommand::Import(bytes));
    }

    pub fn export(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Export);
    }

    pub fn undo(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Undo);
    }

    pub fn redo(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Redo);
    }

    pub fn delete_selection(&self) {
        let _ = self.cmd_tx.send(StudioCommand::DeleteSelection);
    }

    pub fn execute(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Execute);
    }

    /// Request cancellation. The flag is raised immediately so the engine
    /// halts before its next step even if commands are queued ahead of
    /// `Stop`.
    pub fn stop(&self) {
        self.cancel.cancel();
        let _ = self.cmd_tx.send(StudioCommand::Stop);
    }

    pub fn add_node(
        &self,
        spec_id: impl Into<String>,
        position: Position,
        parameters: Option<BTreeMap<String, Value>>,
    ) {
        let _ = self.cmd_tx.send(StudioCommand::AddNode {
            spec_id: spec_id.into(),
            position,
            parameters,
        });
    }

    pub fn add_file_node(&self, file: IncomingFile, position: Position) {
        let _ = self
            .cmd_tx
            .send(StudioCommand::AddFileNode { file, position });
    }

    pub fn remove_node(&self, node_id: NodeId) {
        let _ = self.cmd_tx.send(StudioCommand::RemoveNode(node_id));
    }

    pub fn update_parameters(&self, node_id: NodeId, parameters: BTreeMap<String, Value>) {
        let _ = self.cmd_tx.send(StudioCommand::UpdateParameters {
            node_id,
            parameters,
        });
    }

    pub fn move_node(&self, node_id: NodeId, position: Position) {
        let _ = self
            .cmd_tx
            .send(StudioCommand::MoveNode { node_id, position });
    }

    pub fn end_move(&self) {
        let _ = self.cmd_tx.send(StudioCommand::EndMove);
    }

    pub fn add_connection(&self, request: ConnectionRequest) {
        let _ = self.cmd_tx.send(StudioCommand::AddConnection(request));
    }

    pub fn remove_connection(&self, connection_id: ConnectionId) {
        let _ = self
            .cmd_tx
            .send(StudioCommand::RemoveConnection(connection_id));
    }

    pub fn select_node(&self, node_id: NodeId, additive: bool) {
        let _ = self
            .cmd_tx
            .send(StudioCommand::SelectNode { node_id, additive });
    }

    pub fn select_connection(&self, connection_id: ConnectionId, additive: bool) {
        let _ = self.cmd_tx.send(StudioCommand::SelectConnection {
            connection_id,
            additive,
        });
    }

    pub fn clear_selection(&self) {
        let _ = self.cmd_tx.send(StudioCommand::ClearSelection);
    }

    pub fn rename(&self, name: impl Into<String>) {
        let _ = self.cmd_tx.send(StudioCommand::Rename(name.into()));
    }

    pub fn set_description(&self, description: impl Into<String>) {
        let _ = self
            .cmd_tx
            .send(StudioCommand::SetDescription(description.into()));
    }

    pub fn set_tags(&self, tags: Vec<String>) {
        let _ = self.cmd_tx.send(StudioCommand::SetTags(tags));
    }

    pub fn remove_uploaded_file(&self, file_id: FileId) {
        let _ = self.cmd_tx.send(StudioCommand::RemoveUploadedFile(file_id));
    }

    pub fn list_saved(&self) {
        let _ = self.cmd_tx.send(StudioCommand::ListSaved);
    }

    pub fn request_snapshot(&self) {
        let _ = self.cmd_tx.send(StudioCommand::RequestSnapshot);
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(StudioCommand::Shutdown);
    }
}
