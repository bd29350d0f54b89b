//! Notifications pushed to the presentation layer.
//!
//! Nothing in the engine returns results to the UI synchronously; every
//! visible change is announced as a `StudioEvent` over a crossbeam channel.

use crate::pipeline::editor::Selection;
use crate::pipeline::id::{ConnectionId, FileId, NodeId, PipelineId};
use crate::pipeline::model::Pipeline;
use crate::pipeline::node::NodeStatus;
use crate::pipeline::validator::RejectionReason;
use crate::storage::SavedPipelineSummary;

/// Messages sent from the backend thread and the execution engine.
#[derive(Debug, Clone)]
pub enum StudioEvent {
    /// Snapshot of the pipeline after a change.
    PipelineChanged(Box<Pipeline>),

    /// Undo/redo availability.
    HistoryChanged { can_undo: bool, can_redo: bool },

    SelectionChanged(Selection),

    NodeAdded(NodeId),

    FileIngested { node_id: NodeId, file_id: FileId },

    ConnectionAdded(ConnectionId),

    /// A proposed connection was refused by admission control.
    ConnectionRejected {
        reason: RejectionReason,
        message: String,
    },

    /// A command could not be applied. State is unchanged.
    CommandFailed { command: String, message: String },

    /// Pipeline stored in its save slot.
    Saved(PipelineId),

    /// Serialized document ready to be written under `file_name`.
    Exported { file_name: String, bytes: Vec<u8> },

    SavedList(Vec<SavedPipelineSummary>),

    // ── Execution ──
    ExecutionStarted { order: Vec<NodeId> },

    NodeStatusChanged { node_id: NodeId, status: NodeStatus },

    NodeProgress { node_id: NodeId, progress: f64 },

    NodeFailed { node_id: NodeId, error: String },

    /// Every queued node completed.
    ExecutionFinished,

    /// The run was cancelled; in-flight and pending nodes are idle again.
    ExecutionStopped,

    /// The run halted on a node error.
    ExecutionFailed { node_id: NodeId, error: String },

    /// Backend thread is shutting down.
    Shutdown,
}

impl StudioEvent {
    /// True for events emitted by the execution engine.
    pub fn is_execution_event(&self) -> bool {
        matches!(
            self,
            StudioEvent::ExecutionStarted { .. }
                | StudioEvent::NodeStatusChanged { .. }
                | StudioEvent::NodeProgress { .. }
                | StudioEvent::NodeFailed { .. }
                | StudioEvent::ExecutionFinished
                | StudioEvent::ExecutionStopped
                | StudioEvent::ExecutionFailed { .. }
        )
    }
}
