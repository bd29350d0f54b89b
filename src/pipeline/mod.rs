//! Pipeline graph model and editing.
//!
//! A pipeline is a directed acyclic graph of node instances joined by
//! port-to-port connections. All mutation goes through [`PipelineEditor`],
//! which validates every edit and records a snapshot for undo/redo.
//!
//! # Architecture
//!
//! ```text
//! [file-input] ──► [image-resize] ──► [image-format-convert]
//!        │
//!        └───────► [image-to-text]
//! ```
//!
//! - **Model** - `Pipeline` owns nodes and connections in insertion order.
//! - **Validator** - admission checks: endpoints, formats, cardinality, cycles.
//! - **History** - bounded snapshot stack shared by every editing operation.
//! - **Editor** - the single entry point for changes, selection and uploads.

pub mod connection;
pub mod editor;
pub mod error;
pub mod history;
pub mod id;
pub mod model;
pub mod node;
pub mod parameters;
pub mod port;
pub mod validator;

pub use connection::{Connection, ConnectionRequest};
pub use editor::{PipelineEditor, Selection, DEFAULT_PIPELINE_NAME};
pub use error::{PipelineError, PipelineResult};
pub use history::{History, DEFAULT_HISTORY_CAPACITY};
pub use id::{ConnectionId, FileId, NodeId, PipelineId};
pub use model::{Pipeline, PipelineMetadata, PIPELINE_FORMAT_VERSION};
pub use node::{NodeInstance, NodeOutputs, NodeState, NodeStatus};
pub use parameters::{validate_parameters, validate_value, ParameterPolicy};
pub use port::{mime_matches, mime_sets_intersect, PortDirection, ANY_MIME};
pub use validator::{ConnectionRejection, ConnectionValidator, RejectionReason};
