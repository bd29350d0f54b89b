//! # Convert Studio: visual file conversion pipelines
//!
//! A graph engine for building file conversion pipelines out of typed
//! nodes. Users drop files onto the canvas, wire them through conversion
//! steps, and run the graph with simulated progress.
//!
//! ## Architecture
//!
//! - **Registry**: Catalog of node specs (ports, parameters, metadata)
//! - **Pipeline**: Graph model, connection validator, undo/redo history and the editor
//! - **Execution**: Step-driven engine that walks nodes and reports progress
//! - **Storage**: JSON import/export and the local save-slot document
//! - **Backend**: A worker thread that owns all state, driven over crossbeam channels
//!
//! ## Configuration
//!
//! Settings and save slots live in the platform-appropriate data directory
//! under `dev.convert-studio`:
//!
//! - **Linux**: `~/.local/share/dev.convert-studio/`
//! - **macOS**: `~/Library/Application Support/dev.convert-studio/`
//! - **Windows**: `%APPDATA%\dev.convert-studio\`
//!
//! ## Example
//!
//! ```ignore
//! use convert_studio::{NodeRegistry, PipelineEditor, Position, ConnectionRequest};
//! use std::sync::Arc;
//!
//! let mut editor = PipelineEditor::new(Arc::new(NodeRegistry::builtin()));
//! let resize = editor.add_node("image-resize", Position::new(0.0, 0.0), None)?;
//! let convert = editor.add_node("image-format-convert", Position::new(250.0, 0.0), None)?;
//! editor.add_connection(ConnectionRequest::new(resize, "output", convert, "input"))?;
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod events;
pub mod execution;
pub mod pipeline;
pub mod registry;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use backend::{StudioBackend, StudioBridge, StudioCommand};
pub use config::AppConfig;
pub use error::{Result, ResultExt, StudioError};
pub use events::StudioEvent;
pub use execution::{ExecutionEngine, ExecutionOrder, RunOutcome, StepResult};
pub use pipeline::{ConnectionRequest, NodeId, Pipeline, PipelineEditor, PipelineError};
pub use registry::{NodeRegistry, NodeSpec};
pub use types::{IncomingFile, Position};
