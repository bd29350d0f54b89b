//! Backend thread for the studio.
//!
//! All editing state lives on one dedicated thread, so there is exactly
//! one writer of the pipeline, its history and the save slots. The UI talks
//! to it over crossbeam channels.
//!
//! # Architecture
//!
//! - [`StudioCommand`] - Messages sent from UI to backend (edit, undo, execute, ...)
//! - [`StudioEvent`](crate::events::StudioEvent) - Messages sent from backend to UI
//! - [`StudioBridge`] - UI-side handle for sending commands and receiving events
//! - [`StudioWorker`] - The loop that owns the editor, engine and save slots
//! - [`StudioBackend`] - Spawns the worker thread and joins it on shutdown
//!
//! # Example
//!
//! ```ignore
//! use convert_studio::backend::StudioBackend;
//! use convert_studio::config::AppConfig;
//! use convert_studio::registry::NodeRegistry;
//!
//! let (backend, bridge) = StudioBackend::spawn(AppConfig::default(), NodeRegistry::builtin().into())?;
//! bridge.add_node("image-resize", Position::new(100.0, 80.0), None);
//! bridge.execute();
//! for event in bridge.drain() {
//!     // update the view
//! }
//! bridge.shutdown();
//! backend.join();
//! ```

pub mod bridge;
pub mod worker;

pub use bridge::{StudioBridge, StudioCommand};
pub use worker::StudioWorker;

use crate::config::AppConfig;
use crate::error::Result;
use crate::execution::ExecutionEngine;
use crate::pipeline::editor::PipelineEditor;
use crate::registry::NodeRegistry;
use crate::storage::SaveSlots;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

/// Handle to the running backend thread.
pub struct StudioBackend {
    handle: Option<JoinHandle<()>>,
    running: Arc<AtomicBool>,
}

impl StudioBackend {
    /// Spawn with a randomized engine built from `config.execution`.
    pub fn spawn(config: AppConfig, registry: Arc<NodeRegistry>) -> Result<(Self, StudioBridge)> {
        let engine = ExecutionEngine::from_config(&config.execution);
        Self::spawn_with_engine(config, registry, engine)
    }

    /// Spawn with a caller-supplied engine (custom driver or operation).
    pub fn spawn_with_engine(
        config: AppConfig,
        registry: Arc<NodeRegistry>,
        engine: ExecutionEngine,
    ) -> Result<(Self, StudioBridge)> {
        config.validate()?;

        let cancel = engine.cancel_token();
        let (bridge, cmd_rx, event_tx) = StudioBridge::new(
            config.backend.command_channel_capacity,
            config.backend.event_channel_capacity,
            cancel,
        );
        let engine = engine.with_events(event_tx.clone());

        let editor = PipelineEditor::new(registry)
            .with_history_capacity(config.history.capacity)
            .with_parameter_policy(config.editor.parameter_policy)
            .with_default_name(config.editor.default_pipeline_name.clone());

        let slots = config.storage.slots_path().map(SaveSlots::new);
        if slots.is_none() {
            tracing::warn!("No data directory available; save slots disabled");
        }

        let running = Arc::new(AtomicBool::new(true));
        let worker = StudioWorker::new(
            editor,
            engine,
            slots,
            cmd_rx,
            event_tx,
            Arc::clone(&running),
            config.execution.tick_interval(),
        );

        let handle = std::thread::Builder::new()
            .name("studio-backend".to_string())
            .spawn(move || worker.run())?;

        Ok((
            Self {
                handle: Some(handle),
                running,
            },
            bridge,
        ))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Wait for the worker thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Studio backend thread panicked");
            }
        }
    }
}

impl Drop for StudioBackend {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
