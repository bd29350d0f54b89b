//! Backend worker loop.
//!
//! The worker thread is the single writer of the studio state. Each
//! iteration:
//! 1. Drain commands from the UI.
//! 2. Advance the execution engine by one step if a run is active.
//! 3. Rate-limit to the configured tick interval.

use crate::backend::bridge::StudioCommand;
use crate::events::StudioEvent;
use crate::execution::{ExecutionEngine, StepResult};
use crate::pipeline::editor::PipelineEditor;
use crate::pipeline::error::PipelineError;
use crate::pipeline::model::Pipeline;
use crate::storage::{self, SaveSlots};
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Wait between command polls while no run is active.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(10);

pub struct StudioWorker {
    editor: PipelineEditor,
    engine: ExecutionEngine,
    slots: Option<SaveSlots>,
    cmd_rx: Receiver<StudioCommand>,
    event_tx: Sender<StudioEvent>,
    running: Arc<AtomicBool>,
    tick_interval: Duration,
    last_step: Option<Instant>,
}

impl StudioWorker {
    pub fn new(
        editor: PipelineEditor,
        engine: ExecutionEngine,
        slots: Option<SaveSlots>,
        cmd_rx: Receiver<StudioCommand>,
        event_tx: Sender<StudioEvent>,
        running: Arc<AtomicBool>,
        tick_interval: Duration,
    ) -> Self {
        Self {
            editor,
            engine,
            slots,
            cmd_rx,
            event_tx,
            running,
            tick_interval,
            last_step: None,
        }
    }

    /// Main loop. Returns when `Shutdown` is received, the running flag is
    /// cleared, or every UI handle is gone.
    pub fn run(mut self) {
        tracing::info!("Studio backend thread started");
        self.publish_state();

        while self.running.load(Ordering::Relaxed) {
            self.process_commands();

            if self.engine.is_executing() {
                self.last_step = Some(Instant::now());
                if let StepResult::Finished(outcome) = self.engine.step(&mut self.editor) {
                    tracing::debug!("Run ended: {:?}", outcome);
                    self.publish_pipeline();
                }
            }

            self.rate_limit();
        }

        if self.engine.stop(&mut self.editor) {
            tracing::info!("Stopped active run on shutdown");
        }
        let _ = self.event_tx.send(StudioEvent::Shutdown);
        tracing::info!("Studio backend thread exiting");
    }

    fn process_commands(&mut self) {
        loop {
            match self.cmd_rx.try_recv() {
                Ok(cmd) => self.handle_command(cmd),
                Err(crossbeam_channel::TryRecvError::Empty) => break,
                Err(crossbeam_channel::TryRecvError::Disconnected) => {
                    tracing::info!("Command channel closed");
                    self.running.store(false, Ordering::Relaxed);
                    break;
                }
            }
        }
    }

    fn rate_limit(&self) {
        if !self.engine.is_executing() {
            std::thread::sleep(IDLE_POLL_INTERVAL);
            return;
        }
        if let Some(last) = self.last_step {
            let elapsed = last.elapsed();
            if elapsed < self.tick_interval {
                std::thread::sleep(self.tick_interval - elapsed);
            }
        }
    }

    fn emit(&self, event: StudioEvent) {
        let _ = self.event_tx.send(event);
    }

    fn fail(&self, command: &str, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("Command '{}' failed: {}", command, message);
        self.emit(StudioEvent::CommandFailed {
            command: command.to_string(),
            message,
        });
    }

    fn publish_pipeline(&self) {
        self.emit(StudioEvent::PipelineChanged(Box::new(
            self.editor.pipeline().clone(),
        )));
    }

    fn publish_history(&self) {
        self.emit(StudioEvent::HistoryChanged {
            can_undo: self.editor.can_undo(),
            can_redo: self.editor.can_redo(),
        });
    }

    fn publish_selection(&self) {
        self.emit(StudioEvent::SelectionChanged(self.editor.selection().clone()));
    }

    fn publish_state(&self) {
        self.publish_pipeline();
        self.publish_history();
        self.publish_selection();
    }

    /// After a committed edit.
    fn publish_edit(&self) {
        self.publish_pipeline();
        self.publish_history();
    }

    fn report_pipeline_error(&self, command: &str, err: PipelineError) {
        match err {
            PipelineError::ConnectionRejected(rejection) => {
                tracing::debug!("Connection rejected ({})", rejection.reason());
                self.emit(StudioEvent::ConnectionRejected {
                    reason: rejection.reason(),
                    message: rejection.to_string(),
                });
            }
            other => self.fail(command, other.to_string()),
        }
    }

    /// Stop an active run before the pipeline is swapped out.
    fn stop_for_replace(&mut self) {
        if self.engine.stop(&mut self.editor) {
            tracing::info!("Stopped active run before replacing pipeline");
        }
    }

    fn handle_command(&mut self, cmd: StudioCommand) {
        let name = cmd.name();
        match cmd {
            StudioCommand::NewPipeline => {
                self.stop_for_replace();
                self.editor.new_pipeline();
                self.publish_state();
            }
            StudioCommand::Open(id) => self.handle_open(name, id),
            StudioCommand::Save => self.handle_save(name),
            StudioCommand::Import(bytes) => self.handle_import(name, &bytes),
            StudioCommand::Export => match storage::export_pipeline(self.editor.pipeline()) {
                Ok(exported) => self.emit(StudioEvent::Exported {
                    file_name: exported.file_name,
                    bytes: exported.bytes,
                }),
                Err(e) => self.fail(name, e.to_string()),
            },
            StudioCommand::Undo => {
                if self.editor.undo() {
                    self.publish_state();
                }
            }
            StudioCommand::Redo => {
                if self.editor.redo() {
                    self.publish_state();
                }
            }
            StudioCommand::DeleteSelection => {
                if self.editor.delete_selection() > 0 {
                    self.publish_edit();
                    self.publish_selection();
                }
            }
            StudioCommand::Execute => match self.engine.execute(&mut self.editor) {
                Ok(()) => self.last_step = None,
                Err(e) => self.fail(name, e.to_string()),
            },
            StudioCommand::Stop => {
                if self.engine.stop(&mut self.editor) {
                    self.publish_pipeline();
                }
            }
            StudioCommand::AddNode {
                spec_id,
                position,
                parameters,
            } => match self.editor.add_node(&spec_id, position, parameters) {
                Ok(node_id) => {
                    self.emit(StudioEvent::NodeAdded(node_id));
                    self.publish_edit();
                }
                Err(e) => self.report_pipeline_error(name, e),
            },
            StudioCommand::AddFileNode { file, position } => {
                match self.editor.add_file_node(file, position) {
                    Ok((node_id, file_id)) => {
                        self.emit(StudioEvent::FileIngested { node_id, file_id });
                        self.publish_edit();
                    }
                    Err(e) => self.report_pipeline_error(name, e),
                }
            }
            StudioCommand::RemoveNode(node_id) => {
                if self.editor.remove_node(&node_id) {
                    self.publish_edit();
                }
            }
            StudioCommand::UpdateParameters {
                node_id,
                parameters,
            } => match self.editor.update_node_parameters(&node_id, parameters) {
                Ok(()) => self.publish_edit(),
                Err(e) => self.report_pipeline_error(name, e),
            },
            StudioCommand::MoveNode { node_id, position } => {
                if let Err(e) = self.editor.move_node(&node_id, position) {
                    self.report_pipeline_error(name, e);
                }
            }
            StudioCommand::EndMove => {
                if self.editor.end_move() {
                    self.publish_edit();
                }
            }
            StudioCommand::AddConnection(request) => match self.editor.add_connection(request) {
                Ok(id) => {
                    self.emit(StudioEvent::ConnectionAdded(id));
                    self.publish_edit();
                }
                Err(e) => self.report_pipeline_error(name, e),
            },
            StudioCommand::RemoveConnection(id) => {
                if self.editor.remove_connection(&id) {
                    self.publish_edit();
                }
            }
            StudioCommand::SelectNode { node_id, additive } => {
                if self.editor.select_node(&node_id, additive) {
                    self.publish_selection();
                } else {
                    self.report_pipeline_error(name, PipelineError::UnknownNode(node_id));
                }
            }
            StudioCommand::SelectConnection {
                connection_id,
                additive,
            } => {
                if self.editor.select_connection(&connection_id, additive) {
                    self.publish_selection();
                } else {
                    self.fail(name, format!("Unknown connection: {}", connection_id));
                }
            }
            StudioCommand::ClearSelection => {
                self.editor.clear_selection();
                self.publish_selection();
            }
            StudioCommand::Rename(new_name) => {
                self.editor.rename(new_name);
                self.publish_edit();
            }
            StudioCommand::SetDescription(description) => {
                self.editor.set_description(description);
                self.publish_edit();
            }
            StudioCommand::SetTags(tags) => {
                self.editor.set_tags(tags);
                self.publish_edit();
            }
            StudioCommand::RemoveUploadedFile(id) => {
                if !self.editor.remove_uploaded_file(&id) {
                    tracing::debug!("Upload {} already gone", id);
                }
            }
            StudioCommand::ListSaved => match &self.slots {
                Some(slots) => match slots.list() {
                    Ok(list) => self.emit(StudioEvent::SavedList(list)),
                    Err(e) => self.fail(name, e.to_string()),
                },
                None => self.fail(name, "No save location configured"),
            },
            StudioCommand::RequestSnapshot => self.publish_state(),
            StudioCommand::Shutdown => {
                tracing::info!("Shutdown requested");
                self.running.store(false, Ordering::Relaxed);
            }
        }
    }

    fn handle_open(&mut self, name: &str, id: crate::pipeline::id::PipelineId) {
        let Some(slots) = &self.slots else {
            self.fail(name, "No save location configured");
            return;
        };
        let pipeline = match slots.get(&id) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                self.fail(name, e.to_string());
                return;
            }
        };
        self.install(name, pipeline);
    }

    /// Replace the pipeline with a loaded document. A document that fails
    /// the integrity check leaves the current pipeline and any active run
    /// untouched.
    fn install(&mut self, name: &str, pipeline: Pipeline) {
        if let Err(e) = pipeline.check_integrity() {
            self.fail(name, e.to_string());
            return;
        }
        self.stop_for_replace();
        match self.editor.load_pipeline(pipeline) {
            Ok(()) => self.publish_state(),
            Err(e) => self.fail(name, e.to_string()),
        }
    }

    fn handle_save(&mut self, name: &str) {
        let Some(slots) = &self.slots else {
            self.fail(name, "No save location configured");
            return;
        };
        match slots.save(self.editor.pipeline()) {
            Ok(()) => self.emit(StudioEvent::Saved(self.editor.pipeline().id.clone())),
            Err(e) => self.fail(name, e.to_string()),
        }
    }

    fn handle_import(&mut self, name: &str, bytes: &[u8]) {
        let pipeline = match storage::import_pipeline(bytes) {
            Ok(pipeline) => pipeline,
            Err(e) => {
                if let Some(cause) = e.import_cause() {
                    tracing::debug!("Import cause: {}", cause);
                }
                self.fail(name, e.to_string());
                return;
            }
        };
        self.install(name, pipeline);
    }
}
