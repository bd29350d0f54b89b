//! Execution engine: a sequential, cancellable step machine over the nodes
//! of the current pipeline.
//!
//! A run proceeds as follows:
//! 1. `execute` marks every node running at progress 0 and queues them, in
//!    list order or (opt-in) dependency order.
//! 2. Each `step` checks the cancellation flag, then advances the current
//!    node by one driver increment.
//! 3. When a node reaches 100 its operation runs; success marks it
//!    completed and the next node becomes current.
//! 4. A failure marks the node as errored, returns untouched nodes to idle
//!    and ends the run.
//!
//! At most one node makes progress at a time. Every visible change is
//! pushed as a [`StudioEvent`].

pub mod driver;
pub mod operation;

pub use driver::{FixedStep, ProgressDriver, RandomProgress, MAX_INCREMENT, MIN_INCREMENT};
pub use operation::{NodeOperation, OperationError, SimulatedOperation};

use crate::config::ExecutionConfig;
use crate::events::StudioEvent;
use crate::pipeline::editor::PipelineEditor;
use crate::pipeline::id::NodeId;
use crate::pipeline::node::{NodeState, NodeStatus};
use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

/// Errors returned when a run cannot start.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExecutionError {
    #[error("Cannot execute an empty pipeline")]
    EmptyPipeline,

    #[error("A run is already in progress")]
    AlreadyRunning,
}

/// Order in which queued nodes are processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionOrder {
    /// Node list order.
    #[default]
    List,
    /// Upstream nodes before downstream nodes, ties in list order.
    Dependency,
}

/// Shared stop flag, checked before every step.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// How a run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    Completed,
    Cancelled,
    Failed { node_id: NodeId, error: String },
}

/// Result of a single `step`.
#[derive(Debug, Clone, PartialEq)]
pub enum StepResult {
    /// No run is active.
    Idle,
    /// The run moved forward and is still active.
    Advanced,
    Finished(RunOutcome),
}

struct ActiveRun {
    queue: VecDeque<NodeId>,
    current: Option<NodeId>,
    started: Instant,
}

pub struct ExecutionEngine {
    driver: Box<dyn ProgressDriver>,
    operation: Box<dyn NodeOperation>,
    order: ExecutionOrder,
    cancel: CancelToken,
    events: Option<Sender<StudioEvent>>,
    run: Option<ActiveRun>,
    last_outcome: Option<RunOutcome>,
}

impl ExecutionEngine {
    /// Engine with the given driver and the simulated operation.
    pub fn new(driver: Box<dyn ProgressDriver>) -> Self {
        Self {
            driver,
            operation: Box::new(SimulatedOperation),
            order: ExecutionOrder::default(),
            cancel: CancelToken::new(),
            events: None,
            run: None,
            last_outcome: None,
        }
    }

    /// Randomized engine configured from the `[execution]` section.
    pub fn from_config(config: &ExecutionConfig) -> Self {
        Self::new(Box::new(RandomProgress::new(
            config.min_progress_step,
            config.max_progress_step,
        )))
        .with_order(config.order)
    }

    pub fn with_operation(mut self, operation: Box<dyn NodeOperation>) -> Self {
        self.operation = operation;
        self
    }

    pub fn with_order(mut self, order: ExecutionOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_events(mut self, events: Sender<StudioEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn order(&self) -> ExecutionOrder {
        self.order
    }

    pub fn is_executing(&self) -> bool {
        self.run.is_some()
    }

    /// Node currently making progress.
    pub fn current_node(&self) -> Option<&NodeId> {
        self.run.as_ref().and_then(|r| r.current.as_ref())
    }

    pub fn last_outcome(&self) -> Option<&RunOutcome> {
        self.last_outcome.as_ref()
    }

    fn emit(&self, event: StudioEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Start a run over the editor's pipeline.
    pub fn execute(&mut self, editor: &mut PipelineEditor) -> Result<(), ExecutionError> {
        if self.run.is_some() {
            return Err(ExecutionError::AlreadyRunning);
        }
        if editor.pipeline().is_empty() {
            tracing::warn!("Refusing to execute empty pipeline");
            return Err(ExecutionError::EmptyPipeline);
        }

        self.cancel.reset();
        let pipeline = editor.pipeline_mut();
        let order: Vec<NodeId> = match self.order {
            ExecutionOrder::List => pipeline.nodes.iter().map(|n| n.id.clone()).collect(),
            ExecutionOrder::Dependency => pipeline.topological_order(),
        };
        for id in &order {
            pipeline.set_node_state(id, NodeState::Running { progress: 0.0 });
        }

        tracing::info!(
            "Execution started on pipeline {} ({} nodes, {:?} order)",
            pipeline.id,
            order.len(),
            self.order
        );
        self.emit(StudioEvent::ExecutionStarted {
            order: order.clone(),
        });
        for id in &order {
            self.emit(StudioEvent::NodeStatusChanged {
                node_id: id.clone(),
                status: NodeStatus::Running,
            });
        }

        self.run = Some(ActiveRun {
            queue: order.into(),
            current: None,
            started: Instant::now(),
        });
        self.last_outcome = None;
        Ok(())
    }

    /// Advance the active run by one increment.
    pub fn step(&mut self, editor: &mut PipelineEditor) -> StepResult {
        let Some(mut run) = self.run.take() else {
            return StepResult::Idle;
        };

        if self.cancel.is_cancelled() {
            return StepResult::Finished(self.finish(editor, run, RunOutcome::Cancelled));
        }

        let node_id = match run.current.clone() {
            Some(id) => id,
            None => match run.queue.pop_front() {
                Some(id) => {
                    run.current = Some(id.clone());
                    id
                }
                None => return StepResult::Finished(self.finish(editor, run, RunOutcome::Completed)),
            },
        };

        let Some(node) = editor.pipeline().node(&node_id) else {
            tracing::debug!("Node {} removed during run, skipping", node_id);
            run.current = None;
            self.run = Some(run);
            return StepResult::Advanced;
        };

        let current = match node.state {
            NodeState::Running { progress } => progress,
            _ => 0.0,
        };
        let increment = self
            .driver
            .next_increment(&node_id, current)
            .clamp(MIN_INCREMENT, MAX_INCREMENT);
        let progress = (current + increment).min(100.0);

        if progress < 100.0 {
            editor
                .pipeline_mut()
                .set_node_state(&node_id, NodeState::Running { progress });
            self.emit(StudioEvent::NodeProgress { node_id, progress });
            self.run = Some(run);
            return StepResult::Advanced;
        }

        match self.operation.run(node) {
            Ok(outputs) => {
                let pipeline = editor.pipeline_mut();
                if let Some(node) = pipeline.node_mut(&node_id) {
                    node.state = NodeState::Completed;
                    if outputs.is_some() {
                        node.outputs = outputs;
                    }
                }
                tracing::debug!("Node {} completed", node_id);
                self.emit(StudioEvent::NodeProgress {
                    node_id: node_id.clone(),
                    progress: 100.0,
                });
                self.emit(StudioEvent::NodeStatusChanged {
                    node_id,
                    status: NodeStatus::Completed,
                });
                run.current = None;
                if run.queue.is_empty() {
                    return StepResult::Finished(self.finish(editor, run, RunOutcome::Completed));
                }
                self.run = Some(run);
                StepResult::Advanced
            }
            Err(err) => {
                let error = err.to_string();
                editor.pipeline_mut().set_node_state(
                    &node_id,
                    NodeState::Error {
                        error: error.clone(),
                    },
                );
                tracing::warn!("Node {} failed: {}", node_id, error);
                self.emit(StudioEvent::NodeFailed {
                    node_id: node_id.clone(),
                    error: error.clone(),
                });
                StepResult::Finished(self.finish(
                    editor,
                    run,
                    RunOutcome::Failed { node_id, error },
                ))
            }
        }
    }

    /// Cancel the active run. Returns false if nothing was running.
    pub fn stop(&mut self, editor: &mut PipelineEditor) -> bool {
        match self.run.take() {
            Some(run) => {
                self.finish(editor, run, RunOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Step until the active run ends. Returns `None` if no run is active.
    pub fn run_to_completion(&mut self, editor: &mut PipelineEditor) -> Option<RunOutcome> {
        loop {
            match self.step(editor) {
                StepResult::Idle => return None,
                StepResult::Advanced => {}
                StepResult::Finished(outcome) => return Some(outcome),
            }
        }
    }

    fn finish(
        &mut self,
        editor: &mut PipelineEditor,
        run: ActiveRun,
        outcome: RunOutcome,
    ) -> RunOutcome {
        let pipeline = editor.pipeline_mut();
        let mut reverted = Vec::new();
        for node in pipeline.nodes.iter_mut() {
            if matches!(node.state, NodeState::Running { .. }) {
                node.state = NodeState::Idle;
                reverted.push(node.id.clone());
            }
        }
        for node_id in reverted {
            self.emit(StudioEvent::NodeStatusChanged {
                node_id,
                status: NodeStatus::Idle,
            });
        }

        let elapsed = run.started.elapsed();
        match &outcome {
            RunOutcome::Completed => {
                tracing::info!("Execution finished in {:?}", elapsed);
                self.emit(StudioEvent::ExecutionFinished);
            }
            RunOutcome::Cancelled => {
                tracing::info!("Execution stopped after {:?}", elapsed);
                self.emit(StudioEvent::ExecutionStopped);
            }
            RunOutcome::Failed { node_id, error } => {
                tracing::warn!("Execution failed at {} after {:?}", node_id, elapsed);
                self.emit(StudioEvent::ExecutionFailed {
                    node_id: node_id.clone(),
                    error: error.clone(),
                });
            }
        }

        self.run = None;
        self.last_outcome = Some(outcome.clone());
        outcome
    }
}
