//! The pipeline aggregate: nodes, connections and document metadata.
//!
//! `Pipeline` is a plain value. Snapshots for undo/redo are structural
//! clones of it, and the persisted document is its serde form. Graph
//! mutations that must respect the invariants (admission control, history)
//! are performed by [`crate::pipeline::editor::PipelineEditor`], which only
//! hands out shared references to its pipeline.

use crate::pipeline::connection::Connection;
use crate::pipeline::error::{PipelineError, PipelineResult};
use crate::pipeline::id::{ConnectionId, NodeId, PipelineId};
use crate::pipeline::node::{NodeInstance, NodeState};
use crate::pipeline::parameters::{validate_value, ParameterPolicy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

/// Version stamped on newly created pipeline documents.
pub const PIPELINE_FORMAT_VERSION: &str = "1.0.0";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineMetadata {
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl PipelineMetadata {
    fn now() -> Self {
        let now = Utc::now();
        Self {
            created: now,
            modified: now,
            author: None,
            tags: Vec::new(),
        }
    }
}

/// The aggregate root of the graph model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: PipelineId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_version")]
    pub version: String,
    /// Nodes in insertion order; this order drives list-order execution.
    #[serde(default)]
    pub nodes: Vec<NodeInstance>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    pub metadata: PipelineMetadata,
}

fn default_version() -> String {
    PIPELINE_FORMAT_VERSION.to_string()
}

impl Pipeline {
    /// Empty pipeline with a fresh id.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PipelineId::generate(),
            name: name.into(),
            description: String::new(),
            version: default_version(),
            nodes: Vec::new(),
            connections: Vec::new(),
            metadata: PipelineMetadata::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &NodeId) -> Option<&NodeInstance> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut NodeInstance> {
        self.nodes.iter_mut().find(|n| &n.id == id)
    }

    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.iter().any(|n| &n.id == id)
    }

    pub fn connection(&self, id: &ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| &c.id == id)
    }

    /// Connections with `node_id` at either end.
    pub fn incident_connections(&self, node_id: &NodeId) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.touches(node_id))
            .collect()
    }

    /// Connections feeding one input port.
    pub fn incoming(&self, node_id: &NodeId, port_id: &str) -> Vec<&Connection> {
        self.connections
            .iter()
            .filter(|c| c.targets(node_id, port_id))
            .collect()
    }

    pub(crate) fn touch(&mut self) {
        self.metadata.modified = Utc::now();
    }

    /// Remove a node and every connection incident to it.
    pub(crate) fn remove_node(&mut self, id: &NodeId) -> Option<(NodeInstance, Vec<Connection>)> {
        let index = self.nodes.iter().position(|n| &n.id == id)?;
        let node = self.nodes.remove(index);
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.connections)
            .into_iter()
            .partition(|c| c.touches(id));
        self.connections = kept;
        Some((node, removed))
    }

    pub(crate) fn remove_connection(&mut self, id: &ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| &c.id == id)?;
        Some(self.connections.remove(index))
    }

    /// Write a node's execution state. Not a document edit, so `modified`
    /// is left alone.
    pub(crate) fn set_node_state(&mut self, id: &NodeId, state: NodeState) -> bool {
        match self.node_mut(id) {
            Some(node) => {
                node.state = state;
                true
            }
            None => false,
        }
    }

    /// Node ids with upstream nodes first. Ties (nodes whose inputs are all
    /// satisfied at the same time) keep list order.
    ///
    /// Kahn's algorithm. Nodes left over because of a cycle, which admission
    /// control prevents, are appended in list order.
    pub fn topological_order(&self) -> Vec<NodeId> {
        let position: HashMap<&NodeId, usize> = self
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (&n.id, i))
            .collect();
        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut downstream: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];

        for conn in &self.connections {
            if let (Some(&from), Some(&to)) = (position.get(&conn.source), position.get(&conn.target))
            {
                downstream[from].push(to);
                in_degree[to] += 1;
            }
        }

        // Ready set ordered by list position.
        let mut ready: BTreeSet<usize> =
            (0..self.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut emitted = vec![false; self.nodes.len()];

        while let Some(index) = ready.pop_first() {
            order.push(index);
            emitted[index] = true;
            for &next in &downstream[index] {
                in_degree[next] -= 1;
                if in_degree[next] == 0 {
                    ready.insert(next);
                }
            }
        }

        order.extend((0..self.nodes.len()).filter(|&i| !emitted[i]));
        order.into_iter().map(|i| self.nodes[i].id.clone()).collect()
    }

    /// Verify every structural invariant of the document.
    pub fn check_integrity(&self) -> PipelineResult<()> {
        let mut node_ids = HashSet::new();
        for node in &self.nodes {
            if !node_ids.insert(&node.id) {
                return Err(PipelineError::Integrity(format!(
                    "duplicate node id {}",
                    node.id
                )));
            }
            for (key, value) in &node.parameters {
                let param = node.spec.parameter(key).ok_or_else(|| {
                    PipelineError::Integrity(format!(
                        "node {} has parameter '{}' not declared by spec '{}'",
                        node.id, key, node.spec.id
                    ))
                })?;
                validate_value(param, value, ParameterPolicy::Reject).map_err(|e| {
                    PipelineError::Integrity(format!("node {}: {}", node.id, e))
                })?;
            }
        }

        let mut connection_ids = HashSet::new();
        let mut occupied: HashSet<(&NodeId, &str)> = HashSet::new();
        for conn in &self.connections {
            if !connection_ids.insert(&conn.id) {
                return Err(PipelineError::Integrity(format!(
                    "duplicate connection id {}",
                    conn.id
                )));
            }
            let source = self.node(&conn.source).ok_or_else(|| {
                PipelineError::Integrity(format!(
                    "connection {} references missing source node {}",
                    conn.id, conn.source
                ))
            })?;
            let target = self.node(&conn.target).ok_or_else(|| {
                PipelineError::Integrity(format!(
                    "connection {} references missing target node {}",
                    conn.id, conn.target
                ))
            })?;
            if source.spec.output(&conn.source_port).is_none() {
                return Err(PipelineError::Integrity(format!(
                    "connection {} uses unknown output port '{}' on {}",
                    conn.id, conn.source_port, conn.source
                )));
            }
            let input = target.spec.input(&conn.target_port).ok_or_else(|| {
                PipelineError::Integrity(format!(
                    "connection {} uses unknown input port '{}' on {}",
                    conn.id, conn.target_port, conn.target
                ))
            })?;
            if !occupied.insert((&conn.target, conn.target_port.as_str())) && !input.multiple {
                return Err(PipelineError::Integrity(format!(
                    "input port '{}' on {} has more than one connection",
                    conn.target_port, conn.target
                )));
            }
        }

        if self.has_cycle() {
            return Err(PipelineError::Integrity(
                "connection graph contains a cycle".to_string(),
            ));
        }
        Ok(())
    }

    fn has_cycle(&self) -> bool {
        let mut in_degree: HashMap<&NodeId, usize> =
            self.nodes.iter().map(|n| (&n.id, 0)).collect();
        for conn in &self.connections {
            if let Some(d) = in_degree.get_mut(&conn.target) {
                *d += 1;
            }
        }
        let mut queue: VecDeque<&NodeId> = in_degree
            .iter()
            .filter(|(_, d)| **d == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut visited = 0;
        while let Some(id) = queue.pop_front() {
            visited += 1;
            for conn in self.connections.iter().filter(|c| &c.source == id) {
                if let Some(d) = in_degree.get_mut(&conn.target) {
                    *d -= 1;
                    if *d == 0 {
                        queue.push_back(&conn.target);
                    }
                }
            }
        }
        visited != self.nodes.len()
    }
}
