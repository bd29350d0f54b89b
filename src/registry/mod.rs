//! Node spec registry.
//!
//! The registry is the read-only catalog of node kinds. It is built once at
//! startup (either from the built-in catalog or from a JSON document) and is
//! shared behind an `Arc` by the editor, the execution engine and the backend
//! thread. Specs are handed out as `Arc<NodeSpec>` so node instances can
//! reference their template without copying it.

pub mod catalog;
pub mod spec;

pub use catalog::{builtin_specs, FILE_INPUT_SPEC_ID};
pub use spec::{
    NodeCategory, NodeMetadata, NodeSpec, ParameterKind, ParameterSpec, ParameterValidation,
    PortSpec, SelectOption,
};

use crate::pipeline::port::mime_matches;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while building a registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Duplicate node spec id: {0}")]
    DuplicateSpec(String),

    #[error("Invalid node catalog: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Read-only catalog of node kinds.
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    specs: Vec<Arc<NodeSpec>>,
}

impl NodeRegistry {
    /// Registry with the built-in catalog.
    pub fn builtin() -> Self {
        Self {
            specs: builtin_specs().into_iter().map(Arc::new).collect(),
        }
    }

    /// Build from an explicit list, rejecting duplicate ids.
    pub fn from_specs(specs: Vec<NodeSpec>) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for spec in &specs {
            if !seen.insert(spec.id.clone()) {
                return Err(RegistryError::DuplicateSpec(spec.id.clone()));
            }
        }
        tracing::debug!("Loaded node registry with {} specs", specs.len());
        Ok(Self {
            specs: specs.into_iter().map(Arc::new).collect(),
        })
    }

    /// Parse a JSON array of node specs.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let specs: Vec<NodeSpec> = serde_json::from_str(json)?;
        Self::from_specs(specs)
    }

    pub fn find_spec(&self, id: &str) -> Option<Arc<NodeSpec>> {
        self.specs.iter().find(|s| s.id == id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.specs.iter().any(|s| s.id == id)
    }

    /// All specs in catalog order.
    pub fn all(&self) -> &[Arc<NodeSpec>] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Case-insensitive search over name, description and tags.
    /// An empty or blank term matches everything.
    pub fn search(&self, term: &str) -> Vec<Arc<NodeSpec>> {
        let needle = term.trim().to_lowercase();
        if needle.is_empty() {
            return self.specs.clone();
        }
        self.specs
            .iter()
            .filter(|spec| {
                let meta = &spec.metadata;
                meta.name.to_lowercase().contains(&needle)
                    || meta.description.to_lowercase().contains(&needle)
                    || meta.tags.iter().any(|t| t.to_lowercase().contains(&needle))
            })
            .cloned()
            .collect()
    }

    /// Specs grouped per category, catalog order kept within each group.
    pub fn by_category(&self) -> BTreeMap<NodeCategory, Vec<Arc<NodeSpec>>> {
        let mut groups: BTreeMap<NodeCategory, Vec<Arc<NodeSpec>>> = BTreeMap::new();
        for spec in &self.specs {
            groups
                .entry(spec.metadata.category)
                .or_default()
                .push(Arc::clone(spec));
        }
        groups
    }

    /// Specs with at least one input port that accepts `mime`.
    pub fn accepting(&self, mime: &str) -> Vec<Arc<NodeSpec>> {
        self.specs
            .iter()
            .filter(|spec| {
                spec.inputs
                    .iter()
                    .any(|port| port.mime_types.iter().any(|m| mime_matches(mime, m)))
            })
            .cloned()
            .collect()
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
