//! Test data builders for creating test objects

use convert_studio::pipeline::{ConnectionRequest, NodeId, PipelineEditor};
use convert_studio::registry::{
    NodeCategory, NodeMetadata, NodeRegistry, NodeSpec, ParameterKind, ParameterSpec,
    ParameterValidation, PortSpec,
};
use convert_studio::Position;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Builder for creating test NodeSpecs
pub struct SpecBuilder {
    spec: NodeSpec,
}

impl SpecBuilder {
    pub fn new(id: &str) -> Self {
        Self {
            spec: NodeSpec {
                id: id.to_string(),
                kind: "processor".to_string(),
                version: "1.0.0".to_string(),
                metadata: NodeMetadata {
                    name: id.to_string(),
                    description: String::new(),
                    category: NodeCategory::Utility,
                    tags: Vec::new(),
                    author: None,
                    license: None,
                    documentation: None,
                },
                inputs: Vec::new(),
                outputs: Vec::new(),
                parameters: Vec::new(),
                ui_meta: Value::Null,
            },
        }
    }

    pub fn category(mut self, category: NodeCategory) -> Self {
        self.spec.metadata.category = category;
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.spec.metadata.tags.push(tag.to_string());
        self
    }

    pub fn input(mut self, id: &str, mime_types: &[&str]) -> Self {
        self.spec.inputs.push(PortSpec::new(id, id, mime_types));
        self
    }

    pub fn multi_input(mut self, id: &str, mime_types: &[&str]) -> Self {
        self.spec
            .inputs
            .push(PortSpec::new(id, id, mime_types).multiple(true));
        self
    }

    pub fn output(mut self, id: &str, mime_types: &[&str]) -> Self {
        self.spec.outputs.push(PortSpec::new(id, id, mime_types));
        self
    }

    pub fn number_param(mut self, id: &str, default: f64, min: f64, max: f64) -> Self {
        self.spec.parameters.push(ParameterSpec {
            id: id.to_string(),
            name: id.to_string(),
            kind: ParameterKind::Number,
            default_value: json!(default),
            required: false,
            validation: Some(ParameterValidation::range(Some(min), Some(max))),
            description: None,
            ui_hints: Value::Null,
        });
        self
    }

    pub fn build(self) -> NodeSpec {
        self.spec
    }
}

/// A pipeline assembled through the editor, with nodes addressable by alias.
pub struct TestPipeline {
    pub editor: PipelineEditor,
    ids: HashMap<String, NodeId>,
}

impl TestPipeline {
    pub fn id(&self, alias: &str) -> NodeId {
        self.ids
            .get(alias)
            .cloned()
            .unwrap_or_else(|| panic!("no node aliased '{}'", alias))
    }
}

/// Builder for pipelines made of built-in (or custom) node kinds
pub struct PipelineBuilder {
    editor: PipelineEditor,
    ids: HashMap<String, NodeId>,
    next_x: f64,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::with_registry(NodeRegistry::builtin())
    }

    pub fn with_registry(registry: NodeRegistry) -> Self {
        Self {
            editor: PipelineEditor::new(Arc::new(registry)),
            ids: HashMap::new(),
            next_x: 0.0,
        }
    }

    pub fn node(mut self, alias: &str, spec_id: &str) -> Self {
        let id = self
            .editor
            .add_node(spec_id, Position::new(self.next_x, 0.0), None)
            .unwrap_or_else(|e| panic!("adding {} failed: {}", spec_id, e));
        self.next_x += 200.0;
        self.ids.insert(alias.to_string(), id);
        self
    }

    /// Connect `from.output` to `to.input`.
    pub fn connect(self, from: &str, to: &str) -> Self {
        self.connect_ports(from, "output", to, "input")
    }

    pub fn connect_ports(mut self, from: &str, out_port: &str, to: &str, in_port: &str) -> Self {
        let request = ConnectionRequest::new(
            self.ids[from].clone(),
            out_port,
            self.ids[to].clone(),
            in_port,
        );
        self.editor
            .add_connection(request)
            .unwrap_or_else(|e| panic!("connecting {} -> {} failed: {}", from, to, e));
        self
    }

    pub fn build(self) -> TestPipeline {
        TestPipeline {
            editor: self.editor,
            ids: self.ids,
        }
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Editor holding a chain of `len` image-resize nodes, each feeding the next.
pub fn resize_chain(len: usize) -> (PipelineEditor, Vec<NodeId>) {
    let mut editor = PipelineEditor::new(Arc::new(NodeRegistry::builtin()));
    let mut ids: Vec<NodeId> = Vec::with_capacity(len);
    for i in 0..len {
        let id = editor
            .add_node("image-resize", Position::new(i as f64 * 200.0, 0.0), None)
            .unwrap();
        if let Some(prev) = ids.last() {
            editor
                .add_connection(ConnectionRequest::new(prev.clone(), "output", id.clone(), "input"))
                .unwrap();
        }
        ids.push(id);
    }
    (editor, ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_builder() {
        let spec = SpecBuilder::new("merge")
            .multi_input("input", &["text/plain"])
            .output("output", &["text/plain"])
            .number_param("weight", 1.0, 0.0, 10.0)
            .build();

        assert_eq!(spec.id, "merge");
        assert!(spec.inputs[0].multiple);
        assert_eq!(spec.parameters.len(), 1);
    }
}
