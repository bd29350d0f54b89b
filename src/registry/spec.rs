//! Node kind descriptions.
//!
//! A `NodeSpec` is the immutable template a node instance is created from.
//! Field names serialize in camelCase so catalogs and pipeline documents keep
//! the same JSON shape as node catalogs.

use crate::pipeline::port::PortDirection;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Immutable description of a kind of conversion/processing step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSpec {
    /// Unique identifier within the registry (e.g. `pdf-to-docx`).
    pub id: String,
    /// Category tag (`input`, `converter`, `processor`, `ai-processor`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default = "default_spec_version")]
    pub version: String,
    pub metadata: NodeMetadata,
    #[serde(default)]
    pub inputs: Vec<PortSpec>,
    #[serde(default)]
    pub outputs: Vec<PortSpec>,
    #[serde(default)]
    pub parameters: Vec<ParameterSpec>,
    /// Presentation data (icon, colour, preview hints). Never interpreted.
    #[serde(default)]
    pub ui_meta: Value,
}

fn default_spec_version() -> String {
    "1.0.0".to_string()
}

impl NodeSpec {
    /// Display name from the metadata.
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn input(&self, port_id: &str) -> Option<&PortSpec> {
        self.inputs.iter().find(|p| p.id == port_id)
    }

    pub fn output(&self, port_id: &str) -> Option<&PortSpec> {
        self.outputs.iter().find(|p| p.id == port_id)
    }

    /// Look a port up on the given side.
    pub fn port(&self, direction: PortDirection, port_id: &str) -> Option<&PortSpec> {
        match direction {
            PortDirection::Input => self.input(port_id),
            PortDirection::Output => self.output(port_id),
        }
    }

    pub fn parameter(&self, parameter_id: &str) -> Option<&ParameterSpec> {
        self.parameters.iter().find(|p| p.id == parameter_id)
    }
}

/// Descriptive metadata used by the node library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeMetadata {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: NodeCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
}

/// Library grouping of node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Document,
    Image,
    Audio,
    Video,
    Ai,
    Utility,
}

impl NodeCategory {
    /// Label shown in the node library.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeCategory::Document => "Document",
            NodeCategory::Image => "Image",
            NodeCategory::Audio => "Audio",
            NodeCategory::Video => "Video",
            NodeCategory::Ai => "AI Processing",
            NodeCategory::Utility => "Utilities",
        }
    }
}

impl std::fmt::Display for NodeCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A typed input or output slot on a node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Accepted MIME type patterns.
    pub mime_types: Vec<String>,
    #[serde(default)]
    pub required: bool,
    /// Whether more than one connection may target this port.
    #[serde(default)]
    pub multiple: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PortSpec {
    /// Single-cardinality required port, the common case in the catalog.
    pub fn new(id: impl Into<String>, name: impl Into<String>, mime_types: &[&str]) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            mime_types: mime_types.iter().map(|m| m.to_string()).collect(),
            required: true,
            multiple: false,
            description: None,
        }
    }

    pub fn multiple(mut self, multiple: bool) -> Self {
        self.multiple = multiple;
        self
    }
}

/// Value type of a node parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    String,
    Number,
    Boolean,
    Select,
    Range,
    File,
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ParameterKind::String => "string",
            ParameterKind::Number => "number",
            ParameterKind::Boolean => "boolean",
            ParameterKind::Select => "select",
            ParameterKind::Range => "range",
            ParameterKind::File => "file",
        };
        f.write_str(s)
    }
}

/// A configurable parameter of a node kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSpec {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterKind,
    pub default_value: Value,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ParameterValidation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Input widget hints (placeholder, suffix, step). Never interpreted.
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub ui_hints: Value,
}

/// Bounds and option sets a parameter value must satisfy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterValidation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<SelectOption>>,
}

impl ParameterValidation {
    pub fn range(min: Option<f64>, max: Option<f64>) -> Self {
        Self {
            min,
            max,
            ..Default::default()
        }
    }

    pub fn options(options: Vec<SelectOption>) -> Self {
        Self {
            options: Some(options),
            ..Default::default()
        }
    }
}

/// One entry of a `select` parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: Value,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<Value>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}
