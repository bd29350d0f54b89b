//! Integration tests for graph editing
//!
//! These tests validate admission control and structural invariants:
//! - Wildcard, endpoint, cardinality and cycle checks on connections
//! - Cascading node removal
//! - Batch delete of a selection
//! - Acyclicity and cardinality under arbitrary edit sequences

mod common;

use common::builders::{resize_chain, PipelineBuilder, SpecBuilder};
use convert_studio::pipeline::{
    ConnectionRejection, ConnectionRequest, ConnectionValidator, NodeId, PipelineEditor,
    PipelineError, RejectionReason,
};
use convert_studio::registry::{NodeRegistry, FILE_INPUT_SPEC_ID};
use convert_studio::{IncomingFile, Position};
use proptest::prelude::*;
use serde_json::json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

fn rejection(err: PipelineError) -> ConnectionRejection {
    match err {
        PipelineError::ConnectionRejected(rejection) => rejection,
        other => panic!("expected a rejected connection, got {:?}", other),
    }
}

#[test]
fn test_file_input_into_resize_scenario() {
    let mut p = PipelineBuilder::new()
        .node("a", FILE_INPUT_SPEC_ID)
        .node("b", "image-resize")
        .node("c", FILE_INPUT_SPEC_ID)
        .build();
    let (a, b, c) = (p.id("a"), p.id("b"), p.id("c"));

    // `*/*` on the file input matches the image types on the resize input
    p.editor
        .add_connection(ConnectionRequest::new(a.clone(), "output", b.clone(), "input"))
        .unwrap();

    // A file input has no input ports
    let err = p
        .editor
        .add_connection(ConnectionRequest::new(b.clone(), "output", a.clone(), "input"))
        .unwrap_err();
    assert_eq!(rejection(err).reason(), RejectionReason::Endpoint);

    // The resize input is single-cardinality
    let err = p
        .editor
        .add_connection(ConnectionRequest::new(c.clone(), "output", b.clone(), "input"))
        .unwrap_err();
    assert_eq!(rejection(err).reason(), RejectionReason::Cardinality);

    assert_eq!(p.editor.pipeline().connections.len(), 1);
}

#[test]
fn test_cycle_rejected_without_mutation() {
    let (mut editor, ids) = resize_chain(3);
    let before = editor.pipeline().clone();
    let depth = editor.undo_depth();

    let err = editor
        .add_connection(ConnectionRequest::new(
            ids[2].clone(),
            "output",
            ids[0].clone(),
            "input",
        ))
        .unwrap_err();

    // The chain head's input is free, so only the cycle check can refuse
    assert_eq!(rejection(err), ConnectionRejection::WouldCreateCycle);
    assert_eq!(editor.pipeline(), &before);
    assert_eq!(editor.undo_depth(), depth);
}

#[test]
fn test_self_loop_is_a_cycle() {
    let mut p = PipelineBuilder::new().node("r", "image-resize").build();
    let r = p.id("r");
    let err = p
        .editor
        .add_connection(ConnectionRequest::new(r.clone(), "output", r, "input"))
        .unwrap_err();
    assert_eq!(rejection(err).reason(), RejectionReason::Cycle);
}

#[test]
fn test_incompatible_formats() {
    let mut p = PipelineBuilder::new()
        .node("tts", "text-to-speech")
        .node("resize", "image-resize")
        .build();
    let err = p
        .editor
        .add_connection(ConnectionRequest::new(
            p.id("tts"),
            "output",
            p.id("resize"),
            "input",
        ))
        .unwrap_err();
    assert_eq!(rejection(err).reason(), RejectionReason::IncompatibleFormat);
}

#[test]
fn test_major_type_match_is_enough() {
    // audio/mpeg from text-to-speech feeds audio-convert's audio/* input
    let p = PipelineBuilder::new()
        .node("tts", "text-to-speech")
        .node("audio", "audio-convert")
        .connect("tts", "audio")
        .build();
    assert_eq!(p.editor.pipeline().connections.len(), 1);
}

#[test]
fn test_multi_input_port_accepts_many() {
    let registry = NodeRegistry::from_specs(vec![
        SpecBuilder::new("text-source")
            .output("output", &["text/plain"])
            .build(),
        SpecBuilder::new("merge")
            .multi_input("input", &["text/plain"])
            .output("output", &["text/plain"])
            .build(),
    ])
    .unwrap();

    let p = PipelineBuilder::with_registry(registry)
        .node("s1", "text-source")
        .node("s2", "text-source")
        .node("m", "merge")
        .connect("s1", "m")
        .connect("s2", "m")
        .build();
    assert_eq!(p.editor.pipeline().incoming(&p.id("m"), "input").len(), 2);
}

#[test]
fn test_validator_is_valid_matches_explain() {
    let (editor, ids) = resize_chain(2);
    let validator = ConnectionValidator::new(editor.pipeline());
    let back = ConnectionRequest::new(ids[1].clone(), "output", ids[0].clone(), "input");
    assert!(!validator.is_valid(&back));
    assert!(validator.would_create_cycle(&ids[1], &ids[0]));
    assert!(!validator.would_create_cycle(&ids[0], &ids[1]));
}

#[test]
fn test_remove_node_cascades() {
    let mut p = PipelineBuilder::new()
        .node("in", FILE_INPUT_SPEC_ID)
        .node("resize", "image-resize")
        .node("convert", "image-format-convert")
        .connect("in", "resize")
        .connect("resize", "convert")
        .build();

    assert!(p.editor.remove_node(&p.id("resize")));
    assert_eq!(p.editor.pipeline().nodes.len(), 2);
    assert!(p.editor.pipeline().connections.is_empty());

    // Speculative removal of an absent id is a no-op
    let depth = p.editor.undo_depth();
    assert!(!p.editor.remove_node(&NodeId::new("ghost")));
    assert_eq!(p.editor.undo_depth(), depth);
}

#[test]
fn test_unknown_spec_rejected() {
    let mut editor = PipelineEditor::new(Arc::new(NodeRegistry::builtin()));
    let err = editor
        .add_node("does-not-exist", Position::default(), None)
        .unwrap_err();
    assert_eq!(err, PipelineError::UnknownSpec("does-not-exist".to_string()));
    assert!(editor.pipeline().is_empty());
}

#[test]
fn test_parameter_update_rejects_out_of_range() {
    let mut p = PipelineBuilder::new().node("r", "image-resize").build();
    let id = p.id("r");
    let before = p.editor.pipeline().node(&id).unwrap().parameters.clone();

    let err = p
        .editor
        .update_node_parameters(
            &id,
            BTreeMap::from([
                ("width".to_string(), json!(640)),
                ("height".to_string(), json!(0)),
            ]),
        )
        .unwrap_err();
    assert_eq!(err.parameter(), Some("height"));
    // Nothing applied, not even the valid width
    assert_eq!(p.editor.pipeline().node(&id).unwrap().parameters, before);
}

#[test]
fn test_file_ingestion_records_upload() {
    let mut editor = PipelineEditor::new(Arc::new(NodeRegistry::builtin()));
    let (node_id, file_id) = editor
        .add_file_node(
            IncomingFile::new("photo.png", 2048, "image/png", "blob:photo"),
            Position::new(10.0, 10.0),
        )
        .unwrap();

    let node = editor.pipeline().node(&node_id).unwrap();
    assert_eq!(node.spec_id(), FILE_INPUT_SPEC_ID);
    let artifact = node.output("output").unwrap();
    assert_eq!(artifact.handle, "blob:photo");
    assert_eq!(artifact.mime_type, "image/png");

    assert_eq!(editor.uploaded_files().len(), 1);
    assert!(editor.remove_uploaded_file(&file_id));
    assert!(editor.uploaded_files().is_empty());
    // The node keeps its artifact
    assert!(editor.pipeline().node(&node_id).unwrap().output("output").is_some());
}

#[test]
fn test_delete_selection_is_one_history_entry() {
    let mut p = PipelineBuilder::new()
        .node("in", FILE_INPUT_SPEC_ID)
        .node("resize", "image-resize")
        .node("convert", "image-format-convert")
        .connect("in", "resize")
        .connect("resize", "convert")
        .build();
    let before = p.editor.pipeline().clone();

    assert!(p.editor.select_node(&p.id("resize"), false));
    assert!(p.editor.select_node(&p.id("convert"), true));
    assert_eq!(p.editor.delete_selection(), 2);
    assert_eq!(p.editor.pipeline().nodes.len(), 1);
    assert!(p.editor.selection().is_empty());

    assert!(p.editor.undo());
    assert_eq!(p.editor.pipeline(), &before);
}

// ==================== Properties ====================

#[derive(Debug, Clone)]
enum Edit {
    Add,
    Connect(usize, usize),
    Remove(usize),
}

fn edit_strategy() -> impl Strategy<Value = Edit> {
    prop_oneof![
        2 => Just(Edit::Add),
        5 => (0usize..16, 0usize..16).prop_map(|(a, b)| Edit::Connect(a, b)),
        1 => (0usize..16).prop_map(Edit::Remove),
    ]
}

fn has_cycle(editor: &PipelineEditor) -> bool {
    let pipeline = editor.pipeline();
    let mut adjacency: HashMap<&NodeId, Vec<&NodeId>> = HashMap::new();
    for c in &pipeline.connections {
        adjacency.entry(&c.source).or_default().push(&c.target);
    }
    // A graph is acyclic iff a topological order covers every node with
    // each edge pointing forward in that order.
    let order = pipeline.topological_order();
    let rank: HashMap<&NodeId, usize> = order.iter().enumerate().map(|(i, id)| (id, i)).collect();
    adjacency
        .iter()
        .any(|(from, tos)| tos.iter().any(|to| rank[to] <= rank[from]))
}

proptest! {
    #[test]
    fn prop_graph_stays_acyclic_and_single_fed(edits in prop::collection::vec(edit_strategy(), 1..60)) {
        // Mix image nodes (single inputs) with a file input so wildcard
        // sources take part too.
        let mut editor = PipelineEditor::new(Arc::new(NodeRegistry::builtin()));
        let mut ids: Vec<NodeId> = Vec::new();
        for edit in edits {
            match edit {
                Edit::Add => {
                    let spec = if ids.len() % 4 == 0 { FILE_INPUT_SPEC_ID } else { "image-resize" };
                    ids.push(editor.add_node(spec, Position::default(), None).unwrap());
                }
                Edit::Connect(a, b) if !ids.is_empty() => {
                    let from = ids[a % ids.len()].clone();
                    let to = ids[b % ids.len()].clone();
                    let before = editor.pipeline().connections.len();
                    if editor.add_connection(ConnectionRequest::new(from, "output", to, "input")).is_err() {
                        prop_assert_eq!(editor.pipeline().connections.len(), before);
                    }
                }
                Edit::Remove(i) if !ids.is_empty() => {
                    let id = ids.remove(i % ids.len());
                    let nodes = editor.pipeline().nodes.len();
                    let conns = editor.pipeline().connections.len();
                    let incident = editor.pipeline().incident_connections(&id).len();
                    prop_assert!(editor.remove_node(&id));
                    prop_assert_eq!(editor.pipeline().nodes.len(), nodes - 1);
                    prop_assert_eq!(editor.pipeline().connections.len(), conns - incident);
                    prop_assert!(editor.pipeline().incident_connections(&id).is_empty());
                }
                _ => {}
            }

            prop_assert!(!has_cycle(&editor));
            let mut fed = HashSet::new();
            for c in &editor.pipeline().connections {
                prop_assert!(fed.insert((c.target.clone(), c.target_port.clone())));
            }
            prop_assert!(editor.pipeline().check_integrity().is_ok());
        }
    }
}
