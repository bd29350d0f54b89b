//! Benchmarks for graph editing operations
//!
//! Run with: cargo bench

use convert_studio::execution::{ExecutionEngine, FixedStep};
use convert_studio::pipeline::{
    ConnectionRequest, ConnectionValidator, History, NodeId, Pipeline, PipelineEditor,
};
use convert_studio::registry::NodeRegistry;
use convert_studio::Position;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::Arc;

/// Editor holding a linear chain of image-resize nodes.
fn chain(len: usize) -> (PipelineEditor, Vec<NodeId>) {
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

fn bench_connection_admission(c: &mut Criterion) {
    let mut group = c.benchmark_group("connection_admission");

    for len in [10, 100, 500] {
        let (editor, ids) = chain(len);
        let pipeline = editor.pipeline();
        // Worst case: the cycle search walks the whole chain
        let closing = ConnectionRequest::new(
            ids[len - 1].clone(),
            "output",
            ids[0].clone(),
            "input",
        );

        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("cycle_check", len), &closing, |b, req| {
            b.iter(|| {
                let validator = ConnectionValidator::new(black_box(pipeline));
                black_box(validator.explain(req))
            });
        });
    }

    group.finish();
}

fn bench_history_snapshots(c: &mut Criterion) {
    let mut group = c.benchmark_group("history");

    for len in [10, 100] {
        let (editor, _) = chain(len);
        let snapshot: Pipeline = editor.pipeline().clone();

        group.bench_with_input(BenchmarkId::new("push_state", len), &snapshot, |b, snap| {
            let mut history = History::new(50);
            b.iter(|| history.push_state(black_box(snap)));
        });

        group.bench_with_input(BenchmarkId::new("undo_redo", len), &snapshot, |b, snap| {
            let mut history = History::new(50);
            for _ in 0..50 {
                history.push_state(snap);
            }
            b.iter(|| {
                black_box(history.undo());
                black_box(history.redo());
            });
        });
    }

    group.finish();
}

fn bench_editing(c: &mut Criterion) {
    c.bench_function("build_chain_50", |b| b.iter(|| black_box(chain(50))));
}

fn bench_execution(c: &mut Criterion) {
    let mut group = c.benchmark_group("execution");
    for len in [10, 100] {
        let (editor, _) = chain(len);
        group.bench_with_input(BenchmarkId::new("run_to_completion", len), &editor, |b, base| {
            b.iter_batched(
                || base.pipeline().clone(),
                |pipeline| {
                    let mut editor = PipelineEditor::new(Arc::clone(base.registry()));
                    editor.replace_pipeline(pipeline);
                    let mut engine = ExecutionEngine::new(Box::new(FixedStep(20.0)));
                    engine.execute(&mut editor).unwrap();
                    black_box(engine.run_to_completion(&mut editor))
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_connection_admission,
    bench_history_snapshots,
    bench_editing,
    bench_execution,
);

criterion_main!(benches);
