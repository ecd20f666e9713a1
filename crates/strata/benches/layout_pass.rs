use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::time::Duration;
use strata::{DiagramEvent, LayoutConfig, LayoutEngine};

#[derive(Debug, Clone)]
struct ScriptSpec {
    events: Vec<DiagramEvent>,
}

fn build_tree_spec(name: &str, node_count: usize, fanout: usize) -> ScriptSpec {
    let id = |i: usize| format!("{name}_n{i}");
    let mut events: Vec<DiagramEvent> = (0..node_count)
        .map(|i| DiagramEvent::node(id(i), 80.0 + (i % 3) as f64 * 20.0, 40.0))
        .collect();

    // A tree: child i points up to parent (i - 1) / fanout.
    for i in 1..node_count {
        let parent = (i - 1) / fanout.max(1);
        events.push(DiagramEvent::connector(format!("{name}_t{i}"), id(i), id(parent)));
    }

    // Long secondary connectors that need dummy chains.
    for i in (0..node_count).step_by(7) {
        let target = i / 3;
        if target < i {
            events.push(DiagramEvent::connector(format!("{name}_x{i}"), id(i), id(target)));
        }
    }

    ScriptSpec { events }
}

fn bench_full_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("layout_pass");
    group.measurement_time(Duration::from_secs(10));

    let cases = [
        ("tree_50_f3", 50usize, 3usize),
        ("tree_200_f4", 200usize, 4usize),
        ("tree_400_f2", 400usize, 2usize),
    ];

    for (name, nodes, fanout) in cases {
        let spec = build_tree_spec(name, nodes, fanout);
        group.bench_with_input(
            BenchmarkId::new("engine::process", name),
            &spec,
            |b, spec| {
                b.iter_batched(
                    || LayoutEngine::new(LayoutConfig::default()),
                    |mut engine| {
                        let actions = engine.process(black_box(&spec.events));
                        black_box(actions.map(|a| a.len()).unwrap_or_default());
                    },
                    BatchSize::LargeInput,
                )
            },
        );
    }

    group.finish();
}

fn bench_incremental_edit(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental_edit");
    group.measurement_time(Duration::from_secs(10));

    for (name, nodes, fanout) in [("tree_200_f4", 200usize, 4usize)] {
        let spec = build_tree_spec(name, nodes, fanout);
        let mut base = LayoutEngine::new(LayoutConfig::default());
        if base.process(&spec.events).is_err() {
            continue;
        }
        let edit = vec![
            DiagramEvent::node("leaf", 60.0, 30.0),
            DiagramEvent::connector("leaf_e", "leaf", format!("{name}_n1")),
        ];
        group.bench_with_input(BenchmarkId::new("engine::process", name), &edit, |b, edit| {
            b.iter_batched(
                || base.clone(),
                |mut engine| {
                    let actions = engine.process(black_box(edit));
                    black_box(actions.map(|a| a.len()).unwrap_or_default());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_full_pass, bench_incremental_edit);
criterion_main!(benches);
