//! Compilation cost for chain-shaped graphs of growing size.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use stategraph::channels::StateSchema;
use stategraph::graph::GraphBuilder;
use stategraph::node::FnNode;
use stategraph::state::StateUpdate;

fn chain_builder(len: usize) -> GraphBuilder {
    let mut builder = GraphBuilder::new(StateSchema::messages());
    for i in 0..len {
        builder = builder.add_node(
            format!("node_{i}"),
            FnNode::new(|_snapshot, _ctx| async move { Ok(StateUpdate::new()) }),
        );
    }
    builder = builder.set_entry("node_0");
    for i in 0..len - 1 {
        builder = builder.add_edge(format!("node_{i}"), format!("node_{}", i + 1));
    }
    builder.add_edge(format!("node_{}", len - 1), "End")
}

fn bench_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_compile");
    for len in [4usize, 32, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(len), &len, |b, &len| {
            b.iter(|| chain_builder(len).compile().unwrap());
        });
    }
    group.finish();
}

criterion_group!(benches, bench_compile);
criterion_main!(benches);
