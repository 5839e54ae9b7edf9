// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dom::{Document, NodeHandle};

/// A parentless chain `depth` nodes deep, held only by the returned handle.
fn deep_chain(depth: usize) -> (Document, NodeHandle) {
    let mut doc = Document::new();
    let mut top = doc.create_element("leaf");
    for _ in 1..depth {
        let parent = doc.create_element("n");
        doc.add_child(parent.id(), top.id()).unwrap();
        top = parent;
    }
    (doc, top)
}

/// A parentless node with `width` children, held only by the returned handle.
fn wide(width: usize) -> (Document, NodeHandle) {
    let mut doc = Document::new();
    let top = doc.create_element("p");
    for _ in 0..width {
        let c = doc.create_element("c");
        doc.add_child(top.id(), c.id()).unwrap();
    }
    (doc, top)
}

fn bench_teardown(c: &mut Criterion) {
    let mut group = c.benchmark_group("teardown");
    for &n in &[10_000usize, 100_000] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("deep_n{}", n), |b| {
            b.iter_batched(
                || deep_chain(n),
                |(mut doc, top)| {
                    drop(top);
                    black_box(doc.collect_garbage())
                },
                BatchSize::LargeInput,
            )
        });
        group.bench_function(format!("wide_n{}", n), |b| {
            b.iter_batched(
                || wide(n),
                |(mut doc, top)| {
                    drop(top);
                    black_box(doc.collect_garbage())
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_teardown);
criterion_main!(benches);
