// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use understory_dom::{Document, MutationEventKind, NodeHandle, Outcome};

/// A document with an empty `<body>` and `n` detached elements ready to insert.
fn setup(n: usize) -> (Document, NodeHandle, Vec<NodeHandle>) {
    let mut doc = Document::new();
    let root = doc.root();
    let body = doc.create_element("body");
    doc.append_child(root, body.id()).unwrap();
    let kids = (0..n).map(|_| doc.create_element("div")).collect();
    (doc, body, kids)
}

fn listen(doc: &mut Document, body: &NodeHandle) {
    for kind in MutationEventKind::ALL {
        doc.add_event_listener(body.id(), kind, false, |_, ev| {
            black_box(ev.target);
            Ok(Outcome::Continue)
        })
        .unwrap();
    }
}

fn bench_append(c: &mut Criterion) {
    let mut group = c.benchmark_group("append_child");
    for &n in &[256usize, 1024, 4096] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("quiet_n{}", n), |b| {
            b.iter_batched(
                || setup(n),
                |(mut doc, body, kids)| {
                    for k in &kids {
                        doc.append_child(body.id(), k.id()).unwrap();
                    }
                    black_box(doc.child_node_count(body.id()));
                },
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("listened_n{}", n), |b| {
            b.iter_batched(
                || {
                    let (mut doc, body, kids) = setup(n);
                    listen(&mut doc, &body);
                    (doc, body, kids)
                },
                |(mut doc, body, kids)| {
                    for k in &kids {
                        doc.append_child(body.id(), k.id()).unwrap();
                    }
                    black_box(doc.dom_tree_version());
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_insert_before_first(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_before");
    for &n in &[256usize, 1024] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("front_n{}", n), |b| {
            b.iter_batched(
                || setup(n),
                |(mut doc, body, kids)| {
                    for k in &kids {
                        let first = doc.first_child(body.id());
                        doc.insert_before(body.id(), k.id(), first).unwrap();
                    }
                    black_box(doc.child_node_count(body.id()));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_fragment(c: &mut Criterion) {
    let mut group = c.benchmark_group("fragment");
    for &n in &[256usize, 4096] {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_function(format!("drain_n{}", n), |b| {
            b.iter_batched(
                || {
                    let (mut doc, body, kids) = setup(n);
                    let frag = doc.create_document_fragment();
                    for k in &kids {
                        doc.add_child(frag.id(), k.id()).unwrap();
                    }
                    (doc, body, frag)
                },
                |(mut doc, body, frag)| {
                    doc.append_child(body.id(), frag.id()).unwrap();
                    black_box(doc.child_node_count(body.id()));
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_remove(c: &mut Criterion) {
    let mut group = c.benchmark_group("remove");
    for &n in &[1024usize, 16384] {
        group.throughput(Throughput::Elements(n as u64));
        let filled = || {
            let mut doc = Document::new();
            let root = doc.root();
            let body = doc.create_element("body");
            doc.append_child(root, body.id()).unwrap();
            for _ in 0..n {
                let k = doc.create_element("div");
                doc.add_child(body.id(), k.id()).unwrap();
            }
            (doc, body)
        };
        group.bench_function(format!("remove_children_n{}", n), |b| {
            b.iter_batched(
                filled,
                |(mut doc, body)| black_box(doc.remove_children(body.id())),
                BatchSize::SmallInput,
            )
        });
        group.bench_function(format!("remove_child_last_n{}", n), |b| {
            b.iter_batched(
                filled,
                |(mut doc, body)| {
                    while let Some(last) = doc.last_child(body.id()) {
                        black_box(doc.remove_child(body.id(), last).unwrap());
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_append,
    bench_insert_before_first,
    bench_fragment,
    bench_remove
);
criterion_main!(benches);
