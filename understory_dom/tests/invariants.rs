// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Random mutation sequences keep the tree structurally sound.

use proptest::prelude::*;
use understory_dom::{Document, MutationEventKind, NodeHandle, NodeId, Outcome};

#[derive(Clone, Debug)]
enum Op {
    Append { parent: usize, child: usize },
    InsertBefore { parent: usize, child: usize, reference: usize },
    Replace { parent: usize, new: usize, old: usize },
    Remove { parent: usize, child: usize },
    RemoveChildren { parent: usize },
    AppendFragment { parent: usize, children: Vec<usize> },
}

const POOL: usize = 12;

fn op() -> impl Strategy<Value = Op> {
    let i = || 0..POOL;
    prop_oneof![
        4 => (i(), i()).prop_map(|(parent, child)| Op::Append { parent, child }),
        3 => (i(), i(), 0..8_usize)
            .prop_map(|(parent, child, reference)| Op::InsertBefore { parent, child, reference }),
        2 => (i(), i(), 0..8_usize).prop_map(|(parent, new, old)| Op::Replace { parent, new, old }),
        2 => (i(), 0..8_usize).prop_map(|(parent, child)| Op::Remove { parent, child }),
        1 => i().prop_map(|parent| Op::RemoveChildren { parent }),
        1 => (i(), prop::collection::vec(i(), 0..4))
            .prop_map(|(parent, children)| Op::AppendFragment { parent, children }),
    ]
}

/// A document with `<body>` under the root and a pool of held nodes; `pool[0]` is the body.
fn setup() -> (Document, Vec<NodeHandle>) {
    let mut doc = Document::new();
    let root = doc.root();
    let mut pool = Vec::with_capacity(POOL);
    let body = doc.create_element("body");
    doc.append_child(root, body.id()).unwrap();
    pool.push(body);
    for i in 1..POOL {
        let node = if i % 3 == 0 {
            doc.create_text(format!("t{i}"))
        } else {
            doc.create_element(format!("e{i}"))
        };
        pool.push(node);
    }
    (doc, pool)
}

/// The `n`-th child of `parent`, wrapping.
fn nth_child(doc: &Document, parent: NodeId, n: usize) -> Option<NodeId> {
    let count = doc.child_node_count(parent);
    if count == 0 {
        None
    } else {
        doc.child_node(parent, n % count)
    }
}

fn apply(doc: &mut Document, pool: &[NodeHandle], op: &Op) {
    let id = |i: usize| pool[i].id();
    match *op {
        Op::Append { parent, child } => {
            let _ = doc.append_child(id(parent), id(child));
        }
        Op::InsertBefore {
            parent,
            child,
            reference,
        } => {
            let reference = nth_child(doc, id(parent), reference);
            let _ = doc.insert_before(id(parent), id(child), reference);
        }
        Op::Replace { parent, new, old } => {
            if let Some(old) = nth_child(doc, id(parent), old) {
                let _ = doc.replace_child(id(parent), id(new), old);
            }
        }
        Op::Remove { parent, child } => {
            if let Some(child) = nth_child(doc, id(parent), child) {
                let removed = doc.remove_child(id(parent), child).unwrap();
                assert_eq!(removed.id(), child);
                assert_eq!(doc.parent(child), None);
            }
        }
        Op::RemoveChildren { parent } => {
            let before = doc.child_node_count(id(parent));
            assert_eq!(doc.remove_children(id(parent)), before);
            assert_eq!(doc.first_child(id(parent)), None);
        }
        Op::AppendFragment {
            parent,
            ref children,
        } => {
            let frag = doc.create_document_fragment();
            for &c in children {
                let _ = doc.append_child(frag.id(), id(c));
            }
            if doc.append_child(id(parent), frag.id()).is_ok() {
                assert_eq!(doc.first_child(frag.id()), None, "fragment drained");
            }
        }
    }
}

fn check_links(doc: &Document, parent: NodeId) {
    let kids: Vec<NodeId> = doc.children(parent).collect();
    assert_eq!(kids.len(), doc.child_node_count(parent));
    assert_eq!(doc.first_child(parent), kids.first().copied());
    assert_eq!(doc.last_child(parent), kids.last().copied());
    for (i, &k) in kids.iter().enumerate() {
        assert_eq!(doc.parent(k), Some(parent));
        let prev = i.checked_sub(1).map(|p| kids[p]);
        assert_eq!(doc.previous_sibling(k), prev);
        assert_eq!(doc.next_sibling(k), kids.get(i + 1).copied());
    }
}

fn check_tree(doc: &Document, pool: &[NodeHandle]) {
    let root = doc.root();
    let in_doc: Vec<NodeId> = doc.subtree(root).collect();
    assert!(in_doc.len() <= POOL + 1, "cycle or leaked node under the root");
    for &n in &in_doc {
        check_links(doc, n);
        assert!(doc.in_document(n), "{n:?} is under the root");
    }
    for h in pool {
        let n = h.id();
        assert!(doc.is_alive(n));
        check_links(doc, n);
        assert!(!doc.is_descendant_of(n, n));
        assert_eq!(doc.in_document(n), doc.contains(root, n));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn random_mutations_keep_links_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let (mut doc, pool) = setup();
        for op in &ops {
            apply(&mut doc, &pool, op);
            check_tree(&doc, &pool);
        }
        prop_assert!(!doc.is_dispatch_forbidden());
    }

    #[test]
    fn reentrant_listeners_keep_links_consistent(ops in prop::collection::vec(op(), 1..40)) {
        let (mut doc, pool) = setup();
        let body = pool[0].id();
        let root = doc.root();
        // Cap the body at three children by evicting its first child on every insertion.
        doc.add_event_listener(root, MutationEventKind::NodeInserted, true, move |doc, ev| {
            if doc.child_node_count(body) > 3
                && let Some(first) = doc.first_child(body)
                && first != ev.target
            {
                let _ = doc.remove_child(body, first);
            }
            Ok(Outcome::Continue)
        })
        .unwrap();
        // Moving a node out of the document drags its next sibling along.
        doc.add_event_listener(
            root,
            MutationEventKind::NodeRemovedFromDocument,
            true,
            move |doc, ev| {
                if let Some(parent) = doc.parent(ev.target)
                    && let Some(next) = doc.next_sibling(ev.target)
                    && parent == body
                {
                    let _ = doc.remove_child(parent, next);
                }
                Ok(Outcome::Continue)
            },
        )
        .unwrap();
        for op in &ops {
            apply_lenient(&mut doc, &pool, op);
            check_tree(&doc, &pool);
        }
        prop_assert!(!doc.is_dispatch_forbidden());
    }
}

/// Like [`apply`], but listeners may interfere, so results are not asserted.
fn apply_lenient(doc: &mut Document, pool: &[NodeHandle], op: &Op) {
    let id = |i: usize| pool[i].id();
    match *op {
        Op::Remove { parent, child } => {
            if let Some(child) = nth_child(doc, id(parent), child) {
                let _ = doc.remove_child(id(parent), child);
            }
        }
        Op::RemoveChildren { parent } => {
            doc.remove_children(id(parent));
        }
        Op::AppendFragment {
            parent,
            ref children,
        } => {
            let frag = doc.create_document_fragment();
            for &c in children {
                let _ = doc.append_child(frag.id(), id(c));
            }
            let _ = doc.append_child(id(parent), frag.id());
        }
        _ => apply(doc, pool, op),
    }
}
