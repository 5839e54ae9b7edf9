// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listeners that fight the engine.
//!
//! A removal listener steals the reference child of an in-flight `insert_before`. The engine
//! re-validates after every callout and stops early rather than corrupt the tree: the first
//! fragment child is left floating and the rest stay in the fragment.
//!
//! Run:
//! - `cargo run -p understory_demos --example dom_reentrancy`

use understory_dispatch::kind::MutationEventKind;
use understory_dispatch::types::Outcome;
use understory_dom::{Document, NodeId, NodeKind};

fn names(doc: &Document, parent: NodeId) -> Vec<String> {
    doc.children(parent)
        .map(|c| match doc.kind(c) {
            Some(NodeKind::Element { tag }) => tag.clone(),
            other => format!("{other:?}"),
        })
        .collect()
}

fn main() {
    let mut doc = Document::new();
    let root = doc.root();
    let body = doc.create_element("body");
    let aside = doc.create_element("aside");
    doc.append_child(root, body.id()).unwrap();
    doc.append_child(body.id(), aside.id()).unwrap();
    let reference = doc.create_element("ref");
    doc.append_child(body.id(), reference.id()).unwrap();

    let frag = doc.create_document_fragment();
    let kids: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|t| doc.create_element(t))
        .collect();
    for k in &kids {
        doc.add_child(frag.id(), k.id()).unwrap();
    }

    let (body_id, aside_id, ref_id) = (body.id(), aside.id(), reference.id());
    // The first child to leave the fragment drags the reference child into <aside>.
    doc.add_event_listener(
        frag.id(),
        MutationEventKind::NodeRemoved,
        false,
        move |doc, _| {
            if doc.parent(ref_id) == Some(body_id) {
                println!("  listener: moving <ref> into <aside>");
                doc.append_child(aside_id, ref_id)?;
            }
            Ok(Outcome::Continue)
        },
    )
    .unwrap();

    println!("== insert_before(body, fragment, ref) ==");
    let result = doc.insert_before(body.id(), frag.id(), Some(ref_id));
    println!("  result: {result:?}");
    println!("  body:     {:?}", names(&doc, body.id()));
    println!("  aside:    {:?}", names(&doc, aside.id()));
    println!("  fragment: {:?}", names(&doc, frag.id()));
    println!("  dispatch forbidden afterwards: {}", doc.is_dispatch_forbidden());
}
