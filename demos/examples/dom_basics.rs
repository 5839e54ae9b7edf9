// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM basics.
//!
//! Builds a small document, moves nodes around, and prints every mutation event and
//! render-tree call the engine produces.
//!
//! Run:
//! - `cargo run -p understory_demos --example dom_basics`

use understory_dom::{Document, MutationEventKind, Outcome, RecordingRenderTree};

fn main() {
    let render = RecordingRenderTree::new();
    let mut doc = Document::with_render_tree(render.clone());
    let root = doc.root();

    for kind in MutationEventKind::ALL {
        doc.add_event_listener(root, kind, true, |doc, ev| {
            println!(
                "  {:<28} target={:?} {:?}",
                ev.kind.name(),
                doc.kind(ev.target),
                ev.related_node,
            );
            Ok(Outcome::Continue)
        })
        .unwrap();
    }

    println!("== Build ==");
    let html = doc.create_element("html");
    let body = doc.create_element("body");
    doc.append_child(root, html.id()).unwrap();
    doc.append_child(html.id(), body.id()).unwrap();

    println!("== Insert a fragment ==");
    let frag = doc.create_document_fragment();
    let para = doc.create_element("p");
    let text = doc.create_text("hello");
    doc.append_child(para.id(), text.id()).unwrap();
    doc.append_child(frag.id(), para.id()).unwrap();
    let note = doc.create_comment("note");
    doc.append_child(frag.id(), note.id()).unwrap();
    doc.append_child(body.id(), frag.id()).unwrap();

    println!("== Edit text ==");
    doc.append_data(text.id(), ", world").unwrap();

    println!("== Replace ==");
    let heading = doc.create_element("h1");
    let old = doc.replace_child(body.id(), heading.id(), para.id()).unwrap();
    println!("  replaced {:?}; still alive: {}", old.id(), doc.is_alive(old.id()));

    println!("== Remove all ==");
    let removed = doc.remove_children(body.id());
    println!("  removed {removed} children");

    println!("== Render tree calls ==");
    for op in render.take() {
        println!("  {op:?}");
    }
    println!("tree version {}", doc.dom_tree_version());
}
