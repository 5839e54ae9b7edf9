// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dom --heading-base-level=0

//! Understory DOM: an arena-backed node tree with a reentrancy-safe mutation engine.
//!
//! ## Overview
//!
//! A [`Document`] owns every node. Nodes are addressed by generational [`NodeId`]s and kept
//! alive by [`NodeHandle`]s; a node with no parent and no handles is reclaimed when the
//! outermost mutation finishes. Container operations (`insert_before`, `append_child`,
//! `replace_child`, `remove_child`, `remove_children`) validate their arguments, splice the
//! sibling lists, coordinate with a [`RenderTreeBridge`], and fire DOM mutation events.
//!
//! ## Reentrancy
//!
//! Mutation listeners receive `&mut Document` and may run arbitrary mutations, including on
//! the nodes being moved. Raw link surgery happens inside a forbid scope in which no listener
//! can run; every notification happens outside it, and operations re-validate after each one.
//! A child that a listener moved elsewhere is skipped rather than linked twice.
//!
//! ## Events
//!
//! - `DOMNodeInserted` / `DOMNodeRemoved` fire at the moved child and bubble.
//! - `DOMNodeInsertedIntoDocument` / `DOMNodeRemovedFromDocument` fire at every node of a
//!   subtree entering or leaving the document and do not bubble.
//! - `DOMSubtreeModified` fires once per operation at the container.
//! - `DOMCharacterDataModified` fires when text or comment data changes.
//!
//! The document keeps a listener-type mask, so none of this costs anything until a listener
//! for that kind is registered.
//!
//! ## Example
//!
//! ```
//! use understory_dom::{Document, MutationEventKind, Outcome};
//!
//! let mut doc = Document::new();
//! let root = doc.root();
//! let body = doc.create_element("body");
//! doc.append_child(root, body.id()).unwrap();
//!
//! // Listeners may mutate the tree they are observing.
//! let body_id = body.id();
//! doc.add_event_listener(body_id, MutationEventKind::NodeInserted, false, move |doc, ev| {
//!     if doc.child_node_count(body_id) > 2 {
//!         doc.remove_child(body_id, ev.target)?;
//!     }
//!     Ok(Outcome::Continue)
//! })
//! .unwrap();
//!
//! let frag = doc.create_document_fragment();
//! let kids: Vec<_> = ["a", "b", "c"].iter().map(|t| doc.create_element(*t)).collect();
//! for k in &kids {
//!     doc.append_child(frag.id(), k.id()).unwrap();
//! }
//! doc.append_child(body_id, frag.id()).unwrap();
//!
//! assert_eq!(doc.child_node_count(body_id), 2);
//! assert_eq!(doc.first_child(frag.id()), None);
//! assert!(doc.in_document(kids[0].id()));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod character_data;
mod container;
pub mod document;
pub mod error;
pub mod events;
pub mod lifecycle;
mod notify;
pub mod policy;
pub mod render;
mod teardown;
pub mod types;

pub use document::{Children, Document, Subtree};
pub use error::DomException;
pub use events::{Listener, ListenerId, MutationEvent};
pub use lifecycle::LifecycleHook;
pub use policy::{ChildPolicy, DomChildPolicy, PermissiveChildPolicy};
pub use render::{NullRenderTree, RecordingRenderTree, RenderOp, RenderTreeBridge};
pub use teardown::TeardownStats;
pub use types::{NodeFlags, NodeHandle, NodeId, NodeKind, NodeType};

pub use understory_dispatch::kind::{ListenerTypes, MutationEventKind};
pub use understory_dispatch::types::{Outcome, Phase};
