// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coordination with the render tree.
//!
//! The render tree itself lives elsewhere; the document only tells it when nodes gain or
//! lose a peer. A node is [attached](crate::NodeFlags::ATTACHED) once its subtree has been
//! offered to the render tree, and it has a renderer when the bridge asked for one.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use crate::document::{Document, slot, slot_mut};
use crate::types::{NodeFlags, NodeId, NodeKind};

/// Calls the document makes into the render tree.
///
/// None of these may touch the document: they run inside dispatch-forbidden scopes.
pub trait RenderTreeBridge {
    /// Create a render peer for `node`.
    fn attach(&mut self, node: NodeId, kind: &NodeKind);

    /// Destroy the render peer of `node`.
    fn detach(&mut self, node: NodeId);

    /// `node` is about to be removed from its parent.
    fn will_remove(&mut self, _node: NodeId) {}

    /// Whether `node` should get a peer at all.
    fn renderer_is_needed(&self, _node: NodeId, kind: &NodeKind) -> bool {
        match kind {
            NodeKind::Document | NodeKind::Element { .. } => true,
            NodeKind::Text { data } => !data.is_empty(),
            _ => false,
        }
    }

    /// The content of `node` changed without changing whether it needs a peer.
    fn repaint(&mut self, _node: NodeId) {}
}

/// A render tree that keeps no state.
#[derive(Copy, Clone, Debug, Default)]
pub struct NullRenderTree;

impl RenderTreeBridge for NullRenderTree {
    fn attach(&mut self, _node: NodeId, _kind: &NodeKind) {}

    fn detach(&mut self, _node: NodeId) {}
}

/// One call into a [`RecordingRenderTree`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RenderOp {
    /// A peer was created.
    Attach(NodeId),
    /// A peer was destroyed.
    Detach(NodeId),
    /// The node is about to be removed.
    WillRemove(NodeId),
    /// The node's peer must be repainted.
    Repaint(NodeId),
}

/// A render tree that records every call.
///
/// Clones share the same log, so a test can keep one clone and hand the other to
/// [`Document::with_render_tree`].
#[derive(Clone, Debug, Default)]
pub struct RecordingRenderTree {
    ops: Rc<RefCell<Vec<RenderOp>>>,
}

impl RecordingRenderTree {
    /// A recorder with an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the recorded calls, leaving the log empty.
    pub fn take(&self) -> Vec<RenderOp> {
        core::mem::take(&mut *self.ops.borrow_mut())
    }

    /// Number of calls recorded so far.
    pub fn len(&self) -> usize {
        self.ops.borrow().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ops.borrow().is_empty()
    }
}

impl RenderTreeBridge for RecordingRenderTree {
    fn attach(&mut self, node: NodeId, _kind: &NodeKind) {
        self.ops.borrow_mut().push(RenderOp::Attach(node));
    }

    fn detach(&mut self, node: NodeId) {
        self.ops.borrow_mut().push(RenderOp::Detach(node));
    }

    fn will_remove(&mut self, node: NodeId) {
        self.ops.borrow_mut().push(RenderOp::WillRemove(node));
    }

    fn repaint(&mut self, node: NodeId) {
        self.ops.borrow_mut().push(RenderOp::Repaint(node));
    }
}

impl Document {
    /// Attach `node` and every not-yet-attached descendant, parents first.
    pub fn attach(&mut self, node: NodeId) {
        if self.is_attached(node) {
            return;
        }
        for id in self.collect_subtree(node) {
            let Self { nodes, render, .. } = self;
            let Some(n) = slot_mut(nodes, id) else {
                continue;
            };
            if n.flags.contains(NodeFlags::ATTACHED) {
                continue;
            }
            n.flags.insert(NodeFlags::ATTACHED);
            if render.renderer_is_needed(id, &n.kind) {
                render.attach(id, &n.kind);
                n.flags.insert(NodeFlags::HAS_RENDERER);
            }
        }
    }

    /// Detach `node` and its attached descendants, children first.
    pub fn detach(&mut self, node: NodeId) {
        if !self.is_attached(node) {
            return;
        }
        for id in self.collect_subtree(node).into_iter().rev() {
            let Self { nodes, render, .. } = self;
            let Some(n) = slot_mut(nodes, id) else {
                continue;
            };
            if n.flags.contains(NodeFlags::HAS_RENDERER) {
                render.detach(id);
            }
            n.flags.remove(NodeFlags::ATTACHED | NodeFlags::HAS_RENDERER);
        }
    }

    /// Tell the render tree that the attached part of `node`'s subtree is about to go.
    pub(crate) fn will_remove(&mut self, node: NodeId) {
        for id in self.collect_subtree(node).into_iter().rev() {
            if self.is_attached(id) {
                self.render.will_remove(id);
            }
        }
    }

    /// Re-run attachment if the node's need for a renderer flipped; otherwise repaint it.
    pub(crate) fn update_renderer(&mut self, node: NodeId) {
        let Some(n) = slot(&self.nodes, node) else {
            return;
        };
        if !n.flags.contains(NodeFlags::ATTACHED) {
            return;
        }
        let has = n.flags.contains(NodeFlags::HAS_RENDERER);
        if self.render.renderer_is_needed(node, &n.kind) != has {
            self.detach(node);
            self.attach(node);
        } else if has {
            self.render.repaint(node);
        }
    }
}
