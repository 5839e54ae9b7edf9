// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Destroying unreferenced nodes without recursion.
//!
//! A node with no parent and no [`NodeHandle`](crate::NodeHandle)s is garbage. Garbage is
//! found through a list of floating candidates (every node that was created or lost its
//! parent) and destroyed when the outermost mutation finishes, or on an explicit
//! [`Document::collect_garbage`]. Mutations only sweep when a candidate was added since the
//! last sweep; a candidate whose last handle drops later waits for the next one, unless a
//! container operation touches its tree first, in which case the tree above the touched node is reaped on entry.
//!
//! Destroying a node releases its children. Unreferenced children are queued rather than
//! destroyed in place; only the outermost destroy drains the queue, so a nested destroy
//! never goes more than one level deep regardless of tree depth. Children that are still
//! referenced survive as floating nodes.

use alloc::collections::VecDeque;
use alloc::rc::Rc;

use crate::document::Document;
use crate::types::NodeId;

/// Counters describing teardown work since the document was created.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TeardownStats {
    /// Nodes destroyed.
    pub destroyed: u64,
    /// Deepest nesting of destroy calls observed.
    pub max_depth: u32,
}

/// Shared state of nested destroy calls.
#[derive(Debug, Default)]
pub(crate) struct TeardownContext {
    depth: u32,
    pending: VecDeque<NodeId>,
    stats: TeardownStats,
}

impl TeardownContext {
    /// Returns whether this call is the outermost one.
    fn enter(&mut self) -> bool {
        self.depth += 1;
        self.stats.max_depth = self.stats.max_depth.max(self.depth);
        self.depth == 1
    }

    fn exit(&mut self) {
        debug_assert!(self.depth > 0, "unbalanced teardown exit");
        self.depth -= 1;
    }
}

enum Candidate {
    Gone,
    Linked,
    Held,
    Garbage,
}

impl Document {
    /// Teardown counters.
    pub fn teardown_stats(&self) -> TeardownStats {
        self.teardown.stats
    }

    /// Destroy every unreferenced parentless node and return how many nodes were destroyed,
    /// descendants included.
    pub fn collect_garbage(&mut self) -> usize {
        self.sweep_floating()
    }

    /// Destroy the detached tree above `id` if nothing holds its top any more.
    ///
    /// A handle can drop between sweeps, leaving an unreferenced parentless node that still
    /// looks like a parent. Operations reap such trees before using their nodes; held
    /// descendants are unlinked and survive, as in a sweep. `id` itself is never destroyed.
    pub(crate) fn reap_dead_ancestors(&mut self, id: NodeId) {
        let Some(mut top) = self.parent(id) else {
            return;
        };
        while let Some(p) = self.parent(top) {
            top = p;
        }
        if top != self.root() && self.ref_count(top) == 0 {
            log::debug!("reaping unreferenced tree {top:?} above {id:?}");
            self.destroy(top);
        }
    }

    /// Remember `id` as possibly unreferenced.
    pub(crate) fn mark_floating(&mut self, id: NodeId) {
        if id == self.root() {
            return;
        }
        let Some(n) = self.node_mut(id) else {
            return;
        };
        if !n.floating {
            n.floating = true;
            self.floating.push(id);
            self.floating_dirty = true;
        }
    }

    fn classify(&mut self, id: NodeId) -> Candidate {
        let Some(n) = self.node_mut(id) else {
            return Candidate::Gone;
        };
        if n.parent.is_some() {
            n.floating = false;
            Candidate::Linked
        } else if Rc::strong_count(&n.anchor) > 1 {
            Candidate::Held
        } else {
            n.floating = false;
            Candidate::Garbage
        }
    }

    pub(crate) fn sweep_floating(&mut self) -> usize {
        debug_assert!(
            !self.guard.is_forbidden(),
            "garbage collection inside a forbid scope"
        );
        let before = self.teardown.stats.destroyed;
        loop {
            let candidates = core::mem::take(&mut self.floating);
            let mut progress = false;
            for id in candidates {
                match self.classify(id) {
                    Candidate::Gone | Candidate::Linked => {}
                    Candidate::Held => self.floating.push(id),
                    Candidate::Garbage => {
                        self.destroy(id);
                        progress = true;
                    }
                }
            }
            // Destroyed listeners may have released the last handle to another candidate.
            if !progress {
                break;
            }
        }
        self.floating_dirty = false;
        let destroyed = self.teardown.stats.destroyed - before;
        if destroyed > 0 {
            log::debug!("reclaimed {destroyed} unreferenced nodes");
        }
        usize::try_from(destroyed).unwrap_or(usize::MAX)
    }

    /// Destroy an unreferenced parentless node, releasing its children.
    fn destroy(&mut self, id: NodeId) {
        debug_assert!(
            id != self.root() && self.parent(id).is_none() && self.ref_count(id) == 0,
            "destroying a reachable node"
        );
        let outermost = self.teardown.enter();
        self.forbid_dispatch(|doc| {
            doc.detach(id);
            let mut child = doc.first_child(id);
            while let Some(c) = child {
                child = doc.next_sibling(c);
                doc.set_parent(c, None);
                doc.set_previous_sibling(c, None);
                doc.set_next_sibling(c, None);
                if doc.ref_count(c) == 0 {
                    doc.teardown.pending.push_back(c);
                } else {
                    if doc.in_document(c) {
                        doc.removed_from_document(c);
                    }
                    doc.mark_floating(c);
                }
            }
            doc.set_first_child(id, None);
            doc.set_last_child(id, None);
        });

        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
        self.teardown.stats.destroyed += 1;

        if outermost {
            while let Some(next) = self.teardown.pending.pop_front() {
                log::trace!("draining queued teardown of {next:?}");
                self.destroy(next);
            }
        }
        self.teardown.exit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::NodeHandle;
    use alloc::vec::Vec;
    use understory_dispatch::kind::MutationEventKind;
    use understory_dispatch::types::Outcome;

    #[test]
    fn deep_chain_is_destroyed_without_recursion() {
        const DEPTH: usize = 100_000;
        let mut doc = Document::new();
        // Build leaf-first so every link is O(1).
        let mut top = doc.create_element("leaf");
        for _ in 1..DEPTH {
            let parent = doc.create_element("n");
            doc.add_child(parent.id(), top.id()).unwrap();
            top = parent;
        }
        let top_id = top.id();
        assert_eq!(doc.collect_garbage(), 0, "held chain survives");
        drop(top);
        assert_eq!(doc.collect_garbage(), DEPTH);
        assert!(!doc.is_alive(top_id));
        let stats = doc.teardown_stats();
        assert_eq!(stats.destroyed, DEPTH as u64);
        assert!(stats.max_depth <= 2, "nesting was {}", stats.max_depth);
        assert_eq!(doc.nodes.iter().filter(|n| n.is_some()).count(), 1);
    }

    #[test]
    fn held_children_outlive_their_parent() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let a = doc.create_element("a");
        let b_handle = doc.create_element("b");
        let b = b_handle.id();
        doc.append_child(p.id(), a.id()).unwrap();
        doc.append_child(p.id(), b).unwrap();
        drop(b_handle);
        drop(p);
        doc.collect_garbage();
        assert!(doc.is_alive(a.id()));
        assert!(!doc.is_alive(b));
        assert_eq!(doc.parent(a.id()), None);
        assert_eq!(doc.next_sibling(a.id()), None);

        let a_id = a.id();
        drop(a);
        assert_eq!(doc.collect_garbage(), 1);
        assert!(!doc.is_alive(a_id));
    }

    #[test]
    fn garbage_is_reclaimed_after_a_mutation() {
        let mut doc = Document::new();
        let root = doc.root();
        let dropped = doc.create_comment("gone").id();
        let kept = doc.create_comment("kept");
        doc.append_child(root, kept.id()).unwrap();
        assert!(!doc.is_alive(dropped));
        assert!(doc.is_alive(kept.id()));
    }

    #[test]
    fn released_handle_waits_for_the_next_candidate() {
        let mut doc = Document::new();
        let root = doc.root();
        let held = doc.create_comment("held");
        let held_id = held.id();
        let a = doc.create_comment("a");
        doc.append_child(root, a.id()).unwrap();
        assert!(doc.is_alive(held_id));

        drop(held);
        doc.set_data(a.id(), "edited").unwrap();
        assert!(doc.is_alive(held_id), "no new candidate, no sweep");

        let b = doc.create_comment("b");
        doc.append_child(root, b.id()).unwrap();
        assert!(!doc.is_alive(held_id));
    }

    #[test]
    fn handles_released_by_destroyed_listeners_are_collected() {
        let mut doc = Document::new();
        let owner = doc.create_element("owner");
        let captured = doc.create_element("captured");
        let captured_id = captured.id();
        doc.add_event_listener(
            owner.id(),
            MutationEventKind::SubtreeModified,
            false,
            move |_, _| {
                let _keep: &NodeHandle = &captured;
                Ok(Outcome::Continue)
            },
        )
        .unwrap();
        doc.collect_garbage();
        assert!(doc.is_alive(captured_id), "held by the listener");
        drop(owner);
        assert_eq!(doc.collect_garbage(), 2);
        assert!(!doc.is_alive(captured_id));
    }

    #[test]
    fn wide_teardown_stays_shallow() {
        let mut doc = Document::new();
        let p = doc.create_element("p");
        let kids: Vec<NodeId> = (0..10_000)
            .map(|_| {
                let c = doc.create_element("c");
                doc.add_child(p.id(), c.id()).unwrap();
                c.id()
            })
            .collect();
        drop(p);
        assert_eq!(doc.collect_garbage(), 10_001);
        assert!(kids.iter().all(|&k| !doc.is_alive(k)));
        assert!(doc.teardown_stats().max_depth <= 2);
    }
}
