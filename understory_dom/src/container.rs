// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The container mutation engine: insert, append, replace, and remove children.
//!
//! ## Reentrancy
//!
//! Every operation follows the same shape per moved child: validate, remove the child from
//! its old parent (which fires removal events), re-validate, splice the links with dispatch
//! forbidden, fire insertion events, attach to the render tree. Listeners run between those
//! steps and may rearrange anything, so after each callout the engine re-checks exactly the
//! links it is about to use and stops early when they no longer hold. For insertion this is
//! a partial success; for [`Document::remove_child`] losing its child is an error.
//!
//! Nodes touched across a callout are held by a [`NodeHandle`] for the duration. A detached
//! tree whose last handle dropped before the next sweep is reaped before its nodes are used.

use alloc::vec::Vec;

use crate::document::Document;
use crate::error::DomException;
use crate::types::{NodeHandle, NodeId, NodeKind};

/// Where the insertion loop places each child.
#[derive(Copy, Clone, Debug)]
enum Position {
    /// Immediately before a fixed child.
    Before(NodeId),
    /// At the end of the chain.
    End,
    /// Immediately after a moving predecessor (or first, when `None`).
    After(Option<NodeId>),
}

impl Document {
    /// Validation shared by every insertion path.
    fn check_add_child(
        &self,
        parent: NodeId,
        new_child: NodeId,
        replacing: Option<NodeId>,
    ) -> Result<(), DomException> {
        if !self.is_alive(parent) || !self.is_alive(new_child) {
            return Err(DomException::NotFound);
        }
        if self.is_read_only(parent)
            || self.parent(new_child).is_some_and(|p| self.is_read_only(p))
        {
            return Err(DomException::NoModificationAllowed);
        }
        if new_child == parent || self.is_descendant_of(parent, new_child) {
            return Err(DomException::HierarchyRequest);
        }
        // The document node is never anyone's child, whatever the policy says.
        if matches!(self.kind(new_child), Some(NodeKind::Document)) {
            return Err(DomException::HierarchyRequest);
        }
        let allowed = match self.kind(new_child) {
            Some(kind) if kind.is_fragment() => self.children(new_child).all(|c| {
                self.node_type(c)
                    .is_some_and(|ty| self.child_type_allowed(parent, ty, replacing))
            }),
            Some(kind) => self.child_type_allowed(parent, kind.node_type(), replacing),
            None => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(DomException::HierarchyRequest)
        }
    }

    fn is_empty_fragment(&self, id: NodeId) -> bool {
        self.kind(id).is_some_and(|k| k.is_fragment()) && self.first_child(id).is_none()
    }

    /// Insert `new_child` before `ref_child`, or append it when `ref_child` is `None`.
    ///
    /// A fragment is drained into this container in order. If listeners move `ref_child`
    /// out of this container or claim the moving child elsewhere, the call stops early
    /// and still succeeds.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        ref_child: Option<NodeId>,
    ) -> Result<(), DomException> {
        let Some(next) = ref_child else {
            return self.append_child(parent, new_child);
        };
        self.reap_dead_ancestors(parent);
        self.reap_dead_ancestors(new_child);
        self.check_add_child(parent, new_child, None)?;
        debug_assert!(
            self.is_reachable(parent),
            "insert_before on a floating container"
        );
        if self.parent(next) != Some(parent) {
            return Err(DomException::NotFound);
        }
        if self.is_empty_fragment(new_child)
            || next == new_child
            || self.previous_sibling(next) == Some(new_child)
        {
            return Ok(());
        }
        self.mutation(|doc| {
            doc.insert_children(parent, new_child, Position::Before(next), false)
        })
    }

    /// Append `new_child` (or a fragment's children) at the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, new_child: NodeId) -> Result<(), DomException> {
        self.reap_dead_ancestors(parent);
        self.reap_dead_ancestors(new_child);
        self.check_add_child(parent, new_child, None)?;
        debug_assert!(
            self.is_reachable(parent),
            "append_child on a floating container"
        );
        if self.last_child(parent) == Some(new_child) || self.is_empty_fragment(new_child) {
            return Ok(());
        }
        self.mutation(|doc| doc.insert_children(parent, new_child, Position::End, false))
    }

    /// Replace `old_child` with `new_child` (or a fragment's children) and return the
    /// removed node.
    ///
    /// Replacing a node with itself does nothing.
    pub fn replace_child(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        old_child: NodeId,
    ) -> Result<NodeHandle, DomException> {
        if new_child == old_child {
            return self.handle(old_child).ok_or(DomException::NotFound);
        }
        self.reap_dead_ancestors(parent);
        self.reap_dead_ancestors(new_child);
        self.check_add_child(parent, new_child, Some(old_child))?;
        debug_assert!(
            self.is_reachable(parent),
            "replace_child on a floating container"
        );
        if self.parent(old_child) != Some(parent) {
            return Err(DomException::NotFound);
        }
        self.mutation(|doc| {
            let prev = doc.previous_sibling(old_child);
            let removed = doc.remove_child_impl(parent, old_child, true)?;
            doc.insert_children(parent, new_child, Position::After(prev), true)?;
            Ok(removed)
        })
    }

    /// The per-child insertion loop behind insert, append, and replace.
    ///
    /// `changed` reports a structural change already made to `parent` by the caller.
    fn insert_children(
        &mut self,
        parent: NodeId,
        new_child: NodeId,
        mut pos: Position,
        mut changed: bool,
    ) -> Result<(), DomException> {
        let _parent = self.protect(parent);
        let _new_child = self.protect(new_child);
        let _next = match pos {
            Position::Before(next) => self.protect(next),
            _ => None,
        };
        let is_fragment = self.kind(new_child).is_some_and(|k| k.is_fragment());
        let mut drained_fragment = false;
        let mut outcome = Ok(());

        let first = if is_fragment {
            self.first_child(new_child)
        } else {
            Some(new_child)
        };
        let mut child = first.and_then(|c| self.protect(c));
        while let Some(handle) = child {
            let c = handle.id();
            let _prev = match pos {
                Position::After(Some(prev)) => {
                    if prev == c || self.previous_sibling(c) == Some(prev) {
                        log::debug!("{c:?} is already in place after {prev:?}");
                        break;
                    }
                    self.protect(prev)
                }
                _ => None,
            };
            // Captured before removal; the fragment is being drained.
            let next_child = if is_fragment {
                self.next_sibling(c).and_then(|n| self.protect(n))
            } else {
                None
            };

            // A listener may have dropped the last handle to the old parent.
            self.reap_dead_ancestors(c);
            if let Some(old_parent) = self.parent(c) {
                let quiet = old_parent == parent || old_parent == new_child;
                if let Err(e) = self.remove_child_impl(old_parent, c, quiet) {
                    outcome = Err(e);
                    break;
                }
                changed |= old_parent == parent;
                drained_fragment |= old_parent == new_child;
            }

            let anchor = match pos {
                Position::Before(next) => {
                    if self.parent(next) != Some(parent) {
                        log::debug!("reference child {next:?} left {parent:?}; stopping");
                        break;
                    }
                    Some(next)
                }
                Position::End => None,
                Position::After(Some(prev)) => {
                    if self.parent(prev) != Some(parent) {
                        log::debug!("anchor {prev:?} left {parent:?}; stopping");
                        break;
                    }
                    self.next_sibling(prev)
                }
                Position::After(None) => self.first_child(parent),
            };
            if self.parent(c).is_some() {
                log::debug!("{c:?} was claimed by another parent; stopping");
                break;
            }

            log::trace!("linking {c:?} into {parent:?} before {anchor:?}");
            self.forbid_dispatch(|doc| doc.link_before(parent, c, anchor));
            self.children_changed(parent, 1);
            changed = true;

            if let Err(e) = self.notify_child_inserted(c) {
                log::debug!("insertion listener for {c:?} failed: {e}");
            }
            if self.is_attached(parent) && !self.is_attached(c) && self.parent(c) == Some(parent)
            {
                self.attach(c);
            }

            if let Position::After(prev) = &mut pos {
                *prev = Some(c);
            }
            child = next_child;
        }

        if drained_fragment {
            self.subtree_modified(new_child);
        }
        if changed {
            self.set_document_changed(true);
            self.subtree_modified(parent);
        }
        outcome
    }

    /// Fire the batch notification; its listeners cannot fail the mutation that caused it.
    pub(crate) fn subtree_modified(&mut self, container: NodeId) {
        if let Err(e) = self.notify_subtree_modified(container) {
            log::debug!("subtree-modified listener on {container:?} failed: {e}");
        }
    }

    /// Remove `old_child` from `parent` and return it.
    ///
    /// The removed node stays alive for as long as the returned handle (or any other) is
    /// held, and can be inserted elsewhere. If a removal listener moves `old_child` away
    /// before the links are cut, this fails with [`DomException::NotFound`].
    pub fn remove_child(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
    ) -> Result<NodeHandle, DomException> {
        self.reap_dead_ancestors(parent);
        self.remove_child_impl(parent, old_child, false)
    }

    /// `quiet` leaves the subtree-modified notification to a caller that batches it.
    fn remove_child_impl(
        &mut self,
        parent: NodeId,
        old_child: NodeId,
        quiet: bool,
    ) -> Result<NodeHandle, DomException> {
        if !self.is_alive(parent) {
            return Err(DomException::NotFound);
        }
        debug_assert!(
            self.is_reachable(parent),
            "remove_child on a floating container"
        );
        if self.is_read_only(parent) {
            return Err(DomException::NoModificationAllowed);
        }
        if self.parent(old_child) != Some(parent) {
            return Err(DomException::NotFound);
        }
        let handle = self.protect(old_child).ok_or(DomException::NotFound)?;
        let _parent = self.protect(parent);

        self.mutation(|doc| {
            doc.notify_child_will_be_removed(old_child)?;
            if doc.parent(old_child) != Some(parent) {
                log::warn!("{old_child:?} was moved out of {parent:?} by a removal listener");
                return Err(DomException::NotFound);
            }
            doc.remove_focused_node_of_subtree(old_child, false);

            doc.forbid_dispatch(|doc| {
                if doc.is_attached(old_child) {
                    doc.detach(old_child);
                }
                doc.unlink(parent, old_child);
            });
            doc.children_changed(parent, -1);
            doc.set_document_changed(true);
            if !quiet {
                doc.subtree_modified(parent);
            }

            match doc.parent(old_child) {
                None => {
                    if doc.in_document(old_child) {
                        doc.removed_from_document(old_child);
                    } else {
                        doc.removed_from_tree(old_child, true);
                    }
                    doc.mark_floating(old_child);
                }
                // A subtree-modified listener already inserted it elsewhere.
                Some(p) => {
                    if doc.in_document(old_child) && !doc.in_document(p) {
                        doc.removed_from_document(old_child);
                    }
                }
            }
            Ok(())
        })?;
        Ok(handle)
    }

    /// Remove every child of `parent` and return how many were removed.
    ///
    /// This is the teardown path: it ignores read-only status and listener errors. Every
    /// child first gets its will-be-removed notifications with the tree intact; then the
    /// chain is drained with dispatch forbidden, and one subtree-modified event follows.
    pub fn remove_children(&mut self, parent: NodeId) -> usize {
        self.reap_dead_ancestors(parent);
        if self.first_child(parent).is_none() {
            return 0;
        }
        let Some(_parent) = self.protect(parent) else {
            return 0;
        };
        self.mutation(|doc| {
            let children: Vec<NodeHandle> = doc
                .children(parent)
                .filter_map(|c| doc.protect(c))
                .collect();
            for child in &children {
                let c = child.id();
                if doc.parent(c) != Some(parent) {
                    continue;
                }
                if let Err(e) = doc.notify_child_will_be_removed(c) {
                    log::debug!("removal listener for {c:?} failed during bulk removal: {e}");
                }
            }
            drop(children);
            doc.remove_focused_node_of_subtree(parent, true);

            let removed = doc.forbid_dispatch(|doc| {
                let mut removed = 0_usize;
                while let Some(c) = doc.first_child(parent) {
                    let _c = doc.protect(c);
                    doc.unlink(parent, c);
                    if doc.is_attached(c) {
                        doc.detach(c);
                    }
                    if doc.in_document(c) {
                        doc.removed_from_document(c);
                    } else {
                        doc.removed_from_tree(c, true);
                    }
                    doc.mark_floating(c);
                    removed += 1;
                }
                removed
            });
            log::trace!("drained {removed} children from {parent:?}");

            doc.children_changed(parent, -isize::try_from(removed).unwrap_or(isize::MAX));
            doc.set_document_changed(true);
            doc.subtree_modified(parent);
            removed
        })
    }

    /// Remove `node` from whatever parent it has.
    pub fn remove_node(&mut self, node: NodeId) -> Result<NodeHandle, DomException> {
        self.reap_dead_ancestors(node);
        let parent = self.parent(node).ok_or(DomException::HierarchyRequest)?;
        self.remove_child(parent, node)
    }

    /// Append `child` to `parent` the way a parser builds a tree: no mutation events.
    ///
    /// Only the child policy and hierarchy are checked. The child must be parentless.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomException> {
        self.reap_dead_ancestors(parent);
        if !self.is_alive(parent) || !self.is_alive(child) {
            return Err(DomException::NotFound);
        }
        let allowed = self.kind(child).is_some_and(|kind| {
            !matches!(kind, NodeKind::Document)
                && self.child_type_allowed(parent, kind.node_type(), None)
        });
        if !allowed
            || self.parent(child).is_some()
            || child == parent
            || self.is_descendant_of(parent, child)
        {
            return Err(DomException::HierarchyRequest);
        }
        self.forbid_dispatch(|doc| doc.link_before(parent, child, None));
        self.children_changed(parent, 1);
        if self.in_document(parent) {
            self.inserted_into_document(child);
        }
        if self.is_attached(parent) {
            self.attach(child);
        }
        Ok(())
    }
}
