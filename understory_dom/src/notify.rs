// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Structural change notifications.
//!
//! Each notifier first checks the document's listener-type mask, so a document without
//! mutation listeners never builds an event. Listeners may run arbitrary mutations; the
//! notifiers surface listener errors and leave re-validation to the caller.

use understory_dispatch::kind::MutationEventKind;

use crate::document::Document;
use crate::error::DomException;
use crate::events::MutationEvent;
use crate::types::NodeId;

impl Document {
    /// `child` was just linked under its parent.
    ///
    /// Runs the in-document or in-tree lifecycle, then fires `DOMNodeInserted` at the child
    /// and `DOMNodeInsertedIntoDocument` at each node of its subtree.
    pub(crate) fn notify_child_inserted(&mut self, child: NodeId) -> Result<(), DomException> {
        let Some(_child) = self.protect(child) else {
            return Ok(());
        };
        let parent = self.parent(child);
        if parent.is_some_and(|p| self.in_document(p)) {
            self.inserted_into_document(child);
        } else {
            self.inserted_into_tree(child, true);
        }

        if let Some(parent) = self.parent(child)
            && self.has_listener_type(MutationEventKind::NodeInserted)
        {
            self.dispatch_event(MutationEvent::new(
                MutationEventKind::NodeInserted,
                child,
                Some(parent),
            ))?;
        }

        if self.has_listener_type(MutationEventKind::NodeInsertedIntoDocument)
            && self.in_document(child)
        {
            self.dispatch_to_subtree(child, MutationEventKind::NodeInsertedIntoDocument)?;
        }
        Ok(())
    }

    /// `child` is about to be removed from its parent; the tree is still fully linked.
    ///
    /// Order: removal observers, `DOMNodeRemoved`, the render tree's will-remove hook,
    /// then `DOMNodeRemovedFromDocument` at each node of the subtree.
    pub(crate) fn notify_child_will_be_removed(
        &mut self,
        child: NodeId,
    ) -> Result<(), DomException> {
        let Some(_child) = self.protect(child) else {
            return Ok(());
        };
        self.notify_before_node_removal(child);

        if let Some(parent) = self.parent(child)
            && self.has_listener_type(MutationEventKind::NodeRemoved)
        {
            self.dispatch_event(MutationEvent::new(
                MutationEventKind::NodeRemoved,
                child,
                Some(parent),
            ))?;
        }

        if self.is_attached(child) {
            self.will_remove(child);
        }

        if self.has_listener_type(MutationEventKind::NodeRemovedFromDocument)
            && self.in_document(child)
        {
            self.dispatch_to_subtree(child, MutationEventKind::NodeRemovedFromDocument)?;
        }
        Ok(())
    }

    /// One `DOMSubtreeModified` for a batch of changes under `container`.
    ///
    /// Always bumps the tree version, even when nobody listens.
    pub(crate) fn notify_subtree_modified(&mut self, container: NodeId) -> Result<(), DomException> {
        self.inc_dom_tree_version();
        if !self.has_listener_type(MutationEventKind::SubtreeModified) {
            return Ok(());
        }
        self.dispatch_event(MutationEvent::new(
            MutationEventKind::SubtreeModified,
            container,
            None,
        ))
        .map(|_| ())
    }

    /// Fire a non-bubbling event at `root` and then each node after it in document order.
    ///
    /// The walk resumes from the current node after every dispatch, so listeners may
    /// restructure the subtree; it ends when the walk leaves `root`'s subtree.
    fn dispatch_to_subtree(
        &mut self,
        root: NodeId,
        kind: MutationEventKind,
    ) -> Result<(), DomException> {
        let mut cur = self.protect(root);
        while let Some(node) = cur {
            let id = node.id();
            if !self.contains(root, id) {
                break;
            }
            self.dispatch_event(MutationEvent::new(kind, id, None))?;
            cur = self
                .traverse_next_node(id, Some(root))
                .and_then(|next| self.protect(next));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;
    use understory_dispatch::types::Outcome;

    type Log = Rc<RefCell<Vec<(MutationEventKind, NodeId)>>>;

    fn listen_all(doc: &mut Document, node: NodeId) -> Log {
        let log: Log = Rc::default();
        for kind in MutationEventKind::ALL {
            let log = Rc::clone(&log);
            doc.add_event_listener(node, kind, true, move |_, ev| {
                log.borrow_mut().push((ev.kind, ev.target));
                Ok(Outcome::Continue)
            })
            .unwrap();
        }
        log
    }

    #[test]
    fn no_listeners_no_events_but_version_moves() {
        let mut doc = Document::new();
        let root = doc.root();
        let v = doc.dom_tree_version();
        doc.notify_subtree_modified(root).unwrap();
        assert_eq!(doc.dom_tree_version(), v + 1);
        assert!(doc.listener_types().is_empty());
    }

    #[test]
    fn insertion_marks_subtree_in_document_and_fires_in_order() {
        let mut doc = Document::new();
        let root = doc.root();
        let log = listen_all(&mut doc, root);
        let p = doc.create_element("p");
        let t = doc.create_text("t");
        doc.forbid_dispatch(|doc| {
            doc.link_before(p.id(), t.id(), None);
            doc.link_before(root, p.id(), None);
        });
        doc.notify_child_inserted(p.id()).unwrap();
        assert!(doc.in_document(t.id()));
        assert_eq!(
            *log.borrow(),
            vec![
                (MutationEventKind::NodeInserted, p.id()),
                (MutationEventKind::NodeInsertedIntoDocument, p.id()),
                (MutationEventKind::NodeInsertedIntoDocument, t.id()),
            ]
        );
    }

    #[test]
    fn removal_notifications_precede_unlink() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        doc.forbid_dispatch(|doc| doc.link_before(root, p.id(), None));
        doc.inserted_into_document(p.id());
        let log = listen_all(&mut doc, root);
        let observed = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&observed);
        doc.add_removal_observer(move |doc, node| {
            seen.borrow_mut().push(doc.parent(node));
        });
        doc.notify_child_will_be_removed(p.id()).unwrap();
        assert_eq!(*observed.borrow(), vec![Some(root)]);
        assert_eq!(
            *log.borrow(),
            vec![
                (MutationEventKind::NodeRemoved, p.id()),
                (MutationEventKind::NodeRemovedFromDocument, p.id()),
            ]
        );
        assert_eq!(doc.parent(p.id()), Some(root), "still linked");
    }

    #[test]
    fn subtree_walk_survives_listener_removing_next_node() {
        let mut doc = Document::new();
        let root = doc.root();
        let p = doc.create_element("p");
        let a = doc.create_element("a");
        let b = doc.create_element("b");
        doc.forbid_dispatch(|doc| {
            doc.link_before(p.id(), a.id(), None);
            doc.link_before(p.id(), b.id(), None);
            doc.link_before(root, p.id(), None);
        });
        doc.inserted_into_document(p.id());
        let (pid, bid) = (p.id(), b.id());
        let visited = Rc::new(RefCell::new(Vec::new()));
        let v = Rc::clone(&visited);
        doc.add_event_listener(
            root,
            MutationEventKind::NodeInsertedIntoDocument,
            true,
            move |doc, ev| {
                v.borrow_mut().push(ev.target);
                if doc.parent(bid) == Some(pid) {
                    doc.remove_child(pid, bid)?;
                }
                Ok(Outcome::Continue)
            },
        )
        .unwrap();
        doc.notify_child_inserted(p.id()).unwrap();
        assert_eq!(*visited.borrow(), vec![p.id(), a.id()]);
    }
}
