// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-document and in-tree lifecycle transitions.

use crate::document::Document;
use crate::types::{NodeFlags, NodeId};

/// Observes nodes entering and leaving the document or a detached tree.
///
/// Hooks run in document order over the affected subtree and may be called while dispatch
/// is forbidden; they see node ids only and cannot touch the document.
pub trait LifecycleHook {
    /// `node` became reachable from the document root.
    fn inserted_into_document(&mut self, _node: NodeId) {}

    /// `node` is no longer reachable from the document root.
    fn removed_from_document(&mut self, _node: NodeId) {}

    /// `node` was inserted under a parent outside the document.
    fn inserted_into_tree(&mut self, _node: NodeId) {}

    /// `node` was removed from a parent outside the document.
    fn removed_from_tree(&mut self, _node: NodeId) {}
}

impl Document {
    /// Set `IN_DOCUMENT` on `node`'s subtree and report each node to the hook.
    pub(crate) fn inserted_into_document(&mut self, node: NodeId) {
        for id in self.collect_subtree(node) {
            self.set_flag(id, NodeFlags::IN_DOCUMENT, true);
            if let Some(hook) = self.lifecycle.as_mut() {
                hook.inserted_into_document(id);
            }
        }
    }

    /// Clear `IN_DOCUMENT` on `node`'s subtree and report each node to the hook.
    pub(crate) fn removed_from_document(&mut self, node: NodeId) {
        for id in self.collect_subtree(node) {
            self.set_flag(id, NodeFlags::IN_DOCUMENT, false);
            if let Some(hook) = self.lifecycle.as_mut() {
                hook.removed_from_document(id);
            }
        }
    }

    /// Report `node` (and with `deep`, its descendants) as inserted into a detached tree.
    pub(crate) fn inserted_into_tree(&mut self, node: NodeId, deep: bool) {
        if self.lifecycle.is_none() {
            return;
        }
        let ids = if deep {
            self.collect_subtree(node)
        } else {
            alloc::vec![node]
        };
        if let Some(hook) = self.lifecycle.as_mut() {
            for id in ids {
                hook.inserted_into_tree(id);
            }
        }
    }

    /// Report `node` (and with `deep`, its descendants) as removed from a detached tree.
    pub(crate) fn removed_from_tree(&mut self, node: NodeId, deep: bool) {
        if self.lifecycle.is_none() {
            return;
        }
        let ids = if deep {
            self.collect_subtree(node)
        } else {
            alloc::vec![node]
        };
        if let Some(hook) = self.lifecycle.as_mut() {
            for id in ids {
                hook.removed_from_tree(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::rc::Rc;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    #[derive(Clone, Debug, PartialEq, Eq)]
    enum Call {
        InDoc(NodeId),
        OutDoc(NodeId),
        InTree(NodeId),
        OutTree(NodeId),
    }

    #[derive(Clone, Default)]
    struct Recorder(Rc<RefCell<Vec<Call>>>);

    impl LifecycleHook for Recorder {
        fn inserted_into_document(&mut self, node: NodeId) {
            self.0.borrow_mut().push(Call::InDoc(node));
        }
        fn removed_from_document(&mut self, node: NodeId) {
            self.0.borrow_mut().push(Call::OutDoc(node));
        }
        fn inserted_into_tree(&mut self, node: NodeId) {
            self.0.borrow_mut().push(Call::InTree(node));
        }
        fn removed_from_tree(&mut self, node: NodeId) {
            self.0.borrow_mut().push(Call::OutTree(node));
        }
    }

    #[test]
    fn document_transitions_cover_subtree_in_order() {
        let rec = Recorder::default();
        let mut doc = Document::new();
        doc.set_lifecycle_hook(rec.clone());
        let p = doc.create_element("p").id();
        let t = doc.create_text("t").id();
        doc.forbid_dispatch(|doc| doc.link_before(p, t, None));

        doc.inserted_into_document(p);
        assert!(doc.in_document(p) && doc.in_document(t));
        doc.removed_from_document(p);
        assert!(!doc.in_document(t));
        assert_eq!(
            *rec.0.borrow(),
            vec![Call::InDoc(p), Call::InDoc(t), Call::OutDoc(p), Call::OutDoc(t)]
        );
    }

    #[test]
    fn shallow_tree_transitions_report_only_the_node() {
        let rec = Recorder::default();
        let mut doc = Document::new();
        doc.set_lifecycle_hook(rec.clone());
        let p = doc.create_element("p").id();
        let t = doc.create_text("t").id();
        doc.forbid_dispatch(|doc| doc.link_before(p, t, None));

        doc.inserted_into_tree(p, false);
        doc.removed_from_tree(p, true);
        assert_eq!(
            *rec.0.borrow(),
            vec![Call::InTree(p), Call::OutTree(p), Call::OutTree(t)]
        );
    }
}
