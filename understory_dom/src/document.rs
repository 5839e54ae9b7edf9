// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The node arena: storage, factories, linkage primitives, and traversal.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dispatch::guard::DispatchGuard;
use understory_dispatch::kind::{ListenerTypes, MutationEventKind};
use understory_dispatch::types::ParentLookup;

use crate::error::DomException;
use crate::events::RegisteredListener;
use crate::lifecycle::LifecycleHook;
use crate::policy::{ChildPolicy, DomChildPolicy};
use crate::render::{NullRenderTree, RenderTreeBridge};
use crate::teardown::TeardownContext;
use crate::types::{NodeFlags, NodeHandle, NodeId, NodeKind, NodeType};

type RemovalObserver = Rc<dyn Fn(&Document, NodeId)>;

pub(crate) struct Node {
    pub(crate) generation: u32,
    /// Strong handles share this `Rc`; its strong count minus one is the node's ref count.
    pub(crate) anchor: Rc<NodeId>,
    pub(crate) kind: NodeKind,
    pub(crate) flags: NodeFlags,
    pub(crate) parent: Option<NodeId>,
    pub(crate) prev: Option<NodeId>,
    pub(crate) next: Option<NodeId>,
    pub(crate) first_child: Option<NodeId>,
    pub(crate) last_child: Option<NodeId>,
    pub(crate) listeners: Vec<RegisteredListener>,
    /// Listed in the document's floating-candidate list.
    pub(crate) floating: bool,
}

impl Node {
    fn new(generation: u32, anchor: Rc<NodeId>, kind: NodeKind) -> Self {
        Self {
            generation,
            anchor,
            kind,
            flags: NodeFlags::empty(),
            parent: None,
            prev: None,
            next: None,
            first_child: None,
            last_child: None,
            listeners: Vec::new(),
            floating: false,
        }
    }
}

pub(crate) fn slot(nodes: &[Option<Node>], id: NodeId) -> Option<&Node> {
    nodes
        .get(id.idx())
        .and_then(|n| n.as_ref())
        .filter(|n| n.generation == id.1)
}

pub(crate) fn slot_mut(nodes: &mut [Option<Node>], id: NodeId) -> Option<&mut Node> {
    nodes
        .get_mut(id.idx())
        .and_then(|n| n.as_mut())
        .filter(|n| n.generation == id.1)
}

/// A document: the arena that owns every node, plus the collaborators the mutation engine
/// calls into.
///
/// All tree operations are methods on `Document` and name nodes by [`NodeId`].
/// Nodes are kept alive by their parent or by [`NodeHandle`]s.
pub struct Document {
    pub(crate) nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,               // last generation per slot (persists across frees)
    pub(crate) free_list: Vec<usize>,
    root: NodeId,
    pub(crate) guard: DispatchGuard,
    listener_types: ListenerTypes,
    pub(crate) next_listener_id: u64,
    pub(crate) render: Box<dyn RenderTreeBridge>,
    pub(crate) lifecycle: Option<Box<dyn LifecycleHook>>,
    policy: Box<dyn ChildPolicy>,
    removal_observers: Vec<RemovalObserver>,
    focused: Option<NodeHandle>,
    document_changed: bool,
    dom_tree_version: u64,
    mutation_depth: u32,
    pub(crate) floating: Vec<NodeId>,
    /// A candidate was added since the last sweep.
    pub(crate) floating_dirty: bool,
    pub(crate) teardown: TeardownContext,
}

impl core::fmt::Debug for Document {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Document")
            .field("root", &self.root)
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("floating", &self.floating.len())
            .field("listener_types", &self.listener_types)
            .field("dom_tree_version", &self.dom_tree_version)
            .field("guard", &self.guard)
            .finish_non_exhaustive()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// Create an empty document whose render tree is a [`NullRenderTree`].
    pub fn new() -> Self {
        Self::with_render_tree(NullRenderTree)
    }

    /// Create an empty, attached document that reports render-tree changes to `render`.
    pub fn with_render_tree(render: impl RenderTreeBridge + 'static) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            root: NodeId::new(0, 1),
            guard: DispatchGuard::new(),
            listener_types: ListenerTypes::empty(),
            next_listener_id: 0,
            render: Box::new(render),
            lifecycle: None,
            policy: Box::new(DomChildPolicy),
            removal_observers: Vec::new(),
            focused: None,
            document_changed: false,
            dom_tree_version: 0,
            mutation_depth: 0,
            floating: Vec::new(),
            floating_dirty: false,
            teardown: TeardownContext::default(),
        };
        let root = doc.alloc(NodeKind::Document).id();
        doc.root = root;
        if let Some(n) = slot_mut(&mut doc.nodes, root) {
            n.flags.insert(NodeFlags::IN_DOCUMENT);
        }
        doc.attach(root);
        doc
    }

    /// Replace the content-model policy consulted before every insertion.
    pub fn set_child_policy(&mut self, policy: impl ChildPolicy + 'static) {
        self.policy = Box::new(policy);
    }

    /// Install a hook that observes in-document and in-tree lifecycle transitions.
    pub fn set_lifecycle_hook(&mut self, hook: impl LifecycleHook + 'static) {
        self.lifecycle = Some(Box::new(hook));
    }

    /// Register a callback that runs before any removal notification for a node.
    ///
    /// Observers fix up auxiliary structures (ranges, iterators) and see the tree still
    /// fully linked. They cannot mutate the document.
    pub fn add_removal_observer(&mut self, observer: impl Fn(&Self, NodeId) + 'static) {
        self.removal_observers.push(Rc::new(observer));
    }

    // --- factories ---

    fn alloc(&mut self, kind: NodeKind) -> NodeHandle {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(None);
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        let id = NodeId::new(idx, generation);
        let anchor = Rc::new(id);
        let handle = NodeHandle(Rc::clone(&anchor));
        self.nodes[id.idx()] = Some(Node::new(generation, anchor, kind));
        handle
    }

    fn create(&mut self, kind: NodeKind) -> NodeHandle {
        let handle = self.alloc(kind);
        self.mark_floating(handle.id());
        handle
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> NodeHandle {
        self.create(NodeKind::Element { tag: tag.into() })
    }

    /// Create a detached text node.
    pub fn create_text(&mut self, data: impl Into<String>) -> NodeHandle {
        self.create(NodeKind::Text { data: data.into() })
    }

    /// Create a detached comment.
    pub fn create_comment(&mut self, data: impl Into<String>) -> NodeHandle {
        self.create(NodeKind::Comment { data: data.into() })
    }

    /// Create a detached document type declaration.
    pub fn create_document_type(&mut self, name: impl Into<String>) -> NodeHandle {
        self.create(NodeKind::DocumentType { name: name.into() })
    }

    /// Create an empty document fragment.
    pub fn create_document_fragment(&mut self) -> NodeHandle {
        self.create(NodeKind::DocumentFragment)
    }

    /// Create a detached processing instruction.
    pub fn create_processing_instruction(
        &mut self,
        target: impl Into<String>,
        data: impl Into<String>,
    ) -> NodeHandle {
        self.create(NodeKind::ProcessingInstruction {
            target: target.into(),
            data: data.into(),
        })
    }

    // --- node state ---

    /// The document node.
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns true if `id` refers to a live node.
    pub fn is_alive(&self, id: NodeId) -> bool {
        slot(&self.nodes, id).is_some()
    }

    pub(crate) fn node(&self, id: NodeId) -> Option<&Node> {
        slot(&self.nodes, id)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        slot_mut(&mut self.nodes, id)
    }

    /// Variant data of a live node.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|n| &n.kind)
    }

    /// Node type of a live node.
    pub fn node_type(&self, id: NodeId) -> Option<NodeType> {
        self.kind(id).map(NodeKind::node_type)
    }

    /// Flags of a live node; empty for stale ids.
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.node(id).map(|n| n.flags).unwrap_or_default()
    }

    pub(crate) fn set_flag(&mut self, id: NodeId, flag: NodeFlags, on: bool) {
        if let Some(n) = self.node_mut(id) {
            n.flags.set(flag, on);
        }
    }

    /// Whether the node's subtree is attached to the render tree.
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::ATTACHED)
    }

    /// Whether the node is reachable from the document root.
    pub fn in_document(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::IN_DOCUMENT)
    }

    /// Whether the node rejects structural and data modification.
    pub fn is_read_only(&self, id: NodeId) -> bool {
        self.flags(id).contains(NodeFlags::READ_ONLY)
    }

    /// Mark a node read-only (or writable again).
    pub fn set_read_only(&mut self, id: NodeId, read_only: bool) -> Result<(), DomException> {
        let n = self.node_mut(id).ok_or(DomException::NotFound)?;
        n.flags.set(NodeFlags::READ_ONLY, read_only);
        Ok(())
    }

    /// Number of live [`NodeHandle`]s for the node; zero for stale ids.
    pub fn ref_count(&self, id: NodeId) -> usize {
        self.node(id)
            .map(|n| Rc::strong_count(&n.anchor) - 1)
            .unwrap_or(0)
    }

    /// Take a strong reference to a live node.
    pub fn handle(&self, id: NodeId) -> Option<NodeHandle> {
        self.node(id).map(|n| NodeHandle(Rc::clone(&n.anchor)))
    }

    /// Take a strong reference for the duration of a callout.
    #[inline]
    pub(crate) fn protect(&self, id: NodeId) -> Option<NodeHandle> {
        self.handle(id)
    }

    /// Whether a node may be used as a mutation container: it is the root, has a parent,
    /// or is held by a handle.
    pub(crate) fn is_reachable(&self, id: NodeId) -> bool {
        id == self.root || self.parent(id).is_some() || self.ref_count(id) > 0
    }

    // --- linkage primitives ---

    /// Parent of a live node.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    /// First child of a live node.
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.first_child)
    }

    /// Last child of a live node.
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.last_child)
    }

    /// Next sibling of a live node.
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.next)
    }

    /// Previous sibling of a live node.
    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.prev)
    }

    pub(crate) fn set_parent(&mut self, id: NodeId, parent: Option<NodeId>) {
        if let Some(n) = self.node_mut(id) {
            n.parent = parent;
        }
    }

    pub(crate) fn set_previous_sibling(&mut self, id: NodeId, prev: Option<NodeId>) {
        if let Some(n) = self.node_mut(id) {
            n.prev = prev;
        }
    }

    pub(crate) fn set_next_sibling(&mut self, id: NodeId, next: Option<NodeId>) {
        if let Some(n) = self.node_mut(id) {
            n.next = next;
        }
    }

    pub(crate) fn set_first_child(&mut self, id: NodeId, child: Option<NodeId>) {
        if let Some(n) = self.node_mut(id) {
            n.first_child = child;
        }
    }

    pub(crate) fn set_last_child(&mut self, id: NodeId, child: Option<NodeId>) {
        if let Some(n) = self.node_mut(id) {
            n.last_child = child;
        }
    }

    /// Splice parentless `child` into `parent` immediately before `anchor`, or at the end
    /// when `anchor` is `None`.
    pub(crate) fn link_before(&mut self, parent: NodeId, child: NodeId, anchor: Option<NodeId>) {
        debug_assert!(self.guard.is_forbidden(), "link surgery outside a forbid scope");
        debug_assert!(self.parent(child).is_none(), "child is still linked elsewhere");
        let prev = match anchor {
            Some(a) => self.previous_sibling(a),
            None => self.last_child(parent),
        };
        self.set_parent(child, Some(parent));
        self.set_previous_sibling(child, prev);
        self.set_next_sibling(child, anchor);
        match prev {
            Some(p) => self.set_next_sibling(p, Some(child)),
            None => self.set_first_child(parent, Some(child)),
        }
        match anchor {
            Some(a) => self.set_previous_sibling(a, Some(child)),
            None => self.set_last_child(parent, Some(child)),
        }
    }

    /// Cut `child` out of `parent`'s chain and clear its own links.
    pub(crate) fn unlink(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.guard.is_forbidden(), "link surgery outside a forbid scope");
        debug_assert_eq!(self.parent(child), Some(parent), "unlinking a non-child");
        let prev = self.previous_sibling(child);
        let next = self.next_sibling(child);
        match prev {
            Some(p) => self.set_next_sibling(p, next),
            None => self.set_first_child(parent, next),
        }
        match next {
            Some(n) => self.set_previous_sibling(n, prev),
            None => self.set_last_child(parent, prev),
        }
        self.set_parent(child, None);
        self.set_previous_sibling(child, None);
        self.set_next_sibling(child, None);
    }

    // --- traversal ---

    /// Iterate the children of `id` in order.
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            doc: self,
            next: self.first_child(id),
        }
    }

    /// Iterate `id` and its descendants in document (pre-)order.
    pub fn subtree(&self, id: NodeId) -> Subtree<'_> {
        Subtree {
            doc: self,
            root: id,
            next: self.is_alive(id).then_some(id),
        }
    }

    /// Collect `id` and its descendants in document order.
    pub(crate) fn collect_subtree(&self, id: NodeId) -> Vec<NodeId> {
        self.subtree(id).collect()
    }

    /// Number of children of `id`.
    pub fn child_node_count(&self, id: NodeId) -> usize {
        self.children(id).count()
    }

    /// The child of `id` at `index`.
    pub fn child_node(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).nth(index)
    }

    /// The node after `id` in document order, not leaving the subtree of `stay_within`.
    pub fn traverse_next_node(&self, id: NodeId, stay_within: Option<NodeId>) -> Option<NodeId> {
        if let Some(c) = self.first_child(id) {
            return Some(c);
        }
        if Some(id) == stay_within {
            return None;
        }
        let mut n = id;
        loop {
            if let Some(s) = self.next_sibling(n) {
                return Some(s);
            }
            let p = self.parent(n)?;
            if Some(p) == stay_within {
                return None;
            }
            n = p;
        }
    }

    /// Whether `id` is a proper descendant of `ancestor`.
    pub fn is_descendant_of(&self, id: NodeId, ancestor: NodeId) -> bool {
        let mut cur = self.parent(id);
        while let Some(p) = cur {
            if p == ancestor {
                return true;
            }
            cur = self.parent(p);
        }
        false
    }

    /// Whether `other` is `id` or one of its descendants.
    pub fn contains(&self, id: NodeId, other: NodeId) -> bool {
        self.is_alive(id) && (id == other || self.is_descendant_of(other, id))
    }

    // --- document-wide state ---

    /// Whether a listener for `kind` has ever been registered in this document.
    #[inline]
    pub fn has_listener_type(&self, kind: MutationEventKind) -> bool {
        self.listener_types.contains(kind.listener_type())
    }

    /// The listener-type mask.
    pub fn listener_types(&self) -> ListenerTypes {
        self.listener_types
    }

    pub(crate) fn add_listener_type(&mut self, kind: MutationEventKind) {
        self.listener_types |= kind.listener_type();
    }

    /// The child policy in effect.
    pub(crate) fn child_type_allowed(
        &self,
        parent: NodeId,
        child: NodeType,
        replacing: Option<NodeId>,
    ) -> bool {
        self.policy.child_type_allowed(self, parent, child, replacing)
    }

    /// The node that has focus, if any.
    pub fn focused_node(&self) -> Option<NodeId> {
        self.focused.as_ref().map(NodeHandle::id)
    }

    /// Move focus to `node`, or clear it.
    pub fn set_focused_node(&mut self, node: Option<NodeId>) -> Result<(), DomException> {
        self.focused = match node {
            Some(id) => Some(self.handle(id).ok_or(DomException::NotFound)?),
            None => None,
        };
        Ok(())
    }

    /// Clear focus if the focused node is about to leave with `node`'s subtree.
    ///
    /// With `am_container`, only proper descendants of `node` count.
    pub(crate) fn remove_focused_node_of_subtree(&mut self, node: NodeId, am_container: bool) {
        let Some(focused) = self.focused_node() else {
            return;
        };
        let hit = if am_container {
            focused != node && self.is_descendant_of(focused, node)
        } else {
            self.contains(node, focused)
        };
        if hit {
            log::debug!("clearing focus from {focused:?}, its subtree is being removed");
            self.focused = None;
        }
    }

    /// Whether the tree changed structurally since the flag was last cleared.
    pub fn document_changed(&self) -> bool {
        self.document_changed
    }

    /// Set or clear the document-changed flag.
    pub fn set_document_changed(&mut self, changed: bool) {
        self.document_changed = changed;
    }

    /// Counter bumped by every structural change; cached node lists compare against it.
    pub fn dom_tree_version(&self) -> u64 {
        self.dom_tree_version
    }

    pub(crate) fn inc_dom_tree_version(&mut self) {
        self.dom_tree_version = self.dom_tree_version.wrapping_add(1);
    }

    /// Record a change of `delta` children under `parent`.
    pub(crate) fn children_changed(&mut self, parent: NodeId, delta: isize) {
        if delta != 0 {
            log::trace!("children of {parent:?} changed by {delta}");
            self.inc_dom_tree_version();
        }
    }

    /// Run the auxiliary removal observers for `node`.
    pub(crate) fn notify_before_node_removal(&self, node: NodeId) {
        for observer in self.removal_observers.clone() {
            observer(self, node);
        }
    }

    // --- scopes ---

    /// Whether listener dispatch is currently forbidden.
    pub fn is_dispatch_forbidden(&self) -> bool {
        self.guard.is_forbidden()
    }

    /// Run raw link surgery with dispatch forbidden.
    pub(crate) fn forbid_dispatch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.guard.forbid();
        let out = f(self);
        self.guard.allow();
        out
    }

    /// Run a public mutation; the outermost one reclaims garbage when it finishes, if
    /// anything became a candidate since the last sweep.
    pub(crate) fn mutation<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.mutation_depth += 1;
        let out = f(self);
        self.mutation_depth -= 1;
        if self.mutation_depth == 0 && self.floating_dirty {
            self.sweep_floating();
        }
        out
    }
}

impl ParentLookup<NodeId> for Document {
    fn parent_of(&self, node: &NodeId) -> Option<NodeId> {
        self.parent(*node)
    }
}

/// Iterator over the children of a node. See [`Document::children`].
#[derive(Clone, Debug)]
pub struct Children<'a> {
    doc: &'a Document,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.next_sibling(cur);
        Some(cur)
    }
}

/// Pre-order iterator over a subtree. See [`Document::subtree`].
#[derive(Clone, Debug)]
pub struct Subtree<'a> {
    doc: &'a Document,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Subtree<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let cur = self.next?;
        self.next = self.doc.traverse_next_node(cur, Some(self.root));
        Some(cur)
    }
}
