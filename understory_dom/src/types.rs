// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the node tree: identifiers, strong handles, flags, and node variants.

use alloc::rc::Rc;
use alloc::string::String;

/// Identifier for a node in a [`Document`](crate::Document).
///
/// This is a small, copyable handle that stays stable while the node lives but becomes
/// invalid once the node is destroyed and its slot reused.
/// It consists of a slot index and a generation counter.
///
/// ## Semantics
///
/// - On creation, a fresh slot is allocated with generation `1`.
/// - On destruction, the slot is freed; any existing `NodeId` that pointed to that slot is now stale.
/// - On reuse of a freed slot, its generation is incremented, producing a new, distinct `NodeId`.
///
/// A `NodeId` does not keep its node alive. Hold a [`NodeHandle`] for that.
/// Use [`Document::is_alive`](crate::Document::is_alive) to check liveness; stale ids never
/// alias a different live node because the generation must match.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A strong reference to a node.
///
/// While any handle to a node exists, the node is never destroyed, even when it has no
/// parent. [`Document::ref_count`](crate::Document::ref_count) reports how many handles are
/// live. Dropping the last handle of a parentless node makes it garbage; it is reclaimed at
/// the end of the next mutation or by [`Document::collect_garbage`](crate::Document::collect_garbage).
#[derive(Clone)]
pub struct NodeHandle(pub(crate) Rc<NodeId>);

impl NodeHandle {
    /// The node this handle keeps alive.
    #[inline]
    pub fn id(&self) -> NodeId {
        *self.0
    }
}

impl core::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("NodeHandle").field(&*self.0).finish()
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for NodeHandle {}

impl From<&NodeHandle> for NodeId {
    fn from(handle: &NodeHandle) -> Self {
        handle.id()
    }
}

bitflags::bitflags! {
    /// Per-node state flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// The node participates in rendering; its subtree has been attached.
        const ATTACHED    = 0b0000_0001;
        /// The render tree created a peer for this node.
        const HAS_RENDERER = 0b0000_0010;
        /// The node is reachable from the document root.
        const IN_DOCUMENT = 0b0000_0100;
        /// The node's children and data may not be modified through the mutation API.
        const READ_ONLY   = 0b0000_1000;
    }
}

/// Numeric node type, as exposed to script.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[repr(u16)]
pub enum NodeType {
    /// An element.
    Element = 1,
    /// A text node.
    Text = 3,
    /// A processing instruction.
    ProcessingInstruction = 7,
    /// A comment.
    Comment = 8,
    /// The document itself.
    Document = 9,
    /// A document type declaration.
    DocumentType = 10,
    /// A document fragment.
    DocumentFragment = 11,
}

/// Variant data carried by each node.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element with its tag name.
    Element {
        /// Tag name.
        tag: String,
    },
    /// Character data displayed as text.
    Text {
        /// Text content.
        data: String,
    },
    /// A comment.
    Comment {
        /// Comment content.
        data: String,
    },
    /// A document type declaration.
    DocumentType {
        /// Declared name.
        name: String,
    },
    /// A transient multi-child carrier; insertion drains it.
    DocumentFragment,
    /// A processing instruction.
    ProcessingInstruction {
        /// Instruction target.
        target: String,
        /// Instruction data.
        data: String,
    },
}

impl NodeKind {
    /// The node type code of this variant.
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Document => NodeType::Document,
            Self::Element { .. } => NodeType::Element,
            Self::Text { .. } => NodeType::Text,
            Self::Comment { .. } => NodeType::Comment,
            Self::DocumentType { .. } => NodeType::DocumentType,
            Self::DocumentFragment => NodeType::DocumentFragment,
            Self::ProcessingInstruction { .. } => NodeType::ProcessingInstruction,
        }
    }

    /// Character data of a text or comment node.
    pub fn character_data(&self) -> Option<&str> {
        match self {
            Self::Text { data } | Self::Comment { data } => Some(data),
            _ => None,
        }
    }

    pub(crate) fn character_data_mut(&mut self) -> Option<&mut String> {
        match self {
            Self::Text { data } | Self::Comment { data } => Some(data),
            _ => None,
        }
    }

    /// Whether this is a [`NodeKind::DocumentFragment`].
    pub fn is_fragment(&self) -> bool {
        matches!(self, Self::DocumentFragment)
    }
}
