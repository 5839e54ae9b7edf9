// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Content-model rules: which node types may appear under which parents.

use crate::document::Document;
use crate::types::{NodeId, NodeKind, NodeType};

/// Decides whether a node of a given type may become a child of a parent.
///
/// Consulted before every insertion, once per fragment child when a fragment is inserted.
/// Domain-specific rules (HTML content models and the like) plug in here.
pub trait ChildPolicy {
    /// Whether a node of type `child` may be inserted under `parent`.
    ///
    /// `replacing` names a current child of `parent` that leaves as part of the same
    /// operation and must not count against limits.
    fn child_type_allowed(
        &self,
        doc: &Document,
        parent: NodeId,
        child: NodeType,
        replacing: Option<NodeId>,
    ) -> bool;
}

/// The core DOM rules.
///
/// - A document holds comments and processing instructions, at most one element, and at
///   most one document type.
/// - Elements and fragments hold elements, text, comments, and processing instructions.
/// - Everything else is a leaf.
#[derive(Copy, Clone, Debug, Default)]
pub struct DomChildPolicy;

impl ChildPolicy for DomChildPolicy {
    fn child_type_allowed(
        &self,
        doc: &Document,
        parent: NodeId,
        child: NodeType,
        replacing: Option<NodeId>,
    ) -> bool {
        match doc.kind(parent) {
            Some(NodeKind::Document) => match child {
                NodeType::Comment | NodeType::ProcessingInstruction => true,
                NodeType::Element | NodeType::DocumentType => !doc
                    .children(parent)
                    .filter(|c| Some(*c) != replacing)
                    .any(|c| doc.node_type(c) == Some(child)),
                _ => false,
            },
            Some(NodeKind::Element { .. } | NodeKind::DocumentFragment) => matches!(
                child,
                NodeType::Element
                    | NodeType::Text
                    | NodeType::Comment
                    | NodeType::ProcessingInstruction
            ),
            _ => false,
        }
    }
}

/// Accepts any child under any parent.
///
/// Hierarchy checks still apply: no cycles, and the document node is never a child.
#[derive(Copy, Clone, Debug, Default)]
pub struct PermissiveChildPolicy;

impl ChildPolicy for PermissiveChildPolicy {
    fn child_type_allowed(
        &self,
        _doc: &Document,
        _parent: NodeId,
        _child: NodeType,
        _replacing: Option<NodeId>,
    ) -> bool {
        true
    }
}
