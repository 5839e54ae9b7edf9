// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Mutation event vocabulary and the listener-type mask.

use bitflags::bitflags;

bitflags! {
    /// Classes of mutation listeners registered anywhere in a document.
    ///
    /// A document sets a bit the first time a listener of that class is added and never
    /// clears it. Notifiers test the bit before building an event, so documents without
    /// mutation listeners pay nothing for notifications.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ListenerTypes: u16 {
        /// `DOMSubtreeModified`.
        const SUBTREE_MODIFIED            = 0x01;
        /// `DOMNodeInserted`.
        const NODE_INSERTED               = 0x02;
        /// `DOMNodeRemoved`.
        const NODE_REMOVED                = 0x04;
        /// `DOMNodeRemovedFromDocument`.
        const NODE_REMOVED_FROM_DOCUMENT  = 0x08;
        /// `DOMNodeInsertedIntoDocument`.
        const NODE_INSERTED_INTO_DOCUMENT = 0x10;
        /// `DOMCharacterDataModified`.
        const CHARACTER_DATA_MODIFIED     = 0x40;
    }
}

/// A structural mutation event.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MutationEventKind {
    /// A batch of structural changes happened below the target.
    SubtreeModified,
    /// The target was inserted under a new parent.
    NodeInserted,
    /// The target is about to be removed from its parent.
    NodeRemoved,
    /// The target is about to leave the document.
    NodeRemovedFromDocument,
    /// The target entered the document.
    NodeInsertedIntoDocument,
    /// The target's character data changed.
    CharacterDataModified,
}

impl MutationEventKind {
    /// Every kind, in listener-type bit order.
    pub const ALL: [Self; 6] = [
        Self::SubtreeModified,
        Self::NodeInserted,
        Self::NodeRemoved,
        Self::NodeRemovedFromDocument,
        Self::NodeInsertedIntoDocument,
        Self::CharacterDataModified,
    ];

    /// The event type name as seen by script.
    pub const fn name(self) -> &'static str {
        match self {
            Self::SubtreeModified => "DOMSubtreeModified",
            Self::NodeInserted => "DOMNodeInserted",
            Self::NodeRemoved => "DOMNodeRemoved",
            Self::NodeRemovedFromDocument => "DOMNodeRemovedFromDocument",
            Self::NodeInsertedIntoDocument => "DOMNodeInsertedIntoDocument",
            Self::CharacterDataModified => "DOMCharacterDataModified",
        }
    }

    /// Parse an event type name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Whether the event travels back up through the target's ancestors.
    ///
    /// The document-membership events are delivered to each node of a subtree individually
    /// and do not bubble.
    pub const fn bubbles(self) -> bool {
        !matches!(
            self,
            Self::NodeRemovedFromDocument | Self::NodeInsertedIntoDocument
        )
    }

    /// Whether a listener may prevent the event's default action.
    ///
    /// Only the per-node insertion and removal events are cancelable, and even then a
    /// mutation engine completes the structural change regardless.
    pub const fn cancelable(self) -> bool {
        matches!(self, Self::NodeInserted | Self::NodeRemoved)
    }

    /// The listener-type bit that gates this event.
    pub const fn listener_type(self) -> ListenerTypes {
        match self {
            Self::SubtreeModified => ListenerTypes::SUBTREE_MODIFIED,
            Self::NodeInserted => ListenerTypes::NODE_INSERTED,
            Self::NodeRemoved => ListenerTypes::NODE_REMOVED,
            Self::NodeRemovedFromDocument => ListenerTypes::NODE_REMOVED_FROM_DOCUMENT,
            Self::NodeInsertedIntoDocument => ListenerTypes::NODE_INSERTED_INTO_DOCUMENT,
            Self::CharacterDataModified => ListenerTypes::CHARACTER_DATA_MODIFIED,
        }
    }
}

impl core::fmt::Display for MutationEventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for kind in MutationEventKind::ALL {
            assert_eq!(MutationEventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(MutationEventKind::from_name("click"), None);
    }

    #[test]
    fn document_membership_events_do_not_bubble() {
        assert!(MutationEventKind::NodeInserted.bubbles());
        assert!(MutationEventKind::NodeRemoved.bubbles());
        assert!(MutationEventKind::SubtreeModified.bubbles());
        assert!(!MutationEventKind::NodeInsertedIntoDocument.bubbles());
        assert!(!MutationEventKind::NodeRemovedFromDocument.bubbles());
    }

    #[test]
    fn only_per_node_events_are_cancelable() {
        let cancelable: alloc::vec::Vec<_> = MutationEventKind::ALL
            .into_iter()
            .filter(|k| k.cancelable())
            .collect();
        assert_eq!(
            cancelable,
            [MutationEventKind::NodeInserted, MutationEventKind::NodeRemoved]
        );
    }

    #[test]
    fn listener_bits_are_distinct() {
        let mut seen = ListenerTypes::empty();
        for kind in MutationEventKind::ALL {
            let bit = kind.listener_type();
            assert!(!seen.intersects(bit), "{kind} shares a listener bit");
            seen |= bit;
        }
        assert_eq!(seen, ListenerTypes::all());
    }
}
