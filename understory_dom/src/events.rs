// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Listener registry and synchronous event dispatch.
//!
//! Listeners are plain closures stored on their node. Dispatch clones the listeners of each
//! step before calling them, so a listener may freely mutate the document, including adding
//! or removing listeners and moving or deleting the nodes on the propagation path.
//! Steps whose node died in the meantime are skipped.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;

use understory_dispatch::kind::MutationEventKind;
use understory_dispatch::path::{deliver, propagation_path};
use understory_dispatch::types::{Dispatch, Outcome, Phase};

use crate::document::Document;
use crate::error::DomException;
use crate::types::NodeId;

/// A mutation event as seen by a listener.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationEvent {
    /// What happened.
    pub kind: MutationEventKind,
    /// The node the event was fired at.
    pub target: NodeId,
    /// The node whose listeners are running.
    pub current_target: NodeId,
    /// Propagation phase of the running listeners.
    pub phase: Phase,
    /// For insertion and removal, the parent involved.
    pub related_node: Option<NodeId>,
    /// For character data changes, the value before the change.
    pub prev_value: Option<String>,
    /// For character data changes, the value after the change.
    pub new_value: Option<String>,
}

impl MutationEvent {
    /// A structural event aimed at `target`.
    pub fn new(kind: MutationEventKind, target: NodeId, related_node: Option<NodeId>) -> Self {
        Self {
            kind,
            target,
            current_target: target,
            phase: Phase::Target,
            related_node,
            prev_value: None,
            new_value: None,
        }
    }
}

/// A mutation listener.
///
/// Returning `Err` aborts propagation; the error is surfaced to whoever fired the event.
pub type Listener = Rc<dyn Fn(&mut Document, &MutationEvent) -> Result<Outcome, DomException>>;

/// Identifies a registered listener for removal.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct RegisteredListener {
    id: ListenerId,
    kind: MutationEventKind,
    capture: bool,
    callback: Listener,
}

impl RegisteredListener {
    fn runs_in(&self, kind: MutationEventKind, phase: Phase) -> bool {
        self.kind == kind
            && match phase {
                Phase::Capture => self.capture,
                Phase::Target => true,
                Phase::Bubble => !self.capture,
            }
    }
}

impl core::fmt::Debug for RegisteredListener {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RegisteredListener")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("capture", &self.capture)
            .finish_non_exhaustive()
    }
}

impl Document {
    /// Register `listener` for `kind` events on `node`.
    ///
    /// Capturing listeners run while the event travels down to a descendant target;
    /// the others run while it bubbles back up. Both run at the target.
    pub fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: MutationEventKind,
        capture: bool,
        listener: impl Fn(&mut Self, &MutationEvent) -> Result<Outcome, DomException> + 'static,
    ) -> Result<ListenerId, DomException> {
        let id = ListenerId(self.next_listener_id);
        let n = self.node_mut(node).ok_or(DomException::NotFound)?;
        n.listeners.push(RegisteredListener {
            id,
            kind,
            capture,
            callback: Rc::new(listener),
        });
        self.next_listener_id += 1;
        self.add_listener_type(kind);
        Ok(id)
    }

    /// Unregister a listener. Returns whether it was found.
    ///
    /// The document's listener-type mask is never narrowed.
    pub fn remove_event_listener(&mut self, node: NodeId, id: ListenerId) -> bool {
        let Some(n) = self.node_mut(node) else {
            return false;
        };
        let before = n.listeners.len();
        n.listeners.retain(|l| l.id != id);
        n.listeners.len() != before
    }

    fn listeners_for(&self, step: &Dispatch<NodeId>, kind: MutationEventKind) -> Vec<Listener> {
        self.node(step.node)
            .map(|n| {
                n.listeners
                    .iter()
                    .filter(|l| l.runs_in(kind, step.phase))
                    .map(|l| Rc::clone(&l.callback))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Fire `event` synchronously along its propagation path.
    ///
    /// Returns whether a listener prevented the default action of a cancelable event.
    /// A listener error stops propagation and is returned.
    ///
    /// Dispatch while dispatch is forbidden is a bug in the caller.
    pub fn dispatch_event(&mut self, mut event: MutationEvent) -> Result<bool, DomException> {
        debug_assert!(
            !self.guard.is_forbidden(),
            "event dispatch while dispatch is forbidden"
        );
        if !self.is_alive(event.target) {
            return Ok(false);
        }
        let kind = event.kind;
        let seq = propagation_path(event.target, kind.bubbles(), &*self);
        let consumed = deliver(&seq, |step| {
            let listeners = self.listeners_for(step, kind);
            if listeners.is_empty() {
                return Ok(Outcome::Continue);
            }
            event.current_target = step.node;
            event.phase = step.phase;
            let mut outcome = Outcome::Continue;
            for listener in listeners {
                outcome = outcome.merge(listener(self, &event)?);
            }
            Ok(outcome)
        })?;
        Ok(consumed && kind.cancelable())
    }
}
