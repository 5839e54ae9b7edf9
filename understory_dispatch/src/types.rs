// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core types for propagation: phases, outcomes, parent lookups, and dispatch steps.
//!
//! ## Overview
//!
//! These types describe the propagation protocol and its inputs/outputs.
//! They are produced by [`path`](crate::path) and consumed by the listener-invoking layer of a tree.

/// Phases of event propagation.
///
/// Appears on each [`Dispatch`] item produced by
/// [`propagation_path`](crate::path::propagation_path).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Phase {
    /// Root-to-parent traversal; only capturing listeners run.
    Capture,
    /// The target node; every listener runs.
    Target,
    /// Parent-to-root traversal; only non-capturing listeners run, and only for bubbling events.
    Bubble,
}

/// Handler outcome controlling propagation.
///
/// Listener-invoking layers return this from each step handed to
/// [`deliver`](crate::path::deliver).
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Outcome {
    /// Keep propagating.
    #[default]
    Continue,
    /// Finish the current node, then stop propagation.
    Stop,
    /// Stop propagation and mark the event consumed (its default action is prevented).
    StopAndConsume,
}

impl Outcome {
    /// Combine the outcomes of several listeners on the same node.
    ///
    /// The strongest outcome wins: `StopAndConsume` over `Stop` over `Continue`.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::StopAndConsume, _) | (_, Self::StopAndConsume) => Self::StopAndConsume,
            (Self::Stop, _) | (_, Self::Stop) => Self::Stop,
            _ => Self::Continue,
        }
    }
}

/// Look up the parent of a node to build a root→target propagation path.
pub trait ParentLookup<K> {
    /// Returns the parent of `node`, or `None` if `node` is a root.
    fn parent_of(&self, node: &K) -> Option<K>;
}

/// A no‑op parent provider; every node is its own root.
///
/// All calls to [`ParentLookup::parent_of`] return `None`.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoParent;

impl<K> ParentLookup<K> for NoParent {
    #[inline]
    fn parent_of(&self, _node: &K) -> Option<K> {
        None
    }
}

/// A single propagation step.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dispatch<K> {
    /// Propagation phase for this step.
    pub phase: Phase,
    /// Node whose listeners run for this step (the event's current target).
    pub node: K,
}
