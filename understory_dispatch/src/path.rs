// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Building and walking propagation sequences.
//!
//! [`propagation_path`] turns a target and a [`ParentLookup`] into the ordered
//! capture → target → bubble steps. The target appears once, in [`Phase::Target`];
//! capture and bubble visit only its ancestors.
//!
//! [`deliver`] walks such a sequence, calling a handler per step and honoring the
//! [`Outcome`] it returns.

use alloc::vec::Vec;

use crate::types::{Dispatch, Outcome, ParentLookup, Phase};

/// Collect `target` and its ancestors, root first.
///
/// The caller guarantees that ancestry is acyclic.
pub fn ancestors_inclusive<K: Copy>(target: K, parents: &impl ParentLookup<K>) -> Vec<K> {
    let mut out = Vec::new();
    let mut cur = target;
    loop {
        out.push(cur);
        match parents.parent_of(&cur) {
            Some(p) => cur = p,
            None => break,
        }
    }
    out.reverse();
    out
}

/// Build the propagation sequence for an event aimed at `target`.
///
/// Capture runs root → parent, then the target, then (when `bubbles`) parent → root.
/// A parentless target yields a single [`Phase::Target`] step.
pub fn propagation_path<K: Copy>(
    target: K,
    bubbles: bool,
    parents: &impl ParentLookup<K>,
) -> Vec<Dispatch<K>> {
    let path = ancestors_inclusive(target, parents);
    let ancestors = &path[..path.len() - 1];
    let mut out = Vec::with_capacity(if bubbles {
        ancestors.len() * 2 + 1
    } else {
        ancestors.len() + 1
    });
    // Capture: root→parent
    for &node in ancestors {
        out.push(Dispatch {
            phase: Phase::Capture,
            node,
        });
    }
    out.push(Dispatch {
        phase: Phase::Target,
        node: target,
    });
    // Bubble: parent→root
    if bubbles {
        for &node in ancestors.iter().rev() {
            out.push(Dispatch {
                phase: Phase::Bubble,
                node,
            });
        }
    }
    out
}

/// Walk `seq`, invoking `handler` for each step until it asks to stop.
///
/// Returns `Ok(true)` if a handler returned [`Outcome::StopAndConsume`].
/// An error from `handler` aborts the walk and is returned as is.
pub fn deliver<K, E>(
    seq: &[Dispatch<K>],
    mut handler: impl FnMut(&Dispatch<K>) -> Result<Outcome, E>,
) -> Result<bool, E> {
    for step in seq {
        match handler(step)? {
            Outcome::Continue => {}
            Outcome::Stop => return Ok(false),
            Outcome::StopAndConsume => return Ok(true),
        }
    }
    Ok(false)
}
