// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_dispatch --heading-base-level=0

//! Understory Dispatch: deterministic, `no_std` propagation for structural mutation events.
//!
//! ## Overview
//!
//! This crate knows how mutation events travel, not what a tree looks like.
//! A tree implementation supplies a [`ParentLookup`](crate::types::ParentLookup) and gets back a
//! capture → target → bubble sequence of [`Dispatch`](crate::types::Dispatch) steps that a
//! higher-level dispatcher walks while invoking listeners.
//!
//! ## Pieces
//!
//! - [`MutationEventKind`](crate::kind::MutationEventKind): the structural event vocabulary
//!   (`DOMNodeInserted`, `DOMNodeRemoved`, `DOMSubtreeModified`, ...) with its bubbling and
//!   cancelation properties.
//! - [`ListenerTypes`](crate::kind::ListenerTypes): a bitmask a document keeps so it can skip
//!   building events nobody listens to.
//! - [`propagation_path`](crate::path::propagation_path) and [`deliver`](crate::path::deliver):
//!   build and walk a propagation sequence.
//! - [`DispatchGuard`](crate::guard::DispatchGuard): a nested forbid/allow counter that brackets
//!   raw link surgery so no listener ever sees a half-linked tree.
//!
//! ## Example
//!
//! ```
//! use understory_dispatch::path::{deliver, propagation_path};
//! use understory_dispatch::types::{Outcome, ParentLookup, Phase};
//!
//! struct Parents;
//! impl ParentLookup<u32> for Parents {
//!     fn parent_of(&self, node: &u32) -> Option<u32> {
//!         match node {
//!             3 => Some(2),
//!             2 => Some(1),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! let seq = propagation_path(3, true, &Parents);
//! let phases: Vec<(Phase, u32)> = seq.iter().map(|d| (d.phase, d.node)).collect();
//! assert_eq!(
//!     phases,
//!     vec![
//!         (Phase::Capture, 1),
//!         (Phase::Capture, 2),
//!         (Phase::Target, 3),
//!         (Phase::Bubble, 2),
//!         (Phase::Bubble, 1),
//!     ]
//! );
//!
//! // Stop once the event reaches the target.
//! let mut visited = Vec::new();
//! let consumed = deliver(&seq, |d| {
//!     visited.push(d.node);
//!     Ok::<_, ()>(if d.phase == Phase::Target { Outcome::Stop } else { Outcome::Continue })
//! })
//! .unwrap();
//! assert!(!consumed);
//! assert_eq!(visited, vec![1, 2, 3]);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod guard;
pub mod kind;
pub mod path;
pub mod types;
