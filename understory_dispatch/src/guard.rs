// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The dispatch-forbidden scope.
//!
//! A [`DispatchGuard`] is a nesting counter, not a lock. Mutation engines raise it around raw
//! link surgery and lower it as soon as the links are consistent again. Any attempt to invoke
//! listeners while it is raised is a reentrancy bug in the caller; dispatchers check
//! [`DispatchGuard::is_forbidden`] in a `debug_assert!`.

/// Nested forbid/allow counter for synchronous listener dispatch.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchGuard {
    depth: u32,
}

impl DispatchGuard {
    /// A guard with dispatch allowed.
    pub const fn new() -> Self {
        Self { depth: 0 }
    }

    /// Enter a forbidden scope. Scopes nest.
    #[inline]
    pub fn forbid(&mut self) {
        self.depth += 1;
    }

    /// Leave the innermost forbidden scope.
    ///
    /// Calls must pair with [`forbid`](Self::forbid); an unmatched `allow` is a bug.
    #[inline]
    pub fn allow(&mut self) {
        debug_assert!(self.depth > 0, "allow() without a matching forbid()");
        self.depth = self.depth.saturating_sub(1);
    }

    /// Whether listener dispatch is currently forbidden.
    #[inline]
    pub const fn is_forbidden(&self) -> bool {
        self.depth > 0
    }

    /// Current nesting depth.
    #[inline]
    pub const fn depth(&self) -> u32 {
        self.depth
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scopes_nest() {
        let mut g = DispatchGuard::new();
        assert!(!g.is_forbidden());
        g.forbid();
        g.forbid();
        assert_eq!(g.depth(), 2);
        g.allow();
        assert!(g.is_forbidden(), "outer scope still active");
        g.allow();
        assert!(!g.is_forbidden());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "without a matching forbid")]
    fn unmatched_allow_panics_in_debug() {
        let mut g = DispatchGuard::new();
        g.allow();
    }
}
