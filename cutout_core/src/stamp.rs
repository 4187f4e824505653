// Copyright 2026 the Cutout Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Monotonic version stamps.
//!
//! Every derived value in a [`Scene`](crate::scene::Scene) (relative matrix,
//! absolute matrix, bound, box layout) remembers the stamp it was computed
//! at. A value is recomputed only when one of its inputs carries a newer
//! stamp, as decided by [`is_stale`].

/// Logical clock shared by every node of one scene.
///
/// The clock starts at zero and only moves forward. Each call to
/// [`advance`](Self::advance) hands out a stamp strictly greater than every
/// stamp handed out before it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VersionClock {
    last: u64,
}

impl VersionClock {
    /// Creates a clock that has not handed out any stamps yet.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { last: 0 }
    }

    /// Advances the clock and returns the new stamp.
    #[inline]
    pub fn advance(&mut self) -> u64 {
        self.last += 1;
        self.last
    }

    /// Returns the most recently issued stamp (zero if none).
    #[inline]
    #[must_use]
    pub const fn current(&self) -> u64 {
        self.last
    }
}

/// Returns whether a value computed at stamp `cached` must be recomputed,
/// given the current stamps of everything it depends on.
///
/// A value with no dependencies is never stale.
#[inline]
#[must_use]
pub fn is_stale(cached: u64, deps: &[u64]) -> bool {
    deps.iter().copied().max().is_some_and(|newest| cached < newest)
}

/// Returns the newest stamp among `deps`, or zero.
#[inline]
#[must_use]
pub(crate) fn newest(deps: &[u64]) -> u64 {
    deps.iter().copied().max().unwrap_or(0)
}
