// SPDX-FileCopyrightText: 2021 Softbear, Inc.
// SPDX-License-Identifier: AGPL-3.0-or-later

use std::cell::Cell;
use std::fmt;

/// Distinguishes resources that a driver gave the same raw name to, because the first one was
/// deleted before the second one was created. Minted by a [`QualifierCounter`], never reused.
#[repr(transparent)]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Qualifier(pub i64);

impl Qualifier {
    /// Never assigned.
    pub const NONE: Self = Self(0);
    /// Reserved for the default (screen) framebuffer, which is live but never minted.
    pub const SCREEN: Self = Self(-1);

    /// Returns true if this isn't [`Self::NONE`].
    pub fn is_some(self) -> bool {
        self != Self::NONE
    }
}

/// A raw driver name paired with the [`Qualifier`] of the resource that owns it. Two handles are
/// only equal if both halves are, so a stale handle to a deleted resource never compares equal
/// to a newer resource that reuses its raw name.
#[derive(Copy, Clone, Default, Eq, PartialEq, Hash)]
pub struct Qualified {
    /// Raw driver name, `0` if none.
    pub raw: u32,
    /// Identity of the owning resource.
    pub qualifier: Qualifier,
}

impl Qualified {
    /// The empty handle. Equal to [`Qualified::default`].
    pub const NONE: Self = Self {
        raw: 0,
        qualifier: Qualifier::NONE,
    };

    /// Pairs a raw name with a qualifier.
    pub fn new(raw: u32, qualifier: Qualifier) -> Self {
        Self { raw, qualifier }
    }

    /// Returns true if this handle was ever assigned (as opposed to default-constructed or
    /// [`clear`][`Self::clear`]ed).
    pub fn is_some(&self) -> bool {
        self.qualifier.is_some()
    }

    /// Resets both halves to empty.
    pub fn clear(&mut self) {
        *self = Self::NONE;
    }

    /// Clears and returns the previous value.
    pub fn take(&mut self) -> Self {
        std::mem::take(self)
    }
}

impl fmt::Debug for Qualified {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.raw, self.qualifier.0)
    }
}

/// Hands out strictly increasing [`Qualifier`]s, starting from 1. Owned by a
/// [`Context`][`crate::Context`], not global.
#[derive(Debug)]
pub struct QualifierCounter(Cell<i64>);

impl QualifierCounter {
    /// Creates a counter whose first [`next`][`Self::next`] is `Qualifier(1)`.
    pub fn new() -> Self {
        Self(Cell::new(1))
    }

    /// Returns the current value, then increments.
    pub fn next(&self) -> Qualifier {
        let current = self.0.get();
        self.0
            .set(current.checked_add(1).expect("qualifier counter overflow"));
        Qualifier(current)
    }
}

impl Default for QualifierCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equality_needs_both_halves() {
        let a = Qualified::new(5, Qualifier(1));
        let b = Qualified::new(5, Qualifier(2));
        let c = Qualified::new(6, Qualifier(1));
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Qualified::new(5, Qualifier(1)));
    }

    #[test]
    fn test_empty() {
        assert!(!Qualified::default().is_some());
        assert_eq!(Qualified::default(), Qualified::NONE);

        let mut handle = Qualified::new(3, Qualifier(7));
        assert!(handle.is_some());
        assert_eq!(handle.take(), Qualified::new(3, Qualifier(7)));
        assert!(!handle.is_some());

        // Screen is live even though raw is 0.
        let screen = Qualified::new(0, Qualifier::SCREEN);
        assert!(screen.is_some());
        assert_ne!(screen, Qualified::NONE);
    }

    #[test]
    fn test_counter() {
        let counter = QualifierCounter::new();
        let first = counter.next();
        assert_eq!(first, Qualifier(1));
        assert!(first.is_some());
        assert!(counter.next() > first);
    }
}
