//! # Mesh Status Flags
//!
//! Per-element status bits (deleted, selected, locked, ...). Every vertex,
//! halfedge, edge and face carries one [`StatusFlags`] word.
//!
//! `DELETED` is owned by the mesh: it is set by the `delete_*` operations and
//! cleared only by garbage collection, which drops the element.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign, Not};

/// Status bits of one mesh element
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StatusFlags(u32);

impl StatusFlags {
    pub const DELETED: Self = Self(1);
    pub const SELECTED: Self = Self(1 << 1);
    pub const LOCKED: Self = Self(1 << 2);
    pub const HIDDEN: Self = Self(1 << 3);
    pub const FEATURE: Self = Self(1 << 5);
    pub const TAGGED: Self = Self(1 << 6);

    const NAMES: [(StatusFlags, &'static str); 6] = [
        (Self::DELETED, "DELETED"),
        (Self::SELECTED, "SELECTED"),
        (Self::LOCKED, "LOCKED"),
        (Self::HIDDEN, "HIDDEN"),
        (Self::FEATURE, "FEATURE"),
        (Self::TAGGED, "TAGGED"),
    ];

    /// No flags set
    #[inline]
    pub const fn empty() -> Self {
        Self(0)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// True if every bit of `other` is set
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set or clear the bits of `other`
    #[inline]
    pub fn set(&mut self, other: Self, on: bool) {
        if on {
            self.0 |= other.0;
        } else {
            self.0 &= !other.0;
        }
    }

    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_deleted(self) -> bool {
        self.contains(Self::DELETED)
    }

    #[inline]
    pub const fn is_selected(self) -> bool {
        self.contains(Self::SELECTED)
    }

    #[inline]
    pub fn set_selected(&mut self, on: bool) {
        self.set(Self::SELECTED, on);
    }

    #[inline]
    pub const fn is_locked(self) -> bool {
        self.contains(Self::LOCKED)
    }

    #[inline]
    pub fn set_locked(&mut self, on: bool) {
        self.set(Self::LOCKED, on);
    }

    #[inline]
    pub const fn is_hidden(self) -> bool {
        self.contains(Self::HIDDEN)
    }

    #[inline]
    pub fn set_hidden(&mut self, on: bool) {
        self.set(Self::HIDDEN, on);
    }

    #[inline]
    pub const fn is_feature(self) -> bool {
        self.contains(Self::FEATURE)
    }

    #[inline]
    pub fn set_feature(&mut self, on: bool) {
        self.set(Self::FEATURE, on);
    }

    #[inline]
    pub const fn is_tagged(self) -> bool {
        self.contains(Self::TAGGED)
    }

    #[inline]
    pub fn set_tagged(&mut self, on: bool) {
        self.set(Self::TAGGED, on);
    }
}

impl BitOr for StatusFlags {
    type Output = Self;
    #[inline]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for StatusFlags {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for StatusFlags {
    type Output = Self;
    #[inline]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl Not for StatusFlags {
    type Output = Self;
    #[inline]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl fmt::Debug for StatusFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        for (flag, name) in Self::NAMES {
            if self.contains(flag) {
                set.entry(&format_args!("{}", name));
            }
        }
        set.finish()
    }
}
