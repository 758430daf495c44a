// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::ops::{BitAnd, BitOr, BitOrAssign};

/// File attribute bit set, using the classic Win32 bit values.
#[derive(Copy, Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Attributes(u32);

impl Attributes {
    /// No attributes set.
    pub const NONE: Self = Self(0);

    /// Entry cannot be overwritten or deleted without explicit consent.
    pub const READONLY: Self = Self(0x1);

    /// Entry is hidden from default listings.
    pub const HIDDEN: Self = Self(0x2);

    /// Entry is a directory.
    pub const DIRECTORY: Self = Self(0x10);

    /// Entry is marked for archival.
    pub const ARCHIVE: Self = Self(0x20);

    /// Plain file with no other attributes.
    pub const NORMAL: Self = Self(0x80);

    /// Wraps a raw bit set.
    #[must_use]
    pub fn from_raw(bits: u32) -> Self {
        Self(bits)
    }

    /// The raw bit set.
    #[must_use]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set.
    #[must_use]
    pub fn contains(self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }

    /// Returns `true` if no bits are set.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Removes the bits of `other`.
    #[must_use]
    pub fn without(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for Attributes {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Attributes {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Attributes {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::Attributes;
    use test_log::test;

    #[test]
    fn bit_operations() {
        let attrs = Attributes::DIRECTORY | Attributes::READONLY;
        assert!(attrs.contains(Attributes::DIRECTORY));
        assert!(attrs.contains(Attributes::READONLY));
        assert!(!attrs.contains(Attributes::HIDDEN));

        let stripped = attrs.without(Attributes::READONLY);
        assert!(!stripped.contains(Attributes::READONLY));
        assert!(stripped.contains(Attributes::DIRECTORY));
    }
}
