//! Name identifiers

use std::fmt;

/// Identifier for a string in the `name` table.
///
/// Variable font tables refer to their axis and instance names through these.
/// Ids below 256 are reserved for the standard names; the rest are free for
/// font-specific use.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct NameId(u16);

impl NameId {
    pub const FAMILY_NAME: Self = Self(1);
    pub const SUBFAMILY_NAME: Self = Self(2);
    pub const POSTSCRIPT_NAME: Self = Self(6);
    pub const TYPOGRAPHIC_SUBFAMILY_NAME: Self = Self(17);

    /// The first id available for font-specific names.
    pub const LAST_RESERVED_NAME_ID: Self = Self(255);

    /// Marks an optional name id field as unused.
    pub const UNSET: Self = Self(0xffff);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }

    /// Returns `true` for ids in the range reserved for the standard names.
    pub const fn is_reserved(self) -> bool {
        self.0 <= Self::LAST_RESERVED_NAME_ID.0
    }
}

impl From<u16> for NameId {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl fmt::Debug for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NameId({})", self.0)
    }
}

impl fmt::Display for NameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

crate::newtype_scalar!(NameId, [u8; 2]);
