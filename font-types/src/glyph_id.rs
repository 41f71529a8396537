//! Glyph identifiers.
//!
//! Glyph ids are stored in font data as either 16 or 24 bit values. In memory
//! we always work with a 32-bit [`GlyphId`]; [`GlyphId16`] exists for the
//! places where the on-disk width matters.

use crate::Uint24;

/// A glyph identifier, wide enough for every encoding used in fonts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct GlyphId(u32);

impl GlyphId {
    /// The glyph drawn for characters the font does not cover.
    pub const NOTDEF: GlyphId = GlyphId(0);

    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for GlyphId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "GID_{}", self.0)
    }
}

impl From<u16> for GlyphId {
    fn from(value: u16) -> Self {
        Self(value as u32)
    }
}

impl From<GlyphId16> for GlyphId {
    fn from(value: GlyphId16) -> Self {
        Self(value.0 as u32)
    }
}

impl From<Uint24> for GlyphId {
    fn from(value: Uint24) -> Self {
        Self(value.to_u32())
    }
}

crate::newtype_scalar!(GlyphId, [u8; 4]);

/// A glyph identifier as encoded in most OpenType tables.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct GlyphId16(u16);

impl GlyphId16 {
    pub const NOTDEF: GlyphId16 = GlyphId16(0);

    pub const fn new(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn to_u16(self) -> u16 {
        self.0
    }
}

/// The id did not fit in 16 bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TryFromGlyphIdError(pub u32);

impl TryFrom<GlyphId> for GlyphId16 {
    type Error = TryFromGlyphIdError;

    fn try_from(value: GlyphId) -> Result<Self, Self::Error> {
        u16::try_from(value.0)
            .map(GlyphId16)
            .map_err(|_| TryFromGlyphIdError(value.0))
    }
}

impl PartialEq<GlyphId> for GlyphId16 {
    fn eq(&self, other: &GlyphId) -> bool {
        self.0 as u32 == other.0
    }
}

impl std::fmt::Display for GlyphId16 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        GlyphId::from(*self).fmt(f)
    }
}

crate::newtype_scalar!(GlyphId16, [u8; 2]);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrow() {
        assert_eq!(GlyphId16::try_from(GlyphId::new(12)), Ok(GlyphId16::new(12)));
        assert_eq!(
            GlyphId16::try_from(GlyphId::new(0x1_0000)),
            Err(TryFromGlyphIdError(0x1_0000))
        );
        assert_eq!(GlyphId16::new(5), GlyphId::new(5));
    }
}
