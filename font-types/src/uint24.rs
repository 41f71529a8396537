/// An unsigned 24-bit integer, as used for wide glyph ids.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct Uint24(u32);

impl Uint24 {
    pub const MIN: Self = Uint24(0);
    pub const MAX: Self = Uint24(0xff_ffff);

    /// Create from a u32, saturating at [`Uint24::MAX`].
    pub const fn new(raw: u32) -> Uint24 {
        if raw > Self::MAX.0 {
            Self::MAX
        } else {
            Uint24(raw)
        }
    }

    pub const fn checked_new(raw: u32) -> Option<Uint24> {
        if raw > Self::MAX.0 {
            None
        } else {
            Some(Uint24(raw))
        }
    }

    pub const fn to_u32(self) -> u32 {
        self.0
    }
}

impl crate::Scalar for Uint24 {
    type Raw = [u8; 3];

    fn from_raw(raw: [u8; 3]) -> Self {
        Uint24(u32::from_be_bytes([0, raw[0], raw[1], raw[2]]))
    }

    fn to_raw(self) -> [u8; 3] {
        let [_, a, b, c] = self.0.to_be_bytes();
        [a, b, c]
    }
}

impl From<Uint24> for u32 {
    fn from(src: Uint24) -> u32 {
        src.0
    }
}
