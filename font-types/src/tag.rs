use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

/// A four byte OpenType tag, such as `wght` or `GPOS`.
///
/// Tags read from fonts are not validated, since broken tags show up in real
/// data and still need to round-trip. Tags built by hand should go through
/// [`Tag::new_checked`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "bytemuck", derive(bytemuck::AnyBitPattern))]
#[repr(transparent)]
pub struct Tag([u8; 4]);

impl Tag {
    pub const fn new(src: &[u8; 4]) -> Tag {
        Tag(*src)
    }

    /// Build a tag from one to four printable ASCII bytes, padding with spaces.
    ///
    /// A space may not start the tag and may only be followed by more spaces.
    pub fn new_checked(src: &[u8]) -> Result<Self, InvalidTag> {
        if src.is_empty() || src.len() > 4 {
            return Err(InvalidTag::InvalidLength(src.len()));
        }
        let mut raw = [b' '; 4];
        let mut seen_space = false;
        for (pos, byte) in src.iter().copied().enumerate() {
            match byte {
                b' ' if pos == 0 => return Err(InvalidTag::InvalidByte { pos, byte }),
                b' ' => seen_space = true,
                0x21..=0x7e if seen_space => return Err(InvalidTag::ByteAfterSpace { pos }),
                0x21..=0x7e => (),
                _ => return Err(InvalidTag::InvalidByte { pos, byte }),
            }
            raw[pos] = byte;
        }
        Ok(Tag(raw))
    }

    pub const fn from_be_bytes(bytes: [u8; 4]) -> Self {
        Self(bytes)
    }

    pub const fn from_u32(src: u32) -> Self {
        Self(src.to_be_bytes())
    }

    pub const fn to_be_bytes(self) -> [u8; 4] {
        self.0
    }

    pub const fn to_u32(self) -> u32 {
        u32::from_be_bytes(self.0)
    }
}

/// Why [`Tag::new_checked`] rejected its input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InvalidTag {
    InvalidLength(usize),
    InvalidByte { pos: usize, byte: u8 },
    ByteAfterSpace { pos: usize },
}

impl Display for InvalidTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InvalidTag::InvalidLength(len) => write!(f, "tag must be 1-4 bytes, found {len}"),
            InvalidTag::InvalidByte { pos, byte } => {
                write!(f, "invalid byte 0x{byte:02x} at position {pos}")
            }
            InvalidTag::ByteAfterSpace { pos } => {
                write!(f, "non-space byte at position {pos} follows a space")
            }
        }
    }
}

impl std::error::Error for InvalidTag {}

impl FromStr for Tag {
    type Err = InvalidTag;

    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Tag::new_checked(src.as_bytes())
    }
}

impl crate::Scalar for Tag {
    type Raw = [u8; 4];

    fn from_raw(raw: [u8; 4]) -> Self {
        Tag(raw)
    }

    fn to_raw(self) -> [u8; 4] {
        self.0
    }
}

impl PartialEq<&str> for Tag {
    fn eq(&self, other: &&str) -> bool {
        self.0.as_slice() == other.as_bytes()
    }
}

impl Display for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            if (0x20..=0x7e).contains(&byte) {
                write!(f, "{}", byte as char)?;
            } else {
                write!(f, "{{0x{byte:02X}}}")?;
            }
        }
        Ok(())
    }
}

impl Debug for Tag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Tag({self})")
    }
}
