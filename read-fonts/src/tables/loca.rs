//! The [loca (Index to Location)][loca] table
//!
//! [loca]: https://docs.microsoft.com/en-us/typography/opentype/spec/loca

use types::{FixedSize, GlyphId};

use super::glyf::Glyph;
use crate::font_data::{FontData, ScalarArray};
use crate::read::{FontRead, ReadError};

/// The [loca] table.
///
/// [loca]: https://docs.microsoft.com/en-us/typography/opentype/spec/loca
#[derive(Clone, Debug)]
pub enum Loca<'a> {
    /// Offsets divided by two.
    Short(ScalarArray<'a, u16>),
    Long(ScalarArray<'a, u32>),
}

impl<'a> Loca<'a> {
    /// `is_long` comes from `head.indexToLocFormat`.
    pub fn read(data: FontData<'a>, is_long: bool) -> Result<Self, ReadError> {
        if is_long {
            if data.len() % u32::RAW_BYTE_LEN != 0 {
                return Err(ReadError::InvalidArrayLen);
            }
            data.read_array(0, data.len() / u32::RAW_BYTE_LEN)
                .map(Loca::Long)
        } else {
            if data.len() % u16::RAW_BYTE_LEN != 0 {
                return Err(ReadError::InvalidArrayLen);
            }
            data.read_array(0, data.len() / u16::RAW_BYTE_LEN)
                .map(Loca::Short)
        }
    }

    /// The number of glyphs described.
    pub fn len(&self) -> usize {
        match self {
            Loca::Short(data) => data.len().saturating_sub(1),
            Loca::Long(data) => data.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_long(&self) -> bool {
        matches!(self, Loca::Long(_))
    }

    /// Attempt to return the offset for a given glyph id.
    pub fn get_raw(&self, idx: usize) -> Option<u32> {
        match self {
            Loca::Short(data) => data.get(idx).map(|x| x as u32 * 2),
            Loca::Long(data) => data.get(idx),
        }
    }

    /// The glyph record for `gid` within `glyf`.
    ///
    /// A glyph whose start and end offsets match has no outline.
    pub fn get_glyf(&self, gid: GlyphId, glyf: FontData<'a>) -> Result<Glyph<'a>, ReadError> {
        let idx = gid.to_u32() as usize;
        let start = self.get_raw(idx).ok_or(ReadError::OutOfBounds)?;
        let end = self.get_raw(idx + 1).ok_or(ReadError::OutOfBounds)?;
        if start == end {
            return Ok(Glyph::Empty);
        }
        let data = glyf
            .slice(start as usize..end as usize)
            .ok_or(ReadError::OutOfBounds)?;
        Glyph::read(data)
    }
}
