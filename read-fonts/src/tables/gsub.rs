//! the [GSUB] table
//!
//! Only ligature substitution is decoded here.
//!
//! [GSUB]: https://docs.microsoft.com/en-us/typography/opentype/spec/gsub

use types::GlyphId16;

use crate::font_data::{FontData, ScalarArray};
use crate::read::{resolve_offset16, FontRead, ReadError};

pub use super::layout::CoverageTable;

/// The GSUB lookup type that wraps other lookup types.
pub const EXTENSION_LOOKUP_TYPE: u16 = 7;

/// The GSUB lookup type for ligature substitution.
pub const LIGATURE_LOOKUP_TYPE: u16 = 4;

/// [Ligature Substitution Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gsub#41-ligature-substitution-format-1)
#[derive(Clone, Debug)]
pub struct LigatureSubstFormat1<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
    ligature_set_offsets: ScalarArray<'a, u16>,
}

impl<'a> FontRead<'a> for LigatureSubstFormat1<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format.into()));
        }
        let coverage = resolve_offset16(data, cursor.read()?)?;
        let count: u16 = cursor.read()?;
        let ligature_set_offsets = cursor.read_array(count as usize)?;
        Ok(LigatureSubstFormat1 {
            data,
            coverage,
            ligature_set_offsets,
        })
    }
}

impl<'a> LigatureSubstFormat1<'a> {
    pub fn coverage(&self) -> &CoverageTable<'a> {
        &self.coverage
    }

    pub fn ligature_set_count(&self) -> usize {
        self.ligature_set_offsets.len()
    }

    /// The ligatures starting with the glyph at `coverage_index`.
    pub fn ligature_set(&self, coverage_index: u16) -> Result<LigatureSet<'a>, ReadError> {
        let offset = self
            .ligature_set_offsets
            .get(coverage_index as usize)
            .ok_or(ReadError::OutOfBounds)?;
        resolve_offset16(self.data, offset)
    }
}

/// All the ligatures that start with a given glyph, in preference order.
#[derive(Clone, Debug)]
pub struct LigatureSet<'a> {
    data: FontData<'a>,
    ligature_offsets: ScalarArray<'a, u16>,
}

impl<'a> FontRead<'a> for LigatureSet<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let count: u16 = cursor.read()?;
        let ligature_offsets = cursor.read_array(count as usize)?;
        Ok(LigatureSet {
            data,
            ligature_offsets,
        })
    }
}

impl<'a> LigatureSet<'a> {
    pub fn len(&self) -> usize {
        self.ligature_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ligature_offsets.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Ligature<'a>, ReadError> {
        let offset = self
            .ligature_offsets
            .get(index)
            .ok_or(ReadError::OutOfBounds)?;
        resolve_offset16(self.data, offset)
    }

    /// The ligatures of this set; unreadable ones are skipped.
    pub fn ligatures(&self) -> impl Iterator<Item = Ligature<'a>> + '_ {
        (0..self.len()).filter_map(|idx| self.get(idx).ok())
    }
}

/// A single ligature: the glyphs it replaces and the glyph it produces.
#[derive(Clone, Debug)]
pub struct Ligature<'a> {
    ligature_glyph: GlyphId16,
    component_count: u16,
    /// Every component but the first, which is matched by coverage.
    component_glyph_ids: ScalarArray<'a, GlyphId16>,
}

impl<'a> FontRead<'a> for Ligature<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let ligature_glyph = cursor.read()?;
        let component_count: u16 = cursor.read()?;
        let component_glyph_ids =
            cursor.read_array((component_count as usize).saturating_sub(1))?;
        Ok(Ligature {
            ligature_glyph,
            component_count,
            component_glyph_ids,
        })
    }
}

impl<'a> Ligature<'a> {
    pub fn ligature_glyph(&self) -> GlyphId16 {
        self.ligature_glyph
    }

    /// The number of components, including the first.
    ///
    /// A count of zero is malformed; a count of one is a single glyph
    /// substitution that happens to live in a ligature table.
    pub fn component_count(&self) -> u16 {
        self.component_count
    }

    pub fn component_glyph_ids(&self) -> ScalarArray<'a, GlyphId16> {
        self.component_glyph_ids
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::tests::test_helpers::BeBuffer;
    use types::GlyphId;

    /// Ligatures starting with glyph 10: `10 11 12 -> 100`, `10 11 -> 101`
    /// and the degenerate `10 -> 102`.
    pub(crate) fn ligature_subtable() -> BeBuffer {
        let mut buf = BeBuffer::new()
            .push(1u16)
            .push_with_tag(0u16, "coverage")
            .push(1u16)
            .push_with_tag(0u16, "set")
            .mark("coverage_data")
            .extend([1u16, 1, 10])
            .mark("set_data")
            .push(3u16)
            .push_with_tag(0u16, "lig0")
            .push_with_tag(0u16, "lig1")
            .push_with_tag(0u16, "lig2")
            .mark("lig0_data")
            .extend([100u16, 3, 11, 12])
            .mark("lig1_data")
            .extend([101u16, 2, 11])
            .mark("lig2_data")
            .extend([102u16, 1]);
        buf.write_at("coverage", buf.offset_for("coverage_data") as u16);
        buf.write_at("set", buf.offset_for("set_data") as u16);
        let set = buf.offset_for("set_data");
        for name in ["lig0", "lig1", "lig2"] {
            let target = buf.offset_for(&format!("{name}_data")) - set;
            buf.write_at(name, target as u16);
        }
        buf
    }

    #[test]
    fn ligature_sets() {
        let buf = ligature_subtable();
        let table = LigatureSubstFormat1::read(buf.font_data()).unwrap();
        let index = table.coverage().get(GlyphId::new(10)).unwrap();
        let set = table.ligature_set(index).unwrap();
        assert_eq!(set.len(), 3);
        let ligatures: Vec<_> = set.ligatures().collect();
        assert_eq!(ligatures[0].ligature_glyph(), GlyphId16::new(100));
        assert_eq!(ligatures[0].component_count(), 3);
        assert_eq!(
            ligatures[0].component_glyph_ids().iter().collect::<Vec<_>>(),
            vec![GlyphId16::new(11), GlyphId16::new(12)]
        );
        assert_eq!(ligatures[2].component_count(), 1);
        assert!(ligatures[2].component_glyph_ids().is_empty());
        assert!(table.ligature_set(1).is_err());
    }

    #[test]
    fn truncated_ligature_never_panics() {
        let buf = ligature_subtable();
        for len in 0..buf.len() {
            if let Ok(table) = LigatureSubstFormat1::read(FontData::new(&buf[..len])) {
                if let Ok(set) = table.ligature_set(0) {
                    assert!(set.ligatures().count() < 3);
                }
            }
        }
    }
}
