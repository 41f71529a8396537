//! the [GPOS] table
//!
//! Only the subtable formats used by the shaper are decoded here: cursive
//! attachment and class-based pair adjustment.
//!
//! [GPOS]: https://docs.microsoft.com/en-us/typography/opentype/spec/gpos

use types::{GlyphId, Scalar};

use crate::font_data::{FontData, ScalarArray};
use crate::read::{resolve_offset16, FontRead, ReadError};

pub use super::layout::{AnchorTable, ClassDef, CoverageTable, ValueFormat, ValueRecord};

/// The GPOS lookup type that wraps other lookup types.
pub const EXTENSION_LOOKUP_TYPE: u16 = 9;

/// [GPOS Lookup Type](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#table-organization) values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PositionLookupType {
    Single = 1,
    Pair = 2,
    Cursive = 3,
    MarkToBase = 4,
    MarkToLigature = 5,
    MarkToMark = 6,
    Contextual = 7,
    ChainContextual = 8,
    Extension = 9,
}

impl TryFrom<u16> for PositionLookupType {
    type Error = ReadError;

    fn try_from(value: u16) -> Result<Self, ReadError> {
        Ok(match value {
            1 => Self::Single,
            2 => Self::Pair,
            3 => Self::Cursive,
            4 => Self::MarkToBase,
            5 => Self::MarkToLigature,
            6 => Self::MarkToMark,
            7 => Self::Contextual,
            8 => Self::ChainContextual,
            9 => Self::Extension,
            other => return Err(ReadError::InvalidFormat(other.into())),
        })
    }
}

/// The entry and exit anchor offsets for one covered glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EntryExitRecord {
    pub entry_anchor_offset: u16,
    pub exit_anchor_offset: u16,
}

impl Scalar for EntryExitRecord {
    type Raw = [u8; 4];

    fn from_raw(raw: Self::Raw) -> Self {
        EntryExitRecord {
            entry_anchor_offset: u16::from_be_bytes([raw[0], raw[1]]),
            exit_anchor_offset: u16::from_be_bytes([raw[2], raw[3]]),
        }
    }

    fn to_raw(self) -> Self::Raw {
        let [a, b] = self.entry_anchor_offset.to_be_bytes();
        let [c, d] = self.exit_anchor_offset.to_be_bytes();
        [a, b, c, d]
    }
}

/// [Cursive Attachment Positioning Format 1](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#cursive-attachment-positioning-format1-cursive-attachment)
#[derive(Clone, Debug)]
pub struct CursivePosFormat1<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
    entry_exit_records: ScalarArray<'a, EntryExitRecord>,
}

impl<'a> FontRead<'a> for CursivePosFormat1<'a> {
    /// Validates the header, the coverage table and the record array.
    ///
    /// Anchors that can't be read are treated as absent rather than failing
    /// the whole subtable.
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 1 {
            return Err(ReadError::InvalidFormat(format.into()));
        }
        let coverage = resolve_offset16(data, cursor.read()?)?;
        let count: u16 = cursor.read()?;
        let entry_exit_records = cursor.read_array(count as usize)?;
        Ok(CursivePosFormat1 {
            data,
            coverage,
            entry_exit_records,
        })
    }
}

impl<'a> CursivePosFormat1<'a> {
    /// Returns `true` if `data` holds a subtable this parser accepts.
    pub fn sanitize(data: FontData<'a>) -> bool {
        Self::read(data).is_ok()
    }

    pub fn coverage(&self) -> &CoverageTable<'a> {
        &self.coverage
    }

    pub fn entry_exit_records(&self) -> ScalarArray<'a, EntryExitRecord> {
        self.entry_exit_records
    }

    /// The entry anchor of the glyph at `coverage_index`, if it has one.
    pub fn entry_anchor(&self, coverage_index: u16) -> Option<AnchorTable> {
        let record = self.entry_exit_records.get(coverage_index as usize)?;
        self.anchor(record.entry_anchor_offset)
    }

    /// The exit anchor of the glyph at `coverage_index`, if it has one.
    pub fn exit_anchor(&self, coverage_index: u16) -> Option<AnchorTable> {
        let record = self.entry_exit_records.get(coverage_index as usize)?;
        self.anchor(record.exit_anchor_offset)
    }

    /// The entry and exit anchors for `gid`, if it is covered.
    pub fn anchors(&self, gid: GlyphId) -> Option<(Option<AnchorTable>, Option<AnchorTable>)> {
        let index = self.coverage.get(gid)?;
        Some((self.entry_anchor(index), self.exit_anchor(index)))
    }

    fn anchor(&self, offset: u16) -> Option<AnchorTable> {
        resolve_offset16(self.data, offset).ok()
    }
}

/// [Pair Adjustment Positioning Format 2](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#pair-adjustment-positioning-format-2-class-pair-adjustment)
///
/// The value records form a `class1_count x class2_count` matrix, each cell
/// holding a record for the first and a record for the second glyph.
#[derive(Clone, Debug)]
pub struct PairPosFormat2<'a> {
    data: FontData<'a>,
    coverage: CoverageTable<'a>,
    value_format1: ValueFormat,
    value_format2: ValueFormat,
    class_def1: ClassDef<'a>,
    class_def2: ClassDef<'a>,
    class1_count: u16,
    class2_count: u16,
}

impl PairPosFormat2<'_> {
    const VALUES_OFFSET: usize = 16;
}

impl<'a> FontRead<'a> for PairPosFormat2<'a> {
    /// Validates the header, the coverage and class tables, and that the
    /// whole value matrix is in bounds.
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        if format != 2 {
            return Err(ReadError::InvalidFormat(format.into()));
        }
        let coverage_offset: u16 = cursor.read()?;
        let value_format1: ValueFormat = cursor.read()?;
        let value_format2: ValueFormat = cursor.read()?;
        let class_def1_offset: u16 = cursor.read()?;
        let class_def2_offset: u16 = cursor.read()?;
        let class1_count: u16 = cursor.read()?;
        let class2_count: u16 = cursor.read()?;
        cursor.finish()?;

        let table = PairPosFormat2 {
            data,
            coverage: resolve_offset16(data, coverage_offset)?,
            value_format1,
            value_format2,
            class_def1: resolve_offset16(data, class_def1_offset)?,
            class_def2: resolve_offset16(data, class_def2_offset)?,
            class1_count,
            class2_count,
        };
        let matrix_len = (class1_count as usize)
            .checked_mul(class2_count as usize)
            .and_then(|count| count.checked_mul(table.record_stride()))
            .ok_or(ReadError::InvalidArrayLen)?;
        if !data.check_range(Self::VALUES_OFFSET, matrix_len) {
            return Err(ReadError::OutOfBounds);
        }
        Ok(table)
    }
}

impl<'a> PairPosFormat2<'a> {
    /// Returns `true` if `data` holds a subtable whose value matrix is in
    /// bounds.
    pub fn sanitize(data: FontData<'a>) -> bool {
        Self::read(data).is_ok()
    }

    pub fn coverage(&self) -> &CoverageTable<'a> {
        &self.coverage
    }

    pub fn class_def1(&self) -> &ClassDef<'a> {
        &self.class_def1
    }

    pub fn class_def2(&self) -> &ClassDef<'a> {
        &self.class_def2
    }

    pub fn value_format1(&self) -> ValueFormat {
        self.value_format1
    }

    pub fn value_format2(&self) -> ValueFormat {
        self.value_format2
    }

    pub fn class1_count(&self) -> u16 {
        self.class1_count
    }

    pub fn class2_count(&self) -> u16 {
        self.class2_count
    }

    /// The size in bytes of one cell of the value matrix.
    pub fn record_stride(&self) -> usize {
        self.value_format1.record_byte_len() + self.value_format2.record_byte_len()
    }

    /// The value records for a pair of classes.
    ///
    /// Returns `None` if either class is outside the matrix.
    pub fn record(&self, class1: u16, class2: u16) -> Option<(ValueRecord, ValueRecord)> {
        if class1 >= self.class1_count || class2 >= self.class2_count {
            return None;
        }
        let cell = class1 as usize * self.class2_count as usize + class2 as usize;
        let offset = Self::VALUES_OFFSET + cell * self.record_stride();
        let first_data = self.data.split_off(offset)?;
        let second_data = first_data.split_off(self.value_format1.record_byte_len())?;
        let first = ValueRecord::read(first_data, self.value_format1).ok()?;
        let second = ValueRecord::read(second_data, self.value_format2).ok()?;
        Some((first, second))
    }

    /// The value records for a pair of glyphs, if the first is covered.
    pub fn pair_records(
        &self,
        first: GlyphId,
        second: GlyphId,
    ) -> Option<(ValueRecord, ValueRecord)> {
        self.coverage.get(first)?;
        self.record(self.class_def1.get(first), self.class_def2.get(second))
    }
}
