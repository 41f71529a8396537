//! [OpenType Layout Common Table Formats](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2)

use types::{FixedSize, GlyphId, GlyphId16, Scalar};

use crate::font_data::{FontData, ScalarArray};
use crate::read::{resolve_offset16, FontRead, ReadError};

/// A [Coverage Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#coverage-table).
#[derive(Clone, Debug)]
pub enum CoverageTable<'a> {
    /// A sorted list of glyphs.
    Format1(ScalarArray<'a, GlyphId16>),
    /// A sorted list of glyph ranges.
    Format2(ScalarArray<'a, RangeRecord>),
}

impl<'a> FontRead<'a> for CoverageTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        let count: u16 = cursor.read()?;
        match format {
            1 => cursor.read_array(count as usize).map(Self::Format1),
            2 => cursor.read_array(count as usize).map(Self::Format2),
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl CoverageTable<'_> {
    /// If this glyph is in the coverage table, returns its index
    pub fn get(&self, gid: impl Into<GlyphId>) -> Option<u16> {
        let gid = gid.into().to_u32();
        match self {
            CoverageTable::Format1(glyphs) => glyphs
                .binary_search_by(|probe| (probe.to_u16() as u32).cmp(&gid))
                .ok()
                .map(|idx| idx as u16),
            CoverageTable::Format2(ranges) => {
                let idx = ranges
                    .binary_search_by(|range| {
                        if (range.end.to_u16() as u32) < gid {
                            std::cmp::Ordering::Less
                        } else if range.start.to_u16() as u32 > gid {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    })
                    .ok()?;
                let range = ranges.get(idx)?;
                let delta = gid - range.start.to_u16() as u32;
                range.start_coverage_index.checked_add(delta as u16)
            }
        }
    }

    /// Iterate the covered glyphs in coverage index order.
    pub fn iter(&self) -> impl Iterator<Item = GlyphId> + '_ {
        // all one expression so that we have a single return type
        let (iter1, iter2) = match self {
            CoverageTable::Format1(glyphs) => (Some(glyphs.iter().map(GlyphId::from)), None),
            CoverageTable::Format2(ranges) => (None, Some(ranges.iter().flat_map(RangeRecord::iter))),
        };
        iter1
            .into_iter()
            .flatten()
            .chain(iter2.into_iter().flatten())
    }

    /// The number of covered glyphs.
    pub fn population(&self) -> usize {
        match self {
            CoverageTable::Format1(glyphs) => glyphs.len(),
            CoverageTable::Format2(ranges) => ranges
                .iter()
                .map(|r| (r.end.to_u16() as usize + 1).saturating_sub(r.start.to_u16() as usize))
                .sum(),
        }
    }
}

/// A run of consecutive glyphs in a format 2 coverage table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RangeRecord {
    pub start: GlyphId16,
    pub end: GlyphId16,
    pub start_coverage_index: u16,
}

impl RangeRecord {
    pub fn iter(self) -> impl Iterator<Item = GlyphId> {
        (self.start.to_u16()..=self.end.to_u16()).map(GlyphId::from)
    }
}

impl Scalar for RangeRecord {
    type Raw = [u8; 6];

    fn from_raw(raw: Self::Raw) -> Self {
        RangeRecord {
            start: GlyphId16::new(u16::from_be_bytes([raw[0], raw[1]])),
            end: GlyphId16::new(u16::from_be_bytes([raw[2], raw[3]])),
            start_coverage_index: u16::from_be_bytes([raw[4], raw[5]]),
        }
    }

    fn to_raw(self) -> Self::Raw {
        let [a, b] = self.start.to_u16().to_be_bytes();
        let [c, d] = self.end.to_u16().to_be_bytes();
        let [e, f] = self.start_coverage_index.to_be_bytes();
        [a, b, c, d, e, f]
    }
}

/// A [Class Definition Table](https://docs.microsoft.com/en-us/typography/opentype/spec/chapter2#class-definition-table).
#[derive(Clone, Debug)]
pub enum ClassDef<'a> {
    Format1 {
        start_glyph_id: GlyphId16,
        class_values: ScalarArray<'a, u16>,
    },
    Format2(ScalarArray<'a, ClassRangeRecord>),
}

impl<'a> FontRead<'a> for ClassDef<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        match format {
            1 => {
                let start_glyph_id = cursor.read()?;
                let count: u16 = cursor.read()?;
                Ok(ClassDef::Format1 {
                    start_glyph_id,
                    class_values: cursor.read_array(count as usize)?,
                })
            }
            2 => {
                let count: u16 = cursor.read()?;
                cursor.read_array(count as usize).map(ClassDef::Format2)
            }
            other => Err(ReadError::InvalidFormat(other.into())),
        }
    }
}

impl ClassDef<'_> {
    /// Get the class for this glyph id; glyphs not listed are in class 0.
    pub fn get(&self, gid: impl Into<GlyphId>) -> u16 {
        let gid = gid.into().to_u32();
        match self {
            ClassDef::Format1 {
                start_glyph_id,
                class_values,
            } => gid
                .checked_sub(start_glyph_id.to_u16() as u32)
                .and_then(|idx| class_values.get(idx as usize))
                .unwrap_or(0),
            ClassDef::Format2(ranges) => ranges
                .binary_search_by(|range| {
                    if (range.end.to_u16() as u32) < gid {
                        std::cmp::Ordering::Less
                    } else if range.start.to_u16() as u32 > gid {
                        std::cmp::Ordering::Greater
                    } else {
                        std::cmp::Ordering::Equal
                    }
                })
                .ok()
                .and_then(|idx| ranges.get(idx))
                .map(|range| range.class)
                .unwrap_or(0),
        }
    }

    /// The largest class value used by this table.
    pub fn max_class(&self) -> u16 {
        match self {
            ClassDef::Format1 { class_values, .. } => class_values.iter().max(),
            ClassDef::Format2(ranges) => ranges.iter().map(|r| r.class).max(),
        }
        .unwrap_or(0)
    }
}

/// A run of consecutive glyphs that share a class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassRangeRecord {
    pub start: GlyphId16,
    pub end: GlyphId16,
    pub class: u16,
}

impl Scalar for ClassRangeRecord {
    type Raw = [u8; 6];

    fn from_raw(raw: Self::Raw) -> Self {
        let RangeRecord {
            start,
            end,
            start_coverage_index,
        } = RangeRecord::from_raw(raw);
        ClassRangeRecord {
            start,
            end,
            class: start_coverage_index,
        }
    }

    fn to_raw(self) -> Self::Raw {
        RangeRecord {
            start: self.start,
            end: self.end,
            start_coverage_index: self.class,
        }
        .to_raw()
    }
}

/// Which fields are present in a [`ValueRecord`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ValueFormat(u16);

impl ValueFormat {
    pub const X_PLACEMENT: Self = Self(0x0001);
    pub const Y_PLACEMENT: Self = Self(0x0002);
    pub const X_ADVANCE: Self = Self(0x0004);
    pub const Y_ADVANCE: Self = Self(0x0008);
    pub const X_PLACEMENT_DEVICE: Self = Self(0x0010);
    pub const Y_PLACEMENT_DEVICE: Self = Self(0x0020);
    pub const X_ADVANCE_DEVICE: Self = Self(0x0040);
    pub const Y_ADVANCE_DEVICE: Self = Self(0x0080);

    const DEVICES: u16 = 0x00f0;

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 & 0xff == 0
    }

    pub const fn has_device(self) -> bool {
        self.0 & Self::DEVICES != 0
    }

    /// The number of u16 fields in a record of this format.
    pub const fn field_count(self) -> usize {
        (self.0 & 0xff).count_ones() as usize
    }

    /// The size in bytes of a record of this format.
    pub const fn record_byte_len(self) -> usize {
        self.field_count() * u16::RAW_BYTE_LEN
    }
}

impl std::ops::BitOr for ValueFormat {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl Scalar for ValueFormat {
    type Raw = [u8; 2];

    fn from_raw(raw: Self::Raw) -> Self {
        Self(u16::from_raw(raw))
    }

    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
}

/// A [ValueRecord](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#value-record).
///
/// Absent fields read as zero. Device tables are kept as raw offsets and are
/// not applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ValueRecord {
    pub format: ValueFormat,
    pub x_placement: i16,
    pub y_placement: i16,
    pub x_advance: i16,
    pub y_advance: i16,
    pub x_placement_device: u16,
    pub y_placement_device: u16,
    pub x_advance_device: u16,
    pub y_advance_device: u16,
}

impl ValueRecord {
    /// Read a record of the given format from the start of `data`.
    pub fn read(data: FontData, format: ValueFormat) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let mut record = ValueRecord {
            format,
            ..Default::default()
        };
        if format.contains(ValueFormat::X_PLACEMENT) {
            record.x_placement = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_PLACEMENT) {
            record.y_placement = cursor.read()?;
        }
        if format.contains(ValueFormat::X_ADVANCE) {
            record.x_advance = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_ADVANCE) {
            record.y_advance = cursor.read()?;
        }
        if format.contains(ValueFormat::X_PLACEMENT_DEVICE) {
            record.x_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_PLACEMENT_DEVICE) {
            record.y_placement_device = cursor.read()?;
        }
        if format.contains(ValueFormat::X_ADVANCE_DEVICE) {
            record.x_advance_device = cursor.read()?;
        }
        if format.contains(ValueFormat::Y_ADVANCE_DEVICE) {
            record.y_advance_device = cursor.read()?;
        }
        Ok(record)
    }

    /// Returns `true` if this record moves nothing.
    pub fn is_zero(&self) -> bool {
        self.x_placement == 0
            && self.y_placement == 0
            && self.x_advance == 0
            && self.y_advance == 0
            && !self.format.has_device()
    }
}

/// An [Anchor Table](https://learn.microsoft.com/en-us/typography/opentype/spec/gpos#anchor-tables).
///
/// All three formats carry a design-unit coordinate; the contour point of
/// format 2 and the device tables of format 3 are read but not applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AnchorTable {
    pub format: u16,
    pub x: i16,
    pub y: i16,
    /// Format 2 only.
    pub anchor_point: Option<u16>,
}

impl<'a> FontRead<'a> for AnchorTable {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let format: u16 = cursor.read()?;
        let x = cursor.read()?;
        let y = cursor.read()?;
        let anchor_point = match format {
            1 => None,
            2 => Some(cursor.read()?),
            3 => {
                // x and y device offsets
                cursor.read::<u16>()?;
                cursor.read::<u16>()?;
                None
            }
            other => return Err(ReadError::InvalidFormat(other.into())),
        };
        Ok(AnchorTable {
            format,
            x,
            y,
            anchor_point,
        })
    }
}

/// The [LookupFlag](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookupFlag) bit enumeration.
///
/// This is kind-of-but-not-quite-exactly a bit enumeration: the high byte is
/// a mark attachment class.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LookupFlag(u16);

impl LookupFlag {
    pub const RIGHT_TO_LEFT: u16 = 0x0001;
    pub const IGNORE_BASE_GLYPHS: u16 = 0x0002;
    pub const IGNORE_LIGATURES: u16 = 0x0004;
    pub const IGNORE_MARKS: u16 = 0x0008;
    pub const USE_MARK_FILTERING_SET: u16 = 0x0010;
    /// The glyph classes that the three ignore bits skip.
    pub const IGNORE_FLAGS: u16 = 0x000e;

    pub const fn empty() -> Self {
        Self(0)
    }

    /// Construct a LookupFlag from a raw value, discarding reserved bits
    pub const fn from_bits_truncate(bits: u16) -> Self {
        Self(bits & !0x00e0)
    }

    pub const fn to_bits(self) -> u16 {
        self.0
    }

    /// Only meaningful for cursive attachment: the last glyph of a chain is
    /// the one kept on the baseline.
    pub const fn right_to_left(self) -> bool {
        self.0 & Self::RIGHT_TO_LEFT != 0
    }

    pub const fn ignore_base_glyphs(self) -> bool {
        self.0 & Self::IGNORE_BASE_GLYPHS != 0
    }

    pub const fn ignore_ligatures(self) -> bool {
        self.0 & Self::IGNORE_LIGATURES != 0
    }

    pub const fn ignore_marks(self) -> bool {
        self.0 & Self::IGNORE_MARKS != 0
    }

    pub const fn use_mark_filtering_set(self) -> bool {
        self.0 & Self::USE_MARK_FILTERING_SET != 0
    }

    /// If non-zero, skip marks whose attachment class differs.
    pub const fn mark_attachment_class(self) -> u16 {
        self.0 >> 8
    }
}

impl Scalar for LookupFlag {
    type Raw = [u8; 2];

    fn from_raw(raw: Self::Raw) -> Self {
        Self::from_bits_truncate(u16::from_raw(raw))
    }

    fn to_raw(self) -> Self::Raw {
        self.0.to_raw()
    }
}

/// The header shared by the GPOS and GSUB tables.
///
/// Only the lookup list is interpreted; scripts and features are the
/// caller's concern.
#[derive(Clone, Debug)]
pub struct LayoutTable<'a> {
    data: FontData<'a>,
    major_version: u16,
    minor_version: u16,
    lookup_list_offset: u16,
}

impl<'a> FontRead<'a> for LayoutTable<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let major_version: u16 = cursor.read()?;
        let minor_version: u16 = cursor.read()?;
        if major_version != 1 {
            return Err(ReadError::InvalidFormat(major_version.into()));
        }
        // script list and feature list
        cursor.advance::<u16>();
        cursor.advance::<u16>();
        let lookup_list_offset = cursor.read()?;
        if minor_version >= 1 {
            // feature variations offset
            cursor.advance::<u32>();
        }
        cursor.finish()?;
        Ok(LayoutTable {
            data,
            major_version,
            minor_version,
            lookup_list_offset,
        })
    }
}

impl<'a> LayoutTable<'a> {
    pub fn version(&self) -> (u16, u16) {
        (self.major_version, self.minor_version)
    }

    pub fn lookup_list(&self) -> Result<LookupList<'a>, ReadError> {
        resolve_offset16(self.data, self.lookup_list_offset)
    }
}

/// A [Lookup List Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-list-table).
#[derive(Clone, Debug)]
pub struct LookupList<'a> {
    data: FontData<'a>,
    lookup_offsets: ScalarArray<'a, u16>,
}

impl<'a> FontRead<'a> for LookupList<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let count: u16 = cursor.read()?;
        let lookup_offsets = cursor.read_array(count as usize)?;
        Ok(LookupList {
            data,
            lookup_offsets,
        })
    }
}

impl<'a> LookupList<'a> {
    pub fn len(&self) -> usize {
        self.lookup_offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lookup_offsets.is_empty()
    }

    pub fn get(&self, index: usize) -> Result<Lookup<'a>, ReadError> {
        let offset = self
            .lookup_offsets
            .get(index)
            .ok_or(ReadError::OutOfBounds)?;
        resolve_offset16(self.data, offset)
    }

    pub fn iter(&self) -> impl Iterator<Item = Result<Lookup<'a>, ReadError>> + '_ {
        (0..self.len()).map(|idx| self.get(idx))
    }
}

/// A [Lookup Table](https://learn.microsoft.com/en-us/typography/opentype/spec/chapter2#lookup-table).
#[derive(Clone, Debug)]
pub struct Lookup<'a> {
    data: FontData<'a>,
    lookup_type: u16,
    lookup_flag: LookupFlag,
    subtable_offsets: ScalarArray<'a, u16>,
    mark_filtering_set: Option<u16>,
}

impl<'a> FontRead<'a> for Lookup<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        let lookup_type = cursor.read()?;
        let lookup_flag: LookupFlag = cursor.read()?;
        let count: u16 = cursor.read()?;
        let subtable_offsets = cursor.read_array(count as usize)?;
        let mark_filtering_set = if lookup_flag.use_mark_filtering_set() {
            Some(cursor.read()?)
        } else {
            None
        };
        Ok(Lookup {
            data,
            lookup_type,
            lookup_flag,
            subtable_offsets,
            mark_filtering_set,
        })
    }
}

impl<'a> Lookup<'a> {
    pub fn lookup_type(&self) -> u16 {
        self.lookup_type
    }

    pub fn lookup_flag(&self) -> LookupFlag {
        self.lookup_flag
    }

    pub fn mark_filtering_set(&self) -> Option<u16> {
        self.mark_filtering_set
    }

    pub fn subtable_count(&self) -> usize {
        self.subtable_offsets.len()
    }

    /// Returns the concrete type and data of each subtable.
    ///
    /// Subtables of `extension_type` are followed to the subtable they wrap,
    /// and report the wrapped type.
    pub fn subtables(
        &self,
        extension_type: u16,
    ) -> impl Iterator<Item = Result<(u16, FontData<'a>), ReadError>> + '_ {
        self.subtable_offsets.iter().map(move |offset| {
            let data = self
                .data
                .split_off(offset as usize)
                .ok_or(ReadError::OutOfBounds)?;
            if self.lookup_type != extension_type {
                return Ok((self.lookup_type, data));
            }
            let mut cursor = data.cursor();
            let format: u16 = cursor.read()?;
            if format != 1 {
                return Err(ReadError::InvalidFormat(format.into()));
            }
            let wrapped_type: u16 = cursor.read()?;
            let wrapped_offset: u32 = cursor.read()?;
            if wrapped_type == extension_type {
                return Err(ReadError::MalformedData("nested extension lookup"));
            }
            data.split_off(wrapped_offset as usize)
                .map(|data| (wrapped_type, data))
                .ok_or(ReadError::OutOfBounds)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_helpers::BeBuffer;

    #[test]
    fn coverage_format1() {
        let buf = BeBuffer::new().extend([1u16, 3, 2, 7, 40]);
        let coverage = CoverageTable::read(buf.font_data()).unwrap();
        assert_eq!(coverage.get(GlyphId::new(7)), Some(1));
        assert_eq!(coverage.get(GlyphId::new(8)), None);
        assert_eq!(coverage.population(), 3);
        assert_eq!(
            coverage.iter().map(|g| g.to_u32()).collect::<Vec<_>>(),
            vec![2, 7, 40]
        );
    }

    #[test]
    fn coverage_format2() {
        let buf = BeBuffer::new()
            .extend([2u16, 2])
            .extend([10u16, 12, 0])
            .extend([20u16, 20, 3]);
        let coverage = CoverageTable::read(buf.font_data()).unwrap();
        assert_eq!(coverage.get(GlyphId::new(11)), Some(1));
        assert_eq!(coverage.get(GlyphId::new(20)), Some(3));
        assert_eq!(coverage.get(GlyphId::new(13)), None);
        assert_eq!(coverage.get(GlyphId::new(70_000)), None);
        assert_eq!(coverage.population(), 4);
        assert_eq!(coverage.iter().count(), 4);
    }

    #[test]
    fn class_defs() {
        let format1 = BeBuffer::new().extend([1u16, 5, 3, 1, 2, 1]);
        let class_def = ClassDef::read(format1.font_data()).unwrap();
        assert_eq!(class_def.get(GlyphId::new(4)), 0);
        assert_eq!(class_def.get(GlyphId::new(6)), 2);
        assert_eq!(class_def.get(GlyphId::new(8)), 0);
        assert_eq!(class_def.max_class(), 2);

        let format2 = BeBuffer::new().extend([2u16, 1, 30, 35, 4]);
        let class_def = ClassDef::read(format2.font_data()).unwrap();
        assert_eq!(class_def.get(GlyphId::new(33)), 4);
        assert_eq!(class_def.get(GlyphId::new(36)), 0);
    }

    #[test]
    fn value_record_by_format() {
        let format = ValueFormat::X_PLACEMENT | ValueFormat::X_ADVANCE;
        assert_eq!(format.record_byte_len(), 4);
        let buf = BeBuffer::new().extend([-5i16, 120]);
        let record = ValueRecord::read(buf.font_data(), format).unwrap();
        assert_eq!(record.x_placement, -5);
        assert_eq!(record.x_advance, 120);
        assert_eq!(record.y_advance, 0);
        assert!(ValueRecord::read(buf.font_data().slice(..2).unwrap(), format).is_err());
    }

    #[test]
    fn anchors() {
        let f1 = BeBuffer::new().extend([1u16]).extend([10i16, -20]);
        assert_eq!(
            AnchorTable::read(f1.font_data()).unwrap(),
            AnchorTable {
                format: 1,
                x: 10,
                y: -20,
                anchor_point: None
            }
        );
        let f2 = BeBuffer::new().extend([2u16, 1, 2, 9]);
        assert_eq!(AnchorTable::read(f2.font_data()).unwrap().anchor_point, Some(9));
        let bad = BeBuffer::new().extend([4u16, 0, 0]);
        assert!(AnchorTable::read(bad.font_data()).is_err());
    }

    #[test]
    fn lookup_flag_bits() {
        let flag = LookupFlag::from_bits_truncate(0x03e9);
        assert!(flag.right_to_left());
        assert!(flag.ignore_marks());
        assert!(!flag.ignore_ligatures());
        assert_eq!(flag.mark_attachment_class(), 3);
        assert_eq!(flag.to_bits(), 0x0309);
    }

    #[test]
    fn lookups_and_extensions() {
        let mut buf = BeBuffer::new()
            .extend([1u16, 0, 0, 0])
            .push_with_tag(0u16, "lookup_list")
            .mark("list")
            .push(2u16)
            .push_with_tag(0u16, "lookup0")
            .push_with_tag(0u16, "lookup1")
            // a plain pair lookup with one subtable
            .mark("l0")
            .extend([2u16, 0x0008, 1])
            .push_with_tag(0u16, "l0_sub")
            .mark("l0_sub_data")
            .extend([2u16, 0xffff])
            // an extension lookup wrapping a cursive subtable
            .mark("l1")
            .extend([9u16, 0x0010, 1])
            .push_with_tag(0u16, "l1_sub")
            .push(7u16) // mark filtering set
            .mark("ext")
            .extend([1u16, 3])
            .push(8u32)
            .extend([1u16, 0xeeee]);
        // the lookup list offset is relative to the start of the table
        buf.write_at("lookup_list", buf.offset_for("list") as u16);
        buf.write_offset16("lookup0", "list", "l0");
        buf.write_offset16("lookup1", "list", "l1");
        buf.write_offset16("l0_sub", "l0", "l0_sub_data");
        buf.write_offset16("l1_sub", "l1", "ext");

        let table = LayoutTable::read(buf.font_data()).unwrap();
        let lookups = table.lookup_list().unwrap();
        assert_eq!(lookups.len(), 2);

        let pair = lookups.get(0).unwrap();
        assert_eq!(pair.lookup_type(), 2);
        assert!(pair.lookup_flag().ignore_marks());
        let subtables: Vec<_> = pair.subtables(9).collect::<Result<_, _>>().unwrap();
        assert_eq!(subtables.len(), 1);
        assert_eq!(subtables[0].0, 2);
        assert_eq!(subtables[0].1.read_at::<u16>(2).unwrap(), 0xffff);

        let ext = lookups.get(1).unwrap();
        assert_eq!(ext.mark_filtering_set(), Some(7));
        let (kind, data) = ext.subtables(9).next().unwrap().unwrap();
        assert_eq!(kind, 3);
        assert_eq!(data.read_at::<u16>(2).unwrap(), 0xeeee);
        assert!(lookups.get(2).is_err());
    }
}
