//! The [glyf (Glyph Data)](https://docs.microsoft.com/en-us/typography/opentype/spec/glyf) table
//!
//! This module decodes individual glyph records. Locating a record inside the
//! table (via `loca`) is left to the caller.

use types::{F2Dot14, GlyphId, Point};

use crate::font_data::{FontData, ScalarArray};
use crate::read::{FontRead, ReadError};

/// The size of the header shared by simple and composite glyphs.
pub const GLYPH_HEADER_LEN: usize = 10;

/// The number of synthetic metrics points appended to a glyph's outline.
pub const PHANTOM_POINT_COUNT: usize = 4;

/// Flags for a point in a simple glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SimpleGlyphFlags(u8);

impl SimpleGlyphFlags {
    pub const ON_CURVE_POINT: Self = Self(0x01);
    pub const X_SHORT_VECTOR: Self = Self(0x02);
    pub const Y_SHORT_VECTOR: Self = Self(0x04);
    pub const REPEAT_FLAG: Self = Self(0x08);
    pub const X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR: Self = Self(0x10);
    pub const Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR: Self = Self(0x20);
    pub const OVERLAP_SIMPLE: Self = Self(0x40);
    pub const CUBIC: Self = Self(0x80);

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for SimpleGlyphFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Flags for a component of a composite glyph.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CompositeGlyphFlags(u16);

impl CompositeGlyphFlags {
    pub const ARG_1_AND_2_ARE_WORDS: Self = Self(0x0001);
    pub const ARGS_ARE_XY_VALUES: Self = Self(0x0002);
    pub const ROUND_XY_TO_GRID: Self = Self(0x0004);
    pub const WE_HAVE_A_SCALE: Self = Self(0x0008);
    pub const MORE_COMPONENTS: Self = Self(0x0020);
    pub const WE_HAVE_AN_X_AND_Y_SCALE: Self = Self(0x0040);
    pub const WE_HAVE_A_TWO_BY_TWO: Self = Self(0x0080);
    pub const WE_HAVE_INSTRUCTIONS: Self = Self(0x0100);
    pub const USE_MY_METRICS: Self = Self(0x0200);
    pub const OVERLAP_COMPOUND: Self = Self(0x0400);
    pub const SCALED_COMPONENT_OFFSET: Self = Self(0x0800);
    pub const UNSCALED_COMPONENT_OFFSET: Self = Self(0x1000);
    pub const GID_IS_24BIT: Self = Self(0x2000);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }
}

/// A point in a decoded outline.
///
/// Coordinates are floats so that variation deltas can be applied in place
/// before the outline is re-encoded.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ContourPoint {
    pub x: f32,
    pub y: f32,
    /// The raw point flags; see [`SimpleGlyphFlags`].
    pub flags: u8,
    pub is_end_point: bool,
}

impl ContourPoint {
    pub fn new(x: f32, y: f32) -> Self {
        ContourPoint {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn is_on_curve(&self) -> bool {
        SimpleGlyphFlags(self.flags).contains(SimpleGlyphFlags::ON_CURVE_POINT)
    }

    pub fn translate(&mut self, delta: Point<f32>) {
        self.x += delta.x;
        self.y += delta.y;
    }
}

/// The header common to simple and composite glyphs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GlyphHeader {
    /// Negative for composite glyphs.
    pub number_of_contours: i16,
    pub x_min: i16,
    pub y_min: i16,
    pub x_max: i16,
    pub y_max: i16,
}

impl<'a> FontRead<'a> for GlyphHeader {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let mut cursor = data.cursor();
        Ok(GlyphHeader {
            number_of_contours: cursor.read()?,
            x_min: cursor.read()?,
            y_min: cursor.read()?,
            x_max: cursor.read()?,
            y_max: cursor.read()?,
        })
    }
}

impl GlyphHeader {
    /// The header as it appears on disk.
    pub fn to_bytes(&self) -> [u8; GLYPH_HEADER_LEN] {
        let mut out = [0u8; GLYPH_HEADER_LEN];
        let fields = [
            self.number_of_contours,
            self.x_min,
            self.y_min,
            self.x_max,
            self.y_max,
        ];
        for (chunk, field) in out.chunks_exact_mut(2).zip(fields) {
            chunk.copy_from_slice(&field.to_be_bytes());
        }
        out
    }

    /// The header with the bounding box of `points`, rounded to integers.
    ///
    /// An empty point list yields an all-zero box.
    pub fn with_bounds_of(self, points: &[ContourPoint]) -> Self {
        let mut bounds: Option<[f32; 4]> = None;
        for point in points {
            let b = bounds.get_or_insert([point.x, point.y, point.x, point.y]);
            b[0] = b[0].min(point.x);
            b[1] = b[1].min(point.y);
            b[2] = b[2].max(point.x);
            b[3] = b[3].max(point.y);
        }
        let [x_min, y_min, x_max, y_max] = bounds.unwrap_or_default().map(round_to_i16);
        GlyphHeader {
            x_min,
            y_min,
            x_max,
            y_max,
            ..self
        }
    }
}

/// Round half away from zero and saturate, as font compilers do.
pub fn round_to_i16(value: f32) -> i16 {
    value.round().clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// A single glyph record.
#[derive(Clone, Debug)]
pub enum Glyph<'a> {
    /// A glyph with no outline (such as a space).
    Empty,
    Simple(SimpleGlyph<'a>),
    Composite(CompositeGlyph<'a>),
}

impl<'a> FontRead<'a> for Glyph<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        if data.is_empty() {
            return Ok(Glyph::Empty);
        }
        let header = GlyphHeader::read(data)?;
        match header.number_of_contours {
            0 => Ok(Glyph::Empty),
            n if n > 0 => SimpleGlyph::read(data).map(Glyph::Simple),
            // any negative count marks a composite, not only -1
            _ => CompositeGlyph::read(data).map(Glyph::Composite),
        }
    }
}

impl<'a> Glyph<'a> {
    pub fn header(&self) -> Option<&GlyphHeader> {
        match self {
            Glyph::Empty => None,
            Glyph::Simple(glyph) => Some(&glyph.header),
            Glyph::Composite(glyph) => Some(&glyph.header),
        }
    }

    /// The raw bytes of the record.
    pub fn as_bytes(&self) -> &'a [u8] {
        match self {
            Glyph::Empty => &[],
            Glyph::Simple(glyph) => glyph.data.as_bytes(),
            Glyph::Composite(glyph) => glyph.data.as_bytes(),
        }
    }
}

/// A glyph defined by its own contours.
#[derive(Clone, Debug)]
pub struct SimpleGlyph<'a> {
    data: FontData<'a>,
    header: GlyphHeader,
    end_pts_of_contours: ScalarArray<'a, u16>,
    instructions: &'a [u8],
}

impl<'a> FontRead<'a> for SimpleGlyph<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let header = GlyphHeader::read(data)?;
        if header.number_of_contours <= 0 {
            return Err(ReadError::InvalidFormat(header.number_of_contours as i64));
        }
        let mut cursor = data.cursor();
        cursor.advance_by(GLYPH_HEADER_LEN);
        let end_pts_of_contours = cursor.read_array(header.number_of_contours as usize)?;
        let instruction_len: u16 = cursor.read()?;
        let instructions = cursor.read_bytes(instruction_len as usize)?;
        Ok(SimpleGlyph {
            data,
            header,
            end_pts_of_contours,
            instructions,
        })
    }
}

impl<'a> SimpleGlyph<'a> {
    pub fn header(&self) -> &GlyphHeader {
        &self.header
    }

    pub fn end_pts_of_contours(&self) -> ScalarArray<'a, u16> {
        self.end_pts_of_contours
    }

    pub fn instructions(&self) -> &'a [u8] {
        self.instructions
    }

    /// The offset of the instruction length field within the record.
    pub fn instruction_len_offset(&self) -> usize {
        GLYPH_HEADER_LEN + self.end_pts_of_contours.len() * 2
    }

    /// The offset of the first point flag within the record.
    pub fn point_data_offset(&self) -> usize {
        self.instruction_len_offset() + 2 + self.instructions.len()
    }

    /// The bytes after the instructions: flags, then x and y coordinates,
    /// then any padding.
    pub fn point_data(&self) -> &'a [u8] {
        self.data
            .as_bytes()
            .get(self.point_data_offset()..)
            .unwrap_or_default()
    }

    /// Returns the total number of points.
    pub fn num_points(&self) -> usize {
        self.end_pts_of_contours
            .last()
            .map(|last| last as usize + 1)
            .unwrap_or(0)
    }

    /// Returns `true` if the first point carries the overlap flag.
    pub fn has_overlapping_contours(&self) -> bool {
        self.point_data()
            .first()
            .is_some_and(|flag| SimpleGlyphFlags(*flag).contains(SimpleGlyphFlags::OVERLAP_SIMPLE))
    }

    /// Decode the outline, appending one point per outline point to `points`.
    ///
    /// Coordinates are absolute. On error `points` is left at its original
    /// length, so a caller never sees a partially decoded outline.
    pub fn contour_points(&self, points: &mut Vec<ContourPoint>) -> Result<(), ReadError> {
        let start = points.len();
        let result = self.decode_into(points, start);
        if result.is_err() {
            points.truncate(start);
        }
        result
    }

    fn decode_into(&self, points: &mut Vec<ContourPoint>, start: usize) -> Result<(), ReadError> {
        let num_points = self.num_points();
        let data = self.point_data();
        // every point needs at least one flag byte; this bounds the allocation
        // by the real data size rather than the declared count
        if data.len() < num_points.div_ceil(256) {
            return Err(ReadError::OutOfBounds);
        }
        points.resize(start + num_points, ContourPoint::default());
        let points = &mut points[start..];
        for end in self.end_pts_of_contours.iter() {
            let point = points
                .get_mut(end as usize)
                .ok_or(ReadError::MalformedData("contour end out of range"))?;
            point.is_end_point = true;
        }

        let mut pos = read_flags(data, points)?;
        pos = read_coords(data, pos, points, Axis::X)?;
        read_coords(data, pos, points, Axis::Y)?;
        Ok(())
    }

    /// The length of the point data, excluding any trailing padding.
    pub fn point_data_len(&self) -> Result<usize, ReadError> {
        let num_points = self.num_points();
        let data = self.point_data();
        let mut pos = 0;
        let mut seen = 0;
        let mut coord_len = 0usize;
        while seen < num_points {
            let flag = SimpleGlyphFlags(*data.get(pos).ok_or(ReadError::OutOfBounds)?);
            pos += 1;
            let repeat = if flag.contains(SimpleGlyphFlags::REPEAT_FLAG) {
                let count = *data.get(pos).ok_or(ReadError::OutOfBounds)? as usize;
                pos += 1;
                count
            } else {
                0
            };
            let count = (repeat + 1).min(num_points - seen);
            coord_len += count * (coord_size(flag, Axis::X) + coord_size(flag, Axis::Y));
            seen += count;
        }
        let len = pos + coord_len;
        if len > data.len() {
            return Err(ReadError::OutOfBounds);
        }
        Ok(len)
    }

    /// The length of the record without trailing padding.
    pub fn trimmed_len(&self) -> Result<usize, ReadError> {
        Ok(self.point_data_offset() + self.point_data_len()?)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.as_bytes()
    }
}

#[derive(Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn flags(self) -> (SimpleGlyphFlags, SimpleGlyphFlags) {
        match self {
            Axis::X => (
                SimpleGlyphFlags::X_SHORT_VECTOR,
                SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
            ),
            Axis::Y => (
                SimpleGlyphFlags::Y_SHORT_VECTOR,
                SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
            ),
        }
    }
}

fn coord_size(flag: SimpleGlyphFlags, axis: Axis) -> usize {
    let (short, same) = axis.flags();
    match (flag.contains(short), flag.contains(same)) {
        (true, _) => 1,
        (false, true) => 0,
        (false, false) => 2,
    }
}

// returns the number of flag bytes consumed
fn read_flags(data: &[u8], points: &mut [ContourPoint]) -> Result<usize, ReadError> {
    let mut pos = 0;
    let mut i = 0;
    while i < points.len() {
        let flag = *data.get(pos).ok_or(ReadError::OutOfBounds)?;
        pos += 1;
        points[i].flags = flag;
        i += 1;
        if SimpleGlyphFlags(flag).contains(SimpleGlyphFlags::REPEAT_FLAG) {
            let repeat = *data.get(pos).ok_or(ReadError::OutOfBounds)? as usize;
            pos += 1;
            let stop = (i + repeat).min(points.len());
            for point in &mut points[i..stop] {
                point.flags = flag;
            }
            i = stop;
        }
    }
    Ok(pos)
}

fn read_coords(
    data: &[u8],
    mut pos: usize,
    points: &mut [ContourPoint],
    axis: Axis,
) -> Result<usize, ReadError> {
    let (short, same) = axis.flags();
    // coordinates are i16; accumulation wraps the same way the encoder truncates
    let mut value = 0i16;
    for point in points.iter_mut() {
        let flag = SimpleGlyphFlags(point.flags);
        if flag.contains(short) {
            let delta = *data.get(pos).ok_or(ReadError::OutOfBounds)? as i16;
            pos += 1;
            if flag.contains(same) {
                value = value.wrapping_add(delta);
            } else {
                value = value.wrapping_sub(delta);
            }
        } else if !flag.contains(same) {
            let bytes = data.get(pos..pos + 2).ok_or(ReadError::OutOfBounds)?;
            value = value.wrapping_add(i16::from_be_bytes([bytes[0], bytes[1]]));
            pos += 2;
        }
        match axis {
            Axis::X => point.x = value as f32,
            Axis::Y => point.y = value as f32,
        }
    }
    Ok(pos)
}

/// A glyph assembled from transformed references to other glyphs.
#[derive(Clone, Debug)]
pub struct CompositeGlyph<'a> {
    data: FontData<'a>,
    header: GlyphHeader,
}

impl<'a> FontRead<'a> for CompositeGlyph<'a> {
    fn read(data: FontData<'a>) -> Result<Self, ReadError> {
        let header = GlyphHeader::read(data)?;
        if header.number_of_contours >= 0 {
            return Err(ReadError::InvalidFormat(header.number_of_contours as i64));
        }
        let glyph = CompositeGlyph { data, header };
        // a composite needs at least one complete component
        if glyph.components().next().is_none() {
            return Err(ReadError::OutOfBounds);
        }
        Ok(glyph)
    }
}

impl<'a> CompositeGlyph<'a> {
    pub fn header(&self) -> &GlyphHeader {
        &self.header
    }

    /// The bytes following the header: component records, then optional
    /// instructions.
    pub fn component_data(&self) -> &'a [u8] {
        self.data
            .as_bytes()
            .get(GLYPH_HEADER_LEN..)
            .unwrap_or_default()
    }

    /// Returns an iterator over the component records.
    ///
    /// Iteration stops at the first record without the more-components flag
    /// or at the first record that would overrun the data.
    pub fn components(&self) -> ComponentIter<'a> {
        ComponentIter {
            data: self.component_data(),
            pos: 0,
            done: false,
        }
    }

    /// The total length of the component records.
    pub fn components_len(&self) -> usize {
        self.components().map(|record| record.size()).sum()
    }

    /// Returns the hinting instructions, if the last component declares any.
    pub fn instructions(&self) -> Option<&'a [u8]> {
        let mut last = None;
        let mut len = 0;
        for record in self.components() {
            len += record.size();
            last = Some(record);
        }
        if !last?
            .flags()
            .contains(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS)
        {
            return None;
        }
        let data = FontData::new(self.component_data());
        let instruction_len: u16 = data.read_at(len).ok()?;
        data.as_bytes()
            .get(len + 2..len + 2 + instruction_len as usize)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data.as_bytes()
    }
}

/// Iterator over the records of a [`CompositeGlyph`].
#[derive(Clone, Debug)]
pub struct ComponentIter<'a> {
    data: &'a [u8],
    pos: usize,
    done: bool,
}

impl<'a> Iterator for ComponentIter<'a> {
    type Item = CompositeGlyphRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let record = self
            .data
            .get(self.pos..)
            .and_then(CompositeGlyphRecord::from_bytes);
        match record {
            Some(record) => {
                self.pos += record.size();
                self.done = !record.flags().contains(CompositeGlyphFlags::MORE_COMPONENTS);
                Some(record)
            }
            None => {
                self.done = true;
                None
            }
        }
    }
}

/// Where a component is placed relative to its parent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Anchor {
    /// The component is offset by the given amount.
    Offset { x: i16, y: i16 },
    /// A point of the component is aligned with a point of the parent.
    Point { base: u16, component: u16 },
}

/// The 2x2 matrix and translation of a component.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transformation {
    /// `[xx, yx, xy, yy]`
    pub matrix: [f32; 4],
    pub translation: Point<f32>,
}

impl Default for Transformation {
    fn default() -> Self {
        Transformation {
            matrix: [1.0, 0.0, 0.0, 1.0],
            translation: Point::default(),
        }
    }
}

impl Transformation {
    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }

    pub fn has_matrix(&self) -> bool {
        self.matrix != [1.0, 0.0, 0.0, 1.0]
    }

    /// Apply the matrix, then the translation.
    pub fn apply(&self, point: &mut ContourPoint) {
        let [xx, yx, xy, yy] = self.matrix;
        let (x, y) = (point.x, point.y);
        point.x = xx * x + xy * y + self.translation.x;
        point.y = yx * x + yy * y + self.translation.y;
    }
}

/// A single component of a composite glyph.
///
/// The record's size depends on three independent flags: the width of the
/// glyph id, the width of the arguments, and the number of scale values.
#[derive(Clone, Copy, Debug)]
pub struct CompositeGlyphRecord<'a> {
    data: &'a [u8],
    flags: CompositeGlyphFlags,
}

impl<'a> CompositeGlyphRecord<'a> {
    const MIN_SIZE: usize = 4;

    /// Read a record from the start of `data`, which may be longer.
    pub fn from_bytes(data: &'a [u8]) -> Option<Self> {
        let flags = CompositeGlyphFlags(u16::from_be_bytes([*data.first()?, *data.get(1)?]));
        let size = Self::size_for_flags(flags);
        Some(CompositeGlyphRecord {
            data: data.get(..size)?,
            flags,
        })
    }

    /// The size in bytes of a record with the given flags.
    pub fn size_for_flags(flags: CompositeGlyphFlags) -> usize {
        let mut size = Self::MIN_SIZE;
        if flags.contains(CompositeGlyphFlags::GID_IS_24BIT) {
            size += 1;
        }
        size += if flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
            4
        } else {
            2
        };
        if flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            size += 2;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE) {
            size += 4;
        } else if flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            size += 8;
        }
        size
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    pub fn flags(&self) -> CompositeGlyphFlags {
        self.flags
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.data
    }

    /// The offset of the first argument within the record.
    pub fn args_offset(&self) -> usize {
        if self.flags.contains(CompositeGlyphFlags::GID_IS_24BIT) {
            5
        } else {
            4
        }
    }

    fn scales_offset(&self) -> usize {
        self.args_offset()
            + if self.flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS) {
                4
            } else {
                2
            }
    }

    pub fn glyph_id(&self) -> GlyphId {
        let d = self.data;
        // size was checked on construction
        if self.flags.contains(CompositeGlyphFlags::GID_IS_24BIT) {
            GlyphId::new(u32::from_be_bytes([0, d[2], d[3], d[4]]))
        } else {
            GlyphId::new(u16::from_be_bytes([d[2], d[3]]) as u32)
        }
    }

    /// Returns `true` if the component is positioned by matching points
    /// rather than by an offset.
    pub fn is_anchored(&self) -> bool {
        !self.flags.contains(CompositeGlyphFlags::ARGS_ARE_XY_VALUES)
    }

    pub fn anchor(&self) -> Anchor {
        let d = &self.data[self.args_offset()..];
        let words = self.flags.contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS);
        match (self.is_anchored(), words) {
            (true, true) => Anchor::Point {
                base: u16::from_be_bytes([d[0], d[1]]),
                component: u16::from_be_bytes([d[2], d[3]]),
            },
            (true, false) => Anchor::Point {
                base: d[0] as u16,
                component: d[1] as u16,
            },
            (false, true) => Anchor::Offset {
                x: i16::from_be_bytes([d[0], d[1]]),
                y: i16::from_be_bytes([d[2], d[3]]),
            },
            (false, false) => Anchor::Offset {
                x: d[0] as i8 as i16,
                y: d[1] as i8 as i16,
            },
        }
    }

    /// Decode the component transform.
    ///
    /// Anchored components get a zero translation: their position comes from
    /// the matched points instead.
    pub fn transformation(&self) -> Transformation {
        let mut transform = Transformation::default();
        if let Anchor::Offset { x, y } = self.anchor() {
            transform.translation = Point::new(x as f32, y as f32);
        }
        let scales = &self.data[self.scales_offset()..];
        let scale = |idx: usize| {
            F2Dot14::from_bits(i16::from_be_bytes([scales[idx * 2], scales[idx * 2 + 1]]))
                .to_f32()
        };
        if self.flags.contains(CompositeGlyphFlags::WE_HAVE_A_SCALE) {
            let s = scale(0);
            transform.matrix = [s, 0.0, 0.0, s];
        } else if self
            .flags
            .contains(CompositeGlyphFlags::WE_HAVE_AN_X_AND_Y_SCALE)
        {
            transform.matrix = [scale(0), 0.0, 0.0, scale(1)];
        } else if self.flags.contains(CompositeGlyphFlags::WE_HAVE_A_TWO_BY_TWO) {
            transform.matrix = [scale(0), scale(1), scale(2), scale(3)];
        }
        transform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::test_helpers::BeBuffer;

    // a right triangle: (0,0) (100,0) (0,-300), one contour, two instruction bytes
    pub(crate) fn triangle() -> BeBuffer {
        BeBuffer::new()
            .extend([1i16, 0, -300, 100, 0]) // header
            .push(2u16) // end point
            .push(2u16) // instruction length
            .extend([0xb0u8, 0x01]) // instructions
            // flags: on-curve with x and y same, on-curve with x short positive,
            // on-curve with x short negative and y long
            .extend([0x31u8, 0x33, 0x03])
            .push(100u8) // x of point 1
            .push(100u8) // x of point 2 (negative)
            .push(-300i16) // y of point 2
    }

    #[test]
    fn simple_glyph_points() {
        let buf = triangle();
        let glyph = SimpleGlyph::read(buf.font_data()).unwrap();
        assert_eq!(glyph.num_points(), 3);
        assert_eq!(glyph.instructions(), &[0xb0, 0x01]);
        let mut points = Vec::new();
        glyph.contour_points(&mut points).unwrap();
        let coords: Vec<_> = points.iter().map(|p| (p.x, p.y)).collect();
        assert_eq!(coords, vec![(0.0, 0.0), (100.0, 0.0), (0.0, -300.0)]);
        assert!(points.iter().all(ContourPoint::is_on_curve));
        assert!(points[2].is_end_point);
        assert!(!points[1].is_end_point);
        assert_eq!(glyph.trimmed_len().unwrap(), buf.len());
        assert!(!glyph.has_overlapping_contours());
    }

    #[test]
    fn repeated_flags() {
        // four points, all on-curve with x and y same, written as one
        // repeated flag
        let buf = BeBuffer::new()
            .extend([1i16, 0, 0, 0, 0])
            .push(3u16)
            .push(0u16)
            .extend([0x39u8, 3]);
        let glyph = SimpleGlyph::read(buf.font_data()).unwrap();
        let mut points = Vec::new();
        glyph.contour_points(&mut points).unwrap();
        assert_eq!(points.len(), 4);
        assert!(points.iter().all(|p| p.flags == 0x39));
    }

    #[test]
    fn padding_is_trimmed() {
        let buf = triangle().extend([0u8, 0, 0]);
        let glyph = SimpleGlyph::read(buf.font_data()).unwrap();
        assert_eq!(glyph.trimmed_len().unwrap(), buf.len() - 3);
    }

    #[test]
    fn truncated_simple_glyph_never_panics() {
        let buf = triangle();
        for len in 0..buf.len() {
            let data = FontData::new(&buf[..len]);
            let Ok(glyph) = SimpleGlyph::read(data) else {
                continue;
            };
            let mut points = vec![ContourPoint::default()];
            assert!(glyph.contour_points(&mut points).is_err(), "len {len}");
            assert_eq!(points.len(), 1);
        }
    }

    #[test]
    fn glyph_kinds() {
        assert!(matches!(Glyph::read(FontData::new(&[])), Ok(Glyph::Empty)));
        let buf = triangle();
        assert!(matches!(Glyph::read(buf.font_data()), Ok(Glyph::Simple(_))));
        assert!(matches!(
            Glyph::read(composite().font_data()),
            Ok(Glyph::Composite(_))
        ));
    }

    #[test]
    fn any_negative_contour_count_is_composite() {
        let mut buf = composite();
        buf.write_at_offset(0, -2i16);
        let Ok(Glyph::Composite(glyph)) = Glyph::read(buf.font_data()) else {
            panic!("expected a composite glyph");
        };
        assert_eq!(glyph.components().count(), 2);
        // with no component records it is still rejected
        let bare = BeBuffer::new().extend([-2i16, 0, 0, 0, 0]);
        assert!(Glyph::read(bare.font_data()).is_err());
    }

    pub(crate) fn composite() -> BeBuffer {
        BeBuffer::new()
            .extend([-1i16, 0, 0, 0, 0])
            // byte args, xy values, more components, uniform scale
            .push(0x002au16)
            .push(5u16)
            .extend([10u8, (-20i8) as u8])
            .push(F2Dot14::from_f32(0.5))
            // word args, xy values, two by two, instructions
            .push(0x0183u16)
            .push(6u16)
            .extend([300i16, -2])
            .extend([
                F2Dot14::from_f32(1.0),
                F2Dot14::from_f32(0.25),
                F2Dot14::from_f32(-0.25),
                F2Dot14::from_f32(1.0),
            ])
            .push(1u16)
            .push(0xb0u8)
    }

    #[test]
    fn composite_records() {
        let buf = composite();
        let glyph = CompositeGlyph::read(buf.font_data()).unwrap();
        let records: Vec<_> = glyph.components().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].size(), 8);
        assert_eq!(records[1].size(), 16);
        assert_eq!(records[0].glyph_id(), GlyphId::new(5));
        assert_eq!(records[0].anchor(), Anchor::Offset { x: 10, y: -20 });
        assert_eq!(
            records[0].transformation(),
            Transformation {
                matrix: [0.5, 0.0, 0.0, 0.5],
                translation: Point::new(10.0, -20.0),
            }
        );
        let second = records[1].transformation();
        assert_eq!(second.matrix, [1.0, 0.25, -0.25, 1.0]);
        assert_eq!(second.translation, Point::new(300.0, -2.0));
        assert_eq!(glyph.components_len(), 24);
        assert_eq!(glyph.instructions(), Some([0xb0u8].as_slice()));
    }

    #[test]
    fn record_sizes() {
        use CompositeGlyphFlags as F;
        let size = |flags: CompositeGlyphFlags| CompositeGlyphRecord::size_for_flags(flags);
        assert_eq!(size(F::default()), 6);
        assert_eq!(size(F::ARG_1_AND_2_ARE_WORDS), 8);
        assert_eq!(size(F::GID_IS_24BIT), 7);
        assert_eq!(size(F::WE_HAVE_A_SCALE), 8);
        assert_eq!(size(F::WE_HAVE_AN_X_AND_Y_SCALE), 10);
        assert_eq!(size(F::WE_HAVE_A_TWO_BY_TWO), 14);
        assert_eq!(
            size(
                F::ARG_1_AND_2_ARE_WORDS
                    .union(F::GID_IS_24BIT)
                    .union(F::WE_HAVE_A_TWO_BY_TWO)
            ),
            17
        );
    }

    #[test]
    fn anchored_component_has_no_translation() {
        let buf = BeBuffer::new()
            .extend([-1i16, 0, 0, 0, 0])
            .push(0u16) // point numbers as bytes, last component
            .push(9u16)
            .extend([3u8, 4]);
        let glyph = CompositeGlyph::read(buf.font_data()).unwrap();
        let record = glyph.components().next().unwrap();
        assert!(record.is_anchored());
        assert_eq!(
            record.anchor(),
            Anchor::Point {
                base: 3,
                component: 4
            }
        );
        assert!(record.transformation().is_identity());
        assert_eq!(glyph.instructions(), None);
    }

    #[test]
    fn truncated_composite_never_panics() {
        let buf = composite();
        for len in 0..buf.len() {
            if let Ok(glyph) = CompositeGlyph::read(FontData::new(&buf[..len])) {
                for record in glyph.components() {
                    let _ = record.transformation();
                    let _ = record.glyph_id();
                }
                let _ = glyph.instructions();
            }
        }
        // shorter than one component
        assert!(CompositeGlyph::read(FontData::new(&buf[..15])).is_err());
    }
}
