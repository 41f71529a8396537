//! impl subset() for glyf and loca
//!
//! Glyph records are copied into owned buffers ([`GlyphBytes`]) before they
//! are modified; the source font is never written to.

use fnv::FnvHashMap;
use font_types::{FixedSize, GlyphId, Tag};
use read_fonts::{
    tables::{
        glyf::{
            round_to_i16, Anchor, CompositeGlyph, CompositeGlyphFlags, CompositeGlyphRecord,
            ContourPoint, Glyph, SimpleGlyph, SimpleGlyphFlags, GLYPH_HEADER_LEN,
            PHANTOM_POINT_COUNT,
        },
        loca::Loca,
    },
    FontData, FontRead,
};

use crate::{
    serialize::Serializer,
    Plan,
    SubsetError::{self, SubsetTableError},
    SubsetFlags,
};

pub const GLYF: Tag = Tag::new(b"glyf");
pub const LOCA: Tag = Tag::new(b"loca");

/// A `glyf` table paired with the `loca` table that indexes it.
#[derive(Clone, Debug)]
pub struct GlyfLoca<'a> {
    glyf: FontData<'a>,
    loca: Loca<'a>,
}

impl<'a> GlyfLoca<'a> {
    pub fn new(glyf: FontData<'a>, loca: Loca<'a>) -> Self {
        GlyfLoca { glyf, loca }
    }

    pub fn num_glyphs(&self) -> usize {
        self.loca.len()
    }

    pub fn glyph(&self, gid: GlyphId) -> Result<Glyph<'a>, SubsetError> {
        self.loca
            .get_glyf(gid, self.glyf)
            .map_err(SubsetError::ReadError)
    }
}

/// An owned copy of a single glyph record that can be edited in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphBytes {
    data: Vec<u8>,
}

impl GlyphBytes {
    pub fn new(data: Vec<u8>) -> Self {
        GlyphBytes { data }
    }

    /// Copy `glyph`, dropping any padding after the record.
    pub fn from_glyph(glyph: &Glyph) -> Result<Self, SubsetError> {
        let data = match glyph {
            Glyph::Empty => Vec::new(),
            Glyph::Simple(simple) => {
                let len = simple.trimmed_len().map_err(SubsetError::ReadError)?;
                simple.as_bytes()[..len].to_vec()
            }
            Glyph::Composite(composite) => {
                let mut len = GLYPH_HEADER_LEN + composite.components_len();
                if let Some(instructions) = composite.instructions() {
                    len += u16::RAW_BYTE_LEN + instructions.len();
                }
                composite.as_bytes()[..len].to_vec()
            }
        };
        Ok(GlyphBytes { data })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Parse the current contents.
    pub fn glyph(&self) -> Result<Glyph<'_>, SubsetError> {
        Glyph::read(FontData::new(&self.data)).map_err(SubsetError::ReadError)
    }

    /// Mark the outline as containing overlapping contours or components.
    ///
    /// Simple glyphs carry the bit on their first point flag, composites on
    /// their first component.
    pub fn set_overlaps_flag(&mut self) -> Result<(), SubsetError> {
        let (pos, is_simple) = match self.glyph()? {
            Glyph::Empty => return Ok(()),
            Glyph::Simple(simple) => (simple.point_data_offset(), true),
            Glyph::Composite(_) => (GLYPH_HEADER_LEN, false),
        };
        if is_simple {
            let flag = self
                .data
                .get_mut(pos)
                .ok_or(SubsetError::InvalidContourData)?;
            *flag |= SimpleGlyphFlags::OVERLAP_SIMPLE.bits();
        } else {
            let raw = u16::from_be_bytes([self.data[pos], self.data[pos + 1]]);
            let flags = CompositeGlyphFlags::from_bits(raw)
                .union(CompositeGlyphFlags::OVERLAP_COMPOUND);
            self.data[pos..pos + 2].copy_from_slice(&flags.bits().to_be_bytes());
        }
        Ok(())
    }

    /// Remove hinting instructions.
    pub fn drop_hints(&mut self) -> Result<(), SubsetError> {
        match self.glyph()? {
            Glyph::Empty => {}
            Glyph::Simple(simple) => {
                let len_pos = simple.instruction_len_offset();
                let start = len_pos + u16::RAW_BYTE_LEN;
                let end = start + simple.instructions().len();
                self.data[len_pos..start].copy_from_slice(&0u16.to_be_bytes());
                self.data.drain(start..end);
            }
            Glyph::Composite(composite) => {
                let mut pos = GLYPH_HEADER_LEN;
                let mut last = None;
                for record in composite.components() {
                    last = Some((pos, record.flags()));
                    pos += record.size();
                }
                if let Some((last_pos, flags)) = last {
                    let flags = flags.difference(CompositeGlyphFlags::WE_HAVE_INSTRUCTIONS);
                    self.data[last_pos..last_pos + 2]
                        .copy_from_slice(&flags.bits().to_be_bytes());
                }
                self.data.truncate(pos);
            }
        }
        Ok(())
    }

    /// Rewrite component glyph ids through `glyph_map`.
    ///
    /// Fails if a component was not retained.
    pub fn remap_components(
        &mut self,
        glyph_map: &FnvHashMap<GlyphId, GlyphId>,
    ) -> Result<(), SubsetError> {
        let Glyph::Composite(composite) = self.glyph()? else {
            return Ok(());
        };
        let mut updates = Vec::new();
        let mut pos = GLYPH_HEADER_LEN;
        for record in composite.components() {
            let new_gid = glyph_map
                .get(&record.glyph_id())
                .ok_or(SubsetTableError(GLYF))?;
            updates.push((pos, record.flags(), *new_gid));
            pos += record.size();
        }
        for (pos, flags, new_gid) in updates {
            let raw = new_gid.to_u32();
            if flags.contains(CompositeGlyphFlags::GID_IS_24BIT) {
                self.data[pos + 2..pos + 5].copy_from_slice(&raw.to_be_bytes()[1..]);
            } else {
                let raw = u16::try_from(raw).map_err(|_| SubsetTableError(GLYF))?;
                self.data[pos + 2..pos + 4].copy_from_slice(&raw.to_be_bytes());
            }
        }
        Ok(())
    }

    /// Re-encode this glyph with new point positions.
    ///
    /// `all_points` holds the outline points (for a simple glyph) or one
    /// translation per component (for a composite), followed by the four
    /// phantom points.
    pub fn compile_with_deltas(
        &self,
        all_points: &[ContourPoint],
        no_hinting: bool,
    ) -> Result<GlyphBytes, SubsetError> {
        let data = match self.glyph()? {
            Glyph::Empty => Vec::new(),
            Glyph::Simple(simple) => compile_bytes_with_deltas(&simple, all_points, no_hinting)?,
            Glyph::Composite(composite) => {
                compile_composite_with_deltas(&composite, all_points, no_hinting)?
            }
        };
        Ok(GlyphBytes { data })
    }

    /// The points [`compile_with_deltas`](Self::compile_with_deltas) expects
    /// for an unmodified outline.
    ///
    /// Simple glyphs yield their decoded outline, composites one point per
    /// component holding its offset (zero for anchored components). Four
    /// zeroed phantom points follow.
    pub fn outline_points(&self) -> Result<Vec<ContourPoint>, SubsetError> {
        let mut points = Vec::new();
        match self.glyph()? {
            Glyph::Empty => return Ok(points),
            Glyph::Simple(simple) => simple
                .contour_points(&mut points)
                .map_err(SubsetError::ReadError)?,
            Glyph::Composite(composite) => {
                points.extend(composite.components().map(|record| match record.anchor() {
                    Anchor::Offset { x, y } => ContourPoint::new(x as f32, y as f32),
                    Anchor::Point { .. } => ContourPoint::default(),
                }))
            }
        }
        points.extend([ContourPoint::default(); PHANTOM_POINT_COUNT]);
        Ok(points)
    }

    /// Decode and re-encode the outline without moving any point.
    ///
    /// This packs flags and coordinates minimally and recomputes the bounding
    /// box of simple glyphs.
    pub fn reencode(&self, no_hinting: bool) -> Result<GlyphBytes, SubsetError> {
        let points = self.outline_points()?;
        self.compile_with_deltas(&points, no_hinting)
    }
}

/// Append one coordinate delta, updating `flag` to describe its encoding.
fn encode_coord(
    mut value: i32,
    flag: &mut u8,
    short_flag: SimpleGlyphFlags,
    same_flag: SimpleGlyphFlags,
    coords: &mut Vec<u8>,
) {
    if value == 0 {
        *flag |= same_flag.bits();
    } else if (-255..=255).contains(&value) {
        *flag |= short_flag.bits();
        if value > 0 {
            *flag |= same_flag.bits();
        } else {
            value = -value;
        }
        coords.push(value as u8);
    } else {
        // deltas between two i16 coordinates can exceed i16; the decoder adds
        // with wrapping, so the truncated delta still lands on the right value
        coords.extend_from_slice(&(value as i16).to_be_bytes());
    }
}

/// Append a point flag, folding runs of identical flags into repeats.
fn encode_flag(flag: u8, repeat: &mut u8, last_flag: &mut u8, flags: &mut Vec<u8>) {
    if flag == *last_flag && *repeat != 255 {
        *repeat += 1;
        if *repeat == 1 {
            // a pair is cheaper written out twice than as flag + count
            flags.push(flag);
        } else {
            let len = flags.len();
            flags[len - 2] = flag | SimpleGlyphFlags::REPEAT_FLAG.bits();
            flags[len - 1] = *repeat;
        }
    } else {
        *repeat = 0;
        flags.push(flag);
    }
    *last_flag = flag;
}

/// Encode a simple glyph with the point positions in `all_points`.
///
/// The last four entries of `all_points` are phantom points and are not
/// written. Coordinates are rounded; the bounding box in the header is
/// recomputed from the rounded points.
pub fn compile_bytes_with_deltas(
    glyph: &SimpleGlyph,
    all_points: &[ContourPoint],
    no_hinting: bool,
) -> Result<Vec<u8>, SubsetError> {
    if glyph.header().number_of_contours == 0 {
        return Ok(Vec::new());
    }
    let num_points = all_points
        .len()
        .checked_sub(PHANTOM_POINT_COUNT)
        .ok_or(SubsetError::InvalidContourData)?;
    if num_points != glyph.num_points() {
        return Err(SubsetError::InvalidContourData);
    }
    let points = &all_points[..num_points];

    let mut flags = Vec::with_capacity(num_points);
    let mut x_coords = Vec::with_capacity(num_points * 2);
    let mut y_coords = Vec::with_capacity(num_points * 2);
    let keep_mask = (SimpleGlyphFlags::ON_CURVE_POINT
        | SimpleGlyphFlags::OVERLAP_SIMPLE
        | SimpleGlyphFlags::CUBIC)
        .bits();
    let (mut last_x, mut last_y) = (0i32, 0i32);
    let mut repeat = 0u8;
    let mut last_flag = 255u8;
    for point in points {
        let mut flag = point.flags & keep_mask;
        let x = round_to_i16(point.x) as i32;
        let y = round_to_i16(point.y) as i32;
        encode_coord(
            x - last_x,
            &mut flag,
            SimpleGlyphFlags::X_SHORT_VECTOR,
            SimpleGlyphFlags::X_IS_SAME_OR_POSITIVE_X_SHORT_VECTOR,
            &mut x_coords,
        );
        encode_coord(
            y - last_y,
            &mut flag,
            SimpleGlyphFlags::Y_SHORT_VECTOR,
            SimpleGlyphFlags::Y_IS_SAME_OR_POSITIVE_Y_SHORT_VECTOR,
            &mut y_coords,
        );
        last_x = x;
        last_y = y;
        encode_flag(flag, &mut repeat, &mut last_flag, &mut flags);
    }

    let header = glyph.header().with_bounds_of(points);
    let instructions: &[u8] = if no_hinting {
        &[]
    } else {
        glyph.instructions()
    };
    let mut out = Vec::with_capacity(
        glyph.point_data_offset() + flags.len() + x_coords.len() + y_coords.len(),
    );
    out.extend_from_slice(&header.to_bytes());
    out.extend_from_slice(glyph.end_pts_of_contours().as_bytes());
    out.extend_from_slice(&(instructions.len() as u16).to_be_bytes());
    out.extend_from_slice(instructions);
    out.extend_from_slice(&flags);
    out.extend_from_slice(&x_coords);
    out.extend_from_slice(&y_coords);
    Ok(out)
}

/// Encode a component with its offset moved to `point`, appending it to `out`.
///
/// Byte sized offsets that no longer fit are widened to words. Returns the
/// length of the written record.
pub fn compile_with_point(
    record: &CompositeGlyphRecord,
    point: &ContourPoint,
    out: &mut Vec<u8>,
) -> usize {
    let bytes = record.as_bytes();
    let args = record.args_offset();
    let mut len = record.size();
    let new_x = round_to_i16(point.x);
    let new_y = round_to_i16(point.y);
    if record
        .flags()
        .contains(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS)
    {
        out.extend_from_slice(&bytes[..args]);
        out.extend_from_slice(&new_x.to_be_bytes());
        out.extend_from_slice(&new_y.to_be_bytes());
        out.extend_from_slice(&bytes[args + 4..]);
    } else if (-128..=127).contains(&new_x) && (-128..=127).contains(&new_y) {
        out.extend_from_slice(&bytes[..args]);
        out.push(new_x as i8 as u8);
        out.push(new_y as i8 as u8);
        out.extend_from_slice(&bytes[args + 2..]);
    } else {
        let flags = record
            .flags()
            .union(CompositeGlyphFlags::ARG_1_AND_2_ARE_WORDS);
        out.extend_from_slice(&flags.bits().to_be_bytes());
        out.extend_from_slice(&bytes[2..args]);
        out.extend_from_slice(&new_x.to_be_bytes());
        out.extend_from_slice(&new_y.to_be_bytes());
        out.extend_from_slice(&bytes[args + 2..]);
        len += 2;
    }
    len
}

/// Encode a composite glyph with each component moved to the matching
/// entry of `all_points`.
///
/// Components positioned by point matching are copied unchanged. The header
/// is kept as is: the component offsets alone do not determine the bounds.
pub fn compile_composite_with_deltas(
    glyph: &CompositeGlyph,
    all_points: &[ContourPoint],
    no_hinting: bool,
) -> Result<Vec<u8>, SubsetError> {
    if all_points.len() < PHANTOM_POINT_COUNT {
        return Err(SubsetError::InvalidContourData);
    }
    let component_points = all_points.len() - PHANTOM_POINT_COUNT;
    let source = glyph.as_bytes();
    let mut out = Vec::with_capacity(source.len() + glyph.components().count() * 2);
    out.extend_from_slice(&source[..GLYPH_HEADER_LEN]);
    let mut source_len = GLYPH_HEADER_LEN;
    for (i, record) in glyph.components().enumerate() {
        if i >= component_points {
            log::warn!(
                "composite glyph has more components than points ({})",
                component_points
            );
            return Err(SubsetError::InvalidContourData);
        }
        if record.is_anchored() {
            out.extend_from_slice(record.as_bytes());
        } else {
            compile_with_point(&record, &all_points[i], &mut out);
        }
        source_len += record.size();
    }
    if let Some(instructions) = glyph.instructions() {
        let end = source_len + u16::RAW_BYTE_LEN + instructions.len();
        out.extend_from_slice(&source[source_len..end]);
    }
    if no_hinting {
        let mut compiled = GlyphBytes::new(out);
        compiled.drop_hints()?;
        return Ok(compiled.into_bytes());
    }
    Ok(out)
}

/// The glyph records of a subset font, indexed by new glyph id.
#[derive(Clone, Debug, Default)]
pub struct MutableGlyphTable {
    glyphs: Vec<GlyphBytes>,
}

/// Serialized `glyf` and `loca` tables.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompiledGlyf {
    pub glyf: Vec<u8>,
    pub loca: Vec<u8>,
    /// The value for `head.indexToLocFormat`.
    pub loca_format: u8,
}

impl MutableGlyphTable {
    /// Copy the retained glyphs of `source`, applying the plan's flags.
    pub fn subset(source: &GlyfLoca, plan: &Plan) -> Result<Self, SubsetError> {
        let mut glyphs = vec![GlyphBytes::default(); plan.num_output_glyphs()];
        let drop_notdef_outline = !plan
            .subset_flags()
            .contains(SubsetFlags::SUBSET_FLAGS_NOTDEF_OUTLINE)
            && plan.normalized_coords().is_empty();
        for &(new_gid, old_gid) in plan.new_to_old_gid_list() {
            if new_gid == GlyphId::NOTDEF && drop_notdef_outline {
                continue;
            }
            let glyph = source.glyph(old_gid).map_err(|e| {
                log::warn!("can't read {old_gid}: {e}");
                SubsetTableError(GLYF)
            })?;
            let mut bytes = GlyphBytes::from_glyph(&glyph)?;
            bytes.remap_components(plan.glyph_map())?;
            if plan
                .subset_flags()
                .contains(SubsetFlags::SUBSET_FLAGS_NO_HINTING)
            {
                bytes.drop_hints()?;
            }
            if plan
                .subset_flags()
                .contains(SubsetFlags::SUBSET_FLAGS_SET_OVERLAPS_FLAG)
            {
                bytes.set_overlaps_flag()?;
            }
            let slot = glyphs
                .get_mut(new_gid.to_u32() as usize)
                .ok_or(SubsetTableError(GLYF))?;
            *slot = bytes;
        }
        log::debug!("subset glyf keeps {} glyph records", glyphs.len());
        Ok(MutableGlyphTable { glyphs })
    }

    pub fn from_glyphs(glyphs: Vec<GlyphBytes>) -> Self {
        MutableGlyphTable { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn get(&self, gid: GlyphId) -> Option<&GlyphBytes> {
        self.glyphs.get(gid.to_u32() as usize)
    }

    pub fn get_mut(&mut self, gid: GlyphId) -> Option<&mut GlyphBytes> {
        self.glyphs.get_mut(gid.to_u32() as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = &GlyphBytes> + '_ {
        self.glyphs.iter()
    }

    /// Re-encode every glyph in place; see [`GlyphBytes::reencode`].
    pub fn reencode(&mut self, no_hinting: bool) -> Result<(), SubsetError> {
        for glyph in self.glyphs.iter_mut() {
            *glyph = glyph.reencode(no_hinting)?;
        }
        Ok(())
    }

    /// Write the glyph records and their offsets.
    ///
    /// Short offsets are used when they can address the table, unless
    /// `SUBSET_FLAGS_FORCE_LONG_LOCA` is set.
    pub fn compile(&self, flags: SubsetFlags) -> Result<CompiledGlyf, SubsetError> {
        let max_offset: usize = self.glyphs.iter().map(|g| padded_size(g.len())).sum();
        let loca_format: u8 = if max_offset < 0x1FFFF
            && !flags.contains(SubsetFlags::SUBSET_FLAGS_FORCE_LONG_LOCA)
        {
            0
        } else {
            1
        };
        let mut s = Serializer::new();
        let mut loca = Vec::with_capacity((self.glyphs.len() + 1) * (2 + 2 * loca_format as usize));
        let mut offset = 0usize;
        write_loca_entry(&mut loca, loca_format, offset)?;
        for glyph in &self.glyphs {
            s.embed_bytes(glyph.as_bytes())
                .map_err(|_| SubsetTableError(GLYF))?;
            offset += glyph.len();
            if loca_format == 0 && glyph.len() % 2 == 1 {
                s.embed_bytes(&[0]).map_err(|_| SubsetTableError(GLYF))?;
                offset += 1;
            }
            write_loca_entry(&mut loca, loca_format, offset)?;
        }
        // A table of only empty glyphs still gets one byte, so it is not
        // rejected as missing.
        if s.length() == 0 {
            s.embed_bytes(&[0]).map_err(|_| SubsetTableError(GLYF))?;
        }
        Ok(CompiledGlyf {
            glyf: s.copy_bytes().map_err(|_| SubsetTableError(GLYF))?,
            loca,
            loca_format,
        })
    }
}

fn padded_size(len: usize) -> usize {
    len + len % 2
}

fn write_loca_entry(
    loca: &mut Vec<u8>,
    loca_format: u8,
    offset: usize,
) -> Result<(), SubsetError> {
    if loca_format == 0 {
        let value = u16::try_from(offset >> 1).map_err(|_| SubsetTableError(LOCA))?;
        loca.extend_from_slice(&value.to_be_bytes());
    } else {
        let value = u32::try_from(offset).map_err(|_| SubsetTableError(LOCA))?;
        loca.extend_from_slice(&value.to_be_bytes());
    }
    Ok(())
}
