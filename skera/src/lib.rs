//! Subsetting and instancing of TrueType outlines and variation axes
//!
//! A [`Plan`] is computed once from the requested glyphs, the [`SubsetFlags`]
//! and an optional [`InstancingSpec`]; the table subsetters then read the
//! source tables and write new ones. Source data is never modified.
mod fvar;
mod glyf_loca;
mod parsing_util;
pub mod serialize;

use fnv::FnvHashMap;
use font_types::{F2Dot14, GlyphId, Tag};
use read_fonts::{
    collections::U32Set,
    tables::{
        fvar::{AxisLimit, Fvar, NORMALIZED_MAX},
        glyf::Glyph,
        loca::Loca,
    },
    FontData, FontRead, ReadError,
};
use thiserror::Error;

pub use fvar::{subset_fvar, FVAR};
pub use glyf_loca::{
    compile_bytes_with_deltas, compile_composite_with_deltas, compile_with_point, CompiledGlyf,
    GlyfLoca, GlyphBytes, MutableGlyphTable, GLYF, LOCA,
};
pub use parsing_util::{
    parse_instancing_spec, parse_tag_list, populate_gids, AxisSpec, InstancingSpec,
};

const MAX_COMPOSITE_OPERATIONS_PER_GLYPH: u8 = 64;
const MAX_NESTING_LEVEL: u8 = 64;

#[derive(Clone, Copy, Debug)]
pub struct SubsetFlags(u16);

impl SubsetFlags {
    //all flags at their default value of false.
    pub const SUBSET_FLAGS_DEFAULT: Self = Self(0x0000);

    //If set hinting instructions will be dropped in the produced subset.
    //Otherwise hinting instructions will be retained.
    pub const SUBSET_FLAGS_NO_HINTING: Self = Self(0x0001);

    //If set glyph indices will not be modified in the produced subset.
    //If glyphs are dropped their indices will be retained as an empty glyph.
    pub const SUBSET_FLAGS_RETAIN_GIDS: Self = Self(0x0002);

    //If set the subsetter will set the OVERLAP_SIMPLE flag on each simple glyph.
    pub const SUBSET_FLAGS_SET_OVERLAPS_FLAG: Self = Self(0x0010);

    //If set the notdef glyph outline will be retained in the final subset.
    pub const SUBSET_FLAGS_NOTDEF_OUTLINE: Self = Self(0x0040);

    //If set force the use of long format in the 'loca' table even if the offsets would fit in the short format.
    pub const SUBSET_FLAGS_FORCE_LONG_LOCA: Self = Self(0x0800);

    /// Returns `true` if all of the flags in `other` are contained within `self`.
    #[inline]
    pub const fn contains(&self, other: Self) -> bool {
        (self.0 & other.0) == other.0
    }
}

impl Default for SubsetFlags {
    fn default() -> Self {
        Self::SUBSET_FLAGS_DEFAULT
    }
}

impl PartialEq for SubsetFlags {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl std::ops::BitOr for SubsetFlags {
    type Output = Self;

    /// Returns the union of the two sets of flags.
    #[inline]
    fn bitor(self, other: SubsetFlags) -> Self {
        Self(self.0 | other.0)
    }
}

impl From<u16> for SubsetFlags {
    fn from(value: u16) -> Self {
        Self(value)
    }
}

impl std::ops::BitOrAssign for SubsetFlags {
    /// Adds the set of flags.
    #[inline]
    fn bitor_assign(&mut self, other: Self) {
        self.0 |= other.0;
    }
}

/// The source tables a subset is computed from.
///
/// Each table is optional; subsetting only touches the tables present.
#[derive(Clone, Debug, Default)]
pub struct FontTables<'a> {
    pub glyf: Option<GlyfLoca<'a>>,
    pub fvar: Option<Fvar<'a>>,
}

impl<'a> FontTables<'a> {
    /// Parse raw table data.
    ///
    /// `glyf` and `loca` are only used when both are present.
    pub fn from_raw(
        glyf: Option<&'a [u8]>,
        loca: Option<&'a [u8]>,
        long_loca: bool,
        fvar: Option<&'a [u8]>,
    ) -> Result<Self, SubsetError> {
        let glyf = match (glyf, loca) {
            (Some(glyf), Some(loca)) => {
                let loca = Loca::read(FontData::new(loca), long_loca)
                    .map_err(SubsetError::ReadError)?;
                Some(GlyfLoca::new(FontData::new(glyf), loca))
            }
            _ => None,
        };
        let fvar = fvar
            .map(|data| Fvar::read(FontData::new(data)))
            .transpose()
            .map_err(SubsetError::ReadError)?;
        Ok(FontTables { glyf, fvar })
    }

    pub fn num_glyphs(&self) -> usize {
        self.glyf
            .as_ref()
            .map(GlyfLoca::num_glyphs)
            .unwrap_or_default()
    }
}

#[derive(Default)]
pub struct Plan {
    glyphs_requested: U32Set,
    glyphset: U32Set,
    /// Old->New glyph id mapping,
    glyph_map: FnvHashMap<GlyphId, GlyphId>,
    /// New->Old glyph id mapping,
    reverse_glyph_map: FnvHashMap<GlyphId, GlyphId>,

    new_to_old_gid_list: Vec<(GlyphId, GlyphId)>,

    num_output_glyphs: usize,
    font_num_glyphs: usize,

    subset_flags: SubsetFlags,
    name_ids: U32Set,

    // user specified axes range map
    user_axes_location: FnvHashMap<Tag, AxisLimit>,
    // normalized axes range map
    axes_location: FnvHashMap<Tag, AxisLimit>,
    normalized_coords: Vec<F2Dot14>,
    pinned_at_default: bool,
    all_axes_pinned: bool,

    //retained old axis index -> new axis index mapping in fvar axis array
    axes_index_map: FnvHashMap<usize, usize>,
    axis_tags: Vec<Tag>,
    axes_old_index_tag_map: FnvHashMap<usize, Tag>,
}

impl Plan {
    pub fn new(
        input_gids: &U32Set,
        flags: SubsetFlags,
        variations: Option<&InstancingSpec>,
        font: &FontTables,
    ) -> Result<Self, SubsetError> {
        let mut this = Plan {
            glyphs_requested: input_gids.clone(),
            font_num_glyphs: font.num_glyphs(),
            subset_flags: flags,
            pinned_at_default: true,
            ..Default::default()
        };

        if let Some(fvar) = font.fvar.as_ref() {
            if let Some(variations) = variations {
                this.apply_instancing_spec(variations, fvar);
            }
            this.normalize_axes_location(fvar);
            fvar.collect_name_ids(&this.user_axes_location, &mut this.name_ids);
        } else if variations.is_some_and(|spec| !spec.axes.is_empty()) {
            return Err(SubsetError::InvalidInstancingSpec(
                "font has no variation axes".to_string(),
            ));
        }

        this.populate_gids_to_retain(font);
        this.create_old_gid_to_new_gid_map();
        log::debug!(
            "plan retains {} of {} glyphs, {} axes",
            this.glyphset.len(),
            this.font_num_glyphs,
            this.axes_index_map.len()
        );
        Ok(this)
    }

    pub fn subset_flags(&self) -> SubsetFlags {
        self.subset_flags
    }

    pub fn glyphset(&self) -> &U32Set {
        &self.glyphset
    }

    /// Old->new glyph id mapping.
    pub fn glyph_map(&self) -> &FnvHashMap<GlyphId, GlyphId> {
        &self.glyph_map
    }

    /// New->old glyph id mapping.
    pub fn reverse_glyph_map(&self) -> &FnvHashMap<GlyphId, GlyphId> {
        &self.reverse_glyph_map
    }

    /// (new, old) glyph id pairs, sorted by new id.
    pub fn new_to_old_gid_list(&self) -> &[(GlyphId, GlyphId)] {
        &self.new_to_old_gid_list
    }

    pub fn num_output_glyphs(&self) -> usize {
        self.num_output_glyphs
    }

    /// Name ids still referenced by the retained axes and instances.
    pub fn name_ids(&self) -> &U32Set {
        &self.name_ids
    }

    pub fn user_axes_location(&self) -> &FnvHashMap<Tag, AxisLimit> {
        &self.user_axes_location
    }

    /// Axis limits in normalized coordinates.
    pub fn axes_location(&self) -> &FnvHashMap<Tag, AxisLimit> {
        &self.axes_location
    }

    /// The normalized location of the instance, one value per source axis.
    pub fn normalized_coords(&self) -> &[F2Dot14] {
        &self.normalized_coords
    }

    /// Retained old axis index -> new axis index.
    pub fn axes_index_map(&self) -> &FnvHashMap<usize, usize> {
        &self.axes_index_map
    }

    /// Tags of the retained axes, in their new order.
    pub fn axis_tags(&self) -> &[Tag] {
        &self.axis_tags
    }

    pub fn pinned_at_default(&self) -> bool {
        self.pinned_at_default
    }

    pub fn all_axes_pinned(&self) -> bool {
        self.all_axes_pinned
    }

    fn apply_instancing_spec(&mut self, spec: &InstancingSpec, fvar: &Fvar) {
        if spec.pin_all_axes_to_default {
            for axis in fvar.axes().iter() {
                self.user_axes_location
                    .insert(axis.axis_tag, AxisLimit::point(axis.default_value.to_f64()));
            }
            return;
        }
        for font_axis in fvar.axes().iter() {
            let tag = font_axis.axis_tag;
            let (axis_min, axis_def, axis_max) = font_axis.coordinates();
            match spec.axes.get(&tag) {
                Some(AxisSpec::PinToDefault) => {
                    // Fixed carries more precision than f32
                    self.user_axes_location
                        .insert(tag, AxisLimit::point(font_axis.default_value.to_f64()));
                }
                Some(AxisSpec::Range { min, def, max }) => {
                    let fill = |v: f32, fallback: f32| if v.is_nan() { fallback } else { v };
                    let new_min = fill(*min, axis_min).clamp(axis_min, axis_max);
                    let new_max = fill(*max, axis_max).clamp(axis_min, axis_max);
                    let new_def = fill(*def, axis_def).clamp(new_min, new_max);
                    self.user_axes_location.insert(
                        tag,
                        AxisLimit::new(new_min as f64, new_def as f64, new_max as f64),
                    );
                }
                None => {
                    // an axis the spec doesn't mention keeps its full range
                    self.user_axes_location.insert(
                        tag,
                        AxisLimit::new(axis_min as f64, axis_def as f64, axis_max as f64),
                    );
                }
            }
        }
    }

    fn normalize_axes_location(&mut self, fvar: &Fvar) {
        let axes = fvar.axes();
        if self.user_axes_location.is_empty() {
            for (i, axis) in axes.iter().enumerate() {
                self.axes_old_index_tag_map.insert(i, axis.axis_tag);
                self.axes_index_map.insert(i, i);
                self.axis_tags.push(axis.axis_tag);
            }
            return;
        }
        self.normalized_coords = vec![F2Dot14::default(); axes.len()];
        let normalize = |axis: &read_fonts::tables::fvar::AxisRecord, v: f64| {
            axis.normalize_axis_value(v as f32) as f64 / NORMALIZED_MAX as f64
        };
        let mut new_axis_idx = 0;
        for (i, axis) in axes.iter().enumerate() {
            let tag = axis.axis_tag;
            self.axes_old_index_tag_map.insert(i, tag);

            let Some(limit) = self.user_axes_location.get(&tag).copied() else {
                self.axes_index_map.insert(i, new_axis_idx);
                self.axis_tags.push(tag);
                new_axis_idx += 1;
                continue;
            };
            if limit.is_point() {
                let value = normalize(&axis, limit.minimum);
                if value != 0.0 {
                    self.pinned_at_default = false;
                }
                self.axes_location.insert(tag, AxisLimit::point(value));
                self.normalized_coords[i] = F2Dot14::from_f32(value as f32);
            } else {
                self.axes_index_map.insert(i, new_axis_idx);
                self.axis_tags.push(tag);
                new_axis_idx += 1;

                let normalized = AxisLimit::new(
                    normalize(&axis, limit.minimum),
                    normalize(&axis, limit.middle),
                    normalize(&axis, limit.maximum),
                );
                if normalized.middle != 0.0 {
                    self.pinned_at_default = false;
                }
                self.normalized_coords[i] = F2Dot14::from_f32(normalized.middle as f32);
                self.axes_location.insert(tag, normalized);
            }
        }
        self.all_axes_pinned = !self.user_axes_location.is_empty() && self.axes_index_map.is_empty();
    }

    fn populate_gids_to_retain(&mut self, font: &FontTables) {
        self.glyphset.insert(GlyphId::NOTDEF.to_u32());
        let num_glyphs = self.font_num_glyphs as u32;
        let Some(glyf) = font.glyf.as_ref() else {
            for gid in self.glyphs_requested.iter().filter(|gid| *gid < num_glyphs) {
                self.glyphset.insert(gid);
            }
            return;
        };
        let requested: Vec<_> = self.glyphs_requested.iter().collect();
        for gid in requested {
            if gid >= num_glyphs {
                log::warn!("requested glyph {gid} is out of range, ignoring");
                continue;
            }
            glyf_closure_glyphs(
                glyf,
                GlyphId::new(gid),
                &mut self.glyphset,
                MAX_COMPOSITE_OPERATIONS_PER_GLYPH as i32,
                0,
            );
        }
        remove_invalid_gids(&mut self.glyphset, self.font_num_glyphs);
    }

    fn create_old_gid_to_new_gid_map(&mut self) {
        let retain_gids = self
            .subset_flags
            .contains(SubsetFlags::SUBSET_FLAGS_RETAIN_GIDS);
        for (idx, old) in self.glyphset.iter().enumerate() {
            let old_gid = GlyphId::new(old);
            let new_gid = if retain_gids {
                old_gid
            } else {
                GlyphId::new(idx as u32)
            };
            self.glyph_map.insert(old_gid, new_gid);
            self.reverse_glyph_map.insert(new_gid, old_gid);
            self.new_to_old_gid_list.push((new_gid, old_gid));
        }
        self.num_output_glyphs = if retain_gids {
            self.glyphset
                .last()
                .map(|max| max as usize + 1)
                .unwrap_or_default()
        } else {
            self.glyphset.len() as usize
        };
    }
}

/// glyph closure for Composite glyphs in glyf table
/// limit the number of operations through returning an operation count
fn glyf_closure_glyphs(
    glyf: &GlyfLoca,
    gid: GlyphId,
    gids_to_retain: &mut U32Set,
    operation_count: i32,
    depth: u8,
) -> i32 {
    if gids_to_retain.contains(gid.to_u32()) {
        return operation_count;
    }
    gids_to_retain.insert(gid.to_u32());

    if depth > MAX_NESTING_LEVEL {
        return operation_count;
    }
    let depth = depth + 1;

    let mut operation_count = operation_count - 1;
    if operation_count < 0 {
        return operation_count;
    }

    if let Ok(Glyph::Composite(glyph)) = glyf.glyph(gid) {
        for child in glyph.components() {
            operation_count = glyf_closure_glyphs(
                glyf,
                child.glyph_id(),
                gids_to_retain,
                operation_count,
                depth,
            );
        }
    }
    operation_count
}

fn remove_invalid_gids(gids: &mut U32Set, num_glyphs: usize) {
    if let Ok(first_invalid) = u32::try_from(num_glyphs) {
        gids.remove_range(first_invalid..=u32::MAX);
    }
}

#[derive(Debug, Error)]
pub enum SubsetError {
    #[error("Invalid input gid {0}")]
    InvalidGid(String),

    #[error("Invalid gid range {start}-{end}")]
    InvalidGidRange { start: u32, end: u32 },

    #[error("Invalid tag {0}")]
    InvalidTag(String),

    #[error("Invalid ID {0}")]
    InvalidId(String),

    #[error("Subsetting table '{0}' failed")]
    SubsetTableError(Tag),

    #[error("Invalid input to --variations: {0}")]
    InvalidInstancingSpec(String),

    #[error("Invalid contour data in glyf table")]
    InvalidContourData,

    #[error("Error reading font data: {0}")]
    ReadError(ReadError),
}

/// The tables produced by [`subset_tables`].
///
/// A table is `None` when the source had none or when subsetting dropped it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SubsetOutput {
    pub glyf: Option<CompiledGlyf>,
    pub fvar: Option<Vec<u8>>,
}

/// Subset every table in `font` according to `plan`.
pub fn subset_tables(font: &FontTables, plan: &Plan) -> Result<SubsetOutput, SubsetError> {
    let mut output = SubsetOutput::default();
    if let Some(glyf) = font.glyf.as_ref() {
        log::info!("Subsetting table {GLYF}");
        let table = MutableGlyphTable::subset(glyf, plan)?;
        output.glyf = Some(table.compile(plan.subset_flags)?);
    }
    if let Some(fvar) = font.fvar.as_ref() {
        if plan.all_axes_pinned {
            log::info!("Dropping table {FVAR}: every axis is pinned");
        } else {
            log::info!("Subsetting table {FVAR}");
            output.fvar = Some(subset_fvar(fvar, plan)?);
        }
    }
    Ok(output)
}

#[cfg(test)]
pub(crate) mod test_data {
    //! Hand built tables shared by the tests.

    use font_types::{Fixed, NameId};

    fn push_u16(out: &mut Vec<u8>, v: u16) {
        out.extend_from_slice(&v.to_be_bytes());
    }

    /// An fvar table with `wght` 100..400..900 (name 256) and `wdth`
    /// 50..100..200 (name 257).
    ///
    /// Instances: Regular (258, ps 261) at 400/100, Black (259, ps 262) at
    /// 900/100 and Condensed (260, no ps name) at 400/50.
    pub(crate) fn two_axis_fvar() -> Vec<u8> {
        let mut out = Vec::new();
        for v in [1u16, 0, 16, 2, 2, 20, 3, 14] {
            push_u16(&mut out, v);
        }
        for (tag, min, def, max, name) in [
            (b"wght", 100.0, 400.0, 900.0, 256u16),
            (b"wdth", 50.0, 100.0, 200.0, 257),
        ] {
            out.extend_from_slice(tag);
            for v in [min, def, max] {
                out.extend_from_slice(&Fixed::from_f64(v).to_bits().to_be_bytes());
            }
            push_u16(&mut out, 0);
            push_u16(&mut out, name);
        }
        for (name, wght, wdth, ps) in [
            (258u16, 400.0, 100.0, 261u16),
            (259, 900.0, 100.0, 262),
            (260, 400.0, 50.0, NameId::UNSET.to_u16()),
        ] {
            push_u16(&mut out, name);
            push_u16(&mut out, 0);
            for v in [wght, wdth] {
                out.extend_from_slice(&Fixed::from_f64(v).to_bits().to_be_bytes());
            }
            push_u16(&mut out, ps);
        }
        out
    }

    /// A simple glyph: a single triangle with two instruction bytes.
    pub(crate) fn triangle() -> Vec<u8> {
        let mut out = Vec::new();
        for v in [1i16, 0, -300, 100, 0] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        push_u16(&mut out, 2);
        push_u16(&mut out, 2);
        out.extend_from_slice(&[0xb0, 0x01, 0x31, 0x33, 0x03, 100, 100]);
        out.extend_from_slice(&(-300i16).to_be_bytes());
        out
    }

    /// A composite glyph referencing `first` at (10, 20) and `second` at (-5, 0).
    pub(crate) fn composite(first: u16, second: u16) -> Vec<u8> {
        let mut out = Vec::new();
        for v in [-1i16, 0, -300, 100, 20] {
            out.extend_from_slice(&v.to_be_bytes());
        }
        // ARGS_ARE_XY_VALUES | MORE_COMPONENTS
        push_u16(&mut out, 0x0022);
        push_u16(&mut out, first);
        out.extend_from_slice(&[10, 20]);
        push_u16(&mut out, 0x0002);
        push_u16(&mut out, second);
        out.extend_from_slice(&[(-5i8) as u8, 0]);
        out
    }

    /// A glyf table and short loca for the given records.
    pub(crate) fn glyf_loca(glyphs: &[Vec<u8>]) -> (Vec<u8>, Vec<u8>) {
        let mut glyf = Vec::new();
        let mut loca = Vec::new();
        push_u16(&mut loca, 0);
        for glyph in glyphs {
            glyf.extend_from_slice(glyph);
            if glyf.len() % 2 == 1 {
                glyf.push(0);
            }
            push_u16(&mut loca, (glyf.len() / 2) as u16);
        }
        (glyf, loca)
    }
}
