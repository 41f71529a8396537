//! The font data a shaper needs.
//!
//! [`FaceData`] owns everything: the character map, advances, glyph classes
//! and the raw `GSUB` and `GPOS` tables. A [`Face`] borrows it and holds the
//! lookups parsed out of those tables, so parsing happens once per face
//! rather than once per glyph.

use fnv::FnvHashMap;
use font_types::GlyphId;
use log::{debug, warn};
use read_fonts::{
    collections::U32Set,
    tables::{
        gpos::{self, CursivePosFormat1, PairPosFormat2, PositionLookupType},
        gsub::{self, LigatureSubstFormat1},
        layout::{LayoutTable, Lookup, LookupFlag},
    },
    FontData, FontRead, ReadError,
};

use crate::buffer::glyph_props;
use crate::myanmar::DOTTED_CIRCLE;

/// Glyph classes, as in the `GDEF` glyph class definition table.
pub mod glyph_class {
    pub const BASE: u16 = 1;
    pub const LIGATURE: u16 = 2;
    pub const MARK: u16 = 3;
    pub const COMPONENT: u16 = 4;
}

/// Owned font data for shaping.
///
/// Built up with the `add_*` and `set_*` methods; all metrics are in font
/// units.
#[derive(Clone, Debug, Default)]
pub struct FaceData {
    units_per_em: u16,
    ascender: i16,
    descender: i16,
    char_map: FnvHashMap<u32, GlyphId>,
    advances: FnvHashMap<GlyphId, u16>,
    glyph_classes: FnvHashMap<GlyphId, u16>,
    mark_attachment_classes: FnvHashMap<GlyphId, u16>,
    mark_glyph_sets: Vec<U32Set>,
    gsub: Option<Vec<u8>>,
    gpos: Option<Vec<u8>>,
}

impl FaceData {
    pub fn new(units_per_em: u16) -> Self {
        FaceData {
            units_per_em,
            ascender: units_per_em as i16 * 4 / 5,
            descender: -(units_per_em as i16 / 5),
            ..Default::default()
        }
    }

    pub fn set_metrics(&mut self, ascender: i16, descender: i16) -> &mut Self {
        self.ascender = ascender;
        self.descender = descender;
        self
    }

    /// Map `codepoint` to `glyph_id` and give the glyph an advance.
    pub fn add_glyph(&mut self, codepoint: u32, glyph_id: u32, advance: u16) -> &mut Self {
        let glyph_id = GlyphId::new(glyph_id);
        self.char_map.insert(codepoint, glyph_id);
        self.advances.insert(glyph_id, advance);
        self
    }

    /// Set the advance of a glyph that may have no character mapped to it,
    /// such as a ligature.
    pub fn set_advance(&mut self, glyph_id: u32, advance: u16) -> &mut Self {
        self.advances.insert(GlyphId::new(glyph_id), advance);
        self
    }

    /// Set the class of a glyph; see [`glyph_class`].
    ///
    /// Once any glyph has a class, unclassified glyphs are class 0 rather
    /// than guessed from their characters.
    pub fn set_glyph_class(&mut self, glyph_id: u32, class: u16) -> &mut Self {
        self.glyph_classes.insert(GlyphId::new(glyph_id), class);
        self
    }

    pub fn set_mark_attachment_class(&mut self, glyph_id: u32, class: u16) -> &mut Self {
        self.mark_attachment_classes
            .insert(GlyphId::new(glyph_id), class);
        self
    }

    /// Add a mark glyph set, returning its index.
    pub fn add_mark_glyph_set(&mut self, glyphs: impl IntoIterator<Item = u32>) -> u16 {
        let mut set = U32Set::empty();
        for gid in glyphs {
            set.insert(gid);
        }
        self.mark_glyph_sets.push(set);
        (self.mark_glyph_sets.len() - 1) as u16
    }

    pub fn set_gsub(&mut self, table: Vec<u8>) -> &mut Self {
        self.gsub = Some(table);
        self
    }

    pub fn set_gpos(&mut self, table: Vec<u8>) -> &mut Self {
        self.gpos = Some(table);
        self
    }

    pub fn units_per_em(&self) -> u16 {
        self.units_per_em
    }

    pub fn ascender(&self) -> i16 {
        self.ascender
    }

    pub fn descender(&self) -> i16 {
        self.descender
    }

    pub fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        self.char_map.get(&codepoint).copied()
    }

    /// The horizontal advance of a glyph; unknown glyphs have none.
    pub fn advance(&self, glyph_id: GlyphId) -> u16 {
        self.advances.get(&glyph_id).copied().unwrap_or_default()
    }
}

/// One lookup's flags and the subtables we can apply.
#[derive(Clone, Debug)]
pub(crate) struct LookupData<T> {
    pub flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    pub subtables: Vec<T>,
}

impl<T> LookupData<T> {
    fn empty() -> Self {
        LookupData {
            flag: LookupFlag::empty(),
            mark_filtering_set: None,
            subtables: Vec::new(),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum PositionSubtable<'a> {
    Cursive(CursivePosFormat1<'a>),
    Pair(PairPosFormat2<'a>),
}

pub(crate) type SubstitutionLookup<'a> = LookupData<LigatureSubstFormat1<'a>>;
pub(crate) type PositionLookup<'a> = LookupData<PositionSubtable<'a>>;

/// A [`FaceData`] with its lookups parsed.
#[derive(Clone, Debug)]
pub struct Face<'a> {
    data: &'a FaceData,
    substitutions: Vec<SubstitutionLookup<'a>>,
    positions: Vec<PositionLookup<'a>>,
    dotted_circle: Option<GlyphId>,
}

impl<'a> Face<'a> {
    /// Parse the layout tables of `data`.
    ///
    /// Fails if a layout table header or lookup list is malformed. A broken
    /// lookup or subtable is only logged; it is left out and never matches.
    pub fn new(data: &'a FaceData) -> Result<Self, ReadError> {
        let substitutions = match data.gsub.as_deref() {
            Some(bytes) => parse_lookups(bytes, gsub::EXTENSION_LOOKUP_TYPE, substitution_subtable)?,
            None => Vec::new(),
        };
        let positions = match data.gpos.as_deref() {
            Some(bytes) => parse_lookups(bytes, gpos::EXTENSION_LOOKUP_TYPE, position_subtable)?,
            None => Vec::new(),
        };
        debug!(
            "face has {} substitution and {} positioning lookups",
            substitutions.len(),
            positions.len()
        );
        Ok(Face {
            data,
            substitutions,
            positions,
            dotted_circle: data.glyph_id(DOTTED_CIRCLE),
        })
    }

    pub fn data(&self) -> &'a FaceData {
        self.data
    }

    pub fn units_per_em(&self) -> u16 {
        self.data.units_per_em
    }

    pub fn glyph_id(&self, codepoint: u32) -> Option<GlyphId> {
        self.data.glyph_id(codepoint)
    }

    pub fn advance(&self, glyph_id: GlyphId) -> u16 {
        self.data.advance(glyph_id)
    }

    pub fn substitution_lookup_count(&self) -> usize {
        self.substitutions.len()
    }

    pub fn position_lookup_count(&self) -> usize {
        self.positions.len()
    }

    pub(crate) fn substitution_lookup(&self, index: usize) -> Option<&SubstitutionLookup<'a>> {
        self.substitutions.get(index)
    }

    pub(crate) fn position_lookup(&self, index: usize) -> Option<&PositionLookup<'a>> {
        self.positions.get(index)
    }

    pub(crate) fn dotted_circle(&self) -> Option<GlyphId> {
        self.dotted_circle
    }

    pub(crate) fn has_glyph_classes(&self) -> bool {
        !self.data.glyph_classes.is_empty()
    }

    /// The class bits of [`glyph_props`] for a glyph.
    ///
    /// Without glyph classes, combining marks are marks and everything else
    /// is a base glyph.
    pub(crate) fn glyph_props(&self, glyph_id: GlyphId, codepoint: u32) -> u16 {
        if !self.has_glyph_classes() {
            return if is_combining_mark(codepoint) {
                glyph_props::MARK
            } else {
                glyph_props::BASE_GLYPH
            };
        }
        self.class_props(glyph_id)
    }

    /// The class bits for a glyph produced by a substitution.
    pub(crate) fn class_props(&self, glyph_id: GlyphId) -> u16 {
        match self.data.glyph_classes.get(&glyph_id).copied() {
            Some(glyph_class::BASE) => glyph_props::BASE_GLYPH,
            Some(glyph_class::LIGATURE) => glyph_props::LIGATURE,
            Some(glyph_class::MARK) => {
                let attach_class = self
                    .data
                    .mark_attachment_classes
                    .get(&glyph_id)
                    .copied()
                    .unwrap_or_default();
                glyph_props::MARK | (attach_class << 8)
            }
            _ => 0,
        }
    }

    /// Returns `true` if the mark glyph set at `set_index` holds `glyph_id`.
    pub(crate) fn mark_set_covers(&self, set_index: u16, glyph_id: GlyphId) -> bool {
        self.data
            .mark_glyph_sets
            .get(set_index as usize)
            .is_some_and(|set| set.contains(glyph_id.to_u32()))
    }
}

fn parse_lookups<'a, T>(
    bytes: &'a [u8],
    extension_type: u16,
    parse_subtable: impl Fn(u16, FontData<'a>) -> Result<Option<T>, ReadError>,
) -> Result<Vec<LookupData<T>>, ReadError> {
    let table = LayoutTable::read(FontData::new(bytes))?;
    let lookup_list = table.lookup_list()?;
    let mut lookups = Vec::with_capacity(lookup_list.len());
    for (index, lookup) in lookup_list.iter().enumerate() {
        // keep an empty lookup in place so that indices stay stable
        let parsed = match lookup {
            Ok(lookup) => parse_lookup(index, &lookup, extension_type, &parse_subtable),
            Err(e) => {
                warn!("lookup {index} is malformed: {e}");
                LookupData::empty()
            }
        };
        lookups.push(parsed);
    }
    Ok(lookups)
}

fn parse_lookup<'a, T>(
    index: usize,
    lookup: &Lookup<'a>,
    extension_type: u16,
    parse_subtable: &impl Fn(u16, FontData<'a>) -> Result<Option<T>, ReadError>,
) -> LookupData<T> {
    let mut subtables = Vec::with_capacity(lookup.subtable_count());
    for subtable in lookup.subtables(extension_type) {
        match subtable.and_then(|(kind, data)| parse_subtable(kind, data)) {
            Ok(Some(subtable)) => subtables.push(subtable),
            Ok(None) => (),
            Err(e) => warn!("dropping malformed subtable in lookup {index}: {e}"),
        }
    }
    LookupData {
        flag: lookup.lookup_flag(),
        mark_filtering_set: lookup.mark_filtering_set(),
        subtables,
    }
}

fn substitution_subtable(
    kind: u16,
    data: FontData,
) -> Result<Option<LigatureSubstFormat1>, ReadError> {
    if kind != gsub::LIGATURE_LOOKUP_TYPE {
        debug!("skipping unsupported substitution lookup type {kind}");
        return Ok(None);
    }
    LigatureSubstFormat1::read(data).map(Some)
}

fn position_subtable(kind: u16, data: FontData) -> Result<Option<PositionSubtable>, ReadError> {
    let format: u16 = data.read_at(0)?;
    match (PositionLookupType::try_from(kind)?, format) {
        (PositionLookupType::Cursive, 1) => CursivePosFormat1::read(data)
            .map(PositionSubtable::Cursive)
            .map(Some),
        (PositionLookupType::Pair, 2) => PairPosFormat2::read(data)
            .map(PositionSubtable::Pair)
            .map(Some),
        (kind, format) => {
            debug!("skipping unsupported positioning subtable {kind:?} format {format}");
            Ok(None)
        }
    }
}

/// Returns `true` for the common combining mark blocks.
fn is_combining_mark(c: u32) -> bool {
    matches!(
        c,
        0x0300..=0x036F
            | 0x0483..=0x0489
            | 0x0591..=0x05BD
            | 0x05BF
            | 0x05C1..=0x05C2
            | 0x05C4..=0x05C5
            | 0x05C7
            | 0x0610..=0x061A
            | 0x064B..=0x065F
            | 0x0670
            | 0x06D6..=0x06DC
            | 0x06DF..=0x06E4
            | 0x06E7..=0x06E8
            | 0x06EA..=0x06ED
            | 0x102D..=0x1030
            | 0x1032..=0x1037
            | 0x1039..=0x103A
            | 0x103D..=0x103E
            | 0x1058..=0x1059
            | 0x105E..=0x1060
            | 0x1071..=0x1074
            | 0x1082
            | 0x1085..=0x1086
            | 0x108D
            | 0x109D
            | 0x1AB0..=0x1AFF
            | 0x1DC0..=0x1DFF
            | 0x20D0..=0x20FF
            | 0xFE20..=0xFE2F
    )
}
