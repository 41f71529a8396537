//! Applying lookups to a buffer.
//!
//! An [`ApplyContext`] carries the state of one lookup being applied: the
//! lookup flag that decides which glyphs are skipped, and the buffer cursor.
//! Subtables match with a [`SkippingIterator`] and report whether they
//! applied; the driver in [`apply_lookup`] advances the cursor otherwise.

use font_types::GlyphId;
use read_fonts::tables::layout::LookupFlag;
use smallvec::SmallVec;

use crate::buffer::{glyph_props, Buffer, Direction, GlyphInfo};
use crate::face::{Face, LookupData};

/// The longest input sequence a ligature may have.
pub(crate) const MAX_CONTEXT_LENGTH: usize = 64;

/// The deepest attachment chain that is resolved.
pub(crate) const MAX_NESTING_LEVEL: usize = 64;

/// Buffer indices of the glyphs matched by an input sequence.
pub(crate) type MatchPositions = SmallVec<[usize; 4]>;

const ZWNJ: u32 = 0x200C;
const ZWJ: u32 = 0x200D;

/// The table a lookup comes from; they skip joiners differently.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TableKind {
    Substitution,
    Positioning,
}

pub(crate) struct ApplyContext<'a, 'f> {
    pub face: &'a Face<'f>,
    pub buffer: &'a mut Buffer,
    pub table: TableKind,
    pub lookup_flag: LookupFlag,
    pub mark_filtering_set: Option<u16>,
    pub direction: Direction,
    /// Split simple pair kerning evenly between the two glyphs.
    pub split_kerning: bool,
    /// Always take the exhaustive ligature matching path.
    pub optimize_size: bool,
    /// Only match glyphs within the current syllable.
    pub per_syllable: bool,
}

impl<'a, 'f> ApplyContext<'a, 'f> {
    pub fn new(face: &'a Face<'f>, buffer: &'a mut Buffer, table: TableKind) -> Self {
        let direction = buffer.direction;
        ApplyContext {
            face,
            buffer,
            table,
            lookup_flag: LookupFlag::empty(),
            mark_filtering_set: None,
            direction,
            split_kerning: false,
            optimize_size: false,
            per_syllable: false,
        }
    }

    /// Returns `false` if the current lookup skips this glyph entirely.
    pub fn check_glyph_property(&self, info: &GlyphInfo) -> bool {
        let flag = self.lookup_flag.to_bits();
        if info.glyph_props & flag & LookupFlag::IGNORE_FLAGS != 0 {
            return false;
        }
        if info.is_mark() {
            if self.lookup_flag.use_mark_filtering_set() {
                return self
                    .mark_filtering_set
                    .is_some_and(|set| self.face.mark_set_covers(set, info.glyph_id));
            }
            if self.lookup_flag.mark_attachment_class() != 0 {
                return flag & glyph_props::MARK_ATTACHMENT_CLASS
                    == info.glyph_props & glyph_props::MARK_ATTACHMENT_CLASS;
            }
        }
        true
    }

    /// Update the glyph properties at `index` for a substituted glyph.
    pub fn set_glyph_class(
        &mut self,
        index: usize,
        glyph_id: GlyphId,
        class_guess: u16,
        ligature: bool,
        component: bool,
    ) {
        let info = &mut self.buffer.info[index];
        let mut props = info.glyph_props | glyph_props::SUBSTITUTED;
        if ligature {
            props |= glyph_props::LIGATED;
            // a ligature forgives an earlier multiplication
            props &= !glyph_props::MULTIPLIED;
        }
        if component {
            props |= glyph_props::MULTIPLIED;
        }
        info.glyph_props = if self.face.has_glyph_classes() {
            (props & glyph_props::PRESERVE) | self.face.class_props(glyph_id)
        } else if class_guess != 0 {
            (props & glyph_props::PRESERVE) | class_guess
        } else {
            props
        };
    }

    /// Swap the current glyph for another and move past it.
    pub fn replace_glyph(&mut self, glyph_id: GlyphId) {
        let idx = self.buffer.idx;
        self.set_glyph_class(idx, glyph_id, 0, false, false);
        self.buffer.info[idx].glyph_id = glyph_id;
        self.buffer.idx += 1;
    }

    fn set_lookup<T>(&mut self, lookup: &LookupData<T>) {
        self.lookup_flag = lookup.flag;
        self.mark_filtering_set = lookup.mark_filtering_set;
    }
}

/// Apply one lookup across the whole buffer.
///
/// At each position the subtables are tried in order until one applies.
/// A subtable that applies moves the cursor itself.
pub(crate) fn apply_lookup<T>(
    ctx: &mut ApplyContext,
    lookup: &LookupData<T>,
    apply_subtable: impl Fn(&mut ApplyContext, &T) -> bool,
) {
    if lookup.subtables.is_empty() {
        return;
    }
    ctx.set_lookup(lookup);
    ctx.buffer.idx = 0;
    while ctx.buffer.idx < ctx.buffer.len() {
        let applied = ctx.check_glyph_property(ctx.buffer.cur())
            && lookup
                .subtables
                .iter()
                .any(|subtable| apply_subtable(ctx, subtable));
        if !applied {
            ctx.buffer.idx += 1;
        }
    }
}

/// A three-way answer used while skipping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Ternary {
    No,
    Yes,
    Maybe,
}

/// Walks the buffer from a start position, stepping over the glyphs the
/// current lookup ignores.
pub(crate) struct SkippingIterator<'c, 'a, 'f> {
    ctx: &'c ApplyContext<'a, 'f>,
    pub idx: usize,
    num_items: usize,
    matched: usize,
    end: usize,
    syllable: u8,
    ignore_zwnj: bool,
    ignore_zwj: bool,
    matcher: Option<&'c dyn Fn(GlyphId, usize) -> bool>,
}

impl<'c, 'a, 'f> SkippingIterator<'c, 'a, 'f> {
    /// Prepare to find `num_items` more glyphs after (or before) `start`.
    pub fn new(ctx: &'c ApplyContext<'a, 'f>, start: usize, num_items: usize) -> Self {
        let buffer = &*ctx.buffer;
        let syllable = if ctx.per_syllable && start == buffer.idx {
            buffer.info.get(start).map(|i| i.syllable).unwrap_or(0)
        } else {
            0
        };
        SkippingIterator {
            ctx,
            idx: start,
            num_items,
            matched: 0,
            end: buffer.len(),
            syllable,
            ignore_zwnj: ctx.table == TableKind::Positioning,
            ignore_zwj: true,
            matcher: None,
        }
    }

    /// Check each found glyph with `matcher`, which also gets the number
    /// of glyphs matched before it.
    pub fn set_matcher(&mut self, matcher: &'c dyn Fn(GlyphId, usize) -> bool) {
        self.matcher = Some(matcher);
    }

    /// Whether the current lookup would step over this glyph.
    pub fn may_skip(&self, info: &GlyphInfo) -> Ternary {
        if !self.ctx.check_glyph_property(info) {
            return Ternary::Yes;
        }
        if is_default_ignorable(info.codepoint)
            && (self.ignore_zwnj || info.codepoint != ZWNJ)
            && (self.ignore_zwj || info.codepoint != ZWJ)
        {
            return Ternary::Maybe;
        }
        Ternary::No
    }

    fn may_match(&self, info: &GlyphInfo) -> Ternary {
        if self.syllable != 0 && self.syllable != info.syllable {
            return Ternary::No;
        }
        match self.matcher {
            Some(matcher) if matcher(info.glyph_id, self.matched) => Ternary::Yes,
            Some(_) => Ternary::No,
            None => Ternary::Maybe,
        }
    }

    /// Decide what to do with the glyph at `idx`: `Some(true)` if it is the
    /// next item, `Some(false)` if matching has failed, `None` to skip it.
    fn consider(&mut self) -> Option<bool> {
        let info = &self.ctx.buffer.info[self.idx];
        let skip = self.may_skip(info);
        if skip == Ternary::Yes {
            return None;
        }
        let matched = self.may_match(info);
        if matched == Ternary::Yes || (matched == Ternary::Maybe && skip == Ternary::No) {
            self.num_items -= 1;
            self.matched += 1;
            return Some(true);
        }
        if skip == Ternary::No {
            return Some(false);
        }
        None
    }

    /// Move forward to the next item.
    ///
    /// On failure `unsafe_to` receives the end of the range that decided
    /// the outcome.
    pub fn next(&mut self, unsafe_to: Option<&mut usize>) -> bool {
        debug_assert!(self.num_items > 0);
        let stop = self.end.saturating_sub(1);
        while self.idx < stop {
            self.idx += 1;
            match self.consider() {
                Some(true) => return true,
                Some(false) => {
                    if let Some(unsafe_to) = unsafe_to {
                        *unsafe_to = self.idx + 1;
                    }
                    return false;
                }
                None => (),
            }
        }
        if let Some(unsafe_to) = unsafe_to {
            *unsafe_to = self.end;
        }
        false
    }

    /// Move back to the previous item.
    ///
    /// On failure `unsafe_from` receives the start of the range that
    /// decided the outcome.
    pub fn prev(&mut self, unsafe_from: Option<&mut usize>) -> bool {
        debug_assert!(self.num_items > 0);
        while self.idx > 0 {
            self.idx -= 1;
            match self.consider() {
                Some(true) => return true,
                Some(false) => {
                    if let Some(unsafe_from) = unsafe_from {
                        *unsafe_from = self.idx.saturating_sub(1);
                    }
                    return false;
                }
                None => (),
            }
        }
        if let Some(unsafe_from) = unsafe_from {
            *unsafe_from = 0;
        }
        false
    }
}

/// Characters that are invisible unless a font gives them a glyph.
pub(crate) fn is_default_ignorable(c: u32) -> bool {
    matches!(
        c,
        0x00AD
            | 0x034F
            | 0x061C
            | 0x115F..=0x1160
            | 0x17B4..=0x17B5
            | 0x180B..=0x180F
            | 0x200B..=0x200F
            | 0x202A..=0x202E
            | 0x2060..=0x206F
            | 0x3164
            | 0xFE00..=0xFE0F
            | 0xFEFF
            | 0xFFA0
            | 0x1BCA0..=0x1BCA3
            | 0x1D173..=0x1D17A
            | 0xE0000..=0xE0FFF
    )
}

/// A successful [`match_input`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct InputMatch {
    /// Where each item matched; the first is the cursor.
    pub positions: MatchPositions,
    /// One past the last matched glyph.
    pub end: usize,
    /// Components of the matched glyphs, counting earlier ligatures fully.
    pub total_component_count: u8,
}

/// Match `count` items starting at the cursor.
///
/// The cursor glyph is the first item; `matcher` is asked about the rest.
/// On failure returns the end of the range that was looked at, for
/// marking it unsafe to concatenate.
pub(crate) fn match_input(
    ctx: &ApplyContext,
    count: usize,
    matcher: &dyn Fn(GlyphId, usize) -> bool,
) -> Result<InputMatch, usize> {
    let buffer = &*ctx.buffer;
    let start = buffer.idx;
    if count > MAX_CONTEXT_LENGTH {
        return Err(start);
    }
    let mut iter = SkippingIterator::new(ctx, start, count.saturating_sub(1));
    iter.set_matcher(matcher);

    let first = buffer.cur();
    let first_lig_id = first.lig_id();
    let first_lig_comp = first.lig_comp();
    let mut total_component_count = 0u32;
    // whether the ligature the first glyph is attached to may be skipped
    let mut lig_base_may_skip: Option<bool> = None;

    let mut positions = MatchPositions::new();
    positions.push(start);
    for _ in 1..count {
        let mut unsafe_to = start;
        if !iter.next(Some(&mut unsafe_to)) {
            return Err(unsafe_to);
        }
        positions.push(iter.idx);
        let this = &buffer.info[iter.idx];
        let this_lig_id = this.lig_id();
        let this_lig_comp = this.lig_comp();

        if first_lig_id != 0 && first_lig_comp != 0 {
            // A first component attached to a ligature component means every
            // other component must be attached to the same one, unless that
            // ligature is itself skipped.
            if first_lig_id != this_lig_id || first_lig_comp != this_lig_comp {
                let may_skip = *lig_base_may_skip.get_or_insert_with(|| {
                    buffer.info[..start]
                        .iter()
                        .rev()
                        .take_while(|info| info.lig_id() == first_lig_id)
                        .find(|info| info.lig_comp() == 0)
                        .is_some_and(|base| iter.may_skip(base) == Ternary::Yes)
                });
                if !may_skip {
                    return Err(start);
                }
            }
        } else if this_lig_id != 0 && this_lig_comp != 0 && this_lig_id != first_lig_id {
            // otherwise no component may be attached to some other ligature
            return Err(start);
        }
        total_component_count += this.lig_num_comps() as u32;
    }
    total_component_count += first.lig_num_comps() as u32;
    Ok(InputMatch {
        end: iter.idx + 1,
        positions,
        total_component_count: total_component_count.min(u8::MAX as u32) as u8,
    })
}

/// Replace a matched sequence with a ligature glyph.
///
/// Marks between the components stay where they are and are told which
/// component they followed. The cursor ends up after the last glyph of
/// the match.
pub(crate) fn ligate_input(ctx: &mut ApplyContext, input: &InputMatch, lig_glyph: GlyphId) {
    let positions = &input.positions[..];
    let Some((&start, components)) = positions.split_first() else {
        return;
    };
    ctx.buffer.merge_clusters(start, input.end);

    let info = &ctx.buffer.info;
    let mut is_base_ligature = info[start].is_base_glyph();
    let mut is_mark_ligature = info[start].is_mark();
    if components.iter().any(|&pos| !info[pos].is_mark()) {
        is_base_ligature = false;
        is_mark_ligature = false;
    }
    let is_ligature = !is_base_ligature && !is_mark_ligature;

    let klass = if is_ligature { glyph_props::LIGATURE } else { 0 };
    let lig_id = if is_ligature {
        ctx.buffer.allocate_lig_id()
    } else {
        0
    };
    let mut last_lig_id = ctx.buffer.info[start].lig_id();
    let mut last_num_components = ctx.buffer.info[start].lig_num_comps() as u32;
    let mut components_so_far = last_num_components;

    if is_ligature {
        ctx.buffer.info[start].set_lig_props_for_ligature(lig_id, input.total_component_count);
    }
    ctx.set_glyph_class(start, lig_glyph, klass, true, false);
    ctx.buffer.info[start].glyph_id = lig_glyph;

    let buffer = &mut *ctx.buffer;
    let new_lig_comp = |this_comp: u32, so_far: u32, last: u32| -> u8 {
        let this_comp = if this_comp == 0 { last } else { this_comp };
        (so_far - last + this_comp.min(last)) as u8
    };
    let mut i = start + 1;
    for &pos in components {
        while i < pos {
            if is_ligature {
                let comp = new_lig_comp(
                    buffer.info[i].lig_comp() as u32,
                    components_so_far,
                    last_num_components,
                );
                buffer.info[i].set_lig_props_for_mark(lig_id, comp);
            }
            i += 1;
        }
        last_lig_id = buffer.info[pos].lig_id();
        last_num_components = buffer.info[pos].lig_num_comps() as u32;
        components_so_far += last_num_components;
        i = pos + 1;
    }

    if !is_mark_ligature && last_lig_id != 0 {
        // marks after the last component that were attached to it
        for info in &mut buffer.info[i..] {
            let this_comp = info.lig_comp() as u32;
            if info.lig_id() != last_lig_id || this_comp == 0 {
                break;
            }
            let comp = new_lig_comp(this_comp, components_so_far, last_num_components);
            info.set_lig_props_for_mark(lig_id, comp);
        }
    }

    for &pos in components.iter().rev() {
        buffer.remove(pos);
    }
    buffer.idx = i - components.len();
}
