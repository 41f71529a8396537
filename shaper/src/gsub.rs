//! Applying ligature substitutions.

use font_types::{GlyphId, GlyphId16};
use read_fonts::tables::gsub::{Ligature, LigatureSet, LigatureSubstFormat1};

use crate::apply::{ligate_input, match_input, ApplyContext, SkippingIterator, Ternary};

/// Sets with this many ligatures or fewer are always matched exhaustively.
const FAST_PATH_MIN_LIGATURES: usize = 4;

/// Try the ligatures that start with the glyph at the cursor.
pub(crate) fn apply_ligature_subst(ctx: &mut ApplyContext, subtable: &LigatureSubstFormat1) -> bool {
    let Some(index) = subtable.coverage().get(ctx.buffer.cur().glyph_id) else {
        return false;
    };
    match subtable.ligature_set(index) {
        Ok(set) => apply_ligature_set(ctx, &set),
        Err(e) => {
            log::trace!("ligature set {index} unreadable: {e}");
            false
        }
    }
}

/// Try each ligature of a set in order; the first that matches wins.
///
/// Unless the set is small or we are optimizing for size, ligatures whose
/// second component is not the next glyph are rejected up front.
pub(crate) fn apply_ligature_set(ctx: &mut ApplyContext, set: &LigatureSet) -> bool {
    if set.len() <= FAST_PATH_MIN_LIGATURES || ctx.optimize_size {
        return apply_ligature_set_slow(ctx, set);
    }

    let (first, unsafe_to) = {
        let always = |_: GlyphId, _: usize| true;
        let mut iter = SkippingIterator::new(ctx, ctx.buffer.idx, 1);
        iter.set_matcher(&always);
        if !iter.next(None) {
            return apply_ligature_set_slow(ctx, set);
        }
        let next = &ctx.buffer.info[iter.idx];
        // a skippable glyph such as a joiner may or may not take part
        if iter.may_skip(next) != Ternary::No {
            return apply_ligature_set_slow(ctx, set);
        }
        (next.glyph_id, iter.idx + 1)
    };

    let mut unsafe_to_concat = false;
    for ligature in set.ligatures() {
        let components = ligature.component_glyph_ids();
        let starts_with_first = components
            .first()
            .is_none_or(|glyph| GlyphId::from(glyph) == first);
        if starts_with_first {
            if apply_ligature(ctx, &ligature) {
                if unsafe_to_concat {
                    let idx = ctx.buffer.idx;
                    ctx.buffer.unsafe_to_concat(idx, unsafe_to);
                }
                return true;
            }
        } else {
            unsafe_to_concat = true;
        }
    }
    if unsafe_to_concat {
        let idx = ctx.buffer.idx;
        ctx.buffer.unsafe_to_concat(idx, unsafe_to);
    }
    false
}

fn apply_ligature_set_slow(ctx: &mut ApplyContext, set: &LigatureSet) -> bool {
    set.ligatures().any(|ligature| apply_ligature(ctx, &ligature))
}

/// Match one ligature at the cursor and substitute it.
///
/// A ligature with a single component just swaps the glyph; it is not
/// marked as ligated.
pub(crate) fn apply_ligature(ctx: &mut ApplyContext, ligature: &Ligature) -> bool {
    let lig_glyph = GlyphId::from(ligature.ligature_glyph());
    let count = ligature.component_count() as usize;
    match count {
        0 => false,
        1 => {
            ctx.replace_glyph(lig_glyph);
            true
        }
        _ => {
            let components = ligature.component_glyph_ids();
            let matcher = |glyph: GlyphId, index: usize| {
                components
                    .get(index)
                    .is_some_and(|component: GlyphId16| GlyphId::from(component) == glyph)
            };
            match match_input(ctx, count, &matcher) {
                Ok(input) => {
                    ligate_input(ctx, &input, lig_glyph);
                    true
                }
                Err(unsafe_to) => {
                    let idx = ctx.buffer.idx;
                    ctx.buffer.unsafe_to_concat(idx, unsafe_to);
                    false
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::TableKind;
    use crate::buffer::{glyph_props, Buffer};
    use crate::face::{Face, FaceData};
    use crate::test_data;
    use pretty_assertions::assert_eq;
    use read_fonts::{FontData, FontRead};

    fn buffer_of(glyphs: &[u32]) -> Buffer {
        let mut buffer = Buffer::new();
        for (i, gid) in glyphs.iter().enumerate() {
            buffer.add('a' as u32 + i as u32, i as u32);
            let info = buffer.info.last_mut().unwrap();
            info.glyph_id = GlyphId::new(*gid);
            info.glyph_props = glyph_props::BASE_GLYPH;
        }
        buffer
    }

    fn glyphs(buffer: &Buffer) -> Vec<u32> {
        buffer.info.iter().map(|i| i.glyph_id.to_u32()).collect()
    }

    fn run(subtable_bytes: &[u8], glyph_ids: &[u32], optimize_size: bool) -> (Buffer, bool) {
        let data = FaceData::new(1000);
        let face = Face::new(&data).unwrap();
        let subtable = LigatureSubstFormat1::read(FontData::new(subtable_bytes)).unwrap();
        let mut buffer = buffer_of(glyph_ids);
        let mut ctx = ApplyContext::new(&face, &mut buffer, TableKind::Substitution);
        ctx.optimize_size = optimize_size;
        let applied = apply_ligature_subst(&mut ctx, &subtable);
        (buffer, applied)
    }

    #[test]
    fn longest_listed_first_wins() {
        let subtable = test_data::ligature_subtable(0);
        let (buffer, applied) = run(&subtable, &[10, 11, 12, 13], false);
        assert!(applied);
        assert_eq!(glyphs(&buffer), vec![100, 13]);
        assert_eq!(buffer.idx, 1);
        assert!(buffer.info[0].is_ligated());
        assert_eq!(buffer.info[0].cluster, 0);
        assert_eq!(buffer.info[1].cluster, 3);
    }

    #[test]
    fn falls_back_to_shorter_ligature() {
        let subtable = test_data::ligature_subtable(0);
        let (buffer, applied) = run(&subtable, &[10, 11, 20], false);
        assert!(applied);
        assert_eq!(glyphs(&buffer), vec![101, 20]);
        // the three component ligature looked at the glyph after 11
        assert!(buffer.info[1].unsafe_to_concat());
    }

    #[test]
    fn single_component_is_not_ligated() {
        let subtable = test_data::ligature_subtable(0);
        let (buffer, applied) = run(&subtable, &[10, 30], false);
        assert!(applied);
        assert_eq!(glyphs(&buffer), vec![102, 30]);
        assert_eq!(buffer.idx, 1);
        assert!(!buffer.info[0].is_ligated());
        assert!(buffer.info[0].is_substituted());
        assert_eq!(buffer.info[0].lig_id(), 0);
    }

    #[test]
    fn uncovered_glyph() {
        let subtable = test_data::ligature_subtable(0);
        let (buffer, applied) = run(&subtable, &[11, 12], false);
        assert!(!applied);
        assert_eq!(glyphs(&buffer), vec![11, 12]);
    }

    #[test]
    fn fast_and_slow_paths_agree() {
        // padded with ligatures that can never match, to leave the small set
        // threshold behind
        let subtable = test_data::ligature_subtable(3);
        let set = LigatureSubstFormat1::read(FontData::new(&subtable))
            .unwrap()
            .ligature_set(0)
            .unwrap();
        assert!(set.len() > FAST_PATH_MIN_LIGATURES);
        for input in [&[10, 11, 12][..], &[10, 11, 40], &[10, 40], &[10]] {
            let (fast, fast_applied) = run(&subtable, input, false);
            let (slow, slow_applied) = run(&subtable, input, true);
            assert_eq!(fast_applied, slow_applied, "{input:?}");
            assert_eq!(glyphs(&fast), glyphs(&slow), "{input:?}");
        }
        let (buffer, _) = run(&subtable, &[10, 11, 12], false);
        assert_eq!(glyphs(&buffer), vec![100]);
    }

    #[test]
    fn joiner_inside_ligature_takes_slow_path() {
        let subtable = test_data::ligature_subtable(3);
        let data = FaceData::new(1000);
        let face = Face::new(&data).unwrap();
        let subtable = LigatureSubstFormat1::read(FontData::new(&subtable)).unwrap();
        let mut buffer = buffer_of(&[10, 3, 11, 12]);
        buffer.info[1].codepoint = 0x200D;
        let mut ctx = ApplyContext::new(&face, &mut buffer, TableKind::Substitution);
        assert!(apply_ligature_subst(&mut ctx, &subtable));
        // the joiner stays, after the ligature
        assert_eq!(glyphs(&buffer), vec![100, 3]);
        assert_eq!(buffer.info[1].lig_id(), buffer.info[0].lig_id());
    }
}
