//! A small OpenType shaper
//!
//! Shaping turns a run of text into positioned glyphs. This crate applies
//! the lookups it understands (`GSUB` ligature substitution, `GPOS` cursive
//! attachment and class-based pair kerning) in lookup list order, and
//! reorders Myanmar syllables into visual order before that.
//!
//! A [`FaceData`] owns the font data; a [`Face`] borrows it with the lookups
//! parsed and can be reused for any number of calls to [`shape`].
//!
//! # Example
//!
//! ```
//! use shaper::{shape, Face, FaceData, ShapingOptions};
//!
//! let mut data = FaceData::new(1000);
//! data.add_glyph('a' as u32, 1, 500).add_glyph('b' as u32, 2, 600);
//! let face = Face::new(&data).unwrap();
//! let glyphs = shape(&face, "ab", &ShapingOptions::default());
//! assert_eq!(glyphs.advance(), 1100);
//! ```

#![forbid(unsafe_code)]

mod apply;
mod buffer;
mod face;
mod gpos;
mod gsub;
pub mod myanmar;
mod plan;

#[cfg(test)]
mod test_data;

use font_types::GlyphId;
use log::trace;

use apply::{apply_lookup, ApplyContext, TableKind};

pub use buffer::{
    glyph_flag, AttachType, Buffer, Direction, GlyphBuffer, GlyphInfo, GlyphPosition,
};
pub use face::{glyph_class, Face, FaceData};
pub use gpos::propagate_attachment_offsets;
pub use plan::{ComplexShaper, Script, ShapePlan, ShapingOptions};

/// Shape `text` with `face`.
///
/// Clusters in the result are character indices into `text`. Glyphs come
/// out in visual order, so right-to-left text starts at its last cluster.
pub fn shape(face: &Face, text: &str, options: &ShapingOptions) -> GlyphBuffer {
    let mut buffer = Buffer::new();
    buffer.push_str(text);
    shape_buffer(face, buffer, options)
}

/// Shape the characters already in `buffer`.
pub fn shape_buffer(face: &Face, mut buffer: Buffer, options: &ShapingOptions) -> GlyphBuffer {
    let plan = ShapePlan::new(options, &buffer);
    trace!("shaping {} characters with {plan:?}", buffer.len());
    buffer.set_direction(plan.direction);
    map_glyphs(face, &mut buffer);

    if plan.shaper == ComplexShaper::Myanmar {
        myanmar::setup_categories(&mut buffer);
        myanmar::find_syllables(&mut buffer);
        if plan.insert_dotted_circle {
            myanmar::insert_dotted_circles(face, &mut buffer);
        }
        myanmar::reorder(&mut buffer);
    }

    substitute(face, &mut buffer, &plan);
    position(face, &mut buffer, &plan);

    if plan.direction.is_backward() {
        reverse_with_attachments(&mut buffer);
    }
    GlyphBuffer(buffer)
}

fn map_glyphs(face: &Face, buffer: &mut Buffer) {
    for info in &mut buffer.info {
        info.glyph_id = face.glyph_id(info.codepoint).unwrap_or(GlyphId::NOTDEF);
        info.glyph_props = face.glyph_props(info.glyph_id, info.codepoint);
    }
}

fn substitute(face: &Face, buffer: &mut Buffer, plan: &ShapePlan) {
    let mut ctx = ApplyContext::new(face, buffer, TableKind::Substitution);
    ctx.optimize_size = plan.optimize_size;
    ctx.per_syllable = plan.per_syllable;
    for index in 0..face.substitution_lookup_count() {
        if let Some(lookup) = face.substitution_lookup(index) {
            apply_lookup(&mut ctx, lookup, gsub::apply_ligature_subst);
        }
    }
}

fn position(face: &Face, buffer: &mut Buffer, plan: &ShapePlan) {
    buffer.clear_positions();
    let upem = face.units_per_em() as i32;
    let horizontal = plan.direction.is_horizontal();
    for (info, pos) in buffer.info.iter().zip(buffer.pos.iter_mut()) {
        if horizontal {
            pos.x_advance = face.advance(info.glyph_id) as i32;
        } else {
            pos.y_advance = -upem;
        }
        // marks take no space; attachment places them
        if info.is_mark() {
            pos.x_advance = 0;
            pos.y_advance = 0;
        }
    }

    let mut ctx = ApplyContext::new(face, buffer, TableKind::Positioning);
    ctx.split_kerning = plan.split_kerning;
    for index in 0..face.position_lookup_count() {
        if let Some(lookup) = face.position_lookup(index) {
            apply_lookup(&mut ctx, lookup, gpos::apply_position_subtable);
        }
    }

    if buffer.has_attachments {
        propagate_attachment_offsets(&mut buffer.pos, buffer.direction);
    }
}

/// Reverse the buffer, keeping attachment parents pointing at the same
/// glyphs.
fn reverse_with_attachments(buffer: &mut Buffer) {
    buffer.reverse();
    let last = buffer.len().saturating_sub(1);
    for pos in &mut buffer.pos {
        pos.attach_parent = pos.attach_parent.map(|parent| last - parent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn glyph_ids(glyphs: &GlyphBuffer) -> Vec<u32> {
        glyphs.glyph_infos().iter().map(|i| i.glyph_id.to_u32()).collect()
    }

    fn clusters(glyphs: &GlyphBuffer) -> Vec<u32> {
        glyphs.glyph_infos().iter().map(|i| i.cluster).collect()
    }

    fn x_advances(glyphs: &GlyphBuffer) -> Vec<i32> {
        glyphs.glyph_positions().iter().map(|p| p.x_advance).collect()
    }

    /// A face with glyphs for `a`..`e` and the ligature and kerning tables
    /// of the test data.
    ///
    /// `a` -> 10, `b` -> 11, `c` -> 12 form ligatures; `d` -> 2 kerns
    /// against `e` -> 5; glyphs 100, 101 and 102 are the ligatures.
    fn face_data() -> FaceData {
        let mut data = FaceData::new(1000);
        data.add_glyph('a' as u32, 10, 500)
            .add_glyph('b' as u32, 11, 500)
            .add_glyph('c' as u32, 12, 500)
            .add_glyph('d' as u32, 2, 600)
            .add_glyph('e' as u32, 5, 400)
            .add_glyph('x' as u32, 40, 300)
            .set_advance(100, 1200)
            .set_advance(101, 900)
            .set_advance(102, 550)
            .set_gsub(test_data::gsub_ligatures(0))
            .set_gpos(test_data::gpos_pair_and_cursive());
        data
    }

    #[test]
    fn ligatures_and_kerning() {
        let _ = env_logger::builder().is_test(true).try_init();
        let data = face_data();
        let face = Face::new(&data).unwrap();
        let glyphs = shape(&face, "abcxde", &ShapingOptions::default());
        assert_eq!(glyph_ids(&glyphs), vec![100, 40, 2, 5]);
        assert_eq!(clusters(&glyphs), vec![0, 3, 4, 5]);
        assert_eq!(x_advances(&glyphs), vec![1200, 300, 540, 400]);
        assert!(glyphs.glyph_infos()[0].is_ligated());
        assert_eq!(glyphs.advance(), 2440);
    }

    #[test]
    fn split_kerning_option() {
        let data = face_data();
        let face = Face::new(&data).unwrap();
        let options = ShapingOptions::default().with_split_kerning(true);
        let glyphs = shape(&face, "de", &options);
        assert_eq!(x_advances(&glyphs), vec![570, 370]);
        assert_eq!(glyphs.glyph_positions()[1].x_offset, -30);
        // the pair still takes the same space
        assert_eq!(glyphs.advance(), 940);
    }

    #[test]
    fn unmapped_characters_get_notdef() {
        let data = face_data();
        let face = Face::new(&data).unwrap();
        let glyphs = shape(&face, "a?", &ShapingOptions::default());
        assert_eq!(glyph_ids(&glyphs), vec![102, 0]);
        assert!(shape(&face, "", &ShapingOptions::default()).is_empty());
    }

    #[test]
    fn right_to_left_is_visual_order() {
        let data = face_data();
        let face = Face::new(&data).unwrap();
        let options = ShapingOptions::default().with_direction(Direction::RightToLeft);
        let glyphs = shape(&face, "abx", &options);
        assert_eq!(glyph_ids(&glyphs), vec![40, 101]);
        assert_eq!(clusters(&glyphs), vec![2, 0]);
        assert_eq!(glyphs.direction(), Direction::RightToLeft);
    }

    #[test]
    fn vertical_advances() {
        let data = face_data();
        let face = Face::new(&data).unwrap();
        let options = ShapingOptions::default().with_direction(Direction::TopToBottom);
        let glyphs = shape(&face, "xx", &options);
        let y: Vec<_> = glyphs.glyph_positions().iter().map(|p| p.y_advance).collect();
        assert_eq!(y, vec![-1000, -1000]);
        assert_eq!(x_advances(&glyphs), vec![0, 0]);
    }

    #[test]
    fn marks_have_no_advance() {
        let mut data = FaceData::new(1000);
        data.add_glyph('a' as u32, 1, 500).add_glyph(0x0301, 2, 200);
        let face = Face::new(&data).unwrap();
        let glyphs = shape(&face, "a\u{301}", &ShapingOptions::default());
        assert_eq!(x_advances(&glyphs), vec![500, 0]);
    }

    #[test]
    fn reversed_attachments_follow_their_glyphs() {
        // glyph 1 exits into glyph 2, which exits into glyph 3
        let mut data = FaceData::new(1000);
        data.add_glyph('p' as u32, 1, 600)
            .add_glyph('q' as u32, 2, 600)
            .add_glyph('r' as u32, 3, 600)
            .set_gpos(test_data::gpos_pair_and_cursive());
        let face = Face::new(&data).unwrap();
        let options = ShapingOptions::default().with_direction(Direction::RightToLeft);
        let glyphs = shape(&face, "pqr", &options);
        assert_eq!(glyph_ids(&glyphs), vec![3, 2, 1]);
        let positions = glyphs.glyph_positions();
        for (i, pos) in positions.iter().enumerate() {
            if let Some(parent) = pos.attach_parent {
                assert_eq!(pos.attach_type, AttachType::Cursive);
                assert_eq!(parent, i + 1);
            }
        }
        assert!(positions[0].attach_parent.is_some());
        assert!(positions[2].attach_parent.is_none());
    }

    #[test]
    fn myanmar_reordering_runs_before_lookups() {
        let mut data = FaceData::new(1000);
        // ka, vowel sign e, dotted circle
        data.add_glyph(0x1000, 1, 600)
            .add_glyph(0x1031, 2, 300)
            .add_glyph(0x25CC, 3, 500);
        let face = Face::new(&data).unwrap();
        let glyphs = shape(&face, "\u{1000}\u{1031}", &ShapingOptions::default());
        assert_eq!(glyph_ids(&glyphs), vec![2, 1]);
        // the pre-base vowel moved before its consonant, so the two share a cluster
        assert_eq!(clusters(&glyphs), vec![0, 0]);

        // a vowel sign with no consonant gets a dotted circle
        let glyphs = shape(&face, "\u{1031}", &ShapingOptions::default());
        assert_eq!(glyph_ids(&glyphs), vec![2, 3]);
        let options = ShapingOptions::default().with_dotted_circle(false);
        let glyphs = shape(&face, "\u{1031}", &options);
        assert_eq!(glyph_ids(&glyphs), vec![2]);
    }
}
