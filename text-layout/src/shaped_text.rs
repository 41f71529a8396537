//! Shaping a string into lines of glyphs.
//!
//! The text is split at font changes and bidi level changes, measured, and
//! broken greedily into lines at whitespace. Each line is then reordered
//! visually and shaped again piece by piece, so glyphs come out left to
//! right across the whole line.

use std::ops::Range;

use font_types::Point;
use log::{debug, trace, warn};
use shaper::{shape, Direction, Face, GlyphBuffer, ShapingOptions};
use smallvec::SmallVec;
use unicode_bidi::{BidiInfo, Level};

use crate::font::Font;
use crate::options::{ShapedTextOptions, TextDirection};
use crate::ranged_values::{MergeEqualItems, RangedValues};
use crate::ranges::{Operations, Ranges};
use crate::MAX_WIDTH_TOLERANCE;

/// One glyph of shaped text, in the text's units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ShapedGlyph {
    pub advance: Point<f32>,
    pub offset: Point<f32>,
    /// Index of the character this glyph stands for.
    pub cluster: i64,
    pub glyph_id: u32,
    unsafe_to_break: bool,
    whitespace: bool,
    newline: bool,
    distance_from_ligature: i8,
}

impl ShapedGlyph {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        glyph_id: u32,
        cluster: i64,
        unsafe_to_break: bool,
        whitespace: bool,
        newline: bool,
        distance_from_ligature: i8,
        advance: Point<f32>,
        offset: Point<f32>,
    ) -> Self {
        ShapedGlyph {
            advance,
            offset,
            cluster,
            glyph_id,
            unsafe_to_break,
            whitespace,
            newline,
            distance_from_ligature,
        }
    }

    pub fn is_unsafe_to_break(&self) -> bool {
        self.unsafe_to_break
    }

    pub fn is_whitespace(&self) -> bool {
        self.whitespace
    }

    pub fn is_newline(&self) -> bool {
        self.newline
    }

    pub fn is_non_ligature(&self) -> bool {
        self.distance_from_ligature == 0
    }

    /// A ligature glyph, followed by one placeholder for each further
    /// character it covers.
    pub fn is_ligature(&self) -> bool {
        self.distance_from_ligature < 0
    }

    /// Stands in for one character of the ligature this many glyphs back.
    /// Placeholders share the ligature's advance but are not drawn.
    pub fn is_placeholder_for_ligature(&self) -> bool {
        self.distance_from_ligature > 0
    }

    pub fn distance_from_ligature(&self) -> i8 {
        self.distance_from_ligature
    }

    pub fn num_trailing_ligature_placeholders(&self) -> i8 {
        -self.distance_from_ligature
    }
}

/// Where the glyphs of a range of text ended up.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GlyphLookupEntry {
    pub glyph_range: Range<i64>,
    pub ltr: bool,
}

/// A run of text with a single font and direction, shaped in one go.
#[derive(Clone, Debug)]
struct Piece {
    range: Range<i64>,
    rtl: bool,
    font: Font,
}

/// Text shaped and broken into lines, with glyphs in visual order.
///
/// Only the first contiguous stretch of the font ranges in the options is
/// laid out; characters outside it produce no glyphs.
#[derive(Clone, Debug, Default)]
pub struct SimpleShapedText {
    text: Vec<char>,
    glyphs_in_visual_order: Vec<ShapedGlyph>,
    line_numbers_for_glyph_ranges: RangedValues<i64>,
    line_text_ranges: Ranges,
    resolved_fonts: RangedValues<Font>,
    glyph_lookup: RangedValues<GlyphLookupEntry>,
}

impl SimpleShapedText {
    pub fn new(text: &str, options: &ShapedTextOptions) -> Self {
        let mut shaped = SimpleShapedText {
            text: text.chars().collect(),
            ..Default::default()
        };
        shaped.shape(text, options);
        debug!(
            "shaped {} characters into {} glyphs on {} lines",
            shaped.text.len(),
            shaped.glyphs_in_visual_order.len(),
            shaped.num_lines()
        );
        shaped
    }

    /// Glyph ranges mapped to the number of the line they are on.
    pub fn line_numbers_for_glyph_ranges(&self) -> &RangedValues<i64> {
        &self.line_numbers_for_glyph_ranges
    }

    /// The text range of each line.
    pub fn line_text_ranges(&self) -> &Ranges {
        &self.line_text_ranges
    }

    /// Glyph ranges mapped to the font they were shaped with.
    pub fn resolved_fonts(&self) -> &RangedValues<Font> {
        &self.resolved_fonts
    }

    /// Text ranges mapped to the glyphs they produced.
    pub fn glyph_lookup(&self) -> &RangedValues<GlyphLookupEntry> {
        &self.glyph_lookup
    }

    /// The characters a glyph stands for.
    ///
    /// A ligature and each of its placeholders cover one character apiece.
    pub fn get_text_range(&self, glyph_index: i64) -> Option<Range<i64>> {
        let (text_range, entry) = self.piece_for_glyph(glyph_index)?;
        let cluster = self.glyph(glyph_index)?.cluster;
        let end = self
            .get_glyphs(entry.glyph_range.clone())
            .iter()
            .map(|glyph| glyph.cluster)
            .filter(|c| *c > cluster)
            .min()
            .unwrap_or(text_range.end);
        Some(cluster..end)
    }

    /// `true` if the glyph belongs to a left-to-right run.
    pub fn is_ltr(&self, glyph_index: i64) -> bool {
        self.piece_for_glyph(glyph_index)
            .is_none_or(|(_, entry)| entry.ltr)
    }

    /// Append the glyph ranges that the characters of `text_range` produced.
    ///
    /// Shaping may produce no glyphs at all for some text, in which case
    /// nothing is appended.
    pub fn get_glyph_ranges(&self, text_range: Range<i64>, out: &mut Vec<Range<i64>>) {
        for item in self.glyph_lookup.get_intersections_with(text_range).iter() {
            let wanted = item.range;
            let mut selected = item.value.glyph_range.clone().filter(|&index| {
                self.get_text_range(index)
                    .is_some_and(|r| r.start < wanted.end && wanted.start < r.end)
            });
            let Some(first) = selected.next() else {
                continue;
            };
            let last = selected.last().unwrap_or(first);
            match out.last_mut() {
                Some(previous) if previous.end == first => previous.end = last + 1,
                _ => out.push(first..last + 1),
            }
        }
    }

    /// The character that logically follows a glyph.
    ///
    /// In a left-to-right run this is the cluster of the next glyph to the
    /// right, and in a right-to-left run the next one to the left. Without
    /// such a glyph it is the first character after the glyph's own cluster.
    pub fn get_text_index_after_glyph(&self, glyph_index: i64) -> Option<i64> {
        let (_, entry) = self.piece_for_glyph(glyph_index)?;
        let cluster = self.glyph(glyph_index)?.cluster;
        let clusters = |range: Range<i64>| {
            self.get_glyphs(range)
                .iter()
                .map(|glyph| glyph.cluster)
                .collect::<Vec<_>>()
        };
        let next = if entry.ltr {
            clusters(glyph_index + 1..entry.glyph_range.end)
                .into_iter()
                .find(|c| *c != cluster)
        } else {
            clusters(entry.glyph_range.start..glyph_index)
                .into_iter()
                .rev()
                .find(|c| *c != cluster)
        };
        match next {
            Some(next) => Some(next),
            None => self.get_text_range(glyph_index).map(|r| r.end),
        }
    }

    pub fn num_lines(&self) -> i64 {
        self.line_numbers_for_glyph_ranges.len() as i64
    }

    pub fn num_glyphs(&self) -> i64 {
        self.glyphs_in_visual_order.len() as i64
    }

    /// The character at the start of a glyph's cluster.
    pub fn get_codepoint(&self, glyph_index: i64) -> Option<char> {
        let cluster = self.glyph(glyph_index)?.cluster;
        usize::try_from(cluster)
            .ok()
            .and_then(|c| self.text.get(c))
            .copied()
    }

    /// The glyphs in `glyph_range`, clamped to the glyphs there are.
    pub fn get_glyphs(&self, glyph_range: Range<i64>) -> &[ShapedGlyph] {
        let len = self.glyphs_in_visual_order.len();
        let clamp = |i: i64| usize::try_from(i).unwrap_or(0).min(len);
        let start = clamp(glyph_range.start);
        let end = clamp(glyph_range.end).max(start);
        &self.glyphs_in_visual_order[start..end]
    }

    pub fn glyphs(&self) -> &[ShapedGlyph] {
        &self.glyphs_in_visual_order
    }

    fn glyph(&self, glyph_index: i64) -> Option<&ShapedGlyph> {
        self.glyphs_in_visual_order
            .get(usize::try_from(glyph_index).ok()?)
    }

    fn piece_for_glyph(&self, glyph_index: i64) -> Option<(Range<i64>, &GlyphLookupEntry)> {
        self.glyph_lookup
            .iter()
            .find(|item| item.value.glyph_range.contains(&glyph_index))
            .map(|item| (item.range, item.value))
    }

    fn is_whitespace(&self, index: i64) -> bool {
        self.char_at(index).is_some_and(char::is_whitespace)
    }

    fn char_at(&self, index: i64) -> Option<char> {
        self.text.get(usize::try_from(index).ok()?).copied()
    }

    fn shape(&mut self, text: &str, options: &ShapedTextOptions) {
        let fonts = first_contiguous_fonts(options.fonts_for_range(), self.text.len() as i64);
        let (Some(first), Some(last)) = (fonts.front(), fonts.back()) else {
            return;
        };
        let extent = first.range.start..last.range.end;

        let byte_offsets: Vec<usize> = text
            .char_indices()
            .map(|(offset, _)| offset)
            .chain(std::iter::once(text.len()))
            .collect();
        let default_level = options.reading_direction().map(|dir| match dir {
            TextDirection::Ltr => Level::ltr(),
            TextDirection::Rtl => Level::rtl(),
        });
        let bidi = BidiInfo::new(text, default_level);
        let levels: Vec<Level> = byte_offsets[..self.text.len()]
            .iter()
            .map(|offset| bidi.levels[*offset])
            .collect();
        let to_char = |byte: usize| byte_offsets.partition_point(|b| *b < byte) as i64;
        let paragraphs: Vec<Range<i64>> = bidi
            .paragraphs
            .iter()
            .map(|para| to_char(para.range.start)..to_char(para.range.end))
            .collect();

        let measure = self.measure(extent.clone(), &levels, &fonts);
        let lines = self.break_lines(extent, &paragraphs, &measure, options);

        let mut ops = Operations::new();
        for (line_number, line) in lines.into_iter().enumerate() {
            trace!("line {line_number}: characters {line:?}");
            let glyph_start = self.num_glyphs();
            for (para_index, para) in bidi.paragraphs.iter().enumerate() {
                let para_chars = &paragraphs[para_index];
                let part = line.start.max(para_chars.start)..line.end.min(para_chars.end);
                if part.is_empty() {
                    continue;
                }
                let byte_range = byte_offsets[part.start as usize]..byte_offsets[part.end as usize];
                let (line_levels, runs) = bidi.visual_runs(para, byte_range);
                for run in runs {
                    let rtl = line_levels[run.start].is_rtl();
                    let run = to_char(run.start)..to_char(run.end);
                    let mut pieces: SmallVec<[Piece; 4]> = fonts
                        .get_intersections_with(run)
                        .iter()
                        .map(|item| Piece {
                            range: item.range,
                            rtl,
                            font: item.value.clone(),
                        })
                        .collect();
                    if rtl {
                        pieces.reverse();
                    }
                    for piece in &pieces {
                        self.append_piece(piece, &mut ops);
                    }
                }
            }
            let glyph_end = self.num_glyphs();
            self.line_numbers_for_glyph_ranges.set(
                glyph_start..glyph_end,
                line_number as i64,
                &mut ops,
                MergeEqualItems::No,
            );
            self.line_text_ranges.set(line, &mut ops);
            ops.clear();
        }
    }

    /// Shape the text in logical order to find how wide each cluster is.
    fn measure(&self, extent: Range<i64>, levels: &[Level], fonts: &RangedValues<Font>) -> Measure {
        let len = self.text.len();
        let mut measure = Measure {
            widths: vec![0.0; len],
            cluster_starts: vec![false; len],
        };
        for item in fonts.get_intersections_with(extent).iter() {
            let mut start = item.range.start;
            for i in item.range.start + 1..=item.range.end {
                if i < item.range.end && levels[i as usize] == levels[start as usize] {
                    continue;
                }
                let piece = Piece {
                    range: start..i,
                    rtl: levels[start as usize].is_rtl(),
                    font: item.value.clone(),
                };
                start = i;
                let Some(buffer) = self.shape_piece(&piece) else {
                    continue;
                };
                let scale = piece.font.scale();
                for (info, pos) in buffer.glyph_infos().iter().zip(buffer.glyph_positions()) {
                    let cluster = (piece.range.start + info.cluster as i64) as usize;
                    measure.cluster_starts[cluster] = true;
                    if !is_hard_break(self.text[cluster]) {
                        measure.widths[cluster] += pos.x_advance as f32 * scale;
                    }
                }
            }
        }
        measure
    }

    /// Greedy line breaking at whitespace, within each paragraph.
    fn break_lines(
        &self,
        extent: Range<i64>,
        paragraphs: &[Range<i64>],
        measure: &Measure,
        options: &ShapedTextOptions,
    ) -> Vec<Range<i64>> {
        let mut lines: Vec<Range<i64>> = Vec::new();
        let trailing_should_fit = options.trailing_whitespaces_should_fit();
        for para in paragraphs {
            let para = para.start.max(extent.start)..para.end.min(extent.end);
            if para.is_empty() {
                continue;
            }
            let Some(max_width) = options.max_width() else {
                lines.push(para);
                continue;
            };
            let mut line_start = para.start;
            let mut line_width = 0.0;
            let mut i = para.start;
            while i < para.end {
                let content_end = (i..para.end)
                    .find(|k| self.is_whitespace(*k))
                    .unwrap_or(para.end);
                let word_end = (content_end..para.end)
                    .find(|k| !self.is_whitespace(*k))
                    .unwrap_or(para.end);
                let word_width = measure.width(i..word_end);
                let word_fit = if trailing_should_fit {
                    word_width
                } else {
                    measure.width(i..content_end)
                };
                let available = match lines.is_empty() {
                    true => max_width - options.first_line_indent(),
                    false => max_width,
                };

                if line_width + word_fit <= available + MAX_WIDTH_TOLERANCE {
                    line_width += word_width;
                    i = word_end;
                    continue;
                }
                if i > line_start {
                    lines.push(line_start..i);
                    line_start = i;
                    line_width = 0.0;
                    continue;
                }
                if options.allow_breaking_inside_word() {
                    let mut end = i;
                    let mut width = 0.0;
                    while end < content_end {
                        let next = measure.next_cluster_start(end, content_end);
                        let cluster_width = measure.width(end..next);
                        if end > i && width + cluster_width > available + MAX_WIDTH_TOLERANCE {
                            break;
                        }
                        width += cluster_width;
                        end = next;
                    }
                    if end < content_end {
                        lines.push(line_start..end);
                        line_start = end;
                        line_width = 0.0;
                        i = end;
                        continue;
                    }
                }
                // a word too long for any line gets one of its own
                line_width += word_width;
                i = word_end;
            }
            if line_start < para.end {
                lines.push(line_start..para.end);
            }
        }

        let max_lines = usize::try_from(options.max_num_lines().max(1)).unwrap_or(usize::MAX);
        if lines.len() > max_lines {
            let end = lines.last().map(|line| line.end).unwrap_or_default();
            lines.truncate(max_lines);
            if let Some(last) = lines.last_mut() {
                last.end = end;
            }
        }
        lines
    }

    fn shape_piece(&self, piece: &Piece) -> Option<GlyphBuffer> {
        let face = match Face::new(piece.font.face()) {
            Ok(face) => face,
            Err(e) => {
                warn!("skipping characters {:?}: {e}", piece.range);
                return None;
            }
        };
        let text: String = self.text[piece.range.start as usize..piece.range.end as usize]
            .iter()
            .collect();
        let direction = match piece.rtl {
            true => Direction::RightToLeft,
            false => Direction::LeftToRight,
        };
        Some(shape(
            &face,
            &text,
            &ShapingOptions::new().with_direction(direction),
        ))
    }

    /// Shape a piece of a line and append its glyphs.
    ///
    /// A ligature covering several characters is followed by a placeholder
    /// for each of the others, and the ligature's advance is shared evenly
    /// between them. Clusters increase from left to right in left-to-right
    /// pieces and decrease in right-to-left ones.
    fn append_piece(&mut self, piece: &Piece, ops: &mut Operations) {
        let glyph_start = self.num_glyphs();
        if let Some(buffer) = self.shape_piece(piece) {
            let scale = piece.font.scale();
            let piece_len = piece.range.end - piece.range.start;
            let mut sorted_clusters: Vec<u32> =
                buffer.glyph_infos().iter().map(|info| info.cluster).collect();
            sorted_clusters.sort_unstable();

            for (info, pos) in buffer.glyph_infos().iter().zip(buffer.glyph_positions()) {
                let first = sorted_clusters.partition_point(|c| *c < info.cluster);
                let beyond = sorted_clusters.partition_point(|c| *c <= info.cluster);
                let span = match sorted_clusters.get(beyond) {
                    Some(next) => (*next - info.cluster) as i64,
                    None => piece_len - info.cluster as i64,
                };
                let placeholders = if info.is_ligated() && beyond - first == 1 {
                    (span - 1).clamp(0, i8::MAX as i64)
                } else {
                    0
                };

                let cluster = piece.range.start + info.cluster as i64;
                let newline = self.char_at(cluster).is_some_and(is_hard_break);
                let advance = match newline {
                    true => Point::default(),
                    false => Point::new(pos.x_advance as f32, pos.y_advance as f32) * scale,
                };
                let share = advance * (1.0 / (placeholders + 1) as f32);
                let offset = Point::new(pos.x_offset as f32, -pos.y_offset as f32) * scale;
                let glyph_id = info.glyph_id.to_u32();

                let lead_cluster = if piece.rtl {
                    cluster + placeholders
                } else {
                    cluster
                };
                self.glyphs_in_visual_order.push(ShapedGlyph::new(
                    glyph_id,
                    lead_cluster,
                    info.unsafe_to_break(),
                    self.is_whitespace(lead_cluster),
                    newline,
                    -(placeholders as i8),
                    share,
                    offset,
                ));
                for k in 1..=placeholders {
                    let placeholder_cluster = if piece.rtl {
                        cluster + placeholders - k
                    } else {
                        cluster + k
                    };
                    self.glyphs_in_visual_order.push(ShapedGlyph::new(
                        glyph_id,
                        placeholder_cluster,
                        info.unsafe_to_break(),
                        self.is_whitespace(placeholder_cluster),
                        false,
                        k as i8,
                        share,
                        Point::default(),
                    ));
                }
            }
        }
        let glyph_end = self.num_glyphs();
        self.glyph_lookup.set(
            piece.range.clone(),
            GlyphLookupEntry {
                glyph_range: glyph_start..glyph_end,
                ltr: !piece.rtl,
            },
            ops,
            MergeEqualItems::No,
        );
        self.resolved_fonts.set(
            glyph_start..glyph_end,
            piece.font.clone(),
            ops,
            MergeEqualItems::Yes,
        );
    }
}

/// Per character widths from the measuring pass.
struct Measure {
    /// The advance of each cluster, stored at its first character.
    widths: Vec<f32>,
    cluster_starts: Vec<bool>,
}

impl Measure {
    fn width(&self, range: Range<i64>) -> f32 {
        self.widths[range.start as usize..range.end as usize]
            .iter()
            .sum()
    }

    fn next_cluster_start(&self, after: i64, limit: i64) -> i64 {
        (after + 1..limit)
            .find(|i| self.cluster_starts[*i as usize])
            .unwrap_or(limit)
    }
}

fn is_hard_break(c: char) -> bool {
    c == '\n'
}

/// The font ranges over `0..text_len`, up to the first gap.
fn first_contiguous_fonts(fonts: &RangedValues<Font>, text_len: i64) -> RangedValues<Font> {
    let mut result = fonts.get_intersections_with(0..text_len);
    let gap = result
        .iter()
        .zip(result.iter().skip(1))
        .find(|(a, b)| a.range.end != b.range.start)
        .map(|(_, b)| b.range.start);
    if let Some(gap) = gap {
        let mut ops = Operations::new();
        result.erase_from(gap, &mut ops);
    }
    result
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shaper::FaceData;
    use std::sync::Arc;

    pub(crate) const LIGATURE_GLYPH: u32 = 200;

    /// A GSUB table with a single lookup ligating `f i`.
    fn fi_ligature(f: u16, i: u16, ligature: u16) -> Vec<u8> {
        let words: [u16; 25] = [
            // header: version 1.0, script, feature and lookup list offsets
            1, 0, 10, 12, 14, // empty script and feature lists
            0, 0, // lookup list with one lookup
            1, 4, // ligature lookup, one subtable
            4, 0, 1, 8, // format 1, coverage, one ligature set
            1, 8, 1, 14, // coverage
            1, 1, f, // ligature set
            1, 4, // the ligature
            ligature, 2, i,
        ];
        words.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    /// Latin letters 100 units wide, a 50 unit space, Hebrew letters 100
    /// wide and an `fi` ligature 180 wide; one unit per font unit.
    pub(crate) fn test_font() -> Font {
        let mut face = FaceData::new(1000);
        face.set_metrics(800, -200);
        for (i, c) in ('a'..='z').enumerate() {
            face.add_glyph(c as u32, 1 + i as u32, 100);
        }
        for (i, c) in ('\u{05D0}'..='\u{05EA}').enumerate() {
            face.add_glyph(c as u32, 40 + i as u32, 100);
        }
        face.add_glyph(' ' as u32, 30, 50)
            .add_glyph('\n' as u32, 31, 50)
            .add_glyph('\u{2026}' as u32, 32, 150)
            .set_advance(LIGATURE_GLYPH, 180)
            .set_gsub(fi_ligature(6, 9, LIGATURE_GLYPH as u16));
        Font::new(Arc::new(face), 1000.0)
    }

    pub(crate) fn options() -> ShapedTextOptions {
        ShapedTextOptions::new().with_font(test_font())
    }

    fn clusters(shaped: &SimpleShapedText) -> Vec<i64> {
        shaped.glyphs().iter().map(|g| g.cluster).collect()
    }

    fn lines(shaped: &SimpleShapedText) -> Vec<Range<i64>> {
        shaped.line_text_ranges().iter().collect()
    }

    #[test]
    fn single_line() {
        let _ = env_logger::builder().is_test(true).try_init();
        let shaped = SimpleShapedText::new("hello", &options());
        assert_eq!(shaped.num_glyphs(), 5);
        assert_eq!(shaped.num_lines(), 1);
        assert_eq!(clusters(&shaped), vec![0, 1, 2, 3, 4]);
        assert_eq!(shaped.glyphs()[0].glyph_id, 8);
        assert_eq!(shaped.glyphs()[0].advance, Point::new(100.0, 0.0));
        assert_eq!(shaped.get_codepoint(1), Some('e'));
        assert!(shaped.is_ltr(0));
        assert_eq!(shaped.resolved_fonts().len(), 1);
    }

    #[test]
    fn text_index_after_glyph_left_to_right() {
        let shaped = SimpleShapedText::new("hello", &options());
        assert_eq!(shaped.get_text_index_after_glyph(0), Some(1));
        assert_eq!(shaped.get_text_index_after_glyph(3), Some(4));
        // nothing to the right: one past the last cluster
        assert_eq!(shaped.get_text_index_after_glyph(4), Some(5));
        assert_eq!(shaped.get_text_index_after_glyph(5), None);
    }

    #[test]
    fn text_index_after_glyph_right_to_left() {
        let shaped = SimpleShapedText::new("\u{05D0}\u{05D1}\u{05D2}", &options());
        // visual order is the reverse of logical order
        assert_eq!(clusters(&shaped), vec![2, 1, 0]);
        assert!(!shaped.is_ltr(0));
        // the character after each glyph is the cluster to its left
        assert_eq!(shaped.get_text_index_after_glyph(2), Some(1));
        assert_eq!(shaped.get_text_index_after_glyph(1), Some(2));
        // the leftmost glyph has nothing to its left
        assert_eq!(shaped.get_text_index_after_glyph(0), Some(3));
    }

    #[test]
    fn mixed_directions() {
        let shaped = SimpleShapedText::new("ab \u{05D0}\u{05D1} cd", &options());
        assert_eq!(shaped.num_lines(), 1);
        assert_eq!(clusters(&shaped), vec![0, 1, 2, 4, 3, 5, 6, 7]);
        assert!(shaped.is_ltr(0));
        assert!(!shaped.is_ltr(3));
        assert!(shaped.is_ltr(5));
        assert_eq!(shaped.get_text_index_after_glyph(4), Some(4));
        assert_eq!(shaped.get_text_index_after_glyph(3), Some(5));

        let mut ranges = Vec::new();
        shaped.get_glyph_ranges(3..5, &mut ranges);
        assert_eq!(ranges, vec![3..5]);
        ranges.clear();
        shaped.get_glyph_ranges(1..4, &mut ranges);
        assert_eq!(ranges, vec![1..3, 4..5]);
    }

    #[test]
    fn ligature_placeholders() {
        let shaped = SimpleShapedText::new("fix", &options());
        let glyphs = shaped.glyphs();
        assert_eq!(glyphs.len(), 3);
        assert!(glyphs[0].is_ligature());
        assert_eq!(glyphs[0].glyph_id, LIGATURE_GLYPH);
        assert_eq!(glyphs[0].num_trailing_ligature_placeholders(), 1);
        assert!(glyphs[1].is_placeholder_for_ligature());
        assert_eq!(glyphs[1].distance_from_ligature(), 1);
        assert!(glyphs[2].is_non_ligature());
        assert_eq!(clusters(&shaped), vec![0, 1, 2]);
        assert_eq!(glyphs[0].advance.x, 90.0);
        assert_eq!(glyphs[1].advance.x, 90.0);
        assert_eq!(shaped.get_text_range(0), Some(0..1));
        assert_eq!(shaped.get_text_index_after_glyph(0), Some(1));
    }

    #[test]
    fn explicit_paragraph_direction() {
        let options = options().with_reading_direction(Some(TextDirection::Rtl));
        let shaped = SimpleShapedText::new("\u{05D0}", &options);
        assert_eq!(shaped.num_glyphs(), 1);
        // an explicit paragraph direction does not change left-to-right runs
        let shaped = SimpleShapedText::new("fi", &options);
        assert_eq!(clusters(&shaped), vec![0, 1]);
        assert!(shaped.is_ltr(0));
    }

    #[test]
    fn wraps_at_whitespace() {
        let options = options().with_max_width(500.0);
        // "aaa " is 350 wide, "bbb " 350 and "ccc" 300
        let shaped = SimpleShapedText::new("aaa bbb ccc", &options);
        assert_eq!(lines(&shaped), vec![0..4, 4..8, 8..11]);
        assert_eq!(shaped.num_lines(), 3);
        let line_numbers: Vec<_> = shaped
            .line_numbers_for_glyph_ranges()
            .iter()
            .map(|item| (item.range, *item.value))
            .collect();
        assert_eq!(line_numbers, vec![(0..4, 0), (4..8, 1), (8..11, 2)]);
    }

    #[test]
    fn trailing_whitespace_may_overhang() {
        let options = options().with_max_width(450.0);
        // "aa " and "bb " are 250 wide; the second only fits without its space
        let shaped = SimpleShapedText::new("aa bb ", &options);
        assert_eq!(lines(&shaped), vec![0..3, 3..6]);
        let options = options.with_trailing_whitespaces_should_fit(false);
        let shaped = SimpleShapedText::new("aa bb ", &options);
        assert_eq!(lines(&shaped), vec![0..6]);
    }

    #[test]
    fn long_words() {
        let shaped = SimpleShapedText::new("abcdefg hi", &options().with_max_width(300.0));
        assert_eq!(lines(&shaped), vec![0..8, 8..10]);
        let options = options()
            .with_max_width(300.0)
            .with_allow_breaking_inside_word(true);
        let shaped = SimpleShapedText::new("abcdefg hi", &options);
        assert_eq!(lines(&shaped), vec![0..3, 3..6, 6..8, 8..10]);
    }

    #[test]
    fn hard_breaks_and_max_lines() {
        let shaped = SimpleShapedText::new("ab\ncd\nef", &options());
        assert_eq!(lines(&shaped), vec![0..3, 3..6, 6..8]);
        assert!(shaped.glyphs()[2].is_newline());
        assert_eq!(shaped.glyphs()[2].advance.x, 0.0);

        let shaped = SimpleShapedText::new("ab\ncd\nef", &options().with_max_num_lines(2));
        assert_eq!(lines(&shaped), vec![0..3, 3..8]);
    }

    #[test]
    fn first_line_indent() {
        // "aaa bbb" is 650 wide
        let options = options().with_max_width(700.0);
        let shaped = SimpleShapedText::new("aaa bbb", &options);
        assert_eq!(lines(&shaped), vec![0..7]);
        let shaped = SimpleShapedText::new("aaa bbb", &options.with_first_line_indent(200.0));
        assert_eq!(lines(&shaped), vec![0..4, 4..7]);
    }

    #[test]
    fn fonts_per_range() {
        let font = test_font();
        let big = font.with_size(2000.0);
        let mut fonts = RangedValues::new();
        let mut ops = Operations::new();
        fonts.set(0..2, font.clone(), &mut ops, MergeEqualItems::Yes);
        fonts.set(2..4, big.clone(), &mut ops, MergeEqualItems::Yes);
        // a gap: the rest of the text is not laid out
        fonts.set(5..10, font, &mut ops, MergeEqualItems::Yes);
        let shaped = SimpleShapedText::new("abcdefg", &options().with_fonts(fonts));
        assert_eq!(shaped.num_glyphs(), 4);
        assert_eq!(shaped.glyphs()[2].advance.x, 200.0);
        let resolved: Vec<_> = shaped
            .resolved_fonts()
            .iter()
            .map(|item| (item.range, item.value.size()))
            .collect();
        assert_eq!(resolved, vec![(0..2, 1000.0), (2..4, 2000.0)]);

        let mut ranges = Vec::new();
        shaped.get_glyph_ranges(4..7, &mut ranges);
        assert!(ranges.is_empty());
    }

    #[test]
    fn empty_text() {
        let shaped = SimpleShapedText::new("", &options());
        assert_eq!(shaped.num_glyphs(), 0);
        assert_eq!(shaped.num_lines(), 0);
        assert!(shaped.line_text_ranges().is_empty());
    }
}
