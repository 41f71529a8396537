//! Placing the lines of shaped text.
//!
//! Every line gets an anchor on its baseline from the justification, and
//! justified lines get extra space added to the whitespace between their
//! words. When the last line is too long it is cut short, optionally with an
//! ellipsis drawn in place of what was cut.

use std::ops::Range;

use font_types::Point;
use log::trace;

use crate::font::Font;
use crate::options::{Justification, ShapedTextOptions};
use crate::ranged_values::{Item, MergeEqualItems, RangedValues};
use crate::ranges::Operations;
use crate::shaped_text::{ShapedGlyph, SimpleShapedText};
use crate::MAX_WIDTH_TOLERANCE;

/// Where a line sits and how much space it takes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LineMetrics {
    pub line_number: i64,
    /// The left end of the line's baseline.
    pub anchor: Point<f32>,
    pub max_ascent: f32,
    pub max_descent: f32,
    /// Length of the line including any whitespace stretch.
    pub effective_line_length: f32,
    pub top: f32,
    pub next_line_top: f32,
}

/// Whether a glyph range is drawn from the text or replaced by the
/// ellipsis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DrawType {
    #[default]
    Normal,
    Ellipsis,
}

/// The pen position of a glyph and the extent of its line around it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct GlyphAnchor {
    pub anchor: Point<f32>,
    pub max_ascent: f32,
    pub max_descent: f32,
}

/// An axis aligned rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x_min: f32,
    pub y_min: f32,
    pub x_max: f32,
    pub y_max: f32,
}

/// Glyphs of one font with their final positions, ready to draw.
#[derive(Clone, Debug, PartialEq)]
pub struct GlyphRun {
    pub font: Font,
    pub glyph_ids: Vec<u32>,
    pub positions: Vec<Point<f32>>,
    pub draw_type: DrawType,
}

#[derive(Clone, Copy, Debug, Default)]
struct LineLength {
    total: f32,
    without_trailing_whitespaces: f32,
}

impl LineLength {
    fn of(glyphs: &[ShapedGlyph]) -> Self {
        let total = glyphs.iter().map(|g| g.advance.x).sum::<f32>();
        let trailing = glyphs
            .iter()
            .rev()
            .take_while(|g| g.is_whitespace())
            .map(|g| g.advance.x)
            .sum::<f32>();
        LineLength {
            total,
            without_trailing_whitespaces: total - trailing,
        }
    }

    fn effective(self, trailing_whitespaces_should_fit: bool) -> f32 {
        match trailing_whitespaces_should_fit {
            true => self.total,
            false => self.without_trailing_whitespaces,
        }
    }
}

#[derive(Clone, Debug, Default)]
struct MainAxisLineAlignment {
    anchor: f32,
    extra_whitespace_advance: f32,
    effective_line_length: f32,
    /// Relative to the start of the line.
    stretchable_whitespaces: Range<i64>,
}

fn main_axis_line_alignment(
    justification: Justification,
    glyphs: &[ShapedGlyph],
    line_length: LineLength,
    max_width: Option<f32>,
    alignment_width: Option<f32>,
    trailing_whitespaces_should_fit: bool,
) -> MainAxisLineAlignment {
    let effective_line_length = line_length.effective(trailing_whitespaces_should_fit);
    let width = alignment_width.or(max_width).unwrap_or(0.0);
    let too_long = width + MAX_WIDTH_TOLERANCE < effective_line_length;
    let mut result = MainAxisLineAlignment {
        effective_line_length,
        ..Default::default()
    };

    // with an alignment width nothing is cut off, so overlong lines stay put
    if too_long && alignment_width.is_some() {
        return result;
    }

    result.anchor = if too_long {
        let approximately_ltr = match (glyphs.first(), glyphs.last()) {
            (Some(first), Some(last)) => first.cluster <= last.cluster,
            _ => true,
        };
        // the logical end of right-to-left text is what falls outside
        match approximately_ltr {
            true => 0.0,
            false => width - effective_line_length,
        }
    } else if justification.test_flags(Justification::HORIZONTALLY_CENTRED) {
        (width - line_length.without_trailing_whitespaces) / 2.0
    } else if justification.test_flags(Justification::RIGHT) {
        width - effective_line_length
    } else {
        0.0
    };

    if justification.test_flags(Justification::HORIZONTALLY_JUSTIFIED) && !too_long {
        let leading = glyphs.iter().take_while(|g| g.is_whitespace()).count();
        let trailing = glyphs.iter().rev().take_while(|g| g.is_whitespace()).count();
        let total = glyphs.iter().filter(|g| g.is_whitespace()).count();
        let between_words = total.saturating_sub(leading + trailing);
        let trailing_start = glyphs.len().saturating_sub(trailing).max(leading);
        result.stretchable_whitespaces = leading as i64..trailing_start as i64;
        if between_words > 0 {
            result.extra_whitespace_advance =
                (width - effective_line_length) / between_words as f32;
        }
    }
    result
}

#[derive(Clone, Debug, Default)]
struct LineInfo {
    line_height: f32,
    max_ascent: f32,
    alignment: MainAxisLineAlignment,
}

fn cross_axis_starting_anchor(
    justification: Justification,
    line_infos: &[LineInfo],
    height: Option<f32>,
    leading: f32,
) -> f32 {
    let (Some(first), Some(last)) = (line_infos.first(), line_infos.last()) else {
        return 0.0;
    };
    let minimum_top = first.max_ascent + first.line_height * leading;
    let Some(height) = height else {
        return minimum_top;
    };
    let text_height = line_infos.iter().map(|info| info.line_height).sum::<f32>();
    if justification.test_flags(Justification::VERTICALLY_CENTRED) {
        (height - text_height) / 2.0 + first.max_ascent
    } else if justification.test_flags(Justification::BOTTOM) {
        let bottom_leading = 0.5 * last.line_height * leading;
        height - text_height - bottom_leading + first.max_ascent
    } else {
        minimum_top
    }
}

/// How the last line was cut short.
#[derive(Clone, Debug)]
struct Truncation {
    /// The glyphs of the last line that are still drawn.
    visible: Range<i64>,
    cutoff_at_front: bool,
    ellipsis_width: f32,
}

/// Pen positions along one line.
struct LinePens {
    /// The x of each glyph of the line, plus the end of the line.
    xs: Vec<f32>,
    ellipsis_x: Option<f32>,
}

/// [`SimpleShapedText`] placed in a box.
#[derive(Clone, Debug)]
pub struct JustifiedText<'a> {
    shaped_text: &'a SimpleShapedText,
    line_metrics_for_glyph_range: RangedValues<LineMetrics>,
    whitespace_stretch: RangedValues<f32>,
    ranges_to_draw: RangedValues<DrawType>,
    minimum_required_widths_for_line: Vec<f32>,
    ellipsis: Option<SimpleShapedText>,
    truncation: Option<Truncation>,
}

impl<'a> JustifiedText<'a> {
    pub fn new(shaped_text: &'a SimpleShapedText, options: &ShapedTextOptions) -> Self {
        let mut justified = JustifiedText {
            shaped_text,
            line_metrics_for_glyph_range: RangedValues::new(),
            whitespace_stretch: RangedValues::new(),
            ranges_to_draw: RangedValues::new(),
            minimum_required_widths_for_line: Vec::new(),
            ellipsis: None,
            truncation: None,
        };
        justified.place_lines(options);
        justified.truncate_last_line(options);
        justified
    }

    fn place_lines(&mut self, options: &ShapedTextOptions) {
        let shaped = self.shaped_text;
        let leading = options.leading() - 1.0;
        let trailing_should_fit = options.trailing_whitespaces_should_fit();
        let lines = shaped.line_numbers_for_glyph_ranges();
        let last_line_number = lines.back().map(|item| *item.value);

        let mut line_infos = Vec::with_capacity(lines.len());
        for item in lines.iter() {
            let range = item.range;
            let fonts = shaped.resolved_fonts().get_intersections_with(range.clone());
            let line_height = fonts.values().iter().map(Font::height).fold(0.0, f32::max);
            let max_ascent = fonts.values().iter().map(Font::ascent).fold(0.0, f32::max);
            let glyphs = shaped.get_glyphs(range.clone());
            let line_length = LineLength::of(glyphs);
            let mut alignment = main_axis_line_alignment(
                options.justification(),
                glyphs,
                line_length,
                options.max_width(),
                options.alignment_width(),
                trailing_should_fit,
            );
            let contains_hard_break = shaped.get_codepoint(range.end - 1) == Some('\n')
                || shaped.get_codepoint(range.start) == Some('\n');
            if contains_hard_break || Some(*item.value) == last_line_number {
                alignment.extra_whitespace_advance = 0.0;
                alignment.stretchable_whitespaces = 0..0;
            }
            line_infos.push(LineInfo {
                line_height,
                max_ascent,
                alignment,
            });
            self.minimum_required_widths_for_line
                .push(line_length.effective(trailing_should_fit));
        }

        let mut baseline = match options.is_baseline_at_zero() {
            true => 0.0,
            false => cross_axis_starting_anchor(
                options.justification(),
                &line_infos,
                options.height(),
                leading,
            ),
        };
        let mut ops = Operations::new();
        let mut top = None;
        for (index, (item, info)) in lines.iter().zip(&line_infos).enumerate() {
            let range = item.range;
            let max_descent = info.line_height - info.max_ascent;
            let next_line_top =
                baseline + (1.0 + leading) * max_descent + options.additive_line_spacing();
            let line_top = *top.get_or_insert(baseline - (1.0 + leading) * info.max_ascent);
            let stretch = &info.alignment.stretchable_whitespaces;
            let stretch = stretch.start + range.start..stretch.end + range.start;
            let num_stretched = shaped
                .get_glyphs(stretch.clone())
                .iter()
                .filter(|g| g.is_whitespace())
                .count();
            let metrics = LineMetrics {
                line_number: *item.value,
                anchor: Point::new(info.alignment.anchor, baseline),
                max_ascent: info.max_ascent,
                max_descent,
                effective_line_length: info.alignment.effective_line_length
                    + info.alignment.extra_whitespace_advance * num_stretched as f32,
                top: line_top,
                next_line_top,
            };
            trace!("line {}: {metrics:?}", metrics.line_number);
            self.line_metrics_for_glyph_range.set(
                range.clone(),
                metrics,
                &mut ops,
                MergeEqualItems::No,
            );
            self.whitespace_stretch
                .set(range, 0.0, &mut ops, MergeEqualItems::Yes);
            self.whitespace_stretch.set(
                stretch,
                info.alignment.extra_whitespace_advance,
                &mut ops,
                MergeEqualItems::Yes,
            );
            ops.clear();

            let next_max_ascent = line_infos.get(index + 1).map_or(0.0, |i| i.max_ascent);
            baseline = next_line_top + (1.0 + leading) * next_max_ascent;
            top = Some(next_line_top);
        }

        self.ranges_to_draw.set(
            0..shaped.num_glyphs(),
            DrawType::Normal,
            &mut ops,
            MergeEqualItems::Yes,
        );
    }

    /// Cut the last line short if it does not fit the maximum width.
    ///
    /// Lines only overflow when breaking was limited to a number of lines
    /// or a word could not be broken.
    fn truncate_last_line(&mut self, options: &ShapedTextOptions) {
        let shaped = self.shaped_text;
        let Some(max_width) = options.max_width() else {
            return;
        };
        let Some(last) = self.line_metrics_for_glyph_range.back() else {
            return;
        };
        let (line_range, mut metrics) = (last.range, *last.value);
        let glyphs = shaped.get_glyphs(line_range.clone());
        let lengths = LineLength::of(glyphs);
        let trailing_should_fit = options.trailing_whitespaces_should_fit();
        if lengths.effective(trailing_should_fit) <= max_width + MAX_WIDTH_TOLERANCE {
            return;
        }

        let cutoff_at_front = metrics.anchor.x < -MAX_WIDTH_TOLERANCE;
        let visible_range = |ellipsis_width: f32| -> Range<i64> {
            let len = glyphs.len() as i64;
            let mut length = lengths.total;
            let visible = if cutoff_at_front {
                glyphs
                    .iter()
                    .enumerate()
                    .find_map(|(i, glyph)| {
                        length -= glyph.advance.x;
                        (max_width >= ellipsis_width + length).then_some(i as i64 + 1..len)
                    })
                    .unwrap_or(len..len)
            } else {
                glyphs
                    .iter()
                    .enumerate()
                    .rev()
                    .find_map(|(i, glyph)| {
                        length -= glyph.advance.x;
                        (max_width >= ellipsis_width + length).then_some(0..i as i64)
                    })
                    .unwrap_or(0..0)
            };
            visible.start + line_range.start..visible.end + line_range.start
        };

        let mut ops = Operations::new();
        let mut visible = visible_range(0.0);
        self.ranges_to_draw.erase_from(line_range.start, &mut ops);
        self.ranges_to_draw
            .set(visible.clone(), DrawType::Normal, &mut ops, MergeEqualItems::Yes);
        ops.clear();

        if options.ellipsis().is_empty() {
            self.truncation = Some(Truncation {
                visible,
                cutoff_at_front,
                ellipsis_width: 0.0,
            });
            return;
        }

        let fonts = shaped.resolved_fonts().get_intersections_with(line_range.clone());
        let font = match cutoff_at_front {
            true => fonts.front(),
            false => fonts.back(),
        }
        .map(|item| item.value.clone())
        .unwrap_or_default();
        let ellipsis = SimpleShapedText::new(
            options.ellipsis(),
            &ShapedTextOptions::new().with_font(font),
        );
        let ellipsis_width =
            LineLength::of(ellipsis.glyphs()).effective(trailing_should_fit);
        visible = visible_range(ellipsis_width);

        self.ranges_to_draw.erase_from(line_range.start, &mut ops);
        self.ranges_to_draw
            .set(visible.clone(), DrawType::Normal, &mut ops, MergeEqualItems::Yes);
        let ellipsis_index = match cutoff_at_front {
            true => visible.start - 1,
            false => visible.end,
        };
        self.ranges_to_draw.set(
            ellipsis_index..ellipsis_index + 1,
            DrawType::Ellipsis,
            &mut ops,
            MergeEqualItems::Yes,
        );
        ops.clear();

        let visible_glyphs = shaped.get_glyphs(visible.clone());
        let line_with_ellipsis: Vec<ShapedGlyph> = match cutoff_at_front {
            true => ellipsis.glyphs().iter().chain(visible_glyphs).copied().collect(),
            false => visible_glyphs.iter().chain(ellipsis.glyphs()).copied().collect(),
        };
        let realigned = main_axis_line_alignment(
            options.justification(),
            &line_with_ellipsis,
            LineLength::of(&line_with_ellipsis),
            options.max_width(),
            options.alignment_width(),
            trailing_should_fit,
        );
        metrics.anchor.x = realigned.anchor;
        self.line_metrics_for_glyph_range
            .set(line_range.clone(), metrics, &mut ops, MergeEqualItems::No);

        // stretch indices count the ellipsis glyphs when they come first
        let skipped = match cutoff_at_front {
            true => ellipsis.num_glyphs(),
            false => 0,
        };
        let stretch = &realigned.stretchable_whitespaces;
        let stretch = (stretch.start - skipped).max(0) + visible.start
            ..(stretch.end - skipped).max(0) + visible.start;
        self.whitespace_stretch
            .set(line_range, 0.0, &mut ops, MergeEqualItems::Yes);
        self.whitespace_stretch.set(
            stretch,
            realigned.extra_whitespace_advance,
            &mut ops,
            MergeEqualItems::Yes,
        );

        self.truncation = Some(Truncation {
            visible,
            cutoff_at_front,
            ellipsis_width,
        });
        self.ellipsis = Some(ellipsis);
    }

    pub fn line_metrics_for_glyph_range(&self) -> &RangedValues<LineMetrics> {
        &self.line_metrics_for_glyph_range
    }

    pub fn whitespace_stretch(&self) -> &RangedValues<f32> {
        &self.whitespace_stretch
    }

    pub fn ranges_to_draw(&self) -> &RangedValues<DrawType> {
        &self.ranges_to_draw
    }

    /// How wide each line needs to be to fit without breaking.
    pub fn minimum_required_widths_for_line(&self) -> &[f32] {
        &self.minimum_required_widths_for_line
    }

    /// The shaped ellipsis, if the last line was cut short and one was
    /// requested.
    pub fn ellipsis(&self) -> Option<&SimpleShapedText> {
        self.ellipsis.as_ref()
    }

    fn stretched_advance(&self, index: i64, glyph: &ShapedGlyph) -> f32 {
        let stretch = match glyph.is_whitespace() {
            true => self
                .whitespace_stretch
                .get_item_with_enclosing_range(index)
                .map_or(0.0, |item| *item.value),
            false => 0.0,
        };
        glyph.advance.x + stretch
    }

    fn line_pens(&self, line: &Item<LineMetrics>) -> LinePens {
        let glyphs = self.shaped_text.get_glyphs(line.range.clone());
        let truncation = self
            .truncation
            .as_ref()
            .filter(|t| line.range.contains(&t.visible.start) || line.range.end == t.visible.start);
        let mut x = line.value.anchor.x;
        let mut xs = Vec::with_capacity(glyphs.len() + 1);
        let mut ellipsis_x = None;
        for (index, glyph) in line.range.clone().zip(glyphs) {
            if let Some(t) = truncation.filter(|t| t.ellipsis_width > 0.0) {
                if t.cutoff_at_front && index < t.visible.start {
                    // cut glyphs collapse onto the ellipsis
                    ellipsis_x = Some(line.value.anchor.x);
                    xs.push(line.value.anchor.x);
                    if index + 1 == t.visible.start {
                        x = line.value.anchor.x + t.ellipsis_width;
                    }
                    continue;
                }
                if !t.cutoff_at_front && index == t.visible.end {
                    ellipsis_x = Some(x);
                }
            }
            xs.push(x);
            x += self.stretched_advance(index, glyph);
        }
        xs.push(x);
        LinePens { xs, ellipsis_x }
    }

    /// The index of the glyph whose left half is to the right of `point`.
    ///
    /// Points below the last line give zero.
    pub fn get_glyph_index_to_the_right_of(&self, point: Point<f32>) -> i64 {
        let mut line_top = 0.0;
        let line = self.line_metrics_for_glyph_range.iter().find(|item| {
            let next_line_top = item.value.next_line_top;
            let found = line_top <= point.y && point.y < next_line_top;
            line_top = next_line_top;
            found
        });
        let Some(line) = line else {
            return 0;
        };
        let glyphs = self.shaped_text.get_glyphs(line.range.clone());
        let pens = self.line_pens(&line);
        let mut glyph_index = line.range.start;
        for (i, glyph) in glyphs.iter().enumerate() {
            let is_last = i + 1 == glyphs.len();
            if point.x < pens.xs[i] + glyph.advance.x / 2.0
                || glyph.is_newline()
                || (is_last && glyph.is_whitespace())
            {
                break;
            }
            glyph_index += 1;
        }
        glyph_index
    }

    /// The pen position of a glyph, with its offset applied.
    ///
    /// An index past the end of the text gives the end of the last line.
    pub fn get_glyph_anchor(&self, index: i64) -> GlyphAnchor {
        let Some(line) = self
            .line_metrics_for_glyph_range
            .get_item_with_enclosing_range(index)
            .or_else(|| self.line_metrics_for_glyph_range.back())
        else {
            return GlyphAnchor::default();
        };
        let pens = self.line_pens(&line);
        let index_in_line = (index - line.range.start).clamp(0, pens.xs.len() as i64 - 1);
        let offset = self
            .shaped_text
            .get_glyphs(index..index + 1)
            .first()
            .filter(|_| line.range.contains(&index))
            .map_or(Point::default(), |glyph| glyph.offset);
        GlyphAnchor {
            anchor: Point::new(pens.xs[index_in_line as usize], line.value.anchor.y) + offset,
            max_ascent: line.value.max_ascent,
            max_descent: line.value.max_descent,
        }
    }

    /// One box per line that `glyph_range` touches, spanning the glyphs on
    /// that line from the line's top to the next line's.
    pub fn get_glyphs_bounds(&self, glyph_range: Range<i64>) -> Vec<BoundingBox> {
        let mut bounds = Vec::new();
        let mut consume_from = glyph_range.start;
        while consume_from < glyph_range.end {
            let Some(line) = self
                .line_metrics_for_glyph_range
                .get_item_with_enclosing_range(consume_from)
            else {
                break;
            };
            let consume_to = glyph_range.end.min(line.range.end);
            let pens = self.line_pens(&line);
            let x = |i: i64| pens.xs[(i - line.range.start) as usize];
            bounds.push(BoundingBox {
                x_min: x(consume_from),
                y_min: line.value.top,
                x_max: x(consume_to),
                y_max: line.value.next_line_top,
            });
            consume_from = consume_to;
        }
        bounds
    }

    /// The distance from the top of the box to the bottom of the last line.
    pub fn height(&self) -> f32 {
        self.line_metrics_for_glyph_range
            .back()
            .map_or(0.0, |item| item.value.next_line_top)
    }

    /// Everything that is drawn, in runs of a single font.
    ///
    /// Ligature placeholders take up space but are not drawn.
    pub fn glyph_runs(&self) -> Vec<GlyphRun> {
        let mut runs = Vec::new();
        for line in self.line_metrics_for_glyph_range.iter() {
            let pens = self.line_pens(&line);
            let baseline = line.value.anchor.y;
            for draw in self.ranges_to_draw.get_intersections_with(line.range.clone()).iter() {
                match draw.value {
                    DrawType::Normal => {
                        let fonts = self.shaped_text.resolved_fonts();
                        for item in fonts.get_intersections_with(draw.range).iter() {
                            let mut run = GlyphRun::new(item.value.clone(), DrawType::Normal);
                            let glyphs = self.shaped_text.get_glyphs(item.range.clone());
                            for (index, glyph) in item.range.clone().zip(glyphs) {
                                if glyph.is_placeholder_for_ligature() {
                                    continue;
                                }
                                let pen = pens.xs[(index - line.range.start) as usize];
                                run.push(glyph, Point::new(pen, baseline));
                            }
                            if !run.glyph_ids.is_empty() {
                                runs.push(run);
                            }
                        }
                    }
                    DrawType::Ellipsis => {
                        let (Some(ellipsis), Some(x)) = (&self.ellipsis, pens.ellipsis_x) else {
                            continue;
                        };
                        let Some(font) = ellipsis.resolved_fonts().front() else {
                            continue;
                        };
                        let mut run = GlyphRun::new(font.value.clone(), DrawType::Ellipsis);
                        let mut pen = x;
                        for glyph in ellipsis.glyphs() {
                            if !glyph.is_placeholder_for_ligature() {
                                run.push(glyph, Point::new(pen, baseline));
                            }
                            pen += glyph.advance.x;
                        }
                        runs.push(run);
                    }
                }
            }
        }
        runs
    }
}

impl GlyphRun {
    fn new(font: Font, draw_type: DrawType) -> Self {
        GlyphRun {
            font,
            glyph_ids: Vec::new(),
            positions: Vec::new(),
            draw_type,
        }
    }

    fn push(&mut self, glyph: &ShapedGlyph, pen: Point<f32>) {
        self.glyph_ids.push(glyph.glyph_id);
        self.positions.push(pen + glyph.offset);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shaped_text::tests::{options, LIGATURE_GLYPH};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn anchors(justified: &JustifiedText) -> Vec<(f32, f32)> {
        justified
            .line_metrics_for_glyph_range()
            .values()
            .iter()
            .map(|m| (m.anchor.x, m.anchor.y))
            .collect()
    }

    #[test]
    fn lines_are_stacked_by_font_metrics() {
        let _ = env_logger::builder().is_test(true).try_init();
        let options = options().with_max_width(500.0);
        let shaped = SimpleShapedText::new("aaa bbb ccc", &options);
        let justified = JustifiedText::new(&shaped, &options);

        let metrics = justified.line_metrics_for_glyph_range();
        assert_eq!(
            metrics.ranges().iter().collect::<Vec<_>>(),
            vec![0..4, 4..8, 8..11]
        );
        assert_eq!(
            anchors(&justified),
            vec![(0.0, 800.0), (0.0, 1800.0), (0.0, 2800.0)]
        );
        let second = metrics.get_item(1).unwrap();
        assert_eq!(second.value.top, 1000.0);
        assert_eq!(second.value.next_line_top, 2000.0);
        assert_eq!(second.value.max_ascent, 800.0);
        assert_eq!(second.value.max_descent, 200.0);
        assert_eq!(justified.height(), 3000.0);
        assert_eq!(
            justified.minimum_required_widths_for_line(),
            &[350.0, 350.0, 300.0]
        );
    }

    #[test]
    fn leading_and_baseline_at_zero() {
        let options = options().with_leading(1.5);
        let shaped = SimpleShapedText::new("ab\ncd", &options);
        let justified = JustifiedText::new(&shaped, &options);
        assert_eq!(anchors(&justified), vec![(0.0, 1300.0), (0.0, 2800.0)]);
        let first = justified.line_metrics_for_glyph_range().front().unwrap();
        assert_eq!(first.value.top, 100.0);
        assert_eq!(first.value.next_line_top, 1600.0);

        let options = options.with_leading(1.0).with_baseline_at_zero(true);
        let justified = JustifiedText::new(&shaped, &options);
        assert_eq!(anchors(&justified), vec![(0.0, 0.0), (0.0, 1000.0)]);
    }

    #[rstest]
    #[case::left(Justification::TOP_LEFT, 0.0)]
    #[case::right(Justification::TOP_RIGHT, 300.0)]
    #[case::centred(Justification::CENTRED, 150.0)]
    // nothing to stretch on a single line
    #[case::justified(Justification::HORIZONTALLY_JUSTIFIED, 0.0)]
    fn horizontal_alignment(#[case] justification: Justification, #[case] expected: f32) {
        let options = options()
            .with_max_width(500.0)
            .with_justification(justification);
        let shaped = SimpleShapedText::new("ab", &options);
        let justified = JustifiedText::new(&shaped, &options);
        assert_eq!(anchors(&justified)[0].0, expected);
    }

    #[test]
    fn vertical_alignment() {
        let shaped = SimpleShapedText::new("ab", &options());
        let baseline = |justification| {
            let options = options()
                .with_height(3000.0)
                .with_justification(justification);
            anchors(&JustifiedText::new(&shaped, &options))[0].1
        };
        assert_eq!(baseline(Justification::TOP_LEFT), 800.0);
        assert_eq!(baseline(Justification::CENTRED_LEFT), 1800.0);
        assert_eq!(baseline(Justification::BOTTOM_LEFT), 2800.0);
    }

    #[test]
    fn justified_lines_stretch_whitespace_between_words() {
        let options = options()
            .with_max_width(600.0)
            .with_justification(Justification::HORIZONTALLY_JUSTIFIED | Justification::TOP);
        let shaped = SimpleShapedText::new("aa bb cc dd", &options);
        let justified = JustifiedText::new(&shaped, &options);
        assert_eq!(
            shaped.line_text_ranges().iter().collect::<Vec<_>>(),
            vec![0..6, 6..11]
        );

        let stretch = justified
            .whitespace_stretch()
            .iter()
            .map(|item| (item.range, *item.value))
            .collect::<Vec<_>>();
        assert_eq!(stretch, vec![(0..5, 100.0), (5..11, 0.0)]);
        let lengths = justified
            .line_metrics_for_glyph_range()
            .values()
            .iter()
            .map(|m| m.effective_line_length)
            .collect::<Vec<_>>();
        assert_eq!(lengths, vec![600.0, 450.0]);

        assert_eq!(justified.get_glyph_anchor(3).anchor, Point::new(350.0, 800.0));
        assert_eq!(justified.get_glyph_anchor(9).anchor, Point::new(250.0, 1800.0));
        // past the end of the text is the end of the last line
        assert_eq!(justified.get_glyph_anchor(11).anchor, Point::new(450.0, 1800.0));
    }

    #[test]
    fn glyph_index_to_the_right_of_a_point() {
        let options = options().with_max_width(500.0);
        let shaped = SimpleShapedText::new("aaa bbb ccc", &options);
        let justified = JustifiedText::new(&shaped, &options);
        let index = |x, y| justified.get_glyph_index_to_the_right_of(Point::new(x, y));
        assert_eq!(index(20.0, 500.0), 0);
        assert_eq!(index(120.0, 1500.0), 5);
        // trailing whitespace is never stepped over
        assert_eq!(index(1000.0, 1500.0), 7);
        assert_eq!(index(1000.0, 2500.0), 11);
        assert_eq!(index(20.0, 5000.0), 0);
    }

    #[test]
    fn bounds_are_split_by_line() {
        let options = options().with_max_width(500.0);
        let shaped = SimpleShapedText::new("aaa bbb ccc", &options);
        let justified = JustifiedText::new(&shaped, &options);
        assert_eq!(
            justified.get_glyphs_bounds(2..6),
            vec![
                BoundingBox {
                    x_min: 200.0,
                    y_min: 0.0,
                    x_max: 350.0,
                    y_max: 1000.0
                },
                BoundingBox {
                    x_min: 0.0,
                    y_min: 1000.0,
                    x_max: 200.0,
                    y_max: 2000.0
                },
            ]
        );
        assert!(justified.get_glyphs_bounds(3..3).is_empty());
    }

    #[test]
    fn placeholders_are_not_drawn() {
        let shaped = SimpleShapedText::new("fix", &options());
        let justified = JustifiedText::new(&shaped, &options());
        let runs = justified.glyph_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].glyph_ids, vec![LIGATURE_GLYPH, 24]);
        assert_eq!(
            runs[0].positions,
            vec![Point::new(0.0, 800.0), Point::new(180.0, 800.0)]
        );
    }

    #[test]
    fn overflowing_line_is_cut_at_the_end() {
        let options = options().with_max_width(500.0).with_default_ellipsis();
        let shaped = SimpleShapedText::new("abcdefgh", &options);
        let justified = JustifiedText::new(&shaped, &options);

        let draws = justified
            .ranges_to_draw()
            .iter()
            .map(|item| (item.range, *item.value))
            .collect::<Vec<_>>();
        assert_eq!(
            draws,
            vec![(0..3, DrawType::Normal), (3..4, DrawType::Ellipsis)]
        );

        let runs = justified.glyph_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].glyph_ids, vec![1, 2, 3]);
        assert_eq!(runs[1].draw_type, DrawType::Ellipsis);
        assert_eq!(runs[1].glyph_ids, vec![32]);
        assert_eq!(runs[1].positions, vec![Point::new(300.0, 800.0)]);
    }

    #[test]
    fn overflowing_line_without_ellipsis() {
        let options = options().with_max_width(500.0);
        let shaped = SimpleShapedText::new("abcdefgh", &options);
        let justified = JustifiedText::new(&shaped, &options);
        assert!(justified.ellipsis().is_none());
        let runs = justified.glyph_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].glyph_ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn right_to_left_overflow_is_cut_at_the_front() {
        let options = options().with_max_width(500.0).with_default_ellipsis();
        let text = "\u{05D0}\u{05D1}\u{05D2}\u{05D3}\u{05D4}\u{05D5}\u{05D6}\u{05D7}";
        let shaped = SimpleShapedText::new(text, &options);
        let justified = JustifiedText::new(&shaped, &options);

        let draws = justified
            .ranges_to_draw()
            .iter()
            .map(|item| (item.range, *item.value))
            .collect::<Vec<_>>();
        assert_eq!(
            draws,
            vec![(4..5, DrawType::Ellipsis), (5..8, DrawType::Normal)]
        );

        let runs = justified.glyph_runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[0].draw_type, DrawType::Ellipsis);
        assert_eq!(runs[0].positions, vec![Point::new(0.0, 800.0)]);
        // the logical start of the text is what remains
        assert_eq!(runs[1].glyph_ids, vec![42, 41, 40]);
        assert_eq!(
            runs[1].positions,
            vec![
                Point::new(150.0, 800.0),
                Point::new(250.0, 800.0),
                Point::new(350.0, 800.0)
            ]
        );
        assert_eq!(justified.get_glyph_anchor(6).anchor, Point::new(250.0, 800.0));
    }

    #[test]
    fn empty_text() {
        let shaped = SimpleShapedText::new("", &options());
        let justified = JustifiedText::new(&shaped, &options());
        assert_eq!(justified.height(), 0.0);
        assert!(justified.glyph_runs().is_empty());
        assert_eq!(justified.get_glyph_anchor(0), GlyphAnchor::default());
        assert_eq!(justified.get_glyph_index_to_the_right_of(Point::new(0.0, 0.0)), 0);
    }
}
