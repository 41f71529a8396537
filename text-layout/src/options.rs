//! Options controlling how text is shaped, broken into lines and placed.

use std::ops::BitOr;

use crate::font::Font;
use crate::ranged_values::{MergeEqualItems, RangedValues};
use crate::ranges::Operations;

/// The reading direction of a paragraph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

/// Where lines are placed in the available space.
///
/// A set of bits: at most one horizontal and one vertical placement are
/// meaningful at a time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Justification(u16);

impl Justification {
    pub const LEFT: Self = Self(0x0001);
    pub const RIGHT: Self = Self(0x0002);
    pub const HORIZONTALLY_CENTRED: Self = Self(0x0004);
    pub const TOP: Self = Self(0x0008);
    pub const BOTTOM: Self = Self(0x0010);
    pub const VERTICALLY_CENTRED: Self = Self(0x0020);
    /// Whitespace between words is stretched to fill the line.
    pub const HORIZONTALLY_JUSTIFIED: Self = Self(0x0040);

    pub const TOP_LEFT: Self = Self(0x0009);
    pub const CENTRED: Self = Self(0x0024);
    pub const CENTRED_LEFT: Self = Self(0x0021);
    pub const CENTRED_RIGHT: Self = Self(0x0022);
    pub const TOP_RIGHT: Self = Self(0x000a);
    pub const BOTTOM_LEFT: Self = Self(0x0011);
    pub const BOTTOM_RIGHT: Self = Self(0x0012);

    pub const fn from_bits(bits: u16) -> Self {
        Self(bits & 0x007f)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    /// `true` if any of the bits of `other` are set.
    pub const fn test_flags(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }
}

impl Default for Justification {
    fn default() -> Self {
        Self::TOP_LEFT
    }
}

impl BitOr for Justification {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// Everything that affects how a string becomes lines of glyphs.
///
/// Built with the `with_*` methods, each of which returns a modified copy.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapedTextOptions {
    justification: Justification,
    reading_dir: Option<TextDirection>,
    max_width: Option<f32>,
    alignment_width: Option<f32>,
    height: Option<f32>,
    fonts_for_range: RangedValues<Font>,
    language: String,
    first_line_indent: f32,
    leading: f32,
    additive_line_spacing: f32,
    baseline_at_zero: bool,
    allow_breaking_inside_word: bool,
    trailing_whitespaces_should_fit: bool,
    max_num_lines: i64,
    ellipsis: String,
}

/// The text range a single font is set over.
fn everywhere(font: Font) -> RangedValues<Font> {
    let mut fonts = RangedValues::new();
    let mut ops = Operations::new();
    fonts.set(0..i64::MAX, font, &mut ops, MergeEqualItems::Yes);
    fonts
}

impl Default for ShapedTextOptions {
    fn default() -> Self {
        ShapedTextOptions {
            justification: Justification::TOP_LEFT,
            reading_dir: None,
            max_width: None,
            alignment_width: None,
            height: None,
            fonts_for_range: everywhere(Font::default()),
            language: String::new(),
            first_line_indent: 0.0,
            leading: 1.0,
            additive_line_spacing: 0.0,
            baseline_at_zero: false,
            allow_breaking_inside_word: false,
            trailing_whitespaces_should_fit: true,
            max_num_lines: i64::MAX,
            ellipsis: String::new(),
        }
    }
}

impl ShapedTextOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_justification(&self, justification: Justification) -> Self {
        Self {
            justification,
            ..self.clone()
        }
    }

    /// Wrap lines longer than `max_width`, and align lines within it.
    pub fn with_max_width(&self, max_width: f32) -> Self {
        Self {
            max_width: Some(max_width),
            ..self.clone()
        }
    }

    /// Align lines within `alignment_width` instead of the maximum width.
    ///
    /// Lines longer than this are left at zero rather than aligned, so that
    /// the start of right-to-left text stays in view for a caller that
    /// scrolls. Wrapping still follows the maximum width.
    pub fn with_alignment_width(&self, alignment_width: f32) -> Self {
        Self {
            alignment_width: Some(alignment_width),
            ..self.clone()
        }
    }

    /// The height available for vertical alignment.
    pub fn with_height(&self, height: f32) -> Self {
        Self {
            height: Some(height),
            ..self.clone()
        }
    }

    /// Use `font` for all of the text.
    pub fn with_font(&self, font: Font) -> Self {
        Self {
            fonts_for_range: everywhere(font),
            ..self.clone()
        }
    }

    /// Use a different font for each range. Text after the first gap in the
    /// ranges is not laid out.
    pub fn with_fonts(&self, fonts: RangedValues<Font>) -> Self {
        Self {
            fonts_for_range: fonts,
            ..self.clone()
        }
    }

    pub fn with_language(&self, language: impl Into<String>) -> Self {
        Self {
            language: language.into(),
            ..self.clone()
        }
    }

    /// Space taken off the width of the first line.
    pub fn with_first_line_indent(&self, first_line_indent: f32) -> Self {
        Self {
            first_line_indent,
            ..self.clone()
        }
    }

    /// Line spacing as a multiple of single spacing, which is the descent
    /// of one line plus the ascent of the next.
    pub fn with_leading(&self, leading: f32) -> Self {
        Self {
            leading,
            ..self.clone()
        }
    }

    /// Extra space added between every two lines.
    pub fn with_additive_line_spacing(&self, additive_line_spacing: f32) -> Self {
        Self {
            additive_line_spacing,
            ..self.clone()
        }
    }

    /// Put the first baseline at zero instead of below the top edge.
    pub fn with_baseline_at_zero(&self, baseline_at_zero: bool) -> Self {
        Self {
            baseline_at_zero,
            ..self.clone()
        }
    }

    /// Whether whitespace at the end of a line counts against the maximum
    /// width.
    pub fn with_trailing_whitespaces_should_fit(&self, should_fit: bool) -> Self {
        Self {
            trailing_whitespaces_should_fit: should_fit,
            ..self.clone()
        }
    }

    /// Stop breaking lines after `max_num_lines`; the rest of the text is
    /// put on the last line.
    pub fn with_max_num_lines(&self, max_num_lines: i64) -> Self {
        Self {
            max_num_lines,
            ..self.clone()
        }
    }

    /// Text drawn in place of whatever does not fit on the last line.
    pub fn with_ellipsis(&self, ellipsis: impl Into<String>) -> Self {
        Self {
            ellipsis: ellipsis.into(),
            ..self.clone()
        }
    }

    /// [`with_ellipsis`](Self::with_ellipsis) using U+2026.
    pub fn with_default_ellipsis(&self) -> Self {
        self.with_ellipsis('\u{2026}')
    }

    /// Override the direction detected from the text.
    pub fn with_reading_direction(&self, reading_dir: Option<TextDirection>) -> Self {
        Self {
            reading_dir,
            ..self.clone()
        }
    }

    /// Break words that are too long for a line of their own.
    pub fn with_allow_breaking_inside_word(&self, allow: bool) -> Self {
        Self {
            allow_breaking_inside_word: allow,
            ..self.clone()
        }
    }

    pub fn justification(&self) -> Justification {
        self.justification
    }

    pub fn reading_direction(&self) -> Option<TextDirection> {
        self.reading_dir
    }

    pub fn max_width(&self) -> Option<f32> {
        self.max_width
    }

    pub fn alignment_width(&self) -> Option<f32> {
        self.alignment_width
    }

    pub fn height(&self) -> Option<f32> {
        self.height
    }

    pub fn fonts_for_range(&self) -> &RangedValues<Font> {
        &self.fonts_for_range
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn first_line_indent(&self) -> f32 {
        self.first_line_indent
    }

    pub fn leading(&self) -> f32 {
        self.leading
    }

    pub fn additive_line_spacing(&self) -> f32 {
        self.additive_line_spacing
    }

    pub fn is_baseline_at_zero(&self) -> bool {
        self.baseline_at_zero
    }

    pub fn trailing_whitespaces_should_fit(&self) -> bool {
        self.trailing_whitespaces_should_fit
    }

    pub fn max_num_lines(&self) -> i64 {
        self.max_num_lines
    }

    pub fn ellipsis(&self) -> &str {
        &self.ellipsis
    }

    pub fn allow_breaking_inside_word(&self) -> bool {
        self.allow_breaking_inside_word
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ShapedTextOptions::default();
        assert_eq!(options.justification(), Justification::TOP_LEFT);
        assert_eq!(options.leading(), 1.0);
        assert_eq!(options.max_num_lines(), i64::MAX);
        assert!(options.trailing_whitespaces_should_fit());
        assert!(options.ellipsis().is_empty());
        let fonts = options.fonts_for_range();
        assert_eq!(fonts.len(), 1);
        assert_eq!(fonts.front().unwrap().range, 0..i64::MAX);
        assert_eq!(fonts.front().unwrap().value.size(), 15.0);
    }

    #[test]
    fn builders_return_modified_copies() {
        let options = ShapedTextOptions::new();
        let narrow = options
            .with_max_width(100.0)
            .with_justification(Justification::HORIZONTALLY_JUSTIFIED | Justification::TOP)
            .with_default_ellipsis();
        assert_eq!(options.max_width(), None);
        assert_eq!(narrow.max_width(), Some(100.0));
        assert_eq!(narrow.ellipsis(), "\u{2026}");
        assert!(narrow
            .justification()
            .test_flags(Justification::HORIZONTALLY_JUSTIFIED));
        assert!(!narrow.justification().test_flags(Justification::LEFT));
        assert_ne!(options, narrow);
    }
}
