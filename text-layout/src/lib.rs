//! Lines of shaped text
//!
//! [`SimpleShapedText`] runs a string through bidi analysis and the shaper,
//! breaks it into lines that fit a maximum width and keeps every line's
//! glyphs in visual order. [`JustifiedText`] then places those lines in a
//! box: it picks each line's baseline and anchor, stretches whitespace in
//! justified lines and cuts the last line short when it overflows.
//!
//! Glyph and text positions are `i64` indices, and ranges of them are
//! tracked with [`Ranges`] and [`RangedValues`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shaper::FaceData;
//! use text_layout::{Font, JustifiedText, ShapedTextOptions, SimpleShapedText};
//!
//! let mut data = FaceData::new(1000);
//! data.set_metrics(800, -200);
//! data.add_glyph('a' as u32, 1, 500).add_glyph(' ' as u32, 2, 250);
//! let options = ShapedTextOptions::new()
//!     .with_font(Font::new(Arc::new(data), 10.0))
//!     .with_max_width(13.0);
//! let shaped = SimpleShapedText::new("aa aa", &options);
//! assert_eq!(shaped.num_lines(), 2);
//! let justified = JustifiedText::new(&shaped, &options);
//! assert_eq!(justified.height(), 20.0);
//! ```

#![forbid(unsafe_code)]

mod font;
mod justified_text;
mod options;
mod ranged_values;
mod ranges;
mod shaped_text;

pub use font::Font;
pub use justified_text::{
    BoundingBox, DrawType, GlyphAnchor, GlyphRun, JustifiedText, LineMetrics,
};
pub use options::{Justification, ShapedTextOptions, TextDirection};
pub use ranged_values::{Item, MergeEqualItems, RangedValues};
pub use ranges::{Op, Operations, Ranges};
pub use shaped_text::{GlyphLookupEntry, ShapedGlyph, SimpleShapedText};

/// How far a line may exceed the maximum width and still count as fitting.
pub(crate) const MAX_WIDTH_TOLERANCE: f32 = 0.005;
