//! Common [scalar data types][data types] used in font files
//!
//! [data types]: https://docs.microsoft.com/en-us/typography/opentype/spec/otff#data-types

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

mod fixed;
mod glyph_id;
mod name_id;
mod point;
mod raw;
mod tag;
mod uint24;

pub use fixed::{F2Dot14, Fixed};
pub use glyph_id::{GlyphId, GlyphId16, TryFromGlyphIdError};
pub use name_id::NameId;
pub use point::Point;
pub use raw::{BigEndian, FixedSize, Scalar};
pub use tag::{InvalidTag, Tag};
pub use uint24::Uint24;
