//! Reading OpenType tables
//!
//! This crate provides memory safe, zero-allocation parsing of the tables a
//! text shaper and a font subsetter need: glyph outlines (`glyf`), the
//! positioning and substitution lookups we apply (`GPOS` cursive and
//! class-pair kerning, `GSUB` ligatures) and the variation axes (`fvar`).
//!
//! Every table type is constructed with [`FontRead::read`], which validates
//! the structure of the table against the bytes actually available. Accessors
//! on a validated table never read out of bounds; on malformed data they
//! return empty or default values instead of panicking.
//!
//! Alongside the tables, the [`collections`] module holds the sparse bit set
//! and array views used to track glyph sets and search sorted records.
//!
//! # Example
//!
//! ```no_run
//! # let fvar_bytes: &[u8] = &[];
//! use read_fonts::{tables::fvar::Fvar, FontData, FontRead};
//! let fvar = Fvar::read(FontData::new(fvar_bytes)).expect("malformed fvar");
//! for axis in fvar.axes().iter() {
//!     println!("{} {:?}", axis.axis_tag, axis.coordinates());
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod collections;
mod font_data;
mod read;
pub mod tables;


/// Public re-export of the font-types crate.
pub extern crate font_types as types;

pub use font_data::{Cursor, FontData, ScalarArray};
pub use read::{FontRead, Format, ReadError};
