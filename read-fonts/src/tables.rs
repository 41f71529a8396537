//! The font tables this crate can decode

pub mod fvar;
pub mod glyf;
pub mod gpos;
pub mod gsub;
pub mod layout;
pub mod loca;
