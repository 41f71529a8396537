//! Data structures useful for font work.

pub mod array;
pub mod bitpage;
mod bitset;

pub use array::{ArrayHash, ArrayView, ArrayViewMut, NotFoundPolicy};
pub use bitpage::BitPage;
pub use bitset::U32Set;
