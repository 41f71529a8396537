//! small utilities used in tests

use crate::FontData;
use std::collections::HashMap;
use types::Scalar;

/// A builder for big-endian test tables.
///
/// Locations can be named while building and patched afterwards, which is
/// how offsets to later subtables are filled in.
#[derive(Debug, Clone, Default)]
pub struct BeBuffer {
    data: Vec<u8>,
    tagged_locations: HashMap<String, usize>,
}

impl BeBuffer {
    pub fn new() -> Self {
        Default::default()
    }

    /// The current length of the buffer in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Write any scalar to this buffer.
    pub fn push(mut self, item: impl Scalar) -> Self {
        self.data.extend(item.to_raw().as_ref());
        self
    }

    /// Write a scalar, remembering its location under `tag`.
    pub fn push_with_tag(mut self, item: impl Scalar, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self.push(item)
    }

    /// Write multiple scalars into the buffer
    pub fn extend<T: Scalar>(mut self, iter: impl IntoIterator<Item = T>) -> Self {
        for item in iter {
            self = self.push(item);
        }
        self
    }

    /// Append another buffer; its tags are not carried over.
    pub fn append(mut self, other: &BeBuffer) -> Self {
        self.data.extend_from_slice(&other.data);
        self
    }

    /// Remember the current end of the buffer under `tag`.
    pub fn mark(mut self, tag: &str) -> Self {
        self.tagged_locations
            .insert(tag.to_string(), self.data.len());
        self
    }

    pub fn offset_for(&self, tag: &str) -> usize {
        // panic on unrecognized tags
        self.tagged_locations[tag]
    }

    /// Overwrite the bytes at the location named `tag`.
    pub fn write_at(&mut self, tag: &str, item: impl Scalar) {
        self.write_at_offset(self.offset_for(tag), item);
    }

    /// Overwrite the bytes at a raw position.
    pub fn write_at_offset(&mut self, offset: usize, item: impl Scalar) {
        let raw = item.to_raw();
        let new_data: &[u8] = raw.as_ref();
        self.data[offset..offset + new_data.len()].copy_from_slice(new_data);
    }

    /// Store the distance from `base` to `target` as a u16 at `field`.
    pub fn write_offset16(&mut self, field: &str, base: &str, target: &str) {
        let offset = self.offset_for(target) - self.offset_for(base);
        self.write_at(field, offset as u16);
    }

    pub fn font_data(&self) -> FontData<'_> {
        FontData::new(&self.data)
    }
}

impl std::ops::Deref for BeBuffer {
    type Target = [u8];
    fn deref(&self) -> &Self::Target {
        &self.data
    }
}
