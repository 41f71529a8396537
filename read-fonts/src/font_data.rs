//! raw font bytes

use std::ops::{Bound, RangeBounds};

use types::{FixedSize, Scalar};

use crate::read::ReadError;

/// A reference to raw binary font data.
///
/// Every read through this type is bounds checked; reading past the end is an
/// error and never a panic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FontData<'a> {
    total_pos: u32,
    bytes: &'a [u8],
}

/// A cursor for reading a sequence of fields.
///
/// Reads advance the cursor even when they fail, so a run of reads can be
/// checked once at the end with [`Cursor::finish`].
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    pos: usize,
    data: FontData<'a>,
}

impl<'a> FontData<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        FontData {
            total_pos: 0,
            bytes,
        }
    }

    /// The length of the data, in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The position of this data within the data it was split from.
    pub fn position_in_parent(&self) -> u32 {
        self.total_pos
    }

    pub fn split_off(&self, pos: usize) -> Option<FontData<'a>> {
        self.bytes.get(pos..).map(|bytes| FontData {
            bytes,
            total_pos: self.total_pos.saturating_add(pos as u32),
        })
    }

    pub fn slice(&self, range: impl RangeBounds<usize>) -> Option<FontData<'a>> {
        let start = match range.start_bound() {
            Bound::Unbounded => 0,
            Bound::Included(i) => *i,
            Bound::Excluded(i) => i.saturating_add(1),
        };
        let bounds = (range.start_bound().cloned(), range.end_bound().cloned());
        let total_pos = self.total_pos.saturating_add(start as u32);
        self.bytes
            .get(bounds)
            .map(|bytes| FontData { bytes, total_pos })
    }

    pub fn read_at<T: Scalar>(&self, offset: usize) -> Result<T, ReadError> {
        self.bytes
            .get(offset..)
            .and_then(T::read)
            .ok_or(ReadError::OutOfBounds)
    }

    /// Read a big-endian array of `count` scalars starting at `offset`.
    pub fn read_array<T: Scalar>(
        &self,
        offset: usize,
        count: usize,
    ) -> Result<ScalarArray<'a, T>, ReadError> {
        let len = count
            .checked_mul(T::RAW_BYTE_LEN)
            .ok_or(ReadError::InvalidArrayLen)?;
        let end = offset.checked_add(len).ok_or(ReadError::OutOfBounds)?;
        let bytes = self.bytes.get(offset..end).ok_or(ReadError::OutOfBounds)?;
        Ok(ScalarArray::new(bytes))
    }

    /// Returns `true` if `len` bytes starting at `offset` are available.
    pub fn check_range(&self, offset: usize, len: usize) -> bool {
        offset
            .checked_add(len)
            .is_some_and(|end| end <= self.bytes.len())
    }

    pub fn cursor(&self) -> Cursor<'a> {
        Cursor {
            pos: 0,
            data: *self,
        }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<'a> Cursor<'a> {
    pub fn advance<T: Scalar>(&mut self) {
        self.pos = self.pos.saturating_add(T::RAW_BYTE_LEN);
    }

    pub fn advance_by(&mut self, n_bytes: usize) {
        self.pos = self.pos.saturating_add(n_bytes);
    }

    pub fn read<T: Scalar>(&mut self) -> Result<T, ReadError> {
        let temp = self.data.read_at(self.pos);
        self.advance::<T>();
        temp
    }

    pub fn read_array<T: Scalar>(&mut self, count: usize) -> Result<ScalarArray<'a, T>, ReadError> {
        let temp = self.data.read_array(self.pos, count);
        self.advance_by(count.saturating_mul(T::RAW_BYTE_LEN));
        temp
    }

    /// Take the next `len` bytes as raw data.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        let end = self.pos.saturating_add(len);
        let temp = self
            .data
            .bytes
            .get(self.pos..end)
            .ok_or(ReadError::OutOfBounds);
        self.pos = end;
        temp
    }

    /// The current position, or an error if we have run past the end.
    pub fn position(&self) -> Result<usize, ReadError> {
        if self.pos <= self.data.len() {
            Ok(self.pos)
        } else {
            Err(ReadError::OutOfBounds)
        }
    }

    pub fn remaining_bytes(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// The bytes after the cursor, if it is still in bounds.
    pub fn remaining(&self) -> Option<FontData<'a>> {
        self.data.split_off(self.pos)
    }

    /// Finish reading, returning the number of bytes consumed.
    pub fn finish(self) -> Result<usize, ReadError> {
        self.position()
    }
}

impl AsRef<[u8]> for FontData<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}

/// A run of big-endian scalars, decoded on access.
#[derive(Clone, Copy)]
pub struct ScalarArray<'a, T> {
    bytes: &'a [u8],
    _marker: std::marker::PhantomData<T>,
}

impl<'a, T: Scalar> ScalarArray<'a, T> {
    fn new(bytes: &'a [u8]) -> Self {
        ScalarArray {
            bytes,
            _marker: std::marker::PhantomData,
        }
    }

    pub fn empty() -> Self {
        Self::new(&[])
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / T::RAW_BYTE_LEN
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, idx: usize) -> Option<T> {
        let start = idx.checked_mul(T::RAW_BYTE_LEN)?;
        T::read(self.bytes.get(start..)?)
    }

    pub fn first(&self) -> Option<T> {
        self.get(0)
    }

    pub fn last(&self) -> Option<T> {
        self.len().checked_sub(1).and_then(|idx| self.get(idx))
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = T> + 'a {
        self.bytes
            .chunks_exact(T::RAW_BYTE_LEN)
            .filter_map(|chunk| T::read(chunk))
    }

    /// Binary search over a sorted array, using `f` to compare elements.
    pub fn binary_search_by(&self, mut f: impl FnMut(T) -> std::cmp::Ordering) -> Result<usize, usize> {
        let mut lo = 0;
        let mut hi = self.len();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            let Some(item) = self.get(mid) else {
                return Err(lo);
            };
            match f(item) {
                std::cmp::Ordering::Less => lo = mid + 1,
                std::cmp::Ordering::Greater => hi = mid,
                std::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(lo)
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }
}

impl<T: Scalar + std::fmt::Debug> std::fmt::Debug for ScalarArray<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_reports_overrun_on_finish() {
        let data = FontData::new(&[0, 1, 0, 2, 0]);
        let mut cursor = data.cursor();
        assert_eq!(cursor.read::<u16>().unwrap(), 1);
        assert_eq!(cursor.read::<u16>().unwrap(), 2);
        assert!(cursor.read::<u16>().is_err());
        assert!(cursor.finish().is_err());
    }

    #[test]
    fn slices_track_position() {
        let data = FontData::new(&[0; 16]);
        let sub = data.split_off(4).unwrap().slice(2..6).unwrap();
        assert_eq!(sub.position_in_parent(), 6);
        assert_eq!(sub.len(), 4);
        assert!(data.slice(10..20).is_none());
    }

    #[test]
    fn arrays() {
        let data = FontData::new(&[0, 5, 0, 7, 0, 9, 1]);
        let array = data.read_array::<u16>(0, 3).unwrap();
        assert_eq!(array.iter().collect::<Vec<_>>(), vec![5, 7, 9]);
        assert_eq!(array.binary_search_by(|v| v.cmp(&7)), Ok(1));
        assert_eq!(array.binary_search_by(|v| v.cmp(&8)), Err(2));
        assert!(data.read_array::<u16>(2, 3).is_err());
        assert!(data.read_array::<u32>(0, usize::MAX).is_err());
    }
}
