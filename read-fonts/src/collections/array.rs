//! Non-owning views over contiguous items, with searching and hashing.
//!
//! These are thin wrappers around slices. They exist for the behaviour that
//! plain slices don't have: out of range access yields a default value
//! instead of panicking, slicing clamps instead of failing, and hashing is
//! stable across runs and platforms so it can key caches of shaped output.

use std::cmp::Ordering;

use types::GlyphId;

const FNV_SEED: u32 = 0x84222325;
const FNV_PRIME: u32 = 16777619;
const FASTHASH_SEED: u32 = 0xf437ffe6;

/// What a failed search reports as the position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NotFoundPolicy {
    /// Report no position.
    #[default]
    DontStore,
    /// Report the given position.
    Store(usize),
    /// Report the position where the item would be inserted.
    StoreClosest,
}

/// A borrowed, read-only run of items.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ArrayView<'a, T> {
    items: &'a [T],
}

/// A borrowed, mutable run of items.
#[derive(PartialEq, Eq)]
pub struct ArrayViewMut<'a, T> {
    items: &'a mut [T],
}

impl<'a, T> ArrayView<'a, T> {
    pub const fn new(items: &'a [T]) -> Self {
        ArrayView { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_slice(&self) -> &'a [T] {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'a, T> {
        self.items.iter()
    }

    /// Returns the item at `idx`, or `None` if it is out of range.
    pub fn get_ref(&self, idx: usize) -> Option<&'a T> {
        self.items.get(idx)
    }

    /// A view of up to `count` items starting at `start`.
    ///
    /// Both bounds are clamped to the view: a start past the end yields an
    /// empty view, and `None` for `count` means "to the end".
    pub fn sub_array(&self, start: usize, count: Option<usize>) -> ArrayView<'a, T> {
        let available = self.items.len().saturating_sub(start);
        let count = count.map_or(available, |count| count.min(available));
        let start = start.min(self.items.len());
        ArrayView::new(&self.items[start..start + count])
    }

    /// The first `len` items, or the whole view if it is shorter.
    pub fn truncate(&self, len: usize) -> ArrayView<'a, T> {
        self.sub_array(0, Some(len))
    }

    /// Linear search for an item equal to `item`.
    pub fn lfind(&self, item: &T, not_found: NotFoundPolicy) -> Result<usize, Option<usize>>
    where
        T: PartialEq,
    {
        match self.items.iter().position(|x| x == item) {
            Some(pos) => Ok(pos),
            None => Err(match not_found {
                NotFoundPolicy::DontStore => None,
                NotFoundPolicy::Store(pos) => Some(pos),
                NotFoundPolicy::StoreClosest => Some(self.items.len()),
            }),
        }
    }

    /// Binary search over a view sorted by `f`.
    ///
    /// `f` compares an item against the target, as with
    /// [`slice::binary_search_by`].
    pub fn bfind_by(
        &self,
        f: impl FnMut(&T) -> Ordering,
        not_found: NotFoundPolicy,
    ) -> Result<usize, Option<usize>> {
        self.items.binary_search_by(f).map_err(|closest| match not_found {
            NotFoundPolicy::DontStore => None,
            NotFoundPolicy::Store(pos) => Some(pos),
            NotFoundPolicy::StoreClosest => Some(closest),
        })
    }

    /// Binary search for `item` in a sorted view.
    pub fn bfind(&self, item: &T, not_found: NotFoundPolicy) -> Result<usize, Option<usize>>
    where
        T: Ord,
    {
        self.bfind_by(|probe| probe.cmp(item), not_found)
    }

    /// Copy as many items as fit into `out`, returning the number copied.
    pub fn copy_into(&self, out: &mut [T]) -> usize
    where
        T: Copy,
    {
        let count = self.items.len().min(out.len());
        out[..count].copy_from_slice(&self.items[..count]);
        count
    }
}

impl<T: Copy + Default> ArrayView<'_, T> {
    /// Returns the item at `idx`, or the default value if it is out of range.
    pub fn get(&self, idx: usize) -> T {
        self.items.get(idx).copied().unwrap_or_default()
    }
}

impl<T: Ord> ArrayView<'_, T> {
    /// Compare two views: shorter views order first, views of the same length
    /// compare by content.
    ///
    /// This is not lexicographic order.
    pub fn cmp(&self, other: &Self) -> Ordering {
        self.items
            .len()
            .cmp(&other.items.len())
            .then_with(|| self.items.cmp(other.items))
    }
}

impl<T: ArrayHash> ArrayView<'_, T> {
    /// A hash of the contents that is stable across runs and platforms.
    pub fn hash(&self) -> u32 {
        T::hash_slice(self.items)
    }
}

impl<'a, T> From<&'a [T]> for ArrayView<'a, T> {
    fn from(items: &'a [T]) -> Self {
        ArrayView::new(items)
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ArrayView<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items).finish()
    }
}

impl<'a, T> ArrayViewMut<'a, T> {
    pub fn new(items: &'a mut [T]) -> Self {
        ArrayViewMut { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn as_view(&self) -> ArrayView<'_, T> {
        ArrayView::new(self.items)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut T> {
        self.items.get_mut(idx)
    }

    /// Reverse the items in `start..end`, with both bounds clamped to the view.
    pub fn reverse(&mut self, start: usize, end: usize) {
        let end = end.min(self.items.len());
        let start = start.min(end);
        self.items[start..end].reverse();
    }
}

/// Stable hashing for the contents of an [`ArrayView`].
pub trait ArrayHash: Sized {
    /// The hash of a single item.
    fn hash_item(&self) -> u32;

    /// The hash of a run of items.
    ///
    /// The default is FNV-1a over the item hashes.
    fn hash_slice(items: &[Self]) -> u32 {
        items.iter().fold(FNV_SEED, |current, item| {
            (current ^ item.hash_item()).wrapping_mul(FNV_PRIME)
        })
    }
}

// Knuth's multiplicative hash
const fn int_hash(v: u32) -> u32 {
    v.wrapping_mul(2654435761)
}

impl ArrayHash for u8 {
    fn hash_item(&self) -> u32 {
        int_hash(*self as u32)
    }

    // bytes hash as raw memory
    fn hash_slice(items: &[Self]) -> u32 {
        fasthash32(items, FASTHASH_SEED)
    }
}

impl ArrayHash for u16 {
    fn hash_item(&self) -> u32 {
        int_hash(*self as u32)
    }
}

impl ArrayHash for u32 {
    fn hash_item(&self) -> u32 {
        int_hash(*self)
    }
}

impl ArrayHash for i32 {
    fn hash_item(&self) -> u32 {
        int_hash(*self as u32)
    }
}

impl ArrayHash for GlyphId {
    fn hash_item(&self) -> u32 {
        int_hash(self.to_u32())
    }
}

fn fasthash_mix(mut h: u64) -> u64 {
    h ^= h >> 23;
    h = h.wrapping_mul(0x2127599bf4325c37);
    h ^ (h >> 47)
}

fn fasthash64(bytes: &[u8], seed: u64) -> u64 {
    const M: u64 = 0x880355f21e6d1965;
    let mut h = seed ^ (bytes.len() as u64).wrapping_mul(M);
    let mut chunks = bytes.chunks_exact(8);
    for chunk in chunks.by_ref() {
        let mut word = [0u8; 8];
        word.copy_from_slice(chunk);
        h ^= fasthash_mix(u64::from_le_bytes(word));
        h = h.wrapping_mul(M);
    }
    let tail = chunks.remainder();
    if !tail.is_empty() {
        let v = tail
            .iter()
            .enumerate()
            .fold(0u64, |v, (i, byte)| v ^ ((*byte as u64) << (8 * i)));
        h ^= fasthash_mix(v);
        h = h.wrapping_mul(M);
    }
    fasthash_mix(h)
}

/// The 32-bit fasthash of `bytes`.
pub fn fasthash32(bytes: &[u8], seed: u32) -> u32 {
    let h = fasthash64(bytes, seed as u64);
    // fold the 64-bit hash into 32 bits
    h.wrapping_sub(h >> 32) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_get_is_default() {
        let items = [1u16, 2, 3];
        let view = ArrayView::new(&items);
        assert_eq!(view.get(1), 2);
        assert_eq!(view.get(3), 0);
        assert_eq!(view.get(usize::MAX), 0);
        assert_eq!(view.get_ref(3), None);
    }

    #[test]
    fn sub_array_clamps() {
        let items = [1u8, 2, 3, 4, 5];
        let view = ArrayView::new(&items);
        assert_eq!(view.sub_array(1, Some(2)).as_slice(), &[2, 3]);
        assert_eq!(view.sub_array(3, Some(10)).as_slice(), &[4, 5]);
        assert_eq!(view.sub_array(2, None).as_slice(), &[3, 4, 5]);
        assert!(view.sub_array(9, Some(1)).is_empty());
        assert_eq!(view.truncate(2).as_slice(), &[1, 2]);
    }

    #[test]
    fn search_policies() {
        let items = [2u32, 4, 6, 8];
        let view = ArrayView::new(&items);
        assert_eq!(view.lfind(&6, NotFoundPolicy::DontStore), Ok(2));
        assert_eq!(view.lfind(&5, NotFoundPolicy::DontStore), Err(None));
        assert_eq!(view.lfind(&5, NotFoundPolicy::Store(99)), Err(Some(99)));
        assert_eq!(view.lfind(&5, NotFoundPolicy::StoreClosest), Err(Some(4)));

        assert_eq!(view.bfind(&8, NotFoundPolicy::DontStore), Ok(3));
        assert_eq!(view.bfind(&5, NotFoundPolicy::DontStore), Err(None));
        assert_eq!(view.bfind(&5, NotFoundPolicy::Store(7)), Err(Some(7)));
        assert_eq!(view.bfind(&5, NotFoundPolicy::StoreClosest), Err(Some(2)));
        assert_eq!(view.bfind(&1, NotFoundPolicy::StoreClosest), Err(Some(0)));
    }

    #[test]
    fn compare_is_length_first() {
        let short = [9u8, 9];
        let long = [0u8, 0, 0];
        assert_eq!(
            ArrayView::new(&short).cmp(&ArrayView::new(&long)),
            Ordering::Less
        );
        let a = [1u8, 2, 3];
        let b = [1u8, 2, 4];
        assert_eq!(ArrayView::new(&a).cmp(&ArrayView::new(&b)), Ordering::Less);
        assert_eq!(ArrayView::new(&a).cmp(&ArrayView::new(&a)), Ordering::Equal);
    }

    #[test]
    fn hashes_are_stable() {
        assert_eq!(ArrayView::<u32>::new(&[]).hash(), 0x84222325);
        assert_eq!(ArrayView::new(&[1u32, 2, 3]).hash(), 0x997d780b);
        assert_eq!(ArrayView::new(&[0x41u16]).hash(), 0xa3cdffbc);
        assert_eq!(
            ArrayView::new(&[GlyphId::new(1), GlyphId::new(2), GlyphId::new(3)]).hash(),
            0x997d780b
        );
    }

    #[test]
    fn byte_views_use_fasthash() {
        assert_eq!(ArrayView::<u8>::new(b"").hash(), 0xcdc00419);
        assert_eq!(ArrayView::new(b"a".as_slice()).hash(), 0xd98556ca);
        assert_eq!(ArrayView::new(b"hello world".as_slice()).hash(), 0x71e89ceb);
        assert_eq!(
            ArrayView::new(b"0123456789abcdef".as_slice()).hash(),
            0xa4bb978b
        );
    }

    #[test]
    fn reverse_clamps() {
        let mut items = [1, 2, 3, 4, 5];
        let mut view = ArrayViewMut::new(&mut items);
        view.reverse(1, 4);
        assert_eq!(view.as_view().as_slice(), &[1, 4, 3, 2, 5]);
        view.reverse(3, 100);
        assert_eq!(view.as_view().as_slice(), &[1, 4, 3, 5, 2]);
        view.reverse(4, 2);
        assert_eq!(view.as_view().as_slice(), &[1, 4, 3, 5, 2]);
    }

    #[test]
    fn copy_is_bounded() {
        let items = [7u16, 8, 9];
        let mut out = [0u16; 2];
        assert_eq!(ArrayView::new(&items).copy_into(&mut out), 2);
        assert_eq!(out, [7, 8]);
    }
}
