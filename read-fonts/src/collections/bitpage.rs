//! A fixed width page of bits, the building block of [`U32Set`].
//!
//! [`U32Set`]: super::U32Set

use std::{cell::Cell, hash::Hash, ops::RangeInclusive};

// the integer type underlying our bit set
type Element = u64;

// the number of elements in a page
const PAGE_SIZE: u32 = 8;
// the length of an element in bits
const ELEM_BITS: u32 = Element::BITS;
// mask out bits of a value not used to index into an element
const ELEM_MASK: u32 = ELEM_BITS - 1;
/// The number of bits in a page.
pub const PAGE_BITS: u32 = ELEM_BITS * PAGE_SIZE;
// mask out the bits of a value not used to index into a page
pub(crate) const PAGE_MASK: u32 = PAGE_BITS - 1;

/// Returned by [`BitPage::next`] and [`BitPage::previous`] when there is no
/// further member.
pub const INVALID: u32 = u32::MAX;

// cached population count meaning "recompute"
const DIRTY: u32 = u32::MAX;

/// A 512 bit wide page recording membership of the values `0..=511`.
///
/// Values passed to a page are always reduced modulo the page width, so a page
/// can be fed values from the full `u32` domain and only the low bits are used.
///
/// The population count is computed lazily and cached; every mutation marks
/// the cache dirty.
#[derive(Clone)]
pub struct BitPage {
    storage: [Element; PAGE_SIZE as usize],
    len: Cell<u32>,
}

impl BitPage {
    /// A page with no members.
    pub fn new_zeroes() -> Self {
        Self {
            storage: [0; PAGE_SIZE as usize],
            len: Cell::new(0),
        }
    }

    /// A page with every value a member.
    pub fn new_ones() -> Self {
        Self {
            storage: [Element::MAX; PAGE_SIZE as usize],
            len: Cell::new(PAGE_BITS),
        }
    }

    /// The number of members.
    pub fn len(&self) -> u32 {
        if self.len.get() == DIRTY {
            let len = self.storage.iter().map(|val| val.count_ones()).sum();
            self.len.set(len);
        }
        self.len.get()
    }

    pub fn is_empty(&self) -> bool {
        self.storage.iter().all(|elem| *elem == 0)
    }

    /// Add `val` and return `true` if it was not already present.
    pub fn insert(&mut self, val: u32) -> bool {
        let ret = !self.contains(val);
        *self.element_mut(val) |= bit_mask(val);
        self.mark_dirty();
        ret
    }

    /// Remove `val` and return `true` if it was present.
    pub fn remove(&mut self, val: u32) -> bool {
        let ret = self.contains(val);
        *self.element_mut(val) &= !bit_mask(val);
        self.mark_dirty();
        ret
    }

    /// Set membership of `val` to `present`.
    pub fn set(&mut self, val: u32, present: bool) {
        if present {
            self.insert(val);
        } else {
            self.remove(val);
        }
    }

    pub fn contains(&self, val: u32) -> bool {
        self.storage[element_index(val)] & bit_mask(val) != 0
    }

    /// Add every value in `range`.
    pub fn insert_range(&mut self, range: RangeInclusive<u32>) {
        self.update_range(range, |elem, mask| *elem |= mask);
    }

    /// Remove every value in `range`.
    pub fn remove_range(&mut self, range: RangeInclusive<u32>) {
        self.update_range(range, |elem, mask| *elem &= !mask);
    }

    fn update_range(&mut self, range: RangeInclusive<u32>, op: impl Fn(&mut Element, Element)) {
        let first = *range.start() & PAGE_MASK;
        let last = *range.end() & PAGE_MASK;
        if first > last {
            return;
        }
        let first_elem = first / ELEM_BITS;
        let last_elem = last / ELEM_BITS;
        for elem_idx in first_elem..=last_elem {
            let lo = if elem_idx == first_elem { first & ELEM_MASK } else { 0 };
            let hi = if elem_idx == last_elem { last & ELEM_MASK } else { ELEM_MASK };
            // bits lo..=hi, without shifting by the full element width
            let mask = (Element::MAX >> (ELEM_MASK - hi)) & (Element::MAX << lo);
            op(&mut self.storage[elem_idx as usize], mask);
        }
        self.mark_dirty();
    }

    pub fn clear(&mut self) {
        self.storage = [0; PAGE_SIZE as usize];
        self.len.set(0);
    }

    /// Advance `codepoint` to the next member of this page.
    ///
    /// Pass [`INVALID`] to start from the beginning. Returns `false` and sets
    /// `codepoint` to [`INVALID`] when there is no further member, including
    /// when `codepoint` is the last value of the page.
    pub fn next(&self, codepoint: &mut u32) -> bool {
        let m = if *codepoint == INVALID {
            0
        } else {
            let m = codepoint.wrapping_add(1) & PAGE_MASK;
            if m == 0 {
                *codepoint = INVALID;
                return false;
            }
            m
        };
        let mut i = (m / ELEM_BITS) as usize;
        let mut elem = self.storage[i] & (Element::MAX << (m & ELEM_MASK));
        loop {
            if elem != 0 {
                *codepoint = i as u32 * ELEM_BITS + elem.trailing_zeros();
                return true;
            }
            i += 1;
            match self.storage.get(i) {
                Some(next) => elem = *next,
                None => break,
            }
        }
        *codepoint = INVALID;
        false
    }

    /// Move `codepoint` back to the previous member of this page.
    ///
    /// Pass [`INVALID`] to start from the end. Returns `false` and sets
    /// `codepoint` to [`INVALID`] when there is no earlier member, including
    /// when `codepoint` is the first value of the page.
    pub fn previous(&self, codepoint: &mut u32) -> bool {
        let m = if *codepoint == INVALID {
            PAGE_MASK
        } else {
            let m = codepoint.wrapping_sub(1) & PAGE_MASK;
            if m == PAGE_MASK {
                *codepoint = INVALID;
                return false;
            }
            m
        };
        let mut i = (m / ELEM_BITS) as usize;
        let mut elem = self.storage[i] & (Element::MAX >> (ELEM_MASK - (m & ELEM_MASK)));
        loop {
            if elem != 0 {
                *codepoint = i as u32 * ELEM_BITS + (ELEM_MASK - elem.leading_zeros());
                return true;
            }
            if i == 0 {
                break;
            }
            i -= 1;
            elem = self.storage[i];
        }
        *codepoint = INVALID;
        false
    }

    /// The smallest member, if any.
    pub fn first(&self) -> Option<u32> {
        let mut cp = INVALID;
        self.next(&mut cp).then_some(cp)
    }

    /// The largest member, if any.
    pub fn last(&self) -> Option<u32> {
        let mut cp = INVALID;
        self.previous(&mut cp).then_some(cp)
    }

    /// Iterate the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        let mut cp = INVALID;
        std::iter::from_fn(move || self.next(&mut cp).then_some(cp)).fuse()
    }

    /// Iterate the members that are greater than `value`.
    pub fn iter_after(&self, value: u32) -> impl Iterator<Item = u32> + '_ {
        let mut cp = value & PAGE_MASK;
        std::iter::from_fn(move || self.next(&mut cp).then_some(cp)).fuse()
    }

    /// Iterate maximal runs of consecutive members.
    pub fn iter_ranges(&self) -> impl Iterator<Item = RangeInclusive<u32>> + '_ {
        let mut members = self.iter().peekable();
        std::iter::from_fn(move || {
            let start = members.next()?;
            let mut end = start;
            while members.next_if(|next| *next == end + 1).is_some() {
                end += 1;
            }
            Some(start..=end)
        })
    }

    /// Write up to `out.len()` members, starting at page value `start_value`,
    /// each offset by `base`. Returns how many values were written.
    ///
    /// Callers draining a large set call this repeatedly, resuming from the
    /// value after the last one written.
    pub fn write(&self, base: u32, start_value: u32, out: &mut [u32]) -> usize {
        let mut count = 0;
        let start_value = start_value & PAGE_MASK;
        let mut start_bit = start_value & ELEM_MASK;
        for i in (start_value / ELEM_BITS) as usize..PAGE_SIZE as usize {
            let bits = self.storage[i];
            let elem_base = base | (i as u32 * ELEM_BITS);
            for j in start_bit..ELEM_BITS {
                if count >= out.len() {
                    return count;
                }
                if bits & (1 << j) != 0 {
                    out[count] = elem_base | j;
                    count += 1;
                }
            }
            start_bit = 0;
        }
        count
    }

    /// Write up to `out.len()` values that are *not* members, each offset by
    /// `base`.
    ///
    /// `next_value` is the first value not yet accounted for; gaps between it
    /// and each member are emitted, and it is advanced past every member seen.
    /// Values after the last member of the page are left for the caller, which
    /// knows where the following page starts.
    pub fn write_inverted(
        &self,
        base: u32,
        start_value: u32,
        out: &mut [u32],
        next_value: &mut u32,
    ) -> usize {
        let mut count = 0;
        let start_value = start_value & PAGE_MASK;
        let mut start_bit = start_value & ELEM_MASK;
        for i in (start_value / ELEM_BITS) as usize..PAGE_SIZE as usize {
            let bits = self.storage[i];
            let elem_offset = i as u32 * ELEM_BITS;
            for j in start_bit..ELEM_BITS {
                if count >= out.len() {
                    return count;
                }
                if bits & (1 << j) == 0 {
                    continue;
                }
                let value = base | elem_offset | j;
                while *next_value < value && count < out.len() {
                    out[count] = *next_value;
                    count += 1;
                    *next_value += 1;
                }
                if *next_value < value {
                    // out of room before reaching this member
                    return count;
                }
                *next_value = value.saturating_add(1);
            }
            start_bit = 0;
        }
        count
    }

    /// Returns `true` if every member of `self` is a member of `other`.
    pub fn is_subset(&self, other: &BitPage) -> bool {
        self.storage
            .iter()
            .zip(other.storage.iter())
            .all(|(a, b)| a & !b == 0)
    }

    pub fn union(a: &BitPage, b: &BitPage) -> BitPage {
        a.process(b, |a, b| a | b)
    }

    pub fn intersect(a: &BitPage, b: &BitPage) -> BitPage {
        a.process(b, |a, b| a & b)
    }

    pub fn subtract(a: &BitPage, b: &BitPage) -> BitPage {
        a.process(b, |a, b| a & !b)
    }

    fn process(&self, other: &BitPage, op: impl Fn(Element, Element) -> Element) -> BitPage {
        let mut out = BitPage::new_zeroes();
        for (dst, (a, b)) in out
            .storage
            .iter_mut()
            .zip(self.storage.iter().zip(other.storage.iter()))
        {
            *dst = op(*a, *b);
        }
        out.mark_dirty();
        out
    }

    fn mark_dirty(&mut self) {
        self.len.set(DIRTY);
    }

    fn element_mut(&mut self, value: u32) -> &mut Element {
        &mut self.storage[element_index(value)]
    }
}

const fn element_index(value: u32) -> usize {
    ((value & PAGE_MASK) / ELEM_BITS) as usize
}

/// returns the bit to set in an element for this value
const fn bit_mask(value: u32) -> Element {
    1 << (value & ELEM_MASK)
}

impl Default for BitPage {
    fn default() -> Self {
        Self::new_zeroes()
    }
}

impl std::fmt::Debug for BitPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl Hash for BitPage {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.storage.hash(state);
    }
}

impl PartialEq for BitPage {
    fn eq(&self, other: &Self) -> bool {
        self.storage == other.storage
    }
}

impl Eq for BitPage {}

impl FromIterator<u32> for BitPage {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut out = BitPage::new_zeroes();
        for v in iter {
            out.insert(v);
        }
        out
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::Rng;
    use std::collections::BTreeSet;

    #[test]
    fn insert_remove_and_len() {
        let mut page = BitPage::new_zeroes();
        assert!(page.is_empty());
        assert!(page.insert(10));
        assert!(!page.insert(10));
        assert!(page.insert(511));
        assert!(page.insert(512 + 3));
        assert_eq!(page.len(), 3);
        assert!(page.contains(3));
        assert!(page.remove(10));
        assert!(!page.remove(10));
        assert_eq!(page.len(), 2);
        page.set(7, true);
        page.set(511, false);
        assert_eq!(page.iter().collect::<Vec<_>>(), vec![3, 7]);
    }

    #[test]
    fn add_then_remove_restores_page() {
        let before: BitPage = [1, 64, 300].into_iter().collect();
        let mut page = before.clone();
        page.insert(200);
        page.insert(200);
        page.remove(200);
        assert_eq!(page, before);
        assert_eq!(page.len(), before.len());
    }

    #[test]
    fn ranges() {
        let mut page = BitPage::new_zeroes();
        page.insert_range(60..=130);
        assert_eq!(page.len(), 71);
        assert!(page.contains(60) && page.contains(130));
        assert!(!page.contains(59) && !page.contains(131));

        page.remove_range(64..=127);
        assert_eq!(page.iter_ranges().collect::<Vec<_>>(), vec![60..=63, 128..=130]);

        page.insert_range(0..=511);
        assert_eq!(page.len(), 512);
        page.remove_range(0..=511);
        assert!(page.is_empty());

        // reversed ranges are ignored
        page.insert_range(10..=5);
        assert!(page.is_empty());
    }

    #[test]
    fn next_and_previous() {
        let page: BitPage = [0, 63, 64, 200, 511].into_iter().collect();

        let mut cp = INVALID;
        let mut seen = Vec::new();
        while page.next(&mut cp) {
            seen.push(cp);
        }
        assert_eq!(seen, vec![0, 63, 64, 200, 511]);
        assert_eq!(cp, INVALID);

        let mut cp = INVALID;
        let mut seen = Vec::new();
        while page.previous(&mut cp) {
            seen.push(cp);
        }
        assert_eq!(seen, vec![511, 200, 64, 63, 0]);
        assert_eq!(cp, INVALID);

        let mut cp = 100;
        assert!(page.next(&mut cp));
        assert_eq!(cp, 200);
        let mut cp = 100;
        assert!(page.previous(&mut cp));
        assert_eq!(cp, 64);
    }

    #[test]
    fn next_previous_at_page_boundary() {
        let page = BitPage::new_ones();
        let mut cp = PAGE_MASK;
        assert!(!page.next(&mut cp));
        assert_eq!(cp, INVALID);

        let mut cp = 0;
        assert!(!page.previous(&mut cp));
        assert_eq!(cp, INVALID);

        assert_eq!(page.first(), Some(0));
        assert_eq!(page.last(), Some(511));
        assert_eq!(BitPage::new_zeroes().first(), None);
    }

    #[test]
    fn write_in_chunks() {
        let page: BitPage = [1, 2, 70, 300, 400].into_iter().collect();
        let mut out = [0u32; 2];
        let mut all = Vec::new();
        let mut start = 0;
        loop {
            let n = page.write(1024, start, &mut out);
            all.extend_from_slice(&out[..n]);
            if n < out.len() {
                break;
            }
            start = (out[n - 1] & PAGE_MASK) + 1;
        }
        assert_eq!(all, vec![1025, 1026, 1094, 1324, 1424]);
    }

    #[test]
    fn write_inverted_fills_gaps() {
        let page: BitPage = [2, 3, 6].into_iter().collect();
        let mut out = [0u32; 16];
        let mut next_value = 0;
        let n = page.write_inverted(0, 0, &mut out, &mut next_value);
        assert_eq!(&out[..n], &[0, 1, 4, 5]);
        assert_eq!(next_value, 7);

        let mut small = [0u32; 3];
        let mut next_value = 0;
        let n = page.write_inverted(0, 0, &mut small, &mut next_value);
        assert_eq!(&small[..n], &[0, 1, 4]);
        assert_eq!(next_value, 5);
    }

    #[test]
    fn subset_and_set_ops() {
        let a: BitPage = [1, 5, 9].into_iter().collect();
        let b: BitPage = [1, 5, 9, 100].into_iter().collect();
        assert!(a.is_subset(&b));
        assert!(!b.is_subset(&a));
        assert!(BitPage::new_zeroes().is_subset(&a));

        assert_eq!(BitPage::union(&a, &b).len(), 4);
        assert_eq!(BitPage::intersect(&a, &b), a);
        assert_eq!(
            BitPage::subtract(&b, &a).iter().collect::<Vec<_>>(),
            vec![100]
        );
    }

    #[test]
    fn population_matches_brute_force() {
        let mut rng = rand::thread_rng();
        let mut page = BitPage::new_zeroes();
        let mut model = BTreeSet::new();
        for _ in 0..2000 {
            let val = rng.gen_range(0..PAGE_BITS);
            if rng.gen_bool(0.6) {
                page.insert(val);
                model.insert(val);
            } else {
                page.remove(val);
                model.remove(&val);
            }
            assert_eq!(page.len() as usize, model.len());
        }
        assert_eq!(page.iter().collect::<Vec<_>>(), model.into_iter().collect::<Vec<_>>());
    }
}
