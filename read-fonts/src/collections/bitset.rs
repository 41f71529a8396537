//! A sparse, ordered set of `u32` values built from [`BitPage`]s.
//!
//! Pages are allocated only for the 512-value blocks that have members, which
//! keeps sets of glyph ids or codepoints compact: those tend to be clustered.

use std::ops::RangeInclusive;

use super::bitpage::{BitPage, INVALID, PAGE_BITS, PAGE_MASK};

// log_2(PAGE_BITS)
const PAGE_BITS_LOG_2: u32 = PAGE_BITS.ilog2();

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PageInfo {
    // the value >> PAGE_BITS_LOG_2 of every member of the page
    major_value: u32,
    // index into `pages`
    index: u32,
}

/// A sparse, ordered set of `u32` values.
#[derive(Clone, Debug, Default)]
pub struct U32Set {
    pages: Vec<BitPage>,
    // sorted by major_value
    page_map: Vec<PageInfo>,
}

impl U32Set {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add `val`, returning `true` if it was not already a member.
    pub fn insert(&mut self, val: u32) -> bool {
        self.ensure_page(major_value(val)).insert(val)
    }

    /// Add every value in `range`.
    pub fn insert_range(&mut self, range: RangeInclusive<u32>) {
        let (start, end) = (*range.start(), *range.end());
        if start > end {
            return;
        }
        for major in major_value(start)..=major_value(end) {
            let page_start = start.max(major_start(major));
            let page_end = end.min(major_start(major) | PAGE_MASK);
            self.ensure_page(major).insert_range(page_start..=page_end);
        }
    }

    /// Remove `val`, returning `true` if it was a member.
    pub fn remove(&mut self, val: u32) -> bool {
        match self.page_index(major_value(val)) {
            Some(idx) => self.pages[idx].remove(val),
            None => false,
        }
    }

    /// Remove every value in `range`.
    pub fn remove_range(&mut self, range: RangeInclusive<u32>) {
        let (start, end) = (*range.start(), *range.end());
        if start > end {
            return;
        }
        let (first_major, last_major) = (major_value(start), major_value(end));
        for info in self.page_map.iter() {
            if info.major_value < first_major || info.major_value > last_major {
                continue;
            }
            let page_start = start.max(major_start(info.major_value));
            let page_end = end.min(major_start(info.major_value) | PAGE_MASK);
            self.pages[info.index as usize].remove_range(page_start..=page_end);
        }
    }

    pub fn contains(&self, val: u32) -> bool {
        self.page_index(major_value(val))
            .is_some_and(|idx| self.pages[idx].contains(val))
    }

    pub fn len(&self) -> u64 {
        self.pages.iter().map(|page| page.len() as u64).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(BitPage::is_empty)
    }

    pub fn clear(&mut self) {
        self.pages.clear();
        self.page_map.clear();
    }

    /// Advance `codepoint` to the next member of the set.
    ///
    /// Pass [`INVALID`] to start from the smallest member. Returns `false`
    /// and leaves `codepoint` as [`INVALID`] once the set is exhausted.
    pub fn next(&self, codepoint: &mut u32) -> bool {
        let start_major = if *codepoint == INVALID {
            0
        } else {
            major_value(*codepoint)
        };
        let first = self
            .page_map
            .partition_point(|info| info.major_value < start_major);
        for info in &self.page_map[first..] {
            let page = &self.pages[info.index as usize];
            let mut local = if info.major_value == start_major && *codepoint != INVALID {
                *codepoint & PAGE_MASK
            } else {
                INVALID
            };
            if page.next(&mut local) {
                *codepoint = major_start(info.major_value) | local;
                return true;
            }
        }
        *codepoint = INVALID;
        false
    }

    /// Move `codepoint` back to the previous member of the set.
    ///
    /// Pass [`INVALID`] to start from the largest member.
    pub fn previous(&self, codepoint: &mut u32) -> bool {
        let end_major = if *codepoint == INVALID {
            u32::MAX
        } else {
            major_value(*codepoint)
        };
        let end = self
            .page_map
            .partition_point(|info| info.major_value <= end_major);
        for info in self.page_map[..end].iter().rev() {
            let page = &self.pages[info.index as usize];
            let mut local = if info.major_value == end_major && *codepoint != INVALID {
                *codepoint & PAGE_MASK
            } else {
                INVALID
            };
            if page.previous(&mut local) {
                *codepoint = major_start(info.major_value) | local;
                return true;
            }
        }
        *codepoint = INVALID;
        false
    }

    pub fn first(&self) -> Option<u32> {
        let mut cp = INVALID;
        self.next(&mut cp).then_some(cp)
    }

    pub fn last(&self) -> Option<u32> {
        let mut cp = INVALID;
        self.previous(&mut cp).then_some(cp)
    }

    /// Iterate the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.page_map.iter().flat_map(|info| {
            let base = major_start(info.major_value);
            self.pages[info.index as usize].iter().map(move |v| base | v)
        })
    }

    /// Iterate maximal runs of consecutive members, joining runs across pages.
    pub fn iter_ranges(&self) -> impl Iterator<Item = RangeInclusive<u32>> + '_ {
        let mut ranges = self
            .page_map
            .iter()
            .flat_map(|info| {
                let base = major_start(info.major_value);
                self.pages[info.index as usize]
                    .iter_ranges()
                    .map(move |r| (base | r.start())..=(base | r.end()))
            })
            .peekable();
        std::iter::from_fn(move || {
            let first = ranges.next()?;
            let (start, mut end) = (*first.start(), *first.end());
            while let Some(next) = ranges.next_if(|r| end != u32::MAX && *r.start() == end + 1) {
                end = *next.end();
            }
            Some(start..=end)
        })
    }

    /// Write members greater than `after` into `out`, returning how many were
    /// written. Pass [`INVALID`] to start from the beginning.
    ///
    /// The output is bounded by `out.len()`; call again with the last value
    /// written to continue.
    pub fn write(&self, after: u32, out: &mut [u32]) -> usize {
        let mut count = 0;
        let start_major = if after == INVALID { 0 } else { major_value(after) };
        let first = self
            .page_map
            .partition_point(|info| info.major_value < start_major);
        for info in &self.page_map[first..] {
            if count == out.len() {
                break;
            }
            let start_value = if info.major_value == start_major && after != INVALID {
                match (after & PAGE_MASK).checked_add(1) {
                    Some(v) if v < PAGE_BITS => v,
                    _ => continue,
                }
            } else {
                0
            };
            count += self.pages[info.index as usize].write(
                major_start(info.major_value),
                start_value,
                &mut out[count..],
            );
        }
        count
    }

    /// Write the values in `next_value..` that are *not* members into `out`.
    ///
    /// `next_value` is the running cursor: the smallest value not yet
    /// considered. It is updated as values are written, so a caller can loop
    /// with a small buffer until this returns fewer than `out.len()` items.
    /// Gaps after the last member are not written; the caller knows where the
    /// complement ends.
    pub fn write_inverted(&self, next_value: &mut u32, out: &mut [u32]) -> usize {
        let mut count = 0;
        let start_major = major_value(*next_value);
        let first = self
            .page_map
            .partition_point(|info| info.major_value < start_major);
        for info in &self.page_map[first..] {
            if count == out.len() {
                break;
            }
            let base = major_start(info.major_value);
            let start_value = if info.major_value == start_major {
                *next_value & PAGE_MASK
            } else {
                0
            };
            count += self.pages[info.index as usize].write_inverted(
                base,
                start_value,
                &mut out[count..],
                next_value,
            );
        }
        count
    }

    /// Returns `true` if every member of `self` is also in `other`.
    pub fn is_subset(&self, other: &U32Set) -> bool {
        self.page_map.iter().all(|info| {
            let page = &self.pages[info.index as usize];
            match other.page_index(info.major_value) {
                Some(idx) => page.is_subset(&other.pages[idx]),
                None => page.is_empty(),
            }
        })
    }

    /// Add every member of `other` to `self`.
    pub fn union(&mut self, other: &U32Set) {
        for info in &other.page_map {
            let theirs = &other.pages[info.index as usize];
            let ours = self.ensure_page(info.major_value);
            *ours = BitPage::union(ours, theirs);
        }
    }

    /// Keep only the members that are also in `other`.
    pub fn intersect(&mut self, other: &U32Set) {
        for info in &self.page_map {
            let ours = &mut self.pages[info.index as usize];
            match other.page_index(info.major_value) {
                Some(idx) => *ours = BitPage::intersect(ours, &other.pages[idx]),
                None => ours.clear(),
            }
        }
    }

    fn page_index(&self, major: u32) -> Option<usize> {
        self.page_map
            .binary_search_by(|info| info.major_value.cmp(&major))
            .ok()
            .map(|map_idx| self.page_map[map_idx].index as usize)
    }

    fn ensure_page(&mut self, major: u32) -> &mut BitPage {
        let idx = match self
            .page_map
            .binary_search_by(|info| info.major_value.cmp(&major))
        {
            Ok(map_idx) => self.page_map[map_idx].index as usize,
            Err(map_idx) => {
                let index = self.pages.len();
                self.pages.push(BitPage::new_zeroes());
                self.page_map.insert(
                    map_idx,
                    PageInfo {
                        major_value: major,
                        index: index as u32,
                    },
                );
                index
            }
        };
        &mut self.pages[idx]
    }
}

impl PartialEq for U32Set {
    fn eq(&self, other: &Self) -> bool {
        self.iter_ranges().eq(other.iter_ranges())
    }
}

impl Eq for U32Set {}

impl FromIterator<u32> for U32Set {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = U32Set::empty();
        set.extend(iter);
        set
    }
}

impl Extend<u32> for U32Set {
    fn extend<I: IntoIterator<Item = u32>>(&mut self, iter: I) {
        for val in iter {
            self.insert(val);
        }
    }
}

const fn major_value(value: u32) -> u32 {
    value >> PAGE_BITS_LOG_2
}

const fn major_start(major: u32) -> u32 {
    major << PAGE_BITS_LOG_2
}
