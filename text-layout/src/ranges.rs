//! Sorted, non-overlapping ranges.
//!
//! Every mutation records what it did to the list as a sequence of [`Op`]s,
//! so that a container kept in parallel with the ranges (such as the values
//! of a [`RangedValues`](crate::RangedValues)) can be brought back in sync.

use std::ops::Range;

/// One change to the list of ranges.
///
/// Indices refer to positions in the list at the time the operation was
/// applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Op {
    /// A range was inserted at `index`.
    New { index: usize },
    /// The range at `index` was cut in two; `right` now lives at
    /// `index + 1`.
    Split {
        index: usize,
        left: Range<i64>,
        right: Range<i64>,
    },
    /// The ranges at these indices were removed.
    Erase { indices: Range<usize> },
    /// The range at `index` changed bounds but refers to the same data.
    Change {
        index: usize,
        old: Range<i64>,
        new: Range<i64>,
    },
}

/// The log of operations produced by mutating a [`Ranges`].
pub type Operations = Vec<Op>;

/// A sorted list of non-empty, non-overlapping ranges.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Ranges {
    ranges: Vec<Range<i64>>,
}

impl Ranges {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap ranges that are already sorted and disjoint.
    pub fn from_sorted(ranges: Vec<Range<i64>>) -> Self {
        debug_assert!(ranges.windows(2).all(|w| w[0].end <= w[1].start));
        Ranges { ranges }
    }

    /// Cut the range containing `i` in two at `i`.
    ///
    /// Does nothing if `i` is not inside a range or is already the start
    /// of one.
    pub fn split(&mut self, i: i64, ops: &mut Operations) {
        let Some(index) = self.get_index_for_enclosing_range(i) else {
            return;
        };
        let range = self.ranges[index].clone();
        if range.start == i {
            return;
        }
        ops.push(Op::Split {
            index,
            left: range.start..i,
            right: i..range.end,
        });
        self.ranges[index].end = i;
        self.ranges.insert(index + 1, i..range.end);
    }

    /// Remove everything inside `r`, cutting ranges that straddle its ends.
    pub fn erase(&mut self, r: Range<i64>, ops: &mut Operations) {
        if r.is_empty() {
            return;
        }
        self.split(r.start, ops);
        self.split(r.end, ops);
        let first = self.lower_bound_start(r.start);
        let beyond_last = first + self.ranges[first..].partition_point(|x| x.start < r.end);
        if first != self.ranges.len() {
            ops.push(Op::Erase {
                indices: first..beyond_last,
            });
        }
        self.ranges.drain(first..beyond_last);
    }

    /// Erase `r` and move everything after it back to close the gap.
    pub fn drop(&mut self, r: Range<i64>, ops: &mut Operations) {
        let len = r.end - r.start;
        self.erase(r.clone(), ops);
        self.shift(r.end, -len, ops);
    }

    /// Move every range starting at or after `from` by `amount`.
    pub fn shift(&mut self, from: i64, amount: i64, ops: &mut Operations) {
        if amount == 0 {
            return;
        }
        let first = self.lower_bound_start(from);
        for (index, range) in self.ranges.iter_mut().enumerate().skip(first) {
            let old = range.clone();
            *range = old.start + amount..old.end + amount;
            ops.push(Op::Change {
                index,
                old,
                new: range.clone(),
            });
        }
    }

    /// Make `r` one of the ranges, replacing whatever it overlapped.
    pub fn set(&mut self, r: Range<i64>, ops: &mut Operations) {
        if r.is_empty() {
            return;
        }
        self.erase(r.clone(), ops);
        let index = self.lower_bound_start(r.start);
        ops.push(Op::New { index });
        self.ranges.insert(index, r);
    }

    /// Open a gap at `r.start` as wide as `r` and put `r` in it.
    pub fn insert(&mut self, r: Range<i64>, ops: &mut Operations) {
        if r.is_empty() {
            return;
        }
        self.split(r.start, ops);
        self.shift(r.start, r.end - r.start, ops);
        let index = self.lower_bound_start(r.start);
        self.ranges.insert(index, r);
        ops.push(Op::New { index });
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    /// Erase everything from `i` onwards.
    pub fn erase_from(&mut self, i: i64, ops: &mut Operations) {
        if let Some(last) = self.ranges.last() {
            let end = last.end;
            self.erase(i..end, ops);
        }
    }

    /// Join the range at `i` onto the one before it, if the two touch.
    pub fn merge_back(&mut self, i: usize, ops: &mut Operations) {
        if i == 0 || i >= self.ranges.len() {
            return;
        }
        let start = i - 1;
        if self.ranges[start].end != self.ranges[i].start {
            return;
        }
        let old = self.ranges[start].clone();
        self.ranges[start].end = self.ranges[i].end;
        ops.push(Op::Change {
            index: start,
            old,
            new: self.ranges[start].clone(),
        });
        ops.push(Op::Erase { indices: i..i + 1 });
        self.ranges.remove(i);
    }

    /// The parts of the stored ranges that overlap `r`.
    pub fn get_intersections_with(&self, r: Range<i64>) -> Vec<Range<i64>> {
        let first = self.ranges.partition_point(|x| x.end <= r.start);
        self.ranges[first..]
            .iter()
            .take_while(|x| x.start < r.end)
            .filter_map(|x| {
                let intersection = x.start.max(r.start)..x.end.min(r.end);
                (!intersection.is_empty()).then_some(intersection)
            })
            .collect()
    }

    /// The index of the range containing `i`.
    pub fn find(&self, i: i64) -> Option<usize> {
        let index = self.ranges.partition_point(|x| x.end <= i);
        self.ranges
            .get(index)
            .is_some_and(|x| x.start <= i)
            .then_some(index)
    }

    pub fn get_index_for_enclosing_range(&self, i: i64) -> Option<usize> {
        self.find(i)
    }

    /// `true` if every value in `range` is inside some stored range.
    ///
    /// An empty range is covered if its start is.
    pub fn covers(&self, range: Range<i64>) -> bool {
        let Some(first) = self.find(range.start) else {
            return false;
        };
        let mut prev_end = None;
        for current in &self.ranges[first..] {
            if prev_end.is_some_and(|end| end != current.start) {
                return false;
            }
            if range.end <= current.end {
                return true;
            }
            prev_end = Some(current.end);
        }
        false
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Range<i64>> {
        self.ranges.get(index).cloned()
    }

    pub fn first(&self) -> Option<Range<i64>> {
        self.ranges.first().cloned()
    }

    pub fn last(&self) -> Option<Range<i64>> {
        self.ranges.last().cloned()
    }

    pub fn iter(&self) -> impl Iterator<Item = Range<i64>> + '_ {
        self.ranges.iter().cloned()
    }

    pub fn as_slice(&self) -> &[Range<i64>] {
        &self.ranges
    }

    fn lower_bound_start(&self, value: i64) -> usize {
        self.ranges.partition_point(|x| x.start < value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::{thread_rng, Rng};

    fn make(ranges: &[Range<i64>]) -> Ranges {
        Ranges::from_sorted(ranges.to_vec())
    }

    #[test]
    fn split_records_both_halves() {
        let mut ranges = make(&[0..10, 10..20]);
        let mut ops = Operations::new();
        ranges.split(15, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..10, 10..15, 15..20]);
        assert_eq!(
            ops,
            vec![Op::Split {
                index: 1,
                left: 10..15,
                right: 15..20
            }]
        );

        // splitting at a boundary or outside is a no-op
        ops.clear();
        ranges.split(10, &mut ops);
        ranges.split(25, &mut ops);
        assert!(ops.is_empty());
    }

    #[test]
    fn erase_cuts_straddling_ranges() {
        let mut ranges = make(&[0..10, 10..20, 30..40]);
        let mut ops = Operations::new();
        ranges.erase(5..35, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..5, 35..40]);
        assert_eq!(ops.last(), Some(&Op::Erase { indices: 1..4 }));
    }

    #[test]
    fn drop_closes_the_gap() {
        let mut ranges = make(&[0..10, 10..20, 30..40]);
        let mut ops = Operations::new();
        ranges.drop(5..15, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..5, 5..10, 20..30]);
    }

    #[test]
    fn set_replaces_overlapped() {
        let mut ranges = make(&[0..10, 20..30]);
        let mut ops = Operations::new();
        ranges.set(5..25, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..5, 5..25, 25..30]);
        assert_eq!(ops.last(), Some(&Op::New { index: 1 }));
    }

    #[test]
    fn insert_shifts_following() {
        let mut ranges = make(&[0..10, 20..30]);
        let mut ops = Operations::new();
        ranges.insert(5..8, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..5, 5..8, 8..13, 23..33]);
        assert_eq!(ops.last(), Some(&Op::New { index: 1 }));
    }

    #[test]
    fn merge_back_joins_touching() {
        let mut ranges = make(&[0..5, 5..10, 12..20]);
        let mut ops = Operations::new();
        ranges.merge_back(2, &mut ops);
        assert!(ops.is_empty());
        ranges.merge_back(1, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..10, 12..20]);
        assert_eq!(
            ops,
            vec![
                Op::Change {
                    index: 0,
                    old: 0..5,
                    new: 0..10
                },
                Op::Erase { indices: 1..2 }
            ]
        );
    }

    #[test]
    fn queries() {
        let ranges = make(&[0..10, 10..20, 30..40]);
        assert_eq!(ranges.find(0), Some(0));
        assert_eq!(ranges.find(10), Some(1));
        assert_eq!(ranges.find(25), None);
        assert_eq!(ranges.find(40), None);
        assert_eq!(ranges.get_intersections_with(5..35), vec![5..10, 10..20, 30..35]);
        assert!(ranges.get_intersections_with(20..30).is_empty());
        assert!(ranges.covers(3..20));
        assert!(!ranges.covers(3..31));
        assert!(ranges.covers(35..35));
        assert!(!ranges.covers(25..25));
    }

    #[test]
    fn erase_from_end() {
        let mut ranges = make(&[0..10, 10..20]);
        let mut ops = Operations::new();
        ranges.erase_from(15, &mut ops);
        assert_eq!(ranges.as_slice(), &[0..10, 10..15]);
    }

    #[test]
    fn random_operations_keep_ranges_sorted_and_disjoint() {
        let mut rng = thread_rng();
        for _ in 0..50 {
            let mut ranges = Ranges::new();
            let mut ops = Operations::new();
            for _ in 0..100 {
                let start = rng.gen_range(0..200);
                let r = start..start + rng.gen_range(0..30);
                match rng.gen_range(0..6) {
                    0 => ranges.set(r, &mut ops),
                    1 => ranges.insert(r, &mut ops),
                    2 => ranges.erase(r, &mut ops),
                    3 => ranges.drop(r, &mut ops),
                    4 => ranges.split(start, &mut ops),
                    _ => ranges.shift(start, rng.gen_range(0..10), &mut ops),
                }
                let slice = ranges.as_slice();
                assert!(slice.iter().all(|r| !r.is_empty()), "{slice:?}");
                assert!(
                    slice.windows(2).all(|w| w[0].end <= w[1].start),
                    "{slice:?}"
                );
            }
        }
    }
}
