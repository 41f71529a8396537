//! Values attached to non-overlapping ranges.

use std::ops::Range;

use crate::ranges::{Op, Operations, Ranges};

/// Whether `set`, `insert` and `drop` join neighbouring ranges that end up
/// holding equal values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MergeEqualItems {
    #[default]
    Yes,
    No,
}

/// One range and the value stored for it.
#[derive(Clone, Debug, PartialEq)]
pub struct Item<'a, T> {
    pub range: Range<i64>,
    pub value: &'a T,
}

/// A map from non-overlapping ranges to values.
///
/// Mutations go through [`Ranges`] and the operations it records are
/// replayed onto the values, so the two never disagree. The same
/// operations are appended to the caller's log, which lets other
/// containers follow along.
#[derive(Clone, Debug, PartialEq)]
pub struct RangedValues<T> {
    ranges: Ranges,
    values: Vec<T>,
}

impl<T> Default for RangedValues<T> {
    fn default() -> Self {
        RangedValues {
            ranges: Ranges::default(),
            values: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq> RangedValues<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` for `r`, replacing whatever overlapped it.
    pub fn set(&mut self, r: Range<i64>, value: T, ops: &mut Operations, merge: MergeEqualItems) {
        let ops_start = ops.len();
        self.ranges.set(r.clone(), ops);
        self.apply_operations_with_value(&ops[ops_start..], value);
        if merge == MergeEqualItems::Yes {
            self.merge_equal_items(r.start, ops);
            self.merge_equal_items(r.end, ops);
        }
    }

    /// Open a gap at `r.start` and store `value` for it; later ranges move
    /// up by the length of `r`.
    pub fn insert(
        &mut self,
        r: Range<i64>,
        value: T,
        ops: &mut Operations,
        merge: MergeEqualItems,
    ) {
        let ops_start = ops.len();
        self.ranges.insert(r.clone(), ops);
        self.apply_operations_with_value(&ops[ops_start..], value);
        if merge == MergeEqualItems::Yes {
            self.merge_equal_items(r.start, ops);
            self.merge_equal_items(r.end, ops);
        }
    }

    pub fn erase(&mut self, r: Range<i64>, ops: &mut Operations) {
        let ops_start = ops.len();
        self.ranges.erase(r, ops);
        self.apply_operations(&ops[ops_start..]);
    }

    /// Erase `r` and close the gap it leaves.
    pub fn drop(&mut self, r: Range<i64>, ops: &mut Operations, merge: MergeEqualItems) {
        let ops_start = ops.len();
        self.ranges.drop(r.clone(), ops);
        self.apply_operations(&ops[ops_start..]);
        if merge == MergeEqualItems::Yes {
            self.merge_equal_items(r.start, ops);
        }
    }

    pub fn shift(&mut self, from: i64, amount: i64, ops: &mut Operations) {
        self.ranges.shift(from, amount, ops);
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
        self.values.clear();
    }

    pub fn erase_from(&mut self, i: i64, ops: &mut Operations) {
        if let Some(last) = self.ranges.last() {
            self.erase(i..last.end, ops);
        }
    }

    pub fn erase_up_to(&mut self, i: i64, ops: &mut Operations) {
        if let Some(first) = self.ranges.first() {
            self.erase(first.start..i, ops);
        }
    }

    /// The stored ranges overlapping `r`, clipped to it, with their values.
    pub fn get_intersections_with(&self, r: Range<i64>) -> RangedValues<T> {
        let mut result = RangedValues::new();
        let mut ops = Operations::new();
        for intersection in self.ranges.get_intersections_with(r) {
            if let Some(index) = self.ranges.find(intersection.start) {
                result.set(
                    intersection,
                    self.values[index].clone(),
                    &mut ops,
                    MergeEqualItems::No,
                );
                ops.clear();
            }
        }
        result
    }

    /// Like [`get_intersections_with`](Self::get_intersections_with), but
    /// moved so that `r.start` lands on zero.
    pub fn get_intersections_starting_at_zero_with(&self, r: Range<i64>) -> RangedValues<T> {
        let mut result = self.get_intersections_with(r.clone());
        let mut ops = Operations::new();
        result.drop(0..r.start, &mut ops, MergeEqualItems::Yes);
        result
    }

    fn merge_equal_items(&mut self, i: i64, ops: &mut Operations) {
        let Some(end) = self.ranges.find(i) else {
            return;
        };
        if end == 0 || self.values[end - 1] != self.values[end] {
            return;
        }
        let ops_start = ops.len();
        self.ranges.merge_back(end, ops);
        self.apply_operations(&ops[ops_start..]);
    }

    fn apply_operations(&mut self, ops: &[Op]) {
        for op in ops {
            match op {
                Op::Split { index, .. } => {
                    let value = self.values[*index].clone();
                    self.values.insert(index + 1, value);
                }
                Op::Erase { indices } => {
                    self.values.drain(indices.clone());
                }
                // the only `New` comes from `set` or `insert`, which carry a value
                Op::New { .. } => debug_assert!(false, "new range without a value"),
                Op::Change { .. } => {}
            }
        }
    }

    fn apply_operations_with_value(&mut self, ops: &[Op], value: T) {
        let mut value = Some(value);
        for op in ops {
            match op {
                Op::New { index } => {
                    if let Some(value) = value.take() {
                        self.values.insert(*index, value);
                    }
                }
                other => self.apply_operations(std::slice::from_ref(other)),
            }
        }
    }
}

impl<T> RangedValues<T> {
    pub fn ranges(&self) -> &Ranges {
        &self.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get_item(&self, index: usize) -> Option<Item<'_, T>> {
        Some(Item {
            range: self.ranges.get(index)?,
            value: self.values.get(index)?,
        })
    }

    /// The item whose range contains `i`.
    pub fn get_item_with_enclosing_range(&self, i: i64) -> Option<Item<'_, T>> {
        self.get_item(self.ranges.find(i)?)
    }

    pub fn front(&self) -> Option<Item<'_, T>> {
        self.get_item(0)
    }

    pub fn back(&self) -> Option<Item<'_, T>> {
        self.get_item(self.len().checked_sub(1)?)
    }

    pub fn iter(&self) -> impl Iterator<Item = Item<'_, T>> + '_ {
        self.ranges
            .as_slice()
            .iter()
            .zip(&self.values)
            .map(|(range, value)| Item {
                range: range.clone(),
                value,
            })
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }
}
