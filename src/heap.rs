//! Component C: the Merge Heap (§4.C).
//!
//! A small array-backed binary min-heap, bounded at `N` entries (one
//! per input cursor), ordered by a caller-supplied `key_compare`
//! rather than `K: Ord` — the spec's `key_fn`/`key_compare` are plain
//! closures, not necessarily the type's natural order. Ties (equal
//! keys from different inputs) break by ascending `cursor_id`, the
//! input's position in the constructor list, for a stable merge
//! (§4.C, §9 open question).
//!
//! Only the Union step of [`SetAlgebraIterator`](crate::setalgebra::SetAlgebraIterator)
//! drives this heap; Intersect and Except follow §4.D's literal
//! max-of-current-keys / advance-while-less-than algorithms, which scan
//! the slot list directly rather than through a priority structure (see
//! `setalgebra.rs`'s `step_intersect`/`step_except`). The O(log N)
//! amortized cost per emitted record is therefore a Union-only bound;
//! the other two modes are O(N) per step over the `N` inputs.
//!
//! Grounded in spirit on the teacher's `etl/data_provider.rs`
//! (`DataProvider::to_next`, an ordered external-merge source feeding a
//! k-way merge during bulk load) generalized from a single sorted file
//! reader to N live async cursors.

use std::cmp::Ordering;

/// One slot: the smallest unconsumed item of one input cursor.
#[derive(Debug, Clone)]
pub struct HeapEntry<K, T> {
    pub cursor_id: usize,
    pub key: K,
    pub item: T,
}

/// A bounded k-way merge heap ordered by a caller-supplied comparator.
pub struct MergeHeap<K, T, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    entries: Vec<HeapEntry<K, T>>,
    cmp: C,
}

impl<K, T, C> MergeHeap<K, T, C>
where
    C: Fn(&K, &K) -> Ordering,
{
    pub fn new(capacity: usize, cmp: C) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
            cmp,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Stable order: by key first, then ascending `cursor_id`.
    fn order(&self, a: &HeapEntry<K, T>, b: &HeapEntry<K, T>) -> Ordering {
        (self.cmp)(&a.key, &b.key).then_with(|| a.cursor_id.cmp(&b.cursor_id))
    }

    pub fn push(&mut self, entry: HeapEntry<K, T>) {
        self.entries.push(entry);
        self.sift_up(self.entries.len() - 1);
    }

    pub fn peek_min(&self) -> Option<&HeapEntry<K, T>> {
        self.entries.first()
    }

    pub fn pop_min(&mut self) -> Option<HeapEntry<K, T>> {
        if self.entries.is_empty() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.entries.swap(0, last);
        let min = self.entries.pop();
        if !self.entries.is_empty() {
            self.sift_down(0);
        }
        min
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if self.order(&self.entries[idx], &self.entries[parent]) == Ordering::Less {
                self.entries.swap(idx, parent);
                idx = parent;
            } else {
                break;
            }
        }
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = 2 * idx + 2;
            let mut smallest = idx;
            if left < len && self.order(&self.entries[left], &self.entries[smallest]) == Ordering::Less {
                smallest = left;
            }
            if right < len && self.order(&self.entries[right], &self.entries[smallest]) == Ordering::Less {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.entries.swap(idx, smallest);
            idx = smallest;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(cursor_id: usize, key: i32) -> HeapEntry<i32, i32> {
        HeapEntry { cursor_id, key, item: key }
    }

    #[test]
    fn pops_in_ascending_key_order() {
        let mut heap = MergeHeap::new(4, |a: &i32, b: &i32| a.cmp(b));
        heap.push(entry(0, 5));
        heap.push(entry(1, 1));
        heap.push(entry(2, 3));
        heap.push(entry(3, 2));

        let mut out = vec![];
        while let Some(e) = heap.pop_min() {
            out.push(e.key);
        }
        assert_eq!(out, vec![1, 2, 3, 5]);
    }

    #[test]
    fn ties_break_by_ascending_cursor_id() {
        let mut heap = MergeHeap::new(3, |a: &i32, b: &i32| a.cmp(b));
        heap.push(entry(2, 1));
        heap.push(entry(0, 1));
        heap.push(entry(1, 1));

        let first = heap.pop_min().unwrap();
        assert_eq!(first.cursor_id, 0);
        let second = heap.pop_min().unwrap();
        assert_eq!(second.cursor_id, 1);
        let third = heap.pop_min().unwrap();
        assert_eq!(third.cursor_id, 2);
    }
}
