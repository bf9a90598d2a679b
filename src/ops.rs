//! The public operator surface and range-query builder (§2.1, §6).
//!
//! `merge_sort`/`union`/`intersect`/`except` are the crate's language-
//! neutral entry points, each boxed to a uniform `Box<dyn OrderedCursor<R>
//! + Send>` so callers can compose operations over heterogeneous input
//! shapes without naming the iterator's generic parameters. The
//! `_by_key` variants cover the common case of ordering by a record's raw
//! key bytes with no projection, matching the "[key_fn]"/"[cmp]" optional
//! parameters of §6's language-neutral signatures.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::cursor::OrderedCursor;
use crate::error::Result;
use crate::reader::PagedRangeReader;
use crate::record::{RangeOptions, RangeSelector, Record, StreamingMode};
use crate::setalgebra::{Mode, SetAlgebraIterator};
use crate::transaction::Transaction;
use crate::transport::Transport;

/// Fluent construction of a `(begin, end, RangeOptions)` triple handed to
/// the Paged Range Reader (§2.1) — a constructor convenience only, it
/// does not alter reader semantics.
pub struct RangeQuery {
    transport: Arc<dyn Transport>,
    tx: Arc<dyn Transaction>,
    range: RangeSelector,
    options: RangeOptions,
    snapshot: bool,
}

impl RangeQuery {
    pub fn new(transport: Arc<dyn Transport>, tx: Arc<dyn Transaction>, range: RangeSelector) -> Self {
        let snapshot = tx.is_snapshot();
        Self { transport, tx, range, options: RangeOptions::default(), snapshot }
    }

    /// A range query over every key carrying the given prefix.
    pub fn prefix(
        transport: Arc<dyn Transport>,
        tx: Arc<dyn Transaction>,
        prefix: impl AsRef<[u8]>,
    ) -> Self {
        Self::new(transport, tx, RangeSelector::prefix(prefix))
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.options.limit = limit;
        self
    }

    pub fn target_bytes(mut self, target_bytes: u32) -> Self {
        self.options.target_bytes = target_bytes;
        self
    }

    pub fn streaming_mode(mut self, mode: StreamingMode) -> Self {
        self.options.streaming_mode = mode;
        self
    }

    pub fn reverse(mut self, reverse: bool) -> Self {
        self.options.reverse = reverse;
        self
    }

    pub fn snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    /// Build the underlying reader without boxing, for callers that want
    /// to name the concrete cursor type.
    pub fn reader(self) -> Result<PagedRangeReader> {
        PagedRangeReader::new(self.transport, self.tx, self.range, self.options, self.snapshot)
    }

    /// Build the reader and erase it to the uniform cursor trait object,
    /// ready to hand to [`union`]/[`intersect`]/[`except`].
    pub fn into_cursor(self) -> Result<Box<dyn OrderedCursor<Record> + Send>> {
        Ok(Box::new(self.reader()?))
    }
}

/// Ordered union (merge-sort with de-duplication) of already-built
/// cursors, keyed and compared by `key_fn`/`cmp` and projected through
/// `result_fn` (§4.D).
pub fn union<K, R, KeyFn, ResultFn, Cmp>(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
    key_fn: KeyFn,
    result_fn: ResultFn,
    cmp: Cmp,
) -> Result<Box<dyn OrderedCursor<R> + Send>>
where
    KeyFn: Fn(&Record) -> K + Send + 'static,
    ResultFn: Fn(&Record) -> R + Send + 'static,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send + 'static,
    K: Clone + Send + 'static,
    R: Send + 'static,
{
    Ok(Box::new(SetAlgebraIterator::new(Mode::Union, sources, key_fn, result_fn, cmp)?))
}

/// Set intersection over already-built cursors (§4.D).
pub fn intersect<K, R, KeyFn, ResultFn, Cmp>(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
    key_fn: KeyFn,
    result_fn: ResultFn,
    cmp: Cmp,
) -> Result<Box<dyn OrderedCursor<R> + Send>>
where
    KeyFn: Fn(&Record) -> K + Send + 'static,
    ResultFn: Fn(&Record) -> R + Send + 'static,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send + 'static,
    K: Clone + Send + 'static,
    R: Send + 'static,
{
    Ok(Box::new(SetAlgebraIterator::new(Mode::Intersect, sources, key_fn, result_fn, cmp)?))
}

/// Set difference: `sources[0]` minus every key present in `sources[1..]`
/// (§4.D). Not commutative — only the first input contributes records.
pub fn except<K, R, KeyFn, ResultFn, Cmp>(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
    key_fn: KeyFn,
    result_fn: ResultFn,
    cmp: Cmp,
) -> Result<Box<dyn OrderedCursor<R> + Send>>
where
    KeyFn: Fn(&Record) -> K + Send + 'static,
    ResultFn: Fn(&Record) -> R + Send + 'static,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send + 'static,
    K: Clone + Send + 'static,
    R: Send + 'static,
{
    Ok(Box::new(SetAlgebraIterator::new(Mode::Except, sources, key_fn, result_fn, cmp)?))
}

/// `union` keyed by `key_fn`/`cmp`, emitting whole [`Record`]s unchanged
/// — the shape named `merge_sort` in the language-neutral surface of §6.
pub fn merge_sort<K, KeyFn, Cmp>(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
    key_fn: KeyFn,
    cmp: Cmp,
) -> Result<Box<dyn OrderedCursor<Record> + Send>>
where
    KeyFn: Fn(&Record) -> K + Send + 'static,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send + 'static,
    K: Clone + Send + 'static,
{
    union(sources, key_fn, |r: &Record| r.clone(), cmp)
}

/// `merge_sort` ordered by the record's raw key bytes, no projection.
pub fn merge_sort_by_key(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
) -> Result<Box<dyn OrderedCursor<Record> + Send>> {
    merge_sort(sources, |r: &Record| r.key.clone(), |a, b| a.cmp(b))
}

/// `union` ordered by the record's raw key bytes, no projection.
pub fn union_by_key(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
) -> Result<Box<dyn OrderedCursor<Record> + Send>> {
    union(sources, |r: &Record| r.key.clone(), |r: &Record| r.clone(), |a, b| a.cmp(b))
}

/// `intersect` ordered by the record's raw key bytes, no projection.
pub fn intersect_by_key(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
) -> Result<Box<dyn OrderedCursor<Record> + Send>> {
    intersect(sources, |r: &Record| r.key.clone(), |r: &Record| r.clone(), |a, b| a.cmp(b))
}

/// `except` ordered by the record's raw key bytes, no projection.
pub fn except_by_key(
    sources: Vec<Box<dyn OrderedCursor<Record> + Send>>,
) -> Result<Box<dyn OrderedCursor<Record> + Send>> {
    except(sources, |r: &Record| r.key.clone(), |r: &Record| r.clone(), |a, b| a.cmp(b))
}
