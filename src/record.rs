//! The wire-level data model: records, range selectors, and pages.
//!
//! Keys and values are opaque byte sequences throughout the core; only
//! the key participates in ordering (§3). Higher layers (directory /
//! subspace / tuple encodings) are out of scope here — they only ever
//! hand us the already-encoded bytes.

use bytes::Bytes;
use std::cmp::Ordering;

/// An opaque `(key, value)` pair pulled from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub key: Bytes,
    pub value: Bytes,
}

impl Record {
    pub fn new(key: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A symbolic reference to a key: `(reference_key, or_equal, offset)`,
/// resolved by the backend to a concrete key (§6).
///
/// `or_equal = false, offset = 1` means "first key strictly greater than
/// `reference_key`"; `or_equal = true, offset = 1` means "first key
/// greater than or equal to `reference_key`".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySelector {
    pub reference_key: Bytes,
    pub or_equal: bool,
    pub offset: i32,
}

impl KeySelector {
    pub fn new(reference_key: impl Into<Bytes>, or_equal: bool, offset: i32) -> Self {
        Self {
            reference_key: reference_key.into(),
            or_equal,
            offset,
        }
    }

    /// First key strictly greater than `key`.
    pub fn first_greater_than(key: impl Into<Bytes>) -> Self {
        Self::new(key, false, 1)
    }

    /// First key greater than or equal to `key`.
    pub fn first_greater_or_equal(key: impl Into<Bytes>) -> Self {
        Self::new(key, true, 1)
    }

    /// Last key strictly less than `key`.
    pub fn last_less_than(key: impl Into<Bytes>) -> Self {
        Self::new(key, true, 0)
    }

    /// Last key less than or equal to `key`.
    pub fn last_less_or_equal(key: impl Into<Bytes>) -> Self {
        Self::new(key, false, 0)
    }
}

/// A half-open `[begin, end)` range, expressed as a pair of selectors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeSelector {
    pub begin: KeySelector,
    pub end: KeySelector,
}

impl RangeSelector {
    pub fn new(begin: KeySelector, end: KeySelector) -> Self {
        Self { begin, end }
    }

    /// A range selecting every key with the given prefix.
    pub fn prefix(prefix: impl AsRef<[u8]>) -> Self {
        let prefix = prefix.as_ref();
        let mut end = prefix.to_vec();
        strinc(&mut end);
        Self {
            begin: KeySelector::first_greater_or_equal(Bytes::copy_from_slice(prefix)),
            end: KeySelector::first_greater_or_equal(Bytes::from(end)),
        }
    }
}

/// Smallest byte string strictly greater than every string with `key` as
/// a prefix, used to build prefix-range end selectors.
fn strinc(key: &mut Vec<u8>) {
    while let Some(&last) = key.last() {
        if last == 0xff {
            key.pop();
        } else {
            *key.last_mut().unwrap() += 1;
            return;
        }
    }
}

/// Hint to the backend about desired page sizing (§3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamingMode {
    /// Starts small, grows page size on successive pages.
    #[default]
    Iterator,
    Small,
    Medium,
    Large,
    /// Hints a single server should serve every page of this range.
    Serial,
    /// Asks the backend for one large page.
    WantAll,
    /// Requires `limit > 0`; no adaptive sizing.
    Exact,
}

/// Configuration recognized by the [`PagedRangeReader`](crate::reader::PagedRangeReader).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeOptions {
    /// Maximum records to deliver from the range. `0` means unbounded.
    pub limit: u32,
    /// Soft cap on bytes per page. `0` means the backend's default.
    pub target_bytes: u32,
    pub streaming_mode: StreamingMode,
    pub reverse: bool,
}

impl Default for RangeOptions {
    fn default() -> Self {
        Self {
            limit: 0,
            target_bytes: 0,
            streaming_mode: StreamingMode::Iterator,
            reverse: false,
        }
    }
}

impl RangeOptions {
    /// Validate the `exact` streaming mode's precondition (§4.A).
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.streaming_mode == StreamingMode::Exact && self.limit == 0 {
            return Err(crate::error::Error::contract(
                "streaming_mode `exact` requires a non-zero limit",
            ));
        }
        Ok(())
    }
}

/// One batch of records returned by a single backend range read (§3).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub records: Vec<Record>,
    pub has_more: bool,
    pub iteration: u32,
    pub reversed: bool,
}

impl Page {
    /// The only legal terminal shape: no records and no more pages.
    pub fn is_terminal_empty(&self) -> bool {
        self.records.is_empty() && !self.has_more
    }
}

/// Compare two keys respecting a page's effective direction.
pub fn key_order(reversed: bool, a: &Bytes, b: &Bytes) -> Ordering {
    if reversed {
        b.cmp(a)
    } else {
        a.cmp(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_range_end_increments_last_non_ff_byte() {
        let r = RangeSelector::prefix(b"ab");
        assert_eq!(r.end.reference_key.as_ref(), b"ac");
    }

    #[test]
    fn prefix_range_end_strips_trailing_ff() {
        let r = RangeSelector::prefix(&[0x01, 0xff]);
        assert_eq!(r.end.reference_key.as_ref(), &[0x02]);
    }

    #[test]
    fn exact_mode_requires_limit() {
        let opts = RangeOptions {
            limit: 0,
            streaming_mode: StreamingMode::Exact,
            ..Default::default()
        };
        assert!(opts.validate().is_err());
    }
}
