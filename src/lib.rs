//! A set-algebra streaming engine over ordered, paged asynchronous range
//! reads from a remote key/value store.
//!
//! Given several independent, lexicographically ordered streams of
//! records — each defined by a key-range selector against the store —
//! this crate produces a single ordered stream that is the union
//! (merge-sort), intersection, or difference of its inputs, pull-driven
//! so nothing is fetched until the consumer asks for it.
//!
//! The moving pieces, leaves first:
//! - [`reader`]: drives the paged "get next page" protocol against one
//!   key range.
//! - [`cursor`]: the uniform pull interface ([`OrderedCursor`]) every
//!   producer in this crate implements.
//! - [`heap`]: the k-way merge heap behind the union step.
//! - [`setalgebra`]: the set-algebra iterator itself (union/intersect/
//!   except).
//! - [`pipeline`]: `select`/`where_`/`take`/`skip`/`distinct`/`to_list`
//!   composed on top of any cursor.
//! - [`ops`]: the public free-function surface plus the [`RangeQuery`]
//!   builder.
//!
//! [`cancel`] and [`error`] are ambient: every async entry point accepts
//! a [`CancellationToken`] and every fallible call returns [`Error`].

pub mod cancel;
pub mod config;
pub mod cursor;
pub mod error;
pub mod heap;
pub mod ops;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod setalgebra;
pub mod transaction;
pub mod transport;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use cancel::CancellationToken;
pub use config::{ReaderConfig, DEFAULT_READER_CONFIG};
pub use cursor::{Advance, CursorState, OrderedCursor};
pub use error::{BackendErrorCode, Error, ErrorKind, Result};
pub use ops::{
    except, except_by_key, intersect, intersect_by_key, merge_sort, merge_sort_by_key, union,
    union_by_key, RangeQuery,
};
pub use pipeline::{into_stream, OrderedCursorExt};
pub use reader::PagedRangeReader;
pub use record::{
    KeySelector, Page, RangeOptions, RangeSelector, Record, StreamingMode,
};
pub use setalgebra::{Mode, SetAlgebraIterator};
pub use transaction::Transaction;
pub use transport::{RangeReadRequest, Transport};
