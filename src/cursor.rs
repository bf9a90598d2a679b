//! The uniform pull interface every component in this crate is built on
//! (§4.B).
//!
//! Every producer — a [`PagedRangeReader`](crate::reader::PagedRangeReader),
//! the [`SetAlgebraIterator`](crate::setalgebra::SetAlgebraIterator), and
//! every [`pipeline`](crate::pipeline) combinator — implements
//! [`OrderedCursor`]. At most one `advance` is ever outstanding per
//! cursor; calling it again before the first resolves is a programming
//! error, mirrored here by `&mut self` rather than `&self`.

use async_trait::async_trait;

use crate::error::Result;

/// Logical state machine of a cursor (§3). `current()` is only ever
/// meaningful in `HasCurrent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Fresh,
    HasCurrent,
    Exhausted,
    Faulted,
    Disposed,
}

/// Outcome of a successful `advance` call. A failed call surfaces its
/// fault through `Result::Err` instead of a third variant here, so
/// faults compose naturally with `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    Advanced,
    End,
}

/// A stateful, pull-based producer of ordered items of type `T`.
#[async_trait]
pub trait OrderedCursor<T>: Send
where
    T: Send,
{
    /// Advance to the next item, suspending on I/O if needed. After
    /// `End` or a fault, subsequent calls immediately return the same
    /// terminal status without touching the backend again.
    async fn advance(&mut self) -> Result<Advance>;

    /// The current item. Defined only when `state() == HasCurrent`.
    fn current(&self) -> Option<&T>;

    /// Release every resource this cursor holds (pending I/O, transport
    /// handles). Idempotent; safe to call from any state.
    async fn dispose(&mut self);

    fn state(&self) -> CursorState;
}
