//! The transaction contract (§1, §5).
//!
//! The transaction object itself is out of scope: this crate neither
//! creates nor commits one. What we need from it is narrow and
//! specified here as a trait so the core can be exercised against a
//! test double without pulling in a real store client.

use crate::cancel::CancellationToken;
use crate::error::Result;

/// What the streaming engine needs from a transaction: a read snapshot
/// (implicit — every read through this trait is consistent with it), an
/// ambient cancellation signal, a "read allowed" precondition, and a
/// read-only view of the accumulated write-size estimate (§5).
pub trait Transaction: Send + Sync {
    /// The cancellation token ambient to this transaction. Every cursor
    /// spawned against this transaction observes the same token.
    fn cancellation(&self) -> CancellationToken;

    /// Whether snapshot reads are requested for ranges read through
    /// this transaction by default. Individual reads may still override
    /// this per `RangeOptions`/call site.
    fn is_snapshot(&self) -> bool {
        false
    }

    /// Enforce any "reads are still allowed" precondition (e.g. the
    /// transaction hasn't been committed or reset). Checked before
    /// issuing a range read.
    fn ensure_read_allowed(&self) -> Result<()> {
        Ok(())
    }

    /// Read-only view of the write-size estimate accumulated on this
    /// transaction by writes issued elsewhere (§5). The core never
    /// calls this; it exists so callers composing reads and writes on
    /// the same transaction can observe it.
    fn approximate_size(&self) -> u64 {
        0
    }
}
