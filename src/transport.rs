//! The transport contract (§6).
//!
//! The transport layer that actually issues range reads against the
//! remote store is out of scope for this crate — we specify only the
//! request/response shape it must honor. A production binding wires
//! [`Transport`] to the wire protocol of the actual store (the teacher
//! crate's `kv/remote.rs` does the analogous thing over a gRPC stream);
//! [`crate::testing::InMemoryTransport`] is the zero-I/O double used by
//! this crate's own tests.

use async_trait::async_trait;

use crate::error::Result;
use crate::record::{KeySelector, Page, RangeOptions};
use crate::transaction::Transaction;

/// One `get_range` call (§6): everything the backend needs to produce
/// the next [`Page`] of a range scan.
#[derive(Debug, Clone)]
pub struct RangeReadRequest {
    pub begin: KeySelector,
    pub end: KeySelector,
    pub options: RangeOptions,
    /// Monotonically increasing per range; `1` on the first page.
    pub iteration: u32,
    pub snapshot: bool,
}

/// The backend collaborator: given a transaction and a range-read
/// request, produce one [`Page`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_range(
        &self,
        tx: &dyn Transaction,
        request: RangeReadRequest,
    ) -> Result<Page>;
}
