//! Zero-I/O test double for [`Transport`] (§1.1), standing in for a live
//! backend the way the teacher's `kv/mod.rs` `new_mem_database` /
//! `MemoryKv` stand in for a real MDBX environment: same role (a
//! deterministic, in-process collaborator scenario tests and proptests
//! can drive without any network), adapted from an embedded
//! key/value environment to an in-memory paged chunk emitter.

use parking_lot::Mutex;

use async_trait::async_trait;

use crate::cancel::CancellationToken;
use crate::error::Result;
use crate::record::{KeySelector, Page, Record};
use crate::transaction::Transaction;
use crate::transport::{RangeReadRequest, Transport};

/// A [`Transaction`] double carrying only a cancellation token and a
/// read-allowed flag a test can flip to exercise `ensure_read_allowed`.
pub struct TestTransaction {
    token: CancellationToken,
    snapshot: bool,
    read_allowed: Mutex<bool>,
}

impl TestTransaction {
    pub fn new() -> Self {
        Self {
            token: CancellationToken::new(),
            snapshot: false,
            read_allowed: Mutex::new(true),
        }
    }

    pub fn snapshot(mut self, snapshot: bool) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Simulate the transaction becoming unreadable (committed, reset).
    pub fn forbid_reads(&self) {
        *self.read_allowed.lock() = false;
    }
}

impl Default for TestTransaction {
    fn default() -> Self {
        Self::new()
    }
}

impl Transaction for TestTransaction {
    fn cancellation(&self) -> CancellationToken {
        self.token.clone()
    }

    fn is_snapshot(&self) -> bool {
        self.snapshot
    }

    fn ensure_read_allowed(&self) -> Result<()> {
        if *self.read_allowed.lock() {
            Ok(())
        } else {
            Err(crate::error::Error::contract("transaction no longer allows reads"))
        }
    }
}

/// An in-memory [`Transport`]: one pre-sorted `Vec<Record>` is the whole
/// keyspace, sliced into pages of at most `page_size` records per
/// `get_range` call. Every call is logged, so a test can assert "no
/// further backend reads observed" after disposal (§8, scenario 5).
pub struct InMemoryTransport {
    records: Vec<Record>,
    page_size: usize,
    log: Mutex<Vec<RangeReadRequest>>,
}

impl InMemoryTransport {
    pub fn new(mut records: Vec<Record>, page_size: usize) -> Self {
        records.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            records,
            page_size: page_size.max(1),
            log: Mutex::new(Vec::new()),
        }
    }

    /// Number of `get_range` calls issued against this transport so far.
    pub fn read_count(&self) -> usize {
        self.log.lock().len()
    }

    /// Resolve a [`KeySelector`] to an index into `self.records`,
    /// supporting exactly the four canonical selectors this crate's own
    /// readers build (`first_greater_than`, `first_greater_or_equal`,
    /// `last_less_than`, `last_less_or_equal`), and any `offset` beyond
    /// `±1` by a linear walk from that anchor.
    fn resolve(&self, selector: &KeySelector) -> usize {
        let anchor = self.records.partition_point(|r| {
            if selector.or_equal {
                r.key < selector.reference_key
            } else {
                r.key <= selector.reference_key
            }
        });
        let stepped = anchor as i64 + (selector.offset - 1) as i64;
        stepped.clamp(0, self.records.len() as i64) as usize
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn get_range(&self, tx: &dyn Transaction, request: RangeReadRequest) -> Result<Page> {
        tx.ensure_read_allowed()?;
        self.log.lock().push(request.clone());

        let begin = self.resolve(&request.begin);
        let end = self.resolve(&request.end).max(begin);
        let mut slice: Vec<Record> = self.records[begin..end].to_vec();
        if request.options.reverse {
            slice.reverse();
        }

        let page_limit = if request.options.limit == 0 {
            self.page_size
        } else {
            (request.options.limit as usize).min(self.page_size)
        };
        let has_more = slice.len() > page_limit;
        slice.truncate(page_limit);

        Ok(Page {
            records: slice,
            has_more,
            iteration: request.iteration,
            reversed: request.options.reverse,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RangeSelector;

    fn rec(k: u8) -> Record {
        Record::new(vec![k], vec![k])
    }

    #[tokio::test]
    async fn pages_out_the_whole_keyspace() {
        let transport = InMemoryTransport::new(vec![rec(1), rec(3), rec(5), rec(2), rec(4)], 2);
        let tx = TestTransaction::new();
        let range = RangeSelector::new(
            KeySelector::first_greater_or_equal(vec![0u8]),
            KeySelector::first_greater_or_equal(vec![255u8]),
        );
        let mut begin = range.begin.clone();
        let mut collected = Vec::new();
        loop {
            let page = transport
                .get_range(
                    &tx,
                    RangeReadRequest {
                        begin: begin.clone(),
                        end: range.end.clone(),
                        options: Default::default(),
                        iteration: 1,
                        snapshot: false,
                    },
                )
                .await
                .unwrap();
            let more = page.has_more;
            let last = page.records.last().cloned();
            collected.extend(page.records);
            if !more {
                break;
            }
            begin = KeySelector::first_greater_than(last.unwrap().key);
        }
        assert_eq!(collected.len(), 5);
        assert_eq!(collected[0].key.as_ref(), &[1]);
        assert_eq!(collected[4].key.as_ref(), &[5]);
    }

    #[tokio::test]
    async fn forbidding_reads_surfaces_a_contract_error() {
        let transport = InMemoryTransport::new(vec![rec(1)], 10);
        let tx = TestTransaction::new();
        tx.forbid_reads();
        let request = RangeReadRequest {
            begin: KeySelector::first_greater_or_equal(vec![0u8]),
            end: KeySelector::first_greater_or_equal(vec![255u8]),
            options: Default::default(),
            iteration: 1,
            snapshot: false,
        };
        assert!(transport.get_range(&tx, request).await.is_err());
    }
}
