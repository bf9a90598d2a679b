//! `into_stream` adapts any cursor to a `futures_core::Stream`.

use std::sync::Arc;

use futures_util::StreamExt;

use setalgebra::testing::{InMemoryTransport, TestTransaction};
use setalgebra::{into_stream, union_by_key, KeySelector, RangeQuery, RangeSelector, Record};

fn rec(k: u8) -> Record {
    Record::new(vec![k], vec![k])
}

#[tokio::test]
async fn stream_yields_every_merged_record_then_ends() {
    let transport = Arc::new(InMemoryTransport::new(vec![rec(1), rec(3), rec(5)], 2));
    let tx = Arc::new(TestTransaction::new());
    let range = RangeSelector::new(
        KeySelector::first_greater_or_equal(vec![0u8]),
        KeySelector::first_greater_or_equal(vec![255u8]),
    );
    let cursor = RangeQuery::new(transport, tx, range).into_cursor().unwrap();
    let merged = union_by_key(vec![cursor]).unwrap();

    let mut stream = Box::pin(into_stream(merged));
    let mut collected = Vec::new();
    while let Some(item) = stream.next().await {
        collected.push(item.unwrap());
    }

    assert_eq!(collected.len(), 3);
    assert_eq!(collected[0].key.as_ref(), &[1]);
}
