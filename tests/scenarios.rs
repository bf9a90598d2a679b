//! Literal scenario tests from §8: merge, collision tie-break,
//! intersect, except, early termination via `take`, and cancellation.

use std::sync::Arc;

use setalgebra::testing::{InMemoryTransport, TestTransaction};
use setalgebra::{
    except_by_key, intersect_by_key, union, union_by_key, CursorState, Error, KeySelector,
    OrderedCursor, OrderedCursorExt, RangeQuery, RangeSelector, Record,
};

fn rec(key: &str, value: &str) -> Record {
    Record::new(key.as_bytes().to_vec(), value.as_bytes().to_vec())
}

/// A range selector spanning every key this test suite ever constructs
/// (single ASCII-digit keys), used so each transport's whole keyspace is
/// handed to the merge operators.
fn whole_keyspace() -> RangeSelector {
    RangeSelector::new(
        KeySelector::first_greater_or_equal(Vec::<u8>::new()),
        KeySelector::first_greater_or_equal(vec![0xffu8]),
    )
}

fn source(
    transport: &Arc<InMemoryTransport>,
    tx: &Arc<TestTransaction>,
) -> Box<dyn OrderedCursor<Record> + Send> {
    RangeQuery::new(transport.clone(), tx.clone(), whole_keyspace())
        .into_cursor()
        .unwrap()
}

#[tokio::test]
async fn merges_two_streams_with_unique_keys() {
    let a = Arc::new(InMemoryTransport::new(
        vec![rec("1", "a"), rec("3", "c"), rec("5", "e")],
        64,
    ));
    let b = Arc::new(InMemoryTransport::new(vec![rec("2", "b"), rec("4", "d")], 64));
    let tx = Arc::new(TestTransaction::new());

    let merged = union_by_key(vec![source(&a, &tx), source(&b, &tx)])
        .unwrap()
        .to_list()
        .await
        .unwrap();

    let keys: Vec<_> = merged.iter().map(|r| r.key.clone()).collect();
    assert_eq!(
        keys,
        vec!["1", "2", "3", "4", "5"]
            .into_iter()
            .map(|k| bytes::Bytes::from(k.as_bytes().to_vec()))
            .collect::<Vec<_>>()
    );
}

#[tokio::test]
async fn colliding_keys_break_ties_by_cursor_position() {
    let a = Arc::new(InMemoryTransport::new(vec![rec("1", "alpha"), rec("3", "gamma")], 64));
    let b = Arc::new(InMemoryTransport::new(
        vec![rec("1", "beta"), rec("2", "delta"), rec("3", "epsilon")],
        64,
    ));
    let tx = Arc::new(TestTransaction::new());

    let merged = union_by_key(vec![source(&a, &tx), source(&b, &tx)])
        .unwrap()
        .to_list()
        .await
        .unwrap();

    let values: Vec<String> = merged
        .iter()
        .map(|r| String::from_utf8(r.value.to_vec()).unwrap())
        .collect();
    assert_eq!(values, vec!["alpha", "delta", "gamma"]);
}

#[tokio::test]
async fn intersects_three_streams() {
    let digits = |ks: &[&str]| ks.iter().map(|k| rec(k, k)).collect::<Vec<_>>();
    let a = Arc::new(InMemoryTransport::new(digits(&["1", "2", "3", "5", "8"]), 64));
    let b = Arc::new(InMemoryTransport::new(digits(&["2", "3", "5", "7"]), 64));
    let c = Arc::new(InMemoryTransport::new(digits(&["3", "5", "9"]), 64));
    let tx = Arc::new(TestTransaction::new());

    let merged = intersect_by_key(vec![source(&a, &tx), source(&b, &tx), source(&c, &tx)])
        .unwrap()
        .to_list()
        .await
        .unwrap();

    let keys: Vec<String> = merged.iter().map(|r| String::from_utf8(r.key.to_vec()).unwrap()).collect();
    assert_eq!(keys, vec!["3", "5"]);
}

#[tokio::test]
async fn except_keeps_only_the_positive_sides_unmatched_keys() {
    let digits = |ks: &[&str]| ks.iter().map(|k| rec(k, k)).collect::<Vec<_>>();
    let p = Arc::new(InMemoryTransport::new(digits(&["1", "2", "3", "4", "5"]), 64));
    let n1 = Arc::new(InMemoryTransport::new(digits(&["2", "4"]), 64));
    let n2 = Arc::new(InMemoryTransport::new(digits(&["5", "6"]), 64));
    let tx = Arc::new(TestTransaction::new());

    let merged = except_by_key(vec![source(&p, &tx), source(&n1, &tx), source(&n2, &tx)])
        .unwrap()
        .to_list()
        .await
        .unwrap();

    let keys: Vec<String> = merged.iter().map(|r| String::from_utf8(r.key.to_vec()).unwrap()).collect();
    assert_eq!(keys, vec!["1", "3"]);
}

#[tokio::test]
async fn take_stops_early_with_no_further_backend_reads() {
    let digits = |ks: &[&str]| ks.iter().map(|k| rec(k, k)).collect::<Vec<_>>();
    let a = Arc::new(InMemoryTransport::new(digits(&["1", "2", "3", "4", "5"]), 1));
    let b = Arc::new(InMemoryTransport::new(digits(&["1", "2", "3", "4", "5"]), 1));
    let tx = Arc::new(TestTransaction::new());

    let result = union_by_key(vec![source(&a, &tx), source(&b, &tx)])
        .unwrap()
        .take(2)
        .to_list()
        .await
        .unwrap();

    assert_eq!(result.len(), 2);
    let reads_after = a.read_count() + b.read_count();
    // Give any stray background task a beat, then confirm no further
    // reads landed after `to_list` returned.
    tokio::task::yield_now().await;
    assert_eq!(a.read_count() + b.read_count(), reads_after);
}

#[tokio::test]
async fn cancellation_is_observed_on_the_next_advance() {
    let a = Arc::new(InMemoryTransport::new(
        vec![rec("1", "a"), rec("2", "b"), rec("3", "c")],
        1,
    ));
    let tx = Arc::new(TestTransaction::new());
    let mut cursor = union(
        vec![source(&a, &tx)],
        |r: &Record| r.key.clone(),
        |r: &Record| r.clone(),
        |x: &bytes::Bytes, y: &bytes::Bytes| x.cmp(y),
    )
    .unwrap();

    assert!(matches!(cursor.advance().await, Ok(_)));
    tx.cancellation_token().cancel();

    let reads_before = a.read_count();
    let outcome = cursor.advance().await;
    assert!(matches!(outcome, Err(Error::Cancelled)));
    assert_eq!(cursor.state(), CursorState::Faulted);
    assert_eq!(a.read_count(), reads_before);
}
