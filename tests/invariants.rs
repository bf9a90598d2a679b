//! Property-based tests of the invariants in §8: strict ordering and set
//! equality for union/intersect/except over arbitrary key sets.

use std::collections::BTreeSet;
use std::sync::Arc;

use itertools::Itertools;
use proptest::collection::{btree_set, vec as pvec};
use proptest::prelude::*;

use setalgebra::testing::{InMemoryTransport, TestTransaction};
use setalgebra::{
    except_by_key, intersect_by_key, union_by_key, KeySelector, OrderedCursor, OrderedCursorExt,
    RangeQuery, RangeSelector, Record,
};

fn record_for(key: u16) -> Record {
    let bytes = key.to_be_bytes().to_vec();
    Record::new(bytes.clone(), bytes)
}

fn whole_keyspace() -> RangeSelector {
    RangeSelector::new(
        KeySelector::first_greater_or_equal(Vec::<u8>::new()),
        KeySelector::first_greater_or_equal(vec![0xffu8, 0xff, 0xff]),
    )
}

fn source(records: Vec<Record>, page_size: usize) -> (Arc<InMemoryTransport>, Box<dyn OrderedCursor<Record> + Send>) {
    let transport = Arc::new(InMemoryTransport::new(records, page_size));
    let tx = Arc::new(TestTransaction::new());
    let cursor = RangeQuery::new(transport.clone(), tx, whole_keyspace())
        .into_cursor()
        .unwrap();
    (transport, cursor)
}

fn key_sets() -> impl Strategy<Value = (BTreeSet<u16>, BTreeSet<u16>)> {
    (
        btree_set(0u16..200, 0..20),
        btree_set(0u16..200, 0..20),
    )
}

proptest! {
    #[test]
    fn union_output_is_strictly_increasing_and_is_the_set_union(
        (a, b) in key_sets(),
        page_size in 1usize..8,
    ) {
        let records_a: Vec<Record> = a.iter().map(|&k| record_for(k)).collect();
        let records_b: Vec<Record> = b.iter().map(|&k| record_for(k)).collect();
        let (_ta, cursor_a) = source(records_a, page_size);
        let (_tb, cursor_b) = source(records_b, page_size);

        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                union_by_key(vec![cursor_a, cursor_b]).unwrap().to_list().await.unwrap()
            });

        let keys: Vec<u16> = result
            .iter()
            .map(|r| u16::from_be_bytes(r.key.as_ref().try_into().unwrap()))
            .collect();

        prop_assert!(keys.iter().tuple_windows().all(|(x, y)| x < y));
        let expected: BTreeSet<u16> = a.union(&b).copied().collect();
        prop_assert_eq!(keys.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn intersect_output_is_the_set_intersection(
        (a, b) in key_sets(),
        page_size in 1usize..8,
    ) {
        let records_a: Vec<Record> = a.iter().map(|&k| record_for(k)).collect();
        let records_b: Vec<Record> = b.iter().map(|&k| record_for(k)).collect();

        // `intersect` requires every input be non-empty to be meaningful
        // here (an empty cursor immediately terminates the iterator,
        // which is already covered by the contract tests); skip the
        // degenerate case rather than assert on it.
        prop_assume!(!records_a.is_empty() && !records_b.is_empty());

        let (_ta, cursor_a) = source(records_a, page_size);
        let (_tb, cursor_b) = source(records_b, page_size);

        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                intersect_by_key(vec![cursor_a, cursor_b]).unwrap().to_list().await.unwrap()
            });

        let keys: Vec<u16> = result
            .iter()
            .map(|r| u16::from_be_bytes(r.key.as_ref().try_into().unwrap()))
            .collect();

        prop_assert!(keys.iter().tuple_windows().all(|(x, y)| x < y));
        let expected: BTreeSet<u16> = a.intersection(&b).copied().collect();
        prop_assert_eq!(keys.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn except_output_is_the_set_difference(
        (a, b) in key_sets(),
        page_size in 1usize..8,
    ) {
        let records_a: Vec<Record> = a.iter().map(|&k| record_for(k)).collect();
        let records_b: Vec<Record> = b.iter().map(|&k| record_for(k)).collect();
        prop_assume!(!records_a.is_empty());

        let (_ta, cursor_a) = source(records_a, page_size);
        let (_tb, cursor_b) = source(records_b, page_size);

        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async {
                except_by_key(vec![cursor_a, cursor_b]).unwrap().to_list().await.unwrap()
            });

        let keys: Vec<u16> = result
            .iter()
            .map(|r| u16::from_be_bytes(r.key.as_ref().try_into().unwrap()))
            .collect();

        prop_assert!(keys.iter().tuple_windows().all(|(x, y)| x < y));
        let expected: BTreeSet<u16> = a.difference(&b).copied().collect();
        prop_assert_eq!(keys.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn take_n_yields_exactly_min_n_and_input_len(
        keys in pvec(0u16..500, 0..30),
        n in 0usize..10,
        page_size in 1usize..8,
    ) {
        let unique: BTreeSet<u16> = keys.into_iter().collect();
        let len = unique.len();
        let records: Vec<Record> = unique.iter().map(|&k| record_for(k)).collect();
        let (_t, cursor) = source(records, page_size);

        let result = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(async { cursor.take(n).to_list().await.unwrap() });

        prop_assert_eq!(result.len(), n.min(len));
    }
}
