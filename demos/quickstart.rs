//! Merge-sorts two overlapping ranges against the in-memory test
//! transport and prints the result. Run with:
//!
//! ```text
//! cargo run --example quickstart --features testing
//! ```

use std::sync::Arc;

use setalgebra::testing::{InMemoryTransport, TestTransaction};
use setalgebra::{union_by_key, OrderedCursorExt, RangeQuery, Record};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let transport = Arc::new(InMemoryTransport::new(
        vec![
            Record::new(&b"a/1"[..], &b"alpha"[..]),
            Record::new(&b"a/3"[..], &b"gamma"[..]),
            Record::new(&b"a/5"[..], &b"epsilon"[..]),
            Record::new(&b"a/2"[..], &b"beta"[..]),
            Record::new(&b"a/4"[..], &b"delta"[..]),
        ],
        64,
    ));
    let tx = Arc::new(TestTransaction::new());

    let odds = RangeQuery::prefix(transport.clone(), tx.clone(), "a/1").into_cursor()?;
    let all = RangeQuery::prefix(transport.clone(), tx.clone(), "a/").into_cursor()?;

    let merged = union_by_key(vec![odds, all])?.take(3).to_list().await?;
    for record in merged {
        println!("{:?} => {:?}", record.key, record.value);
    }
    Ok(())
}
