//! Component E: the Operator Pipeline (§4.E).
//!
//! A minimal lazy-sequence algebra over any [`OrderedCursor`]: each
//! combinator is itself a cursor wrapping its upstream (§9: "there is
//! no implicit deferred-execution object — each operator is itself a
//! cursor"), so chains compose without materializing intermediate
//! collections. Every combinator disposes its upstream when it reaches
//! a terminal state, and faults/cancellation from upstream propagate
//! through unchanged since each combinator's `advance` simply awaits
//! (and `?`-propagates) the upstream's `advance`.

use async_trait::async_trait;
use futures_core::Stream;

use crate::cursor::{Advance, CursorState, OrderedCursor};
use crate::error::Result;

/// Maps each item through `f` (`select` in the spec's naming, `map` in
/// idiomatic Rust — kept as `select` to match §4.E's vocabulary, with
/// `map` as an alias).
pub struct Select<T, U, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> U + Send,
    T: Send,
    U: Send,
{
    inner: C,
    f: F,
    current: Option<U>,
    _marker: std::marker::PhantomData<T>,
}

impl<T, U, C, F> Select<T, U, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> U + Send,
    T: Send,
    U: Send,
{
    pub fn new(inner: C, f: F) -> Self {
        Self { inner, f, current: None, _marker: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T, U, C, F> OrderedCursor<U> for Select<T, U, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> U + Send,
    T: Send,
    U: Send,
{
    async fn advance(&mut self) -> Result<Advance> {
        match self.inner.advance().await? {
            Advance::Advanced => {
                self.current = Some((self.f)(self.inner.current().expect("Advanced")));
                Ok(Advance::Advanced)
            }
            Advance::End => {
                self.current = None;
                Ok(Advance::End)
            }
        }
    }

    fn current(&self) -> Option<&U> {
        self.current.as_ref()
    }

    async fn dispose(&mut self) {
        self.inner.dispose().await;
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }
}

/// Filters out items for which `predicate` returns `false`.
pub struct Where<T, C, P>
where
    C: OrderedCursor<T>,
    P: Fn(&T) -> bool + Send,
    T: Send,
{
    inner: C,
    predicate: P,
    _marker: std::marker::PhantomData<T>,
}

impl<T, C, P> Where<T, C, P>
where
    C: OrderedCursor<T>,
    P: Fn(&T) -> bool + Send,
    T: Send,
{
    pub fn new(inner: C, predicate: P) -> Self {
        Self { inner, predicate, _marker: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T, C, P> OrderedCursor<T> for Where<T, C, P>
where
    C: OrderedCursor<T>,
    P: Fn(&T) -> bool + Send,
    T: Send,
{
    async fn advance(&mut self) -> Result<Advance> {
        loop {
            match self.inner.advance().await? {
                Advance::Advanced => {
                    if (self.predicate)(self.inner.current().expect("Advanced")) {
                        return Ok(Advance::Advanced);
                    }
                    // doesn't match: keep pulling upstream.
                }
                Advance::End => return Ok(Advance::End),
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    async fn dispose(&mut self) {
        self.inner.dispose().await;
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }
}

/// Yields at most `limit` items, then disposes upstream immediately —
/// no further backend reads are observed once the limit is hit (§8,
/// scenario 5).
pub struct Take<T, C>
where
    C: OrderedCursor<T>,
    T: Send + Clone,
{
    inner: C,
    remaining: usize,
    finished: bool,
    current: Option<T>,
    state: CursorState,
}

impl<T, C> Take<T, C>
where
    C: OrderedCursor<T>,
    T: Send + Clone,
{
    pub fn new(inner: C, limit: usize) -> Self {
        Self {
            inner,
            remaining: limit,
            finished: false,
            current: None,
            state: CursorState::Fresh,
        }
    }
}

#[async_trait]
impl<T, C> OrderedCursor<T> for Take<T, C>
where
    C: OrderedCursor<T>,
    T: Send + Clone,
{
    async fn advance(&mut self) -> Result<Advance> {
        if self.finished || self.remaining == 0 {
            if !self.finished {
                self.inner.dispose().await;
                self.finished = true;
            }
            self.current = None;
            self.state = CursorState::Exhausted;
            return Ok(Advance::End);
        }
        match self.inner.advance().await? {
            Advance::Advanced => {
                self.current = self.inner.current().cloned();
                self.remaining -= 1;
                if self.remaining == 0 {
                    // The limit is now met; dispose the upstream eagerly
                    // (before the consumer even asks for the next item)
                    // so no further backend reads are observed (§8,
                    // scenario 5). The item just cached in `current` is
                    // still returned by this call; `state()` reports
                    // `HasCurrent` until the caller advances again.
                    self.inner.dispose().await;
                    self.finished = true;
                }
                self.state = CursorState::HasCurrent;
                Ok(Advance::Advanced)
            }
            Advance::End => {
                self.finished = true;
                self.current = None;
                self.state = CursorState::Exhausted;
                Ok(Advance::End)
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.current.as_ref()
    }

    async fn dispose(&mut self) {
        self.inner.dispose().await;
        self.finished = true;
        self.current = None;
        self.state = CursorState::Disposed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

/// Skips the first `count` items, then yields the rest unchanged.
pub struct Skip<T, C>
where
    C: OrderedCursor<T>,
    T: Send,
{
    inner: C,
    remaining: usize,
    _marker: std::marker::PhantomData<T>,
}

impl<T, C> Skip<T, C>
where
    C: OrderedCursor<T>,
    T: Send,
{
    pub fn new(inner: C, count: usize) -> Self {
        Self { inner, remaining: count, _marker: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T, C> OrderedCursor<T> for Skip<T, C>
where
    C: OrderedCursor<T>,
    T: Send,
{
    async fn advance(&mut self) -> Result<Advance> {
        while self.remaining > 0 {
            match self.inner.advance().await? {
                Advance::Advanced => self.remaining -= 1,
                Advance::End => return Ok(Advance::End),
            }
        }
        self.inner.advance().await
    }

    fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    async fn dispose(&mut self) {
        self.inner.dispose().await;
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }
}

/// Collapses adjacent items sharing the same `key_fn` projection to
/// their first occurrence. Correct only over an already-ordered
/// upstream, matching the round-trip identities of §8
/// (`union([s]) ≡ distinct_by_key(s)`).
pub struct Distinct<T, K, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> K + Send,
    T: Send,
    K: PartialEq + Send,
{
    inner: C,
    key_fn: F,
    last_key: Option<K>,
    _marker: std::marker::PhantomData<T>,
}

impl<T, K, C, F> Distinct<T, K, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> K + Send,
    T: Send,
    K: PartialEq + Send,
{
    pub fn new(inner: C, key_fn: F) -> Self {
        Self { inner, key_fn, last_key: None, _marker: std::marker::PhantomData }
    }
}

#[async_trait]
impl<T, K, C, F> OrderedCursor<T> for Distinct<T, K, C, F>
where
    C: OrderedCursor<T>,
    F: Fn(&T) -> K + Send,
    T: Send,
    K: PartialEq + Send,
{
    async fn advance(&mut self) -> Result<Advance> {
        loop {
            match self.inner.advance().await? {
                Advance::Advanced => {
                    let key = (self.key_fn)(self.inner.current().expect("Advanced"));
                    if self.last_key.as_ref() == Some(&key) {
                        continue;
                    }
                    self.last_key = Some(key);
                    return Ok(Advance::Advanced);
                }
                Advance::End => return Ok(Advance::End),
            }
        }
    }

    fn current(&self) -> Option<&T> {
        self.inner.current()
    }

    async fn dispose(&mut self) {
        self.inner.dispose().await;
    }

    fn state(&self) -> CursorState {
        self.inner.state()
    }
}

/// Extension methods putting the pipeline vocabulary on any ordered
/// cursor (§2.1 of the expanded spec).
#[async_trait]
pub trait OrderedCursorExt<T>: OrderedCursor<T> + Sized
where
    T: Send,
{
    fn select<U, F>(self, f: F) -> Select<T, U, Self, F>
    where
        F: Fn(&T) -> U + Send,
        U: Send,
    {
        Select::new(self, f)
    }

    fn where_<P>(self, predicate: P) -> Where<T, Self, P>
    where
        P: Fn(&T) -> bool + Send,
    {
        Where::new(self, predicate)
    }

    fn take(self, limit: usize) -> Take<T, Self> {
        Take::new(self, limit)
    }

    fn skip(self, count: usize) -> Skip<T, Self> {
        Skip::new(self, count)
    }

    fn distinct<K, F>(self, key_fn: F) -> Distinct<T, K, Self, F>
    where
        F: Fn(&T) -> K + Send,
        K: PartialEq + Send,
    {
        Distinct::new(self, key_fn)
    }

    /// The only materializing sink in the core: drains the cursor to
    /// completion, disposing it, and collects every item into a `Vec`.
    async fn to_list(mut self) -> Result<Vec<T>>
    where
        T: Clone,
    {
        let mut out = Vec::new();
        loop {
            match self.advance().await {
                Ok(Advance::Advanced) => out.push(self.current().expect("Advanced").clone()),
                Ok(Advance::End) => {
                    self.dispose().await;
                    return Ok(out);
                }
                Err(err) => {
                    self.dispose().await;
                    return Err(err);
                }
            }
        }
    }
}

impl<T, C> OrderedCursorExt<T> for C
where
    C: OrderedCursor<T>,
    T: Send,
{
}

/// Adapts any cursor to a [`futures_core::Stream`], for callers who'd
/// rather `while let Some(item) = stream.next().await` than call
/// `advance`/`current` by hand. The stream ends after the first
/// `Err`, matching the cursor contract's "terminal status replayed
/// forever" — nothing further is polled from `cursor` past that point.
pub fn into_stream<T, C>(mut cursor: C) -> impl Stream<Item = Result<T>>
where
    C: OrderedCursor<T> + Send + 'static,
    T: Send + Clone + 'static,
{
    async_stream::stream! {
        loop {
            match cursor.advance().await {
                Ok(Advance::Advanced) => {
                    yield Ok(cursor.current().expect("Advanced").clone());
                }
                Ok(Advance::End) => {
                    cursor.dispose().await;
                    break;
                }
                Err(err) => {
                    yield Err(err);
                    break;
                }
            }
        }
    }
}
