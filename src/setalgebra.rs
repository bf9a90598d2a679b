//! Component D: the Set-Algebra Iterator (§4.D) — the heart of the
//! crate. Polymorphic over {Union, Intersect, Except}, each sharing the
//! same cursor-seeding and fault/dispose plumbing but driving its own
//! step function, exactly as §9 recommends ("a tagged variant with
//! three small step functions sharing the merge heap, not ...
//! inheritance").

use std::cmp::Ordering;

use async_trait::async_trait;
use tracing::{instrument, trace, warn};

use crate::cursor::{Advance, CursorState, OrderedCursor};
use crate::error::{Error, Result};
use crate::heap::{HeapEntry, MergeHeap};
use crate::record::Record;

/// Which set operation this iterator performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Union,
    Intersect,
    /// Input 0 is the positive side; inputs `1..N` are subtracted.
    Except,
}

/// Component D. Generic over the projected key type `K` and output
/// type `R`; `key_fn`/`result_fn`/`key_compare` are the spec's
/// closures (§3).
pub struct SetAlgebraIterator<K, R, KeyFn, ResultFn, Cmp>
where
    KeyFn: Fn(&Record) -> K + Send,
    ResultFn: Fn(&Record) -> R + Send,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send,
    K: Clone + Send,
    R: Send,
{
    mode: Mode,
    slots: Vec<SlotTyped<K>>,
    key_fn: KeyFn,
    result_fn: ResultFn,
    cmp: Cmp,
    heap: MergeHeap<K, (), Cmp>,
    initialized: bool,
    state: CursorState,
    current: Option<R>,
    fault: Option<Error>,
}

struct SlotTyped<K> {
    cursor: Box<dyn OrderedCursor<Record> + Send>,
    current_key: Option<K>,
    current_record: Option<Record>,
    done: bool,
}

impl<K, R, KeyFn, ResultFn, Cmp> SetAlgebraIterator<K, R, KeyFn, ResultFn, Cmp>
where
    KeyFn: Fn(&Record) -> K + Send,
    ResultFn: Fn(&Record) -> R + Send,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send,
    K: Clone + Send,
    R: Send,
{
    pub fn new(
        mode: Mode,
        cursors: Vec<Box<dyn OrderedCursor<Record> + Send>>,
        key_fn: KeyFn,
        result_fn: ResultFn,
        cmp: Cmp,
    ) -> Result<Self> {
        if cursors.is_empty() {
            return Err(Error::contract("set-algebra iterator requires N >= 1 inputs"));
        }
        let heap = MergeHeap::new(cursors.len(), cmp.clone());
        let slots = cursors
            .into_iter()
            .map(|cursor| SlotTyped {
                cursor,
                current_key: None,
                current_record: None,
                done: false,
            })
            .collect();
        Ok(Self {
            mode,
            slots,
            key_fn,
            result_fn,
            cmp,
            heap,
            initialized: false,
            state: CursorState::Fresh,
            current: None,
            fault: None,
        })
    }

    fn keys_equal(&self, a: &K, b: &K) -> bool {
        (self.cmp)(a, b) == Ordering::Equal
    }

    /// Advance one slot's underlying cursor, updating its cached
    /// key/record or marking it permanently done. Returns `Ok(true)` if
    /// the slot now has a current record.
    async fn advance_slot(&mut self, id: usize) -> Result<bool> {
        match self.slots[id].cursor.advance().await {
            Ok(Advance::Advanced) => {
                let record = self.slots[id]
                    .cursor
                    .current()
                    .expect("Advanced implies current() is Some")
                    .clone();
                let key = (self.key_fn)(&record);
                self.slots[id].current_key = Some(key);
                self.slots[id].current_record = Some(record);
                Ok(true)
            }
            Ok(Advance::End) => {
                self.slots[id].done = true;
                self.slots[id].current_key = None;
                self.slots[id].current_record = None;
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn seed(&mut self) -> Result<()> {
        for id in 0..self.slots.len() {
            if self.advance_slot(id).await? {
                if self.mode == Mode::Union {
                    let key = self.slots[id].current_key.clone().unwrap();
                    self.heap.push(HeapEntry { cursor_id: id, key, item: () });
                }
            }
        }
        self.initialized = true;
        Ok(())
    }

    async fn dispose_all(&mut self) {
        for slot in &mut self.slots {
            slot.cursor.dispose().await;
        }
    }

    async fn fail(&mut self, err: Error) -> Error {
        warn!(error = %err, mode = ?self.mode, "set-algebra iterator faulted, disposing inputs");
        self.dispose_all().await;
        self.state = CursorState::Faulted;
        self.fault = Some(err.clone());
        err
    }

    async fn step_union(&mut self) -> Result<Option<R>> {
        let (k, min_id) = match self.heap.peek_min() {
            Some(e) => (e.key.clone(), e.cursor_id),
            None => return Ok(None),
        };
        let result = (self.result_fn)(
            self.slots[min_id]
                .current_record
                .as_ref()
                .expect("heap entry implies a current record"),
        );

        loop {
            let matches = matches!(self.heap.peek_min(), Some(e) if self.keys_equal(&e.key, &k));
            if !matches {
                break;
            }
            let entry = self.heap.pop_min().expect("just peeked");
            let id = entry.cursor_id;
            if self.advance_slot(id).await? {
                let key = self.slots[id].current_key.clone().unwrap();
                self.heap.push(HeapEntry { cursor_id: id, key, item: () });
            }
        }

        Ok(Some(result))
    }

    fn key_max(&self) -> K {
        let mut iter = self.slots.iter().map(|s| s.current_key.clone().expect("all slots have a current key by precondition"));
        let mut max = iter.next().expect("at least one cursor");
        for k in iter {
            if (self.cmp)(&k, &max) == Ordering::Greater {
                max = k;
            }
        }
        max
    }

    async fn step_intersect(&mut self) -> Result<Option<R>> {
        loop {
            if self.slots.iter().any(|s| s.done) {
                return Ok(None);
            }

            let k_max = self.key_max();

            for id in 0..self.slots.len() {
                while (self.cmp)(self.slots[id].current_key.as_ref().unwrap(), &k_max) == Ordering::Less {
                    if !self.advance_slot(id).await? {
                        return Ok(None);
                    }
                }
            }

            let all_equal = self
                .slots
                .iter()
                .all(|s| (self.cmp)(s.current_key.as_ref().unwrap(), &k_max) == Ordering::Equal);

            if all_equal {
                let result = (self.result_fn)(self.slots[0].current_record.as_ref().unwrap());
                for id in 0..self.slots.len() {
                    // Exhaustion here is only observed on the *next* call,
                    // matching "If any cursor is exhausted -> terminal"
                    // evaluated at loop entry.
                    self.advance_slot(id).await?;
                }
                return Ok(Some(result));
            }
            // else: some cursor jumped past k_max; recompute and retry.
        }
    }

    async fn step_except(&mut self) -> Result<Option<R>> {
        loop {
            if self.slots[0].done {
                return Ok(None);
            }
            let kp = self.slots[0].current_key.clone().unwrap();

            for id in 1..self.slots.len() {
                while !self.slots[id].done
                    && (self.cmp)(self.slots[id].current_key.as_ref().unwrap(), &kp) == Ordering::Less
                {
                    self.advance_slot(id).await?;
                }
            }

            let excluded = self.slots[1..].iter().any(|s| {
                !s.done && (self.cmp)(s.current_key.as_ref().unwrap(), &kp) == Ordering::Equal
            });

            if excluded {
                self.advance_slot(0).await?;
                continue;
            }

            let result = (self.result_fn)(self.slots[0].current_record.as_ref().unwrap());
            self.advance_slot(0).await?;
            return Ok(Some(result));
        }
    }
}

#[async_trait]
impl<K, R, KeyFn, ResultFn, Cmp> OrderedCursor<R> for SetAlgebraIterator<K, R, KeyFn, ResultFn, Cmp>
where
    KeyFn: Fn(&Record) -> K + Send,
    ResultFn: Fn(&Record) -> R + Send,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send,
    K: Clone + Send,
    R: Send,
{
    #[instrument(level = "debug", skip(self), fields(mode = ?self.mode, inputs = self.slots.len()))]
    async fn advance(&mut self) -> Result<Advance> {
        match self.state {
            CursorState::Faulted => return Err(self.fault.clone().expect("fault recorded")),
            CursorState::Exhausted | CursorState::Disposed => return Ok(Advance::End),
            _ => {}
        }

        if !self.initialized {
            if let Err(err) = self.seed().await {
                return Err(self.fail(err).await);
            }
        }

        let step_result = match self.mode {
            Mode::Union => self.step_union().await,
            Mode::Intersect => self.step_intersect().await,
            Mode::Except => self.step_except().await,
        };

        match step_result {
            Ok(Some(result)) => {
                trace!("emitted record");
                self.current = Some(result);
                self.state = CursorState::HasCurrent;
                Ok(Advance::Advanced)
            }
            Ok(None) => {
                self.dispose_all().await;
                self.state = CursorState::Exhausted;
                self.current = None;
                Ok(Advance::End)
            }
            Err(err) => Err(self.fail(err).await),
        }
    }

    fn current(&self) -> Option<&R> {
        match self.state {
            CursorState::HasCurrent => self.current.as_ref(),
            _ => None,
        }
    }

    async fn dispose(&mut self) {
        if self.state == CursorState::Disposed {
            return;
        }
        self.dispose_all().await;
        self.current = None;
        self.state = CursorState::Disposed;
    }

    fn state(&self) -> CursorState {
        self.state
    }
}

impl<K, R, KeyFn, ResultFn, Cmp> Drop for SetAlgebraIterator<K, R, KeyFn, ResultFn, Cmp>
where
    KeyFn: Fn(&Record) -> K + Send,
    ResultFn: Fn(&Record) -> R + Send,
    Cmp: Fn(&K, &K) -> Ordering + Clone + Send,
    K: Clone + Send,
    R: Send,
{
    /// A debugging aid, not a correctness mechanism (§9): the input
    /// cursors' own `Drop` impls still run even if a caller forgets to
    /// `dispose().await` this iterator first.
    fn drop(&mut self) {
        if !matches!(self.state, CursorState::Disposed) {
            trace!(mode = ?self.mode, "set-algebra iterator dropped without dispose()");
        }
    }
}
