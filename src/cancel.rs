//! Ambient cancellation (§4.F).
//!
//! Every asynchronous entry point in this crate accepts a
//! [`CancellationToken`]. It is cooperative: firing it never interrupts
//! an in-flight future by force, it only makes the *next* observation
//! point (before issuing I/O, or inside a suspended `advance`) resolve
//! to [`Error::Cancelled`](crate::error::Error::Cancelled).
//!
//! Modeled after the teacher's single shared handle threaded through
//! every cursor spawned from one transaction (`kv/remote.rs`'s
//! `Arc<AsyncMutex<..>>` transport handle): here the shared state is a
//! flag plus a `Notify`, cloned cheaply into every cursor a
//! [`SetAlgebraIterator`](crate::setalgebra::SetAlgebraIterator) owns.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{Error, Result};

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cheaply-cloneable cooperative cancellation signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token. Idempotent.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Short-circuit to `Err(Cancelled)` if the token has already fired.
    /// Call this immediately before issuing any I/O (§4.F).
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        Ok(())
    }

    /// Race an in-flight future against cancellation, resolving to
    /// `Err(Cancelled)` promptly if the token fires first.
    pub async fn race<F, T>(&self, fut: F) -> Result<T>
    where
        F: std::future::Future<Output = Result<T>>,
    {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.inner.notify.notified(), if !self.is_cancelled() => Err(Error::Cancelled),
            res = fut => res,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fresh_token_is_not_cancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
        assert!(token.check().is_ok());
    }

    #[tokio::test]
    async fn cancel_is_observed_by_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
        assert!(matches!(token.check(), Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn race_short_circuits_once_cancelled() {
        let token = CancellationToken::new();
        token.cancel();
        let result = token.race(async { Ok::<_, Error>(1) }).await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }
}
