//! Error taxonomy for the set-algebra streaming engine.
//!
//! Every fallible operation in this crate returns [`Error`], never a bare
//! backend error code. Callers are expected to branch on [`Error::kind`]
//! rather than match variants directly, since new variants may be added
//! to widen a kind's context without being a breaking change to the kind
//! taxonomy itself.

/// Numeric error codes as surfaced by the backend transport, prior to
/// being partitioned into an [`ErrorKind`].
///
/// Mirrors the codes a real ordered key/value store's client bindings
/// receive from the server, kept here as a closed enum rather than a raw
/// integer so the partition in `From<BackendErrorCode> for Error` is
/// exhaustive and visible at a glance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BackendErrorCode {
    #[display(fmt = "past_version")]
    PastVersion,
    #[display(fmt = "future_version")]
    FutureVersion,
    #[display(fmt = "not_committed")]
    NotCommitted,
    #[display(fmt = "commit_unknown_result")]
    CommitUnknownResult,
    #[display(fmt = "transaction_too_old")]
    TransactionTooOld,
    #[display(fmt = "operation_cancelled")]
    OperationCancelled,
    #[display(fmt = "transaction_too_large")]
    TransactionTooLarge,
    #[display(fmt = "key_too_large")]
    KeyTooLarge,
    #[display(fmt = "value_too_large")]
    ValueTooLarge,
    #[display(fmt = "no_more_servers")]
    NoMoreServers,
    #[display(fmt = "broken_promise")]
    BrokenPromise,
    #[display(fmt = "backend_error({_0})")]
    Other(i32),
}

/// The taxonomy of §7: a small, stable set of kinds a caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The ambient cancellation token fired. Partial output already
    /// handed to the consumer remains valid.
    Cancelled,
    /// The read snapshot conflicted or went stale. The caller should
    /// abandon this iterator and retry the whole transaction.
    Retryable,
    /// Network or server loss. Retry with backoff is appropriate.
    Transport,
    /// The caller violated a backend limit (oversized key/value/txn).
    FatalInput,
    /// Any other backend failure not covered above.
    Backend,
    /// A programming error: null/empty inputs, `N == 0`, malformed
    /// ranges. Never expected to be handled at runtime.
    Contract,
}

/// The crate's single error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operation cancelled")]
    Cancelled,

    #[error("retryable backend fault: {code}")]
    Retryable { code: BackendErrorCode },

    #[error("transport fault: {code}")]
    Transport { code: BackendErrorCode },

    #[error("fatal input rejected by backend: {code}")]
    FatalInput { code: BackendErrorCode },

    #[error("backend fault: {code}")]
    Backend { code: BackendErrorCode },

    #[error("contract violation: {0}")]
    Contract(&'static str),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Clone for Error {
    /// Every variant clones exactly except `Other`, whose wrapped
    /// `anyhow::Error` is not `Clone`; it is re-materialized from its
    /// rendered message instead. Used to replay a cursor's terminal
    /// fault (§4.B: "subsequent `advance` calls immediately return the
    /// same terminal status") without holding the original error alive.
    fn clone(&self) -> Self {
        match self {
            Error::Cancelled => Error::Cancelled,
            Error::Retryable { code } => Error::Retryable { code: *code },
            Error::Transport { code } => Error::Transport { code: *code },
            Error::FatalInput { code } => Error::FatalInput { code: *code },
            Error::Backend { code } => Error::Backend { code: *code },
            Error::Contract(msg) => Error::Contract(msg),
            Error::Other(e) => Error::Other(anyhow::anyhow!("{e}")),
        }
    }
}

impl Error {
    /// Classify this error into the stable taxonomy of §7.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Retryable { .. } => ErrorKind::Retryable,
            Error::Transport { .. } => ErrorKind::Transport,
            Error::FatalInput { .. } => ErrorKind::FatalInput,
            Error::Backend { .. } => ErrorKind::Backend,
            Error::Contract(_) => ErrorKind::Contract,
            Error::Other(_) => ErrorKind::Backend,
        }
    }

    /// Build a [`Contract`](Error::Contract) error for a programming
    /// mistake such as an empty cursor list.
    pub fn contract(msg: &'static str) -> Self {
        Error::Contract(msg)
    }
}

impl From<BackendErrorCode> for Error {
    fn from(code: BackendErrorCode) -> Self {
        use BackendErrorCode::*;
        match code {
            PastVersion | FutureVersion | NotCommitted | CommitUnknownResult
            | TransactionTooOld => Error::Retryable { code },
            OperationCancelled => Error::Cancelled,
            TransactionTooLarge | KeyTooLarge | ValueTooLarge => Error::FatalInput { code },
            NoMoreServers | BrokenPromise => Error::Transport { code },
            Other(_) => Error::Backend { code },
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_codes_per_taxonomy() {
        assert_eq!(
            Error::from(BackendErrorCode::PastVersion).kind(),
            ErrorKind::Retryable
        );
        assert_eq!(
            Error::from(BackendErrorCode::TransactionTooOld).kind(),
            ErrorKind::Retryable
        );
        assert_eq!(
            Error::from(BackendErrorCode::OperationCancelled).kind(),
            ErrorKind::Cancelled
        );
        assert_eq!(
            Error::from(BackendErrorCode::KeyTooLarge).kind(),
            ErrorKind::FatalInput
        );
        assert_eq!(
            Error::from(BackendErrorCode::NoMoreServers).kind(),
            ErrorKind::Transport
        );
        assert_eq!(
            Error::from(BackendErrorCode::Other(999)).kind(),
            ErrorKind::Backend
        );
    }
}
