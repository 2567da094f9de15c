//! Reactive layer error types.

use thiserror::Error;

/// Errors surfaced by the reactive layer.
#[derive(Debug, Error)]
pub enum Error {
    /// The underlying store failed.
    #[error("store error: {0}")]
    Store(#[from] brook_store::Error),

    /// The result handle was not produced by an entity query and carries no
    /// change tracking metadata.
    #[error("result does not support change tracking")]
    WatchUnsupported,

    /// The worker thread is no longer accepting work.
    #[error("worker is stopped")]
    WorkerStopped,

    /// The operation was dropped before it completed.
    #[error("operation canceled")]
    Canceled,
}
