//! Deferred operations bound to the store worker.

use std::sync::Arc;

use tokio::sync::oneshot;

use crate::error::Error;
use crate::worker::Worker;

pub(crate) type OpFn<T> = dyn Fn() -> Result<T, Error> + Send + Sync + 'static;

/// A store operation that has not started yet.
///
/// Construction does no work. Each [`run`](Deferred::run) queues one fresh
/// execution of the operation on the store's worker thread and resolves with
/// its outcome; running the same deferred twice calls the store twice.
/// Nothing is cached between runs.
pub struct Deferred<T> {
    pub(crate) op: Arc<OpFn<T>>,
    pub(crate) worker: Worker,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            op: self.op.clone(),
            worker: self.worker.clone(),
        }
    }
}

impl<T: Send + 'static> Deferred<T> {
    pub(crate) fn new(
        worker: Worker,
        op: impl Fn() -> Result<T, Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            op: Arc::new(op),
            worker,
        }
    }

    /// Queue one execution and wait for its result.
    ///
    /// Fails with [`Error::WorkerStopped`] when the worker has shut down, and
    /// with [`Error::Canceled`] when the worker goes away mid-flight.
    pub async fn run(&self) -> Result<T, Error> {
        let (tx, rx) = oneshot::channel();
        let op = self.op.clone();
        self.worker.submit(Box::new(move || {
            let _ = tx.send((*op)());
        }))?;
        rx.await.map_err(|_| Error::Canceled)?
    }

    /// Transform the operation's success value.
    ///
    /// The transform runs on the worker thread as part of each execution.
    pub fn map<U, F>(self, f: F) -> Deferred<U>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let op = self.op;
        Deferred {
            op: Arc::new(move || (*op)().map(|value| f(value))),
            worker: self.worker,
        }
    }
}
