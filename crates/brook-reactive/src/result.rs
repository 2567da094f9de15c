//! Query result handles.

use std::collections::HashSet;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;

use brook_schema::{EntityType, Schema};

use crate::bus::CommitBus;
use crate::error::Error;
use crate::live::LiveResult;
use crate::ops::Deferred;

/// Change tracking metadata carried by entity query results.
#[derive(Clone)]
pub(crate) struct WatchHandle {
    pub(crate) bus: CommitBus,
    pub(crate) schema: Arc<Schema>,
    pub(crate) deps: HashSet<EntityType>,
}

/// An unexecuted, re-runnable query result.
///
/// Nothing runs at construction. Every call to [`rows`](ResultSet::rows),
/// [`first`](ResultSet::first), or [`stream`](ResultSet::stream) re-executes
/// the query against the store, so a handle re-delivered by a [`LiveResult`]
/// reads fresh data each time. Handles produced by entity queries carry the
/// metadata needed for [`watch`](ResultSet::watch); handles produced by raw
/// statements do not.
pub struct ResultSet<E> {
    exec: Deferred<Vec<E>>,
    watch: Option<WatchHandle>,
    stream_buffer: usize,
}

impl<E> Clone for ResultSet<E> {
    fn clone(&self) -> Self {
        Self {
            exec: self.exec.clone(),
            watch: self.watch.clone(),
            stream_buffer: self.stream_buffer,
        }
    }
}

impl<E: Send + 'static> ResultSet<E> {
    pub(crate) fn watchable(
        exec: Deferred<Vec<E>>,
        watch: WatchHandle,
        stream_buffer: usize,
    ) -> Self {
        Self {
            exec,
            watch: Some(watch),
            stream_buffer,
        }
    }

    pub(crate) fn unwatchable(exec: Deferred<Vec<E>>, stream_buffer: usize) -> Self {
        Self {
            exec,
            watch: None,
            stream_buffer,
        }
    }

    /// Execute the query and collect all rows.
    pub async fn rows(&self) -> Result<Vec<E>, Error> {
        self.exec.run().await
    }

    /// Execute the query and take the first row, if any.
    pub async fn first(&self) -> Result<Option<E>, Error> {
        Ok(self.rows().await?.into_iter().next())
    }

    /// Whether this handle supports [`watch`](ResultSet::watch).
    pub fn supports_watch(&self) -> bool {
        self.watch.is_some()
    }

    /// The entity types this query depends on, when known.
    pub fn dependencies(&self) -> Option<&HashSet<EntityType>> {
        self.watch.as_ref().map(|w| &w.deps)
    }

    /// Start observing this result.
    ///
    /// The live result emits this handle once immediately, then again after
    /// every commit touching the query's entity types or any type with a
    /// relationship referencing one of them. Fails synchronously with
    /// [`Error::WatchUnsupported`] on handles produced by raw statements;
    /// nothing is registered in that case.
    pub fn watch(&self) -> Result<LiveResult<E>, Error> {
        let handle = self.watch.as_ref().ok_or(Error::WatchUnsupported)?;

        let mut watched = handle.deps.clone();
        for dep in &handle.deps {
            watched.extend(handle.schema.referencing(dep).cloned());
        }

        let subscription = handle
            .bus
            .subscribe_filtered(move |changes| changes.intersects(&watched));

        Ok(LiveResult::new(self.clone(), subscription))
    }

    /// Execute the query on the worker, delivering rows one at a time.
    ///
    /// Rows flow through a bounded buffer; the worker waits when the
    /// consumer falls behind by more than the configured capacity. Dropping
    /// the stream stops delivery at the next row.
    pub fn stream(&self) -> RowStream<E> {
        let (tx, rx) = mpsc::channel(self.stream_buffer);
        let op = self.exec.op.clone();

        let submitted = self.exec.worker.submit(Box::new(move || match (*op)() {
            Ok(items) => {
                for item in items {
                    if tx.blocking_send(Ok(item)).is_err() {
                        break;
                    }
                }
            }
            Err(e) => {
                let _ = tx.blocking_send(Err(e));
            }
        }));

        if let Err(e) = submitted {
            // The job never ran; deliver the failure as the only item.
            let (tx, rx) = mpsc::channel(1);
            let _ = tx.try_send(Err(e));
            return RowStream { rx };
        }

        RowStream { rx }
    }
}

/// Rows from a query being executed on the worker.
pub struct RowStream<E> {
    rx: mpsc::Receiver<Result<E, Error>>,
}

impl<E> RowStream<E> {
    /// Wait for the next row.
    pub async fn recv(&mut self) -> Option<Result<E, Error>> {
        self.rx.recv().await
    }
}

impl<E> Stream for RowStream<E> {
    type Item = Result<E, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
