//! Live query results.

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;

use crate::bus::BusSubscription;
use crate::result::ResultSet;

/// A watched query result.
///
/// Emits its result handle once on creation, then again after every commit
/// that may have changed what the query would return. Each emission is the
/// same re-runnable handle; call [`rows`](ResultSet::rows) on it to read
/// current data. Dropping the live result cancels its bus subscription.
pub struct LiveResult<E> {
    result: ResultSet<E>,
    subscription: BusSubscription,
    deliver_initial: bool,
}

impl<E> LiveResult<E> {
    pub(crate) fn new(result: ResultSet<E>, subscription: BusSubscription) -> Self {
        Self {
            result,
            subscription,
            deliver_initial: true,
        }
    }

    /// The underlying result handle.
    pub fn result(&self) -> &ResultSet<E> {
        &self.result
    }

    /// Wait for the next emission.
    ///
    /// The first call resolves immediately with the current handle. Returns
    /// `None` once every handle to the bus has been dropped.
    pub async fn recv(&mut self) -> Option<ResultSet<E>> {
        if self.deliver_initial {
            self.deliver_initial = false;
            return Some(self.result.clone());
        }
        self.subscription.recv().await?;
        Some(self.result.clone())
    }
}

impl<E> Stream for LiveResult<E> {
    type Item = ResultSet<E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.deliver_initial {
            this.deliver_initial = false;
            return Poll::Ready(Some(this.result.clone()));
        }
        match Pin::new(&mut this.subscription).poll_next(cx) {
            Poll::Ready(Some(_)) => Poll::Ready(Some(this.result.clone())),
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}
