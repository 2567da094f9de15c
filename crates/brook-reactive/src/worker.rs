//! Dedicated thread for blocking store work.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::Mutex;
use tokio::sync::mpsc;

use crate::error::Error;

/// A unit of blocking work.
pub(crate) type Job = Box<dyn FnOnce() + Send + 'static>;

/// Runs blocking store operations one at a time on a dedicated OS thread.
///
/// Jobs execute strictly in submission order. Cloning the worker clones a
/// handle to the same thread, so one worker can serve several stores.
/// [`shutdown`](Worker::shutdown) stops intake immediately; jobs already
/// queued still run before the thread exits.
#[derive(Clone)]
pub struct Worker {
    inner: Arc<WorkerInner>,
}

struct WorkerInner {
    /// Job intake. Taken on shutdown so the channel closes once the queue
    /// drains.
    tx: Mutex<Option<mpsc::UnboundedSender<Job>>>,
    /// Worker thread handle.
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl Worker {
    /// Spawn a new worker thread.
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = thread::spawn(move || Self::run(rx));

        Self {
            inner: Arc::new(WorkerInner {
                tx: Mutex::new(Some(tx)),
                handle: Mutex::new(Some(handle)),
            }),
        }
    }

    /// Queue a job for execution.
    pub(crate) fn submit(&self, job: Job) -> Result<(), Error> {
        match self.inner.tx.lock().as_ref() {
            Some(tx) => tx.send(job).map_err(|_| Error::WorkerStopped),
            None => Err(Error::WorkerStopped),
        }
    }

    /// The worker loop: run jobs until the intake closes and drains.
    fn run(mut rx: mpsc::UnboundedReceiver<Job>) {
        tracing::debug!("store worker started");
        while let Some(job) = rx.blocking_recv() {
            job();
        }
        tracing::debug!("store worker stopped");
    }

    /// Stop intake and wait for queued jobs to finish.
    ///
    /// Idempotent; later submissions fail with [`Error::WorkerStopped`].
    pub fn shutdown(&self) {
        self.inner.tx.lock().take();
        if let Some(handle) = self.inner.handle.lock().take() {
            let _ = handle.join();
        }
    }

    /// Check if the worker thread is still running.
    pub fn is_running(&self) -> bool {
        self.inner
            .handle
            .lock()
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jobs_run_in_submission_order() {
        let worker = Worker::spawn();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..10 {
            let log = log.clone();
            worker
                .submit(Box::new(move || log.lock().push(i)))
                .unwrap();
        }

        worker.shutdown();
        assert_eq!(*log.lock(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_shutdown_drains_queue() {
        let worker = Worker::spawn();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..100 {
            let log = log.clone();
            worker
                .submit(Box::new(move || log.lock().push(i)))
                .unwrap();
        }

        worker.shutdown();
        assert_eq!(log.lock().len(), 100);
        assert!(!worker.is_running());
    }

    #[test]
    fn test_submit_after_shutdown_fails() {
        let worker = Worker::spawn();
        worker.shutdown();

        let result = worker.submit(Box::new(|| {}));
        assert!(matches!(result, Err(Error::WorkerStopped)));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let worker = Worker::spawn();
        worker.shutdown();
        worker.shutdown();
        assert!(!worker.is_running());
    }

    #[test]
    fn test_clones_share_the_thread() {
        let worker = Worker::spawn();
        let clone = worker.clone();
        let log = Arc::new(Mutex::new(Vec::new()));

        let log_a = log.clone();
        worker.submit(Box::new(move || log_a.lock().push("a"))).unwrap();
        let log_b = log.clone();
        clone.submit(Box::new(move || log_b.lock().push("b"))).unwrap();

        worker.shutdown();
        assert_eq!(*log.lock(), vec!["a", "b"]);
        assert!(matches!(clone.submit(Box::new(|| {})), Err(Error::WorkerStopped)));
    }
}
