//! The reactive store adapter.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::oneshot;

use brook_schema::{CommitSet, Entity};
use brook_store::{BlockingStore, Row, StoreTransaction, Value};

use crate::builders::{BulkDelete, BulkUpdate, CountQuery, Select};
use crate::bus::{BusSubscription, CommitBus};
use crate::config::ReactiveConfig;
use crate::error::Error;
use crate::ops::{Deferred, OpFn};
use crate::result::ResultSet;
use crate::worker::Worker;

/// State shared between the adapter, its builders, and queued operations.
pub(crate) struct Shared<B> {
    pub(crate) delegate: B,
    pub(crate) bus: CommitBus,
    pub(crate) worker: Worker,
    pub(crate) config: ReactiveConfig,
}

/// Async adapter over a [`BlockingStore`].
///
/// Every mutating method returns a [`Deferred`] handle bound to the store's
/// worker thread, and queries return unexecuted [`ResultSet`]s; nothing
/// touches the delegate until a handle is run. Mutations that commit outside
/// an explicit transaction notify [`changes`](ReactiveStore::changes)
/// subscribers and watched queries with the entity types they touched.
///
/// # Example
///
/// ```ignore
/// use brook_reactive::ReactiveStore;
/// use brook_store::FilterExpr;
///
/// let store = ReactiveStore::new(open_store()?);
///
/// let task = store.insert(Task::new("write docs")).run().await?;
///
/// let open = store
///     .select::<Task>()
///     .filter(FilterExpr::eq("done", false))
///     .result();
/// let mut live = open.watch()?;
/// while let Some(result) = live.recv().await {
///     println!("{} open tasks", result.rows().await?.len());
/// }
/// ```
pub struct ReactiveStore<B: BlockingStore> {
    shared: Arc<Shared<B>>,
    owns_worker: bool,
    closed: AtomicBool,
}

impl<B: BlockingStore> ReactiveStore<B> {
    /// Wrap a blocking store with default configuration.
    ///
    /// Spawns a dedicated worker thread owned by the adapter.
    pub fn new(delegate: B) -> Self {
        Self::with_config(delegate, ReactiveConfig::default())
    }

    /// Wrap a blocking store with the given configuration.
    pub fn with_config(delegate: B, config: ReactiveConfig) -> Self {
        Self::build(delegate, Worker::spawn(), config, true)
    }

    /// Wrap a blocking store on a caller-supplied worker.
    ///
    /// The adapter never shuts down a supplied worker; the caller owns its
    /// lifecycle and may share it between stores.
    pub fn with_worker(delegate: B, worker: Worker, config: ReactiveConfig) -> Self {
        Self::build(delegate, worker, config, false)
    }

    fn build(delegate: B, worker: Worker, config: ReactiveConfig, owns_worker: bool) -> Self {
        Self {
            shared: Arc::new(Shared {
                delegate,
                bus: CommitBus::new(),
                worker,
                config,
            }),
            owns_worker,
            closed: AtomicBool::new(false),
        }
    }

    /// Queue a read-only call against the delegate.
    fn defer<T, F>(&self, op: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Fn(&B) -> Result<T, brook_store::Error> + Send + Sync + 'static,
    {
        let shared = self.shared.clone();
        Deferred::new(self.shared.worker.clone(), move || Ok(op(&shared.delegate)?))
    }

    /// Queue a mutating call against the delegate.
    ///
    /// When the call succeeds and no transaction is active, the touched
    /// entity types are published. Inside a transaction the commit publishes
    /// instead.
    fn defer_mutation<T, F>(&self, changes: CommitSet, op: F) -> Deferred<T>
    where
        T: Send + 'static,
        F: Fn(&B) -> Result<T, brook_store::Error> + Send + Sync + 'static,
    {
        let shared = self.shared.clone();
        Deferred::new(self.shared.worker.clone(), move || {
            let value = op(&shared.delegate)?;
            if !shared.delegate.transaction().active() {
                shared.bus.publish(&changes);
            }
            Ok(value)
        })
    }

    /// Queue an insert.
    pub fn insert<E: Entity>(&self, entity: E) -> Deferred<E> {
        self.defer_mutation(CommitSet::single(E::entity_type()), move |store| {
            store.insert(entity.clone())
        })
    }

    /// Queue a batch insert. An empty batch notifies nobody.
    pub fn insert_many<E: Entity>(&self, entities: Vec<E>) -> Deferred<Vec<E>> {
        self.defer_mutation(batch_changes::<E>(&entities), move |store| {
            store.insert_many(entities.clone())
        })
    }

    /// Queue an insert that resolves with the stored entity's key.
    pub fn insert_returning_key<E: Entity>(&self, entity: E) -> Deferred<E::Key> {
        self.insert(entity).map(|stored| stored.key())
    }

    /// Queue a full update of an existing entity.
    pub fn update<E: Entity>(&self, entity: E) -> Deferred<E> {
        self.defer_mutation(CommitSet::single(E::entity_type()), move |store| {
            store.update(entity.clone())
        })
    }

    /// Queue an update of only the named fields.
    pub fn update_fields<E: Entity>(&self, entity: E, fields: Vec<String>) -> Deferred<E> {
        self.defer_mutation(CommitSet::single(E::entity_type()), move |store| {
            store.update_fields(entity.clone(), &fields)
        })
    }

    /// Queue a batch update. An empty batch notifies nobody.
    pub fn update_many<E: Entity>(&self, entities: Vec<E>) -> Deferred<Vec<E>> {
        self.defer_mutation(batch_changes::<E>(&entities), move |store| {
            store.update_many(entities.clone())
        })
    }

    /// Queue an insert-or-update.
    pub fn upsert<E: Entity>(&self, entity: E) -> Deferred<E> {
        self.defer_mutation(CommitSet::single(E::entity_type()), move |store| {
            store.upsert(entity.clone())
        })
    }

    /// Queue a batch upsert. An empty batch notifies nobody.
    pub fn upsert_many<E: Entity>(&self, entities: Vec<E>) -> Deferred<Vec<E>> {
        self.defer_mutation(batch_changes::<E>(&entities), move |store| {
            store.upsert_many(entities.clone())
        })
    }

    /// Queue a reload of an entity's default field set.
    pub fn refresh<E: Entity>(&self, entity: E) -> Deferred<E> {
        self.defer(move |store| store.refresh(entity.clone()))
    }

    /// Queue a reload of only the named fields.
    pub fn refresh_fields<E: Entity>(&self, entity: E, fields: Vec<String>) -> Deferred<E> {
        self.defer(move |store| store.refresh_fields(entity.clone(), &fields))
    }

    /// Queue a batch reload. An empty field list reloads the default set.
    pub fn refresh_many<E: Entity>(
        &self,
        entities: Vec<E>,
        fields: Vec<String>,
    ) -> Deferred<Vec<E>> {
        self.defer(move |store| store.refresh_many(entities.clone(), &fields))
    }

    /// Queue a reload of every field of an entity.
    pub fn refresh_full<E: Entity>(&self, entity: E) -> Deferred<E> {
        self.defer(move |store| store.refresh_full(entity.clone()))
    }

    /// Queue a delete.
    pub fn delete<E: Entity>(&self, entity: E) -> Deferred<()> {
        self.defer_mutation(CommitSet::single(E::entity_type()), move |store| {
            store.delete(entity.clone())
        })
    }

    /// Queue a batch delete. An empty batch notifies nobody.
    pub fn delete_many<E: Entity>(&self, entities: Vec<E>) -> Deferred<()> {
        self.defer_mutation(batch_changes::<E>(&entities), move |store| {
            store.delete_many(entities.clone())
        })
    }

    /// Queue a key lookup. Missing rows resolve to `None`.
    pub fn find_by_key<E: Entity>(&self, key: E::Key) -> Deferred<Option<E>> {
        self.defer(move |store| store.find_by_key::<E>(key.clone()))
    }

    /// Start building an entity query.
    pub fn select<E: Entity>(&self) -> Select<B, E> {
        Select::new(self.shared.clone())
    }

    /// Start building a row count over an entity type.
    pub fn count<E: Entity>(&self) -> CountQuery<B> {
        CountQuery::new(self.shared.clone(), E::entity_type())
    }

    /// Start building a set-based update over an entity type.
    pub fn bulk_update<E: Entity>(&self) -> BulkUpdate<B> {
        BulkUpdate::new(self.shared.clone(), E::entity_type())
    }

    /// Start building a set-based delete over an entity type.
    pub fn bulk_delete<E: Entity>(&self) -> BulkDelete<B> {
        BulkDelete::new(self.shared.clone(), E::entity_type())
    }

    /// Wrap a raw statement returning untyped rows.
    ///
    /// Raw results carry no dependency metadata, so the returned handle
    /// cannot be watched.
    pub fn raw(&self, statement: impl Into<String>, params: Vec<Value>) -> ResultSet<Row> {
        let shared = self.shared.clone();
        let statement = statement.into();
        let exec = Deferred::new(self.shared.worker.clone(), move || {
            Ok(shared.delegate.raw_rows(&statement, &params)?)
        });
        ResultSet::unwatchable(exec, self.shared.config.stream_buffer)
    }

    /// Wrap a raw statement materializing entities.
    ///
    /// Like [`raw`](ReactiveStore::raw), the returned handle cannot be
    /// watched.
    pub fn raw_entities<E: Entity>(
        &self,
        statement: impl Into<String>,
        params: Vec<Value>,
    ) -> ResultSet<E> {
        let shared = self.shared.clone();
        let statement = statement.into();
        let exec = Deferred::new(self.shared.worker.clone(), move || {
            Ok(shared.delegate.raw_entities::<E>(&statement, &params)?)
        });
        ResultSet::unwatchable(exec, self.shared.config.stream_buffer)
    }

    /// Subscribe to commit notifications from this store.
    ///
    /// Only commits observed after subscribing are delivered. The stream
    /// ends once the publishing side is gone.
    pub fn changes(&self) -> BusSubscription {
        self.shared.bus.subscribe()
    }

    /// Run a sequence of previously built operations in one transaction.
    ///
    /// A transaction is begun only when none is active; either way the steps
    /// run strictly in order on the worker, the transaction is committed,
    /// and the transaction handle is closed, commit failure included. On
    /// success the commit's touched entity types are published once and the
    /// results come back in operation order. A failing step rolls back and
    /// nothing is published.
    ///
    /// Mixed result types can be erased ahead of time with
    /// [`Deferred::map`]. Dropping the returned future abandons the sequence
    /// at the next step boundary and rolls back.
    pub async fn run_in_transaction<T>(&self, ops: Vec<Deferred<T>>) -> Result<Vec<T>, Error>
    where
        T: Send + 'static,
    {
        let steps: Vec<Arc<OpFn<T>>> = ops.iter().map(|op| op.op.clone()).collect();
        let shared = self.shared.clone();
        let (tx, rx) = oneshot::channel();

        self.shared.worker.submit(Box::new(move || {
            if let Some(outcome) = transaction_steps(&shared, steps, &tx) {
                let _ = tx.send(outcome);
            }
        }))?;

        rx.await.map_err(|_| Error::Canceled)?
    }

    /// The wrapped blocking store.
    pub fn as_blocking(&self) -> &B {
        &self.shared.delegate
    }

    /// Close the adapter. Idempotent.
    ///
    /// Closes the delegate, then shuts down the worker when this adapter
    /// spawned it; a caller-supplied worker keeps running. Shutting down the
    /// worker blocks until already-queued operations drain, and those
    /// operations fail against the closed delegate.
    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.shared.delegate.close();
        if self.owns_worker {
            self.shared.worker.shutdown();
        }
        tracing::debug!(owns_worker = self.owns_worker, "reactive store closed");
    }

    /// Whether [`close`](ReactiveStore::close) has run.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl<B: BlockingStore> Drop for ReactiveStore<B> {
    fn drop(&mut self) {
        self.close();
    }
}

impl<B: BlockingStore> std::fmt::Debug for ReactiveStore<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReactiveStore")
            .field("closed", &self.is_closed())
            .field("owns_worker", &self.owns_worker)
            .field("worker_running", &self.shared.worker.is_running())
            .finish()
    }
}

/// The types a batch mutation touches. Empty batches touch nothing, so the
/// bus stays silent for them.
fn batch_changes<E: Entity>(entities: &[E]) -> CommitSet {
    if entities.is_empty() {
        CommitSet::new()
    } else {
        CommitSet::single(E::entity_type())
    }
}

/// Transaction step runner, executed on the worker thread.
///
/// Returns `None` when the consumer dropped the reply channel mid-sequence;
/// the transaction is closed without committing in that case.
fn transaction_steps<B: BlockingStore, T>(
    shared: &Shared<B>,
    steps: Vec<Arc<OpFn<T>>>,
    reply: &oneshot::Sender<Result<Vec<T>, Error>>,
) -> Option<Result<Vec<T>, Error>> {
    let txn = shared.delegate.transaction();

    if !txn.active() {
        if let Err(e) = txn.begin() {
            return Some(Err(e.into()));
        }
    }

    let mut results = Vec::with_capacity(steps.len());
    for step in steps {
        if reply.is_closed() {
            tracing::debug!("transaction consumer went away, rolling back");
            txn.close();
            return None;
        }
        match (*step)() {
            Ok(value) => results.push(value),
            Err(e) => {
                txn.close();
                return Some(Err(e));
            }
        }
    }

    let committed = txn.commit();
    txn.close();

    match committed {
        Ok(changes) => {
            shared.bus.publish(&changes);
            Some(Ok(results))
        }
        Err(e) => Some(Err(e.into())),
    }
}
